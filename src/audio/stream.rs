use super::{
    parts, volume, ChannelConf, PlayMode, ALLEGRO_AUDIO_DEPTH_INT16, ALLEGRO_CHANNEL_CONF_2,
    ALLEGRO_PLAYMODE_ONCE,
};
use crate::backend::MusicId;
use crate::context::{with_context, Context};
use crate::events::EventSource;
use log::{debug, warn};
use std::path::Path;

handle!(
    /// Music file playback. Only one stream at a time can own the backend's
    /// music track.
    AudioStream
);

pub struct StreamData {
    music: MusicId,
    pub(super) playing: bool,
    pub(super) paused: bool,
    playmode: PlayMode,
    gain: f32,
    pan: f32,
    speed: f32,
    frequency: u32,
    depth: i32,
    chan_conf: ChannelConf,
    buffer_count: usize,
    buffer_samples: u32,
    event_source: EventSource,
}

/// Starts, resumes or pauses `stream` on the music track.
pub(super) fn set_stream_playing(ctx: &mut Context, stream: AudioStream, val: bool) -> bool {
    let (audio, backend) = parts(ctx);
    let backend = match backend {
        Some(backend) if audio.installed => backend,
        _ => return false,
    };
    let owns_track = audio.active_music == Some(stream);
    let data = match audio.streams.get_mut(stream.0) {
        Some(data) => data,
        None => return false,
    };

    if !val {
        if owns_track && data.playing {
            backend.pause_music();
            data.playing = false;
            data.paused = true;
        }
        return true;
    }

    if owns_track && data.paused {
        backend.resume_music();
        data.playing = true;
        data.paused = false;
        return true;
    }
    if owns_track && data.playing && backend.is_music_playing() {
        return true;
    }
    if !owns_track && audio.active_music.is_some() && backend.is_music_playing() {
        debug!("Music track busy, not starting stream");
        return false;
    }

    if let Err(err) = backend.play_music(data.music, data.playmode.loops()) {
        warn!("Could not play audio stream: {}", err);
        return false;
    }
    backend.set_music_volume(volume(data.gain));
    data.playing = true;
    data.paused = false;

    if let Some(previous) = audio.active_music.replace(stream) {
        if previous != stream {
            if let Some(previous) = audio.streams.get_mut(previous.0) {
                previous.playing = false;
                previous.paused = false;
            }
        }
    }
    true
}

/// Halts the music track if `stream` owns it.
pub(super) fn halt_stream(ctx: &mut Context, stream: AudioStream) {
    let (audio, backend) = parts(ctx);
    if audio.active_music == Some(stream) {
        if let Some(backend) = backend {
            backend.halt_music();
        }
        audio.active_music = None;
    }
    if let Some(data) = audio.streams.get_mut(stream.0) {
        data.playing = false;
        data.paused = false;
    }
}

/// Plays `stream` from the start, taking the music track from whoever had
/// it.
pub(super) fn restart_stream(ctx: &mut Context, stream: AudioStream) -> bool {
    if let Some(active) = ctx.audio.active_music {
        halt_stream(ctx, active);
    }
    if let Some(backend) = ctx.backend.as_mut() {
        backend.halt_music();
    }
    set_stream_playing(ctx, stream, true)
}

pub(super) fn stream_playing(ctx: &mut Context, stream: AudioStream) -> bool {
    let (audio, backend) = parts(ctx);
    let playing = audio.streams.get(stream.0).map_or(false, |data| data.playing);
    playing && audio.active_music == Some(stream) && backend.map_or(false, |b| b.is_music_playing())
}

pub(super) fn destroy_stream(ctx: &mut Context, stream: AudioStream) {
    halt_stream(ctx, stream);
    let (audio, backend) = parts(ctx);
    if let (Some(data), Some(backend)) = (audio.streams.remove(stream.0), backend) {
        backend.free_music(data.music);
    }
}

/// Streams cannot be fed from memory.
pub fn al_create_audio_stream(
    _buffer_count: usize,
    _samples: u32,
    _freq: u32,
    _depth: i32,
    _chan_conf: ChannelConf,
) -> Option<AudioStream> {
    None
}

/// Opens a music file. `buffer_count` and `samples` are recorded only.
pub fn al_load_audio_stream(filename: &str, buffer_count: usize, samples: u32) -> Option<AudioStream> {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if !audio.installed {
            return None;
        }
        let music = match backend?.load_music(Path::new(filename)) {
            Ok(music) => music,
            Err(err) => {
                warn!("Could not load audio stream {}: {}", filename, err);
                return None;
            }
        };
        let key = audio.streams.insert(StreamData {
            music,
            playing: false,
            paused: false,
            playmode: ALLEGRO_PLAYMODE_ONCE,
            gain: 1.0,
            pan: 0.0,
            speed: 1.0,
            frequency: 44100,
            depth: ALLEGRO_AUDIO_DEPTH_INT16,
            chan_conf: ALLEGRO_CHANNEL_CONF_2,
            buffer_count,
            buffer_samples: samples,
            event_source: EventSource::default(),
        });
        debug!("Loaded audio stream {}", filename);
        Some(AudioStream(key))
    })
}

pub fn al_destroy_audio_stream(stream: Option<AudioStream>) {
    if let Some(stream) = stream {
        with_context(|ctx| destroy_stream(ctx, stream))
    }
}

pub fn al_drain_audio_stream(_stream: Option<AudioStream>) {}

pub fn al_get_audio_stream_playing(stream: Option<AudioStream>) -> bool {
    match stream {
        Some(stream) => with_context(|ctx| stream_playing(ctx, stream)),
        None => false,
    }
}

/// Fails while another stream is mid-track.
pub fn al_set_audio_stream_playing(stream: Option<AudioStream>, val: bool) -> bool {
    match stream {
        Some(stream) => with_context(|ctx| set_stream_playing(ctx, stream, val)),
        None => false,
    }
}

pub fn al_rewind_audio_stream(stream: Option<AudioStream>) -> bool {
    with_context(|ctx| {
        let stream = match stream.filter(|s| ctx.audio.streams.contains(s.0)) {
            Some(stream) => stream,
            None => return false,
        };
        let (audio, backend) = parts(ctx);
        if let (true, Some(backend)) = (audio.active_music == Some(stream), backend) {
            backend.rewind_music();
        }
        true
    })
}

/// Only the stream that owns the music track can seek.
pub fn al_seek_audio_stream_secs(stream: Option<AudioStream>, time: f64) -> bool {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        match (stream, backend) {
            (Some(stream), Some(backend)) if audio.active_music == Some(stream) => {
                match backend.seek_music(time) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!("Could not seek audio stream: {}", err);
                        false
                    }
                }
            }
            _ => false,
        }
    })
}

pub fn al_get_audio_stream_position_secs(stream: Option<AudioStream>) -> f64 {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        match (stream, backend) {
            (Some(stream), Some(backend)) if audio.active_music == Some(stream) => backend.music_position(),
            _ => 0.0,
        }
    })
}

pub fn al_get_audio_stream_length_secs(stream: Option<AudioStream>) -> f64 {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        let music = stream.and_then(|s| audio.streams.get(s.0)).map(|data| data.music);
        match (music, backend) {
            (Some(music), Some(backend)) => backend.music_duration(music).unwrap_or(0.0),
            _ => 0.0,
        }
    })
}

fn with_stream<R>(stream: Option<AudioStream>, default: R, f: impl FnOnce(&StreamData) -> R) -> R {
    with_context(|ctx| match stream.and_then(|s| ctx.audio.streams.get(s.0)) {
        Some(data) => f(data),
        None => default,
    })
}

fn update_stream(stream: Option<AudioStream>, f: impl FnOnce(&mut StreamData)) -> bool {
    with_context(|ctx| match stream.and_then(|s| ctx.audio.streams.get_mut(s.0)) {
        Some(data) => {
            f(data);
            true
        }
        None => false,
    })
}

pub fn al_get_audio_stream_gain(stream: Option<AudioStream>) -> f32 {
    with_stream(stream, 1.0, |data| data.gain)
}

/// Applied to the music track when this stream owns it.
pub fn al_set_audio_stream_gain(stream: Option<AudioStream>, val: f32) -> bool {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        let owns_track = stream.is_some() && audio.active_music == stream;
        let data = match stream.and_then(|s| audio.streams.get_mut(s.0)) {
            Some(data) => data,
            None => return false,
        };
        data.gain = val;
        if let (true, Some(backend)) = (owns_track, backend) {
            backend.set_music_volume(volume(val));
        }
        true
    })
}

pub fn al_get_audio_stream_pan(stream: Option<AudioStream>) -> f32 {
    with_stream(stream, 0.0, |data| data.pan)
}

pub fn al_set_audio_stream_pan(stream: Option<AudioStream>, val: f32) -> bool {
    update_stream(stream, |data| data.pan = val)
}

pub fn al_get_audio_stream_speed(stream: Option<AudioStream>) -> f32 {
    with_stream(stream, 1.0, |data| data.speed)
}

pub fn al_set_audio_stream_speed(stream: Option<AudioStream>, val: f32) -> bool {
    update_stream(stream, |data| data.speed = val)
}

pub fn al_get_audio_stream_playmode(stream: Option<AudioStream>) -> PlayMode {
    with_stream(stream, ALLEGRO_PLAYMODE_ONCE, |data| data.playmode)
}

pub fn al_set_audio_stream_playmode(stream: Option<AudioStream>, val: PlayMode) -> bool {
    update_stream(stream, |data| data.playmode = val)
}

pub fn al_get_audio_stream_frequency(stream: Option<AudioStream>) -> u32 {
    with_stream(stream, 0, |data| data.frequency)
}

pub fn al_get_audio_stream_channels(stream: Option<AudioStream>) -> ChannelConf {
    with_stream(stream, ALLEGRO_CHANNEL_CONF_2, |data| data.chan_conf)
}

pub fn al_get_audio_stream_depth(stream: Option<AudioStream>) -> i32 {
    with_stream(stream, ALLEGRO_AUDIO_DEPTH_INT16, |data| data.depth)
}

/// Buffer geometry requested at load time, as `(buffer_count, samples)`.
pub fn al_get_audio_stream_buffer_config(stream: Option<AudioStream>) -> (usize, u32) {
    with_stream(stream, (0, 0), |data| (data.buffer_count, data.buffer_samples))
}

// The music track is decoded by the backend, so there are no fragments to
// report.

pub fn al_get_audio_stream_length(_stream: Option<AudioStream>) -> u32 {
    0
}

pub fn al_get_audio_stream_fragments(_stream: Option<AudioStream>) -> u32 {
    0
}

pub fn al_get_available_audio_stream_fragments(_stream: Option<AudioStream>) -> u32 {
    0
}

pub fn al_get_audio_stream_played_samples(_stream: Option<AudioStream>) -> u64 {
    0
}

pub fn al_get_audio_stream_fragment(_stream: Option<AudioStream>) -> Option<Vec<u8>> {
    None
}

pub fn al_set_audio_stream_fragment(_stream: Option<AudioStream>, _val: Vec<u8>) -> bool {
    false
}

pub fn al_get_audio_stream_attached(_stream: Option<AudioStream>) -> bool {
    false
}

/// Halts the music track if this stream owns it.
pub fn al_detach_audio_stream(stream: Option<AudioStream>) -> bool {
    with_context(|ctx| match stream.filter(|s| ctx.audio.streams.contains(s.0)) {
        Some(stream) => {
            halt_stream(ctx, stream);
            true
        }
        None => false,
    })
}

/// Streams never post events; the returned source is inert.
pub fn al_get_audio_stream_event_source(stream: Option<AudioStream>) -> Option<EventSource> {
    with_stream(stream, None, |data| Some(data.event_source))
}
