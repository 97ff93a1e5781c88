use super::instance::{destroy_instance, instance_playing, play_instance, stop_instance};
use super::stream::{halt_stream, restart_stream, set_stream_playing, stream_playing};
use super::{
    AudioStream, ChannelConf, InstanceData, Mixer, Sample, SampleInstance, ALLEGRO_AUDIO_DEPTH_INT16,
    ALLEGRO_CHANNEL_CONF_2, ALLEGRO_PLAYMODE_ONCE,
};
use crate::context::{with_context, Context};

handle!(
    /// An output sink driving at most one source.
    Voice
);

/// What a voice is currently driving. Mixers are never accepted as a
/// source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSource {
    None,
    SampleInstance(SampleInstance),
    Stream(AudioStream),
}

pub struct VoiceData {
    frequency: u32,
    depth: i32,
    chan_conf: ChannelConf,
    playing: bool,
    position: u32,
    source: VoiceSource,
    /// Instance created by `al_attach_sample_to_voice`.
    owned_instance: Option<SampleInstance>,
}

fn silence(ctx: &mut Context, source: VoiceSource) {
    match source {
        VoiceSource::None => {}
        VoiceSource::SampleInstance(inst) => {
            stop_instance(ctx, inst);
        }
        VoiceSource::Stream(stream) => halt_stream(ctx, stream),
    }
}

/// Silences the current source and forgets it, along with any instance the
/// voice created for itself.
fn clear_source(ctx: &mut Context, voice: Voice) {
    let (source, owned) = match ctx.audio.voices.get_mut(voice.0) {
        Some(data) => (
            std::mem::replace(&mut data.source, VoiceSource::None),
            data.owned_instance.take(),
        ),
        None => return,
    };
    silence(ctx, source);
    if let Some(owned) = owned {
        destroy_instance(ctx, owned);
    }
}

fn set_source(ctx: &mut Context, voice: Voice, source: VoiceSource, playing: bool) {
    if let Some(data) = ctx.audio.voices.get_mut(voice.0) {
        data.source = source;
        data.position = 0;
        data.playing = playing;
    }
}

fn voice_exists(ctx: &Context, voice: Option<Voice>) -> Option<Voice> {
    voice.filter(|v| ctx.audio.voices.contains(v.0))
}

pub fn al_create_voice(freq: u32, depth: i32, chan_conf: ChannelConf) -> Option<Voice> {
    with_context(|ctx| {
        if !ctx.audio.installed {
            return None;
        }
        let key = ctx.audio.voices.insert(VoiceData {
            frequency: freq,
            depth,
            chan_conf,
            playing: false,
            position: 0,
            source: VoiceSource::None,
            owned_instance: None,
        });
        Some(Voice(key))
    })
}

pub fn al_destroy_voice(voice: Option<Voice>) {
    with_context(|ctx| {
        if let Some(voice) = voice_exists(ctx, voice) {
            clear_source(ctx, voice);
            ctx.audio.voices.remove(voice.0);
        }
    })
}

/// Replaces the voice's source. The previous one is silenced first.
pub fn al_attach_sample_instance_to_voice(stream: Option<SampleInstance>, voice: Option<Voice>) -> bool {
    with_context(|ctx| {
        let inst = match stream.filter(|s| ctx.audio.instances.contains(s.0)) {
            Some(inst) => inst,
            None => return false,
        };
        let voice = match voice_exists(ctx, voice) {
            Some(voice) => voice,
            None => return false,
        };
        clear_source(ctx, voice);
        let playing = instance_playing(ctx, inst);
        set_source(ctx, voice, VoiceSource::SampleInstance(inst), playing);
        true
    })
}

/// Plays `sample` once through an instance owned by the voice.
pub fn al_attach_sample_to_voice(sample: Option<Sample>, voice: Option<Voice>) -> bool {
    with_context(|ctx| {
        let sample = match sample.filter(|s| ctx.audio.samples.get(s.0).map_or(false, |d| d.chunk.is_some())) {
            Some(sample) => sample,
            None => return false,
        };
        let voice = match voice_exists(ctx, voice) {
            Some(voice) => voice,
            None => return false,
        };
        clear_source(ctx, voice);

        let inst = SampleInstance(ctx.audio.instances.insert(InstanceData::new(sample, ALLEGRO_PLAYMODE_ONCE)));
        if !play_instance(ctx, inst) {
            destroy_instance(ctx, inst);
            return false;
        }
        set_source(ctx, voice, VoiceSource::SampleInstance(inst), true);
        if let Some(data) = ctx.audio.voices.get_mut(voice.0) {
            data.owned_instance = Some(inst);
        }
        true
    })
}

/// Takes over the music track and plays `stream` from the start.
pub fn al_attach_audio_stream_to_voice(stream: Option<AudioStream>, voice: Option<Voice>) -> bool {
    with_context(|ctx| {
        let stream = match stream.filter(|s| ctx.audio.streams.contains(s.0)) {
            Some(stream) => stream,
            None => return false,
        };
        let voice = match voice_exists(ctx, voice) {
            Some(voice) => voice,
            None => return false,
        };
        clear_source(ctx, voice);
        let playing = restart_stream(ctx, stream);
        set_source(ctx, voice, VoiceSource::Stream(stream), playing);
        true
    })
}

pub fn al_attach_mixer_to_voice(_mixer: Option<Mixer>, _voice: Option<Voice>) -> bool {
    false
}

/// Silences the source and leaves the voice empty.
pub fn al_detach_voice(voice: Option<Voice>) {
    with_context(|ctx| {
        if let Some(voice) = voice_exists(ctx, voice) {
            clear_source(ctx, voice);
            set_source(ctx, voice, VoiceSource::None, false);
        }
    })
}

/// The source currently attached to `voice`.
pub fn al_get_voice_source(voice: Option<Voice>) -> VoiceSource {
    with_context(|ctx| {
        voice
            .and_then(|v| ctx.audio.voices.get(v.0))
            .map_or(VoiceSource::None, |data| data.source)
    })
}

pub fn al_get_voice_frequency(voice: Option<Voice>) -> u32 {
    with_context(|ctx| voice.and_then(|v| ctx.audio.voices.get(v.0)).map_or(0, |d| d.frequency))
}

pub fn al_get_voice_channels(voice: Option<Voice>) -> ChannelConf {
    with_context(|ctx| {
        voice
            .and_then(|v| ctx.audio.voices.get(v.0))
            .map_or(ALLEGRO_CHANNEL_CONF_2, |d| d.chan_conf)
    })
}

pub fn al_get_voice_depth(voice: Option<Voice>) -> i32 {
    with_context(|ctx| {
        voice
            .and_then(|v| ctx.audio.voices.get(v.0))
            .map_or(ALLEGRO_AUDIO_DEPTH_INT16, |d| d.depth)
    })
}

/// Asks the backend whenever a source is attached.
pub fn al_get_voice_playing(voice: Option<Voice>) -> bool {
    with_context(|ctx| {
        let (source, playing) = match voice.and_then(|v| ctx.audio.voices.get(v.0)) {
            Some(data) => (data.source, data.playing),
            None => return false,
        };
        match source {
            VoiceSource::None => playing,
            VoiceSource::SampleInstance(inst) => instance_playing(ctx, inst),
            VoiceSource::Stream(stream) => stream_playing(ctx, stream),
        }
    })
}

pub fn al_set_voice_playing(voice: Option<Voice>, val: bool) -> bool {
    with_context(|ctx| {
        let voice = match voice_exists(ctx, voice) {
            Some(voice) => voice,
            None => return false,
        };
        let source = ctx.audio.voices.get(voice.0).map_or(VoiceSource::None, |d| d.source);
        match source {
            VoiceSource::None => {}
            VoiceSource::SampleInstance(inst) => {
                let playing = instance_playing(ctx, inst);
                if val && !playing {
                    play_instance(ctx, inst);
                } else if !val && playing {
                    stop_instance(ctx, inst);
                }
            }
            VoiceSource::Stream(stream) => {
                set_stream_playing(ctx, stream, val);
            }
        }
        if let Some(data) = ctx.audio.voices.get_mut(voice.0) {
            data.playing = val;
        }
        true
    })
}

/// Stored only; nothing seeks.
pub fn al_get_voice_position(voice: Option<Voice>) -> u32 {
    with_context(|ctx| voice.and_then(|v| ctx.audio.voices.get(v.0)).map_or(0, |d| d.position))
}

pub fn al_set_voice_position(voice: Option<Voice>, pos: u32) -> bool {
    with_context(|ctx| match voice.and_then(|v| ctx.audio.voices.get_mut(v.0)) {
        Some(data) => {
            data.position = pos;
            true
        }
        None => false,
    })
}

/// Silences the source but keeps it attached.
pub fn al_voice_stop(voice: Option<Voice>) {
    with_context(|ctx| {
        let source = match voice.and_then(|v| ctx.audio.voices.get_mut(v.0)) {
            Some(data) => {
                data.playing = false;
                data.source
            }
            None => return,
        };
        silence(ctx, source);
    })
}
