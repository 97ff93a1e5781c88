//! Audio graph emulation.
//!
//! The backend only offers "play a chunk on a free channel" and a single
//! background music track. Samples map onto chunks, sample instances onto
//! channels and streams onto the music track. Mixers and voices are
//! bookkeeping on top of that: a voice remembers which source it drives and
//! silences it when replaced, a mixer just records what was attached.

mod instance;
mod mixer;
mod sample;
mod stream;
mod voice;

pub use self::instance::*;
pub use self::mixer::*;
pub use self::sample::*;
pub use self::stream::*;
pub use self::voice::*;

use crate::backend::{AudioSpec, Backend};
use crate::context::{with_context, Context};
use crate::handle::Arena;
use log::{debug, info, warn};
use num_derive::FromPrimitive;
use std::collections::HashMap;

pub const ALLEGRO_AUDIO_VERSION: u32 = 0x150000;

pub const ALLEGRO_AUDIO_DEPTH_INT8: i32 = 0x01;
pub const ALLEGRO_AUDIO_DEPTH_INT16: i32 = 0x02;
pub const ALLEGRO_AUDIO_DEPTH_INT24: i32 = 0x04;
pub const ALLEGRO_AUDIO_DEPTH_INT32: i32 = 0x08;
pub const ALLEGRO_AUDIO_DEPTH_FLOAT32: i32 = 0x10;
pub const ALLEGRO_AUDIO_DEPTH_UNSIGNED: i32 = 0x20;
pub const ALLEGRO_AUDIO_DEPTH_UINT8: i32 = ALLEGRO_AUDIO_DEPTH_INT8 | ALLEGRO_AUDIO_DEPTH_UNSIGNED;
pub const ALLEGRO_AUDIO_DEPTH_UINT16: i32 = ALLEGRO_AUDIO_DEPTH_INT16 | ALLEGRO_AUDIO_DEPTH_UNSIGNED;

#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum ChannelConf {
    Conf1 = 1,
    Conf2 = 2,
    Conf3 = 3,
    Conf4 = 4,
    Conf51 = 6,
    Conf61 = 7,
    Conf71 = 8,
}

pub const ALLEGRO_CHANNEL_CONF_1: ChannelConf = ChannelConf::Conf1;
pub const ALLEGRO_CHANNEL_CONF_2: ChannelConf = ChannelConf::Conf2;
pub const ALLEGRO_CHANNEL_CONF_3: ChannelConf = ChannelConf::Conf3;
pub const ALLEGRO_CHANNEL_CONF_4: ChannelConf = ChannelConf::Conf4;
pub const ALLEGRO_CHANNEL_CONF_5_1: ChannelConf = ChannelConf::Conf51;
pub const ALLEGRO_CHANNEL_CONF_6_1: ChannelConf = ChannelConf::Conf61;
pub const ALLEGRO_CHANNEL_CONF_7_1: ChannelConf = ChannelConf::Conf71;

#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum PlayMode {
    Once = 0,
    Loop = 1,
    Bidir = 2,
}

pub const ALLEGRO_PLAYMODE_ONCE: PlayMode = PlayMode::Once;
pub const ALLEGRO_PLAYMODE_LOOP: PlayMode = PlayMode::Loop;
pub const ALLEGRO_PLAYMODE_BIDIR: PlayMode = PlayMode::Bidir;

impl PlayMode {
    /// Backend loop count: forever for `Loop`, a single pass otherwise.
    fn loops(self) -> i32 {
        match self {
            PlayMode::Loop => -1,
            PlayMode::Once | PlayMode::Bidir => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum MixerQuality {
    Low = 0,
    Medium = 1,
    High = 2,
}

pub const ALLEGRO_MIXER_QUALITY_LOW: MixerQuality = MixerQuality::Low;
pub const ALLEGRO_MIXER_QUALITY_MEDIUM: MixerQuality = MixerQuality::Medium;
pub const ALLEGRO_MIXER_QUALITY_HIGH: MixerQuality = MixerQuality::High;

const DEVICE_SPEC: AudioSpec = AudioSpec {
    frequency: 44100,
    channels: 2,
    chunk_size: 1024,
};

/// Identifies a one-shot playback started by `al_play_sample`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleId {
    pub index: i32,
    pub id: i32,
}

pub fn al_get_channel_count(conf: ChannelConf) -> i32 {
    conf as i32
}

/// Bytes per sample for a depth, ignoring signedness. Unknown depths are 0.
pub fn al_get_audio_depth_size(depth: i32) -> i32 {
    match depth & !ALLEGRO_AUDIO_DEPTH_UNSIGNED {
        ALLEGRO_AUDIO_DEPTH_INT8 => 1,
        ALLEGRO_AUDIO_DEPTH_INT16 => 2,
        ALLEGRO_AUDIO_DEPTH_INT24 => 3,
        ALLEGRO_AUDIO_DEPTH_INT32 | ALLEGRO_AUDIO_DEPTH_FLOAT32 => 4,
        _ => 0,
    }
}

/// Maps a 0.0-1.0 gain onto the backend's 0-128 volume range.
fn volume(gain: f32) -> i32 {
    (gain * 128.0) as i32
}

#[derive(Default)]
pub struct AudioContext {
    pub installed: bool,
    pub codecs_initialised: bool,
    pub reserved_samples: i32,
    samples: Arena<SampleData>,
    instances: Arena<InstanceData>,
    mixers: Arena<MixerData>,
    voices: Arena<VoiceData>,
    streams: Arena<StreamData>,
    default_mixer: Option<Mixer>,
    /// The instance currently holding each backend channel.
    channel_owners: HashMap<i32, SampleInstance>,
    /// The stream that owns the backend's single music track.
    active_music: Option<AudioStream>,
}

/// Splits the context into the audio state and the backend.
fn parts(ctx: &mut Context) -> (&mut AudioContext, Option<&mut (dyn Backend + 'static)>) {
    (&mut ctx.audio, ctx.backend.as_deref_mut())
}

impl AudioContext {
    /// Hands `channel` to `owner`, evicting whichever instance held it.
    fn claim_channel(&mut self, channel: i32, owner: Option<SampleInstance>) {
        if let Some(previous) = self.channel_owners.remove(&channel) {
            if Some(previous) != owner {
                if let Some(data) = self.instances.get_mut(previous.0) {
                    data.channel = None;
                }
            }
        }
        if let Some(owner) = owner {
            self.channel_owners.insert(channel, owner);
        }
    }

    fn release_all_channels(&mut self) {
        for (_, data) in self.instances.iter_mut() {
            data.channel = None;
        }
        self.channel_owners.clear();
    }
}

pub fn al_install_audio() -> bool {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if audio.installed {
            return true;
        }
        let backend = match backend {
            Some(backend) => backend,
            None => return false,
        };
        if let Err(err) = backend.init_codecs() {
            warn!("Could not initialise audio codecs: {}", err);
            return false;
        }
        audio.codecs_initialised = true;
        if let Err(err) = backend.open_audio(DEVICE_SPEC) {
            warn!("Could not open the audio device: {}", err);
            return false;
        }
        info!(
            "Audio device open at {} Hz, {} channels",
            DEVICE_SPEC.frequency, DEVICE_SPEC.channels
        );
        audio.installed = true;
        true
    })
}

/// Drops the default mixer and closes the device. Other audio objects stay
/// allocated but can no longer play.
pub fn al_uninstall_audio() {
    with_context(|ctx| {
        if !ctx.audio.installed {
            return;
        }
        if let Some(mixer) = ctx.audio.default_mixer.take() {
            mixer::destroy(ctx, mixer);
        }
        let (audio, backend) = parts(ctx);
        if let Some(backend) = backend {
            backend.halt_channel(-1);
            backend.halt_music();
            backend.close_audio();
        }
        audio.release_all_channels();
        audio.active_music = None;
        for (_, stream) in audio.streams.iter_mut() {
            stream.playing = false;
            stream.paused = false;
        }
        audio.installed = false;
        debug!("Audio uninstalled");
    })
}

pub fn al_is_audio_installed() -> bool {
    with_context(|ctx| ctx.audio.installed)
}

pub fn al_init_acodec_addon() -> bool {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        let backend = match backend {
            Some(backend) => backend,
            None => return false,
        };
        match backend.init_codecs() {
            Ok(()) => {
                audio.codecs_initialised = true;
                true
            }
            Err(err) => {
                warn!("Could not initialise audio codecs: {}", err);
                false
            }
        }
    })
}

pub fn al_is_acodec_addon_initialized() -> bool {
    with_context(|ctx| ctx.audio.codecs_initialised)
}

pub fn al_get_allegro_audio_version() -> u32 {
    ALLEGRO_AUDIO_VERSION
}

pub fn al_reserve_samples(reserve_samples: i32) -> bool {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if !audio.installed {
            return false;
        }
        if let (Some(backend), true) = (backend, reserve_samples > 0) {
            let allocated = backend.allocate_channels(reserve_samples);
            debug!("Reserved {} of {} channels", allocated, reserve_samples);
        }
        audio.reserved_samples = reserve_samples;
        true
    })
}

/// Fire-and-forget playback on any free channel. Pan and speed are accepted
/// but not applied.
pub fn al_play_sample(
    data: Option<Sample>,
    gain: f32,
    _pan: f32,
    _speed: f32,
    play_mode: PlayMode,
    ret_id: Option<&mut SampleId>,
) -> bool {
    let channel = with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if !audio.installed {
            return None;
        }
        let chunk = data.and_then(|s| audio.samples.get(s.0)).and_then(|s| s.chunk)?;
        let backend = backend?;
        let channel = match backend.play_chunk(chunk, play_mode.loops()) {
            Ok(channel) => channel,
            Err(err) => {
                warn!("Could not play sample: {}", err);
                return None;
            }
        };
        backend.set_channel_volume(channel, volume(gain));
        audio.claim_channel(channel, None);
        Some(channel)
    });

    match channel {
        Some(channel) => {
            if let Some(ret_id) = ret_id {
                *ret_id = SampleId { index: channel, id: 0 };
            }
            true
        }
        None => false,
    }
}

pub fn al_stop_sample(spl_id: &SampleId) {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if let Some(backend) = backend {
            backend.halt_channel(spl_id.index);
        }
        audio.claim_channel(spl_id.index, None);
    })
}

pub fn al_stop_samples() {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if let Some(backend) = backend {
            backend.halt_channel(-1);
        }
        audio.release_all_channels();
    })
}

/// Lazily creates a 44100 Hz float stereo mixer on first use.
pub fn al_get_default_mixer() -> Option<Mixer> {
    with_context(|ctx| {
        if !ctx.audio.installed {
            return None;
        }
        if ctx.audio.default_mixer.is_none() {
            ctx.audio.default_mixer =
                mixer::create(ctx, 44100, ALLEGRO_AUDIO_DEPTH_FLOAT32, ALLEGRO_CHANNEL_CONF_2);
        }
        ctx.audio.default_mixer
    })
}

pub fn al_set_default_mixer(mixer: Option<Mixer>) -> bool {
    with_context(|ctx| match mixer.filter(|m| ctx.audio.mixers.contains(m.0)) {
        Some(mixer) => {
            ctx.audio.default_mixer = Some(mixer);
            true
        }
        None => false,
    })
}

/// Replaces the default mixer with a fresh one.
pub fn al_restore_default_mixer() -> bool {
    with_context(|ctx| {
        if let Some(old) = ctx.audio.default_mixer.take() {
            mixer::destroy(ctx, old);
        }
        ctx.audio.default_mixer =
            mixer::create(ctx, 44100, ALLEGRO_AUDIO_DEPTH_FLOAT32, ALLEGRO_CHANNEL_CONF_2);
        ctx.audio.default_mixer.is_some()
    })
}
