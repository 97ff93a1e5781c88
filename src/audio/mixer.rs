use super::instance::{destroy_instance, stop_instance};
use super::stream::{destroy_stream, set_stream_playing};
use super::{
    AudioStream, ChannelConf, MixerQuality, Sample, SampleInstance, ALLEGRO_AUDIO_DEPTH_INT16,
    ALLEGRO_CHANNEL_CONF_2, ALLEGRO_MIXER_QUALITY_MEDIUM,
};
use crate::context::{with_context, Context};
use log::debug;

handle!(
    /// A grouping node. Attaching records an association and nothing is
    /// mixed.
    Mixer
);

pub struct MixerData {
    frequency: u32,
    depth: i32,
    chan_conf: ChannelConf,
    quality: MixerQuality,
    instance: Option<SampleInstance>,
    /// Set when the instance was created by `al_mixer_attach_sample`.
    owns_instance: bool,
    stream: Option<AudioStream>,
}

pub(super) fn create(ctx: &mut Context, freq: u32, depth: i32, chan_conf: ChannelConf) -> Option<Mixer> {
    if !ctx.audio.installed {
        return None;
    }
    let key = ctx.audio.mixers.insert(MixerData {
        frequency: freq,
        depth,
        chan_conf,
        quality: ALLEGRO_MIXER_QUALITY_MEDIUM,
        instance: None,
        owns_instance: false,
        stream: None,
    });
    debug!("Created mixer at {} Hz", freq);
    Some(Mixer(key))
}

pub(super) fn destroy(ctx: &mut Context, mixer: Mixer) {
    let data = match ctx.audio.mixers.remove(mixer.0) {
        Some(data) => data,
        None => return,
    };
    if let (true, Some(inst)) = (data.owns_instance, data.instance) {
        destroy_instance(ctx, inst);
    }
    if ctx.audio.default_mixer == Some(mixer) {
        ctx.audio.default_mixer = None;
    }
}

/// Drops the instance a mixer created for itself, if any.
fn release_owned_instance(ctx: &mut Context, mixer: Mixer) {
    let owned = match ctx.audio.mixers.get_mut(mixer.0) {
        Some(data) if data.owns_instance => {
            data.owns_instance = false;
            data.instance.take()
        }
        _ => None,
    };
    if let Some(inst) = owned {
        destroy_instance(ctx, inst);
    }
}

pub fn al_create_mixer(freq: u32, depth: i32, chan_conf: ChannelConf) -> Option<Mixer> {
    with_context(|ctx| create(ctx, freq, depth, chan_conf))
}

/// Also destroys an instance created by `al_mixer_attach_sample`.
pub fn al_destroy_mixer(mixer: Option<Mixer>) {
    if let Some(mixer) = mixer {
        with_context(|ctx| destroy(ctx, mixer))
    }
}

pub fn al_attach_sample_instance_to_mixer(stream: Option<SampleInstance>, mixer: Option<Mixer>) -> bool {
    with_context(|ctx| {
        let (inst, mixer) = match (stream, mixer) {
            (Some(inst), Some(mixer))
                if ctx.audio.instances.contains(inst.0) && ctx.audio.mixers.contains(mixer.0) =>
            {
                (inst, mixer)
            }
            _ => return false,
        };
        release_owned_instance(ctx, mixer);
        if let Some(data) = ctx.audio.mixers.get_mut(mixer.0) {
            data.instance = Some(inst);
        }
        true
    })
}

/// Wraps `sample` in an instance owned by the mixer.
pub fn al_mixer_attach_sample(mixer: Option<Mixer>, sample: Option<Sample>) -> bool {
    let inst = match (mixer, sample) {
        (Some(_), Some(_)) => super::al_create_sample_instance(sample),
        _ => return false,
    };
    if !al_attach_sample_instance_to_mixer(inst, mixer) {
        super::al_destroy_sample_instance(inst);
        return false;
    }
    with_context(|ctx| {
        if let Some(data) = mixer.and_then(|m| ctx.audio.mixers.get_mut(m.0)) {
            data.owns_instance = true;
        }
    });
    true
}

/// Stops and destroys the attached instance.
pub fn al_mixer_detach_sample(mixer: Option<Mixer>) -> bool {
    with_context(|ctx| {
        let inst = match mixer.and_then(|m| ctx.audio.mixers.get_mut(m.0)) {
            Some(data) => {
                data.owns_instance = false;
                data.instance.take()
            }
            None => return false,
        };
        match inst {
            Some(inst) => {
                stop_instance(ctx, inst);
                destroy_instance(ctx, inst);
                true
            }
            None => false,
        }
    })
}

pub fn al_attach_audio_stream_to_mixer(stream: Option<AudioStream>, mixer: Option<Mixer>) -> bool {
    with_context(|ctx| {
        let stream = match stream.filter(|s| ctx.audio.streams.contains(s.0)) {
            Some(stream) => stream,
            None => return false,
        };
        match mixer.and_then(|m| ctx.audio.mixers.get_mut(m.0)) {
            Some(data) => {
                data.stream = Some(stream);
                true
            }
            None => false,
        }
    })
}

/// Pauses and destroys the attached stream.
pub fn al_mixer_detach_audio_stream(mixer: Option<Mixer>) -> bool {
    with_context(|ctx| {
        let stream = match mixer.and_then(|m| ctx.audio.mixers.get_mut(m.0)) {
            Some(data) => data.stream.take(),
            None => return false,
        };
        match stream {
            Some(stream) => {
                set_stream_playing(ctx, stream, false);
                destroy_stream(ctx, stream);
                true
            }
            None => false,
        }
    })
}

/// Mixers cannot feed other mixers.
pub fn al_attach_mixer_to_mixer(_stream: Option<Mixer>, _mixer: Option<Mixer>) -> bool {
    false
}

fn with_mixer<R>(mixer: Option<Mixer>, default: R, f: impl FnOnce(&MixerData) -> R) -> R {
    with_context(|ctx| match mixer.and_then(|m| ctx.audio.mixers.get(m.0)) {
        Some(data) => f(data),
        None => default,
    })
}

fn update_mixer(mixer: Option<Mixer>, f: impl FnOnce(&mut MixerData)) -> bool {
    with_context(|ctx| match mixer.and_then(|m| ctx.audio.mixers.get_mut(m.0)) {
        Some(data) => {
            f(data);
            true
        }
        None => false,
    })
}

pub fn al_get_mixer_frequency(mixer: Option<Mixer>) -> u32 {
    with_mixer(mixer, 0, |data| data.frequency)
}

pub fn al_set_mixer_frequency(mixer: Option<Mixer>, val: u32) -> bool {
    update_mixer(mixer, |data| data.frequency = val)
}

pub fn al_get_mixer_channels(mixer: Option<Mixer>) -> ChannelConf {
    with_mixer(mixer, ALLEGRO_CHANNEL_CONF_2, |data| data.chan_conf)
}

pub fn al_get_mixer_depth(mixer: Option<Mixer>) -> i32 {
    with_mixer(mixer, ALLEGRO_AUDIO_DEPTH_INT16, |data| data.depth)
}

pub fn al_get_mixer_quality(mixer: Option<Mixer>) -> MixerQuality {
    with_mixer(mixer, ALLEGRO_MIXER_QUALITY_MEDIUM, |data| data.quality)
}

pub fn al_set_mixer_quality(mixer: Option<Mixer>, val: MixerQuality) -> bool {
    update_mixer(mixer, |data| data.quality = val)
}

// Nothing is actually mixed, so gain and playing state are fixed.

pub fn al_get_mixer_gain(_mixer: Option<Mixer>) -> f32 {
    1.0
}

pub fn al_set_mixer_gain(_mixer: Option<Mixer>, _gain: f32) -> bool {
    true
}

pub fn al_get_mixer_playing(_mixer: Option<Mixer>) -> bool {
    true
}

pub fn al_set_mixer_playing(_mixer: Option<Mixer>, _val: bool) -> bool {
    true
}

pub fn al_get_mixer_attached(_mixer: Option<Mixer>) -> bool {
    false
}

pub fn al_detach_mixer(_mixer: Option<Mixer>) -> bool {
    false
}
