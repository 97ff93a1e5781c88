use super::{
    parts, volume, ChannelConf, PlayMode, Sample, ALLEGRO_AUDIO_DEPTH_INT16, ALLEGRO_CHANNEL_CONF_2,
    ALLEGRO_PLAYMODE_ONCE,
};
use crate::context::{with_context, Context};
use log::warn;

handle!(
    /// A sample bound to at most one backend channel.
    SampleInstance
);

pub struct InstanceData {
    pub(super) sample: Option<Sample>,
    pub(super) channel: Option<i32>,
    gain: f32,
    pan: f32,
    speed: f32,
    playmode: PlayMode,
    started_ms: u32,
}

impl InstanceData {
    pub(super) fn new(sample: Sample, playmode: PlayMode) -> InstanceData {
        InstanceData {
            sample: Some(sample),
            channel: None,
            gain: 1.0,
            pan: 0.0,
            speed: 1.0,
            playmode,
            started_ms: 0,
        }
    }
}

/// Halts whatever channel `inst` holds, then starts it again on a fresh one.
pub(super) fn play_instance(ctx: &mut Context, inst: SampleInstance) -> bool {
    let (audio, backend) = parts(ctx);
    let backend = match backend {
        Some(backend) if audio.installed => backend,
        _ => return false,
    };
    let (sample, old_channel, loops, gain) = match audio.instances.get(inst.0) {
        Some(data) => (data.sample, data.channel, data.playmode.loops(), data.gain),
        None => return false,
    };

    if let Some(old) = old_channel {
        backend.halt_channel(old);
        audio.channel_owners.remove(&old);
    }
    if let Some(data) = audio.instances.get_mut(inst.0) {
        data.channel = None;
    }

    let chunk = match sample.and_then(|s| audio.samples.get(s.0)).and_then(|s| s.chunk) {
        Some(chunk) => chunk,
        None => return false,
    };
    let channel = match backend.play_chunk(chunk, loops) {
        Ok(channel) => channel,
        Err(err) => {
            warn!("Could not play sample instance: {}", err);
            return false;
        }
    };
    backend.set_channel_volume(channel, volume(gain));
    let started_ms = backend.ticks_ms();

    audio.claim_channel(channel, Some(inst));
    if let Some(data) = audio.instances.get_mut(inst.0) {
        data.channel = Some(channel);
        data.started_ms = started_ms;
    }
    true
}

pub(super) fn stop_instance(ctx: &mut Context, inst: SampleInstance) -> bool {
    let (audio, backend) = parts(ctx);
    let channel = match audio.instances.get_mut(inst.0) {
        Some(data) => data.channel.take(),
        None => return false,
    };
    if let Some(channel) = channel {
        if let Some(backend) = backend {
            backend.halt_channel(channel);
        }
        audio.channel_owners.remove(&channel);
    }
    true
}

pub(super) fn destroy_instance(ctx: &mut Context, inst: SampleInstance) {
    stop_instance(ctx, inst);
    ctx.audio.instances.remove(inst.0);
}

pub(super) fn instance_playing(ctx: &mut Context, inst: SampleInstance) -> bool {
    let (audio, backend) = parts(ctx);
    match (audio.instances.get(inst.0).and_then(|d| d.channel), backend) {
        (Some(channel), Some(backend)) => backend.is_channel_playing(channel),
        _ => false,
    }
}

pub fn al_create_sample_instance(data: Option<Sample>) -> Option<SampleInstance> {
    with_context(|ctx| {
        let sample = data.filter(|s| ctx.audio.samples.contains(s.0))?;
        let key = ctx.audio.instances.insert(InstanceData::new(sample, ALLEGRO_PLAYMODE_ONCE));
        Some(SampleInstance(key))
    })
}

pub fn al_destroy_sample_instance(spl: Option<SampleInstance>) {
    if let Some(spl) = spl {
        with_context(|ctx| destroy_instance(ctx, spl))
    }
}

pub fn al_play_sample_instance(spl: Option<SampleInstance>) -> bool {
    match spl {
        Some(spl) => with_context(|ctx| play_instance(ctx, spl)),
        None => false,
    }
}

pub fn al_stop_sample_instance(spl: Option<SampleInstance>) -> bool {
    match spl {
        Some(spl) => with_context(|ctx| stop_instance(ctx, spl)),
        None => false,
    }
}

pub fn al_get_sample_instance_playing(spl: Option<SampleInstance>) -> bool {
    match spl {
        Some(spl) => with_context(|ctx| instance_playing(ctx, spl)),
        None => false,
    }
}

pub fn al_set_sample_instance_playing(spl: Option<SampleInstance>, val: bool) -> bool {
    if val {
        al_play_sample_instance(spl)
    } else {
        al_stop_sample_instance(spl)
    }
}

fn with_instance<R>(spl: Option<SampleInstance>, default: R, f: impl FnOnce(&InstanceData) -> R) -> R {
    with_context(|ctx| match spl.and_then(|s| ctx.audio.instances.get(s.0)) {
        Some(data) => f(data),
        None => default,
    })
}

fn update_instance(spl: Option<SampleInstance>, f: impl FnOnce(&mut InstanceData)) -> bool {
    with_context(|ctx| match spl.and_then(|s| ctx.audio.instances.get_mut(s.0)) {
        Some(data) => {
            f(data);
            true
        }
        None => false,
    })
}

/// Estimated from the time since playback started. Looping instances wrap
/// around the sample length, others stop at its end.
pub fn al_get_sample_instance_position(spl: Option<SampleInstance>) -> u32 {
    let spl = match spl {
        Some(spl) => spl,
        None => return 0,
    };
    with_context(|ctx| {
        if !instance_playing(ctx, spl) {
            return 0;
        }
        let (audio, backend) = parts(ctx);
        let data = match audio.instances.get(spl.0) {
            Some(data) => data,
            None => return 0,
        };
        let (frequency, length) = match data.sample.and_then(|s| audio.samples.get(s.0)) {
            Some(sample) => (sample.frequency as u64, sample.length as u64),
            None => return 0,
        };
        let now = backend.map_or(data.started_ms, |b| b.ticks_ms());
        let played = now.wrapping_sub(data.started_ms) as u64 * frequency / 1000;
        let position = match (data.playmode, length) {
            (_, 0) => 0,
            (PlayMode::Loop, _) => played % length,
            _ => played.min(length),
        };
        position as u32
    })
}

pub fn al_set_sample_instance_position(_spl: Option<SampleInstance>, _pos: u32) -> bool {
    false
}

pub fn al_get_sample_instance_length(spl: Option<SampleInstance>) -> u32 {
    with_context(|ctx| {
        spl.and_then(|s| ctx.audio.instances.get(s.0))
            .and_then(|data| data.sample)
            .and_then(|s| ctx.audio.samples.get(s.0))
            .map_or(0, |sample| sample.length)
    })
}

pub fn al_set_sample_instance_length(_spl: Option<SampleInstance>, _len: u32) -> bool {
    false
}

pub fn al_get_sample_instance_speed(spl: Option<SampleInstance>) -> f32 {
    with_instance(spl, 1.0, |data| data.speed)
}

/// Stored only. The backend has no pitch control.
pub fn al_set_sample_instance_speed(spl: Option<SampleInstance>, val: f32) -> bool {
    update_instance(spl, |data| data.speed = val)
}

pub fn al_get_sample_instance_gain(spl: Option<SampleInstance>) -> f32 {
    with_instance(spl, 1.0, |data| data.gain)
}

/// Also applied to the channel the instance currently holds.
pub fn al_set_sample_instance_gain(spl: Option<SampleInstance>, val: f32) -> bool {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        let data = match spl.and_then(|s| audio.instances.get_mut(s.0)) {
            Some(data) => data,
            None => return false,
        };
        data.gain = val;
        if let (Some(channel), Some(backend)) = (data.channel, backend) {
            backend.set_channel_volume(channel, volume(val));
        }
        true
    })
}

pub fn al_get_sample_instance_pan(spl: Option<SampleInstance>) -> f32 {
    with_instance(spl, 0.0, |data| data.pan)
}

/// Stored only.
pub fn al_set_sample_instance_pan(spl: Option<SampleInstance>, val: f32) -> bool {
    update_instance(spl, |data| data.pan = val)
}

pub fn al_get_sample_instance_playmode(spl: Option<SampleInstance>) -> PlayMode {
    with_instance(spl, ALLEGRO_PLAYMODE_ONCE, |data| data.playmode)
}

/// Takes effect the next time the instance is played.
pub fn al_set_sample_instance_playmode(spl: Option<SampleInstance>, val: PlayMode) -> bool {
    update_instance(spl, |data| data.playmode = val)
}

/// Duration of the bound sample in seconds.
pub fn al_get_sample_instance_time(spl: Option<SampleInstance>) -> f32 {
    with_context(|ctx| {
        let sample = spl
            .and_then(|s| ctx.audio.instances.get(s.0))
            .and_then(|data| data.sample)
            .and_then(|s| ctx.audio.samples.get(s.0));
        match sample {
            Some(sample) if sample.frequency > 0 => sample.length as f32 / sample.frequency as f32,
            _ => 0.0,
        }
    })
}

pub fn al_get_sample_instance_frequency(spl: Option<SampleInstance>) -> u32 {
    with_context(|ctx| {
        spl.and_then(|s| ctx.audio.instances.get(s.0))
            .and_then(|data| data.sample)
            .and_then(|s| ctx.audio.samples.get(s.0))
            .map_or(0, |sample| sample.frequency)
    })
}

pub fn al_get_sample_instance_depth(spl: Option<SampleInstance>) -> i32 {
    with_context(|ctx| {
        spl.and_then(|s| ctx.audio.instances.get(s.0))
            .and_then(|data| data.sample)
            .and_then(|s| ctx.audio.samples.get(s.0))
            .map_or(ALLEGRO_AUDIO_DEPTH_INT16, |sample| sample.depth)
    })
}

pub fn al_get_sample_instance_channels(spl: Option<SampleInstance>) -> ChannelConf {
    with_context(|ctx| {
        spl.and_then(|s| ctx.audio.instances.get(s.0))
            .and_then(|data| data.sample)
            .and_then(|s| ctx.audio.samples.get(s.0))
            .map_or(ALLEGRO_CHANNEL_CONF_2, |sample| sample.chan_conf)
    })
}

/// An instance counts as attached while it holds a channel.
pub fn al_get_sample_instance_attached(spl: Option<SampleInstance>) -> bool {
    with_instance(spl, false, |data| data.channel.is_some())
}

pub fn al_detach_sample_instance(spl: Option<SampleInstance>) -> bool {
    al_stop_sample_instance(spl)
}

/// Rebinds the instance. Current playback carries on with the old data.
pub fn al_set_sample(spl: Option<SampleInstance>, data: Option<Sample>) -> bool {
    with_context(|ctx| {
        let sample = match data.filter(|s| ctx.audio.samples.contains(s.0)) {
            Some(sample) => sample,
            None => return false,
        };
        match spl.and_then(|s| ctx.audio.instances.get_mut(s.0)) {
            Some(instance) => {
                instance.sample = Some(sample);
                true
            }
            None => false,
        }
    })
}

pub fn al_get_sample(spl: Option<SampleInstance>) -> Option<Sample> {
    with_instance(spl, None, |data| data.sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::{install, loaded_sample};
    use crate::audio::{al_destroy_sample, al_play_sample, ALLEGRO_PLAYMODE_LOOP};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn creation_needs_a_live_sample() {
        let fake = install();
        assert_eq!(al_create_sample_instance(None), None);

        let sample = loaded_sample(&fake, 200);
        let inst = al_create_sample_instance(sample);
        assert!(inst.is_some());
        assert_eq!(al_get_sample(inst), sample);
        assert_eq!(al_get_sample_instance_gain(inst), 1.0);
        assert_eq!(al_get_sample_instance_speed(inst), 1.0);
        assert_eq!(al_get_sample_instance_pan(inst), 0.0);
        assert_eq!(al_get_sample_instance_playmode(inst), ALLEGRO_PLAYMODE_ONCE);

        al_destroy_sample(sample);
        assert_eq!(al_create_sample_instance(sample), None);
    }

    #[test]
    fn replay_uses_a_fresh_channel() {
        let fake = install();
        let inst = al_create_sample_instance(loaded_sample(&fake, 200));
        al_set_sample_instance_playmode(inst, ALLEGRO_PLAYMODE_LOOP);
        al_set_sample_instance_gain(inst, 0.25);

        assert!(al_play_sample_instance(inst));
        assert!(al_get_sample_instance_playing(inst));
        assert!(al_get_sample_instance_attached(inst));
        {
            let state = fake.borrow();
            assert_eq!(state.playing_channels(), 1);
            let channel = state.channels.values().find(|c| c.playing).map(|c| (c.loops, c.volume));
            assert_eq!(channel, Some((-1, 32)));
        }

        // Playing again never overlaps the instance with itself.
        assert!(al_play_sample_instance(inst));
        assert_eq!(fake.borrow().playing_channels(), 1);

        assert!(al_stop_sample_instance(inst));
        assert!(!al_get_sample_instance_playing(inst));
        assert!(!al_get_sample_instance_attached(inst));
        assert_eq!(fake.borrow().playing_channels(), 0);
    }

    #[test]
    fn gain_follows_onto_the_held_channel() {
        let fake = install();
        let inst = al_create_sample_instance(loaded_sample(&fake, 200));
        assert!(al_set_sample_instance_playing(inst, true));
        assert!(al_set_sample_instance_gain(inst, 0.5));
        assert!(fake.borrow().channels.values().any(|c| c.playing && c.volume == 64));

        // Pan and speed are remembered but never reach the backend.
        assert!(al_set_sample_instance_pan(inst, -1.0));
        assert!(al_set_sample_instance_speed(inst, 2.0));
        assert_eq!(al_get_sample_instance_pan(inst), -1.0);
        assert_eq!(al_get_sample_instance_speed(inst), 2.0);
    }

    #[test]
    fn fire_and_forget_playback_evicts_the_owner() {
        let fake = install();
        let sample = loaded_sample(&fake, 200);
        let inst = al_create_sample_instance(sample);
        assert!(al_play_sample_instance(inst));
        let channel = fake.borrow().channels.iter().find(|(_, c)| c.playing).map(|(&i, _)| i);
        let channel = channel.unwrap();

        // The fake reuses the lowest idle channel, which is the one just freed.
        fake.borrow_mut().halt(channel);
        assert!(al_play_sample(sample, 1.0, 0.0, 1.0, ALLEGRO_PLAYMODE_ONCE, None));
        assert!(!al_get_sample_instance_attached(inst));
    }

    #[test]
    fn rebinding_keeps_current_playback() {
        let fake = install();
        let first = loaded_sample(&fake, 200);
        let second = loaded_sample(&fake, 800);
        let inst = al_create_sample_instance(first);
        al_play_sample_instance(inst);

        assert!(al_set_sample(inst, second));
        assert!(al_get_sample_instance_playing(inst));
        assert_eq!(al_get_sample(inst), second);
        assert_eq!(al_get_sample_instance_length(inst), 400);
        assert!(!al_set_sample(inst, None));
    }

    #[test]
    fn position_is_estimated_from_elapsed_time() {
        let fake = install();
        let inst = al_create_sample_instance(loaded_sample(&fake, 200));
        assert_eq!(al_get_sample_instance_position(inst), 0);

        al_play_sample_instance(inst);
        thread::sleep(Duration::from_millis(20));
        // 100 frames at 44.1kHz is shorter than the sleep.
        assert_eq!(al_get_sample_instance_position(inst), 100);
        assert!(!al_set_sample_instance_position(inst, 0));
        assert!(!al_set_sample_instance_length(inst, 10));
    }

    #[test]
    fn metadata_comes_from_the_sample() {
        let fake = install();
        let inst = al_create_sample_instance(loaded_sample(&fake, 88200));
        assert_eq!(al_get_sample_instance_frequency(inst), 44100);
        assert_eq!(al_get_sample_instance_time(inst), 1.0);
        assert_eq!(al_get_sample_instance_depth(inst), ALLEGRO_AUDIO_DEPTH_INT16);
        assert_eq!(al_get_sample_instance_channels(inst), ALLEGRO_CHANNEL_CONF_2);

        al_destroy_sample_instance(inst);
        assert_eq!(al_get_sample_instance_frequency(inst), 0);
        assert!(!al_play_sample_instance(inst));
        assert!(!al_detach_sample_instance(inst));
    }
}
