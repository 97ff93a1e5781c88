use super::{parts, ChannelConf, ALLEGRO_AUDIO_DEPTH_INT16, ALLEGRO_CHANNEL_CONF_2};
use crate::backend::ChunkId;
use crate::context::with_context;
use log::{debug, warn};
use std::io::Read;
use std::path::Path;

handle!(
    /// Decoded audio data, playable once it is backed by a native chunk.
    Sample
);

pub struct SampleData {
    pub(super) frequency: u32,
    pub(super) length: u32,
    pub(super) depth: i32,
    pub(super) chan_conf: ChannelConf,
    data: Vec<u8>,
    pub(super) chunk: Option<ChunkId>,
    free_buf: bool,
}

impl SampleData {
    fn loaded(chunk: ChunkId, byte_len: u32) -> SampleData {
        SampleData {
            frequency: 44100,
            length: byte_len / 2,
            depth: ALLEGRO_AUDIO_DEPTH_INT16,
            chan_conf: ALLEGRO_CHANNEL_CONF_2,
            data: Vec::new(),
            chunk: Some(chunk),
            free_buf: true,
        }
    }
}

/// Wraps caller-provided PCM. Signed 16-bit data is uploaded to the backend
/// so it can be played; other depths are kept for inspection only.
pub fn al_create_sample(
    buf: Vec<u8>,
    samples: u32,
    freq: u32,
    depth: i32,
    chan_conf: ChannelConf,
    free_buf: bool,
) -> Option<Sample> {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        let mut chunk = None;
        if let (true, true, Some(backend)) = (audio.installed, depth == ALLEGRO_AUDIO_DEPTH_INT16, backend) {
            let pcm: Vec<i16> = buf
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            match backend.create_chunk(&pcm) {
                Ok(id) => chunk = Some(id),
                Err(err) => warn!("Could not upload sample data: {}", err),
            }
        }

        let key = audio.samples.insert(SampleData {
            frequency: freq,
            length: samples,
            depth,
            chan_conf,
            data: buf,
            chunk,
            free_buf,
        });
        Some(Sample(key))
    })
}

/// Releases the native chunk. The buffer is handed back when the sample was
/// created without taking ownership of it.
pub fn al_destroy_sample(spl: Option<Sample>) -> Option<Vec<u8>> {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        let data = audio.samples.remove(spl?.0)?;
        if let (Some(chunk), Some(backend)) = (data.chunk, backend) {
            backend.free_chunk(chunk);
        }
        if data.free_buf {
            None
        } else {
            Some(data.data)
        }
    })
}

fn with_sample<R>(spl: Option<Sample>, default: R, f: impl FnOnce(&SampleData) -> R) -> R {
    with_context(|ctx| match spl.and_then(|s| ctx.audio.samples.get(s.0)) {
        Some(data) => f(data),
        None => default,
    })
}

pub fn al_get_sample_frequency(spl: Option<Sample>) -> u32 {
    with_sample(spl, 0, |s| s.frequency)
}

pub fn al_get_sample_length(spl: Option<Sample>) -> u32 {
    with_sample(spl, 0, |s| s.length)
}

pub fn al_get_sample_depth(spl: Option<Sample>) -> i32 {
    with_sample(spl, ALLEGRO_AUDIO_DEPTH_INT16, |s| s.depth)
}

pub fn al_get_sample_channels(spl: Option<Sample>) -> ChannelConf {
    with_sample(spl, ALLEGRO_CHANNEL_CONF_2, |s| s.chan_conf)
}

/// Raw bytes of a created sample. Samples decoded by the backend expose no
/// data.
pub fn al_get_sample_data(spl: Option<Sample>) -> Option<Vec<u8>> {
    with_sample(spl, None, |s| Some(s.data.clone()))
}

/// Decodes a file into a chunk. Needs the audio device.
pub fn al_load_sample(filename: &str) -> Option<Sample> {
    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if !audio.installed {
            return None;
        }
        let backend = backend?;
        let chunk = match backend.load_chunk(Path::new(filename)) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!("Could not load sample {}: {}", filename, err);
                return None;
            }
        };
        let data = SampleData::loaded(chunk, backend.chunk_byte_len(chunk));
        debug!("Loaded sample {} ({} samples)", filename, data.length);
        Some(Sample(audio.samples.insert(data)))
    })
}

/// Decodes an already opened file. `ident` is only used in log output.
pub fn al_load_sample_f(fp: &mut dyn Read, ident: &str) -> Option<Sample> {
    let mut bytes = Vec::new();
    if let Err(err) = fp.read_to_end(&mut bytes) {
        warn!("Could not read sample {}: {}", ident, err);
        return None;
    }

    with_context(|ctx| {
        let (audio, backend) = parts(ctx);
        if !audio.installed {
            return None;
        }
        let backend = backend?;
        let chunk = match backend.load_chunk_from_bytes(&bytes) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!("Could not decode sample {}: {}", ident, err);
                return None;
            }
        };
        let data = SampleData::loaded(chunk, backend.chunk_byte_len(chunk));
        Some(Sample(audio.samples.insert(data)))
    })
}

/// Encoding is not supported.
pub fn al_save_sample(_filename: &str, _spl: Option<Sample>) -> bool {
    false
}
