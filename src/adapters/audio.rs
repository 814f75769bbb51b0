//! Audio output adapter: symphonia decode, cpal playback.
//!
//! Clips are decoded once into interleaved `f32` at the device's rate and
//! channel count, then cached.  [`MixerPlayer::play`] hands the decoded
//! buffer to the output callback as a new voice and returns immediately;
//! the callback sums every live voice, so overlapping clips mix instead of
//! cutting each other off.
//!
//! ```text
//!  play(path) ──▶ cache / decode ──▶ voice channel ──▶ cpal callback (mix)
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::app::ports::AudioPlayer;
use crate::error::PlaybackFault;

/// Voices queued faster than the callback drains them are dropped.
const VOICE_QUEUE_CAP: usize = 16;

/// Decoded clip, interleaved at the device format.
type Pcm = Arc<[f32]>;

struct Voice {
    samples: Pcm,
    pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputFormat {
    sample_rate: u32,
    channels: usize,
}

pub struct MixerPlayer {
    format: OutputFormat,
    voices: Sender<Voice>,
    cache: ClipCache,
    _stream: cpal::Stream,
}

impl MixerPlayer {
    /// Open the default output device and start the mixing stream.
    pub fn open() -> Result<Self, PlaybackFault> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            error!("Audio: no default output device");
            PlaybackFault::PlayerUnavailable
        })?;
        let supported = device.default_output_config().map_err(|e| {
            error!("Audio: output config unavailable: {}", e);
            PlaybackFault::PlayerUnavailable
        })?;

        let sample_format = supported.sample_format();
        let config = supported.config();
        let format = OutputFormat {
            sample_rate: config.sample_rate.0,
            channels: usize::from(config.channels.max(1)),
        };

        let (tx, rx) = crossbeam_channel::bounded::<Voice>(VOICE_QUEUE_CAP);
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, rx),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, rx),
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, rx),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, rx),
            other => {
                error!("Audio: unsupported sample format {:?}", other);
                return Err(PlaybackFault::PlayerUnavailable);
            }
        }?;
        stream.play().map_err(|e| {
            error!("Audio: stream start failed: {}", e);
            PlaybackFault::PlayerUnavailable
        })?;

        info!(
            "Audio output ready: {} Hz, {} ch, {:?}",
            format.sample_rate, format.channels, sample_format
        );
        Ok(Self {
            format,
            voices: tx,
            cache: ClipCache::default(),
            _stream: stream,
        })
    }

    /// Decode `paths` ahead of time so the first press does not wait on it.
    pub fn preload<'a>(&mut self, paths: impl IntoIterator<Item = &'a Path>) {
        for path in paths {
            if let Err(e) = self.load(path) {
                warn!("Audio: preload {} failed: {}", path.display(), e);
            }
        }
    }

    fn load(&mut self, path: &Path) -> Result<Pcm, PlaybackFault> {
        let format = self.format;
        self.cache.get_or_decode(path, |p| decode_file(p, format))
    }
}

/// Decoded clips by path.  Decode failures are remembered too, so a bad
/// file costs one decode attempt rather than one per press.  A missing file
/// is not cached: it may still be copied in later.
#[derive(Default)]
struct ClipCache {
    entries: HashMap<PathBuf, Result<Pcm, PlaybackFault>>,
}

impl ClipCache {
    fn get_or_decode(
        &mut self,
        path: &Path,
        decode: impl FnOnce(&Path) -> Result<Vec<f32>, PlaybackFault>,
    ) -> Result<Pcm, PlaybackFault> {
        if let Some(entry) = self.entries.get(path) {
            return entry.clone();
        }
        let entry = decode(path).map(Pcm::from);
        if matches!(entry, Err(PlaybackFault::ClipMissing)) {
            return entry;
        }
        match &entry {
            Ok(pcm) => debug!("Audio: decoded {} ({} samples)", path.display(), pcm.len()),
            Err(e) => warn!("Audio: {} disabled until restart: {}", path.display(), e),
        }
        self.entries.insert(path.to_path_buf(), entry.clone());
        entry
    }
}

impl AudioPlayer for MixerPlayer {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackFault> {
        let samples = self.load(path)?;
        self.voices
            .try_send(Voice { samples, pos: 0 })
            .map_err(|_| PlaybackFault::PlayerUnavailable)
    }
}

// ── Output stream ─────────────────────────────────────────────

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    incoming: Receiver<Voice>,
) -> Result<cpal::Stream, PlaybackFault>
where
    T: SizedSample + FromSample<f32>,
{
    let mut live: Vec<Voice> = Vec::new();
    device
        .build_output_stream(
            config,
            move |out: &mut [T], _| {
                live.extend(incoming.try_iter());
                for (i, slot) in out.iter_mut().enumerate() {
                    let mut acc = 0.0f32;
                    for voice in &live {
                        if let Some(s) = voice.samples.get(voice.pos + i) {
                            acc += s;
                        }
                    }
                    *slot = T::from_sample(acc.clamp(-1.0, 1.0));
                }
                let advanced = out.len();
                live.retain_mut(|v| {
                    v.pos += advanced;
                    v.pos < v.samples.len()
                });
            },
            |e| warn!("Audio stream error: {}", e),
            None,
        )
        .map_err(|e| {
            error!("Audio: stream build failed: {}", e);
            PlaybackFault::PlayerUnavailable
        })
}

// ── Decoding ──────────────────────────────────────────────────

fn decode_file(path: &Path, target: OutputFormat) -> Result<Vec<f32>, PlaybackFault> {
    let file = File::open(path).map_err(|_| PlaybackFault::ClipMissing)?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_failed(path, &e))?;
    let mut format = probed.format;
    let track = format.default_track().ok_or(PlaybackFault::DecodeFailed)?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let source_rate = params.sample_rate.ok_or(PlaybackFault::DecodeFailed)?;
    let source_channels = params.channels.map(|c| c.count()).unwrap_or(0);
    if source_channels == 0 {
        return Err(PlaybackFault::DecodeFailed);
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| decode_failed(path, &e))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(decode_failed(path, &e)),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                let needs_realloc = sample_buf
                    .as_ref()
                    .is_none_or(|b| b.capacity() < audio_buf.capacity());
                if needs_realloc {
                    sample_buf = Some(SampleBuffer::<f32>::new(
                        audio_buf.capacity() as u64,
                        *audio_buf.spec(),
                    ));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(audio_buf);
                    interleaved.extend_from_slice(buf.samples());
                }
            }
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_failed(path, &e)),
        }
    }

    let remixed = remix(&interleaved, source_channels, target.channels);
    Ok(resample(&remixed, target.channels, source_rate, target.sample_rate))
}

fn decode_failed(path: &Path, e: &SymphoniaError) -> PlaybackFault {
    warn!("Audio: {} could not be decoded: {}", path.display(), e);
    PlaybackFault::DecodeFailed
}

/// Convert interleaved frames between channel counts.
///
/// Mono fans out to every output channel; wider sources fold to mono by
/// averaging, otherwise extra channels are dropped and missing ones repeat
/// the last source channel.
fn remix(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }
    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            for ch in 0..to {
                out.push(frame[ch.min(from - 1)]);
            }
        }
    }
    out
}

/// Linear-interpolation resampler over interleaved frames.
fn resample(samples: &[f32], channels: usize, from_hz: u32, to_hz: u32) -> Vec<f32> {
    if from_hz == to_hz || samples.is_empty() {
        return samples.to_vec();
    }
    let in_frames = samples.len() / channels;
    let ratio = f64::from(from_hz) / f64::from(to_hz);
    let out_frames = ((in_frames as f64) / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_frames * channels);
    for n in 0..out_frames {
        let t = n as f64 * ratio;
        let i = t as usize;
        let frac = (t - i as f64) as f32;
        let j = (i + 1).min(in_frames - 1);
        for ch in 0..channels {
            let a = samples[i * channels + ch];
            let b = samples[j * channels + ch];
            out.push(a + (b - a) * frac);
        }
    }
    out
}
