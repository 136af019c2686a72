//! Audio file decoding
//!
//! Turns a wav/m4a/mp3 file on disk into a mono [`Waveform`] at a fixed
//! target sample rate:
//!
//! 1. Decode every packet of the first audio track with Symphonia
//! 2. Average all channels into one (not just the first channel)
//! 3. Resample with rubato if the file's rate differs from the target
//!
//! Nothing here caches; see [`crate::cache::DecodeCache`].

use std::fs::File;
use std::path::Path;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{DatasetError, Result};
use crate::types::{Sample, Waveform, DEFAULT_SAMPLE_RATE};

/// Frames fed to the resampler per call
const RESAMPLE_CHUNK: usize = 1024;

/// Largest tolerated share of malformed packets before a file counts as corrupt
const MAX_SKIPPED_PACKET_RATIO: f64 = 0.1;

/// Anything that can produce a mono waveform at a fixed rate from a path
///
/// [`SymphoniaDecoder`] is the production implementation; tests substitute
/// in-memory decoders to observe how often decoding happens.
pub trait AudioDecoder {
    /// Decode `path` into a single-channel waveform at [`Self::sample_rate`]
    fn decode(&self, path: &Path) -> Result<Waveform>;

    /// The rate every returned waveform is normalized to
    fn sample_rate(&self) -> u32;
}

/// Symphonia + rubato decoder
#[derive(Debug, Clone, Copy)]
pub struct SymphoniaDecoder {
    sample_rate: u32,
}

impl SymphoniaDecoder {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<Waveform> {
        load_mono(path, self.sample_rate)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Decode, downmix, and resample a file to `target_rate`
///
/// Samples are clamped to [-1, 1]: float sources may exceed full scale and
/// sinc resampling overshoots around full-scale edges.
pub fn load_mono(path: &Path, target_rate: u32) -> Result<Waveform> {
    let decoded = decode_interleaved(path)?;
    let mono = downmix(&decoded.samples, decoded.channels);
    let samples = if decoded.sample_rate != target_rate {
        log::debug!(
            "Resampling {:?} from {} Hz to {} Hz",
            path,
            decoded.sample_rate,
            target_rate
        );
        resample(&mono, decoded.sample_rate, target_rate)?
    } else {
        mono
    };

    Ok(Waveform::from_vec(clamp_full_scale(samples)))
}

/// Raw decoder output before any channel or rate conversion
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples
    pub samples: Vec<Sample>,
    pub sample_rate: u32,
    pub channels: usize,
}

/// Decode an audio file to interleaved f32 samples using Symphonia
pub fn decode_interleaved(path: &Path) -> Result<DecodedAudio> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
    use symphonia::core::errors::Error as SymphoniaError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let decode_err = |reason: String| DatasetError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| DatasetError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("No audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;

    let mut samples: Vec<Sample> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<Sample>> = None;
    let mut decoded_packets = 0usize;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(decode_err(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping malformed packet in {:?}: {}", path, e);
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(decode_err(e.to_string())),
        };

        decoded_packets += 1;
        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count());

        // Reallocate if a packet is larger than anything seen so far
        let needs_alloc = sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * spec.channels.count());
        if needs_alloc {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    check_packet_health(decoded_packets, skipped_packets, samples.len()).map_err(decode_err)?;

    let sample_rate = sample_rate.ok_or_else(|| decode_err("Unknown sample rate".to_string()))?;
    let channels = channels.unwrap_or(1).max(1);

    log::trace!(
        "Decoded {:?}: {} frames, {} ch @ {} Hz",
        path,
        samples.len() / channels,
        channels,
        sample_rate
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

/// Reject decodes that produced no audio or lost too many packets
fn check_packet_health(
    decoded_packets: usize,
    skipped_packets: usize,
    decoded_samples: usize,
) -> std::result::Result<(), String> {
    if decoded_samples == 0 {
        return Err(format!(
            "No audio frames decoded ({} malformed packets)",
            skipped_packets
        ));
    }

    let total = decoded_packets + skipped_packets;
    if skipped_packets as f64 > total as f64 * MAX_SKIPPED_PACKET_RATIO {
        return Err(format!(
            "{} of {} packets malformed",
            skipped_packets, total
        ));
    }
    Ok(())
}

/// Clamp every sample into [-1, 1]
pub fn clamp_full_scale(mut samples: Vec<Sample>) -> Vec<Sample> {
    let mut clipped = 0usize;
    for s in samples.iter_mut() {
        if s.abs() > 1.0 {
            *s = s.clamp(-1.0, 1.0);
            clipped += 1;
        }
    }
    if clipped > 0 {
        log::debug!("Clamped {} samples beyond full scale", clipped);
    }
    samples
}

/// Average interleaved channels into one
///
/// A trailing partial frame is dropped.
pub fn downmix(interleaved: &[Sample], channels: usize) -> Vec<Sample> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<Sample>() / channels as Sample)
        .collect()
}

/// Band-limited sample rate conversion of a mono signal
///
/// Output length is `round(len * to_rate / from_rate)`, with the resampler's
/// group delay removed so sample 0 stays aligned.
pub fn resample(samples: &[Sample], from_rate: u32, to_rate: u32) -> Result<Vec<Sample>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(DatasetError::Resample(format!(
            "invalid rate conversion {} Hz -> {} Hz",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<Sample>::new(ratio, 1.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| DatasetError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let mut out: Vec<Sample> = Vec::with_capacity(expected + delay);

    let mut chunks = samples.chunks_exact(RESAMPLE_CHUNK);
    for chunk in &mut chunks {
        let input = [chunk];
        let frames = resampler
            .process(&input[..], None)
            .map_err(|e| DatasetError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let input = [remainder];
        let frames = resampler
            .process_partial(Some(&input[..]), None)
            .map_err(|e| DatasetError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
    }

    // Flush the filter tail until the delayed output is complete
    while out.len() < expected + delay {
        let frames = resampler
            .process_partial(None::<&[&[Sample]]>, None)
            .map_err(|e| DatasetError::Resample(e.to_string()))?;
        if frames[0].is_empty() {
            break;
        }
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay.min(out.len()));
    out.resize(expected, 0.0);
    Ok(out)
}
