//! Clip-safe noise mixing
//!
//! A noisy training input is built as `clean + k * w_max * dirty_segment`,
//! where:
//!
//! - `dirty_segment` is a random window of the dirty file, as long as the
//!   clean file
//! - `w_max` is the tightest per-sample weight bound keeping every mixed
//!   sample inside [-1, 1] (see [`max_weight`])
//! - `k = 1 - u^2` with `u` uniform in [0, 1), so most mixes get a moderate
//!   amount of noise and a few get close to the maximum
//!
//! Clipped training inputs would teach the denoiser a distortion that never
//! occurs in real recordings, so the bound is computed exactly rather than
//! estimated. Arithmetic runs in f64 and is rounded to f32 once at the end;
//! since ±1.0 are representable in f32 the rounding cannot leave the range.
//! The guarantee needs clean input already inside [-1, 1], which
//! [`crate::audio_file::load_mono`] enforces by clamping.

use ndarray::{ArrayView1, Zip};
use rand::Rng;

use crate::error::{DatasetError, Result};
use crate::types::{Sample, Waveform};

/// Largest weight `w >= 0` such that `clean ± w * dirty` stays in [-1, 1]
///
/// Every sample with a nonzero dirty value contributes the bound
/// `min(|(-1 - c) / d|, |(1 - c) / d|)`; samples where `d == 0` are masked
/// out because they put no constraint on `w`. The result is the minimum
/// across all remaining samples.
///
/// Returns `f64::INFINITY` when the dirty segment is entirely silent. Mixing
/// such a segment contributes nothing regardless of the weight.
///
/// Returns 0.0 if any clean sample is already outside [-1, 1]; no positive
/// weight can bring such a mix back into range.
pub fn max_weight(clean: ArrayView1<'_, Sample>, dirty: ArrayView1<'_, Sample>) -> Result<f64> {
    if clean.len() != dirty.len() {
        return Err(DatasetError::LengthMismatch {
            clean_len: clean.len(),
            dirty_len: dirty.len(),
        });
    }

    if clean.iter().any(|&c| c.abs() > 1.0) {
        log::warn!("Clean audio exceeds full scale, mixing with zero weight");
        return Ok(0.0);
    }

    let bound = Zip::from(&clean)
        .and(&dirty)
        .fold(f64::INFINITY, |acc, &c, &d| {
            if d == 0.0 {
                return acc;
            }
            let c = c as f64;
            let d = d as f64;
            let lower = ((-1.0 - c) / d).abs();
            let upper = ((1.0 - c) / d).abs();
            acc.min(lower).min(upper)
        });

    Ok(bound)
}

/// Random dirty intensity `1 - u^2`, `u` uniform in [0, 1)
///
/// Lies in (0, 1]; values near 1 are much more likely than values near 0.
pub fn dirty_intensity<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u: f64 = rng.gen();
    1.0 - u * u
}

/// Mix `clean` with the dirty window starting at `start`, scaled by
/// `intensity * max_weight`
///
/// Fails with [`DatasetError::DirtyTooShort`] if the window does not fit
/// inside `dirty_full`.
pub fn overlap_segment(
    clean: &Waveform,
    dirty_full: &Waveform,
    start: usize,
    intensity: f64,
) -> Result<Waveform> {
    let len = clean.len();
    if start.checked_add(len).map_or(true, |end| end > dirty_full.len()) {
        return Err(DatasetError::DirtyTooShort {
            clean_len: len,
            dirty_len: dirty_full.len().saturating_sub(start),
        });
    }

    let segment = dirty_full.segment(start, len);
    let max_w = max_weight(clean.samples(), segment.view())?;
    let scale = intensity * max_w;

    log::trace!(
        "Mixing {} samples at offset {} (max_w={:.4}, intensity={:.4})",
        len,
        start,
        max_w,
        intensity
    );

    let mixed = Zip::from(clean.samples())
        .and(&segment)
        .map_collect(|&c, &d| {
            // Silent samples stay untouched, which also keeps an unbounded
            // weight from turning 0 * inf into NaN
            if d == 0.0 {
                c
            } else {
                (c as f64 + scale * d as f64) as Sample
            }
        });

    Ok(Waveform::from_array(mixed))
}

/// Overlay a random window of `dirty_full` onto `clean` without clipping
///
/// The window start is uniform over `0..=dirty_len - clean_len`. The result
/// always has the clean waveform's length. Every dirty file must be at least
/// as long as any clean file it can be paired with; otherwise this returns
/// [`DatasetError::DirtyTooShort`].
pub fn mix<R: Rng + ?Sized>(clean: &Waveform, dirty_full: &Waveform, rng: &mut R) -> Result<Waveform> {
    if dirty_full.len() < clean.len() {
        return Err(DatasetError::DirtyTooShort {
            clean_len: clean.len(),
            dirty_len: dirty_full.len(),
        });
    }

    let start = rng.gen_range(0..=dirty_full.len() - clean.len());
    let intensity = dirty_intensity(rng);
    overlap_segment(clean, dirty_full, start, intensity)
}

/// Shift a waveform by `offset` samples, keeping its length
///
/// `wav[0]` ends up at `out[offset]`. Negative offsets shift left. Vacated
/// samples are zero.
pub fn apply_offset(wav: &Waveform, offset: isize) -> Waveform {
    if offset == 0 {
        return wav.clone();
    }

    let len = wav.len();
    let shift = offset.unsigned_abs();
    if shift >= len {
        return Waveform::zeros(len);
    }

    let src = wav.samples();
    let mut out = vec![0.0; len];
    if offset > 0 {
        out[shift..]
            .iter_mut()
            .zip(src.iter())
            .for_each(|(o, &s)| *o = s);
    } else {
        out[..len - shift]
            .iter_mut()
            .zip(src.iter().skip(shift))
            .for_each(|(o, &s)| *o = s);
    }

    Waveform::from_vec(out)
}
