//! Waveform conversion to the transport's mono target rate.
//!
//! Rate conversion is plain linear interpolation in the time domain. No
//! anti-aliasing filter is applied: input is synthesized speech with energy
//! concentrated in the low/mid spectrum, where this is sufficient quality.

use crate::engines::SynthesizedWaveform;
use tracing::warn;

/// Convert a synthesized waveform to a mono 16-bit buffer at `target_rate`.
///
/// Malformed containers (bit depth other than 16, channel count other than
/// 1 or 2) yield an empty buffer, logged, never fatal. Zero-length input
/// yields zero-length output without logging.
pub fn to_mono_target_rate(wave: &SynthesizedWaveform, target_rate: u32) -> Vec<i16> {
    if wave.data.is_empty() {
        return Vec::new();
    }

    if wave.bits_per_sample != 16 {
        warn!(
            "unsupported bit depth {} in synthesized waveform, dropping",
            wave.bits_per_sample
        );
        return Vec::new();
    }

    // Decode little-endian i16 PCM; a trailing odd byte is ignored.
    let samples: Vec<i16> = wave
        .data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    let mono = match wave.channels {
        1 => samples,
        2 => downmix_stereo(&samples),
        n => {
            warn!("unexpected channel count {n} in synthesized waveform, dropping");
            return Vec::new();
        }
    };

    if wave.sample_rate == 0 {
        warn!("synthesized waveform has zero sample rate, dropping");
        return Vec::new();
    }

    if wave.sample_rate == target_rate {
        return mono;
    }

    resample_linear(&mono, wave.sample_rate, target_rate)
}

/// Average interleaved stereo pairs down to mono, rounding to nearest.
fn downmix_stereo(samples: &[i16]) -> Vec<i16> {
    samples
        .chunks_exact(2)
        .map(|pair| {
            let sum = i32::from(pair[0]) + i32::from(pair[1]);
            (sum as f32 / 2.0).round() as i16
        })
        .collect()
}

/// Linear-interpolation resampler.
///
/// The output length is `round(duration * dst_rate)`; output positions are
/// spread evenly across the full source index range `[0, len-1]`, each value
/// interpolated between its two nearest source samples.
fn resample_linear(samples: &[i16], src_rate: u32, dst_rate: u32) -> Vec<i16> {
    if samples.is_empty() || src_rate == dst_rate {
        return samples.to_vec();
    }

    let duration = samples.len() as f64 / f64::from(src_rate);
    let out_len = (duration * f64::from(dst_rate)).round() as usize;
    if out_len == 0 {
        return Vec::new();
    }

    let last = samples.len() - 1;
    let step = if out_len > 1 {
        last as f64 / (out_len - 1) as f64
    } else {
        0.0
    };

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = pos.floor() as usize;
        let frac = pos - idx as f64;

        let s0 = f64::from(samples[idx]);
        let s1 = f64::from(samples[(idx + 1).min(last)]);
        let value = s0 * (1.0 - frac) + s1 * frac;

        out.push(value.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16);
    }

    out
}
