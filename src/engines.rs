//! Trait seams for the external speech and language engines.
//!
//! Transcription, generation, and synthesis are blocking calls owned by the
//! host; the pipeline only ever invokes them from the blocking thread pool.
//! Implementations must be cheap to share (`Arc<dyn …>`).

use crate::error::{AgentError, Result};
use crate::history::ConversationMessage;

/// Speech-to-text engine.
pub trait Transcriber: Send + Sync {
    /// Transcribe mono 16-bit samples at the given rate.
    ///
    /// An empty string means "no speech recognized" and must not be reported
    /// as an error for recoverable input.
    ///
    /// # Errors
    ///
    /// Returns an error only for non-recoverable engine failures.
    fn transcribe(&self, samples: &[i16], sample_rate: u32) -> Result<String>;
}

/// Language model producing a reply from the conversation so far.
pub trait Generator: Send + Sync {
    /// Generate the next assistant reply over the full ordered history.
    ///
    /// # Errors
    ///
    /// Returns an error on generation failure; the coordinator substitutes a
    /// fixed apology and keeps the turn alive.
    fn generate(&self, history: &[ConversationMessage]) -> Result<String>;
}

/// Text-to-speech engine.
pub trait Synthesizer: Send + Sync {
    /// Synthesize the given text to a waveform.
    ///
    /// An empty sample buffer signals synthesis failure.
    ///
    /// # Errors
    ///
    /// Returns an error only for non-recoverable engine failures.
    fn synthesize(&self, text: &str) -> Result<SynthesizedWaveform>;
}

/// A synthesizer's output: raw PCM plus the container header fields needed
/// to interpret it.
#[derive(Debug, Clone)]
pub struct SynthesizedWaveform {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Bits per sample. Only 16-bit PCM is processable downstream.
    pub bits_per_sample: u16,
    /// Raw little-endian PCM bytes.
    pub data: Vec<u8>,
}

impl SynthesizedWaveform {
    /// Whether the waveform carries no audio.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Duration of the waveform in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 || self.bits_per_sample == 0 {
            return 0.0;
        }
        let bytes_per_frame = self.channels as usize * (self.bits_per_sample as usize / 8);
        if bytes_per_frame == 0 {
            return 0.0;
        }
        (self.data.len() / bytes_per_frame) as f64 / self.sample_rate as f64
    }

    /// Parse a RIFF/WAV byte buffer into a waveform.
    ///
    /// Convenience for hosts whose synthesizer emits a WAV container rather
    /// than bare PCM. Only 16-bit integer PCM is supported.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is malformed or not 16-bit PCM.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes))
            .map_err(|e| AgentError::Tts(format!("invalid WAV container: {e}")))?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(AgentError::Tts(format!(
                "unsupported WAV format: {:?} {}-bit",
                spec.sample_format, spec.bits_per_sample
            )));
        }

        let mut data = Vec::with_capacity(reader.len() as usize * 2);
        for sample in reader.into_samples::<i16>() {
            let s = sample.map_err(|e| AgentError::Tts(format!("WAV read failed: {e}")))?;
            data.extend_from_slice(&s.to_le_bytes());
        }

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            data,
        })
    }
}
