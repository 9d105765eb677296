//! Message types passed between pipeline stages.

/// One fixed-duration slice of transport audio.
///
/// Frames are immutable after capture: whichever stage holds one may read
/// it, never rewrite it.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Signed 16-bit samples, interleaved when `channels > 1`.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels (1 = mono).
    pub channels: u16,
}

impl AudioFrame {
    /// Create a frame from its parts.
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }
}

/// A complete detected utterance: the speech frames plus the trailing
/// silence tail, in arrival order.
#[derive(Debug, Clone)]
pub struct SpeechSegment {
    /// Frames covering the utterance.
    pub frames: Vec<AudioFrame>,
    /// Sample rate of the frames in Hz.
    pub sample_rate: u32,
}

impl SpeechSegment {
    /// Number of frames, silence tail included.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The segment's samples concatenated into one buffer for transcription.
    pub fn concat_samples(&self) -> Vec<i16> {
        let total: usize = self.frames.iter().map(|f| f.samples.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for frame in &self.frames {
            samples.extend_from_slice(&frame.samples);
        }
        samples
    }

    /// Duration of the segment in seconds.
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let total: usize = self.frames.iter().map(|f| f.samples.len()).sum();
        total as f32 / self.sample_rate as f32
    }
}
