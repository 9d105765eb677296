//! Voice activity segmentation using energy-based analysis.
//!
//! A two-state hysteresis machine over per-frame RMS energy: speech onset
//! opens a segment, a sustained run of silent frames closes it. Trailing
//! silence is kept inside the segment as context for the transcriber.

use crate::audio::energy::frame_rms;
use crate::audio::FRAME_DURATION_MS;
use crate::config::VadConfig;
use crate::pipeline::messages::{AudioFrame, SpeechSegment};
use tracing::{debug, info};

/// Energy-threshold voice activity segmenter.
///
/// Drives its state from frames pushed strictly in arrival order. The
/// segmenter owns its state exclusively; it must not be fed concurrently
/// for the same transport stream.
pub struct VoiceActivitySegmenter {
    /// Frames accumulated for the current segment, silence tail included.
    buffer: Vec<AudioFrame>,
    /// Whether we are currently inside a speech segment.
    in_speech: bool,
    /// Consecutive silent frames observed while speaking.
    silence_frames: u32,
    /// Silent-frame run required to close a segment.
    hangover_frames: u32,
    /// Minimum total frame count for a segment to be emitted.
    min_speech_frames: usize,
    /// Forced-cutover frame count; 0 disables the cap.
    max_speech_frames: usize,
    /// RMS amplitude threshold; energy strictly above it counts as speech.
    threshold: f32,
    /// Sample rate carried into emitted segments.
    sample_rate: u32,
}

impl VoiceActivitySegmenter {
    /// Create a segmenter for a stream at the given sample rate.
    ///
    /// Durations in the config are converted to frame counts at the fixed
    /// 10 ms frame duration.
    pub fn new(config: &VadConfig, sample_rate: u32) -> Self {
        let per_frame = FRAME_DURATION_MS as u32;
        let hangover_frames = config.silence_hangover_ms / per_frame;
        let min_speech_frames = (config.min_speech_ms / per_frame) as usize;
        let max_speech_frames = (config.max_speech_ms / per_frame) as usize;

        info!(
            "segmenter initialized: threshold={}, hangover={} frames, min_speech={} frames",
            config.energy_threshold, hangover_frames, min_speech_frames
        );

        Self {
            buffer: Vec::new(),
            in_speech: false,
            silence_frames: 0,
            hangover_frames,
            min_speech_frames,
            max_speech_frames,
            threshold: config.energy_threshold,
            sample_rate,
        }
    }

    /// Feed one frame; returns a segment when one closes on this frame.
    pub fn push_frame(&mut self, frame: AudioFrame) -> Option<SpeechSegment> {
        let energy = frame_rms(&frame.samples);
        let is_speech = energy > self.threshold;

        if is_speech {
            if !self.in_speech {
                debug!("speech started (energy: {energy:.0})");
                self.in_speech = true;
                self.buffer.clear();
            }
            self.silence_frames = 0;
            self.buffer.push(frame);

            if self.max_speech_frames > 0 && self.buffer.len() >= self.max_speech_frames {
                info!("segment reached maximum length, forcing cutover");
                return self.close_segment();
            }
        } else if self.in_speech {
            // Keep trailing silence as context.
            self.buffer.push(frame);
            self.silence_frames += 1;

            if self.silence_frames >= self.hangover_frames {
                return self.close_segment();
            }
        }

        None
    }

    /// Reset to Idle, discarding any accumulated frames.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.in_speech = false;
        self.silence_frames = 0;
    }

    fn close_segment(&mut self) -> Option<SpeechSegment> {
        self.in_speech = false;
        self.silence_frames = 0;

        let frames = std::mem::take(&mut self.buffer);
        if frames.len() < self.min_speech_frames {
            debug!("segment too short ({} frames), discarding", frames.len());
            return None;
        }

        info!("speech segment detected: {} frames", frames.len());
        Some(SpeechSegment {
            frames,
            sample_rate: self.sample_rate,
        })
    }
}
