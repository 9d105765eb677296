//! Paced publication of synthesized audio to the transport.

use crate::audio::samples_per_frame;
use crate::error::Result;
use crate::pipeline::messages::AudioFrame;
use crate::transport::FrameSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Pacing factor relative to real time.
///
/// Frames go out 10% faster than real time: sending as fast as possible
/// would overflow the transport's jitter buffer, while exact real-time
/// pacing risks underrun on scheduler delay.
const PACING_FACTOR: f64 = 0.9;

/// Slices a mono waveform into fixed 10 ms frames and emits them to the
/// transport at near-real-time cadence.
pub struct FramePublisher {
    sink: Arc<dyn FrameSink>,
    sample_rate: u32,
    frame_samples: usize,
    pace: Duration,
}

impl FramePublisher {
    /// Create a publisher for the given sink and transport sample rate.
    pub fn new(sink: Arc<dyn FrameSink>, sample_rate: u32) -> Self {
        let frame_samples = samples_per_frame(sample_rate);
        let frame_duration = frame_samples as f64 / f64::from(sample_rate);
        Self {
            sink,
            sample_rate,
            frame_samples,
            pace: Duration::from_secs_f64(frame_duration * PACING_FACTOR),
        }
    }

    /// The transport sample rate this publisher emits at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Publish a mono 16-bit buffer as a paced sequence of frames.
    ///
    /// The final partial frame is zero-padded to full size. An empty buffer
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the sink's error; remaining frames are not sent.
    pub async fn publish_waveform(&self, samples: &[i16]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let frame_count = samples.len().div_ceil(self.frame_samples);
        debug!(
            "publishing {} samples as {frame_count} frames at {}Hz",
            samples.len(),
            self.sample_rate
        );

        for chunk in samples.chunks(self.frame_samples) {
            let mut frame_samples = chunk.to_vec();
            frame_samples.resize(self.frame_samples, 0);

            let frame = AudioFrame::new(frame_samples, self.sample_rate, 1);
            self.sink.publish(frame).await?;

            tokio::time::sleep(self.pace).await;
        }

        Ok(())
    }
}
