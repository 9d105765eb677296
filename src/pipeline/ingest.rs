//! Per-track audio ingestion loop.
//!
//! One cooperative task per subscribed track: it consumes transport frames
//! in arrival order, drives the segmenter synchronously (this path never
//! blocks), and submits closed segments to the coordinator. The loop ends
//! when the frame channel closes (stream failure or track-unsubscribe) or
//! the cancellation token fires; either way the process keeps running and a
//! new subscription can start a fresh loop.

use crate::pipeline::coordinator::TurnCoordinator;
use crate::pipeline::messages::AudioFrame;
use crate::vad::VoiceActivitySegmenter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the ingestion loop until the stream ends or `cancel` fires.
pub async fn run_ingest_loop(
    mut rx: mpsc::Receiver<AudioFrame>,
    mut segmenter: VoiceActivitySegmenter,
    coordinator: Arc<TurnCoordinator>,
    cancel: CancellationToken,
) {
    info!("audio ingestion started");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            frame = rx.recv() => {
                match frame {
                    Some(frame) => {
                        if let Some(segment) = segmenter.push_frame(frame) {
                            // Admission is resolved synchronously; a drop is
                            // logged by the coordinator.
                            let _ = coordinator.submit(segment);
                        }
                    }
                    None => {
                        info!("audio stream ended");
                        break;
                    }
                }
            }
        }
    }

    info!("audio ingestion stopped");
}

/// Spawn the ingestion loop as a task; cancel the token on track-unsubscribe.
pub fn spawn_ingest(
    rx: mpsc::Receiver<AudioFrame>,
    segmenter: VoiceActivitySegmenter,
    coordinator: Arc<TurnCoordinator>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_ingest_loop(rx, segmenter, coordinator, cancel))
}
