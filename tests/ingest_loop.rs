//! Ingestion loop tests: frames in, segments submitted, clean shutdown.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use parley::audio::publish::FramePublisher;
use parley::config::VadConfig;
use parley::engines::{Generator, Synthesizer, SynthesizedWaveform, Transcriber};
use parley::error::Result;
use parley::history::{ConversationHistory, ConversationMessage};
use parley::pipeline::coordinator::TurnCoordinator;
use parley::pipeline::ingest::spawn_ingest;
use parley::pipeline::messages::AudioFrame;
use parley::transport::FrameSink;
use parley::vad::VoiceActivitySegmenter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const RATE: u32 = 48_000;

struct CountingTranscriber {
    calls: AtomicUsize,
}

impl Transcriber for CountingTranscriber {
    fn transcribe(&self, _samples: &[i16], _sample_rate: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Empty result: the turn ends after transcription, which is all
        // these tests need.
        Ok(String::new())
    }
}

struct NoopGenerator;

impl Generator for NoopGenerator {
    fn generate(&self, _history: &[ConversationMessage]) -> Result<String> {
        Ok(String::new())
    }
}

struct NoopSynthesizer;

impl Synthesizer for NoopSynthesizer {
    fn synthesize(&self, _text: &str) -> Result<SynthesizedWaveform> {
        Ok(SynthesizedWaveform {
            sample_rate: RATE,
            channels: 1,
            bits_per_sample: 16,
            data: Vec::new(),
        })
    }
}

struct NullSink;

#[async_trait::async_trait]
impl FrameSink for NullSink {
    async fn publish(&self, _frame: AudioFrame) -> Result<()> {
        Ok(())
    }
}

fn build() -> (Arc<TurnCoordinator>, Arc<CountingTranscriber>) {
    let transcriber = Arc::new(CountingTranscriber {
        calls: AtomicUsize::new(0),
    });
    let publisher = Arc::new(FramePublisher::new(Arc::new(NullSink), RATE));
    let history = Arc::new(Mutex::new(ConversationHistory::new("sys")));
    let coordinator = Arc::new(TurnCoordinator::new(
        Arc::clone(&transcriber) as Arc<dyn Transcriber>,
        Arc::new(NoopGenerator),
        Arc::new(NoopSynthesizer),
        publisher,
        history,
    ));
    (coordinator, transcriber)
}

fn segmenter() -> VoiceActivitySegmenter {
    // hangover = 3 frames, min = 2 frames.
    let config = VadConfig {
        energy_threshold: 100.0,
        silence_hangover_ms: 30,
        min_speech_ms: 20,
        max_speech_ms: 0,
    };
    VoiceActivitySegmenter::new(&config, RATE)
}

fn loud_frame() -> AudioFrame {
    AudioFrame::new(vec![2_000i16; 480], RATE, 1)
}

fn quiet_frame() -> AudioFrame {
    AudioFrame::new(vec![0i16; 480], RATE, 1)
}

async fn wait_for_calls(transcriber: &CountingTranscriber, expected: usize) {
    for _ in 0..1_000 {
        if transcriber.calls.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("transcriber never reached {expected} calls");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn utterance_flows_from_frames_to_transcriber() {
    let (coordinator, transcriber) = build();
    let (tx, rx) = mpsc::channel::<AudioFrame>(64);
    let cancel = CancellationToken::new();
    let handle = spawn_ingest(rx, segmenter(), coordinator, cancel.clone());

    for _ in 0..10 {
        tx.send(loud_frame()).await.unwrap();
    }
    for _ in 0..5 {
        tx.send(quiet_frame()).await.unwrap();
    }

    wait_for_calls(&transcriber, 1).await;
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stream_end_terminates_the_loop() {
    let (coordinator, _transcriber) = build();
    let (tx, rx) = mpsc::channel::<AudioFrame>(64);
    let cancel = CancellationToken::new();
    let handle = spawn_ingest(rx, segmenter(), coordinator, cancel);

    drop(tx);
    // Loop must finish on its own; no cancellation needed.
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("ingest loop should end when the stream closes")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsubscribe_cancellation_terminates_the_loop() {
    let (coordinator, transcriber) = build();
    let (tx, rx) = mpsc::channel::<AudioFrame>(64);
    let cancel = CancellationToken::new();
    let handle = spawn_ingest(rx, segmenter(), coordinator, cancel.clone());

    tx.send(loud_frame()).await.unwrap();
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("ingest loop should end on cancellation")
        .unwrap();

    // The open segment never closed, so nothing reached the transcriber.
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sub_threshold_audio_never_submits_a_turn() {
    let (coordinator, transcriber) = build();
    let (tx, rx) = mpsc::channel::<AudioFrame>(64);
    let cancel = CancellationToken::new();
    let handle = spawn_ingest(rx, segmenter(), coordinator, cancel);

    for _ in 0..200 {
        tx.send(quiet_frame()).await.unwrap();
    }
    drop(tx);
    handle.await.unwrap();

    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
}
