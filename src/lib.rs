//! Parley: real-time voice conversation agent over a streaming audio transport.
//!
//! This crate mediates a spoken conversation on a bidirectional audio
//! channel: Transport frames → VAD → STT → LLM → TTS → paced frames back out.
//!
//! # Architecture
//!
//! - **Energy meter**: RMS loudness per incoming 10 ms frame
//! - **Segmenter**: hysteresis state machine emitting complete utterances
//! - **Turn coordinator**: single-flight transcribe → generate → synthesize
//!   cycle; overlapping segments are dropped, never queued
//! - **Resampler**: synthesized waveform → mono 16-bit at the transport rate
//! - **Frame publisher**: 10 ms frames paced 10% faster than real time
//!
//! Transcription, generation, synthesis, and the transport itself are
//! external collaborators behind the trait seams in [`engines`] and
//! [`transport`]; the host wires real engines in and pushes frames through
//! an `mpsc` channel per subscribed track.

pub mod audio;
pub mod config;
pub mod engines;
pub mod error;
pub mod history;
pub mod logging;
pub mod pipeline;
pub mod transport;
pub mod vad;

pub use audio::publish::FramePublisher;
pub use config::AgentConfig;
pub use engines::{Generator, Synthesizer, SynthesizedWaveform, Transcriber};
pub use error::{AgentError, Result};
pub use history::{ConversationHistory, ConversationMessage, Role};
pub use pipeline::coordinator::TurnCoordinator;
pub use pipeline::ingest::{run_ingest_loop, spawn_ingest};
pub use pipeline::messages::{AudioFrame, SpeechSegment};
pub use transport::FrameSink;
pub use vad::VoiceActivitySegmenter;
