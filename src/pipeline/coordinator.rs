//! Single-flight turn coordination.
//!
//! One [`TurnCoordinator`] drives the full response cycle for a finalized
//! speech segment: transcribe → generate → synthesize → resample → publish.
//! At most one cycle is in flight at any instant; segments submitted while
//! a cycle runs are dropped, not queued.

use crate::audio::publish::FramePublisher;
use crate::audio::resample::to_mono_target_rate;
use crate::engines::{Generator, Synthesizer, Transcriber};
use crate::history::ConversationHistory;
use crate::pipeline::messages::SpeechSegment;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

/// Fixed reply substituted when generation fails.
const APOLOGY: &str = "I'm sorry, I had trouble generating a response.";

/// Releases the busy flag when the turn task exits, on every path.
struct TurnGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Drives one response cycle per speech segment, never two at once.
///
/// The busy flag is the pipeline's only admission-control mechanism: it is
/// taken synchronously inside [`submit`](Self::submit), before any
/// suspension point, so two segments closing back-to-back cannot both be
/// admitted.
pub struct TurnCoordinator {
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn Generator>,
    synthesizer: Arc<dyn Synthesizer>,
    publisher: Arc<FramePublisher>,
    history: Arc<Mutex<ConversationHistory>>,
    busy: Arc<AtomicBool>,
}

impl TurnCoordinator {
    /// Create a coordinator over the given collaborators and transcript.
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn Generator>,
        synthesizer: Arc<dyn Synthesizer>,
        publisher: Arc<FramePublisher>,
        history: Arc<Mutex<ConversationHistory>>,
    ) -> Self {
        Self {
            transcriber,
            generator,
            synthesizer,
            publisher,
            history,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Submit a finalized segment for one response cycle.
    ///
    /// Returns `true` when the segment was admitted and a turn task spawned;
    /// `false` when a cycle is already in flight (the segment is dropped).
    /// The idle→busy transition happens atomically on the calling task, so
    /// admission and spawn are one step. Must be called from within a tokio
    /// runtime.
    pub fn submit(&self, segment: SpeechSegment) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!(
                "turn in progress, dropping segment ({} frames)",
                segment.frame_count()
            );
            return false;
        }

        let guard = TurnGuard {
            busy: Arc::clone(&self.busy),
        };
        let ctx = TurnContext {
            transcriber: Arc::clone(&self.transcriber),
            generator: Arc::clone(&self.generator),
            synthesizer: Arc::clone(&self.synthesizer),
            publisher: Arc::clone(&self.publisher),
            history: Arc::clone(&self.history),
        };

        tokio::spawn(async move {
            run_turn(ctx, segment, guard).await;
        });

        true
    }

    /// Whether a turn is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The shared conversation transcript.
    pub fn history(&self) -> Arc<Mutex<ConversationHistory>> {
        Arc::clone(&self.history)
    }
}

/// Collaborator handles cloned into a turn task.
struct TurnContext {
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn Generator>,
    synthesizer: Arc<dyn Synthesizer>,
    publisher: Arc<FramePublisher>,
    history: Arc<Mutex<ConversationHistory>>,
}

/// One full response cycle. Every external call runs on the blocking pool
/// so the ingestion loop is never stalled; the guard releases the busy flag
/// on every exit path, including worker panics.
async fn run_turn(ctx: TurnContext, segment: SpeechSegment, _guard: TurnGuard) {
    let sample_rate = segment.sample_rate;
    let samples = segment.concat_samples();
    info!(
        "transcribing {} frames ({:.2}s)",
        segment.frame_count(),
        segment.duration_seconds()
    );

    let transcriber = Arc::clone(&ctx.transcriber);
    let text = match tokio::task::spawn_blocking(move || transcriber.transcribe(&samples, sample_rate))
        .await
    {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            error!("transcription error: {e}");
            return;
        }
        Err(e) => {
            error!("transcription worker panicked: {e}");
            return;
        }
    };

    let text = text.trim().to_owned();
    if text.is_empty() {
        info!("no speech recognized in segment");
        return;
    }
    info!("user said: {text}");

    let reply = generate_reply(&ctx, &text).await;
    if reply.is_empty() {
        info!("empty reply, nothing to synthesize");
        return;
    }
    info!("agent response: {reply}");

    let synthesizer = Arc::clone(&ctx.synthesizer);
    let reply_for_tts = reply.clone();
    let waveform = match tokio::task::spawn_blocking(move || synthesizer.synthesize(&reply_for_tts))
        .await
    {
        Ok(Ok(waveform)) => waveform,
        Ok(Err(e)) => {
            error!("synthesis error: {e}");
            return;
        }
        Err(e) => {
            error!("synthesis worker panicked: {e}");
            return;
        }
    };

    if waveform.is_empty() {
        warn!("synthesizer returned empty audio");
        return;
    }

    let samples = to_mono_target_rate(&waveform, ctx.publisher.sample_rate());
    if samples.is_empty() {
        return;
    }

    info!(
        "publishing {} samples ({:.2}s)",
        samples.len(),
        samples.len() as f64 / f64::from(ctx.publisher.sample_rate())
    );
    if let Err(e) = ctx.publisher.publish_waveform(&samples).await {
        error!("publish error: {e}");
    }
}

/// Record the user message, run generation over the full history, and store
/// the stripped reply.
///
/// On generation failure the fixed apology is returned for synthesis but is
/// NOT appended to the transcript; the user message stays unanswered there.
async fn generate_reply(ctx: &TurnContext, user_text: &str) -> String {
    let snapshot = {
        let mut history = ctx
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        history.push_user(user_text);
        history.snapshot()
    };

    let generator = Arc::clone(&ctx.generator);
    let generated = match tokio::task::spawn_blocking(move || generator.generate(&snapshot)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(format!("{e}")),
        Err(e) => Err(format!("generation worker panicked: {e}")),
    };

    match generated {
        Ok(text) => {
            let reply = strip_think_blocks(&text).trim().to_owned();
            let mut history = ctx
                .history
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            history.push_assistant(&reply);
            reply
        }
        Err(e) => {
            error!("generation error: {e}");
            APOLOGY.to_owned()
        }
    }
}

/// Strip `<think>...</think>` blocks from generated text.
///
/// Tags match case-insensitively and blocks may span lines. An unclosed
/// opening tag discards the remainder of the text.
fn strip_think_blocks(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(start) = find_tag_ci(text, "<think>", cursor) {
        result.push_str(&text[cursor..start]);
        match find_tag_ci(text, "</think>", start + "<think>".len()) {
            Some(end) => cursor = end + "</think>".len(),
            None => return result,
        }
    }
    result.push_str(&text[cursor..]);
    result
}

/// Byte-wise ASCII case-insensitive search for `tag` at or after `from`.
///
/// The tags are pure ASCII, so a match position is always a char boundary.
fn find_tag_ci(text: &str, tag: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let tag = tag.as_bytes();
    if from + tag.len() > bytes.len() {
        return None;
    }
    (from..=bytes.len() - tag.len()).find(|&i| {
        bytes[i..i + tag.len()]
            .iter()
            .zip(tag)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}
