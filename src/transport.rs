//! Media transport seams.
//!
//! Incoming audio is modeled as an ordered `tokio::sync::mpsc` stream of
//! [`AudioFrame`] per subscribed track: the host pushes frames as the
//! transport delivers them and closes the channel on stream failure or
//! track-unsubscribe. Outgoing audio goes through [`FrameSink`].

use crate::error::Result;
use crate::pipeline::messages::AudioFrame;

/// Outgoing side of the media transport.
///
/// The publisher hands each paced frame to this sink; the implementation
/// forwards it to the transport's ingestion call.
#[async_trait::async_trait]
pub trait FrameSink: Send + Sync {
    /// Accept one outgoing audio frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the frame; publication of
    /// the remaining frames is aborted.
    async fn publish(&self, frame: AudioFrame) -> Result<()>;
}
