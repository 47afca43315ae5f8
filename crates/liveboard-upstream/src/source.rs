use async_trait::async_trait;
use liveboard_core::types::ChannelId;

use crate::{error::UpstreamError, types::RawEvent};

/// A broadcasting platform (or a bridge to one) that can open a live event
/// stream for a channel.
///
/// Implementations must be `Send + Sync` so one instance can be shared by the
/// hub and every connect task it spawns.
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Stable lowercase identifier (e.g. `"relay"`), used in logs.
    fn name(&self) -> &str;

    /// Open the live room of `channel` and attach to its event feed.
    ///
    /// Failures here are configuration-time failures and go back to whoever
    /// asked for the connection.
    async fn connect(&self, channel: &ChannelId) -> Result<Box<dyn LiveStream>, UpstreamError>;
}

/// An open event feed for one channel.
#[async_trait]
pub trait LiveStream: Send {
    /// Next raw event. `None` means the stream ended cleanly; an `Err` that
    /// [`is_fatal`](UpstreamError::is_fatal) means it ended badly.
    async fn next_event(&mut self) -> Option<Result<RawEvent, UpstreamError>>;

    /// Detach all listeners and close the underlying connection.
    async fn close(&mut self);
}
