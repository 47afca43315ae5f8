//! In-process live source.
//!
//! Backs the `offline` upstream mode (connect always succeeds, only synthetic
//! events flow) and doubles as a scriptable platform in tests: events can be
//! pushed into an open stream, connects can be rejected or delayed, and open
//! streams can be counted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use liveboard_core::types::ChannelId;
use tokio::sync::mpsc;

use crate::{
    error::UpstreamError,
    source::{LiveSource, LiveStream},
    types::RawEvent,
};

type Item = Result<RawEvent, UpstreamError>;

#[derive(Default)]
struct Inner {
    /// Open streams keyed by stream id.
    feeds: HashMap<u64, (String, mpsc::UnboundedSender<Item>)>,
    next_id: u64,
    rejections: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    connects: usize,
}

#[derive(Clone, Default)]
pub struct MemorySource {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every connect to `channel` fail with `reason`.
    pub fn reject(&self, channel: &str, reason: &str) {
        self.lock().rejections.insert(channel.to_string(), reason.to_string());
    }

    /// Make connects to `channel` take `delay` before resolving.
    pub fn delay(&self, channel: &str, delay: Duration) {
        self.lock().delays.insert(channel.to_string(), delay);
    }

    /// Deliver an event to every open stream of `channel`. Returns how many
    /// streams received it.
    pub fn push(&self, channel: &str, event: RawEvent) -> usize {
        self.send(channel, || Ok(event.clone()))
    }

    /// Deliver an error to every open stream of `channel`.
    pub fn fail(&self, channel: &str, error: impl Fn() -> UpstreamError) -> usize {
        self.send(channel, || Err(error()))
    }

    /// End every open stream of `channel` cleanly.
    pub fn end(&self, channel: &str) {
        self.lock().feeds.retain(|_, (c, _)| c != channel);
    }

    pub fn open_streams(&self) -> usize {
        self.lock().feeds.len()
    }

    pub fn open_streams_for(&self, channel: &str) -> usize {
        self.lock().feeds.values().filter(|(c, _)| c == channel).count()
    }

    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    fn send(&self, channel: &str, item: impl Fn() -> Item) -> usize {
        self.lock()
            .feeds
            .values()
            .filter(|(c, _)| c == channel)
            .filter(|(_, tx)| tx.send(item()).is_ok())
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-update; the
        // maps are still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LiveSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn connect(&self, channel: &ChannelId) -> Result<Box<dyn LiveStream>, UpstreamError> {
        let delay = {
            let mut inner = self.lock();
            inner.connects += 1;
            inner.delays.get(channel.as_str()).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        if let Some(reason) = inner.rejections.get(channel.as_str()) {
            return Err(UpstreamError::ConnectionFailed(reason.clone()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.feeds.insert(id, (channel.as_str().to_string(), tx));

        Ok(Box::new(MemoryStream {
            id,
            rx,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MemoryStream {
    id: u64,
    rx: mpsc::UnboundedReceiver<Item>,
    inner: Arc<Mutex<Inner>>,
}

#[async_trait]
impl LiveStream for MemoryStream {
    async fn next_event(&mut self) -> Option<Item> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .feeds
            .remove(&self.id);
        self.rx.close();
    }
}
