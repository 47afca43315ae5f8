//! WebSocket relay source.
//!
//! Talks to a webcast bridge that holds the actual platform session and
//! re-emits its events as JSON text frames (`{"event": ..., "data": ...}`).
//! One WebSocket per upstream session; the channel is passed as the
//! `username` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use liveboard_core::config::UpstreamConfig;
use liveboard_core::types::ChannelId;
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::{
    error::UpstreamError,
    source::{LiveSource, LiveStream},
    types::RawEvent,
};

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub keepalive: Duration,
    pub silent_timeout: Duration,
}

impl From<&UpstreamConfig> for RelayConfig {
    fn from(c: &UpstreamConfig) -> Self {
        Self {
            url: c.relay_url.clone(),
            connect_timeout: Duration::from_millis(c.connect_timeout_ms),
            keepalive: Duration::from_secs(c.keepalive_secs.max(1)),
            silent_timeout: Duration::from_secs(c.silent_timeout_secs.max(1)),
        }
    }
}

pub struct RelaySource {
    config: RelayConfig,
}

impl RelaySource {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Relay URL for `channel`, with the channel as `username` query param.
    pub fn endpoint(&self, channel: &ChannelId) -> Result<url::Url, UpstreamError> {
        let mut url = url::Url::parse(&self.config.url)
            .map_err(|e| UpstreamError::ConnectionFailed(format!("invalid relay url: {e}")))?;
        url.query_pairs_mut().append_pair("username", channel.as_str());
        Ok(url)
    }
}

#[async_trait]
impl LiveSource for RelaySource {
    fn name(&self) -> &str {
        "relay"
    }

    async fn connect(&self, channel: &ChannelId) -> Result<Box<dyn LiveStream>, UpstreamError> {
        let url = self.endpoint(channel)?;
        info!(channel = %channel, relay = %self.config.url, "connecting to webcast relay");

        let timeout_ms = self.config.connect_timeout.as_millis() as u64;
        let (ws, _) = tokio::time::timeout(self.config.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| UpstreamError::Timeout { ms: timeout_ms })?
            .map_err(|e| UpstreamError::ConnectionFailed(e.to_string()))?;

        let start = Instant::now() + self.config.keepalive;
        let mut keepalive = interval_at(start, self.config.keepalive);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Ok(Box::new(RelayStream {
            ws,
            keepalive,
            silent_timeout: self.config.silent_timeout,
            last_activity: Instant::now(),
        }))
    }
}

struct RelayStream {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    keepalive: Interval,
    silent_timeout: Duration,
    last_activity: Instant,
}

#[async_trait]
impl LiveStream for RelayStream {
    async fn next_event(&mut self) -> Option<Result<RawEvent, UpstreamError>> {
        loop {
            tokio::select! {
                msg = self.ws.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.last_activity = Instant::now();
                            return Some(
                                serde_json::from_str::<RawEvent>(text.as_str())
                                    .map_err(|e| UpstreamError::Protocol(e.to_string())),
                            );
                        }
                        Some(Ok(Message::Ping(data))) => {
                            self.last_activity = Instant::now();
                            let _ = self.ws.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.last_activity = Instant::now();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| f.reason.to_string())
                                .filter(|r| !r.is_empty())
                                .unwrap_or_else(|| "closed by relay".to_string());
                            info!(%reason, "relay closed the stream");
                            return Some(Err(UpstreamError::StreamTerminated(reason)));
                        }
                        Some(Ok(_)) => {
                            debug!("ignoring non-text relay frame");
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "relay read error");
                            return Some(Err(UpstreamError::StreamTerminated(e.to_string())));
                        }
                        None => return None,
                    }
                }

                _ = self.keepalive.tick() => {
                    if self.last_activity.elapsed() > self.silent_timeout {
                        let secs = self.silent_timeout.as_secs();
                        warn!(secs, "relay inactivity timeout");
                        return Some(Err(UpstreamError::Silent { secs }));
                    }
                    if self.ws.send(Message::Ping(Vec::new().into())).await.is_err() {
                        return Some(Err(UpstreamError::StreamTerminated(
                            "keep-alive ping failed".to_string(),
                        )));
                    }
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!(error = %e, "relay close handshake failed");
        }
    }
}
