//! Upstream connector state machine.
//!
//! Tracks which channel the process is attached to and which connect attempt
//! is current. Every `begin` or `teardown` bumps the generation, so results
//! and events from an older attempt can be recognised and thrown away.
//! The connector does no I/O itself; the hub drives the sockets and reports
//! outcomes back here.

use liveboard_core::types::ChannelId;
use tracing::{debug, info};

use crate::types::{ConnectionState, ConnectorStatus};

/// Issued by [`UpstreamConnector::begin`]; hand it back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTicket {
    pub generation: u64,
    pub channel: ChannelId,
}

/// Outcome of reporting a connect result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result belonged to the current attempt and was applied.
    Applied,
    /// A newer `begin` or a `teardown` happened meanwhile; discard the result.
    Stale,
}

#[derive(Debug)]
pub struct UpstreamConnector {
    state: ConnectionState,
    channel: Option<ChannelId>,
    generation: u64,
}

impl UpstreamConnector {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            channel: None,
            generation: 0,
        }
    }

    /// Start a connect attempt for `channel`.
    ///
    /// The caller must have run [`teardown`](Self::teardown) (and its side
    /// effects) first if a session existed; any attempt still in flight is
    /// superseded either way.
    pub fn begin(&mut self, channel: ChannelId) -> ConnectTicket {
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        self.channel = Some(channel.clone());
        info!(channel = %channel, generation = self.generation, "upstream connecting");
        ConnectTicket {
            generation: self.generation,
            channel,
        }
    }

    /// Report the result of the attempt identified by `generation`.
    pub fn complete(&mut self, generation: u64, success: bool) -> Completion {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            debug!(
                generation,
                current = self.generation,
                "discarding stale connect completion"
            );
            return Completion::Stale;
        }

        if success {
            self.state = ConnectionState::Connected;
            info!(channel = ?self.channel.as_ref().map(|c| c.as_str()), generation, "upstream connected");
        } else {
            self.state = ConnectionState::Idle;
            self.channel = None;
        }
        Completion::Applied
    }

    /// End the current session or attempt. Returns the channel that was
    /// active, or `None` if the connector was already idle.
    pub fn teardown(&mut self) -> Option<ChannelId> {
        if self.state == ConnectionState::Idle {
            return None;
        }
        self.generation += 1;
        self.state = ConnectionState::Idle;
        let previous = self.channel.take();
        info!(channel = ?previous.as_ref().map(|c| c.as_str()), "upstream session ended");
        previous
    }

    /// Whether an event produced under `generation` belongs to the live session.
    pub fn accepts(&self, generation: u64) -> bool {
        self.state == ConnectionState::Connected && generation == self.generation
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Channel of the live session; `None` unless connected.
    pub fn connected_channel(&self) -> Option<&ChannelId> {
        match self.state {
            ConnectionState::Connected => self.channel.as_ref(),
            _ => None,
        }
    }

    pub fn status(&self) -> ConnectorStatus {
        ConnectorStatus {
            state: self.state,
            channel: self.channel.as_ref().map(|c| c.as_str().to_string()),
            generation: self.generation,
        }
    }
}

impl Default for UpstreamConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> ChannelId {
        ChannelId::parse(name).unwrap()
    }

    #[test]
    fn successful_connect_reaches_connected() {
        let mut connector = UpstreamConnector::new();
        let ticket = connector.begin(channel("streamer"));
        assert_eq!(connector.state(), ConnectionState::Connecting);
        assert!(connector.connected_channel().is_none());

        assert_eq!(connector.complete(ticket.generation, true), Completion::Applied);
        assert_eq!(connector.state(), ConnectionState::Connected);
        assert_eq!(connector.connected_channel().unwrap().as_str(), "streamer");
        assert!(connector.accepts(ticket.generation));
    }

    #[test]
    fn failed_connect_returns_to_idle_without_channel() {
        let mut connector = UpstreamConnector::new();
        let ticket = connector.begin(channel("streamer"));

        assert_eq!(connector.complete(ticket.generation, false), Completion::Applied);
        assert_eq!(connector.state(), ConnectionState::Idle);
        assert!(connector.status().channel.is_none());
    }

    #[test]
    fn superseded_attempt_is_stale() {
        let mut connector = UpstreamConnector::new();
        let old = connector.begin(channel("first"));
        let new = connector.begin(channel("second"));

        assert_eq!(connector.complete(old.generation, true), Completion::Stale);
        assert_eq!(connector.state(), ConnectionState::Connecting);

        assert_eq!(connector.complete(new.generation, true), Completion::Applied);
        assert_eq!(connector.connected_channel().unwrap().as_str(), "second");
        assert!(!connector.accepts(old.generation));
    }

    #[test]
    fn teardown_during_connect_invalidates_attempt() {
        let mut connector = UpstreamConnector::new();
        let ticket = connector.begin(channel("streamer"));

        assert_eq!(connector.teardown().unwrap().as_str(), "streamer");
        assert_eq!(connector.complete(ticket.generation, true), Completion::Stale);
        assert_eq!(connector.state(), ConnectionState::Idle);
    }

    #[test]
    fn teardown_when_idle_is_a_no_op() {
        let mut connector = UpstreamConnector::new();
        let before = connector.generation();
        assert!(connector.teardown().is_none());
        assert_eq!(connector.generation(), before);
    }

    #[test]
    fn events_from_old_session_are_rejected_after_teardown() {
        let mut connector = UpstreamConnector::new();
        let ticket = connector.begin(channel("streamer"));
        connector.complete(ticket.generation, true);
        connector.teardown();

        assert!(!connector.accepts(ticket.generation));
    }
}
