//! Broadcast hub. The one place where upstream session state, the like
//! ledger, the published ranking and the subscriber set live.
//!
//! All of it is owned by a single actor task and mutated only from there, in
//! the order commands arrive. [`HubHandle`] is the cloneable front door used
//! by WS connections, HTTP handlers and tests.

mod actor;
mod attempt;
pub mod broadcast;

use std::sync::Arc;

use liveboard_core::error::{LiveboardError, Result};
use liveboard_core::types::{ChannelId, ConnId};
use liveboard_ranking::RankEntry;
use liveboard_upstream::{ConnectorStatus, LiveSource, PumpItem, UpstreamError};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

const COMMAND_CAPACITY: usize = 1024;

/// Successful `configure` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigureOutcome {
    pub username: String,
    pub connected: bool,
}

/// Point-in-time view of the hub.
#[derive(Debug, Clone, Serialize)]
pub struct HubSnapshot {
    pub subscribers: usize,
    pub upstream: ConnectorStatus,
    pub leaderboard: Vec<RankEntry>,
    pub participants: usize,
}

pub(crate) enum Command {
    Register {
        conn_id: ConnId,
        tx: mpsc::Sender<String>,
    },
    Unregister {
        conn_id: ConnId,
    },
    Configure {
        channel: ChannelId,
        reply: oneshot::Sender<Result<ConfigureOutcome>>,
    },
    Disconnect {
        reply: oneshot::Sender<bool>,
    },
    Inject {
        kind: String,
        data: Value,
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<HubSnapshot>,
    },
    /// Sent by an attempt task once its connect resolves.
    ConnectFinished {
        generation: u64,
        channel: ChannelId,
        outcome: std::result::Result<(), UpstreamError>,
        reply: oneshot::Sender<Result<ConfigureOutcome>>,
    },
    /// Sent by an attempt task for every item its stream yields.
    Upstream {
        generation: u64,
        item: PumpItem,
    },
}

#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<Command>,
}

impl HubHandle {
    /// Start the hub actor. It runs until every handle is dropped and the
    /// upstream session, if any, has ended.
    pub fn spawn(source: Arc<dyn LiveSource>, top_k: usize) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let hub = actor::HubActor::new(source, top_k, tx.downgrade());
        tokio::spawn(hub.run(rx));
        Self { tx }
    }

    /// Add a subscriber. It immediately receives the current `status`.
    pub async fn register(&self, conn_id: ConnId, tx: mpsc::Sender<String>) -> Result<()> {
        self.send(Command::Register { conn_id, tx }).await
    }

    pub async fn unregister(&self, conn_id: ConnId) {
        // A stopped hub has no subscribers left to remove.
        let _ = self.send(Command::Unregister { conn_id }).await;
    }

    /// Attach to a new channel, replacing any current session. Resolves once
    /// the connect succeeds, fails, or is superseded by a newer request.
    pub async fn configure(&self, username: &str) -> Result<ConfigureOutcome> {
        let channel = ChannelId::parse(username)?;
        let (reply, rx) = oneshot::channel();
        self.send(Command::Configure { channel, reply }).await?;
        rx.await.map_err(|_| LiveboardError::HubUnavailable)?
    }

    /// End the upstream session. Returns whether one existed.
    pub async fn disconnect(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Disconnect { reply }).await?;
        rx.await.map_err(|_| LiveboardError::HubUnavailable)
    }

    /// Feed a synthetic platform event through the normal event path.
    pub async fn inject(&self, kind: &str, data: Value) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Inject {
            kind: kind.to_string(),
            data,
            reply,
        })
        .await?;
        rx.await.map_err(|_| LiveboardError::HubUnavailable)?
    }

    pub async fn snapshot(&self) -> Result<HubSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| LiveboardError::HubUnavailable)
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| LiveboardError::HubUnavailable)
    }
}
