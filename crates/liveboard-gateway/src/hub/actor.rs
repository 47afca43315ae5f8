use std::sync::Arc;

use liveboard_core::error::{LiveboardError, Result};
use liveboard_core::types::{ChannelId, ConnId};
use liveboard_protocol::events::{LiveEvent, TopLikerEntry, TopLikerPayload};
use liveboard_ranking::{Ledger, RankDetector, RankEntry};
use liveboard_upstream::{
    normalize, Completion, ConnectionState, LiveSource, Normalized, PumpItem, UpstreamConnector,
    UpstreamError,
};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::attempt::{superseded, Attempt};
use super::broadcast::Subscribers;
use super::{Command, ConfigureOutcome, HubSnapshot};

pub(crate) struct HubActor {
    source: Arc<dyn LiveSource>,
    connector: UpstreamConnector,
    ledger: Ledger,
    ranker: RankDetector,
    subscribers: Subscribers,
    /// Attempt task of the current (or most recent) upstream session.
    attempt: Option<Attempt>,
    /// Task of an ended session that may still be closing its stream.
    closing: Option<JoinHandle<()>>,
    commands: mpsc::WeakSender<Command>,
}

impl HubActor {
    pub fn new(
        source: Arc<dyn LiveSource>,
        top_k: usize,
        commands: mpsc::WeakSender<Command>,
    ) -> Self {
        Self {
            source,
            connector: UpstreamConnector::new(),
            ledger: Ledger::new(),
            ranker: RankDetector::new(top_k),
            subscribers: Subscribers::new(),
            attempt: None,
            closing: None,
            commands,
        }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!(source = self.source.name(), top_k = self.ranker.k(), "broadcast hub started");
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd);
        }
        self.end_session("hub stopped");
        info!("broadcast hub stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Register { conn_id, tx } => self.register(conn_id, tx),
            Command::Unregister { conn_id } => {
                if self.subscribers.remove(&conn_id) {
                    debug!(conn_id = %conn_id, subscribers = self.subscribers.len(), "subscriber unregistered");
                }
            }
            Command::Configure { channel, reply } => self.configure(channel, reply),
            Command::Disconnect { reply } => {
                let ended = self.end_session("disconnect requested");
                let _ = reply.send(ended);
            }
            Command::Inject { kind, data, reply } => {
                let _ = reply.send(self.inject(&kind, &data));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::ConnectFinished {
                generation,
                channel,
                outcome,
                reply,
            } => self.connect_finished(generation, channel, outcome, reply),
            Command::Upstream { generation, item } => self.upstream(generation, item),
        }
    }

    fn register(&mut self, conn_id: ConnId, tx: mpsc::Sender<String>) {
        self.subscribers.insert(conn_id.clone(), tx);
        let status = self.status_event();
        self.subscribers.send_to(&conn_id, &status);
        debug!(conn_id = %conn_id, subscribers = self.subscribers.len(), "subscriber registered");
    }

    fn configure(&mut self, channel: ChannelId, reply: oneshot::Sender<Result<ConfigureOutcome>>) {
        self.end_session("reconfigured");

        let Some(tx) = self.commands.upgrade() else {
            let _ = reply.send(Err(LiveboardError::HubUnavailable));
            return;
        };
        let ticket = self.connector.begin(channel);
        let previous = self.closing.take();
        self.attempt = Some(Attempt::spawn(
            Arc::clone(&self.source),
            ticket,
            previous,
            tx,
            reply,
        ));
    }

    fn connect_finished(
        &mut self,
        generation: u64,
        channel: ChannelId,
        outcome: std::result::Result<(), UpstreamError>,
        reply: oneshot::Sender<Result<ConfigureOutcome>>,
    ) {
        if self.connector.complete(generation, outcome.is_ok()) == Completion::Stale {
            let _ = reply.send(Err(superseded(&channel)));
            return;
        }

        match outcome {
            Ok(()) => {
                self.publish(&LiveEvent::status(true, Some(channel.to_string())));
                let _ = reply.send(Ok(ConfigureOutcome {
                    username: channel.to_string(),
                    connected: true,
                }));
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "upstream connect failed");
                if let Some(attempt) = self.attempt.take() {
                    self.closing = Some(attempt.task);
                }
                self.publish(&LiveEvent::error(e.to_string()));
                let _ = reply.send(Err(LiveboardError::Upstream(e.to_string())));
            }
        }
    }

    fn upstream(&mut self, generation: u64, item: PumpItem) {
        if !self.connector.accepts(generation) {
            debug!(generation, "dropping event from stale upstream session");
            return;
        }

        match item {
            PumpItem::Event(raw) => match normalize(&raw.kind, &raw.data) {
                Normalized::Event(event) => self.process(event),
                Normalized::PlatformError(message) => {
                    warn!(%message, "platform reported an error");
                    self.publish(&LiveEvent::error(message));
                }
                Normalized::StreamEnded => {
                    self.end_session("stream ended by platform");
                }
                Normalized::Ignored => {}
            },
            PumpItem::Error(e) => {
                warn!(error = %e, fatal = e.is_fatal(), "upstream error");
                self.publish(&LiveEvent::error(e.to_string()));
                if e.is_fatal() {
                    self.end_session("upstream failed");
                }
            }
            PumpItem::Ended => {
                self.end_session("upstream stream closed");
            }
        }
    }

    fn inject(&mut self, kind: &str, data: &Value) -> Result<()> {
        match normalize(kind, data) {
            Normalized::Event(event) => {
                debug!(kind, "injecting synthetic event");
                self.process(event);
                Ok(())
            }
            _ => Err(LiveboardError::InvalidParams(format!(
                "cannot inject event kind '{kind}'"
            ))),
        }
    }

    /// Relay one canonical event. A like first goes through the ledger and
    /// ranking, and a changed ranking is published before the like itself.
    fn process(&mut self, event: LiveEvent) {
        if let LiveEvent::Like(like) = &event {
            if like.like_count > 0 {
                self.ledger
                    .apply_increment(&like.username, &like.nickname, like.like_count);
                let ranking = self
                    .ranker
                    .evaluate(&self.ledger)
                    .map(|top| top_liker_event(top, like.timestamp));
                if let Some(ranking) = ranking {
                    self.publish(&ranking);
                }
            }
        }
        self.publish(&event);
    }

    /// Tear down the upstream session, if any: stop its task, reset the
    /// leaderboard, and tell subscribers when a live session went away.
    fn end_session(&mut self, reason: &str) -> bool {
        let was_connected = self.connector.state() == ConnectionState::Connected;
        let previous = self.connector.teardown();

        if let Some(attempt) = self.attempt.take() {
            self.closing = Some(attempt.stop());
        }
        self.ledger.clear();
        self.ranker.reset();

        if let Some(channel) = &previous {
            info!(channel = %channel, reason, "upstream session torn down");
        }
        if was_connected {
            self.publish(&LiveEvent::Disconnected);
            self.publish(&LiveEvent::status(false, None));
        }
        previous.is_some()
    }

    fn publish(&mut self, event: &LiveEvent) {
        let delivered = self.subscribers.publish(event);
        debug!(event = event.name(), delivered, "broadcast");
    }

    fn status_event(&self) -> LiveEvent {
        LiveEvent::status(
            self.connector.state() == ConnectionState::Connected,
            self.connector.connected_channel().map(|c| c.to_string()),
        )
    }

    fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            subscribers: self.subscribers.len(),
            upstream: self.connector.status(),
            leaderboard: self.ranker.snapshot().to_vec(),
            participants: self.ledger.len(),
        }
    }
}

fn top_liker_event(top: &[RankEntry], timestamp: i64) -> LiveEvent {
    LiveEvent::TopLiker(TopLikerPayload {
        top3: top
            .iter()
            .map(|e| TopLikerEntry {
                username: e.identity.clone(),
                nickname: e.display_name.clone(),
                like_count: e.score,
            })
            .collect(),
        timestamp,
    })
}
