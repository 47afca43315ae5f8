use std::sync::Arc;

use liveboard_core::error::{LiveboardError, Result};
use liveboard_core::types::ChannelId;
use liveboard_upstream::pump::pump;
use liveboard_upstream::{ConnectTicket, LiveSource};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Command, ConfigureOutcome};

/// One upstream connect attempt and, if it succeeds, the session it becomes.
///
/// The task's lifetime covers the whole platform connection: it finishes
/// only after the stream is closed. A newer attempt awaits the previous
/// task before dialing, so two platform connections never overlap.
pub(crate) struct Attempt {
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

impl Attempt {
    pub fn spawn(
        source: Arc<dyn LiveSource>,
        ticket: ConnectTicket,
        previous: Option<JoinHandle<()>>,
        tx: mpsc::Sender<Command>,
        reply: oneshot::Sender<Result<ConfigureOutcome>>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(source, ticket, previous, cancel.clone(), tx, reply));
        Self { cancel, task }
    }

    /// Signal the task to close its stream; returns the handle to await.
    pub fn stop(self) -> JoinHandle<()> {
        self.cancel.cancel();
        self.task
    }
}

async fn run(
    source: Arc<dyn LiveSource>,
    ticket: ConnectTicket,
    previous: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    tx: mpsc::Sender<Command>,
    reply: oneshot::Sender<Result<ConfigureOutcome>>,
) {
    let ConnectTicket {
        generation,
        channel,
    } = ticket;

    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = source.connect(&channel) => Some(result),
    };

    let stream = match connected {
        None => {
            debug!(channel = %channel, generation, "connect superseded before completion");
            let _ = reply.send(Err(superseded(&channel)));
            return;
        }
        Some(Err(e)) => {
            let _ = tx
                .send(Command::ConnectFinished {
                    generation,
                    channel,
                    outcome: Err(e),
                    reply,
                })
                .await;
            return;
        }
        Some(Ok(stream)) => stream,
    };

    info!(channel = %channel, source = source.name(), generation, "upstream stream open");
    let finished = Command::ConnectFinished {
        generation,
        channel,
        outcome: Ok(()),
        reply,
    };
    if tx.send(finished).await.is_err() {
        let mut stream = stream;
        stream.close().await;
        return;
    }

    pump(stream, cancel, tx, move |item| Command::Upstream { generation, item }).await;
}

pub(crate) fn superseded(channel: &ChannelId) -> LiveboardError {
    LiveboardError::Superseded {
        channel: channel.to_string(),
    }
}
