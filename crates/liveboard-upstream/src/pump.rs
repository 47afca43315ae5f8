use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{source::LiveStream, types::PumpItem};

/// Drain `stream`, forwarding every item through `wrap` into `tx` in arrival
/// order.
///
/// Stops on cancellation, after a fatal error or clean end, or when the
/// receiver is gone. The stream is always closed before this returns, so
/// once the future completes the platform connection is released.
pub async fn pump<C, F>(
    mut stream: Box<dyn LiveStream>,
    cancel: CancellationToken,
    tx: mpsc::Sender<C>,
    wrap: F,
) where
    F: Fn(PumpItem) -> C,
{
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("upstream pump cancelled");
                break;
            }

            next = stream.next_event() => {
                let (item, last) = match next {
                    Some(Ok(event)) => (PumpItem::Event(event), false),
                    Some(Err(e)) => {
                        let fatal = e.is_fatal();
                        (PumpItem::Error(e), fatal)
                    }
                    None => (PumpItem::Ended, true),
                };
                if tx.send(wrap(item)).await.is_err() || last {
                    break;
                }
            }
        }
    }
    stream.close().await;
}
