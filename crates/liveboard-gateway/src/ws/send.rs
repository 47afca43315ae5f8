use tokio::sync::mpsc;

/// Serialize any value to JSON and queue it on a connection's outbound
/// channel. Fails only when the connection is already gone.
pub async fn json<T: serde::Serialize>(
    tx: &mpsc::Sender<String>,
    payload: &T,
) -> Result<(), liveboard_core::LiveboardError> {
    let json = serde_json::to_string(payload)?;
    tx.send(json)
        .await
        .map_err(|_| liveboard_core::LiveboardError::Internal("connection closed".to_string()))
}

/// Like [`json`], but never waits. Used from the connection loop, which is
/// itself the consumer of `tx`; a full queue hands the frame to a task.
pub fn queue_json<T: serde::Serialize>(
    tx: &mpsc::Sender<String>,
    payload: &T,
) -> Result<(), liveboard_core::LiveboardError> {
    let json = serde_json::to_string(payload)?;
    match tx.try_send(json) {
        Ok(()) => Ok(()),
        Err(mpsc::error::TrySendError::Full(json)) => {
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(json).await;
            });
            Ok(())
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(
            liveboard_core::LiveboardError::Internal("connection closed".to_string()),
        ),
    }
}
