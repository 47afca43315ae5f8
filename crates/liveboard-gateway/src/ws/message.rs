use liveboard_protocol::{
    frames::{InboundFrame, ResFrame},
    methods::CONFIGURE,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::ws::{dispatch, send};

/// Process one inbound WS text frame.
///
/// `configure` can wait on a platform handshake, so it runs as its own task
/// and the connection keeps relaying events meanwhile. Every other method is
/// a quick hub round-trip and is answered inline.
pub async fn handle(conn_id: &str, text: &str, tx: &mpsc::Sender<String>, app: &Arc<AppState>) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(conn_id, error = %e, "malformed frame");
            return;
        }
    };

    let Some(req) = frame.as_req() else {
        debug!(conn_id, frame_type = %frame.frame_type, "ignoring non-request frame");
        return;
    };

    if req.method == CONFIGURE {
        let tx = tx.clone();
        let app = Arc::clone(app);
        tokio::spawn(async move {
            let res = dispatch::route(&req.method, req.params.as_ref(), &req.id, &app).await;
            reply(&tx, &res).await;
        });
        return;
    }

    let res = dispatch::route(&req.method, req.params.as_ref(), &req.id, app).await;
    if let Err(e) = send::queue_json(tx, &res) {
        debug!(req_id = %res.id, error = %e, "response dropped");
    }
}

async fn reply(tx: &mpsc::Sender<String>, res: &ResFrame) {
    if let Err(e) = send::json(tx, res).await {
        debug!(req_id = %res.id, error = %e, "response dropped");
    }
}
