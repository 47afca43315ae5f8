use std::sync::Arc;

use liveboard_core::LiveboardError;
use liveboard_protocol::{frames::ResFrame, methods};
use tracing::warn;

use crate::app::AppState;
use crate::ws::handlers;

/// Route a WS method call to the correct handler.
pub async fn route(
    method: &str,
    params: Option<&serde_json::Value>,
    req_id: &str,
    app: &Arc<AppState>,
) -> ResFrame {
    match method {
        // ------------------------------------------------------------------
        // Utility
        // ------------------------------------------------------------------
        methods::PING => ResFrame::ok(req_id, serde_json::json!({ "pong": true })),

        methods::STATUS => handlers::handle_status(req_id, app).await,

        // ------------------------------------------------------------------
        // Upstream control
        // ------------------------------------------------------------------
        methods::CONFIGURE => handlers::handle_configure(params, req_id, app).await,

        methods::DISCONNECT => handlers::handle_disconnect(req_id, app).await,

        // ------------------------------------------------------------------
        // Synthetic events (test.member, test.chat, ...)
        // ------------------------------------------------------------------
        other => match methods::injected_kind(other) {
            Some(kind) => handlers::handle_inject(kind, params, req_id, app).await,
            None => {
                warn!(method = other, "unknown method");
                handlers::error_res(
                    req_id,
                    &LiveboardError::MethodNotFound {
                        method: other.to_string(),
                    },
                )
            }
        },
    }
}
