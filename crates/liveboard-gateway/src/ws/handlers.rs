//! Concrete WS method handler functions.
//!
//! Each function extracts its parameters, calls the hub, and returns a
//! `ResFrame` for the requesting connection only. `dispatch::route` is the
//! only caller.

use liveboard_core::LiveboardError;
use liveboard_protocol::frames::ResFrame;
use tracing::{info, warn};

use crate::app::AppState;

pub(crate) fn error_res(req_id: &str, e: &LiveboardError) -> ResFrame {
    ResFrame::err(req_id, e.code(), &e.to_string())
}

// ---------------------------------------------------------------------------
// configure
// ---------------------------------------------------------------------------

/// Handler for `configure`.
///
/// Params: `{ "username": string }`
///
/// A blank username is rejected here without touching the current session.
/// Connect failures come back as `UPSTREAM_ERROR` (and are also broadcast).
pub async fn handle_configure(
    params: Option<&serde_json::Value>,
    req_id: &str,
    app: &AppState,
) -> ResFrame {
    let username = match params.and_then(|p| p.get("username")) {
        None | Some(serde_json::Value::Null) => "",
        Some(serde_json::Value::String(s)) => s.as_str(),
        Some(_) => {
            return ResFrame::err(req_id, "INVALID_PARAMS", "'username' must be a string");
        }
    };

    match app.hub.configure(username).await {
        Ok(outcome) => {
            info!(channel = %outcome.username, "configure succeeded");
            ResFrame::ok(req_id, outcome)
        }
        Err(e) => {
            warn!(error = %e, "configure failed");
            error_res(req_id, &e)
        }
    }
}

// ---------------------------------------------------------------------------
// disconnect
// ---------------------------------------------------------------------------

/// Handler for `disconnect`. Always succeeds; `was_connected` tells whether
/// there was a session to end.
pub async fn handle_disconnect(req_id: &str, app: &AppState) -> ResFrame {
    match app.hub.disconnect().await {
        Ok(ended) => ResFrame::ok(req_id, serde_json::json!({ "was_connected": ended })),
        Err(e) => error_res(req_id, &e),
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

pub async fn handle_status(req_id: &str, app: &AppState) -> ResFrame {
    match app.hub.snapshot().await {
        Ok(snapshot) => ResFrame::ok(req_id, snapshot),
        Err(e) => error_res(req_id, &e),
    }
}

// ---------------------------------------------------------------------------
// test.*
// ---------------------------------------------------------------------------

/// Handler for the `test.*` family.
///
/// Params carry the same fields as the real platform event, e.g.
/// `test.like { "username": "alice", "likeCount": 10, "nickname": "Alice" }`.
/// Missing params are treated as an empty payload.
pub async fn handle_inject(
    kind: &str,
    params: Option<&serde_json::Value>,
    req_id: &str,
    app: &AppState,
) -> ResFrame {
    let data = params.cloned().unwrap_or(serde_json::Value::Null);
    if !(data.is_object() || data.is_null()) {
        return ResFrame::err(req_id, "INVALID_PARAMS", "params must be an object");
    }

    match app.hub.inject(kind, data).await {
        Ok(()) => ResFrame::ok(req_id, serde_json::json!({ "injected": kind })),
        Err(e) => error_res(req_id, &e),
    }
}
