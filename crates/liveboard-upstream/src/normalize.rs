//! Raw platform payload → canonical [`LiveEvent`].
//!
//! Platform payloads are loosely typed: fields go missing, numbers arrive as
//! strings, identities come as `uniqueId` or `username`. Everything is
//! resolved here so the rest of the gateway only sees typed events.
//! Both real upstream events and synthetic `test.*` events pass through
//! this one function.

use liveboard_core::types::now_millis;
use liveboard_protocol::events::{
    self, ChatPayload, GiftPayload, LikePayload, LiveEvent, ViewerPayload,
};
use serde_json::Value;
use tracing::debug;

/// Result of normalizing one raw event.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Event(LiveEvent),
    /// The platform reported a recoverable problem.
    PlatformError(String),
    /// The platform says the live room is over.
    StreamEnded,
    /// Event kind the gateway does not relay.
    Ignored,
}

/// Normalize with the current server time as the event timestamp.
pub fn normalize(kind: &str, data: &Value) -> Normalized {
    normalize_at(kind, data, now_millis())
}

pub fn normalize_at(kind: &str, data: &Value, timestamp: i64) -> Normalized {
    match kind {
        events::MEMBER => Normalized::Event(LiveEvent::Member(viewer(data, timestamp))),
        events::FOLLOW => Normalized::Event(LiveEvent::Follow(viewer(data, timestamp))),
        events::SHARE => Normalized::Event(LiveEvent::Share(viewer(data, timestamp))),
        events::CHAT => Normalized::Event(LiveEvent::Chat(chat(data, timestamp))),
        events::GIFT => Normalized::Event(LiveEvent::Gift(gift(data, timestamp))),
        events::LIKE => Normalized::Event(LiveEvent::Like(like(data, timestamp))),
        "social" => social(data, timestamp),
        "streamEnd" | "disconnected" => Normalized::StreamEnded,
        events::ERROR => Normalized::PlatformError(error_message(data)),
        other => {
            debug!(kind = other, "ignoring unhandled upstream event");
            Normalized::Ignored
        }
    }
}

/// Like-tap increment with its defaulting rules: missing or non-numeric is 1,
/// zero or negative is 0 (relayed, but no ledger effect).
pub fn like_increment(data: &Value) -> u64 {
    match integer(data, "likeCount") {
        None => 1,
        Some(n) if n <= 0 => 0,
        Some(n) => n as u64,
    }
}

fn viewer(data: &Value, timestamp: i64) -> ViewerPayload {
    let (username, nickname) = identity(data);
    ViewerPayload {
        username,
        nickname,
        profile_picture_url: text(data, &["profilePictureUrl"]),
        timestamp,
    }
}

fn chat(data: &Value, timestamp: i64) -> ChatPayload {
    let (username, nickname) = identity(data);
    ChatPayload {
        username,
        nickname,
        comment: text(data, &["comment"]).unwrap_or_default(),
        profile_picture_url: text(data, &["profilePictureUrl"]),
        timestamp,
    }
}

fn gift(data: &Value, timestamp: i64) -> GiftPayload {
    let (username, nickname) = identity(data);
    GiftPayload {
        username,
        nickname,
        gift_name: text(data, &["giftName"]).unwrap_or_default(),
        gift_id: integer(data, "giftId").and_then(|n| u64::try_from(n).ok()),
        repeat_count: integer(data, "repeatCount")
            .map(|n| n.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(1),
        repeat_end: flag(data, "repeatEnd").unwrap_or(false),
        profile_picture_url: text(data, &["profilePictureUrl"]),
        timestamp,
    }
}

fn like(data: &Value, timestamp: i64) -> LikePayload {
    let (username, nickname) = identity(data);
    LikePayload {
        username,
        nickname,
        like_count: like_increment(data),
        total_like_count: integer(data, "totalLikeCount").and_then(|n| u64::try_from(n).ok()),
        timestamp,
    }
}

/// The platform folds follows and shares into one `social` event and tells
/// them apart by `displayType` (e.g. `pm_mt_msg_viewer_share`).
fn social(data: &Value, timestamp: i64) -> Normalized {
    let display_type = text(data, &["displayType"]).unwrap_or_default();
    if display_type.contains("follow") {
        Normalized::Event(LiveEvent::Follow(viewer(data, timestamp)))
    } else if display_type.contains("share") {
        Normalized::Event(LiveEvent::Share(viewer(data, timestamp)))
    } else {
        Normalized::Ignored
    }
}

fn error_message(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => text(other, &["message", "info"])
            .unwrap_or_else(|| "unknown upstream error".to_string()),
    }
}

/// `(username, nickname)`; the nickname falls back to the username.
/// Identities are passed through unvalidated.
fn identity(data: &Value) -> (String, String) {
    let username = text(data, &["uniqueId", "username"]).unwrap_or_default();
    let nickname = text(data, &["nickname"])
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| username.clone());
    (username, nickname)
}

fn text(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| data.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn integer(data: &Value, key: &str) -> Option<i64> {
    match data.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(data: &Value, key: &str) -> Option<bool> {
    match data.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}
