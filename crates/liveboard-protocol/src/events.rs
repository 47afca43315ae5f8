//! Canonical event catalog.
//!
//! Every occurrence the gateway relays is one of these variants, already
//! normalized: required fields present, optional ones explicit, timestamps
//! stamped by the server. Field names follow the overlay clients' camelCase
//! wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire event names.
pub const STATUS: &str = "status";
pub const MEMBER: &str = "member";
pub const CHAT: &str = "chat";
pub const GIFT: &str = "gift";
pub const FOLLOW: &str = "follow";
pub const SHARE: &str = "share";
pub const LIKE: &str = "like";
pub const TOP_LIKER: &str = "topliker";
pub const ERROR: &str = "error";
pub const DISCONNECTED: &str = "disconnected";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub connected: bool,
    pub username: Option<String>,
}

/// Shared shape of `member`, `follow` and `share`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerPayload {
    pub username: String,
    pub nickname: String,
    pub profile_picture_url: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub username: String,
    pub nickname: String,
    pub comment: String,
    pub profile_picture_url: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftPayload {
    pub username: String,
    pub nickname: String,
    pub gift_name: String,
    pub gift_id: Option<u64>,
    pub repeat_count: u32,
    pub repeat_end: bool,
    pub profile_picture_url: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikePayload {
    pub username: String,
    pub nickname: String,
    /// Increment carried by this tap burst.
    pub like_count: u64,
    /// Upstream-reported room total. Informational; never fed to the ledger.
    pub total_like_count: Option<u64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLikerEntry {
    pub username: String,
    pub nickname: String,
    pub like_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLikerPayload {
    pub top3: Vec<TopLikerEntry>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Status(StatusPayload),
    Member(ViewerPayload),
    Chat(ChatPayload),
    Gift(GiftPayload),
    Follow(ViewerPayload),
    Share(ViewerPayload),
    Like(LikePayload),
    TopLiker(TopLikerPayload),
    Error(ErrorPayload),
    Disconnected,
}

impl LiveEvent {
    pub fn status(connected: bool, username: Option<String>) -> Self {
        LiveEvent::Status(StatusPayload { connected, username })
    }

    pub fn error(message: impl Into<String>) -> Self {
        LiveEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::Status(_) => STATUS,
            LiveEvent::Member(_) => MEMBER,
            LiveEvent::Chat(_) => CHAT,
            LiveEvent::Gift(_) => GIFT,
            LiveEvent::Follow(_) => FOLLOW,
            LiveEvent::Share(_) => SHARE,
            LiveEvent::Like(_) => LIKE,
            LiveEvent::TopLiker(_) => TOP_LIKER,
            LiveEvent::Error(_) => ERROR,
            LiveEvent::Disconnected => DISCONNECTED,
        }
    }

    /// JSON body for the wire frame; `None` for payload-less events.
    pub fn payload(&self) -> Option<Value> {
        let value = match self {
            LiveEvent::Status(p) => serde_json::to_value(p),
            LiveEvent::Member(p) | LiveEvent::Follow(p) | LiveEvent::Share(p) => {
                serde_json::to_value(p)
            }
            LiveEvent::Chat(p) => serde_json::to_value(p),
            LiveEvent::Gift(p) => serde_json::to_value(p),
            LiveEvent::Like(p) => serde_json::to_value(p),
            LiveEvent::TopLiker(p) => serde_json::to_value(p),
            LiveEvent::Error(p) => serde_json::to_value(p),
            LiveEvent::Disconnected => return None,
        };
        Some(value.unwrap_or(Value::Null))
    }
}
