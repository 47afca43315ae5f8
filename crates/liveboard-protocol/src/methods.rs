// Well-known WS method names accepted from overlay clients.

// utility
pub const PING: &str = "ping";
pub const STATUS: &str = "status";

// upstream control
pub const CONFIGURE: &str = "configure";
pub const DISCONNECT: &str = "disconnect";

// synthetic injection, one per platform event
pub const TEST_MEMBER: &str = "test.member";
pub const TEST_CHAT: &str = "test.chat";
pub const TEST_GIFT: &str = "test.gift";
pub const TEST_FOLLOW: &str = "test.follow";
pub const TEST_SHARE: &str = "test.share";
pub const TEST_LIKE: &str = "test.like";

/// Map a `test.*` method to the platform event kind it simulates.
pub fn injected_kind(method: &str) -> Option<&'static str> {
    match method {
        TEST_MEMBER => Some(crate::events::MEMBER),
        TEST_CHAT => Some(crate::events::CHAT),
        TEST_GIFT => Some(crate::events::GIFT),
        TEST_FOLLOW => Some(crate::events::FOLLOW),
        TEST_SHARE => Some(crate::events::SHARE),
        TEST_LIKE => Some(crate::events::LIKE),
        _ => None,
    }
}
