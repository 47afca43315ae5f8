//! Liveboard gateway: the axum server, the broadcast hub, and the
//! per-connection WebSocket sessions that display clients hold open.

pub mod app;
pub mod http;
pub mod hub;
pub mod ws;
