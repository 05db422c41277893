//! The `/ws` endpoint: upgrades an HTTP request to a WebSocket and hands the
//! socket to the hub, which pushes every broadcast event to it.

pub(crate) mod handler;
