//! WebSocket connection hub for real-time post notifications.
//!
//! This crate tracks every live WebSocket connection and fans out event
//! envelopes to all of them.
//!
//! # Architecture
//!
//! - **Single coordinating loop**: [`Hub::run`] exclusively owns the registry
//!   of connections. Everything else talks to it through a cloneable
//!   [`HubHandle`] that sends requests over a channel, so the registry needs no
//!   lock and requests are applied strictly in the order they arrive.
//! - **Bounded outbound queues**: each [`Connection`] owns a bounded FIFO queue
//!   filled by the hub and drained by the connection's write loop. A full queue
//!   marks a slow consumer; the hub drops that connection instead of waiting.
//! - **Broadcast only**: every envelope goes to every connection. There are no
//!   topics, no history and no delivery guarantees.
//! - **Fire-and-forget publishing**: [`HubHandle::notify`] never blocks and never
//!   fails from the caller's point of view.
//!
//! # Message Flow
//!
//! 1. Client opens `GET /ws`; the web layer completes the upgrade
//! 2. `HubHandle::connect()` registers a fresh connection with the hub
//! 3. `Connection::serve()` runs the read and write loops until either ends
//! 4. A post is created; the domain layer publishes `DomainEvent::PostCreated`
//! 5. [`HubDomainEventHandler`] turns it into `notify("Post_Created", post)`
//! 6. The hub encodes the envelope once and enqueues it on every connection
//! 7. Each write loop sends `{"type":"Post_Created","payload":{...}}`
//!
//! # Example: publishing an event
//!
//! ```rust,no_run
//! use hub::{ConnectionSettings, Hub};
//! use serde_json::json;
//!
//! # async fn example() {
//! let hub = Hub::spawn(ConnectionSettings::default());
//! hub.notify("Post_Created", &json!({ "id": "p1" }));
//! # }
//! ```
//!
//! # Modules
//!
//! - `connection`: Connection, ConnectionId and the per-connection read/write loops
//! - `hub`: the coordinating loop and its handle
//! - `message`: event types and the wire envelope
//! - `domain_event_handler`: bridge from `events::DomainEvent` to the hub

pub mod connection;
pub mod domain_event_handler;
pub mod hub;
pub mod message;

pub use connection::{Connection, ConnectionId, ConnectionSettings};
pub use domain_event_handler::HubDomainEventHandler;
pub use hub::{Hub, HubHandle};
pub use message::{Envelope, Event, EventType};
