//! Event system for Postboard.
//!
//! Domain operations emit [`DomainEvent`]s after a write has been committed.
//! Infrastructure such as the WebSocket hub subscribes by implementing
//! [`EventHandler`] and registering with an [`EventPublisher`].
//!
//! This crate depends on no other workspace crate so that `domain` and `hub`
//! can both depend on it without a cycle. Entity data travels as
//! `serde_json::Value`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Matches `entity::Id`.
pub type Id = Uuid;

/// Business-level changes, emitted only after the underlying write succeeded.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new post was stored.
    PostCreated {
        post_id: Id,
        /// Author of the post.
        user_id: Id,
        /// The complete serialized post record, forwarded to clients as-is.
        post: Value,
    },
}

impl DomainEvent {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::PostCreated { .. } => "PostCreated",
        }
    }
}

/// Implementations perform side effects (notifications, cache updates, ...)
/// in response to domain events. Handlers must not block for long: the
/// publisher awaits each one before returning to the request handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Returns a publisher with `handler` appended. Store the returned value
    /// in application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
