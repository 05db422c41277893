use crate::hub::HubHandle;
use crate::message::{Event, EventType};
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;

/// Forwards domain events to every connected WebSocket client.
///
/// Registered with the `EventPublisher` at startup, this is the only place the
/// CRUD layer reaches the hub. `handle` returns as soon as the broadcast
/// request is queued, so request handlers never wait on client delivery.
pub struct HubDomainEventHandler {
    hub: HubHandle,
}

impl HubDomainEventHandler {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl EventHandler for HubDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::PostCreated {
                post_id,
                user_id,
                post,
            } => {
                debug!("Handling PostCreated event for post {post_id} by user {user_id}");
                self.hub.notify(Event::PostCreated.event_type(), post);
            }
        }
    }
}
