use crate::connection::{Connection, ConnectionId, ConnectionSettings};
use crate::message::Envelope;
use axum::extract::ws::Utf8Bytes;
use log::*;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

/// Requests processed by the coordinating loop, in arrival order.
enum Command {
    Register {
        connection_id: ConnectionId,
        outbound: mpsc::Sender<Utf8Bytes>,
    },
    Unregister(ConnectionId),
    Broadcast(Envelope),
    ConnectionCount(oneshot::Sender<usize>),
    Shutdown,
}

/// Owner of the connection registry.
///
/// Only [`Hub::run`] ever reads or mutates `registry`. Dropping a registry entry
/// drops the last sender of that connection's outbound queue, which closes the
/// queue and ends the connection's write loop.
pub struct Hub {
    registry: HashMap<ConnectionId, mpsc::Sender<Utf8Bytes>>,
    commands: mpsc::UnboundedReceiver<Command>,
}

/// Cloneable entry point into a running [`Hub`].
///
/// Every method is non-blocking: requests are queued on an unbounded channel
/// and applied later by the coordinating loop. Once the hub has stopped,
/// requests are silently dropped.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<Command>,
    settings: ConnectionSettings,
}

impl Hub {
    pub fn new(settings: ConnectionSettings) -> (Self, HubHandle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let hub = Self {
            registry: HashMap::new(),
            commands: commands_rx,
        };
        let handle = HubHandle {
            commands: commands_tx,
            settings,
        };
        (hub, handle)
    }

    /// Starts the coordinating loop on the current tokio runtime.
    pub fn spawn(settings: ConnectionSettings) -> HubHandle {
        let (hub, handle) = Self::new(settings);
        tokio::spawn(hub.run());
        handle
    }

    /// Runs until [`HubHandle::shutdown`] is called or every handle is dropped.
    /// On exit all outbound queues are closed.
    pub async fn run(mut self) {
        info!("Hub started");

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Register {
                    connection_id,
                    outbound,
                } => self.register(connection_id, outbound),
                Command::Unregister(connection_id) => {
                    self.unregister(&connection_id);
                }
                Command::Broadcast(envelope) => self.broadcast(envelope),
                Command::ConnectionCount(reply) => {
                    // The requester may have given up waiting.
                    let _ = reply.send(self.registry.len());
                }
                Command::Shutdown => break,
            }
        }

        let remaining = self.registry.len();
        self.registry.clear();
        info!("Hub stopped, closed {remaining} connection(s)");
    }

    fn register(&mut self, connection_id: ConnectionId, outbound: mpsc::Sender<Utf8Bytes>) {
        if self
            .registry
            .insert(connection_id.clone(), outbound)
            .is_some()
        {
            warn!("Connection {connection_id} registered twice, keeping the newest queue");
        }
        debug!(
            "Registered connection {connection_id} ({} active)",
            self.registry.len()
        );
    }

    fn unregister(&mut self, connection_id: &ConnectionId) -> bool {
        match self.registry.remove(connection_id) {
            Some(_outbound) => {
                debug!(
                    "Unregistered connection {connection_id} ({} active)",
                    self.registry.len()
                );
                true
            }
            None => {
                trace!("Connection {connection_id} was already unregistered");
                false
            }
        }
    }

    fn broadcast(&mut self, envelope: Envelope) {
        if self.registry.is_empty() {
            trace!(
                "No connections to receive {} event",
                envelope.event_type()
            );
            return;
        }

        let frame = match envelope.encode() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode {} envelope: {e}", envelope.event_type());
                return;
            }
        };

        let mut unhealthy = Vec::new();
        for (connection_id, outbound) in self.registry.iter() {
            match outbound.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("Outbound queue full for connection {connection_id}, dropping it");
                    unhealthy.push(connection_id.clone());
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Connection {connection_id} stopped reading, dropping it");
                    unhealthy.push(connection_id.clone());
                }
            }
        }

        let attempted = self.registry.len();
        for connection_id in &unhealthy {
            self.unregister(connection_id);
        }

        debug!(
            "Broadcast {} event to {} of {attempted} connection(s)",
            envelope.event_type(),
            attempted - unhealthy.len(),
        );
    }
}

impl HubHandle {
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Creates a connection and registers it with the hub.
    ///
    /// The registration request is queued before this returns, so any
    /// broadcast sent afterwards from the same task reaches the new connection.
    pub fn connect(&self) -> Connection {
        let connection_id = ConnectionId::new();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.settings.outbound_queue_capacity);

        self.send(Command::Register {
            connection_id: connection_id.clone(),
            outbound: outbound_tx,
        });

        Connection::new(
            connection_id,
            outbound_rx,
            self.clone(),
            self.settings.ping_interval,
        )
    }

    /// Removes a connection and closes its outbound queue. Calling this for a
    /// connection that is already gone does nothing.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        self.send(Command::Unregister(connection_id.clone()));
    }

    /// Queues `envelope` for delivery to every registered connection.
    pub fn broadcast(&self, envelope: Envelope) {
        self.send(Command::Broadcast(envelope));
    }

    /// Fire-and-forget publish of `payload` under `event_type`.
    ///
    /// A payload that cannot be represented as JSON is logged and dropped.
    pub fn notify<T>(&self, event_type: &str, payload: &T)
    where
        T: Serialize + ?Sized,
    {
        match Envelope::from_serializable(event_type, payload) {
            Ok(envelope) => self.broadcast(envelope),
            Err(e) => error!("Failed to serialize {event_type} payload: {e}"),
        }
    }

    /// Number of registered connections once every request queued before
    /// this call has been applied. Returns 0 if the hub is not running.
    pub async fn connection_count(&self) -> usize {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::ConnectionCount(reply_tx));
        reply_rx.await.unwrap_or(0)
    }

    /// Stops the hub and closes every connection's outbound queue.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Hub is not running, request dropped");
        }
    }
}
