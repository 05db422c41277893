use crate::hub::HubHandle;
use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);
/// Upper bound on waiting for the transport to finish a client-initiated close.
pub const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-connection tuning applied to every connection a hub creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Frames a connection may have queued before it counts as a slow consumer.
    pub outbound_queue_capacity: usize,
    /// How often the write loop pings an otherwise idle client.
    pub ping_interval: Duration,
}

impl ConnectionSettings {
    /// A zero capacity is raised to 1; a zero interval to one second.
    pub fn new(outbound_queue_capacity: usize, ping_interval: Duration) -> Self {
        Self {
            outbound_queue_capacity: outbound_queue_capacity.max(1),
            ping_interval: ping_interval.max(Duration::from_secs(1)),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_QUEUE_CAPACITY, DEFAULT_PING_INTERVAL)
    }
}

/// One live client session.
///
/// The hub holds the sending half of `outbound`; this struct holds the
/// receiving half and hands it to the write loop in [`Connection::serve`].
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Receiver<Utf8Bytes>,
    hub: HubHandle,
    ping_interval: Duration,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        outbound: mpsc::Receiver<Utf8Bytes>,
        hub: HubHandle,
        ping_interval: Duration,
    ) -> Self {
        Self {
            id,
            outbound,
            hub,
            ping_interval,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Drives the connection until the client goes away, the transport fails,
    /// or the hub closes the outbound queue.
    ///
    /// The read and write loops run as separate tasks. Whichever finishes
    /// first cancels the other, after which the connection unregisters itself
    /// and both transport halves are dropped.
    pub async fn serve<W, R, E>(self, sink: W, stream: R)
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: fmt::Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let Connection {
            id,
            outbound,
            hub,
            ping_interval,
        } = self;

        info!("Connection {id} opened");

        let mut writer = tokio::spawn(write_loop(id.clone(), outbound, sink, ping_interval));
        let mut reader = tokio::spawn(read_loop(id.clone(), stream));

        tokio::select! {
            _ = &mut writer => reader.abort(),
            _ = &mut reader => writer.abort(),
        }

        hub.unregister(&id);
        info!("Connection {id} closed");
    }

    #[cfg(test)]
    pub(crate) fn outbound_mut(&mut self) -> &mut mpsc::Receiver<Utf8Bytes> {
        &mut self.outbound
    }
}

async fn write_loop<W>(
    id: ConnectionId,
    mut outbound: mpsc::Receiver<Utf8Bytes>,
    mut sink: W,
    ping_interval: Duration,
) where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("Failed to write to connection {id}: {e}");
                        return;
                    }
                }
                None => {
                    debug!("Outbound queue for connection {id} closed, sending close frame");
                    if let Err(e) = sink.send(Message::Close(None)).await {
                        trace!("Close frame for connection {id} not sent: {e}");
                    }
                    return;
                }
            },
            _ = ping.tick() => {
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    warn!("Failed to ping connection {id}: {e}");
                    return;
                }
            }
        }
    }
}

async fn read_loop<R, E>(id: ConnectionId, mut stream: R)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(reason)) => {
                debug!("Connection {id} sent close frame: {reason:?}");
                finish_close_handshake(&id, &mut stream).await;
                return;
            }
            // Clients have nothing to say to us; inbound data only proves liveness.
            Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                trace!("Ignoring inbound data frame on connection {id}");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                trace!("Heartbeat on connection {id}");
            }
            Err(e) => {
                warn!("Read error on connection {id}: {e}");
                return;
            }
        }
    }

    debug!("Connection {id} stream ended");
}

/// The transport queues its Close reply and only flushes it on a later poll,
/// so keep reading until the stream ends.
async fn finish_close_handshake<R, E>(id: &ConnectionId, stream: &mut R)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let drain = async {
        while let Some(frame) = stream.next().await {
            if let Err(e) = frame {
                trace!("Connection {id} errored while closing: {e}");
                return;
            }
        }
    };

    if tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, drain).await.is_err() {
        debug!("Connection {id} did not finish the close handshake in time");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Hub;
    use futures::channel::mpsc as transport;
    use serde_json::json;

    type Inbound = Result<Message, String>;

    fn spawn_hub(ping_interval: Duration) -> HubHandle {
        Hub::spawn(ConnectionSettings::new(8, ping_interval))
    }

    fn text(message: Option<Message>) -> String {
        match message {
            Some(Message::Text(text)) => text.as_str().to_owned(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[test]
    fn settings_never_allow_a_zero_capacity_queue() {
        let settings = ConnectionSettings::new(0, Duration::ZERO);
        assert_eq!(settings.outbound_queue_capacity, 1);
        assert_eq!(settings.ping_interval, Duration::from_secs(1));
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[tokio::test]
    async fn write_loop_sends_frames_in_order_then_closes_with_the_hub() {
        let hub = spawn_hub(Duration::from_secs(3600));
        let connection = hub.connect();
        let (sink, mut client_rx) = transport::unbounded::<Message>();
        let (_client_tx, stream) = transport::unbounded::<Inbound>();
        let serving = tokio::spawn(connection.serve(sink, stream));

        hub.notify("Post_Created", &json!({ "id": "p1" }));
        hub.notify("Post_Created", &json!({ "id": "p2" }));

        assert_eq!(
            text(client_rx.next().await),
            r#"{"type":"Post_Created","payload":{"id":"p1"}}"#
        );
        assert_eq!(
            text(client_rx.next().await),
            r#"{"type":"Post_Created","payload":{"id":"p2"}}"#
        );

        hub.shutdown();
        assert!(matches!(client_rx.next().await, Some(Message::Close(None))));
        serving.await.unwrap();
    }

    #[tokio::test]
    async fn client_close_frame_unregisters_the_connection() {
        let hub = spawn_hub(Duration::from_secs(3600));
        let connection = hub.connect();
        let (sink, _client_rx) = transport::unbounded::<Message>();
        let (client_tx, stream) = transport::unbounded::<Inbound>();
        let serving = tokio::spawn(connection.serve(sink, stream));
        assert_eq!(hub.connection_count().await, 1);

        client_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        drop(client_tx);
        serving.await.unwrap();

        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn read_loop_drains_the_stream_after_a_close_frame() {
        let id = ConnectionId::new();
        let (client_tx, stream) = transport::unbounded::<Inbound>();
        client_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        client_tx
            .unbounded_send(Ok(Message::Text("late".into())))
            .unwrap();
        drop(client_tx);

        let mut stream = stream;
        read_loop(id, &mut stream).await;

        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn close_handshake_gives_up_on_a_silent_transport() {
        let hub = spawn_hub(Duration::from_secs(3600));
        let connection = hub.connect();
        let (sink, _client_rx) = transport::unbounded::<Message>();
        let (client_tx, stream) = transport::unbounded::<Inbound>();
        let serving = tokio::spawn(connection.serve(sink, stream));

        client_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        serving.await.unwrap();

        assert_eq!(hub.connection_count().await, 0);
        drop(client_tx);
    }

    #[tokio::test]
    async fn inbound_data_is_ignored() {
        let hub = spawn_hub(Duration::from_secs(3600));
        let connection = hub.connect();
        let (sink, mut client_rx) = transport::unbounded::<Message>();
        let (client_tx, stream) = transport::unbounded::<Inbound>();
        let serving = tokio::spawn(connection.serve(sink, stream));

        client_tx
            .unbounded_send(Ok(Message::Text("hello?".into())))
            .unwrap();
        client_tx
            .unbounded_send(Ok(Message::Pong(Bytes::new())))
            .unwrap();
        hub.notify("Post_Created", &json!({ "id": "p1" }));

        assert_eq!(
            text(client_rx.next().await),
            r#"{"type":"Post_Created","payload":{"id":"p1"}}"#
        );
        assert_eq!(hub.connection_count().await, 1);

        drop(client_tx);
        serving.await.unwrap();
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn read_error_unregisters_the_connection() {
        let hub = spawn_hub(Duration::from_secs(3600));
        let connection = hub.connect();
        let (sink, _client_rx) = transport::unbounded::<Message>();
        let (client_tx, stream) = transport::unbounded::<Inbound>();
        let serving = tokio::spawn(connection.serve(sink, stream));

        client_tx
            .unbounded_send(Err("connection reset".to_string()))
            .unwrap();
        serving.await.unwrap();

        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn write_error_unregisters_the_connection() {
        let hub = spawn_hub(Duration::from_secs(3600));
        let connection = hub.connect();
        let (sink, client_rx) = transport::unbounded::<Message>();
        let (_client_tx, stream) = transport::unbounded::<Inbound>();
        drop(client_rx);
        let serving = tokio::spawn(connection.serve(sink, stream));

        hub.notify("Post_Created", &json!({ "id": "p1" }));
        serving.await.unwrap();

        assert_eq!(hub.connection_count().await, 0);
        // Publishing afterwards is still fine.
        hub.notify("Post_Created", &json!({ "id": "p2" }));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_connections_are_pinged() {
        let hub = spawn_hub(Duration::from_secs(5));
        let connection = hub.connect();
        let (sink, mut client_rx) = transport::unbounded::<Message>();
        let (_client_tx, stream) = transport::unbounded::<Inbound>();
        let _serving = tokio::spawn(connection.serve(sink, stream));

        assert!(matches!(client_rx.next().await, Some(Message::Ping(_))));
    }
}
