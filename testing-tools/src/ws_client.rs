use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// A notification as delivered over `/ws`.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Value,
}

pub fn parse_event(text: &str) -> Result<Event> {
    Ok(serde_json::from_str(text)?)
}

pub struct Connection {
    pub user_label: String,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection {
    /// Opens `/ws`, sending the token as a bearer header when one is given.
    pub async fn connect(user_label: &str, ws_url: &str, token: Option<&str>) -> Result<Self> {
        let mut request = ws_url.into_client_request()?;
        if let Some(token) = token {
            request.headers_mut().insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {token}"))?,
            );
        }

        let (socket, response) = connect_async(request).await?;
        log::debug!("{user_label} connected to {ws_url} ({})", response.status());

        Ok(Self {
            user_label: user_label.to_string(),
            socket,
        })
    }

    /// Reads frames until one of `event_type` arrives. Other events are
    /// skipped; control frames are handled by tungstenite.
    pub async fn wait_for_event(&mut self, event_type: &str, timeout: Duration) -> Result<Event> {
        let wait = async {
            while let Some(frame) = self.socket.next().await {
                match frame? {
                    Message::Text(text) => {
                        let event = parse_event(text.as_str())?;
                        if event.event_type == event_type {
                            return Ok(event);
                        }
                        log::debug!("Skipping {} event", event.event_type);
                    }
                    Message::Close(frame) => bail!("server closed the connection: {frame:?}"),
                    _ => {}
                }
            }
            bail!("connection ended before {event_type} arrived")
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| anyhow!("no {event_type} event within {timeout:?}"))?
    }

    /// Succeeds if no data frame arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        let wait = async {
            while let Some(frame) = self.socket.next().await {
                if let Message::Text(text) = frame? {
                    return Ok(Some(text.as_str().to_owned()));
                }
            }
            Ok::<_, anyhow::Error>(None)
        };

        match tokio::time::timeout(window, wait).await {
            Err(_) | Ok(Ok(None)) => Ok(()),
            Ok(Ok(Some(text))) => bail!("unexpected frame: {text}"),
            Ok(Err(e)) => Err(e),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.send(Message::Close(None)).await?;
        Ok(())
    }
}
