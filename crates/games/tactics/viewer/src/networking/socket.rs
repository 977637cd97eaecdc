//! WebSocket feeds.
//!
//! A feed owns one connection and a reader task. Recognized notifications
//! are pushed onto a channel for the view to drain; everything else is
//! ignored. There is no reconnect: once the socket drops, the feed goes
//! quiet until a new one is opened.

use crate::errors::ApiError;
use crate::networking::client::HttpClient;
use crossbeam_channel::Sender;
use futures_util::StreamExt;
use reqwest::Url;
use tactics_types::Notification;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::Message;

/// An open WebSocket subscription. Dropping it closes the connection.
pub struct SocketFeed {
    url: Url,
    task: JoinHandle<()>,
}

impl SocketFeed {
    /// Open a match feed, forwarding recognized notifications to `tx`.
    pub async fn open_match(
        http: &HttpClient,
        path: &str,
        tx: Sender<Notification>,
    ) -> Result<Self, ApiError> {
        Self::open(http, path, move |text| match Notification::parse(text) {
            Some(notification) => tx.send(notification).is_ok(),
            None => {
                tracing::debug!("WS: ignoring message {:?}", text);
                true
            }
        })
        .await
    }

    /// Open the global feed. Messages are only logged.
    pub async fn open_global(http: &HttpClient, path: &str) -> Result<Self, ApiError> {
        Self::open(http, path, |text| {
            tracing::info!("WS: message received: {}", text);
            true
        })
        .await
    }

    async fn open<F>(http: &HttpClient, path: &str, on_text: F) -> Result<Self, ApiError>
    where
        F: FnMut(&str) -> bool + Send + 'static,
    {
        let url = http.ws_url(path)?;
        let stream = connect(http, &url).await?;
        tracing::info!("WS: connected to {}", url);
        let task = spawn_reader(stream, url.clone(), on_text);
        Ok(Self { url, task })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the reader task is still receiving.
    pub fn is_live(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SocketFeed {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            tracing::info!("WS: closing {}", self.url);
        }
        self.task.abort();
    }
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Read text frames until the socket closes or `on_text` returns false.
fn spawn_reader<F>(mut stream: WsStream, url: Url, mut on_text: F) -> JoinHandle<()>
where
    F: FnMut(&str) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if !on_text(text.as_str()) {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WS: {} errored: {}", url, e);
                    break;
                }
            }
        }
        tracing::info!("WS: disconnected from {}", url);
    })
}

/// Handshake with the session cookie attached, as a browser would.
async fn connect(http: &HttpClient, url: &Url) -> Result<WsStream, ApiError> {
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| ApiError::Socket(e.to_string()))?;
    if let Some(cookie) = http.cookie_header() {
        request.headers_mut().insert(COOKIE, cookie);
    }

    let (stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| ApiError::Socket(format!("{}: {}", url, e)))?;
    Ok(stream)
}
