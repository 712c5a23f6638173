//! Docker Engine API client.
//!
//! Minimal client for the handful of endpoints supervision needs: inspect,
//! remove, create, start and the streaming event feed. Connects over a Unix
//! socket (`unix://...`) or TCP (`tcp://host:port`), one http/1 connection
//! per request.

use crate::engine::{ContainerDetails, CreatedContainer, Engine, EngineEvent};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::{Buf, Bytes, Incoming};
use hyper::client::conn::http1;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tokio::sync::mpsc;

/// Capacity of the event channel handed to the supervisor.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

/// Docker Engine API client.
#[derive(Debug, Clone)]
pub struct DockerClient {
    endpoint: Endpoint,
}

impl DockerClient {
    /// Creates a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a `unix://` or `tcp://`
    /// (or `http://`) URL.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = if let Some(path) = endpoint.strip_prefix("unix://") {
            Endpoint::Unix(PathBuf::from(path))
        } else if let Some(addr) = endpoint
            .strip_prefix("tcp://")
            .or_else(|| endpoint.strip_prefix("http://"))
        {
            Endpoint::Tcp(addr.trim_end_matches('/').to_string())
        } else {
            return Err(CoreError::Config(format!(
                "unsupported engine endpoint '{endpoint}'"
            )));
        };
        Ok(Self { endpoint })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response<Incoming>> {
        let payload = match body {
            Some(value) => Bytes::from(serde_json::to_vec(value)?),
            None => Bytes::new(),
        };

        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(hyper::header::HOST, "docker");
        if !payload.is_empty() {
            builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(payload))
            .map_err(|e| CoreError::Engine(format!("failed to build request: {e}")))?;

        match &self.endpoint {
            Endpoint::Unix(path) => {
                let stream = UnixStream::connect(path).await?;
                dispatch(stream, request).await
            }
            Endpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str()).await?;
                dispatch(stream, request).await
            }
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(StatusCode, Bytes)> {
        let response = self.request(method, path, body).await?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| CoreError::Engine(format!("failed to read response: {e}")))?
            .to_bytes();
        Ok((status, bytes))
    }
}

async fn dispatch<S>(stream: S, request: Request<Full<Bytes>>) -> Result<Response<Incoming>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| CoreError::Engine(format!("handshake failed: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "engine connection closed with error");
        }
    });

    sender
        .send_request(request)
        .await
        .map_err(|e| CoreError::Engine(format!("request failed: {e}")))
}

/// The registry accepts arbitrary names, so the query value is
/// percent-encoded rather than trusted to be URL-safe.
fn create_path(name: &str) -> String {
    format!("/containers/create?name={}", urlencoding::encode(name))
}

fn engine_failure(operation: &str, status: StatusCode, body: &Bytes) -> CoreError {
    // The engine reports errors as {"message": "..."}.
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    CoreError::Engine(format!("{operation} failed ({status}): {message}"))
}

#[async_trait]
impl Engine for DockerClient {
    async fn inspect(&self, id: &str) -> Result<ContainerDetails> {
        let (status, body) = self
            .call(Method::GET, &format!("/containers/{id}/json"), None)
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Err(CoreError::NotFound(format!("no such container: {id}")));
        }
        if !status.is_success() {
            return Err(engine_failure("inspect", status, &body));
        }

        let value: Value = serde_json::from_slice(&body)?;
        Ok(ContainerDetails {
            id: value
                .get("Id")
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string(),
            name: value
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            config: value.get("Config").cloned().unwrap_or(Value::Null),
            host_config: value.get("HostConfig").cloned().unwrap_or(Value::Null),
        })
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let (status, body) = self
            .call(Method::DELETE, &format!("/containers/{id}"), None)
            .await?;
        if !status.is_success() {
            return Err(engine_failure("remove", status, &body));
        }
        Ok(())
    }

    async fn create(&self, name: &str, document: &Value) -> Result<CreatedContainer> {
        let (status, body) = self
            .call(Method::POST, &create_path(name), Some(document))
            .await?;
        if !status.is_success() {
            return Err(engine_failure("create", status, &body));
        }

        let value: Value = serde_json::from_slice(&body)?;
        let id = value
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Engine("create response carried no Id".to_string()))?
            .to_string();
        Ok(CreatedContainer { id })
    }

    async fn start(&self, id: &str, host_config: &Value) -> Result<()> {
        // Start-with-HostConfig form: the host configuration captured from
        // the dying instance rides along with the start call.
        let body = (!host_config.is_null()).then_some(host_config);
        let (status, response_body) = self
            .call(Method::POST, &format!("/containers/{id}/start"), body)
            .await?;
        // 304: already started.
        if !status.is_success() && status != StatusCode::NOT_MODIFIED {
            return Err(engine_failure("start", status, &response_body));
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<EngineEvent>> {
        let response = self.request(Method::GET, "/events", None).await?;
        if !response.status().is_success() {
            return Err(CoreError::Engine(format!(
                "event subscription failed ({})",
                response.status()
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(pump_events(response.into_body(), tx));
        Ok(rx)
    }
}

/// Decodes the newline-delimited JSON event stream, forwarding each event
/// until the stream ends or the receiver goes away. Dropping the sender
/// closes the feed for the supervisor.
async fn pump_events<B>(mut body: B, tx: mpsc::Sender<EngineEvent>)
where
    B: hyper::body::Body + Unpin,
    B::Error: std::fmt::Display,
{
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "event feed read failed");
                return;
            }
        };
        let Ok(mut data) = frame.into_data() else {
            continue;
        };
        while data.has_remaining() {
            let chunk = data.chunk();
            let len = chunk.len();
            buffer.extend_from_slice(chunk);
            data.advance(len);
        }

        while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            if forward_event(&line, &tx).await.is_err() {
                return;
            }
        }
    }

    // The stream can end mid-line; the remainder is still one event.
    let _ = forward_event(&buffer, &tx).await;
}

/// Decodes one line and sends it on. `Err` means the receiver went away.
async fn forward_event(
    line: &[u8],
    tx: &mpsc::Sender<EngineEvent>,
) -> std::result::Result<(), ()> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    match serde_json::from_slice::<EngineEvent>(line) {
        Ok(event) => tx.send(event).await.map_err(|_| ()),
        Err(e) => {
            tracing::debug!(error = %e, "skipping undecodable engine event");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unix_and_tcp_endpoints() {
        assert!(matches!(
            DockerClient::new("unix:///var/run/docker.sock").unwrap().endpoint,
            Endpoint::Unix(_)
        ));
        assert!(matches!(
            DockerClient::new("tcp://127.0.0.1:2375").unwrap().endpoint,
            Endpoint::Tcp(_)
        ));
        assert!(DockerClient::new("ftp://nope").is_err());
    }

    #[test]
    fn create_query_percent_encodes_the_name() {
        assert_eq!(create_path("web1"), "/containers/create?name=web1");
        assert_eq!(
            create_path("a b/c&d"),
            "/containers/create?name=a%20b%2Fc%26d"
        );
    }

    #[tokio::test]
    async fn event_feed_flushes_a_trailing_event_without_newline() {
        let payload = concat!(
            r#"{"status":"die","id":"a1"}"#,
            "\n",
            r#"{"status":"die","id":"a2"}"#
        );
        let (tx, mut rx) = mpsc::channel(8);
        pump_events(Full::new(Bytes::from_static(payload.as_bytes())), tx).await;

        assert_eq!(rx.recv().await.unwrap().id, "a1");
        assert_eq!(rx.recv().await.unwrap().id, "a2");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn death_events_decode_from_the_feed_format() {
        let line = r#"{"status":"die","id":"abc123","Type":"container","Action":"die","time":1700000000}"#;
        let event: EngineEvent = serde_json::from_slice(line.as_bytes()).unwrap();
        assert!(event.is_death());
        assert_eq!(event.id, "abc123");
    }
}
