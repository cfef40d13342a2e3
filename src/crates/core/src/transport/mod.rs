//! Completion endpoint transport
//!
//! The session talks to the endpoint through [`ChatTransport`]; the HTTP
//! implementation uses `reqwest`.

use crate::util::errors::{MasonError, MasonResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::debug;
use mason_core_types::ChatRequest;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};

/// Response header carrying the search results used as citations.
pub const RESULTS_HEADER: &str = "results";

pub type ByteStream = BoxStream<'static, MasonResult<Bytes>>;

/// Response head plus the unread body.
pub struct ChatResponse {
    pub status: u16,
    pub reason: String,
    pub content_type: Option<String>,
    pub results_header: Option<String>,
    pub body: ByteStream,
}

impl ChatResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for ChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("content_type", &self.content_type)
            .field("results_header", &self.results_header)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> MasonResult<ChatResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> MasonResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).to_string())
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> MasonResult<ChatResponse> {
        debug!(
            "Sending chat request: endpoint={}, messages={}, network={}",
            self.endpoint,
            request.messages.len(),
            request.network
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "text/event-stream, application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers();
        let content_type = header_string(headers, CONTENT_TYPE.as_str());
        let results_header = header_string(headers, RESULTS_HEADER);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(MasonError::from))
            .boxed();

        Ok(ChatResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            results_header,
            body,
        })
    }
}
