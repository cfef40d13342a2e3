use super::decoder::{DecodeStats, StreamDecoder};
use crate::types::openai::extract_error_message;
use anyhow::{anyhow, Result};
use futures::{Stream, StreamExt};
use log::{debug, error, warn};
use mason_core_types::{StreamEvent, FAILURE_MESSAGE};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Whether a response carries a JSON error body instead of an event stream.
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.contains(JSON_CONTENT_TYPE))
}

/// Decode a streamed completion body into classified text deltas
///
/// # Arguments
/// * `stream` - response body chunks
/// * `tx_event` - decoded event sender
/// * `idle_timeout` - longest wait for the next chunk
/// * `on_output_started` - called once, right before the first event is sent
pub async fn handle_chat_stream<S, B, E>(
    mut stream: S,
    tx_event: mpsc::UnboundedSender<StreamEvent>,
    idle_timeout: Duration,
    on_output_started: impl FnOnce(),
) -> Result<DecodeStats>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut decoder = StreamDecoder::new();
    let mut on_output_started = Some(on_output_started);

    loop {
        let chunk = match timeout(idle_timeout, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                let error_msg = format!("Stream read error: {}", e);
                error!("{}", error_msg);
                return Err(anyhow!(error_msg));
            }
            Err(_) => {
                let error_msg = format!("Stream timeout after {}s", idle_timeout.as_secs());
                error!("{}", error_msg);
                return Err(anyhow!(error_msg));
            }
        };

        for event in decoder.feed(chunk.as_ref()) {
            if let Some(callback) = on_output_started.take() {
                callback();
            }
            if tx_event.send(event).is_err() {
                warn!("Stream event receiver dropped; stopping decode");
                return Ok(decoder.finish());
            }
        }
    }

    let stats = decoder.finish();
    debug!(
        "Chat stream finished: lines={}, events={}, malformed={}",
        stats.lines, stats.events, stats.malformed
    );
    Ok(stats)
}

/// Turn a JSON error body into a single answer fragment.
///
/// The whole body is read first. A body that is not JSON or has no error
/// message yields the fixed failure message.
pub async fn handle_error_body<S, B, E>(
    mut stream: S,
    tx_event: mpsc::UnboundedSender<StreamEvent>,
    idle_timeout: Duration,
    on_output_started: impl FnOnce(),
) -> Result<()>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = Vec::new();
    loop {
        match timeout(idle_timeout, stream.next()).await {
            Ok(Some(Ok(chunk))) => body.extend_from_slice(chunk.as_ref()),
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                let error_msg = format!("Error body read error: {}", e);
                error!("{}", error_msg);
                return Err(anyhow!(error_msg));
            }
            Err(_) => {
                let error_msg = format!("Error body timeout after {}s", idle_timeout.as_secs());
                error!("{}", error_msg);
                return Err(anyhow!(error_msg));
            }
        }
    }

    on_output_started();
    let _ = tx_event.send(StreamEvent::answer(error_body_message(&body)));
    Ok(())
}

fn error_body_message(body: &[u8]) -> String {
    match serde_json::from_slice(body) {
        Ok(json) => extract_error_message(&json).unwrap_or_else(|| FAILURE_MESSAGE.to_string()),
        Err(e) => {
            warn!("Error body is not valid JSON: {}", e);
            FAILURE_MESSAGE.to_string()
        }
    }
}
