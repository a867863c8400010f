//! Incremental decoding of AI suggestion responses.
//!
//! The `/ai/suggest` endpoint answers either with an event-stream body of
//! `data: {"content": ..., "done": ...}` frames terminated by `data: [DONE]`,
//! or with a plain text body. [`SseDecoder`] reassembles lines out of the
//! byte stream; [`SuggestionStream`] is the consumer-facing asynchronous
//! sequence of content increments. Dropping the stream cancels the transfer.

use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, TRANSFER_ENCODING};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::error::{Error, Result};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "data: [DONE]";

/// One content increment. `content` is the full text assembled so far, not a
/// delta; `done` marks the terminal increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
}

/// Events produced while feeding bytes through the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// New content is available.
    Chunk(StreamChunk),
    /// The stream signalled completion; no further chunks follow.
    Complete(String),
}

#[derive(Debug, Deserialize)]
struct DataFrame {
    #[serde(default)]
    content: String,
    #[serde(default)]
    done: bool,
}

/// Line-reassembly decoder for the suggestion wire format.
///
/// Keeps a pending buffer for the trailing partial line and the accumulated
/// content across calls until [`SseDecoder::reset`].
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    content: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last fully-assembled content.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.content.clear();
    }

    /// Feed one chunk of bytes; returns the events it completed. After a
    /// `Complete` event the caller must stop feeding.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut rest = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        while let Some(newline) = rest.find('\n') {
            let line: String = rest.drain(..=newline).collect();
            if let Some(event) = self.decode_line(line.trim()) {
                let complete = matches!(event, StreamEvent::Complete(_));
                events.push(event);
                if complete {
                    return events;
                }
            }
        }
        self.buffer = rest;
        events
    }

    /// End of stream without an explicit terminal frame: the accumulated
    /// content, if any, is the result.
    pub fn finish(&mut self) -> Option<String> {
        if self.content.is_empty() {
            None
        } else {
            Some(self.content.clone())
        }
    }

    fn decode_line(&mut self, line: &str) -> Option<StreamEvent> {
        if line.is_empty() || line == DONE_SENTINEL {
            return None;
        }

        if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
            match serde_json::from_str::<DataFrame>(payload) {
                Ok(frame) => {
                    if frame.content.is_empty() && !frame.done {
                        return None;
                    }
                    if !frame.content.is_empty() {
                        self.content = frame.content;
                    }
                    if frame.done {
                        return Some(StreamEvent::Complete(self.content.clone()));
                    }
                    return Some(StreamEvent::Chunk(StreamChunk {
                        content: self.content.clone(),
                        done: false,
                    }));
                }
                Err(err) => {
                    // One malformed frame must not kill the stream.
                    tracing::warn!(%err, line, "skipping malformed stream frame");
                    return None;
                }
            }
        }

        // A bare non-empty line is a plain-text terminal payload.
        self.content = line.to_string();
        Some(StreamEvent::Complete(self.content.clone()))
    }
}

/// Asynchronous sequence of suggestion increments.
///
/// The producer task stops as soon as the receiver is dropped, which is the
/// cancellation path for abandoned suggestions.
#[derive(Debug)]
pub struct SuggestionStream {
    rx: mpsc::Receiver<Result<StreamChunk>>,
}

impl SuggestionStream {
    pub async fn next(&mut self) -> Option<Result<StreamChunk>> {
        self.rx.recv().await
    }

    /// Drain the stream and return the final content.
    pub async fn collect(mut self) -> Result<String> {
        let mut content = String::new();
        while let Some(item) = self.next().await {
            content = item?.content;
        }
        Ok(content)
    }
}

/// Request an AI-generated description for a task title.
pub async fn request_suggestion(api: &ApiClient, title: &str) -> Result<SuggestionStream> {
    let body = serde_json::json!({ "title": title });
    let response = api.post_stream("/ai/suggest", &body).await?;
    Ok(consume(response))
}

/// Turn a response into a [`SuggestionStream`], choosing the incremental or
/// whole-body path from the response headers.
pub fn consume(response: reqwest::Response) -> SuggestionStream {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        if is_event_stream(&response) {
            drive_stream(response, tx).await;
        } else {
            drive_whole_body(response, tx).await;
        }
    });
    SuggestionStream { rx }
}

fn is_event_stream(response: &reqwest::Response) -> bool {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type.contains("text/event-stream") || content_type.contains("application/stream+json")
    {
        return true;
    }
    response
        .headers()
        .get(TRANSFER_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("chunked"))
        .unwrap_or(false)
}

async fn drive_stream(response: reqwest::Response, tx: mpsc::Sender<Result<StreamChunk>>) {
    let mut decoder = SseDecoder::new();
    let mut raw = String::new();
    let mut body = response.bytes_stream();

    while let Some(next) = body.next().await {
        let bytes = match next {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = tx.send(Err(Error::Http(err))).await;
                return;
            }
        };
        raw.push_str(&String::from_utf8_lossy(&bytes));

        for event in decoder.push(&bytes) {
            match event {
                StreamEvent::Chunk(chunk) => {
                    if tx.send(Ok(chunk)).await.is_err() {
                        // Receiver gone: consumer cancelled the suggestion.
                        return;
                    }
                }
                StreamEvent::Complete(content) => {
                    let _ = tx.send(Ok(StreamChunk { content, done: true })).await;
                    return;
                }
            }
        }
    }

    // Stream ended without a terminal frame.
    if let Some(content) = decoder.finish() {
        let _ = tx.send(Ok(StreamChunk { content, done: true })).await;
        return;
    }
    let fallback = raw.trim();
    if !fallback.is_empty() {
        let _ = tx
            .send(Ok(StreamChunk {
                content: fallback.to_string(),
                done: true,
            }))
            .await;
    }
}

/// Non-streaming sibling: read the whole body as text and report it as one
/// terminal chunk.
async fn drive_whole_body(response: reqwest::Response, tx: mpsc::Sender<Result<StreamChunk>>) {
    match response.text().await {
        Ok(text) if !text.is_empty() => {
            let _ = tx.send(Ok(StreamChunk { content: text, done: true })).await;
        }
        Ok(_) => {}
        Err(err) => {
            let _ = tx.send(Err(Error::Http(err))).await;
        }
    }
}
