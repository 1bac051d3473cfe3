use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ChatChunk, ChatMessage, ChatRequest};
use crate::utils::url::construct_api_url;

/// Notification from a streaming worker to the UI loop.
///
/// For a given stream id, every `Chunk` precedes the single `Done`, and
/// `Done` carries the concatenation of all chunks sent. A failed request
/// still ends with exactly one `Done`, whose payload is an `Error: ...`
/// description; the UI treats it like any other reply.
#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Done(String),
}

/// Extract a human-readable message from an Ollama error body, which is
/// usually `{"error": "..."}` but may be plain text.
fn error_body_summary(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }
    if trimmed.is_empty() {
        "<empty response body>".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Process one NDJSON line of a streaming `/api/chat` response.
///
/// Fragments are forwarded immediately and appended to `out`. Returns
/// `true` once the stream is finished, i.e. after the single `Done` has
/// been sent.
fn process_chat_line(
    line: &str,
    out: &mut String,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    if line.is_empty() {
        return false;
    }

    let chunk = match serde_json::from_str::<ChatChunk>(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            let _ = tx.send((
                StreamMessage::Done(format!("Error: malformed response from daemon: {e}")),
                stream_id,
            ));
            return true;
        }
    };

    if let Some(error) = chunk.error {
        let _ = tx.send((StreamMessage::Done(format!("Error: {error}")), stream_id));
        return true;
    }

    if let Some(message) = chunk.message {
        if !message.content.is_empty() {
            out.push_str(&message.content);
            let _ = tx.send((StreamMessage::Chunk(message.content), stream_id));
        }
    }

    if chunk.done {
        debug!(
            stream_id,
            done_reason = chunk.done_reason.as_deref(),
            chars = out.len(),
            "chat stream complete"
        );
        let _ = tx.send((StreamMessage::Done(std::mem::take(out)), stream_id));
        return true;
    }

    false
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub host: String,
    pub model: String,
    pub api_messages: Vec<ChatMessage>,
    pub stream_id: u64,
}

/// Spawns streaming chat requests and forwards their notifications over a
/// single channel, tagged with the stream id they belong to.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Start one streaming `/api/chat` request on a background task.
    ///
    /// There is no cancellation: the task runs until the daemon closes the
    /// stream or the request fails. The submit gate in the UI ensures at
    /// most one worker is alive at a time.
    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                host,
                model,
                api_messages,
                stream_id,
            } = params;

            let request = ChatRequest {
                model,
                messages: api_messages,
                stream: true,
            };

            let chat_url = construct_api_url(&host, "api/chat");
            let response = match client.post(chat_url).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(stream_id, error = %e, "chat request failed");
                    let _ = tx.send((StreamMessage::Done(format!("Error: {e}")), stream_id));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                warn!(stream_id, %status, "daemon rejected chat request");
                let _ = tx.send((
                    StreamMessage::Done(format!("Error: {}", error_body_summary(&body))),
                    stream_id,
                ));
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut out = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk_bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(stream_id, error = %e, "chat stream read failed");
                        let _ = tx.send((StreamMessage::Done(format!("Error: {e}")), stream_id));
                        return;
                    }
                };

                buffer.extend_from_slice(&chunk_bytes);

                while let Some(newline_pos) = memchr(b'\n', &buffer) {
                    let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                        Ok(s) => s.trim().to_string(),
                        Err(e) => {
                            let _ = tx.send((
                                StreamMessage::Done(format!("Error: invalid UTF-8 in stream: {e}")),
                                stream_id,
                            ));
                            return;
                        }
                    };
                    buffer.drain(..=newline_pos);

                    if process_chat_line(&line, &mut out, &tx, stream_id) {
                        return;
                    }
                }
            }

            // Daemon closed the connection without a done marker; whatever
            // buffered line remains still counts toward the reply.
            if let Ok(line) = std::str::from_utf8(&buffer) {
                let line = line.trim().to_string();
                if process_chat_line(&line, &mut out, &tx, stream_id) {
                    return;
                }
            }
            let _ = tx.send((StreamMessage::Done(out), stream_id));
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_concatenate_into_done_payload() {
        let (service, mut rx) = ChatStreamService::new();
        let mut out = String::new();
        let stream_id = 7;

        let lines = [
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hel"},"done":false}"#,
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"lo"},"done":false}"#,
            r#"{"model":"llama3.2","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop"}"#,
        ];
        let mut finished = false;
        for line in lines {
            finished = process_chat_line(line, &mut out, &service.tx, stream_id);
        }
        assert!(finished);

        let mut concatenated = String::new();
        let mut done_payload = None;
        while let Ok((message, received_id)) = rx.try_recv() {
            assert_eq!(received_id, stream_id);
            match message {
                StreamMessage::Chunk(content) => {
                    assert!(done_payload.is_none(), "chunk after done");
                    concatenated.push_str(&content);
                }
                StreamMessage::Done(full) => {
                    assert!(done_payload.is_none(), "duplicate done");
                    done_payload = Some(full);
                }
            }
        }
        assert_eq!(concatenated, "Hello");
        assert_eq!(done_payload.as_deref(), Some("Hello"));
    }

    #[test]
    fn empty_fragments_are_not_forwarded() {
        let (service, mut rx) = ChatStreamService::new();
        let mut out = String::new();

        let finished = process_chat_line(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":""},"done":false}"#,
            &mut out,
            &service.tx,
            1,
        );
        assert!(!finished);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let (service, mut rx) = ChatStreamService::new();
        let mut out = String::new();
        assert!(!process_chat_line("", &mut out, &service.tx, 1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn daemon_error_line_becomes_error_done() {
        let (service, mut rx) = ChatStreamService::new();
        let mut out = String::new();

        let finished = process_chat_line(
            r#"{"error":"model \"nope\" not found"}"#,
            &mut out,
            &service.tx,
            3,
        );
        assert!(finished);

        let (message, received_id) = rx.try_recv().expect("expected done message");
        assert_eq!(received_id, 3);
        match message {
            StreamMessage::Done(text) => {
                assert_eq!(text, "Error: model \"nope\" not found");
            }
            other => panic!("expected done message, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_line_becomes_error_done() {
        let (service, mut rx) = ChatStreamService::new();
        let mut out = String::new();

        let finished = process_chat_line("not json at all", &mut out, &service.tx, 4);
        assert!(finished);

        let (message, _) = rx.try_recv().expect("expected done message");
        match message {
            StreamMessage::Done(text) => {
                assert!(text.starts_with("Error: malformed response from daemon:"));
            }
            other => panic!("expected done message, got {:?}", other),
        }
    }

    #[test]
    fn error_body_summary_extracts_json_error() {
        assert_eq!(
            error_body_summary(r#"{"error":"model not found"}"#),
            "model not found"
        );
        assert_eq!(error_body_summary("plain failure"), "plain failure");
        assert_eq!(error_body_summary("  "), "<empty response body>");
    }
}
