use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::ApiMessage;
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// Replays canned SSE frames, one response per `create_stream` call.
#[derive(Clone)]
pub struct MockGateway {
    responses: Arc<Mutex<Vec<Vec<String>>>>,
    requests: Arc<Mutex<Vec<Vec<ApiMessage>>>>,
}

impl MockGateway {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Message lists the client sent, system prompt included.
    pub fn requests(&self) -> Vec<Vec<ApiMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

/// Frame a text delta the way a chat-completions gateway streams it.
pub fn delta_frame(text: &str) -> String {
    let payload = serde_json::json!({
        "choices": [{ "index": 0, "delta": { "content": text }, "finish_reason": null }]
    });
    format!("data: {payload}")
}

impl MockStreamProducer for MockGateway {
    fn create_mock_stream(&self, messages: &[ApiMessage]) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!("MockGateway: No more responses configured"));
        }
        let current_sse_frames = responses_guard.remove(0);

        let sse_byte_chunks: Vec<Result<Bytes>> = current_sse_frames
            .into_iter()
            .map(|s| {
                let framed = if s.ends_with("\n\n") {
                    s
                } else {
                    format!("{s}\n\n")
                };
                Ok(Bytes::from(framed))
            })
            .collect();

        Ok(Box::pin(stream::iter(sse_byte_chunks)))
    }
}
