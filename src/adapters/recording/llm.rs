//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use serde::Serialize;
use tracing::warn;

use crate::cassette::recorder::CassetteRecorder;
use crate::error::Result;
use crate::ports::llm::{ChunkStream, CompletionFuture, CompletionRequest, LlmClient};

/// Delegates to an inner client and records every call under `port`.
pub struct RecordingLlmClient {
    port: &'static str,
    inner: Arc<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

#[derive(Serialize)]
struct RecordedChunks<'a> {
    chunks: &'a [String],
}

impl RecordingLlmClient {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(
        port: &'static str,
        inner: Arc<dyn LlmClient>,
        recorder: Arc<Mutex<CassetteRecorder>>,
    ) -> Self {
        Self { port, inner, recorder }
    }

    fn record<T: Serialize>(&self, method: &str, request: &CompletionRequest, result: &Result<T>) {
        match self.recorder.lock() {
            Ok(mut recorder) => recorder.record_result(self.port, method, request, result),
            Err(e) => warn!("cassette recorder unavailable: {e}"),
        }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            self.record("complete", &request, &result);
            result
        })
    }

    fn stream(&self, request: &CompletionRequest) -> ChunkStream<'_> {
        let request = request.clone();
        let drained = async move {
            let mut inner = self.inner.stream(&request);
            let mut chunks = Vec::new();
            let mut failure = None;
            while let Some(item) = inner.next().await {
                match item {
                    Ok(chunk) => chunks.push(chunk),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            let recorded = match &failure {
                Some(e) => Err(e.clone()),
                None => Ok(RecordedChunks { chunks: &chunks }),
            };
            self.record("stream", &request, &recorded);

            let mut items: Vec<Result<String>> = chunks.into_iter().map(Ok).collect();
            items.extend(failure.map(Err));
            futures::stream::iter(items)
        };
        Box::pin(futures::stream::once(drained).flatten())
    }
}
