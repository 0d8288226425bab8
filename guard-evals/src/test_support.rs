use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use guard_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, EmbeddingAdapter,
    InferenceChunk, InferenceRequest, ModelAdapter,
};

/// Completion double replaying scripted replies in order.
pub(crate) struct ScriptedModel {
    metadata: AdapterMetadata,
    replies: Mutex<VecDeque<AdapterResult<String>>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedModel {
    pub(crate) fn new(replies: Vec<AdapterResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            metadata: AdapterMetadata::new("scripted", "scripted-model"),
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelAdapter for ScriptedModel {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AdapterError::response("no scripted reply left")))?;
        let chunk = InferenceChunk::new(reply, true);
        Ok(Box::pin(stream::once(async move { Ok(chunk) })))
    }
}

/// Embedding double returning fixed vectors per term.
pub(crate) struct FixedEmbedder {
    metadata: AdapterMetadata,
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    pub(crate) fn new(vectors: &[(&str, Vec<f32>)]) -> Arc<Self> {
        Arc::new(Self {
            metadata: AdapterMetadata::new("fixed", "fixed-embedding"),
            vectors: vectors
                .iter()
                .map(|(term, vector)| ((*term).to_owned(), vector.clone()))
                .collect(),
        })
    }
}

#[async_trait]
impl EmbeddingAdapter for FixedEmbedder {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn embed(&self, input: &str) -> AdapterResult<Vec<f32>> {
        self.vectors
            .get(input)
            .cloned()
            .ok_or_else(|| AdapterError::response(format!("no embedding for {input}")))
    }
}
