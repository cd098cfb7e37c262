#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use futures_util::{stream, StreamExt};

#[cfg(test)]
use crate::core::chat_stream::{
    ChunkStream, GenerationError, GenerationRequest, Generator, StreamChunk,
};
#[cfg(test)]
use crate::core::config::Config;
#[cfg(test)]
use crate::core::conversation::ChatController;
#[cfg(test)]
use crate::core::store::{MemoryStorage, SessionStore};

/// Generator that replays a fixed script and records every request.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    chunks: Vec<StreamChunk>,
    fail_after: Option<String>,
    fail_on_open: Option<String>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

#[cfg(test)]
impl ScriptedGenerator {
    pub fn new(chunks: Vec<StreamChunk>) -> Self {
        Self {
            chunks,
            ..Default::default()
        }
    }

    pub fn failing_after(chunks: Vec<StreamChunk>, message: &str) -> Self {
        Self {
            chunks,
            fail_after: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_on_open(message: &str) -> Self {
        Self {
            fail_on_open: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Generator for ScriptedGenerator {
    async fn stream(&self, request: GenerationRequest) -> Result<ChunkStream, GenerationError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        if let Some(message) = &self.fail_on_open {
            return Err(GenerationError::Api(message.clone()));
        }

        let mut items: Vec<Result<StreamChunk, GenerationError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.fail_after {
            items.push(Err(GenerationError::Api(message.clone())));
        }
        Ok(stream::iter(items).boxed())
    }
}

#[cfg(test)]
pub fn create_test_store() -> (SessionStore, MemoryStorage) {
    let storage = MemoryStorage::new();
    let store = SessionStore::load(Box::new(storage.clone()), Default::default())
        .expect("memory store loads");
    (store, storage)
}

#[cfg(test)]
pub fn create_test_controller(generator: ScriptedGenerator) -> (ChatController, MemoryStorage) {
    let (store, storage) = create_test_store();
    let controller = ChatController::new(store, Config::default(), Arc::new(generator));
    (controller, storage)
}
