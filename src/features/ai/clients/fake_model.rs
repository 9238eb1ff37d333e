//! In-process [`GenerativeModel`] used by the gateway tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{GenerationRequest, GenerativeModel, ModelError};

/// Replays a canned reply and records every request it receives
pub struct FakeModel {
    reply: Result<Option<String>, ModelError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Arc<Self> {
        Self::with_reply(Ok(Some(text.to_string())))
    }

    pub fn empty() -> Arc<Self> {
        Self::with_reply(Ok(None))
    }

    pub fn failing(error: ModelError) -> Arc<Self> {
        Self::with_reply(Err(error))
    }

    fn with_reply(reply: Result<Option<String>, ModelError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(&self, request: GenerationRequest) -> Result<Option<String>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        self.reply.clone()
    }
}
