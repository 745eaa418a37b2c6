use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{BackendError, GenerationOptions, TextBackend};

/// One recorded call to a [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Deterministic backend that replays queued replies.
///
/// Used in tests and dry runs. Every prompt is recorded, including the ones
/// answered with an error. Once the queue is drained, the fallback reply is
/// returned (an empty string unless configured).
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue successful replies in order
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    /// Reply with the same text to every call
    pub fn constant(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: BackendError) {
        self.lock_replies().push_back(Err(error));
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock_calls().iter().map(|c| c.prompt.clone()).collect()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, BackendError>>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, BackendError> {
        self.lock_calls().push(RecordedCall {
            prompt: prompt.to_string(),
            options: options.clone(),
        });
        let next = self.lock_replies().pop_front();
        match next {
            Some(reply) => reply,
            None => Ok(self.fallback.clone().unwrap_or_default()),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
