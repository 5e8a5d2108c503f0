//! Scripted NLU double used by integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{NluResult, Session};
use crate::ports::{NluError, NluService};

/// Returns queued results in order, falling back to an empty classification
/// once the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedNlu {
    queue: Mutex<VecDeque<Result<NluResult, NluError>>>,
    calls: AtomicUsize,
}

impl ScriptedNlu {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, result: Result<NluResult, NluError>) {
        self.queue.lock().await.push_back(result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn empty_result(text: &str) -> NluResult {
        NluResult {
            text: text.to_string(),
            skill_transfer: None,
            top_class: "DEFAULT".to_string(),
            classes: Vec::new(),
            entities: Vec::new(),
            response: Vec::new(),
        }
    }
}

#[async_trait]
impl NluService for ScriptedNlu {
    async fn send_message(
        &self,
        text: &str,
        _session: &mut Session,
    ) -> Result<NluResult, NluError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.queue.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(Self::empty_result(text)),
        }
    }
}
