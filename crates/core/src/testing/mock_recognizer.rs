//! Mock recognizer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::recognizer::{CardFields, RecognitionError, Recognizer};

/// Called at the start of every recognition with the 1-based call index.
pub type RecognizeHook = Arc<dyn Fn(usize) + Send + Sync>;

/// Mock implementation of the Recognizer trait.
///
/// By default call `n` returns fields named `"Card n"`. Failures are scripted
/// by call index, which equals the slot when a run starts at slot 1.
pub struct MockRecognizer {
    images: Arc<RwLock<Vec<PathBuf>>>,
    fixed: Arc<RwLock<Option<CardFields>>>,
    failing_calls: Arc<RwLock<HashSet<usize>>>,
    delay: Arc<RwLock<Duration>>,
    hook: Arc<RwLock<Option<RecognizeHook>>>,
}

impl std::fmt::Debug for MockRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRecognizer")
            .field("images", &"<images>")
            .field("hook", &"<hook>")
            .finish()
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            images: Arc::new(RwLock::new(Vec::new())),
            fixed: Arc::new(RwLock::new(None)),
            failing_calls: Arc::new(RwLock::new(HashSet::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            hook: Arc::new(RwLock::new(None)),
        }
    }

    /// Return these fields for every call.
    pub async fn set_fields(&self, fields: CardFields) {
        *self.fixed.write().await = Some(fields);
    }

    /// Fail the n-th call (1-based).
    pub async fn fail_on_call(&self, n: usize) {
        self.failing_calls.write().await.insert(n);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn set_hook(&self, hook: RecognizeHook) {
        *self.hook.write().await = Some(hook);
    }

    /// Images passed to `recognize`, in order.
    pub async fn recorded_images(&self) -> Vec<PathBuf> {
        self.images.read().await.clone()
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, image: &Path) -> Result<CardFields, RecognitionError> {
        let call = {
            let mut images = self.images.write().await;
            images.push(image.to_path_buf());
            images.len()
        };

        let hook = self.hook.read().await.clone();
        if let Some(hook) = hook {
            hook(call);
        }

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing_calls.read().await.contains(&call) {
            return Err(RecognitionError::Api {
                status: 503,
                message: format!("mock recognition failure on call {}", call),
            });
        }

        if let Some(fields) = self.fixed.read().await.clone() {
            return Ok(fields);
        }

        Ok(CardFields::from_values(vec![format!("Card {}", call)]))
    }
}
