// Submission Adapter Port
// One delivery attempt to a search-engine indexing endpoint

use crate::domain::{Credential, SearchEngine};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Everything an adapter needs for one attempt
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub url: String,
    /// The owning domain's site URL (Bing wants it alongside the page URL)
    pub site_url: String,
    pub credential: Credential,
}

/// Successful provider response
#[derive(Debug, Clone, Default)]
pub struct SubmissionReceipt {
    pub status_code: u16,
    pub body: Option<serde_json::Value>,
}

/// Submission errors
///
/// `Display` is what ends up in the queue item's `error_message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Submission adapter trait
///
/// Implementations:
/// - GoogleIndexingAdapter: OAuth2 service-account flow
/// - BingWebmasterAdapter: API-key flow
///
/// Adapters never touch queue state; the processor persists what they return.
#[async_trait]
pub trait SubmissionAdapter: Send + Sync {
    /// Search engine this adapter delivers to
    fn engine(&self) -> SearchEngine;

    /// Perform exactly one delivery attempt
    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Engine -> adapter lookup
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<SearchEngine, Arc<dyn SubmissionAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own engine (replaces any previous one)
    pub fn register(mut self, adapter: Arc<dyn SubmissionAdapter>) -> Self {
        self.adapters.insert(adapter.engine(), adapter);
        self
    }

    pub fn get(&self, engine: SearchEngine) -> Option<Arc<dyn SubmissionAdapter>> {
        self.adapters.get(&engine).cloned()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock adapter behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock submission adapter that records every URL it was asked to submit
    pub struct MockSubmissionAdapter {
        engine: SearchEngine,
        behavior: Mutex<MockBehavior>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockSubmissionAdapter {
        pub fn new(engine: SearchEngine, behavior: MockBehavior) -> Self {
            Self {
                engine,
                behavior: Mutex::new(behavior),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success(engine: SearchEngine) -> Self {
            Self::new(engine, MockBehavior::Success)
        }

        pub fn new_fail(engine: SearchEngine, message: impl Into<String>) -> Self {
            Self::new(engine, MockBehavior::Fail(message.into()))
        }

        pub fn new_panic_inducing(engine: SearchEngine, message: impl Into<String>) -> Self {
            Self::new(engine, MockBehavior::Panic(message.into()))
        }

        /// Share one call log between several adapters (cross-engine ordering)
        pub fn with_call_log(mut self, calls: Arc<Mutex<Vec<String>>>) -> Self {
            self.calls = calls;
            self
        }

        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SubmissionAdapter for MockSubmissionAdapter {
        fn engine(&self) -> SearchEngine {
            self.engine
        }

        async fn submit(
            &self,
            request: &SubmissionRequest,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            self.calls.lock().unwrap().push(request.url.clone());

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Success => Ok(SubmissionReceipt {
                    status_code: 200,
                    body: None,
                }),
                MockBehavior::Fail(message) => Err(SubmissionError::Rejected {
                    status: 500,
                    message,
                }),
                MockBehavior::Panic(message) => {
                    panic!("{}", message); // Actually panic for panic isolation testing
                }
            }
        }
    }
}
