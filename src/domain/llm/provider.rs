use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::Prompt;
use crate::domain::DomainError;

/// Incremental text fragments produced by a generation call
///
/// Dropping the stream abandons the upstream request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Language model that answers an assembled prompt
#[async_trait]
pub trait GenerationClient: Send + Sync + Debug {
    /// Generate the complete answer
    async fn generate(&self, prompt: &Prompt) -> Result<String, DomainError>;

    /// Generate the answer as a sequence of fragments
    async fn generate_stream(&self, prompt: &Prompt) -> Result<FragmentStream, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted generation client
    ///
    /// Streams the configured fragments one by one, optionally failing or
    /// hanging after a given number of them.
    #[derive(Debug, Clone)]
    pub struct MockGenerationClient {
        fragments: Vec<String>,
        start_error: Option<String>,
        fail_after: Option<(usize, String)>,
        hang_after: Option<usize>,
        yielded: Arc<AtomicUsize>,
        dropped: Arc<AtomicBool>,
        prompts: Arc<Mutex<Vec<Prompt>>>,
    }

    impl MockGenerationClient {
        pub fn new(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                start_error: None,
                fail_after: None,
                hang_after: None,
                yielded: Arc::new(AtomicUsize::new(0)),
                dropped: Arc::new(AtomicBool::new(false)),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Fail before producing anything
        pub fn with_start_error(mut self, error: impl Into<String>) -> Self {
            self.start_error = Some(error.into());
            self
        }

        /// Raise an error after `count` fragments
        pub fn with_failure_after(mut self, count: usize, error: impl Into<String>) -> Self {
            self.fail_after = Some((count, error.into()));
            self
        }

        /// Stop producing (without ending) after `count` fragments
        pub fn with_hang_after(mut self, count: usize) -> Self {
            self.hang_after = Some(count);
            self
        }

        pub fn yielded(&self) -> usize {
            self.yielded.load(Ordering::SeqCst)
        }

        pub fn stream_dropped(&self) -> bool {
            self.dropped.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<Prompt> {
            self.prompts.lock().unwrap().clone()
        }
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    struct StreamState {
        index: usize,
        fragments: Vec<String>,
        fail_after: Option<(usize, String)>,
        hang_after: Option<usize>,
        yielded: Arc<AtomicUsize>,
        _flag: DropFlag,
    }

    #[async_trait]
    impl GenerationClient for MockGenerationClient {
        async fn generate(&self, prompt: &Prompt) -> Result<String, DomainError> {
            self.prompts.lock().unwrap().push(prompt.clone());

            if let Some(ref error) = self.start_error {
                return Err(DomainError::provider("mock", error));
            }

            if let Some((_, ref error)) = self.fail_after {
                return Err(DomainError::provider("mock", error));
            }

            Ok(self.fragments.concat())
        }

        async fn generate_stream(&self, prompt: &Prompt) -> Result<FragmentStream, DomainError> {
            self.prompts.lock().unwrap().push(prompt.clone());

            if let Some(ref error) = self.start_error {
                return Err(DomainError::provider("mock", error));
            }

            let state = StreamState {
                index: 0,
                fragments: self.fragments.clone(),
                fail_after: self.fail_after.clone(),
                hang_after: self.hang_after,
                yielded: self.yielded.clone(),
                _flag: DropFlag(self.dropped.clone()),
            };

            let stream = stream::unfold(state, |mut state| async move {
                if state.hang_after == Some(state.index) {
                    futures::future::pending::<()>().await;
                }

                if let Some((count, ref error)) = state.fail_after {
                    if state.index == count {
                        let error = DomainError::provider("mock", error.clone());
                        state.fail_after = None;
                        state.index = usize::MAX;
                        return Some((Err(error), state));
                    }
                }

                let fragment = state.fragments.get(state.index)?.clone();
                state.index += 1;
                state.yielded.fetch_add(1, Ordering::SeqCst);
                Some((Ok(fragment), state))
            });

            Ok(Box::pin(stream))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
