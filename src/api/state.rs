//! Application state shared by every handler

use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::services::AnswerService;

const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct AppState {
    pub answer_service: Arc<AnswerService>,
    /// Interval between SSE keep-alive comments
    pub keep_alive: Duration,
}

impl AppState {
    pub fn new(answer_service: Arc<AnswerService>) -> Self {
        Self {
            answer_service,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
