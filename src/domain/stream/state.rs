//! Answer stream state machine
//!
//! ```text
//! Idle -> SourcesSent -> Streaming -> Done
//!              |             |
//!              +-------------+-> Failed
//! ```
//!
//! Every event leaving the transport is produced by a guarded transition, so
//! text can never precede sources and nothing follows a terminal event.

use std::fmt;

use thiserror::Error;

use super::StreamEvent;
use crate::domain::knowledge::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    SourcesSent,
    Streaming,
    Done,
    Failed,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::SourcesSent => "sources_sent",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot emit '{event}' while stream is {from}")]
pub struct TransitionError {
    pub from: StreamState,
    pub event: &'static str,
}

/// Guards the order of events on one answer stream
#[derive(Debug)]
pub struct StreamTransport {
    state: StreamState,
    fragments: usize,
}

impl Default for StreamTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamTransport {
    pub fn new() -> Self {
        Self {
            state: StreamState::Idle,
            fragments: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Number of text events emitted so far
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Idle -> SourcesSent
    pub fn sources(&mut self, sources: Vec<Source>) -> Result<StreamEvent, TransitionError> {
        self.advance("sources", StreamState::SourcesSent, |s| s == StreamState::Idle)?;
        Ok(StreamEvent::Sources { sources })
    }

    /// SourcesSent | Streaming -> Streaming
    pub fn text(&mut self, content: String) -> Result<StreamEvent, TransitionError> {
        self.advance("text", StreamState::Streaming, Self::is_open)?;
        self.fragments += 1;
        Ok(StreamEvent::Text { content })
    }

    /// SourcesSent | Streaming -> Done
    pub fn done(&mut self) -> Result<StreamEvent, TransitionError> {
        self.advance("done", StreamState::Done, Self::is_open)?;
        Ok(StreamEvent::Done)
    }

    /// SourcesSent | Streaming -> Failed
    pub fn fail(&mut self, message: impl Into<String>) -> Result<StreamEvent, TransitionError> {
        self.advance("error", StreamState::Failed, Self::is_open)?;
        Ok(StreamEvent::Error {
            message: message.into(),
        })
    }

    fn is_open(state: StreamState) -> bool {
        matches!(state, StreamState::SourcesSent | StreamState::Streaming)
    }

    fn advance(
        &mut self,
        event: &'static str,
        to: StreamState,
        allowed: impl Fn(StreamState) -> bool,
    ) -> Result<(), TransitionError> {
        if !allowed(self.state) {
            return Err(TransitionError {
                from: self.state,
                event,
            });
        }
        self.state = to;
        Ok(())
    }
}
