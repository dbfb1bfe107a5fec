use serde::{Deserialize, Serialize};

use crate::domain::knowledge::Source;

/// One framed unit of the answer stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The full ordered citation list, always first
    Sources { sources: Vec<Source> },
    /// One generated fragment, forwarded verbatim
    Text { content: String },
    /// Normal end of the answer
    Done,
    /// In-band failure after the stream was committed
    Error { message: String },
}

impl StreamEvent {
    /// Discriminator used as the SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sources { .. } => "sources",
            Self::Text { .. } => "text",
            Self::Done => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}
