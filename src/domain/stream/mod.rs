//! Streaming answer transport - framed events behind an explicit state machine

mod driver;
mod event;
mod state;

pub use driver::{
    spawn_answer_stream, AnswerStream, StreamOutcome, StreamSettings, StreamSummary,
    DEFAULT_CHANNEL_CAPACITY,
};
pub use event::StreamEvent;
pub use state::{StreamState, StreamTransport, TransitionError};
