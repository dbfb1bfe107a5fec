//! Drives one answer stream from generation fragments to framed events

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::{StreamEvent, StreamState, StreamTransport, TransitionError};
use crate::domain::knowledge::Source;
use crate::domain::llm::{FragmentStream, GenerationClient, Prompt};
use crate::domain::DomainError;

/// Default bound on events buffered ahead of a slow consumer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Events buffered before generation is paused for the consumer
    pub channel_capacity: usize,
    /// Longest allowed gap between two fragments
    pub fragment_timeout: Option<Duration>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            fragment_timeout: None,
        }
    }
}

/// How an answer stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed,
    /// The caller went away; not an error
    Cancelled,
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub outcome: StreamOutcome,
    pub fragments: usize,
}

/// A running answer stream
pub struct AnswerStream {
    /// Framed events in emission order
    pub events: ReceiverStream<StreamEvent>,
    /// Resolves once the producer has stopped
    pub summary: JoinHandle<StreamSummary>,
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream").finish_non_exhaustive()
    }
}

/// Start streaming an answer
///
/// The sources event is sent before generation is requested. The producer
/// task stops polling generation as soon as the event receiver is dropped.
pub fn spawn_answer_stream(
    client: Arc<dyn GenerationClient>,
    prompt: Prompt,
    sources: Vec<Source>,
    settings: StreamSettings,
) -> AnswerStream {
    let (tx, rx) = mpsc::channel::<StreamEvent>(settings.channel_capacity.max(1));

    let summary = tokio::spawn(drive(tx, client, prompt, sources, settings.fragment_timeout));

    AnswerStream {
        events: ReceiverStream::new(rx),
        summary,
    }
}

enum Next {
    Fragment(Result<String, DomainError>),
    Finished,
    Stalled,
    Cancelled,
}

async fn drive(
    tx: mpsc::Sender<StreamEvent>,
    client: Arc<dyn GenerationClient>,
    prompt: Prompt,
    sources: Vec<Source>,
    fragment_timeout: Option<Duration>,
) -> StreamSummary {
    let mut transport = StreamTransport::new();

    if !emit(&tx, transport.sources(sources)).await {
        return finish(&transport);
    }

    let started = tokio::select! {
        biased;
        _ = tx.closed() => return finish(&transport),
        started = client.generate_stream(&prompt) => started,
    };

    let mut fragments: FragmentStream = match started {
        Ok(fragments) => fragments,
        Err(e) => {
            warn!(error = %e, "Generation failed to start after sources were sent");
            emit(&tx, transport.fail(e.to_string())).await;
            return finish(&transport);
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => Next::Cancelled,
            next = next_fragment(&mut fragments, fragment_timeout) => next,
        };

        match next {
            Next::Fragment(Ok(content)) => {
                if !emit(&tx, transport.text(content)).await {
                    break;
                }
            }
            Next::Fragment(Err(e)) => {
                warn!(
                    error = %e,
                    fragments = transport.fragments(),
                    "Generation failed mid-stream"
                );
                emit(&tx, transport.fail(e.to_string())).await;
                break;
            }
            Next::Finished => {
                emit(&tx, transport.done()).await;
                break;
            }
            Next::Stalled => {
                warn!(
                    fragments = transport.fragments(),
                    "Generation stalled waiting for next fragment"
                );
                emit(&tx, transport.fail("answer generation timed out")).await;
                break;
            }
            Next::Cancelled => break,
        }
    }

    // Abandon any upstream work before reporting
    drop(fragments);
    finish(&transport)
}

async fn next_fragment(fragments: &mut FragmentStream, limit: Option<Duration>) -> Next {
    let next = match limit {
        Some(limit) => match tokio::time::timeout(limit, fragments.next()).await {
            Ok(next) => next,
            Err(_) => return Next::Stalled,
        },
        None => fragments.next().await,
    };

    match next {
        Some(fragment) => Next::Fragment(fragment),
        None => Next::Finished,
    }
}

/// Send one event; false when the stream must stop
async fn emit(
    tx: &mpsc::Sender<StreamEvent>,
    event: Result<StreamEvent, TransitionError>,
) -> bool {
    match event {
        Ok(event) => tx.send(event).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Refusing out-of-order stream event");
            false
        }
    }
}

fn finish(transport: &StreamTransport) -> StreamSummary {
    let outcome = match transport.state() {
        StreamState::Done => StreamOutcome::Completed,
        StreamState::Failed => StreamOutcome::Failed,
        _ => StreamOutcome::Cancelled,
    };

    if outcome == StreamOutcome::Cancelled {
        debug!(fragments = transport.fragments(), "Caller disconnected, answer stream cancelled");
    } else {
        debug!(
            outcome = outcome.as_str(),
            fragments = transport.fragments(),
            "Answer stream finished"
        );
    }

    StreamSummary {
        outcome,
        fragments: transport.fragments(),
    }
}
