//! Folds streamed response chunks into the session store.
//!
//! Each generating session owns one [`ResponseAccumulator`]. Every chunk
//! replaces the session's trailing assistant message with the accumulated
//! state (or appends it on the first chunk), so an observer of the store
//! always sees a complete, renderable transcript. The registry of
//! accumulators doubles as the per-session in-flight guard.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::core::chat_stream::{ChunkStream, StreamChunk, StreamEvent};
use crate::core::message::{new_id, GroundingSource, Message, Role};
use crate::core::session::Session;
use crate::core::store::{SessionStore, StoreError};

#[derive(Debug)]
pub enum ReducerError {
    /// The session already has a response streaming into it.
    AlreadyGenerating(String),
    Store(StoreError),
}

impl fmt::Display for ReducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReducerError::AlreadyGenerating(id) => {
                write!(f, "Session '{id}' is already generating a response")
            }
            ReducerError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for ReducerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ReducerError::AlreadyGenerating(_) => None,
            ReducerError::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for ReducerError {
    fn from(value: StoreError) -> Self {
        ReducerError::Store(value)
    }
}

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed { message: String },
}

/// Running state of one assistant response.
#[derive(Debug, Clone)]
pub struct ResponseAccumulator {
    session_id: String,
    message_id: String,
    content: String,
    sources: Vec<GroundingSource>,
}

impl ResponseAccumulator {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message_id: new_id(),
            content: String::new(),
            sources: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sources(&self) -> &[GroundingSource] {
        &self.sources
    }

    /// Add a chunk's text and any sources whose uri has not been seen yet.
    pub fn push(&mut self, chunk: &StreamChunk) {
        self.content.push_str(&chunk.text);
        for source in &chunk.sources {
            if !self.sources.iter().any(|seen| seen.uri == source.uri) {
                self.sources.push(source.clone());
            }
        }
    }

    fn grounding_sources(&self) -> Option<Vec<GroundingSource>> {
        (!self.sources.is_empty()).then(|| self.sources.clone())
    }

    /// Write the accumulated response into `session`: replace the trailing
    /// message when it is this response, append it otherwise.
    pub fn apply_to(&self, session: &mut Session) {
        let is_ours = session
            .messages
            .last()
            .is_some_and(|last| last.role == Role::Assistant && last.id == self.message_id);

        if is_ours {
            if let Some(last) = session.messages.pop() {
                session.messages.push(Message {
                    content: self.content.clone(),
                    grounding_sources: self.grounding_sources(),
                    ..last
                });
            }
        } else {
            let mut message = Message::with_id(&self.message_id, Role::Assistant, &self.content);
            message.grounding_sources = self.grounding_sources();
            session.messages.push(message);
        }
    }
}

/// Tracks the response in flight for each generating session.
#[derive(Default)]
pub struct StreamReducer {
    in_flight: HashMap<String, ResponseAccumulator>,
}

impl StreamReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_generating(&self, session_id: &str) -> bool {
        self.in_flight.contains_key(session_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Reserve `session_id` for a new response. Fails while a previous
    /// response for the same session is still streaming.
    pub fn begin(&mut self, session_id: &str) -> Result<&ResponseAccumulator, ReducerError> {
        if self.is_generating(session_id) {
            return Err(ReducerError::AlreadyGenerating(session_id.to_string()));
        }
        let accumulator = ResponseAccumulator::new(session_id);
        debug!(%session_id, message_id = %accumulator.message_id, "Response started");
        Ok(self
            .in_flight
            .entry(session_id.to_string())
            .or_insert(accumulator))
    }

    /// Fold one chunk into the store. Chunks for sessions that are not
    /// generating, or that were deleted meanwhile, change nothing.
    pub fn apply_chunk(
        &mut self,
        store: &mut SessionStore,
        session_id: &str,
        chunk: &StreamChunk,
    ) -> Result<(), StoreError> {
        let Some(accumulator) = self.in_flight.get_mut(session_id) else {
            debug!(%session_id, "Dropping chunk for a session with no response in flight");
            return Ok(());
        };
        accumulator.push(chunk);

        let accumulator = &*accumulator;
        match store.update_session(session_id, |session| accumulator.apply_to(session)) {
            Err(StoreError::SessionNotFound(_)) => {
                debug!(%session_id, "Session deleted while streaming; chunk dropped");
                Ok(())
            }
            other => other,
        }
    }

    /// Release the session. The transcript keeps whatever the response
    /// reached; a failure is only logged.
    pub fn finish(&mut self, session_id: &str, outcome: &StreamOutcome) -> Option<ResponseAccumulator> {
        let accumulator = self.in_flight.remove(session_id);
        match outcome {
            StreamOutcome::Completed => {
                debug!(%session_id, "Response completed");
            }
            StreamOutcome::Failed { message } => {
                warn!(%session_id, error = %message, "Generation stream failed");
            }
        }
        accumulator
    }

    /// Apply one event from a background stream. Returns the outcome when the
    /// event ends the stream.
    pub fn apply_event(
        &mut self,
        store: &mut SessionStore,
        session_id: &str,
        event: StreamEvent,
    ) -> Result<Option<StreamOutcome>, StoreError> {
        let outcome = match event {
            StreamEvent::Chunk(chunk) => {
                self.apply_chunk(store, session_id, &chunk)?;
                return Ok(None);
            }
            StreamEvent::End => StreamOutcome::Completed,
            StreamEvent::Failed(message) => StreamOutcome::Failed { message },
        };
        self.finish(session_id, &outcome);
        Ok(Some(outcome))
    }

    /// Consume `stream` to the end, folding every chunk into the store.
    /// `begin` must have been called for `session_id`. The session is
    /// released however the stream ends, including on a storage error.
    pub async fn drive(
        &mut self,
        store: &mut SessionStore,
        session_id: &str,
        mut stream: ChunkStream,
    ) -> Result<StreamOutcome, StoreError> {
        let mut outcome = StreamOutcome::Completed;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if let Err(err) = self.apply_chunk(store, session_id, &chunk) {
                        self.finish(
                            session_id,
                            &StreamOutcome::Failed {
                                message: err.to_string(),
                            },
                        );
                        return Err(err);
                    }
                }
                Err(err) => {
                    outcome = StreamOutcome::Failed {
                        message: err.to_string(),
                    };
                    break;
                }
            }
        }
        self.finish(session_id, &outcome);
        Ok(outcome)
    }
}
