//! Wires user actions to the session store, the reducer and the generator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::attachment::{read_image_as_data_uri, AttachmentError};
use crate::core::chat_stream::{GenerationRequest, Generator, StreamEvent};
use crate::core::config::{AgentConfig, Config};
use crate::core::message::Message;
use crate::core::persona::{ModelPolicy, Persona};
use crate::core::reducer::{ReducerError, StreamOutcome, StreamReducer};
use crate::core::session::Session;
use crate::core::store::{SessionStore, StoreError};

/// A generation that has been reserved and is ready to be streamed.
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    pub session_id: String,
    pub request: GenerationRequest,
}

pub struct ChatController {
    store: SessionStore,
    reducer: StreamReducer,
    config: Config,
    config_path: Option<PathBuf>,
    agent: AgentConfig,
    policy: ModelPolicy,
    generator: Arc<dyn Generator>,
    pending_image: Option<String>,
    status: Option<String>,
    last_failure: Option<String>,
}

impl ChatController {
    pub fn new(mut store: SessionStore, config: Config, generator: Arc<dyn Generator>) -> Self {
        let agent = config.agent_config();
        let policy = config.model_policy();
        store.set_default_persona(agent.persona);
        Self {
            store,
            reducer: StreamReducer::new(),
            config,
            config_path: None,
            agent,
            policy,
            generator,
            pending_image: None,
            status: None,
            last_failure: None,
        }
    }

    /// Persist persona and search changes to `path`.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn sessions(&self) -> &[Session] {
        self.store.sessions()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.store.active()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn agent(&self) -> &AgentConfig {
        &self.agent
    }

    pub fn policy(&self) -> &ModelPolicy {
        &self.policy
    }

    pub fn generator(&self) -> Arc<dyn Generator> {
        Arc::clone(&self.generator)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Message of the most recent failed stream, if any.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn is_generating(&self, session_id: &str) -> bool {
        self.reducer.is_generating(session_id)
    }

    pub fn active_is_generating(&self) -> bool {
        self.is_generating(self.store.active_id())
    }

    pub fn generating_count(&self) -> usize {
        self.reducer.in_flight_count()
    }

    pub fn pending_image(&self) -> Option<&str> {
        self.pending_image.as_deref()
    }

    /// Read an image file and hold it for the next submission.
    pub fn attach_image(&mut self, path: &Path) -> Result<(), AttachmentError> {
        let data_uri = read_image_as_data_uri(path)?;
        debug!(path = %path.display(), bytes = data_uri.len(), "Image attached");
        self.pending_image = Some(data_uri);
        Ok(())
    }

    pub fn clear_attachment(&mut self) {
        self.pending_image = None;
    }

    /// Append the user's message to the active session and reserve it for a
    /// response. Returns `Ok(None)` for an empty submission, which changes
    /// nothing.
    pub fn submit(&mut self, text: &str) -> Result<Option<PendingGeneration>, ReducerError> {
        if text.trim().is_empty() && self.pending_image.is_none() {
            return Ok(None);
        }

        let session_id = self.store.active_id().to_string();
        if self.reducer.is_generating(&session_id) {
            return Err(ReducerError::AlreadyGenerating(session_id));
        }

        let message = Message::user(text, self.pending_image.take());
        self.store
            .update_session(&session_id, |session| session.push_user_message(message))?;
        self.reducer.begin(&session_id)?;

        let session = self
            .store
            .get(&session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.clone()))?;
        let settings = self.policy.settings(session.persona, self.agent.use_search);
        let request = GenerationRequest::new(settings, &session.messages, self.agent.temperature);
        debug!(
            %session_id,
            model = %request.model,
            history = request.contents.len(),
            "Submitting generation request"
        );

        self.status = None;
        Ok(Some(PendingGeneration {
            session_id,
            request,
        }))
    }

    /// Apply an event forwarded from a background stream.
    pub fn apply_event(
        &mut self,
        session_id: &str,
        event: StreamEvent,
    ) -> Result<Option<StreamOutcome>, StoreError> {
        let outcome = self.reducer.apply_event(&mut self.store, session_id, event)?;
        if let Some(outcome) = &outcome {
            self.record_outcome(outcome);
        }
        Ok(outcome)
    }

    /// Open the stream for `pending` and fold it into the store in place.
    pub async fn generate(&mut self, pending: PendingGeneration) -> Result<StreamOutcome, StoreError> {
        let PendingGeneration {
            session_id,
            request,
        } = pending;

        let outcome = match self.generator.stream(request).await {
            Ok(stream) => {
                self.reducer
                    .drive(&mut self.store, &session_id, stream)
                    .await?
            }
            Err(err) => {
                let outcome = StreamOutcome::Failed {
                    message: err.to_string(),
                };
                self.reducer.finish(&session_id, &outcome);
                outcome
            }
        };
        self.record_outcome(&outcome);
        Ok(outcome)
    }

    /// Submit `text` and wait for the complete response.
    pub async fn send(&mut self, text: &str) -> Result<Option<StreamOutcome>, ReducerError> {
        match self.submit(text)? {
            Some(pending) => Ok(Some(self.generate(pending).await?)),
            None => Ok(None),
        }
    }

    fn record_outcome(&mut self, outcome: &StreamOutcome) {
        match outcome {
            StreamOutcome::Completed => {}
            StreamOutcome::Failed { message } => {
                self.status = Some(format!("Generation failed: {message}"));
                self.last_failure = Some(message.clone());
            }
        }
    }

    pub fn new_chat(&mut self) -> Result<&Session, StoreError> {
        self.store.create_session(self.agent.persona)
    }

    pub fn delete_session(&mut self, id: &str) -> Result<(), StoreError> {
        self.store.delete_session(id)
    }

    pub fn delete_active(&mut self) -> Result<(), StoreError> {
        let id = self.store.active_id().to_string();
        self.delete_session(&id)
    }

    pub fn select_session(&mut self, id: &str) -> Result<(), StoreError> {
        self.store.set_active(id)
    }

    pub fn select_next(&mut self) -> Result<(), StoreError> {
        self.select_offset(1)
    }

    pub fn select_previous(&mut self) -> Result<(), StoreError> {
        self.select_offset(-1)
    }

    fn select_offset(&mut self, offset: isize) -> Result<(), StoreError> {
        let len = self.store.sessions().len() as isize;
        if len == 0 {
            return Ok(());
        }
        let current = self.store.active_index().unwrap_or(0) as isize;
        let index = (current + offset).rem_euclid(len) as usize;
        let id = self.store.sessions()[index].id.clone();
        self.store.set_active(&id)
    }

    /// Make `persona` the default for new sessions and switch the active
    /// session to it. Earlier messages are unaffected.
    pub fn set_persona(&mut self, persona: Persona) -> Result<(), StoreError> {
        self.agent.persona = persona;
        self.store.set_default_persona(persona);
        self.config.remember_agent(&self.agent);

        let active_id = self.store.active_id().to_string();
        self.store
            .update_session(&active_id, |session| session.persona = persona)?;
        info!(%persona, "Persona changed");
        Ok(())
    }

    pub fn cycle_persona(&mut self) -> Result<Persona, StoreError> {
        let current = self
            .store
            .active()
            .map(|session| session.persona)
            .unwrap_or(self.agent.persona);
        let next = current.next();
        self.set_persona(next)?;
        Ok(next)
    }

    pub fn set_search(&mut self, enabled: bool) {
        self.agent.use_search = enabled;
        self.config.remember_agent(&self.agent);
        info!(
            enabled,
            model = %self.policy.model_for(enabled),
            "Web search toggled"
        );
    }

    pub fn toggle_search(&mut self) -> bool {
        let enabled = !self.agent.use_search;
        self.set_search(enabled);
        enabled
    }

    /// Write the remembered persona and search mode back to the config file.
    pub fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(err) = self.config.save_to_path(path) {
            warn!(error = %err, "Failed to save config");
        }
    }
}
