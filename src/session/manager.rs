use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use log::{info, warn, debug};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use crate::ai_service::{AnswerEvaluator, QuestionGenerator, SampleAiService};
use crate::config::{AiProvider, AppConfig};
use crate::database::Candidate;
use crate::interview::{
    spawn_controller, ControllerError, ControllerHandle, InterviewEvent, WeakControllerHandle,
};
use crate::openai::OpenAIClient;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Candidate {0} already has an active interview")]
    AlreadyActive(String),
    #[error("No active interview for candidate {0}")]
    NotFound(String),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Registry of live interview sessions, at most one per candidate id.
///
/// Entries are weak: a controller stops once the host drops its handles, and
/// a completed interview no longer counts as live.
pub struct SessionManager {
    generator: Arc<dyn QuestionGenerator>,
    evaluator: Arc<dyn AnswerEvaluator>,
    tick_period: Duration,
    sessions: Mutex<HashMap<String, WeakControllerHandle>>,
}

impl SessionManager {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        evaluator: Arc<dyn AnswerEvaluator>,
        tick_period: Duration,
    ) -> Self {
        Self {
            generator,
            evaluator,
            tick_period,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Picks the AI backend from config: OpenAI when a key is available, otherwise the sample bank.
    pub fn from_config(config: &AppConfig) -> Self {
        match (config.ai.effective_provider(), config.ai.api_key()) {
            (AiProvider::OpenAI, Some(key)) => {
                info!("🤖 Using OpenAI model {} for questions and scoring", config.ai.model);
                let client = Arc::new(OpenAIClient::from_config(&config.ai, key.to_string()));
                Self::new(client.clone(), client, config.interview.tick_period())
            }
            _ => {
                info!("📚 Using the offline sample question bank");
                let service = Arc::new(SampleAiService::new());
                Self::new(service.clone(), service, config.interview.tick_period())
            }
        }
    }

    /// Spawns a controller for `candidate`, binds the candidate and returns the
    /// handle plus its event stream. The interview itself begins with
    /// [`ControllerHandle::start`].
    pub async fn start_session(
        &self,
        candidate: Candidate,
    ) -> Result<(ControllerHandle, mpsc::UnboundedReceiver<InterviewEvent>)> {
        let candidate_id = candidate.id.clone();
        let (handle, events) = {
            let mut sessions = self.sessions.lock();
            let live = sessions
                .get(&candidate_id)
                .and_then(WeakControllerHandle::upgrade)
                .is_some_and(|h| h.is_live());
            if live {
                return Err(SessionError::AlreadyActive(candidate_id));
            }
            let (handle, events) = spawn_controller(
                Arc::clone(&self.generator),
                Arc::clone(&self.evaluator),
                self.tick_period,
            );
            sessions.insert(candidate_id.clone(), handle.downgrade());
            (handle, events)
        };

        if let Err(e) = handle.mark_ready(candidate).await {
            warn!("Candidate {} could not join an interview: {}", candidate_id, e);
            self.sessions.lock().remove(&candidate_id);
            return Err(e.into());
        }

        info!("🎙️ Interview session opened for candidate {}", candidate_id);
        Ok((handle, events))
    }

    pub fn get(&self, candidate_id: &str) -> Option<ControllerHandle> {
        self.sessions
            .lock()
            .get(candidate_id)
            .and_then(WeakControllerHandle::upgrade)
            .filter(|h| h.is_live())
    }

    /// Resets the session and removes it from the registry.
    pub async fn end_session(&self, candidate_id: &str) -> Result<()> {
        let handle = self
            .sessions
            .lock()
            .remove(candidate_id)
            .ok_or_else(|| SessionError::NotFound(candidate_id.to_string()))?;

        match handle.upgrade() {
            Some(handle) => {
                if let Err(e) = handle.reset().await {
                    warn!("Session for {} had already stopped: {}", candidate_id, e);
                }
            }
            None => debug!("Session for {} already released by the host", candidate_id),
        }
        info!("👋 Interview session closed for candidate {}", candidate_id);
        Ok(())
    }

    pub fn active_sessions(&self) -> Vec<String> {
        let mut sessions = self.sessions.lock();
        sessions.retain(|_, weak| weak.upgrade().is_some_and(|h| h.is_live()));
        sessions.keys().cloned().collect()
    }
}
