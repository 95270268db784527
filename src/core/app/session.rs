use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::chat_socket::{EndParams, SessionParams};
use crate::core::session::Session;
use crate::utils::logging::LoggingState;

/// Everything needed to talk to the conversation service, plus the one
/// session currently in use.
pub struct SessionContext {
    pub client: Client,
    pub server_url: String,
    pub logging: LoggingState,
    pub typewriter_interval: Duration,
    /// Bumped for every new session; socket events tagged with an older value are stale.
    pub generation: u64,
    pub active: Option<Session>,
}

impl SessionContext {
    pub fn new(
        client: Client,
        server_url: String,
        logging: LoggingState,
        typewriter_interval: Duration,
    ) -> Self {
        Self {
            client,
            server_url,
            logging,
            typewriter_interval,
            generation: 0,
            active: None,
        }
    }

    /// The active session, but only if `generation` still refers to it.
    pub fn current_mut(&mut self, generation: u64) -> Option<&mut Session> {
        self.active
            .as_mut()
            .filter(|session| session.generation == generation)
    }

    pub fn has_live_session(&self) -> bool {
        self.active.as_ref().is_some_and(Session::is_live)
    }

    pub fn is_open(&self) -> bool {
        self.active.as_ref().is_some_and(Session::is_open)
    }

    /// Register a fresh `Connecting` session and return what the socket task needs.
    pub fn begin_session(&mut self) -> SessionParams {
        self.generation += 1;
        let cancel_token = CancellationToken::new();
        self.active = Some(Session::connecting(self.generation, cancel_token.clone()));
        debug!(generation = self.generation, "starting session");

        SessionParams {
            client: self.client.clone(),
            server_url: self.server_url.clone(),
            generation: self.generation,
            cancel_token,
        }
    }

    /// Cancel the active session. Returns the `end` request if the server
    /// had issued a conversation id.
    pub fn end_session(&mut self) -> Option<EndParams> {
        let mut session = self.active.take()?;
        session.cancel();
        session.conversation_id.take().map(|conversation_id| EndParams {
            client: self.client.clone(),
            server_url: self.server_url.clone(),
            conversation_id,
        })
    }
}
