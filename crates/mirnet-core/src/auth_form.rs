//! Login and registration form
//!
//! Thin layer over the API: submits the transient credentials, reports the
//! outcome and invalidates the session machine when a login goes through.

use crate::session::SessionStateMachine;
use mirnet_api::{ApiClient, ApiError, Credentials, LoginResponse};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Login went through and the session check was re-armed
    Accepted,
    /// Service rejected the request or it failed; message is shown to the user
    Rejected(String),
}

impl AuthOutcome {
    /// Whether the submission was accepted
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Credentials entry form.
///
/// Controls are disabled while `working`; exclusive access keeps one
/// submission in flight per form.
pub struct AuthForm {
    api: Arc<dyn ApiClient>,
    session: SessionStateMachine,
    credentials: Credentials,
    working: bool,
    error: Option<String>,
}

impl std::fmt::Debug for AuthForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthForm")
            .field("credentials", &self.credentials)
            .field("working", &self.working)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl AuthForm {
    /// Create a form bound to `session`
    #[must_use]
    pub fn new(
        api: Arc<dyn ApiClient>,
        session: SessionStateMachine,
        credentials: Credentials,
    ) -> Self {
        Self {
            api,
            session,
            credentials,
            working: false,
            error: None,
        }
    }

    /// Edit the login field
    #[inline]
    pub fn set_login(&mut self, login: impl Into<String>) {
        self.credentials.set_login(login);
    }

    /// Edit the password field
    #[inline]
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.credentials.set_password(password);
    }

    /// Current login field
    #[inline]
    #[must_use]
    pub fn login_field(&self) -> &str {
        self.credentials.login()
    }

    /// Whether a submission is in flight
    #[inline]
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.working
    }

    /// Message from the last failed submission
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submit the login request; on success the session is invalidated
    pub async fn login(&mut self) -> AuthOutcome {
        self.begin();
        let response = self.api.login(&self.credentials).await;
        match self.finish(response) {
            Some(message) => AuthOutcome::Rejected(message),
            None => {
                info!(login = self.credentials.login(), "login accepted");
                self.session.invalidate();
                AuthOutcome::Accepted
            }
        }
    }

    /// Register an account, then log in with the same credentials
    pub async fn register(&mut self) -> AuthOutcome {
        self.begin();
        let response = self.api.register(&self.credentials).await;
        match self.finish(response) {
            Some(message) => AuthOutcome::Rejected(message),
            None => {
                info!(login = self.credentials.login(), "registered; logging in");
                self.login().await
            }
        }
    }

    fn begin(&mut self) {
        self.working = true;
        self.error = None;
    }

    /// Settle a response; returns the message to surface, if any
    fn finish(&mut self, response: Result<LoginResponse, ApiError>) -> Option<String> {
        self.working = false;
        let message = match response {
            Ok(response) => response.rejection().map(str::to_owned),
            Err(err) => Some(err.to_string()),
        };
        if let Some(message) = &message {
            warn!(login = self.credentials.login(), error = %message, "auth request rejected");
            self.error = Some(message.clone());
        }
        message
    }
}
