//! Top-level client composition
//!
//! The upload area exists only while the session is `Authenticated`. It is
//! created on the first reconcile that observes an authenticated session and
//! dropped, releasing its display resource, on the first one that does not.

use crate::auth_form::AuthForm;
use crate::resource::BlobUrlFactory;
use crate::session::{SessionStateMachine, SessionStatus};
use crate::upload::UploadOrchestrator;
use mirnet_api::{ApiClient, Credentials};
use std::sync::Arc;
use tracing::debug;

/// Client application root
pub struct ClientApp {
    api: Arc<dyn ApiClient>,
    factory: Arc<dyn BlobUrlFactory>,
    session: SessionStateMachine,
    upload: Option<UploadOrchestrator>,
}

impl std::fmt::Debug for ClientApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientApp")
            .field("session", &self.session)
            .field("upload", &self.upload)
            .finish_non_exhaustive()
    }
}

impl ClientApp {
    /// Create the app; the session stays `Unknown` until [`mount`](Self::mount)
    #[must_use]
    pub fn new(api: Arc<dyn ApiClient>, factory: Arc<dyn BlobUrlFactory>) -> Self {
        let session = SessionStateMachine::new(Arc::clone(&api));
        Self {
            api,
            factory,
            session,
            upload: None,
        }
    }

    /// Arm the initial session check
    pub fn mount(&self) {
        self.session.mount();
    }

    /// Session machine handle
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionStateMachine {
        &self.session
    }

    /// Current session status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Upload area, present only while authenticated.
    ///
    /// Reconciles against the current status first.
    pub fn upload(&mut self) -> Option<&mut UploadOrchestrator> {
        self.reconcile();
        self.upload.as_mut()
    }

    /// Bring the upload area in line with the session status
    pub fn reconcile(&mut self) {
        let authenticated = self.session.status().is_authenticated();
        match (&self.upload, authenticated) {
            (None, true) => {
                debug!("creating upload area");
                self.upload = Some(UploadOrchestrator::new(
                    Arc::clone(&self.api),
                    Arc::clone(&self.factory),
                ));
            }
            (Some(_), false) => {
                debug!("tearing down upload area");
                self.upload = None;
            }
            _ => {}
        }
    }

    /// Login form bound to this app's session
    #[must_use]
    pub fn auth_form(&self, credentials: Credentials) -> AuthForm {
        AuthForm::new(Arc::clone(&self.api), self.session.clone(), credentials)
    }

    /// End the session and tear down the upload area
    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.reconcile();
    }
}
