//! mirnet core - client orchestration
//!
//! Everything between the user and the API boundary:
//! - Session status machine (`Unknown -> Checking -> settled`)
//! - Login / registration form
//! - File picker filtering
//! - Single-flight upload orchestration
//! - Display resources that are released exactly once
//!
//! # Example
//!
//! ```rust,ignore
//! use mirnet_api::{ClientConfig, HttpApiClient};
//! use mirnet_core::{ClientApp, MemoryBlobRegistry};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(HttpApiClient::new(&ClientConfig::default())?);
//! let mut app = ClientApp::new(api, Arc::new(MemoryBlobRegistry::new()));
//! app.mount();
//! println!("{}", app.session().settled().await);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod auth_form;
pub mod error;
pub mod picker;
pub mod resource;
pub mod session;
pub mod upload;

pub use app::ClientApp;
pub use auth_form::{AuthForm, AuthOutcome};
pub use error::PickerError;
pub use picker::{FilePicker, ImageMediaType, ACCEPTED_MEDIA_TYPES};
pub use resource::{
    BlobResourceCell, BlobUrlFactory, BlobUrlGuard, DisplayUrl, MemoryBlobRegistry, BLOB_URL_PREFIX,
};
pub use session::{SessionStateMachine, SessionStatus};
pub use upload::{UploadOrchestrator, UploadView};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the client
    pub use crate::{
        AuthForm, AuthOutcome, ClientApp, DisplayUrl, FilePicker, MemoryBlobRegistry,
        SessionStateMachine, SessionStatus, UploadOrchestrator, UploadView,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
