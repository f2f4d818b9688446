//! Injectable API client interface
//!
//! The session machine, the auth forms and the upload orchestrator only see
//! this trait. [`crate::HttpApiClient`] is the production implementation.

use crate::error::ApiError;
use crate::types::{Blob, Credentials, LoginResponse, MeResponse, SourceFile};
use async_trait::async_trait;

/// The five operations of the enhancement service.
///
/// Every call is one request/response pair with session credentials
/// attached and caching disabled.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Submit a file for processing; resolves to the result image
    async fn submit(&self, file: &SourceFile) -> Result<Blob, ApiError>;

    /// Authenticate and establish a session
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// Create an account (does not establish a session)
    async fn register(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// End the current session (best-effort)
    async fn logout(&self) -> Result<(), ApiError>;

    /// Fetch the current session, if any
    async fn get_me(&self) -> Result<MeResponse, ApiError>;
}
