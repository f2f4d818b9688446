//! mirnet API - wire contract for the enhancement service
//!
//! The single source of truth for what the client sends and receives:
//! - Session operations (login, register, logout, current session)
//! - Image submission (multipart upload, binary result)
//! - Client configuration
//!
//! Everything above this crate talks to the service through the
//! [`ApiClient`] trait, so tests can substitute a scripted implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirnet_api::{ApiClient, ClientConfig, Credentials, HttpApiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpApiClient::new(&ClientConfig::default())?;
//! let response = client.login(&Credentials::new("user", "secret")).await?;
//! if response.success {
//!     let me = client.get_me().await?;
//!     println!("logged in as {:?}", me.session.map(|s| s.login));
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::ApiClient;
#[cfg(any(test, feature = "mock"))]
pub use client::MockApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use http::HttpApiClient;
pub use types::{Blob, Credentials, LoginResponse, MeResponse, SessionInfo, SourceFile};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
