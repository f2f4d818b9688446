//! Wire types for the enhancement service
//!
//! JSON shapes for the session endpoints and the binary payloads
//! exchanged with `/run`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Login name and password, sent once per form submission.
///
/// Only ever serialized into a request body. `Debug` never shows the password.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    login: String,
    password: String,
}

impl Credentials {
    /// Create credentials
    #[inline]
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Login name
    #[inline]
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Password
    #[inline]
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Replace the login name
    #[inline]
    pub fn set_login(&mut self, login: impl Into<String>) {
        self.login = login.into();
    }

    /// Replace the password
    #[inline]
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `/login` and `/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Whether the operation succeeded
    pub success: bool,
    /// Failure description, when the service gave one
    #[serde(default)]
    pub error: Option<String>,
}

impl LoginResponse {
    /// Successful response
    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Failed response with a message
    #[inline]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    /// The message to surface, if this response is a rejection.
    ///
    /// A response only counts as rejected when `success` is false and the
    /// service supplied a message.
    #[inline]
    #[must_use]
    pub fn rejection(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            self.error.as_deref()
        }
    }
}

/// Identity of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Login name
    pub login: String,
}

/// Response of `/me`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    /// Present only when the request carried a valid session
    #[serde(default)]
    pub session: Option<SessionInfo>,
}

impl MeResponse {
    /// Response for an authenticated session
    #[inline]
    pub fn authenticated(login: impl Into<String>) -> Self {
        Self {
            session: Some(SessionInfo {
                login: login.into(),
            }),
        }
    }

    /// Response without a session
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Binary payload with its declared media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    media_type: String,
}

impl Blob {
    /// Create a blob
    #[inline]
    pub fn new(data: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Declared media type; empty when unknown
    #[inline]
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob holds no bytes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A user-selected file: name plus contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name as shown to the service
    pub name: String,
    /// Contents and media type
    pub blob: Blob,
}

impl SourceFile {
    /// Create a source file
    #[inline]
    pub fn new(name: impl Into<String>, blob: Blob) -> Self {
        Self {
            name: name.into(),
            blob,
        }
    }
}
