//! HTTP implementation of [`ApiClient`]
//!
//! Async reqwest client with an in-memory cookie store, so the session
//! cookie set by `/login` rides along on every later request. Every request
//! asks intermediaries not to cache.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use tracing::{debug, instrument};
use url::Url;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::types::{Blob, Credentials, LoginResponse, MeResponse, SourceFile};

/// Multipart field carrying the submitted image
pub const INPUT_FIELD: &str = "input";

/// Enhancement service client over HTTP
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpApiClient {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base = config
            .api_url()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Request(format!("bad endpoint {path}: {e}")))
    }

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, login = credentials.login(), "POST credentials");

        let response = self.http.post(url).json(credentials).send().await?;
        read_login_response(response).await
    }
}

/// Decode a `/login` or `/register` reply.
///
/// The service reports some failures (duplicate account) as a 4xx with a
/// JSON body, so the body is tried first and the status only decides what
/// kind of error an undecodable body becomes.
async fn read_login_response(response: Response) -> Result<LoginResponse, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;

    match serde_json::from_slice::<LoginResponse>(&body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Err(ApiError::status(
            status.as_u16(),
            String::from_utf8_lossy(&body).into_owned(),
        )),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

/// Turn a non-success response into `ApiError::Status`
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::status(status.as_u16(), body))
}

#[async_trait]
impl ApiClient for HttpApiClient {
    #[instrument(skip(self, file), fields(name = %file.name, bytes = file.blob.len()))]
    async fn submit(&self, file: &SourceFile) -> Result<Blob, ApiError> {
        let url = self.endpoint("run")?;

        let mut part = Part::bytes(file.blob.data().to_vec()).file_name(file.name.clone());
        if !file.blob.media_type().is_empty() {
            part = part.mime_str(file.blob.media_type())?;
        }
        let form = Form::new().part(INPUT_FIELD, part);

        let response = self.http.post(url).multipart(form).send().await?;
        let response = ensure_success(response).await?;

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let data = response.bytes().await?;
        debug!(bytes = data.len(), %media_type, "received result");

        Ok(Blob::new(data, media_type))
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.post_credentials("login", credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.post_credentials("register", credentials).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint("logout")?;
        debug!(%url, "POST logout");
        let response = self.http.post(url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get_me(&self) -> Result<MeResponse, ApiError> {
        let url = self.endpoint("me")?;
        debug!(%url, "GET session");
        let response = self.http.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<MeResponse>().await?)
    }
}
