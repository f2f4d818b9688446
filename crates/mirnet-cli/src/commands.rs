//! Subcommand implementations
//!
//! Each run is one process with its own cookie jar, so a session lives only
//! as long as the command that created it.

use anyhow::{bail, Context};
use mirnet_api::{ClientConfig, Credentials, HttpApiClient};
use mirnet_core::{AuthOutcome, ClientApp, FilePicker, MemoryBlobRegistry, SessionStatus};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Client app wired to the HTTP service and an in-process blob registry
pub(crate) struct Client {
    app: ClientApp,
    registry: Arc<MemoryBlobRegistry>,
}

impl Client {
    pub(crate) fn connect(config: &ClientConfig) -> anyhow::Result<Self> {
        let api = HttpApiClient::new(config).context("building HTTP client")?;
        let registry = Arc::new(MemoryBlobRegistry::new());
        let app = ClientApp::new(Arc::new(api), registry.clone());
        Ok(Self { app, registry })
    }

    async fn settle(&self) -> SessionStatus {
        self.app.mount();
        self.app.session().settled().await
    }

    pub(crate) async fn status(self) -> anyhow::Result<()> {
        println!("{}", self.settle().await);
        Ok(())
    }

    pub(crate) async fn login(self, credentials: Credentials) -> anyhow::Result<()> {
        self.settle().await;
        let outcome = self.app.auth_form(credentials).login().await;
        self.report(outcome, "login").await
    }

    pub(crate) async fn register(self, credentials: Credentials) -> anyhow::Result<()> {
        self.settle().await;
        let outcome = self.app.auth_form(credentials).register().await;
        self.report(outcome, "registration").await
    }

    async fn report(&self, outcome: AuthOutcome, action: &str) -> anyhow::Result<()> {
        if let AuthOutcome::Rejected(message) = outcome {
            bail!("{action} failed: {message}");
        }
        println!("{}", self.app.session().settled().await);
        Ok(())
    }

    /// Run one upload and write the displayed result to `output`
    pub(crate) async fn enhance(
        mut self,
        input: &Path,
        output: &Path,
        credentials: Option<Credentials>,
    ) -> anyhow::Result<()> {
        let mut logged_in = false;
        if !self.settle().await.is_authenticated() {
            let Some(credentials) = credentials else {
                bail!("not logged in; pass --user and --password");
            };
            if let AuthOutcome::Rejected(message) = self.app.auth_form(credentials).login().await {
                bail!("login failed: {message}");
            }
            logged_in = true;
        }

        let result = self.run_upload(input, output).await;

        if logged_in {
            self.app.logout().await;
        }
        result
    }

    async fn run_upload(&mut self, input: &Path, output: &Path) -> anyhow::Result<()> {
        let status = self.app.session().settled().await;
        let picker = FilePicker::new();
        let file = picker.load(input).await?;

        let Some(upload) = self.app.upload() else {
            bail!("not authenticated ({status})");
        };
        let files = picker.filter(vec![file], upload.accepts_input());
        upload.on_files_accepted(files).await;

        if let Some(error) = upload.error() {
            bail!("enhancement failed: {error}");
        }
        let url = upload.display().context("no result to save")?;
        let blob = self
            .registry
            .resolve(url)
            .context("result is no longer available")?;

        tokio::fs::write(output, blob.data())
            .await
            .with_context(|| format!("writing {}", output.display()))?;
        info!(output = %output.display(), bytes = blob.len(), "saved result");
        Ok(())
    }
}
