//! Upload orchestration
//!
//! One accepted file drives exactly one `/run` request:
//! 1. Stage the input in the display cell
//! 2. Mark `working`, clear the previous error
//! 3. Submit
//! 4. Show the result, or clear the display and record the error
//!
//! `on_files_accepted` takes `&mut self` for the whole cycle, so a second
//! submission cannot start while one is in flight.

use crate::resource::{BlobResourceCell, BlobUrlFactory, DisplayUrl};
use mirnet_api::{ApiClient, SourceFile};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What the upload area shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadView {
    /// Image currently on screen
    pub display: Option<DisplayUrl>,
    /// Request in flight; the picker is disabled
    pub working: bool,
    /// Failure of the last attempt
    pub error: Option<String>,
}

/// Drives file acceptance, submission and result display
pub struct UploadOrchestrator {
    api: Arc<dyn ApiClient>,
    cell: BlobResourceCell,
    working: bool,
    error: Option<String>,
    view: watch::Sender<UploadView>,
    submissions: u64,
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("cell", &self.cell)
            .field("working", &self.working)
            .field("error", &self.error)
            .field("submissions", &self.submissions)
            .finish_non_exhaustive()
    }
}

impl UploadOrchestrator {
    /// Create an idle orchestrator with an empty display
    #[must_use]
    pub fn new(api: Arc<dyn ApiClient>, factory: Arc<dyn BlobUrlFactory>) -> Self {
        let (view, _) = watch::channel(UploadView::default());
        Self {
            api,
            cell: BlobResourceCell::new(factory),
            working: false,
            error: None,
            view,
            submissions: 0,
        }
    }

    /// Handle files accepted by the picker.
    ///
    /// Empty input is a no-op; only the first file is submitted. Request
    /// failures are recorded in the view, not returned. Every path that
    /// touches the cell ends by publishing the view, so observers never
    /// hold a released URL.
    pub async fn on_files_accepted(&mut self, files: Vec<SourceFile>) {
        let count = files.len();
        let Some(file) = files.into_iter().next() else {
            return;
        };
        if count > 1 {
            debug!(ignored = count - 1, "only the first file is submitted");
        }

        self.cell.install(Some(&file.blob));
        self.working = true;
        self.error = None;
        self.publish();

        self.submissions += 1;
        info!(name = %file.name, bytes = file.blob.len(), "submitting file");
        match self.api.submit(&file).await {
            Ok(result) => {
                self.cell.install(Some(&result));
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                self.cell.clear();
                self.error = Some(err.to_string());
            }
        }

        self.working = false;
        self.publish();
    }

    /// Current view
    #[must_use]
    pub fn view(&self) -> UploadView {
        self.view.borrow().clone()
    }

    /// View updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UploadView> {
        self.view.subscribe()
    }

    /// Image currently on screen
    #[inline]
    #[must_use]
    pub fn display(&self) -> Option<&DisplayUrl> {
        self.cell.current()
    }

    /// Whether a request is in flight
    #[inline]
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.working
    }

    /// Whether the picker should accept files
    #[inline]
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        !self.working
    }

    /// Failure of the last attempt
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Requests issued so far
    #[inline]
    #[must_use]
    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    fn publish(&self) {
        self.view.send_replace(UploadView {
            display: self.cell.current().cloned(),
            working: self.working,
            error: self.error.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryBlobRegistry;
    use mirnet_api::{ApiError, Blob, MockApiClient};
    use pretty_assertions::assert_eq;

    fn photo() -> SourceFile {
        SourceFile::new("photo.png", Blob::new(vec![1u8, 2, 3], "image/png"))
    }

    fn orchestrator(mock: MockApiClient) -> (UploadOrchestrator, Arc<MemoryBlobRegistry>) {
        let registry = Arc::new(MemoryBlobRegistry::new());
        let orchestrator = UploadOrchestrator::new(Arc::new(mock), registry.clone());
        (orchestrator, registry)
    }

    #[tokio::test]
    async fn empty_drop_is_noop() {
        let mut mock = MockApiClient::new();
        mock.expect_submit().never();
        let (mut upload, registry) = orchestrator(mock);

        upload.on_files_accepted(Vec::new()).await;

        assert_eq!(upload.view(), UploadView::default());
        assert_eq!(upload.display(), None);
        assert_eq!(registry.created_count(), 0);
        assert_eq!(upload.submissions(), 0);
    }

    #[tokio::test]
    async fn success_displays_result() {
        let mut mock = MockApiClient::new();
        mock.expect_submit()
            .times(1)
            .returning(|_| Ok(Blob::new(vec![9u8, 9], "image/png")));
        let (mut upload, registry) = orchestrator(mock);

        upload.on_files_accepted(vec![photo()]).await;

        let view = upload.view();
        assert!(!view.working);
        assert_eq!(view.error, None);
        assert_eq!(view.display.as_ref(), upload.display());
        let shown = registry.resolve(view.display.as_ref().unwrap()).unwrap();
        assert_eq!(shown.data().as_ref(), &[9u8, 9]);
        // Staged input was released when the result replaced it
        assert_eq!(registry.created_count(), 2);
        assert_eq!(registry.live_count(), 1);
    }

    #[tokio::test]
    async fn failure_clears_display_and_records_error() {
        let mut mock = MockApiClient::new();
        mock.expect_submit()
            .times(1)
            .returning(|_| Err(ApiError::Network("connection refused".into())));
        let (mut upload, registry) = orchestrator(mock);

        upload.on_files_accepted(vec![photo()]).await;

        assert_eq!(
            upload.view(),
            UploadView {
                display: None,
                working: false,
                error: Some("network error: connection refused".into()),
            }
        );
        assert_eq!(upload.display(), None);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn only_first_file_is_submitted() {
        let mut mock = MockApiClient::new();
        mock.expect_submit()
            .withf(|file| file.name == "photo.png")
            .times(1)
            .returning(|_| Ok(Blob::new(vec![1u8], "image/png")));
        let (mut upload, _registry) = orchestrator(mock);

        let second = SourceFile::new("other.png", Blob::new(vec![4u8], "image/png"));
        upload.on_files_accepted(vec![photo(), second]).await;
        assert_eq!(upload.submissions(), 1);
        assert_eq!(upload.view().display.as_ref(), upload.display());
    }

    #[tokio::test]
    async fn empty_result_is_displayed() {
        let mut mock = MockApiClient::new();
        mock.expect_submit()
            .times(1)
            .returning(|_| Ok(Blob::new(Vec::new(), "image/png")));
        let (mut upload, registry) = orchestrator(mock);

        upload.on_files_accepted(vec![photo()]).await;

        let view = upload.view();
        assert!(!view.working);
        assert_eq!(view.error, None);
        assert_eq!(view.display.as_ref(), upload.display());
        let shown = registry.resolve(view.display.as_ref().unwrap()).unwrap();
        assert!(shown.is_empty());
        assert_eq!(registry.live_count(), 1);
    }

    #[tokio::test]
    async fn empty_input_after_success_replaces_display() {
        let mut mock = MockApiClient::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Blob::new(vec![6u8], "image/png")));
        mock.expect_submit()
            .withf(|file| file.name == "empty.png" && file.blob.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ApiError::status(400, "Invalid image")));
        let (mut upload, registry) = orchestrator(mock);

        upload.on_files_accepted(vec![photo()]).await;
        let before = upload.display().cloned().unwrap();

        let empty = SourceFile::new("empty.png", Blob::new(Vec::new(), "image/png"));
        upload.on_files_accepted(vec![empty]).await;

        let view = upload.view();
        assert_eq!(view.display.as_ref(), upload.display());
        assert_eq!(view.display, None);
        assert_eq!(view.error.as_deref(), Some("HTTP 400: Invalid image"));
        assert!(!view.working);
        assert!(registry.resolve(&before).is_none());
        assert_eq!(registry.live_count(), 0);
        assert_eq!(upload.submissions(), 2);
    }

    #[tokio::test]
    async fn next_attempt_clears_previous_error() {
        let mut mock = MockApiClient::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ApiError::status(400, "Invalid image")));
        mock.expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Blob::new(vec![5u8], "image/png")));
        let (mut upload, registry) = orchestrator(mock);

        upload.on_files_accepted(vec![photo()]).await;
        assert_eq!(upload.error(), Some("HTTP 400: Invalid image"));
        assert_eq!(upload.view().display.as_ref(), upload.display());

        upload.on_files_accepted(vec![photo()]).await;
        assert_eq!(upload.error(), None);
        assert!(upload.display().is_some());
        assert_eq!(upload.view().display.as_ref(), upload.display());
        assert_eq!(registry.live_count(), 1);
    }

    #[tokio::test]
    async fn drop_releases_displayed_result() {
        let mut mock = MockApiClient::new();
        mock.expect_submit()
            .returning(|_| Ok(Blob::new(vec![7u8], "image/png")));
        let (mut upload, registry) = orchestrator(mock);

        upload.on_files_accepted(vec![photo()]).await;
        assert_eq!(registry.live_count(), 1);
        assert_eq!(upload.view().display.as_ref(), upload.display());

        drop(upload);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.revoked_count(), registry.created_count());
    }
}
