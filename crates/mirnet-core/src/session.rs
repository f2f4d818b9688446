//! Authentication status tracking
//!
//! `Unknown -> Checking -> {Authenticated, Unauthenticated}`. Whenever the
//! status is `Unknown` the machine moves to `Checking` in the same call and
//! spawns one `/me` request. `invalidate()` forces `Unknown` again.
//!
//! Requests are never cancelled: if `invalidate()` runs while a check is in
//! flight, a second check is armed and whichever resolves last wins.

use mirnet_api::{ApiClient, ApiError, MeResponse};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

/// Capacity of the transition feed; slow subscribers see `Lagged`
const TRANSITION_CAPACITY: usize = 64;

/// Authentication status
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No check performed yet
    #[default]
    Unknown,
    /// Session check in flight
    Checking,
    /// No valid session
    Unauthenticated,
    /// Valid session for `login`
    Authenticated {
        /// Login name
        login: String,
    },
}

impl SessionStatus {
    /// Whether a check has resolved into a stable status
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Authenticated { .. })
    }

    /// Whether the session is authenticated
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Login name, when authenticated
    #[inline]
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        match self {
            Self::Authenticated { login } => Some(login),
            _ => None,
        }
    }

    fn from_check(outcome: Result<MeResponse, ApiError>) -> Self {
        match outcome {
            Ok(MeResponse {
                session: Some(session),
            }) => Self::Authenticated {
                login: session.login,
            },
            Ok(MeResponse { session: None }) => Self::Unauthenticated,
            Err(err) => {
                error!(error = %err, "session check failed");
                Self::Unauthenticated
            }
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Checking => f.write_str("checking"),
            Self::Unauthenticated => f.write_str("not authenticated"),
            Self::Authenticated { login } => write!(f, "authenticated as {login}"),
        }
    }
}

struct Shared {
    api: Arc<dyn ApiClient>,
    status: Mutex<SessionStatus>,
    latest: watch::Sender<SessionStatus>,
    feed: broadcast::Sender<SessionStatus>,
    checks_issued: AtomicU64,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("status", &*self.status.lock())
            .field("checks_issued", &self.checks_issued.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// Record and publish a transition. Caller holds the status lock.
    fn publish(&self, status: &mut SessionStatus, next: SessionStatus) {
        debug!(from = %status, to = %next, "session transition");
        *status = next.clone();
        self.latest.send_replace(next.clone());
        // No subscribers is fine
        let _ = self.feed.send(next);
    }

    fn apply_check(&self, next: SessionStatus) {
        let mut status = self.status.lock();
        if *status != SessionStatus::Checking {
            let current = status.to_string();
            debug!(%current, "applying late session check result");
        }
        match &next {
            SessionStatus::Authenticated { login } => info!(%login, "session authenticated"),
            _ => info!("no session"),
        }
        self.publish(&mut status, next);
    }
}

/// Session status machine.
///
/// Clones share state; hand one to anything that needs to invalidate.
/// Arming a check spawns a tokio task, so arming must happen inside a tokio
/// runtime.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    shared: Arc<Shared>,
}

impl SessionStateMachine {
    /// Create a machine in `Unknown`; nothing is requested until [`mount`](Self::mount)
    #[must_use]
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        let (latest, _) = watch::channel(SessionStatus::Unknown);
        let (feed, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                api,
                status: Mutex::new(SessionStatus::Unknown),
                latest,
                feed,
                checks_issued: AtomicU64::new(0),
            }),
        }
    }

    /// Start tracking: arms the first check if the status is `Unknown`
    pub fn mount(&self) {
        self.arm();
    }

    /// Force `Unknown` and re-arm the check
    pub fn invalidate(&self) {
        {
            let mut status = self.shared.status.lock();
            self.shared.publish(&mut status, SessionStatus::Unknown);
        }
        self.arm();
    }

    /// End the session, then invalidate whatever the outcome
    pub async fn logout(&self) {
        if let Err(err) = self.shared.api.logout().await {
            warn!(error = %err, "logout request failed; invalidating anyway");
        }
        self.invalidate();
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.shared.status.lock().clone()
    }

    /// Latest-value subscription
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.latest.subscribe()
    }

    /// Every transition, in order, from now on
    #[must_use]
    pub fn transitions(&self) -> broadcast::Receiver<SessionStatus> {
        self.shared.feed.subscribe()
    }

    /// Wait until the status is settled and return it.
    ///
    /// Returns immediately if it already is.
    pub async fn settled(&self) -> SessionStatus {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(SessionStatus::is_settled).await.map(|s| s.clone());
        // The sender lives in `self`, so the channel cannot close here
        settled.unwrap_or_else(|_| self.status())
    }

    /// Number of `/me` requests issued so far
    #[inline]
    #[must_use]
    pub fn checks_issued(&self) -> u64 {
        self.shared.checks_issued.load(Ordering::Relaxed)
    }

    /// Move `Unknown -> Checking` and spawn the check. No-op in any other status.
    fn arm(&self) {
        {
            let mut status = self.shared.status.lock();
            if *status != SessionStatus::Unknown {
                return;
            }
            self.shared.publish(&mut status, SessionStatus::Checking);
        }

        self.shared.checks_issued.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = shared.api.get_me().await;
            shared.apply_check(SessionStatus::from_check(outcome));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirnet_api::MockApiClient;
    use pretty_assertions::assert_eq;

    fn machine_with(mock: MockApiClient) -> SessionStateMachine {
        SessionStateMachine::new(Arc::new(mock))
    }

    #[test]
    fn status_helpers() {
        let authed = SessionStatus::Authenticated {
            login: "alice".into(),
        };
        assert!(authed.is_settled());
        assert!(authed.is_authenticated());
        assert_eq!(authed.login(), Some("alice"));

        assert!(SessionStatus::Unauthenticated.is_settled());
        assert!(!SessionStatus::Checking.is_settled());
        assert!(!SessionStatus::Unknown.is_settled());
        assert_eq!(SessionStatus::Unknown.login(), None);
    }

    #[test]
    fn check_outcome_mapping() {
        assert_eq!(
            SessionStatus::from_check(Ok(MeResponse::authenticated("bob"))),
            SessionStatus::Authenticated { login: "bob".into() }
        );
        assert_eq!(
            SessionStatus::from_check(Ok(MeResponse::anonymous())),
            SessionStatus::Unauthenticated
        );
        assert_eq!(
            SessionStatus::from_check(Err(ApiError::Decode("bad json".into()))),
            SessionStatus::Unauthenticated
        );
    }

    #[test]
    fn starts_unknown_without_request() {
        let mut mock = MockApiClient::new();
        mock.expect_get_me().never();
        let machine = machine_with(mock);
        assert_eq!(machine.status(), SessionStatus::Unknown);
        assert_eq!(machine.checks_issued(), 0);
    }

    #[tokio::test]
    async fn mount_checks_once() {
        let mut mock = MockApiClient::new();
        mock.expect_get_me()
            .times(1)
            .returning(|| Ok(MeResponse::authenticated("alice")));
        let machine = machine_with(mock);

        machine.mount();
        assert_eq!(machine.status(), SessionStatus::Checking);

        // Re-mounting while checking does not arm another request
        machine.mount();
        assert_eq!(machine.checks_issued(), 1);

        assert_eq!(
            machine.settled().await,
            SessionStatus::Authenticated { login: "alice".into() }
        );
    }

    #[tokio::test]
    async fn failed_check_is_unauthenticated() {
        let mut mock = MockApiClient::new();
        mock.expect_get_me()
            .times(1)
            .returning(|| Err(ApiError::Network("connection refused".into())));
        let machine = machine_with(mock);

        machine.mount();
        assert_eq!(machine.settled().await, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn logout_failure_still_invalidates() {
        let mut mock = MockApiClient::new();
        mock.expect_get_me()
            .times(2)
            .returning(|| Ok(MeResponse::anonymous()));
        mock.expect_logout()
            .times(1)
            .returning(|| Err(ApiError::status(500, "boom")));
        let machine = machine_with(mock);

        machine.mount();
        machine.settled().await;

        machine.logout().await;
        assert_eq!(machine.status(), SessionStatus::Checking);
        assert_eq!(machine.settled().await, SessionStatus::Unauthenticated);
        assert_eq!(machine.checks_issued(), 2);
    }
}
