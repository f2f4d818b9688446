//! Testing utilities for mirnet workspace
//!
//! [`ScriptedApi`] answers each endpoint from a queue of scripted replies.
//! A reply is either ready immediately or deferred until the test sends it,
//! which lets tests observe the client while a request is in flight.

#![allow(missing_docs)]

use async_trait::async_trait;
use mirnet_api::{ApiClient, ApiError, Blob, Credentials, LoginResponse, MeResponse, SourceFile};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;

pub type Reply<T> = Result<T, ApiError>;

/// Sender for a deferred reply
pub type Responder<T> = oneshot::Sender<Reply<T>>;

enum Scripted<T> {
    Ready(Reply<T>),
    Deferred(oneshot::Receiver<Reply<T>>),
}

struct Script<T> {
    queue: Mutex<VecDeque<Scripted<T>>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Script<T> {
    fn push(&self, reply: Reply<T>) {
        self.queue.lock().push_back(Scripted::Ready(reply));
    }

    fn defer(&self) -> Responder<T> {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().push_back(Scripted::Deferred(rx));
        tx
    }

    async fn next(&self) -> Reply<T> {
        let scripted = self.queue.lock().pop_front();
        match scripted {
            None => Err(ApiError::Network("no scripted response".into())),
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Network("deferred response dropped".into()))),
        }
    }
}

#[derive(Default)]
struct Calls {
    submitted: Vec<String>,
    logins: Vec<Credentials>,
    registrations: Vec<Credentials>,
    logouts: usize,
    me: usize,
}

/// Scripted [`ApiClient`]
#[derive(Default)]
pub struct ScriptedApi {
    submit: Script<Blob>,
    login: Script<LoginResponse>,
    register: Script<LoginResponse>,
    logout: Script<()>,
    me: Script<MeResponse>,
    calls: Mutex<Calls>,
}

impl std::fmt::Debug for ScriptedApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedApi").finish_non_exhaustive()
    }
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_submit(&self, reply: Reply<Blob>) -> &Self {
        self.submit.push(reply);
        self
    }

    pub fn defer_submit(&self) -> Responder<Blob> {
        self.submit.defer()
    }

    pub fn push_login(&self, reply: Reply<LoginResponse>) -> &Self {
        self.login.push(reply);
        self
    }

    pub fn push_register(&self, reply: Reply<LoginResponse>) -> &Self {
        self.register.push(reply);
        self
    }

    pub fn push_logout(&self, reply: Reply<()>) -> &Self {
        self.logout.push(reply);
        self
    }

    pub fn push_me(&self, reply: Reply<MeResponse>) -> &Self {
        self.me.push(reply);
        self
    }

    pub fn defer_me(&self) -> Responder<MeResponse> {
        self.me.defer()
    }

    /// Names of submitted files, in order
    pub fn submitted(&self) -> Vec<String> {
        self.calls.lock().submitted.clone()
    }

    pub fn logins(&self) -> Vec<Credentials> {
        self.calls.lock().logins.clone()
    }

    pub fn registrations(&self) -> Vec<Credentials> {
        self.calls.lock().registrations.clone()
    }

    pub fn logout_calls(&self) -> usize {
        self.calls.lock().logouts
    }

    pub fn me_calls(&self) -> usize {
        self.calls.lock().me
    }
}

#[async_trait]
impl ApiClient for ScriptedApi {
    async fn submit(&self, file: &SourceFile) -> Result<Blob, ApiError> {
        self.calls.lock().submitted.push(file.name.clone());
        self.submit.next().await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.calls.lock().logins.push(credentials.clone());
        self.login.next().await
    }

    async fn register(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.calls.lock().registrations.push(credentials.clone());
        self.register.next().await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.calls.lock().logouts += 1;
        self.logout.next().await
    }

    async fn get_me(&self) -> Result<MeResponse, ApiError> {
        self.calls.lock().me += 1;
        self.me.next().await
    }
}

/// Small PNG-typed input file named `photo.png`
pub fn photo_png() -> SourceFile {
    SourceFile::new(
        "photo.png",
        Blob::new(vec![0x89u8, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], "image/png"),
    )
}

/// Distinct result blob
pub fn result_blob() -> Blob {
    Blob::new(vec![0x89u8, b'P', b'N', b'G', 0xAA, 0xBB], "image/png")
}
