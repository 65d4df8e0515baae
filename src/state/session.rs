//! Auth-session store for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `Session` is built by the entry point and cloned into every resource
//! client and view. It owns the identity slot, persists credentials to the
//! key-value store, and broadcasts identity changes over a `watch` channel
//! so views can re-run identity-aware fetches.
//!
//! TRADE-OFFS
//! ==========
//! The password is persisted in plaintext because the backend's header
//! convention re-sends it on every request. The token variant lives in
//! [`super::token_session`].

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::store::{KeyValueStore, load_json, save_json};
use super::token_session::TOKEN_KEY;
use crate::error::ClientError;
use crate::net::backend::Backend;
use crate::net::types::{AuthHeaders, Credentials, Identity};

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const PASSWORD_KEY: &str = "password";

/// Shared handle to the authenticated-user slot.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    backend: Arc<dyn Backend>,
    store: Arc<dyn KeyValueStore>,
    identity: watch::Sender<Option<Identity>>,
}

impl Session {
    /// Build a session, rehydrating any identity left in `store`.
    pub fn restore(backend: Arc<dyn Backend>, store: Arc<dyn KeyValueStore>) -> Self {
        let stored = load_json::<Identity>(store.as_ref(), CURRENT_USER_KEY);
        if let Some(identity) = &stored {
            info!(user_id = identity.id, "restored session");
        }
        let (identity, _) = watch::channel(stored);
        Self { inner: Arc::new(SessionInner { backend, store, identity }) }
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.inner.backend)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged; nothing is persisted on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ClientError> {
        let credentials = Credentials { email: email.to_owned(), password: password.to_owned() };
        match self.inner.backend.login(&credentials).await {
            Ok(identity) => self.establish(identity, password),
            Err(e) => {
                warn!(operation = "login", error = %e, "auth request failed");
                Err(e)
            }
        }
    }

    /// Register a new account and log straight into it.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged; nothing is persisted on failure.
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, ClientError> {
        let credentials = Credentials { email: email.to_owned(), password: password.to_owned() };
        match self.inner.backend.register(&credentials).await {
            Ok(identity) => self.establish(identity, password),
            Err(e) => {
                warn!(operation = "register", error = %e, "auth request failed");
                Err(e)
            }
        }
    }

    /// Clear persisted credentials (bearer token included) and emit `None`.
    ///
    /// # Errors
    ///
    /// Returns the first `Storage` error if any key cannot be removed. The
    /// remaining keys and the in-memory identity are cleared regardless.
    pub fn logout(&self) -> Result<(), ClientError> {
        // Every key is attempted; the first failure is reported.
        let mut cleared = Ok(());
        for key in [CURRENT_USER_KEY, PASSWORD_KEY, TOKEN_KEY] {
            if let Err(e) = self.inner.store.remove(key) {
                warn!(key, error = %e, "failed to clear stored credential");
                if cleared.is_ok() {
                    cleared = Err(e);
                }
            }
        }
        self.inner.identity.send_replace(None);
        info!("logged out");
        cleared
    }

    /// Snapshot of the current identity.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.identity.borrow().clone()
    }

    /// Stream of identity changes, starting at the current value.
    #[must_use]
    pub fn identity(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.identity.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.identity.borrow().is_some()
    }

    /// Derived authentication stream.
    #[must_use]
    pub fn authenticated(&self) -> AuthWatch {
        AuthWatch { rx: self.identity() }
    }

    /// Current identity, or `LoginRequired` naming the attempted action.
    ///
    /// # Errors
    ///
    /// Returns `LoginRequired` when no identity is set.
    pub fn require_identity(&self, action: &'static str) -> Result<Identity, ClientError> {
        self.current_identity().ok_or(ClientError::LoginRequired { action })
    }

    /// Request credentials for the stored identity. Anonymous when either the
    /// identity or the stored password is missing.
    #[must_use]
    pub fn auth_headers(&self) -> AuthHeaders {
        let Some(identity) = self.current_identity() else {
            return AuthHeaders::Anonymous;
        };
        match self.inner.store.get(PASSWORD_KEY) {
            Some(password) => AuthHeaders::UserPassword { email: identity.email, password },
            None => AuthHeaders::Anonymous,
        }
    }

    fn establish(&self, identity: Identity, password: &str) -> Result<Identity, ClientError> {
        save_json(self.inner.store.as_ref(), CURRENT_USER_KEY, &identity)?;
        self.inner.store.set(PASSWORD_KEY, password)?;
        info!(user_id = identity.id, email = %identity.email, "session established");
        self.inner.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }
}

/// Boolean view over the identity stream.
pub struct AuthWatch {
    rx: watch::Receiver<Option<Identity>>,
}

impl AuthWatch {
    #[must_use]
    pub fn get(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the next identity change and return the new flag.
    ///
    /// # Errors
    ///
    /// Returns `ViewClosed` once the owning session is gone.
    pub async fn changed(&mut self) -> Result<bool, ClientError> {
        self.rx.changed().await.map_err(|_| ClientError::ViewClosed)?;
        Ok(self.rx.borrow_and_update().is_some())
    }
}
