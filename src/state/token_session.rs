//! Bearer-token session for the JWT sign-in flow.
//!
//! Keeps a single token under the `token` store key and a logged-in flag on a
//! `watch` channel. Unlike [`super::session::Session`] it holds no identity
//! record; the backend resolves the user from the token on every request.

#[cfg(test)]
#[path = "token_session_test.rs"]
mod token_session_test;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::store::KeyValueStore;
use crate::error::ClientError;
use crate::net::backend::Backend;
use crate::net::types::{AuthHeaders, Credentials};

pub const TOKEN_KEY: &str = "token";

#[derive(Clone)]
pub struct TokenSession {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    backend: Arc<dyn Backend>,
    store: Arc<dyn KeyValueStore>,
    logged_in: watch::Sender<bool>,
}

impl TokenSession {
    pub fn restore(backend: Arc<dyn Backend>, store: Arc<dyn KeyValueStore>) -> Self {
        let present = store.get(TOKEN_KEY).is_some();
        let (logged_in, _) = watch::channel(present);
        Self { inner: Arc::new(TokenInner { backend, store, logged_in }) }
    }

    /// Create an account. Returns the backend's confirmation text.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let credentials = Credentials { email: email.to_owned(), password: password.to_owned() };
        self.inner.backend.sign_up(&credentials).await.inspect_err(|e| {
            warn!(operation = "sign_up", error = %e, "auth request failed");
        })
    }

    /// Exchange credentials for a token and persist it.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged; `Storage` if the token cannot be saved.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let credentials = Credentials { email: email.to_owned(), password: password.to_owned() };
        let token = self.inner.backend.sign_in(&credentials).await.inspect_err(|e| {
            warn!(operation = "sign_in", error = %e, "auth request failed");
        })?;
        self.inner.store.set(TOKEN_KEY, &token)?;
        self.inner.logged_in.send_replace(true);
        info!(email, "token session established");
        Ok(())
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.store.get(TOKEN_KEY)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    #[must_use]
    pub fn logged_in(&self) -> watch::Receiver<bool> {
        self.inner.logged_in.subscribe()
    }

    /// Drop the stored token and emit `false`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the token cannot be removed. The flag flips regardless.
    pub fn logout(&self) -> Result<(), ClientError> {
        let removed = self.inner.store.remove(TOKEN_KEY);
        self.inner.logged_in.send_replace(false);
        info!("token session cleared");
        removed
    }

    #[must_use]
    pub fn auth_headers(&self) -> AuthHeaders {
        self.token().map_or(AuthHeaders::Anonymous, AuthHeaders::Bearer)
    }
}
