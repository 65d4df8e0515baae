//! Channel subscription client.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use std::sync::Arc;

use super::backend::Backend;
use super::types::ChannelId;
use crate::error::ClientError;
use crate::state::session::Session;

#[derive(Clone)]
pub struct ChannelClient {
    backend: Arc<dyn Backend>,
    session: Session,
}

impl ChannelClient {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { backend: session.backend(), session }
    }

    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn subscribe(&self, id: ChannelId) -> Result<(), ClientError> {
        self.backend.subscribe(&self.session.auth_headers(), id).await
    }

    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn unsubscribe(&self, id: ChannelId) -> Result<(), ClientError> {
        self.backend.unsubscribe(&self.session.auth_headers(), id).await
    }

    /// `false` without a request when anonymous.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn is_subscribed(&self, id: ChannelId) -> Result<bool, ClientError> {
        let auth = self.session.auth_headers();
        if auth.is_anonymous() {
            return Ok(false);
        }
        self.backend.is_subscribed(&auth, id).await
    }

    /// Public subscriber counter; always sent without credentials.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn subscriber_count(&self, id: ChannelId) -> Result<u64, ClientError> {
        self.backend.subscriber_count(id).await
    }
}
