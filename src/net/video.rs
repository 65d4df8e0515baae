//! Video resource client.

#[cfg(test)]
#[path = "video_test.rs"]
mod video_test;

use std::sync::Arc;

use tracing::warn;

use super::backend::Backend;
use super::types::{Page, Video, VideoId, VideoUpdateRequest};
use crate::error::ClientError;
use crate::state::session::Session;

#[derive(Clone)]
pub struct VideoClient {
    backend: Arc<dyn Backend>,
    session: Session,
}

impl VideoClient {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { backend: session.backend(), session }
    }

    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn get(&self, id: VideoId) -> Result<Video, ClientError> {
        self.backend.get_video(&self.session.auth_headers(), id).await
    }

    /// One page of the feed. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn list(&self, page: u32, size: u32) -> Result<Page<Video>, ClientError> {
        self.backend.list_videos(&self.session.auth_headers(), page, size).await
    }

    /// Update title, description and category.
    ///
    /// Only the owner of the video's channel may edit. The video is fetched
    /// first so the ownership check runs against current data.
    ///
    /// # Errors
    ///
    /// `LoginRequired` when anonymous, `NotOwner` when the identity's channel
    /// differs from the video's, otherwise backend failures.
    pub async fn update(&self, id: VideoId, request: &VideoUpdateRequest) -> Result<Video, ClientError> {
        let identity = self.session.require_identity("edit videos")?;
        let video = self.get(id).await?;
        let owner = video.channel_id();
        if owner.is_none() || owner != identity.channel_id() {
            warn!(video_id = id, user_id = identity.id, "edit refused: not the channel owner");
            return Err(ClientError::NotOwner { video_id: id });
        }
        self.backend.update_video(&self.session.auth_headers(), id, request).await
    }

    /// Toggle the caller's like. Returns the liked state after the toggle.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn toggle_like(&self, id: VideoId) -> Result<bool, ClientError> {
        self.backend.toggle_video_like(&self.session.auth_headers(), id).await
    }

    /// Public like counter; always sent without credentials.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn like_count(&self, id: VideoId) -> Result<u64, ClientError> {
        self.backend.video_like_count(id).await
    }

    /// Whether the caller liked the video. `false` without a request when anonymous.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn has_user_liked(&self, id: VideoId) -> Result<bool, ClientError> {
        let auth = self.session.auth_headers();
        if auth.is_anonymous() {
            return Ok(false);
        }
        self.backend.video_user_liked(&auth, id).await
    }

    #[must_use]
    pub fn stream_url(&self, id: VideoId) -> String {
        self.backend.stream_url(id)
    }
}
