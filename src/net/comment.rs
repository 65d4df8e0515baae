//! Comment resource client.

#[cfg(test)]
#[path = "comment_test.rs"]
mod comment_test;

use std::sync::Arc;

use super::backend::Backend;
use super::types::{Comment, CommentId, CommentRequest, VideoId};
use crate::error::ClientError;
use crate::state::session::Session;

#[derive(Clone)]
pub struct CommentClient {
    backend: Arc<dyn Backend>,
    session: Session,
}

impl CommentClient {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { backend: session.backend(), session }
    }

    /// Post a comment on `video_id`, or a reply when `parent` is set.
    ///
    /// Replies still go through the root video's endpoint.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn add(
        &self,
        video_id: VideoId,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Comment, ClientError> {
        let request = CommentRequest { content: content.to_owned(), parent_comment_id: parent };
        self.backend.add_comment(&self.session.auth_headers(), video_id, &request).await
    }

    /// Top-level comments of a video.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn list_for_video(&self, video_id: VideoId) -> Result<Vec<Comment>, ClientError> {
        self.backend.list_comments(&self.session.auth_headers(), video_id).await
    }

    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn replies(&self, comment_id: CommentId) -> Result<Vec<Comment>, ClientError> {
        self.backend.list_replies(&self.session.auth_headers(), comment_id).await
    }

    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn toggle_like(&self, id: CommentId) -> Result<bool, ClientError> {
        self.backend.toggle_comment_like(&self.session.auth_headers(), id).await
    }

    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn like_count(&self, id: CommentId) -> Result<u64, ClientError> {
        self.backend.comment_like_count(id).await
    }

    /// `false` without a request when anonymous.
    ///
    /// # Errors
    ///
    /// Backend failures propagate unchanged.
    pub async fn has_user_liked(&self, id: CommentId) -> Result<bool, ClientError> {
        let auth = self.session.auth_headers();
        if auth.is_anonymous() {
            return Ok(false);
        }
        self.backend.comment_user_liked(&auth, id).await
    }

    /// The session these calls authenticate with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}
