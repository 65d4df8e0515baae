//! Backend seam between resource clients and the transport.
//!
//! DESIGN
//! ======
//! One async trait covers every REST endpoint the client consumes. The
//! production implementation is [`super::http::HttpBackend`]; tests swap in
//! an in-memory fake so state logic runs without a server.

use async_trait::async_trait;

use super::types::{
    AuthHeaders, ChannelId, Comment, CommentId, CommentRequest, Credentials, Identity, Page, Video, VideoId,
    VideoUpdateRequest,
};
use crate::error::ClientError;

/// Request/response operations exposed by the video-sharing backend.
///
/// Methods taking `auth` forward it as request credentials. Public counters
/// take no credentials at all.
#[async_trait]
pub trait Backend: Send + Sync {
    // --- auth --------------------------------------------------------------

    /// `POST /auth/register`.
    async fn register(&self, credentials: &Credentials) -> Result<Identity, ClientError>;

    /// `POST /auth/login`.
    async fn login(&self, credentials: &Credentials) -> Result<Identity, ClientError>;

    /// `POST /auth/signup` (token variant). Returns the plain-text body.
    async fn sign_up(&self, credentials: &Credentials) -> Result<String, ClientError>;

    /// `POST /auth/signin` (token variant). Returns the issued token.
    async fn sign_in(&self, credentials: &Credentials) -> Result<String, ClientError>;

    // --- videos ------------------------------------------------------------

    /// `GET /videos?page=&size=`.
    async fn list_videos(&self, auth: &AuthHeaders, page: u32, size: u32) -> Result<Page<Video>, ClientError>;

    /// `GET /videos/{id}`.
    async fn get_video(&self, auth: &AuthHeaders, id: VideoId) -> Result<Video, ClientError>;

    /// Absolute playback URL of `GET /videos/{id}/stream`.
    fn stream_url(&self, id: VideoId) -> String;

    /// `PATCH /videos/{id}`.
    async fn update_video(
        &self,
        auth: &AuthHeaders,
        id: VideoId,
        request: &VideoUpdateRequest,
    ) -> Result<Video, ClientError>;

    /// `POST /videos/{id}/like`. Returns the liked state after the toggle.
    async fn toggle_video_like(&self, auth: &AuthHeaders, id: VideoId) -> Result<bool, ClientError>;

    /// `GET /videos/{id}/like-count`.
    async fn video_like_count(&self, id: VideoId) -> Result<u64, ClientError>;

    /// `GET /videos/{id}/user-liked`.
    async fn video_user_liked(&self, auth: &AuthHeaders, id: VideoId) -> Result<bool, ClientError>;

    // --- comments ----------------------------------------------------------

    /// `GET /comments/video/{id}`. Top-level comments only.
    async fn list_comments(&self, auth: &AuthHeaders, video_id: VideoId) -> Result<Vec<Comment>, ClientError>;

    /// `POST /comments/video/{id}`. Creates a comment, or a reply when the
    /// request carries a parent.
    async fn add_comment(
        &self,
        auth: &AuthHeaders,
        video_id: VideoId,
        request: &CommentRequest,
    ) -> Result<Comment, ClientError>;

    /// `GET /comments/{id}/replies`.
    async fn list_replies(&self, auth: &AuthHeaders, comment_id: CommentId) -> Result<Vec<Comment>, ClientError>;

    /// `POST /comments/{id}/like`. Returns the liked state after the toggle.
    async fn toggle_comment_like(&self, auth: &AuthHeaders, id: CommentId) -> Result<bool, ClientError>;

    /// `GET /comments/{id}/like-count`.
    async fn comment_like_count(&self, id: CommentId) -> Result<u64, ClientError>;

    /// `GET /comments/{id}/user-liked`.
    async fn comment_user_liked(&self, auth: &AuthHeaders, id: CommentId) -> Result<bool, ClientError>;

    // --- channels ----------------------------------------------------------

    /// `POST /channels/{id}/subscribe`.
    async fn subscribe(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<(), ClientError>;

    /// `DELETE /channels/{id}/unsubscribe`.
    async fn unsubscribe(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<(), ClientError>;

    /// `GET /channels/{id}/is-subscribed`.
    async fn is_subscribed(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<bool, ClientError>;

    /// `GET /channels/{id}/subscriber-count`.
    async fn subscriber_count(&self, channel_id: ChannelId) -> Result<u64, ClientError>;
}
