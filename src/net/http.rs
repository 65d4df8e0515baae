//! `reqwest` implementation of [`Backend`].
//!
//! Thin HTTP wrapper over the `/api` endpoints. URL building and response
//! classification are pure functions so they can be tested without a socket.
//!
//! ERROR HANDLING
//! ==============
//! Send failures map to `Transport`, non-2xx answers to `Status` with the raw
//! body, and schema mismatches to `Parse`. Nothing is retried.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::backend::Backend;
use super::types::{
    AuthHeaders, ChannelId, Comment, CommentId, CommentRequest, Credentials, Identity, Page, TokenResponse, Video,
    VideoId, VideoUpdateRequest,
};
use crate::config::ClientConfig;
use crate::error::ClientError;

pub const EMAIL_HEADER: &str = "X-User-Email";
pub const PASSWORD_HEADER: &str = "X-User-Password";

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP backend bound to one API base URL (for example `http://localhost:8080/api`).
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    /// Same connect timeout, no total timeout: video bodies may take longer
    /// than any single API call.
    download: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend from typed config.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if a `reqwest` client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        let download = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, download, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stream `GET /videos/{id}/stream` to `dest`, returning the byte count.
    ///
    /// Only the connect timeout applies; the transfer itself is unbounded.
    ///
    /// # Errors
    ///
    /// Returns `Transport`/`Status` for HTTP failures and `Storage` if the
    /// destination file cannot be written.
    pub async fn download_stream(&self, auth: &AuthHeaders, id: VideoId, dest: &Path) -> Result<u64, ClientError> {
        let response = self.request_with(&self.download, Method::GET, &stream_path(id), auth).send().await?;
        let response = ensure_success(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0_u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written = written.saturating_add(chunk.len() as u64);
        }
        file.flush().await?;
        debug!(video_id = id, bytes = written, "stream download complete");
        Ok(written)
    }

    fn request(&self, method: Method, path: &str, auth: &AuthHeaders) -> RequestBuilder {
        self.request_with(&self.http, method, path, auth)
    }

    fn request_with(
        &self,
        client: &reqwest::Client,
        method: Method,
        path: &str,
        auth: &AuthHeaders,
    ) -> RequestBuilder {
        let url = endpoint(&self.base_url, path);
        debug!(%method, %url, anonymous = auth.is_anonymous(), "api request");
        apply_auth(client.request(method, url), auth)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = ensure_success(builder.send().await?).await?;
        let text = response.text().await?;
        parse_body(&text)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, auth: &AuthHeaders) -> Result<T, ClientError> {
        self.send_json(self.request(Method::GET, path, auth)).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        auth: &AuthHeaders,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send_json(self.request(Method::POST, path, auth).json(body)).await
    }

    async fn send_empty(&self, method: Method, path: &str, auth: &AuthHeaders) -> Result<(), ClientError> {
        let builder = self.request(method, path, auth);
        ensure_success(builder.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn register(&self, credentials: &Credentials) -> Result<Identity, ClientError> {
        self.post("/auth/register", &AuthHeaders::Anonymous, credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<Identity, ClientError> {
        self.post("/auth/login", &AuthHeaders::Anonymous, credentials).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<String, ClientError> {
        let builder = self.request(Method::POST, "/auth/signup", &AuthHeaders::Anonymous).json(credentials);
        let response = ensure_success(builder.send().await?).await?;
        Ok(response.text().await?)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<String, ClientError> {
        let body: TokenResponse = self.post("/auth/signin", &AuthHeaders::Anonymous, credentials).await?;
        Ok(body.token)
    }

    async fn list_videos(&self, auth: &AuthHeaders, page: u32, size: u32) -> Result<Page<Video>, ClientError> {
        self.get(&videos_page_path(page, size), auth).await
    }

    async fn get_video(&self, auth: &AuthHeaders, id: VideoId) -> Result<Video, ClientError> {
        self.get(&format!("/videos/{id}"), auth).await
    }

    fn stream_url(&self, id: VideoId) -> String {
        endpoint(&self.base_url, &stream_path(id))
    }

    async fn update_video(
        &self,
        auth: &AuthHeaders,
        id: VideoId,
        request: &VideoUpdateRequest,
    ) -> Result<Video, ClientError> {
        let builder = self.request(Method::PATCH, &format!("/videos/{id}"), auth).json(request);
        self.send_json(builder).await
    }

    async fn toggle_video_like(&self, auth: &AuthHeaders, id: VideoId) -> Result<bool, ClientError> {
        self.post(&format!("/videos/{id}/like"), auth, &serde_json::json!({})).await
    }

    async fn video_like_count(&self, id: VideoId) -> Result<u64, ClientError> {
        self.get(&format!("/videos/{id}/like-count"), &AuthHeaders::Anonymous).await
    }

    async fn video_user_liked(&self, auth: &AuthHeaders, id: VideoId) -> Result<bool, ClientError> {
        self.get(&format!("/videos/{id}/user-liked"), auth).await
    }

    async fn list_comments(&self, auth: &AuthHeaders, video_id: VideoId) -> Result<Vec<Comment>, ClientError> {
        self.get(&format!("/comments/video/{video_id}"), auth).await
    }

    async fn add_comment(
        &self,
        auth: &AuthHeaders,
        video_id: VideoId,
        request: &CommentRequest,
    ) -> Result<Comment, ClientError> {
        self.post(&format!("/comments/video/{video_id}"), auth, request).await
    }

    async fn list_replies(&self, auth: &AuthHeaders, comment_id: CommentId) -> Result<Vec<Comment>, ClientError> {
        self.get(&format!("/comments/{comment_id}/replies"), auth).await
    }

    async fn toggle_comment_like(&self, auth: &AuthHeaders, id: CommentId) -> Result<bool, ClientError> {
        self.post(&format!("/comments/{id}/like"), auth, &serde_json::json!({})).await
    }

    async fn comment_like_count(&self, id: CommentId) -> Result<u64, ClientError> {
        self.get(&format!("/comments/{id}/like-count"), &AuthHeaders::Anonymous).await
    }

    async fn comment_user_liked(&self, auth: &AuthHeaders, id: CommentId) -> Result<bool, ClientError> {
        self.get(&format!("/comments/{id}/user-liked"), auth).await
    }

    async fn subscribe(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<(), ClientError> {
        self.send_empty(Method::POST, &format!("/channels/{channel_id}/subscribe"), auth).await
    }

    async fn unsubscribe(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<(), ClientError> {
        self.send_empty(Method::DELETE, &format!("/channels/{channel_id}/unsubscribe"), auth).await
    }

    async fn is_subscribed(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<bool, ClientError> {
        self.get(&format!("/channels/{channel_id}/is-subscribed"), auth).await
    }

    async fn subscriber_count(&self, channel_id: ChannelId) -> Result<u64, ClientError> {
        self.get(&format!("/channels/{channel_id}/subscriber-count"), &AuthHeaders::Anonymous).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn videos_page_path(page: u32, size: u32) -> String {
    format!("/videos?page={page}&size={size}")
}

fn stream_path(id: VideoId) -> String {
    format!("/videos/{id}/stream")
}

fn apply_auth(builder: RequestBuilder, auth: &AuthHeaders) -> RequestBuilder {
    match auth {
        AuthHeaders::Anonymous => builder,
        AuthHeaders::UserPassword { email, password } => {
            builder.header(EMAIL_HEADER, email).header(PASSWORD_HEADER, password)
        }
        AuthHeaders::Bearer(token) => builder.bearer_auth(token),
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), body))
}

fn status_error(status: u16, body: String) -> ClientError {
    ClientError::Status { status, body }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ClientError> {
    serde_json::from_str(text).map_err(|e| ClientError::Parse(e.to_string()))
}
