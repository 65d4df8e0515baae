//! Client error type shared by every layer.
//!
//! ERROR HANDLING
//! ==============
//! Backend failures are carried as-is (`Transport`, `Status`, `Parse`) so the
//! caller decides how to surface them. Guard failures (`LoginRequired`,
//! `EmptyContent`, `OwnChannel`, ...) are raised before any request leaves the
//! process.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::net::types::{CommentId, VideoId};

/// Errors produced by sessions, resource clients and view state.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The action needs an authenticated session.
    #[error("please log in to {action}")]
    LoginRequired { action: &'static str },

    /// Comment or reply text was blank.
    #[error("comment cannot be empty")]
    EmptyContent,

    /// The identity owns the channel it tried to subscribe to.
    #[error("you cannot subscribe to your own channel")]
    OwnChannel,

    /// The video has no publishing channel.
    #[error("video has no channel")]
    NoChannel,

    /// The identity does not own the video it tried to edit.
    #[error("you do not have permission to edit video {video_id}")]
    NotOwner { video_id: VideoId },

    /// No node in the comment tree carries this comment id.
    #[error("comment {0} is not displayed")]
    UnknownComment(CommentId),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected schema.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The persisted key-value store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The view driver has shut down.
    #[error("view is closed")]
    ViewClosed,
}

impl ClientError {
    /// True when the error was raised by a client-side auth guard.
    #[must_use]
    pub fn is_login_required(&self) -> bool {
        matches!(self, Self::LoginRequired { .. })
    }

    /// HTTP status carried by the error, if the backend produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Transport(format!("request timed out: {e}"));
        }
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
