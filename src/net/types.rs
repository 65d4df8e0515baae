//! Wire DTOs for the video-sharing REST API.
//!
//! DESIGN
//! ======
//! Field names mirror the backend's camelCase JSON so serde round-trips stay
//! lossless. Counters and flags the backend may omit default to zero/false
//! instead of failing the whole payload.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type UserId = i64;
pub type VideoId = i64;
pub type CommentId = i64;
pub type ChannelId = i64;

// =============================================================================
// IDENTITY
// =============================================================================

/// The authenticated user record, as returned by `/auth/login` and `/auth/register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique user identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Creation timestamp as sent by the backend (ISO 8601, usually without offset).
    pub created_at: String,
    /// Channel owned by this user, if one was created.
    #[serde(rename = "youtubeChannel", default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<OwnedChannel>,
}

impl Identity {
    /// Channel id owned by this identity, if any.
    #[must_use]
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(|c| c.id)
    }
}

/// Full channel record attached to an identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedChannel {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Short channel reference embedded in videos and comment authors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

// =============================================================================
// VIDEO
// =============================================================================

/// Immutable video snapshot fetched per view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub created_at: String,
    #[serde(default)]
    pub view_count: u64,
    /// Raw thumbnail bytes. Sent as base64 text by the backend; a JSON array
    /// of byte values is also accepted.
    #[serde(
        default,
        deserialize_with = "deserialize_thumbnail",
        serialize_with = "serialize_thumbnail",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail_data: Option<Vec<u8>>,
    /// Publishing channel, if known.
    #[serde(rename = "youtubeChannel", default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelRef>,
}

impl Video {
    /// Id of the publishing channel, if any.
    #[must_use]
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(|c| c.id)
    }
}

/// Editable video metadata sent with `PATCH /videos/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoUpdateRequest {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Spring-style pagination envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub size: u32,
    /// Zero-based page number.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub first: bool,
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

// =============================================================================
// COMMENTS
// =============================================================================

/// A comment or reply. `parent_comment_id == None` marks a top-level comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub created_at: String,
    /// Author of the comment, if the backend included it.
    #[serde(rename = "userProfile", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<CommentAuthor>,
    #[serde(default)]
    pub parent_comment_id: Option<CommentId>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub user_liked: bool,
    /// Nested replies when the backend chose to embed them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<Comment>>,
    #[serde(default)]
    pub reply_count: u64,
}

impl Comment {
    /// Display name for the author: channel name, then email, then a placeholder.
    #[must_use]
    pub fn author_label(&self) -> &str {
        match &self.author {
            Some(CommentAuthor { channel: Some(channel), .. }) => &channel.name,
            Some(author) => &author.email,
            None => "unknown",
        }
    }
}

/// Simplified author info embedded in a comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: UserId,
    pub email: String,
    #[serde(rename = "youtubeChannel", default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelRef>,
}

/// Body of `POST /comments/video/{videoId}`; a set parent makes it a reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    pub parent_comment_id: Option<CommentId>,
}

// =============================================================================
// AUTH
// =============================================================================

/// Email/password pair posted to the auth endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Response of `POST /auth/signin`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Credentials attached to an outgoing request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthHeaders {
    /// No credentials; the backend treats the caller as a guest.
    #[default]
    Anonymous,
    /// `X-User-Email` / `X-User-Password` header pair.
    UserPassword { email: String, password: String },
    /// `Authorization: Bearer <token>`.
    Bearer(String),
}

impl AuthHeaders {
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

// =============================================================================
// THUMBNAIL CODEC
// =============================================================================

fn deserialize_thumbnail<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(text)) => BASE64
            .decode(text.as_bytes())
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid base64 thumbnail: {e}"))),
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| D::Error::custom("thumbnail array must hold bytes"))
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Some),
        Some(_) => Err(D::Error::custom("expected base64 string or byte array")),
    }
}

#[allow(clippy::ref_option)]
fn serialize_thumbnail<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
        None => serializer.serialize_none(),
    }
}
