//! Network layer: wire types, the backend seam and per-resource clients.
//!
//! Resource clients are stateless wrappers that attach the session's auth
//! headers to each call. Nothing is cached; every call reaches the backend.

pub mod backend;
pub mod channel;
pub mod comment;
pub mod http;
pub mod types;
pub mod video;

use crate::state::session::Session;

pub use channel::ChannelClient;
pub use comment::CommentClient;
pub use video::VideoClient;

/// The three resource clients, built over one session.
#[derive(Clone)]
pub struct Clients {
    pub videos: VideoClient,
    pub comments: CommentClient,
    pub channels: ChannelClient,
}

impl Clients {
    #[must_use]
    pub fn new(session: &Session) -> Self {
        Self {
            videos: VideoClient::new(session.clone()),
            comments: CommentClient::new(session.clone()),
            channels: ChannelClient::new(session.clone()),
        }
    }
}
