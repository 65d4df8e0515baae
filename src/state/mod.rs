//! Client-side state: sessions, persisted storage and view state.

pub mod comment_section;
pub mod comment_tree;
pub mod feed;
pub mod session;
pub mod store;
pub mod token_session;
pub mod video_view;
