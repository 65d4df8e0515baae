//! Comment section of a video page: the tree plus top-level posting.
//!
//! The section never fetches the top-level list itself. Its owner feeds it
//! each list the video view publishes and, on [`SectionEvent::CommentAdded`],
//! asks the view for a fresh list.

#[cfg(test)]
#[path = "comment_section_test.rs"]
mod comment_section_test;

use tracing::error;

use super::comment_tree::{CommentTree, SectionEvent};
use crate::error::ClientError;
use crate::net::comment::CommentClient;
use crate::net::types::{Comment, VideoId};

pub struct CommentSection {
    tree: CommentTree,
}

impl CommentSection {
    #[must_use]
    pub fn new(video_id: VideoId, client: CommentClient) -> Self {
        Self { tree: CommentTree::new(video_id, client) }
    }

    #[must_use]
    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CommentTree {
        &mut self.tree
    }

    /// Adopt a freshly fetched top-level list and activate new nodes.
    pub async fn sync(&mut self, comments: Vec<Comment>) {
        self.tree.sync_top_level(comments);
        self.tree.activate_pending().await;
    }

    /// Refetch per-comment liked state after a login or logout. Owners call
    /// this from the session's identity stream.
    pub async fn on_identity_change(&mut self) {
        self.tree.on_identity_change().await;
    }

    /// Post a top-level comment on this section's video.
    ///
    /// # Errors
    ///
    /// `LoginRequired` or `EmptyContent` before any request; backend
    /// failures from the post.
    pub async fn submit_comment(&mut self, content: &str) -> Result<SectionEvent, ClientError> {
        let client = self.tree.client();
        client.session().require_identity("comment")?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyContent);
        }
        let video_id = self.tree.video_id();
        let comment = client.add(video_id, content, None).await.inspect_err(|e| {
            error!(error = %e, video_id, "post comment failed");
        })?;
        Ok(SectionEvent::CommentAdded(comment))
    }
}
