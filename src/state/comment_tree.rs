//! Arena-indexed comment tree for one video.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each displayed comment is a node with its own UI sub-state: reply form
//! visibility, reply list visibility, liked flag and like count. Replies are
//! fetched lazily the first time a node's replies become visible and cached
//! only on that node.
//!
//! DESIGN
//! ======
//! Nodes live in a `Vec<Option<CommentNode>>` addressed by `NodeId`, with a
//! `CommentId -> NodeId` index. Refreshing a list reconciles by comment id:
//! surviving nodes keep their state and cached replies, dropped nodes become
//! tombstones whose slots are reused by later inserts. Rendering walks the tree with an explicit stack so depth is
//! bounded by heap, not call stack.
//!
//! Replies are always posted through the root video's id with the parent set.
//! A successful post yields [`SectionEvent::CommentAdded`]; the owner reacts by
//! refreshing the whole top-level list.

#[cfg(test)]
#[path = "comment_tree_test.rs"]
mod comment_tree_test;

use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;
use tracing::{debug, error};

use crate::error::ClientError;
use crate::net::comment::CommentClient;
use crate::net::types::{Comment, CommentId, VideoId};
use crate::util::format::time_since;

/// Index of a node in the tree arena.
pub type NodeId = usize;

/// Per-node UI state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeState {
    pub show_reply_form: bool,
    pub show_replies: bool,
    pub is_liked: bool,
    pub like_count: u64,
    /// Initial liked/count fetch has run.
    pub activated: bool,
}

#[derive(Clone, Debug)]
pub struct CommentNode {
    pub comment: Comment,
    pub state: NodeState,
    pub parent: Option<NodeId>,
    /// Child nodes from the last reply fetch.
    pub replies: Vec<NodeId>,
    pub replies_loaded: bool,
}

/// Raised by a successful post so the owner can refresh its list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionEvent {
    CommentAdded(Comment),
}

pub struct CommentTree {
    video_id: VideoId,
    client: CommentClient,
    nodes: Vec<Option<CommentNode>>,
    /// Tombstoned slots available for reuse.
    free: Vec<NodeId>,
    roots: Vec<NodeId>,
    index: HashMap<CommentId, NodeId>,
}

impl CommentTree {
    #[must_use]
    pub fn new(video_id: VideoId, client: CommentClient) -> Self {
        Self { video_id, client, nodes: Vec::new(), free: Vec::new(), roots: Vec::new(), index: HashMap::new() }
    }

    #[must_use]
    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    #[must_use]
    pub fn client(&self) -> &CommentClient {
        &self.client
    }

    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&CommentNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    /// Node currently displaying `comment_id`.
    #[must_use]
    pub fn find(&self, comment_id: CommentId) -> Option<NodeId> {
        self.index.get(&comment_id).copied()
    }

    /// Number of live (non-tombstoned) nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // =========================================================================
    // RECONCILE
    // =========================================================================

    /// Replace the top-level list with a fresh fetch.
    pub fn sync_top_level(&mut self, comments: Vec<Comment>) {
        let old = std::mem::take(&mut self.roots);
        self.roots = self.reconcile(None, old, comments);
    }

    fn set_replies(&mut self, parent: NodeId, comments: Vec<Comment>) {
        let old = match self.node_mut(parent) {
            Some(node) => std::mem::take(&mut node.replies),
            None => return,
        };
        let replies = self.reconcile(Some(parent), old, comments);
        if let Some(node) = self.node_mut(parent) {
            node.replies = replies;
            node.replies_loaded = true;
        }
    }

    /// Map `comments` onto nodes under `parent`, reusing nodes from `old` by
    /// comment id and tombstoning the rest of `old`.
    fn reconcile(&mut self, parent: Option<NodeId>, old: Vec<NodeId>, comments: Vec<Comment>) -> Vec<NodeId> {
        let old_set: HashSet<NodeId> = old.iter().copied().collect();
        let mut kept: HashSet<NodeId> = HashSet::new();
        let mut ids = Vec::with_capacity(comments.len());

        for comment in comments {
            let reusable = self.find(comment.id).filter(|id| old_set.contains(id) && !kept.contains(id));
            let id = match reusable {
                Some(id) => {
                    if let Some(node) = self.node_mut(id) {
                        node.comment = comment;
                    }
                    id
                }
                None => self.insert(comment, parent),
            };
            kept.insert(id);
            ids.push(id);
        }

        for id in old {
            if !kept.contains(&id) {
                self.remove_subtree(id);
            }
        }
        ids
    }

    fn insert(&mut self, comment: Comment, parent: Option<NodeId>) -> NodeId {
        // A comment shown elsewhere moves here.
        if let Some(previous) = self.find(comment.id) {
            self.remove_subtree(previous);
        }
        let state =
            NodeState { like_count: comment.like_count, is_liked: comment.user_liked, ..NodeState::default() };
        let comment_id = comment.id;
        let node = Some(CommentNode { comment, state, parent, replies: Vec::new(), replies_loaded: false });
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.index.insert(comment_id, id);
        id
    }

    fn remove_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id).and_then(Option::take) else {
                continue;
            };
            if self.index.get(&node.comment.id) == Some(&id) {
                self.index.remove(&node.comment.id);
            }
            self.free.push(id);
            stack.extend(node.replies);
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut CommentNode> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    fn resolve(&self, comment_id: CommentId) -> Result<NodeId, ClientError> {
        self.find(comment_id).ok_or(ClientError::UnknownComment(comment_id))
    }

    // =========================================================================
    // NODE ACTIONS
    // =========================================================================

    /// Run the initial liked/count fetch for every node that has not had one.
    pub async fn activate_pending(&mut self) {
        let pending: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| node.as_ref().filter(|n| !n.state.activated).map(|_| id))
            .collect();
        for id in pending {
            self.refresh_likes(id).await;
            if let Some(node) = self.node_mut(id) {
                node.state.activated = true;
            }
        }
    }

    /// Re-run the liked/count fetch for every live node after a login or
    /// logout, so liked flags follow the current identity.
    pub async fn on_identity_change(&mut self) {
        let mut reset = 0_usize;
        for node in self.nodes.iter_mut().flatten() {
            node.state.activated = false;
            reset += 1;
        }
        debug!(video_id = self.video_id, nodes = reset, "identity changed; refreshing comment likes");
        self.activate_pending().await;
    }

    /// Flip reply visibility. Replies are fetched on the transition to visible.
    ///
    /// # Errors
    ///
    /// `UnknownComment` when the comment is not displayed, or the reply fetch
    /// failure. The replies stay visible with their previous contents on
    /// failure.
    pub async fn toggle_replies(&mut self, comment_id: CommentId) -> Result<bool, ClientError> {
        let id = self.resolve(comment_id)?;
        let visible = match self.node_mut(id) {
            Some(node) => {
                node.state.show_replies = !node.state.show_replies;
                node.state.show_replies
            }
            None => return Err(ClientError::UnknownComment(comment_id)),
        };
        if visible {
            self.load_replies(id).await?;
        }
        Ok(visible)
    }

    /// Show or hide the reply form.
    ///
    /// # Errors
    ///
    /// `LoginRequired` when anonymous, `UnknownComment` when the comment is
    /// not displayed.
    pub fn toggle_reply_form(&mut self, comment_id: CommentId) -> Result<bool, ClientError> {
        self.client.session().require_identity("reply")?;
        let id = self.resolve(comment_id)?;
        let node = self.node_mut(id).ok_or(ClientError::UnknownComment(comment_id))?;
        node.state.show_reply_form = !node.state.show_reply_form;
        Ok(node.state.show_reply_form)
    }

    /// Post a reply to `parent_id` through the root video.
    ///
    /// On success the form closes, replies become visible and are re-fetched.
    ///
    /// # Errors
    ///
    /// `LoginRequired`, `EmptyContent` or `UnknownComment` before any
    /// request; backend failures from the post itself.
    pub async fn submit_reply(&mut self, parent_id: CommentId, content: &str) -> Result<SectionEvent, ClientError> {
        self.client.session().require_identity("reply")?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyContent);
        }
        let id = self.resolve(parent_id)?;

        let reply = self.client.add(self.video_id, content, Some(parent_id)).await.inspect_err(|e| {
            error!(error = %e, comment_id = parent_id, "post reply failed");
        })?;
        debug!(comment_id = parent_id, reply_id = reply.id, "reply posted");

        if let Some(node) = self.node_mut(id) {
            node.state.show_reply_form = false;
            node.state.show_replies = true;
        }
        if let Err(e) = self.load_replies(id).await {
            debug!(error = %e, comment_id = parent_id, "reply list refresh after post failed");
        }
        Ok(SectionEvent::CommentAdded(reply))
    }

    /// Toggle the caller's like, then re-fetch likes for that node only.
    ///
    /// # Errors
    ///
    /// `LoginRequired` when anonymous, `UnknownComment` when the comment is
    /// not displayed, otherwise backend failures.
    pub async fn toggle_like(&mut self, comment_id: CommentId) -> Result<bool, ClientError> {
        self.client.session().require_identity("like comments")?;
        let id = self.resolve(comment_id)?;
        let liked = self.client.toggle_like(comment_id).await.inspect_err(|e| {
            error!(error = %e, comment_id, "toggle comment like failed");
        })?;
        if let Some(node) = self.node_mut(id) {
            node.state.is_liked = liked;
        }
        self.refresh_likes(id).await;
        Ok(liked)
    }

    async fn load_replies(&mut self, id: NodeId) -> Result<(), ClientError> {
        let Some(comment_id) = self.node(id).map(|n| n.comment.id) else {
            return Ok(());
        };
        let replies = self.client.replies(comment_id).await.inspect_err(|e| {
            error!(error = %e, comment_id, "reply fetch failed");
        })?;
        self.set_replies(id, replies);
        self.activate_pending().await;
        Ok(())
    }

    async fn refresh_likes(&mut self, id: NodeId) {
        let Some(comment_id) = self.node(id).map(|n| n.comment.id) else {
            return;
        };
        let (liked, count) =
            tokio::join!(self.client.has_user_liked(comment_id), self.client.like_count(comment_id));
        let Some(node) = self.node_mut(id) else {
            return;
        };
        match liked {
            Ok(liked) => node.state.is_liked = liked,
            Err(e) => error!(error = %e, comment_id, "comment liked status fetch failed"),
        }
        match count {
            Ok(count) => node.state.like_count = count,
            Err(e) => error!(error = %e, comment_id, "comment like count fetch failed"),
        }
    }

    // =========================================================================
    // RENDER
    // =========================================================================

    /// Indented text rendering of the visible tree.
    #[must_use]
    pub fn render(&self, now: OffsetDateTime) -> String {
        let mut out = String::new();
        let mut stack: Vec<(NodeId, usize)> = self.roots.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            render_node(&mut out, node, depth, now);
            if node.state.show_replies {
                stack.extend(node.replies.iter().rev().map(|&child| (child, depth + 1)));
            }
        }
        out
    }
}

fn render_node(out: &mut String, node: &CommentNode, depth: usize, now: OffsetDateTime) {
    let indent = "    ".repeat(depth);
    let comment = &node.comment;
    let state = &node.state;
    let liked = if state.is_liked { " (liked)" } else { "" };
    let replies = match (state.show_replies, node.replies_loaded) {
        (true, true) => format!("{} replies shown", node.replies.len()),
        (true, false) => "loading replies".to_owned(),
        (false, _) => format!("{} replies", comment.reply_count),
    };
    let form = if state.show_reply_form { " · replying" } else { "" };
    out.push_str(&format!(
        "{indent}[#{}] {} · {} · {} likes{liked}\n",
        comment.id,
        comment.author_label(),
        time_since(&comment.created_at, now),
        state.like_count,
    ));
    out.push_str(&format!("{indent}    {}\n", comment.content));
    out.push_str(&format!("{indent}    {replies}{form}\n"));
}
