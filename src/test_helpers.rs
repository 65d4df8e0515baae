//! In-memory backend fake shared by unit tests.
//!
//! Behaves like the REST backend closely enough for state logic: likes and
//! subscriptions are per-user sets, comments form a parent-keyed list, and
//! every call is recorded as `"METHOD /path"` so tests can assert on traffic.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::ClientError;
use crate::net::backend::Backend;
use crate::net::types::{
    AuthHeaders, ChannelId, ChannelRef, Comment, CommentAuthor, CommentId, CommentRequest, Credentials, Identity,
    OwnedChannel, Page, UserId, Video, VideoId, VideoUpdateRequest,
};
use crate::state::session::Session;
use crate::state::store::{KeyValueStore, MemoryStore};

pub const CREATED_AT: &str = "2024-01-01T00:00:00";

#[derive(Default)]
struct MockData {
    next_id: i64,
    users: Vec<(Identity, String)>,
    tokens: HashMap<String, UserId>,
    videos: Vec<Video>,
    video_likes: HashSet<(UserId, VideoId)>,
    comments: Vec<(VideoId, Comment)>,
    comment_likes: HashSet<(UserId, CommentId)>,
    subscriptions: HashSet<(UserId, ChannelId)>,
    failures: HashMap<String, u16>,
}

impl MockData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_for(&self, auth: &AuthHeaders) -> Option<UserId> {
        match auth {
            AuthHeaders::Anonymous => None,
            AuthHeaders::UserPassword { email, password } => self
                .users
                .iter()
                .find(|(identity, pw)| &identity.email == email && pw == password)
                .map(|(identity, _)| identity.id),
            AuthHeaders::Bearer(token) => self.tokens.get(token).copied(),
        }
    }

    fn require_user(&self, auth: &AuthHeaders) -> Result<UserId, ClientError> {
        self.user_for(auth)
            .ok_or_else(|| ClientError::Status { status: 401, body: "authentication required".into() })
    }

    fn author(&self, user_id: UserId) -> Option<CommentAuthor> {
        self.users.iter().find(|(identity, _)| identity.id == user_id).map(|(identity, _)| CommentAuthor {
            id: identity.id,
            email: identity.email.clone(),
            channel: identity.channel.as_ref().map(|c| ChannelRef { id: c.id, name: c.name.clone() }),
        })
    }

    fn decorate(&self, comment: &Comment, viewer: Option<UserId>) -> Comment {
        let mut out = comment.clone();
        out.like_count = self.comment_likes.iter().filter(|(_, id)| *id == comment.id).count() as u64;
        out.user_liked = viewer.is_some_and(|user| self.comment_likes.contains(&(user, comment.id)));
        out.reply_count = self
            .comments
            .iter()
            .filter(|(_, c)| c.parent_comment_id == Some(comment.id))
            .count() as u64;
        out
    }
}

/// Recording fake of the REST backend.
#[derive(Default)]
pub struct MockBackend {
    data: Mutex<MockData>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap()
    }

    fn record(&self, call: String) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call.clone());
        match self.data().failures.get(&call) {
            Some(status) => Err(ClientError::Status { status: *status, body: "injected failure".into() }),
            None => Ok(()),
        }
    }

    /// Seed an account. `channel` gives the user a channel with that id and name.
    pub fn add_user(&self, email: &str, password: &str, channel: Option<(ChannelId, &str)>) -> Identity {
        let mut data = self.data();
        let id = data.next_id();
        let identity = Identity {
            id,
            email: email.to_owned(),
            created_at: CREATED_AT.to_owned(),
            channel: channel.map(|(id, name)| OwnedChannel {
                id,
                name: name.to_owned(),
                description: String::new(),
            }),
        };
        data.users.push((identity.clone(), password.to_owned()));
        identity
    }

    pub fn add_video(&self, title: &str, channel: Option<(ChannelId, &str)>) -> Video {
        let mut data = self.data();
        let id = data.next_id();
        let video = Video {
            id,
            title: title.to_owned(),
            description: String::new(),
            category: "misc".to_owned(),
            created_at: CREATED_AT.to_owned(),
            view_count: 0,
            thumbnail_data: None,
            channel: channel.map(|(id, name)| ChannelRef { id, name: name.to_owned() }),
        };
        data.videos.push(video.clone());
        video
    }

    /// Insert a comment directly, bypassing auth.
    pub fn seed_comment(&self, video_id: VideoId, parent: Option<CommentId>, content: &str) -> Comment {
        let mut data = self.data();
        let id = data.next_id();
        let comment = Comment {
            id,
            content: content.to_owned(),
            created_at: CREATED_AT.to_owned(),
            author: None,
            parent_comment_id: parent,
            like_count: 0,
            user_liked: false,
            replies: None,
            reply_count: 0,
        };
        data.comments.push((video_id, comment.clone()));
        comment
    }

    /// Like a video on behalf of another user.
    pub fn seed_video_like(&self, user_id: UserId, video_id: VideoId) {
        self.data().video_likes.insert((user_id, video_id));
    }

    pub fn seed_comment_like(&self, user_id: UserId, comment_id: CommentId) {
        self.data().comment_likes.insert((user_id, comment_id));
    }

    pub fn seed_subscription(&self, user_id: UserId, channel_id: ChannelId) {
        self.data().subscriptions.insert((user_id, channel_id));
    }

    /// Make every call recorded as `call` fail with `status`.
    pub fn fail(&self, call: &str, status: u16) {
        self.data().failures.insert(call.to_owned(), status);
    }

    pub fn heal(&self, call: &str) {
        self.data().failures.remove(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Number of recorded calls whose path contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.contains(fragment)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn register(&self, credentials: &Credentials) -> Result<Identity, ClientError> {
        self.record("POST /auth/register".into())?;
        if self.data().users.iter().any(|(identity, _)| identity.email == credentials.email) {
            return Err(ClientError::Status { status: 400, body: "email already registered".into() });
        }
        Ok(self.add_user(&credentials.email, &credentials.password, None))
    }

    async fn login(&self, credentials: &Credentials) -> Result<Identity, ClientError> {
        self.record("POST /auth/login".into())?;
        self.data()
            .users
            .iter()
            .find(|(identity, pw)| identity.email == credentials.email && *pw == credentials.password)
            .map(|(identity, _)| identity.clone())
            .ok_or_else(|| ClientError::Status { status: 401, body: "invalid credentials".into() })
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<String, ClientError> {
        self.record("POST /auth/signup".into())?;
        self.add_user(&credentials.email, &credentials.password, None);
        Ok("User registered successfully".into())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<String, ClientError> {
        self.record("POST /auth/signin".into())?;
        let mut data = self.data();
        let user_id = data
            .users
            .iter()
            .find(|(identity, pw)| identity.email == credentials.email && *pw == credentials.password)
            .map(|(identity, _)| identity.id)
            .ok_or_else(|| ClientError::Status { status: 401, body: "invalid credentials".into() })?;
        let token = format!("token-{user_id}");
        data.tokens.insert(token.clone(), user_id);
        Ok(token)
    }

    async fn list_videos(&self, _auth: &AuthHeaders, page: u32, size: u32) -> Result<Page<Video>, ClientError> {
        self.record(format!("GET /videos?page={page}&size={size}"))?;
        let data = self.data();
        let total = data.videos.len();
        let size_usize = size.max(1) as usize;
        let start = (page as usize).saturating_mul(size_usize);
        let content: Vec<Video> = data.videos.iter().skip(start).take(size_usize).cloned().collect();
        let total_pages = u32::try_from(total.div_ceil(size_usize)).unwrap();
        Ok(Page {
            empty: content.is_empty(),
            content,
            total_pages,
            total_elements: total as u64,
            size,
            number: page,
            first: page == 0,
            last: start + size_usize >= total,
        })
    }

    async fn get_video(&self, _auth: &AuthHeaders, id: VideoId) -> Result<Video, ClientError> {
        self.record(format!("GET /videos/{id}"))?;
        self.data()
            .videos
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| ClientError::Status { status: 404, body: "video not found".into() })
    }

    fn stream_url(&self, id: VideoId) -> String {
        format!("mock://videos/{id}/stream")
    }

    async fn update_video(
        &self,
        auth: &AuthHeaders,
        id: VideoId,
        request: &VideoUpdateRequest,
    ) -> Result<Video, ClientError> {
        self.record(format!("PATCH /videos/{id}"))?;
        let mut data = self.data();
        data.require_user(auth)?;
        let video = data
            .videos
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| ClientError::Status { status: 404, body: "video not found".into() })?;
        video.title.clone_from(&request.title);
        video.description.clone_from(&request.description);
        video.category.clone_from(&request.category);
        Ok(video.clone())
    }

    async fn toggle_video_like(&self, auth: &AuthHeaders, id: VideoId) -> Result<bool, ClientError> {
        self.record(format!("POST /videos/{id}/like"))?;
        let mut data = self.data();
        let user = data.require_user(auth)?;
        if data.video_likes.remove(&(user, id)) {
            Ok(false)
        } else {
            data.video_likes.insert((user, id));
            Ok(true)
        }
    }

    async fn video_like_count(&self, id: VideoId) -> Result<u64, ClientError> {
        self.record(format!("GET /videos/{id}/like-count"))?;
        Ok(self.data().video_likes.iter().filter(|(_, v)| *v == id).count() as u64)
    }

    async fn video_user_liked(&self, auth: &AuthHeaders, id: VideoId) -> Result<bool, ClientError> {
        self.record(format!("GET /videos/{id}/user-liked"))?;
        let data = self.data();
        let user = data.require_user(auth)?;
        Ok(data.video_likes.contains(&(user, id)))
    }

    async fn list_comments(&self, auth: &AuthHeaders, video_id: VideoId) -> Result<Vec<Comment>, ClientError> {
        self.record(format!("GET /comments/video/{video_id}"))?;
        let data = self.data();
        let viewer = data.user_for(auth);
        Ok(data
            .comments
            .iter()
            .filter(|(v, c)| *v == video_id && c.parent_comment_id.is_none())
            .map(|(_, c)| data.decorate(c, viewer))
            .collect())
    }

    async fn add_comment(
        &self,
        auth: &AuthHeaders,
        video_id: VideoId,
        request: &CommentRequest,
    ) -> Result<Comment, ClientError> {
        self.record(format!("POST /comments/video/{video_id}"))?;
        let mut data = self.data();
        let user = data.require_user(auth)?;
        let id = data.next_id();
        let comment = Comment {
            id,
            content: request.content.clone(),
            created_at: CREATED_AT.to_owned(),
            author: data.author(user),
            parent_comment_id: request.parent_comment_id,
            like_count: 0,
            user_liked: false,
            replies: None,
            reply_count: 0,
        };
        data.comments.push((video_id, comment.clone()));
        Ok(comment)
    }

    async fn list_replies(&self, auth: &AuthHeaders, comment_id: CommentId) -> Result<Vec<Comment>, ClientError> {
        self.record(format!("GET /comments/{comment_id}/replies"))?;
        let data = self.data();
        let viewer = data.user_for(auth);
        Ok(data
            .comments
            .iter()
            .filter(|(_, c)| c.parent_comment_id == Some(comment_id))
            .map(|(_, c)| data.decorate(c, viewer))
            .collect())
    }

    async fn toggle_comment_like(&self, auth: &AuthHeaders, id: CommentId) -> Result<bool, ClientError> {
        self.record(format!("POST /comments/{id}/like"))?;
        let mut data = self.data();
        let user = data.require_user(auth)?;
        if data.comment_likes.remove(&(user, id)) {
            Ok(false)
        } else {
            data.comment_likes.insert((user, id));
            Ok(true)
        }
    }

    async fn comment_like_count(&self, id: CommentId) -> Result<u64, ClientError> {
        self.record(format!("GET /comments/{id}/like-count"))?;
        Ok(self.data().comment_likes.iter().filter(|(_, c)| *c == id).count() as u64)
    }

    async fn comment_user_liked(&self, auth: &AuthHeaders, id: CommentId) -> Result<bool, ClientError> {
        self.record(format!("GET /comments/{id}/user-liked"))?;
        let data = self.data();
        let user = data.require_user(auth)?;
        Ok(data.comment_likes.contains(&(user, id)))
    }

    async fn subscribe(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<(), ClientError> {
        self.record(format!("POST /channels/{channel_id}/subscribe"))?;
        let mut data = self.data();
        let user = data.require_user(auth)?;
        data.subscriptions.insert((user, channel_id));
        Ok(())
    }

    async fn unsubscribe(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<(), ClientError> {
        self.record(format!("DELETE /channels/{channel_id}/unsubscribe"))?;
        let mut data = self.data();
        let user = data.require_user(auth)?;
        data.subscriptions.remove(&(user, channel_id));
        Ok(())
    }

    async fn is_subscribed(&self, auth: &AuthHeaders, channel_id: ChannelId) -> Result<bool, ClientError> {
        self.record(format!("GET /channels/{channel_id}/is-subscribed"))?;
        let data = self.data();
        let user = data.require_user(auth)?;
        Ok(data.subscriptions.contains(&(user, channel_id)))
    }

    async fn subscriber_count(&self, channel_id: ChannelId) -> Result<u64, ClientError> {
        self.record(format!("GET /channels/{channel_id}/subscriber-count"))?;
        Ok(self.data().subscriptions.iter().filter(|(_, c)| *c == channel_id).count() as u64)
    }
}

/// Anonymous session over `backend` with a fresh memory store.
pub fn session_with(backend: &Arc<MockBackend>) -> (Session, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = Session::restore(
        Arc::clone(backend) as Arc<dyn Backend>,
        Arc::clone(&store) as Arc<dyn KeyValueStore>,
    );
    (session, store)
}

/// Session already logged in as a freshly seeded user.
pub async fn logged_in_session(
    backend: &Arc<MockBackend>,
    email: &str,
    channel: Option<(ChannelId, &str)>,
) -> (Session, Identity) {
    backend.add_user(email, "secret", channel);
    let (session, _) = session_with(backend);
    let identity = session.login(email, "secret").await.unwrap();
    backend.clear_calls();
    (session, identity)
}
