//! Per-video interaction state driver.
//!
//! SYSTEM CONTEXT
//! ==============
//! Opening a video spawns one driver task. The driver owns the derived view
//! state (like status and count, subscription status and count, the comment
//! list, the video snapshot) and publishes it on a `watch` channel. Handles
//! perform user actions themselves and then tell the driver which slice of
//! state to re-fetch.
//!
//! DESIGN
//! ======
//! Each derived value is re-fetched on activation, on an explicit `Refresh`
//! message, and on identity changes (likes and channel only). A fixed-period
//! timer re-fetches comments regardless of user activity; its first tick is
//! one full period after activation.
//!
//! Fetches run as spawned tasks and report back over an mpsc channel, so the
//! driver applies results in arrival order and the last response wins.
//! Polled and on-demand fetches are never merged.
//!
//! TRADE-OFFS
//! ==========
//! A failed background fetch keeps the previous value and is only logged.
//! Closing the view aborts the driver and its timer; fetches already in
//! flight run to completion and their results are dropped.

#[cfg(test)]
#[path = "video_view_test.rs"]
mod video_view_test;

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use super::session::Session;
use crate::error::ClientError;
use crate::net::Clients;
use crate::net::types::{ChannelId, Comment, Identity, Video, VideoId};

/// Slices of view state that can be re-fetched independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// Liked flag and like count.
    Likes,
    /// Subscribed flag and subscriber count.
    Channel,
    /// Top-level comment list.
    Comments,
}

/// Everything a video page renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoViewState {
    pub video_id: VideoId,
    pub video: Option<Video>,
    /// Set when the video itself failed to load.
    pub load_error: Option<String>,
    pub is_authenticated: bool,
    pub is_liked: bool,
    pub like_count: u64,
    pub is_subscribed: bool,
    pub subscriber_count: u64,
    pub comments: Vec<Comment>,
}

impl VideoViewState {
    #[must_use]
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.video.as_ref().and_then(Video::channel_id)
    }
}

enum Command {
    Refresh(Refresh),
    SetLiked(bool),
    SetSubscribed(bool),
}

enum Fetched {
    Video(Video),
    VideoFailed(String),
    Liked(bool),
    LikeCount(u64),
    Subscribed(bool),
    SubscriberCount(u64),
    Comments(Vec<Comment>),
}

// =============================================================================
// HANDLE
// =============================================================================

/// Handle to an open video view. Dropping it stops the driver.
pub struct VideoView {
    video_id: VideoId,
    clients: Clients,
    session: Session,
    state: watch::Receiver<VideoViewState>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl VideoView {
    /// Open a view of `video_id` and start its driver.
    #[must_use]
    pub fn open(video_id: VideoId, clients: Clients, session: Session, poll_period: Duration) -> Self {
        let initial = VideoViewState {
            video_id,
            is_authenticated: session.is_authenticated(),
            ..VideoViewState::default()
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            video_id,
            clients: clients.clone(),
            identity: session.identity(),
            state: state_tx,
            commands: commands_rx,
            results_tx,
            results_rx,
            poll_period,
        };
        let task = tokio::spawn(driver.run());
        info!(video_id, poll_secs = poll_period.as_secs(), "video view opened");

        Self { video_id, clients, session, state: state_rx, commands: commands_tx, task }
    }

    #[must_use]
    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> VideoViewState {
        self.state.borrow().clone()
    }

    /// Receiver that yields every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VideoViewState> {
        self.state.clone()
    }

    /// Wait until the state satisfies `predicate`, returning that state.
    ///
    /// # Errors
    ///
    /// Returns `ViewClosed` if the driver stops first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&VideoViewState) -> bool,
    ) -> Result<VideoViewState, ClientError> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(predicate).await.map_err(|_| ClientError::ViewClosed)?;
        Ok((*state).clone())
    }

    /// Toggle the caller's like, then re-fetch like data.
    ///
    /// # Errors
    ///
    /// `LoginRequired` when anonymous; backend failures otherwise.
    pub async fn toggle_like(&self) -> Result<bool, ClientError> {
        self.session.require_identity("like videos")?;
        let liked = self.clients.videos.toggle_like(self.video_id).await.inspect_err(|e| {
            error!(error = %e, video_id = self.video_id, "toggle video like failed");
        })?;
        self.send(Command::SetLiked(liked))?;
        self.refresh(Refresh::Likes)?;
        Ok(liked)
    }

    /// Subscribe to the video's channel, or unsubscribe when already subscribed.
    ///
    /// # Errors
    ///
    /// `LoginRequired` when anonymous, `NoChannel` when the video has no
    /// channel (or has not loaded), `OwnChannel` for the caller's own channel,
    /// otherwise backend failures.
    pub async fn toggle_subscribe(&self) -> Result<bool, ClientError> {
        let identity = self.session.require_identity("subscribe")?;
        let (channel_id, subscribed) = {
            let state = self.state.borrow();
            (state.channel_id(), state.is_subscribed)
        };
        let channel_id = channel_id.ok_or(ClientError::NoChannel)?;
        if identity.channel_id() == Some(channel_id) {
            return Err(ClientError::OwnChannel);
        }

        let channels = &self.clients.channels;
        let outcome = if subscribed {
            channels.unsubscribe(channel_id).await
        } else {
            channels.subscribe(channel_id).await
        };
        outcome.inspect_err(|e| error!(error = %e, channel_id, "toggle subscription failed"))?;

        self.send(Command::SetSubscribed(!subscribed))?;
        self.refresh(Refresh::Channel)?;
        Ok(!subscribed)
    }

    /// Post a top-level comment, then re-fetch the comment list.
    ///
    /// # Errors
    ///
    /// `LoginRequired` when anonymous, `EmptyContent` for blank text,
    /// otherwise backend failures.
    pub async fn add_comment(&self, content: &str) -> Result<Comment, ClientError> {
        self.session.require_identity("comment")?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyContent);
        }
        let comment = self.clients.comments.add(self.video_id, content, None).await.inspect_err(|e| {
            error!(error = %e, video_id = self.video_id, "add comment failed");
        })?;
        self.refresh(Refresh::Comments)?;
        Ok(comment)
    }

    /// # Errors
    ///
    /// Returns `ViewClosed` if the driver has stopped.
    pub fn refresh_comments(&self) -> Result<(), ClientError> {
        self.refresh(Refresh::Comments)
    }

    /// Ask the driver to re-fetch one slice of state.
    ///
    /// # Errors
    ///
    /// Returns `ViewClosed` if the driver has stopped.
    pub fn refresh(&self, what: Refresh) -> Result<(), ClientError> {
        self.send(Command::Refresh(what))
    }

    /// Stop the driver and its timer.
    pub fn close(self) {
        drop(self);
    }

    fn send(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::ViewClosed)
    }
}

impl Drop for VideoView {
    fn drop(&mut self) {
        self.task.abort();
        debug!(video_id = self.video_id, "video view closed");
    }
}

// =============================================================================
// DRIVER
// =============================================================================

struct Driver {
    video_id: VideoId,
    clients: Clients,
    identity: watch::Receiver<Option<Identity>>,
    state: watch::Sender<VideoViewState>,
    commands: mpsc::UnboundedReceiver<Command>,
    results_tx: mpsc::UnboundedSender<Fetched>,
    results_rx: mpsc::UnboundedReceiver<Fetched>,
    poll_period: Duration,
}

impl Driver {
    async fn run(mut self) {
        self.fetch_video();
        self.fetch_likes();
        self.fetch_comments();

        let mut poll = interval_at(Instant::now() + self.poll_period, self.poll_period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut auth_open = true;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(fetched) = self.results_rx.recv() => self.apply(fetched),
                changed = self.identity.changed(), if auth_open => match changed {
                    Ok(()) => self.on_identity_change(),
                    Err(_) => auth_open = false,
                },
                _ = poll.tick() => {
                    debug!(video_id = self.video_id, "comment poll tick");
                    self.fetch_comments();
                }
            }
        }
        debug!(video_id = self.video_id, "video view driver stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Refresh(Refresh::Likes) => self.fetch_likes(),
            Command::Refresh(Refresh::Channel) => self.fetch_channel(),
            Command::Refresh(Refresh::Comments) => self.fetch_comments(),
            Command::SetLiked(liked) => self.state.send_modify(|s| s.is_liked = liked),
            Command::SetSubscribed(subscribed) => self.state.send_modify(|s| s.is_subscribed = subscribed),
        }
    }

    fn apply(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Video(video) => {
                self.state.send_modify(|s| {
                    s.video = Some(video);
                    s.load_error = None;
                });
                self.fetch_channel();
            }
            Fetched::VideoFailed(message) => self.state.send_modify(|s| s.load_error = Some(message)),
            Fetched::Liked(liked) => self.state.send_modify(|s| s.is_liked = liked),
            Fetched::LikeCount(count) => self.state.send_modify(|s| s.like_count = count),
            Fetched::Subscribed(subscribed) => self.state.send_modify(|s| s.is_subscribed = subscribed),
            Fetched::SubscriberCount(count) => self.state.send_modify(|s| s.subscriber_count = count),
            Fetched::Comments(comments) => self.state.send_modify(|s| s.comments = comments),
        }
    }

    fn on_identity_change(&mut self) {
        let authenticated = self.identity.borrow_and_update().is_some();
        debug!(video_id = self.video_id, authenticated, "identity changed; refreshing");
        self.state.send_modify(|s| s.is_authenticated = authenticated);
        self.fetch_likes();
        self.fetch_channel();
    }

    fn fetch_video(&self) {
        let videos = self.clients.videos.clone();
        let tx = self.results_tx.clone();
        let video_id = self.video_id;
        tokio::spawn(async move {
            match videos.get(video_id).await {
                Ok(video) => deliver(&tx, Fetched::Video(video)),
                Err(e) => {
                    error!(error = %e, video_id, "video load failed");
                    deliver(&tx, Fetched::VideoFailed(e.to_string()));
                }
            }
        });
    }

    fn fetch_likes(&self) {
        let videos = self.clients.videos.clone();
        let tx = self.results_tx.clone();
        let video_id = self.video_id;
        tokio::spawn(async move {
            let (liked, count) = tokio::join!(videos.has_user_liked(video_id), videos.like_count(video_id));
            match liked {
                Ok(liked) => deliver(&tx, Fetched::Liked(liked)),
                Err(e) => error!(error = %e, video_id, "liked status fetch failed"),
            }
            match count {
                Ok(count) => deliver(&tx, Fetched::LikeCount(count)),
                Err(e) => error!(error = %e, video_id, "like count fetch failed"),
            }
        });
    }

    fn fetch_channel(&self) {
        let channel_id = {
            let state = self.state.borrow();
            if state.video.is_none() {
                debug!(video_id = self.video_id, "channel refresh deferred until video loads");
                return;
            }
            state.channel_id()
        };
        let Some(channel_id) = channel_id else {
            self.state.send_modify(|s| {
                s.is_subscribed = false;
                s.subscriber_count = 0;
            });
            return;
        };

        let channels = self.clients.channels.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let (subscribed, count) =
                tokio::join!(channels.is_subscribed(channel_id), channels.subscriber_count(channel_id));
            match subscribed {
                Ok(subscribed) => deliver(&tx, Fetched::Subscribed(subscribed)),
                Err(e) => error!(error = %e, channel_id, "subscription status fetch failed"),
            }
            match count {
                Ok(count) => deliver(&tx, Fetched::SubscriberCount(count)),
                Err(e) => error!(error = %e, channel_id, "subscriber count fetch failed"),
            }
        });
    }

    fn fetch_comments(&self) {
        let comments = self.clients.comments.clone();
        let tx = self.results_tx.clone();
        let video_id = self.video_id;
        tokio::spawn(async move {
            match comments.list_for_video(video_id).await {
                Ok(list) => deliver(&tx, Fetched::Comments(list)),
                Err(e) => error!(error = %e, video_id, "comment list fetch failed"),
            }
        });
    }
}

fn deliver(tx: &mpsc::UnboundedSender<Fetched>, fetched: Fetched) {
    if tx.send(fetched).is_err() {
        debug!("view closed before fetch completed; result dropped");
    }
}
