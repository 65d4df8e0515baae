//! Paginated home feed for infinite scroll.
//!
//! Pages are requested strictly in order. A failed page is not skipped: the
//! page counter only advances on success, so the next load retries it.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use tracing::{debug, error};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::ClientError;
use crate::net::types::Video;
use crate::net::video::VideoClient;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFeed {
    pub videos: Vec<Video>,
    /// Next zero-based page to request.
    pub current_page: u32,
    pub page_size: u32,
    pub has_more: bool,
    pub loading: bool,
}

impl Default for VideoFeed {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl VideoFeed {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self { videos: Vec::new(), current_page: 0, page_size, has_more: true, loading: false }
    }

    /// Fetch the next page and append it.
    ///
    /// Returns the number of videos appended; zero when a load is already in
    /// flight or no pages remain.
    ///
    /// # Errors
    ///
    /// Backend failures propagate; the page counter is left unchanged.
    pub async fn load_more(&mut self, client: &VideoClient) -> Result<usize, ClientError> {
        if self.loading || !self.has_more {
            return Ok(0);
        }
        self.loading = true;
        let result = client.list(self.current_page, self.page_size).await;
        self.loading = false;

        let page = result.inspect_err(|e| {
            error!(error = %e, page = self.current_page, "feed page load failed");
        })?;
        let appended = page.content.len();
        self.videos.extend(page.content);
        self.has_more = !page.last;
        self.current_page += 1;
        debug!(page = self.current_page - 1, appended, has_more = self.has_more, "feed page loaded");
        Ok(appended)
    }

    /// Scroll hook: loads the next page only when the viewport is near the bottom.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_more`].
    pub async fn on_scroll(&mut self, near_bottom: bool, client: &VideoClient) -> Result<usize, ClientError> {
        if !near_bottom {
            return Ok(0);
        }
        self.load_more(client).await
    }
}
