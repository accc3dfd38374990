//! Lazy, paginated post streams.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;

use crate::api::client::TwitterApi;
use crate::config::{Config, HarvestTarget};
use crate::error::{Error, Result};
use crate::media::Post;

/// Pull-based producer of posts, newest first.
#[async_trait]
pub trait PostSource: Send {
    /// Next post, or `None` once the stream is exhausted.
    async fn next_post(&mut self) -> Result<Option<Post>>;
}

/// Post stream over a user timeline or search, fetched one page at a time.
///
/// A page is only requested when the previously fetched posts have all
/// been handed out, so a consumer that stops early never pays for more.
pub struct TimelineStream<'a> {
    api: &'a TwitterApi,
    target: HarvestTarget,
    page_size: u32,
    include_retweets: bool,
    wait_on_rate_limit: bool,
    page_delay: Duration,
    buffer: VecDeque<Post>,
    max_id: Option<u64>,
    pages_fetched: u64,
    exhausted: bool,
}

impl<'a> TimelineStream<'a> {
    /// Create a stream with default paging.
    pub fn new(api: &'a TwitterApi, target: HarvestTarget) -> Self {
        Self {
            api,
            target,
            page_size: 200,
            include_retweets: true,
            wait_on_rate_limit: true,
            page_delay: Duration::ZERO,
            buffer: VecDeque::new(),
            max_id: None,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Create a stream using the paging options of a config.
    pub fn from_config(api: &'a TwitterApi, config: &Config, target: HarvestTarget) -> Self {
        Self::new(api, target)
            .page_size(config.options.page_size)
            .include_retweets(config.options.include_retweets)
            .wait_on_rate_limit(config.options.wait_on_rate_limit)
            .page_delay(Duration::from_millis(config.options.page_delay_ms))
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn include_retweets(mut self, include: bool) -> Self {
        self.include_retweets = include;
        self
    }

    pub fn wait_on_rate_limit(mut self, wait: bool) -> Self {
        self.wait_on_rate_limit = wait;
        self
    }

    /// Base delay between page requests; the actual wait is jittered up to twice this.
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    async fn fetch_next_page(&mut self) -> Result<()> {
        if self.pages_fetched > 0 && !self.page_delay.is_zero() {
            sleep(jittered_delay(self.page_delay)).await;
        }

        let posts = loop {
            match self
                .api
                .get_page(
                    &self.target,
                    self.page_size,
                    self.max_id,
                    self.include_retweets,
                )
                .await
            {
                Ok(posts) => break posts,
                Err(Error::RateLimited(secs)) if self.wait_on_rate_limit => {
                    tracing::warn!("Rate limited, waiting {} seconds...", secs);
                    sleep(Duration::from_secs(secs)).await;
                }
                Err(e) => return Err(e),
            }
        };
        self.pages_fetched += 1;

        if posts.is_empty() {
            tracing::debug!("Empty page, stream for {} exhausted", self.target);
            self.exhausted = true;
            return Ok(());
        }

        let min_id = posts
            .iter()
            .map(|p| p.id.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Api(format!("Non-numeric post id in page: {}", e)))?
            .into_iter()
            .min()
            .unwrap_or(0);

        // max_id is inclusive, so continue strictly below the oldest post seen
        match min_id.checked_sub(1) {
            Some(next) if self.max_id.map_or(true, |prev| next < prev) => {
                self.max_id = Some(next);
            }
            _ => self.exhausted = true,
        }

        tracing::debug!(
            "Fetched page {} with {} posts, next max_id {:?}",
            self.pages_fetched,
            posts.len(),
            self.max_id
        );

        self.buffer.extend(posts);
        Ok(())
    }
}

/// A random wait between `base` and twice `base`, in whole milliseconds.
fn jittered_delay(base: Duration) -> Duration {
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX).max(1);
    let delay_ms = rand::thread_rng().gen_range(base_ms..=base_ms.saturating_mul(2));
    Duration::from_millis(delay_ms)
}

#[async_trait]
impl<'a> PostSource for TimelineStream<'a> {
    async fn next_post(&mut self) -> Result<Option<Post>> {
        loop {
            if let Some(post) = self.buffer.pop_front() {
                return Ok(Some(post));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_next_page().await?;
        }
    }
}

/// In-memory source, mainly for replaying already fetched posts.
#[async_trait]
impl PostSource for VecDeque<Post> {
    async fn next_post(&mut self) -> Result<Option<Post>> {
        Ok(self.pop_front())
    }
}
