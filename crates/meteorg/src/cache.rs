use feeds::FeatureCollection;
use log::{debug, info};
use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Stations,
    Firms,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Stations => write!(f, "stations"),
            Feed::Firms => write!(f, "firms"),
        }
    }
}

/// A stored feed and the UTC time its refresh started.
#[derive(Debug, Clone)]
pub struct Cached {
    pub payload: Arc<FeatureCollection>,
    pub last_update: OffsetDateTime,
}

struct Entry {
    cached: Cached,
    expires_at: Instant,
}

/// Time-based cache for the published feeds.
///
/// Expiry runs on the monotonic clock. Concurrent misses each run the
/// producer and the last one to finish wins; the lock is never held while a
/// producer runs. Failed refreshes store nothing.
pub struct FeedCache {
    ttl: Duration,
    entries: RwLock<HashMap<Feed, Entry>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        FeedCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn fresh(&self, feed: Feed) -> Option<Cached> {
        let entries = self.entries.read().await;
        entries
            .get(&feed)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.cached.clone())
    }

    pub async fn get_or_refresh<F, Fut, E>(&self, feed: Feed, producer: F) -> Result<Cached, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FeatureCollection, E>>,
    {
        if let Some(cached) = self.fresh(feed).await {
            debug!("serving cached {} feed", feed);
            return Ok(cached);
        }

        info!("refreshing {} feed", feed);
        let started = Instant::now();
        let last_update = OffsetDateTime::now_utc();
        let payload = Arc::new(producer().await?);

        let cached = Cached {
            payload,
            last_update,
        };
        self.entries.write().await.insert(
            feed,
            Entry {
                cached: cached.clone(),
                expires_at: started + self.ttl,
            },
        );
        Ok(cached)
    }
}
