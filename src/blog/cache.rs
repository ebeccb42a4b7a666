use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::storage::KeyValueStore;

use super::{
    models::{BlogSummary, CachedBlogSnapshot},
    source::BlogSource,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const DEFAULT_STORAGE_KEY: &str = "dev_to_blogs";

/// Source of "now". Day boundaries are evaluated in the returned offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Read-through cache of remote blog summaries that goes stale at the next
/// calendar day.
pub struct BlogCache {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn BlogSource>,
    clock: Arc<dyn Clock>,
    storage_key: String,
}

impl BlogCache {
    pub fn new(store: Arc<dyn KeyValueStore>, source: Arc<dyn BlogSource>) -> Self {
        Self {
            store,
            source,
            clock: Arc::new(SystemClock),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub async fn get_posts(&self) -> Result<Vec<BlogSummary>> {
        let now = self.clock.now();

        if let Some(snapshot) = self.load_snapshot().await {
            if is_same_day(snapshot.fetched_at, now) {
                log_debug!(
                    "Serving {} cached posts from {}",
                    snapshot.posts.len(),
                    snapshot.fetched_at
                );
                return Ok(snapshot.posts);
            }
            log_info!("Cached posts from {} are stale", snapshot.fetched_at);
        }

        let posts: Vec<BlogSummary> = self
            .source
            .fetch_posts()
            .await?
            .into_iter()
            .map(BlogSummary::from)
            .collect();

        log_info!("Fetched {} posts from remote source", posts.len());

        let snapshot = CachedBlogSnapshot {
            fetched_at: now.with_timezone(&Utc),
            posts,
        };
        self.save_snapshot(&snapshot).await;

        Ok(snapshot.posts)
    }

    /// Drops the persisted snapshot so the next read goes to the network.
    pub async fn invalidate(&self) -> Result<()> {
        self.store.remove(&self.storage_key).await
    }

    async fn load_snapshot(&self) -> Option<CachedBlogSnapshot> {
        let raw = match self.store.get(&self.storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log_warn!("Failed to read cached posts, refetching: {err:#}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                log_warn!("Ignoring malformed cached posts: {err}");
                None
            }
        }
    }

    async fn save_snapshot(&self, snapshot: &CachedBlogSnapshot) {
        let serialized = match serde_json::to_string(snapshot) {
            Ok(serialized) => serialized,
            Err(err) => {
                log_warn!("Failed to serialize posts for caching: {err}");
                return;
            }
        };

        if let Err(err) = self.store.set(&self.storage_key, &serialized).await {
            log_warn!("Failed to persist fetched posts: {err:#}");
        }
    }
}

fn is_same_day(fetched_at: DateTime<Utc>, now: DateTime<FixedOffset>) -> bool {
    fetched_at.with_timezone(now.offset()).date_naive() == now.date_naive()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use anyhow::{anyhow, bail};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::blog::models::{RawBlogAuthor, RawBlogPost};
    use crate::storage::MemoryStore;

    struct FixedClock(Mutex<DateTime<FixedOffset>>);

    impl FixedClock {
        fn at(y: i32, m: u32, d: u32, h: u32) -> Arc<Self> {
            let now = FixedOffset::east_opt(2 * 3600)
                .unwrap()
                .with_ymd_and_hms(y, m, d, h, 0, 0)
                .unwrap();
            Arc::new(Self(Mutex::new(now)))
        }

        fn advance(&self, by: Duration) {
            let mut guard = self.0.lock().unwrap();
            *guard += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<FixedOffset> {
            *self.0.lock().unwrap()
        }
    }

    struct FakeSource {
        posts: Vec<RawBlogPost>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn returning(titles: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                posts: titles.iter().map(|t| raw_post(t)).collect(),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                posts: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlogSource for FakeSource {
        async fn fetch_posts(&self) -> Result<Vec<RawBlogPost>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("connection refused");
            }
            Ok(self.posts.clone())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn raw_post(title: &str) -> RawBlogPost {
        RawBlogPost {
            title: title.to_string(),
            description: format!("about {title}"),
            cover_image: None,
            social_image: Some(format!("https://img/{title}.png")),
            url: format!("https://dev.to/p/{title}"),
            readable_publish_date: "Oct 1".into(),
            user: RawBlogAuthor {
                name: "Eduard".into(),
                profile_image: "https://img/me.png".into(),
            },
            tag_list: None,
        }
    }

    fn summary(title: &str) -> BlogSummary {
        BlogSummary::from(raw_post(title))
    }

    async fn seed(store: &MemoryStore, fetched_at: DateTime<FixedOffset>, titles: &[&str]) {
        let snapshot = CachedBlogSnapshot {
            fetched_at: fetched_at.with_timezone(&Utc),
            posts: titles.iter().map(|t| summary(t)).collect(),
        };
        store
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_string(&snapshot).unwrap())
            .await
            .unwrap();
    }

    async fn stored(store: &MemoryStore) -> CachedBlogSnapshot {
        let raw = store.get(DEFAULT_STORAGE_KEY).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn same_day_reads_fetch_once() {
        let store = Arc::new(MemoryStore::new());
        let source = FakeSource::returning(&["a", "b"]);
        let clock = FixedClock::at(2024, 5, 10, 9);
        let cache = BlogCache::new(store.clone(), source.clone()).with_clock(clock.clone());

        let first = cache.get_posts().await.unwrap();
        clock.advance(Duration::hours(14));
        let second = cache.get_posts().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn todays_snapshot_is_returned_without_fetching() {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(2024, 5, 10, 18);
        seed(&store, clock.now() - Duration::hours(8), &["A", "B"]).await;

        let source = FakeSource::returning(&["X"]);
        let cache = BlogCache::new(store.clone(), source.clone()).with_clock(clock);

        let posts = cache.get_posts().await.unwrap();
        assert_eq!(posts, vec![summary("A"), summary("B")]);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn old_snapshot_is_replaced_by_fresh_fetch() {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(2024, 5, 10, 12);
        seed(&store, clock.now() - Duration::days(3), &["A"]).await;

        let source = FakeSource::returning(&["X", "Y", "Z"]);
        let cache = BlogCache::new(store.clone(), source.clone()).with_clock(clock.clone());

        let posts = cache.get_posts().await.unwrap();
        let expected = vec![summary("X"), summary("Y"), summary("Z")];
        assert_eq!(posts, expected);
        assert_eq!(source.calls(), 1);

        let snapshot = stored(&store).await;
        assert_eq!(snapshot.posts, expected);
        assert_eq!(snapshot.fetched_at, clock.now().with_timezone(&Utc));
    }

    #[tokio::test]
    async fn yesterday_late_evening_counts_as_stale() {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(2024, 5, 10, 0);
        seed(&store, clock.now() - Duration::minutes(1), &["A"]).await;

        let source = FakeSource::returning(&["B"]);
        let cache = BlogCache::new(store.clone(), source.clone()).with_clock(clock);

        let posts = cache.get_posts().await.unwrap();
        assert_eq!(posts, vec![summary("B")]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_snapshot_is_a_cache_miss() {
        let store = Arc::new(MemoryStore::new());
        store.set(DEFAULT_STORAGE_KEY, "{\"date\": 42").await.unwrap();

        let source = FakeSource::returning(&["A"]);
        let cache = BlogCache::new(store.clone(), source.clone())
            .with_clock(FixedClock::at(2024, 5, 10, 12));

        let posts = cache.get_posts().await.unwrap();
        assert_eq!(posts, vec![summary("A")]);
        assert_eq!(stored(&store).await.posts, posts);
    }

    #[tokio::test]
    async fn failed_fetch_propagates_and_leaves_storage_alone() {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(2024, 5, 10, 12);
        seed(&store, clock.now() - Duration::days(1), &["old"]).await;
        let before = store.get(DEFAULT_STORAGE_KEY).await.unwrap();

        let source = FakeSource::failing();
        let cache = BlogCache::new(store.clone(), source.clone()).with_clock(clock);

        let err = cache.get_posts().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(store.get(DEFAULT_STORAGE_KEY).await.unwrap(), before);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn unusable_store_still_serves_fetched_posts() {
        let source = FakeSource::returning(&["A", "B"]);
        let cache = BlogCache::new(Arc::new(BrokenStore), source.clone())
            .with_clock(FixedClock::at(2024, 5, 10, 12));

        let posts = cache.get_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch_under_custom_key() {
        let store = Arc::new(MemoryStore::new());
        let source = FakeSource::returning(&["A"]);
        let cache = BlogCache::new(store.clone(), source.clone())
            .with_clock(FixedClock::at(2024, 5, 10, 12))
            .with_storage_key("blogs_v2");

        cache.get_posts().await.unwrap();
        assert!(store.get("blogs_v2").await.unwrap().is_some());
        assert!(store.get(DEFAULT_STORAGE_KEY).await.unwrap().is_none());

        cache.invalidate().await.unwrap();
        cache.get_posts().await.unwrap();
        assert_eq!(source.calls(), 2);
    }
}
