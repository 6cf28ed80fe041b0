use crate::core::heap::FeedHeap;
use crate::domain::model::{Post, UserId};
use crate::domain::ports::{ConfigProvider, PostSource};
use crate::utils::error::AggregatorError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_BRANCH_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Builds a user's feed by fanning out one task per followed user and
/// merging every branch into a single bounded, newest-first window.
///
/// Branches run in parallel and only serialize on the shared [`FeedHeap`].
/// A branch that errors or exceeds `branch_timeout` contributes no posts;
/// the rest of the feed is still returned.
pub struct FeedAggregator<S: PostSource> {
    source: Arc<S>,
    window: usize,
    branch_timeout: Duration,
}

impl<S: PostSource> FeedAggregator<S> {
    pub fn new(source: Arc<S>, window: usize, branch_timeout: Duration) -> Self {
        Self {
            source,
            window,
            branch_timeout,
        }
    }

    pub fn from_config<C: ConfigProvider>(source: Arc<S>, config: &C) -> Self {
        Self::new(source, config.window(), config.branch_timeout())
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn branch_timeout(&self) -> Duration {
        self.branch_timeout
    }

    pub async fn aggregate(&self, following: &[UserId]) -> Vec<Arc<Post>> {
        if following.is_empty() || self.window == 0 {
            return Vec::new();
        }

        let merged = Arc::new(Mutex::new(FeedHeap::with_capacity(self.window)));
        let mut branches = JoinSet::new();

        for &user_id in following {
            let source = Arc::clone(&self.source);
            let merged = Arc::clone(&merged);
            let window = self.window;
            let budget = self.branch_timeout;

            branches.spawn(async move {
                let posts = fetch_branch(source.as_ref(), user_id, window, budget).await;
                let offered = posts.len();

                let mut heap = merged.lock().unwrap_or_else(PoisonError::into_inner);
                let kept = posts.into_iter().filter(|post| heap.offer(Arc::clone(post))).count();
                tracing::debug!(
                    "Feed branch for user {} merged {} of {} posts",
                    user_id,
                    kept,
                    offered
                );
            });
        }

        // Barrier: the window is drained only after every branch finished.
        while let Some(joined) = branches.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Feed branch aborted: {}", e);
            }
        }

        let heap = std::mem::replace(
            &mut *merged.lock().unwrap_or_else(PoisonError::into_inner),
            FeedHeap::with_capacity(0),
        );
        heap.into_newest_first()
    }
}

async fn fetch_branch<S: PostSource>(
    source: &S,
    user_id: UserId,
    limit: usize,
    budget: Duration,
) -> Vec<Arc<Post>> {
    match timeout(budget, source.recent_posts(user_id, limit)).await {
        Ok(Ok(posts)) => posts,
        Ok(Err(e)) => {
            tracing::warn!("Skipping feed branch for user {}: {}", user_id, e);
            Vec::new()
        }
        Err(_) => {
            let e = AggregatorError::BranchTimeout {
                user_id,
                timeout_ms: budget.as_millis() as u64,
            };
            tracing::warn!("Skipping feed branch: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::rfc3339;
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockSource {
        posts: HashMap<UserId, Vec<Arc<Post>>>,
        delays: HashMap<UserId, Duration>,
        failing: Vec<UserId>,
        hanging: Vec<UserId>,
    }

    impl MockSource {
        fn with_posts(mut self, user_id: UserId, stamps: &[&str]) -> Self {
            let posts = stamps
                .iter()
                .enumerate()
                .map(|(i, ts)| {
                    Arc::new(Post::new(
                        i as i32 + 1,
                        user_id,
                        format!("{}-{}", user_id, i + 1),
                        rfc3339::parse(ts).unwrap(),
                    ))
                })
                .collect();
            self.posts.insert(user_id, posts);
            self
        }
    }

    #[async_trait]
    impl PostSource for MockSource {
        async fn recent_posts(&self, user_id: UserId, limit: usize) -> Result<Vec<Arc<Post>>> {
            if let Some(delay) = self.delays.get(&user_id) {
                tokio::time::sleep(*delay).await;
            }
            if self.hanging.contains(&user_id) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(&user_id) {
                return Err(AggregatorError::UnknownUser { user_id });
            }
            let mut posts = self.posts.get(&user_id).cloned().unwrap_or_default();
            posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            posts.truncate(limit);
            Ok(posts)
        }
    }

    fn labels(posts: &[Arc<Post>]) -> Vec<String> {
        posts.iter().map(|p| p.content.clone()).collect()
    }

    fn aggregator(source: MockSource) -> FeedAggregator<MockSource> {
        FeedAggregator::new(Arc::new(source), DEFAULT_WINDOW, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_merges_followings_newest_first() {
        let source = MockSource::default()
            .with_posts(2, &["2024-01-01T10:00:00Z", "2024-01-01T09:00:00Z"])
            .with_posts(3, &["2024-01-01T10:30:00Z"]);

        let feed = aggregator(source).aggregate(&[2, 3]).await;
        assert_eq!(labels(&feed), vec!["3-1", "2-1", "2-2"]);
    }

    #[tokio::test]
    async fn test_no_followings_is_empty() {
        let feed = aggregator(MockSource::default()).aggregate(&[]).await;
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_window_bounds_merged_result() {
        let stamps_a: Vec<String> = (0..30)
            .map(|i| format!("2024-01-01T00:{:02}:00Z", i * 2))
            .collect();
        let stamps_b: Vec<String> = (0..30)
            .map(|i| format!("2024-01-01T00:{:02}:00Z", i * 2 + 1))
            .collect();
        let a: Vec<&str> = stamps_a.iter().map(String::as_str).collect();
        let b: Vec<&str> = stamps_b.iter().map(String::as_str).collect();
        let source = MockSource::default().with_posts(2, &a).with_posts(3, &b);

        let feed = aggregator(source).aggregate(&[2, 3]).await;

        assert_eq!(feed.len(), DEFAULT_WINDOW);
        assert!(feed.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert_eq!(rfc3339::format(&feed[0].timestamp), "2024-01-01T00:59:00Z");
        assert_eq!(rfc3339::format(&feed[19].timestamp), "2024-01-01T00:40:00Z");
    }

    #[tokio::test]
    async fn test_result_is_independent_of_completion_order() {
        let build = |slow: UserId, fast: UserId| {
            let mut source = MockSource::default()
                .with_posts(2, &["2024-01-01T10:00:00Z", "2024-01-01T08:00:00Z"])
                .with_posts(3, &["2024-01-01T09:00:00Z", "2024-01-01T07:00:00Z"])
                .with_posts(4, &["2024-01-01T11:00:00Z"]);
            source.delays.insert(slow, Duration::from_millis(40));
            source.delays.insert(fast, Duration::from_millis(1));
            FeedAggregator::new(Arc::new(source), 3, Duration::from_secs(1))
        };

        let first = build(2, 3).aggregate(&[2, 3, 4]).await;
        let second = build(3, 2).aggregate(&[4, 3, 2]).await;

        assert_eq!(labels(&first), vec!["4-1", "2-1", "3-1"]);
        assert_eq!(labels(&first), labels(&second));
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_same_window_across_branch_orders() {
        let build = |delays: &[(UserId, u64)]| {
            let mut source = MockSource::default();
            for user_id in 2..=8 {
                source = source.with_posts(user_id, &["2024-01-01T10:00:00Z"; 3]);
            }
            for &(user_id, ms) in delays {
                source.delays.insert(user_id, Duration::from_millis(ms));
            }
            FeedAggregator::new(Arc::new(source), 5, Duration::from_secs(1))
        };
        let ids = |posts: &[Arc<Post>]| -> Vec<(UserId, i32)> {
            posts.iter().map(|p| (p.user_id, p.post_id)).collect()
        };

        let highest_last = build(&[(8, 40), (7, 30), (6, 20), (5, 10)])
            .aggregate(&[2, 3, 4, 5, 6, 7, 8])
            .await;
        let highest_first = build(&[(2, 40), (3, 30), (4, 20), (5, 10)])
            .aggregate(&[8, 7, 6, 5, 4, 3, 2])
            .await;
        let interleaved = build(&[(3, 35), (8, 25), (5, 15), (7, 5)])
            .aggregate(&[5, 8, 2, 7, 4, 3, 6])
            .await;

        assert_eq!(
            ids(&highest_last),
            vec![(8, 3), (8, 2), (8, 1), (7, 3), (7, 2)]
        );
        assert_eq!(ids(&highest_last), ids(&highest_first));
        assert_eq!(ids(&highest_last), ids(&interleaved));
    }

    #[tokio::test]
    async fn test_failed_branch_contributes_nothing() {
        let mut source = MockSource::default()
            .with_posts(2, &["2024-01-01T10:00:00Z"])
            .with_posts(3, &["2024-01-01T11:00:00Z"]);
        source.failing.push(3);

        let feed = aggregator(source).aggregate(&[2, 3]).await;
        assert_eq!(labels(&feed), vec!["2-1"]);
    }

    #[tokio::test]
    async fn test_hung_branch_times_out() {
        let mut source = MockSource::default()
            .with_posts(2, &["2024-01-01T10:00:00Z"])
            .with_posts(3, &["2024-01-01T11:00:00Z"]);
        source.hanging.push(3);

        let aggregator = FeedAggregator::new(Arc::new(source), 20, Duration::from_millis(50));
        let feed = timeout(Duration::from_secs(5), aggregator.aggregate(&[2, 3]))
            .await
            .expect("aggregation must not hang");
        assert_eq!(labels(&feed), vec!["2-1"]);
    }

    #[tokio::test]
    async fn test_zero_window_returns_nothing() {
        let source = MockSource::default().with_posts(2, &["2024-01-01T10:00:00Z"]);
        let aggregator = FeedAggregator::new(Arc::new(source), 0, DEFAULT_BRANCH_TIMEOUT);
        assert!(aggregator.aggregate(&[2]).await.is_empty());
    }
}
