use crate::domain::model::{Post, PostId, Timestamp, UserId};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_file(&self) -> &str;
    fn window(&self) -> usize;
    fn branch_timeout(&self) -> Duration;
}

/// Where a fan-out branch fetches one followed user's recent posts from.
///
/// In-process this is the [`UserDirectory`](crate::core::directory::UserDirectory);
/// a remote data-holding process would sit behind the same trait.
#[async_trait]
pub trait PostSource: Send + Sync + 'static {
    async fn recent_posts(&self, user_id: UserId, limit: usize) -> Result<Vec<Arc<Post>>>;
}

/// The query operations exposed to transport layers. Unknown users yield
/// empty results, never errors.
#[async_trait]
pub trait PostQuery: Send + Sync {
    async fn get_timeline(&self, user_id: UserId) -> Vec<Arc<Post>>;
    async fn get_feed(&self, user_id: UserId) -> Vec<Arc<Post>>;
    async fn list_following(&self, user_id: UserId) -> Vec<UserId>;
    async fn latest_post(&self, user_id: UserId) -> Option<Arc<Post>>;
    async fn publish_post(
        &self,
        user_id: UserId,
        post_id: PostId,
        content: String,
        timestamp: Timestamp,
    ) -> Result<Arc<Post>>;
}
