use crate::core::directory::UserDirectory;
use crate::core::feed::FeedAggregator;
use crate::domain::model::{Post, PostId, Timestamp, UserId};
use crate::domain::ports::{ConfigProvider, PostQuery};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// In-process implementation of the query interface over a loaded directory.
pub struct PostService {
    directory: Arc<UserDirectory>,
    feeds: FeedAggregator<UserDirectory>,
}

impl PostService {
    pub fn new(directory: Arc<UserDirectory>, window: usize, branch_timeout: Duration) -> Self {
        let feeds = FeedAggregator::new(Arc::clone(&directory), window, branch_timeout);
        Self { directory, feeds }
    }

    pub fn from_config<C: ConfigProvider>(directory: Arc<UserDirectory>, config: &C) -> Self {
        let feeds = FeedAggregator::from_config(Arc::clone(&directory), config);
        Self { directory, feeds }
    }

    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }

    pub fn window(&self) -> usize {
        self.feeds.window()
    }
}

#[async_trait]
impl PostQuery for PostService {
    async fn get_timeline(&self, user_id: UserId) -> Vec<Arc<Post>> {
        let posts = self.directory.timeline(user_id, self.feeds.window());
        tracing::debug!("Timeline for user {}: {} posts", user_id, posts.len());
        posts
    }

    async fn get_feed(&self, user_id: UserId) -> Vec<Arc<Post>> {
        let Some(user) = self.directory.get(user_id) else {
            tracing::debug!("Feed requested for unknown user {}", user_id);
            return Vec::new();
        };

        let posts = self.feeds.aggregate(user.following()).await;
        tracing::debug!(
            "Feed for user {}: {} posts from {} followings",
            user_id,
            posts.len(),
            user.following().len()
        );
        posts
    }

    async fn list_following(&self, user_id: UserId) -> Vec<UserId> {
        self.directory.following_of(user_id)
    }

    async fn latest_post(&self, user_id: UserId) -> Option<Arc<Post>> {
        self.directory.latest_post(user_id)
    }

    async fn publish_post(
        &self,
        user_id: UserId,
        post_id: PostId,
        content: String,
        timestamp: Timestamp,
    ) -> Result<Arc<Post>> {
        let post = self
            .directory
            .add_post(Post::new(post_id, user_id, content, timestamp))?;
        tracing::info!("User {} published post {}", user_id, post_id);
        Ok(post)
    }
}
