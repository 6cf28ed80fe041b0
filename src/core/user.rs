use crate::core::heap::BoundedRecencyHeap;
use crate::domain::model::{Post, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A user record owned by the [`UserDirectory`](crate::core::directory::UserDirectory).
///
/// Relationships are plain ids resolved through the directory. Posts live in
/// one bucket per author id; in practice a user only holds their own.
#[derive(Debug)]
pub struct User {
    user_id: UserId,
    user_name: String,
    buckets: Mutex<HashMap<UserId, BoundedRecencyHeap>>,
    following: Vec<UserId>,
    followers: Vec<UserId>,
}

impl User {
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            buckets: Mutex::new(HashMap::new()),
            following: Vec::new(),
            followers: Vec::new(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn following(&self) -> &[UserId] {
        &self.following
    }

    pub fn followers(&self) -> &[UserId] {
        &self.followers
    }

    /// Returns false if the edge already existed.
    pub(crate) fn follow(&mut self, user_id: UserId) -> bool {
        if self.following.contains(&user_id) {
            return false;
        }
        self.following.push(user_id);
        true
    }

    pub(crate) fn add_follower(&mut self, user_id: UserId) {
        if !self.followers.contains(&user_id) {
            self.followers.push(user_id);
        }
    }

    // A panic while holding the lock cannot leave a heap half-rebuilt:
    // take_recent never unwinds between its pops and reinserts.
    fn buckets(&self) -> MutexGuard<'_, HashMap<UserId, BoundedRecencyHeap>> {
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Files the post under its author's bucket. Returns false if that
    /// author already has a post with the same id.
    pub fn add_post(&self, post: Arc<Post>) -> bool {
        self.buckets().entry(post.user_id).or_default().insert(post)
    }

    /// Up to `n` newest posts by `author_id`, newest first. Non-destructive
    /// and atomic with respect to other readers and writers of this user.
    pub fn recent_posts_by(&self, author_id: UserId, n: usize) -> Vec<Arc<Post>> {
        self.buckets()
            .get_mut(&author_id)
            .map(|bucket| bucket.take_recent(n))
            .unwrap_or_default()
    }

    pub fn recent_posts(&self, n: usize) -> Vec<Arc<Post>> {
        self.recent_posts_by(self.user_id, n)
    }

    pub fn latest_post_by(&self, author_id: UserId) -> Option<Arc<Post>> {
        self.buckets().get(&author_id).and_then(|bucket| bucket.peek_top())
    }

    pub fn post_count(&self) -> usize {
        self.buckets().values().map(BoundedRecencyHeap::len).sum()
    }
}
