use crate::core::user::User;
use crate::domain::model::{DirectorySummary, Post, UserId};
use crate::domain::ports::PostSource;
use crate::utils::error::{AggregatorError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of every user, built once at startup and then shared behind an
/// `Arc`. After construction only post insertion mutates it.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<UserId, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user. Ids must be unique.
    pub fn insert_user(&mut self, user: User) -> Result<()> {
        let user_id = user.user_id();
        if self.users.contains_key(&user_id) {
            return Err(AggregatorError::DatasetError {
                message: format!("duplicate user id {}", user_id),
            });
        }
        self.users.insert(user_id, user);
        Ok(())
    }

    /// Records that `follower` reads from `followee`.
    ///
    /// Returns false without linking when either id is unknown or the edge
    /// already exists, so the directory never holds a dangling reference.
    pub fn link_follow(&mut self, follower: UserId, followee: UserId) -> bool {
        if !self.users.contains_key(&followee) {
            return false;
        }
        let linked = match self.users.get_mut(&follower) {
            Some(user) => user.follow(followee),
            None => return false,
        };
        if linked {
            if let Some(target) = self.users.get_mut(&followee) {
                target.add_follower(follower);
            }
        }
        linked
    }

    pub fn get(&self, user_id: UserId) -> Option<&User> {
        self.users.get(&user_id)
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Files a post in its author's own bucket. Post ids are unique per author.
    pub fn add_post(&self, post: Post) -> Result<Arc<Post>> {
        let author = self
            .users
            .get(&post.user_id)
            .ok_or(AggregatorError::UnknownUser {
                user_id: post.user_id,
            })?;
        let post = Arc::new(post);
        if !author.add_post(Arc::clone(&post)) {
            return Err(AggregatorError::DuplicatePost {
                user_id: post.user_id,
                post_id: post.post_id,
            });
        }
        Ok(post)
    }

    /// A user's own newest posts; empty for unknown users.
    pub fn timeline(&self, user_id: UserId, n: usize) -> Vec<Arc<Post>> {
        self.users
            .get(&user_id)
            .map(|user| user.recent_posts(n))
            .unwrap_or_default()
    }

    pub fn following_of(&self, user_id: UserId) -> Vec<UserId> {
        self.users
            .get(&user_id)
            .map(|user| user.following().to_vec())
            .unwrap_or_default()
    }

    pub fn latest_post(&self, user_id: UserId) -> Option<Arc<Post>> {
        self.users
            .get(&user_id)
            .and_then(|user| user.latest_post_by(user_id))
    }

    pub fn summary(&self) -> DirectorySummary {
        self.users.values().fold(DirectorySummary::default(), |mut acc, user| {
            acc.users += 1;
            acc.posts += user.post_count();
            acc.follow_edges += user.following().len();
            acc
        })
    }
}

#[async_trait]
impl PostSource for UserDirectory {
    async fn recent_posts(&self, user_id: UserId, limit: usize) -> Result<Vec<Arc<Post>>> {
        let user = self
            .users
            .get(&user_id)
            .ok_or(AggregatorError::UnknownUser { user_id })?;
        Ok(user.recent_posts(limit))
    }
}
