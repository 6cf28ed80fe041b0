use crate::domain::model::{Post, PostId, Timestamp, UserId};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

/// Heap entry ordered by recency.
///
/// Equal timestamps fall back to author id, then post id, so every snapshot
/// has one total order and repeated reads agree.
#[derive(Debug, Clone)]
struct ByRecency(Arc<Post>);

impl ByRecency {
    fn key(&self) -> (&Timestamp, UserId, PostId) {
        (&self.0.timestamp, self.0.user_id, self.0.post_id)
    }
}

impl PartialEq for ByRecency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ByRecency {}

impl Ord for ByRecency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for ByRecency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of posts by recency: the top is always the newest post held.
///
/// Used as a user's own bucket, so it keeps the author's full history.
/// Post ids are unique within a heap.
#[derive(Debug, Default)]
pub struct BoundedRecencyHeap {
    heap: BinaryHeap<ByRecency>,
    ids: HashSet<PostId>,
}

impl BoundedRecencyHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false, leaving the heap untouched, if the post id is already held.
    pub fn insert(&mut self, post: Arc<Post>) -> bool {
        if !self.ids.insert(post.post_id) {
            return false;
        }
        self.heap.push(ByRecency(post));
        true
    }

    pub fn contains(&self, post_id: PostId) -> bool {
        self.ids.contains(&post_id)
    }

    pub fn peek_top(&self) -> Option<Arc<Post>> {
        self.heap.peek().map(|entry| Arc::clone(&entry.0))
    }

    pub fn pop(&mut self) -> Option<Arc<Post>> {
        let entry = self.heap.pop()?;
        self.ids.remove(&entry.0.post_id);
        Some(entry.0)
    }

    /// Up to `n` newest posts, newest first, leaving the heap as it was.
    ///
    /// Pops then reinserts, so this costs O(n log len) and needs `&mut self`;
    /// callers sharing a heap must hold its lock for the whole call.
    pub fn take_recent(&mut self, n: usize) -> Vec<Arc<Post>> {
        let mut recent = Vec::with_capacity(n.min(self.heap.len()));
        while recent.len() < n {
            match self.heap.pop() {
                Some(entry) => recent.push(entry),
                None => break,
            }
        }

        let out = recent.iter().map(|entry| Arc::clone(&entry.0)).collect();
        self.heap.extend(recent);
        out
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Scratch heap for merging feeds: keeps at most `capacity` posts and its top
/// is the *oldest* one kept, so a newer candidate evicts it in O(log n).
#[derive(Debug)]
pub struct FeedHeap {
    heap: BinaryHeap<Reverse<ByRecency>>,
    capacity: usize,
}

impl FeedHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
        }
    }

    /// Offers a candidate; returns whether it was kept.
    pub fn offer(&mut self, post: Arc<Post>) -> bool {
        if self.capacity == 0 {
            return false;
        }

        let candidate = ByRecency(post);
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
            return true;
        }

        match self.heap.peek() {
            Some(Reverse(worst)) if candidate > *worst => {
                self.heap.pop();
                self.heap.push(Reverse(candidate));
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains the heap, newest first. Each kept post comes out exactly once.
    pub fn into_newest_first(mut self) -> Vec<Arc<Post>> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(entry)) = self.heap.pop() {
            out.push(entry.0);
        }
        out.reverse();
        out
    }
}
