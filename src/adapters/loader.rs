use crate::core::directory::UserDirectory;
use crate::core::user::User;
use crate::domain::model::{rfc3339, Dataset, Post, PostRecord, UserId};
use crate::domain::ports::Storage;
use crate::utils::error::{AggregatorError, Result};

/// What happened while turning a dataset into a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub users: usize,
    pub posts_loaded: usize,
    pub posts_skipped: usize,
    pub follows_dropped: usize,
}

/// Reads a JSON dataset through a [`Storage`] backend and builds the directory.
pub struct DirectoryLoader<S: Storage> {
    storage: S,
}

impl<S: Storage> DirectoryLoader<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Unreadable or malformed input fails the whole load; a bad post, a
    /// repeated post id or a dangling follow edge is only skipped.
    pub async fn load(&self, path: &str) -> Result<(UserDirectory, LoadReport)> {
        tracing::debug!("Reading dataset from {}", path);
        let bytes = self.storage.read_file(path).await?;
        let dataset: Dataset = serde_json::from_slice(&bytes)?;
        let (directory, report) = build_directory(dataset)?;

        tracing::info!(
            "Loaded {} users, {} posts ({} skipped, {} follow edges dropped)",
            report.users,
            report.posts_loaded,
            report.posts_skipped,
            report.follows_dropped
        );
        Ok((directory, report))
    }
}

pub fn build_directory(dataset: Dataset) -> Result<(UserDirectory, LoadReport)> {
    let mut directory = UserDirectory::new();
    let mut report = LoadReport::default();

    // Every user must exist before any follow edge can be resolved.
    for record in &dataset.users {
        directory.insert_user(User::new(record.user_id, record.user_name.clone()))?;
        report.users += 1;
    }

    for record in dataset.users {
        for followee in record.following {
            if !directory.contains(followee) {
                tracing::warn!(
                    "Dropping follow edge {} -> {}: unknown user",
                    record.user_id,
                    followee
                );
                report.follows_dropped += 1;
                continue;
            }
            directory.link_follow(record.user_id, followee);
        }

        for post in record.posts {
            let added = to_post(record.user_id, post).and_then(|post| directory.add_post(post));
            match added {
                Ok(_) => report.posts_loaded += 1,
                Err(
                    e @ (AggregatorError::InvalidTimestamp { .. }
                    | AggregatorError::DuplicatePost { .. }),
                ) => {
                    tracing::warn!("Skipping post of user {}: {}", record.user_id, e);
                    report.posts_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok((directory, report))
}

fn to_post(author: UserId, record: PostRecord) -> Result<Post> {
    let timestamp =
        rfc3339::parse(&record.timestamp).map_err(|e| AggregatorError::InvalidTimestamp {
            post_id: record.post_id,
            value: record.timestamp.clone(),
            reason: e.to_string(),
        })?;
    Ok(Post::new(record.post_id, author, record.content, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::UserRecord;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    struct MemoryStorage {
        files: HashMap<String, Vec<u8>>,
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.get(path).cloned().ok_or_else(|| {
                AggregatorError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }
    }

    fn storage_with(path: &str, json: &str) -> MemoryStorage {
        MemoryStorage {
            files: HashMap::from([(path.to_string(), json.as_bytes().to_vec())]),
        }
    }

    fn record(user_id: UserId, following: Vec<UserId>, posts: Vec<(i32, &str)>) -> UserRecord {
        UserRecord {
            user_id,
            user_name: format!("user{}", user_id),
            following,
            posts: posts
                .into_iter()
                .map(|(post_id, ts)| PostRecord {
                    post_id,
                    content: format!("post {}", post_id),
                    timestamp: ts.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_forward_follow_references_resolve() {
        // user 1 follows user 2, which appears later in the file
        let dataset = Dataset {
            users: vec![record(1, vec![2], vec![]), record(2, vec![1], vec![])],
        };
        let (dir, report) = build_directory(dataset).unwrap();

        assert_eq!(dir.following_of(1), vec![2]);
        assert_eq!(dir.following_of(2), vec![1]);
        assert_eq!(report.follows_dropped, 0);
    }

    #[test]
    fn test_bad_timestamp_skips_only_that_post() {
        let dataset = Dataset {
            users: vec![record(
                1,
                vec![],
                vec![
                    (1, "2024-01-01T09:00:00Z"),
                    (2, "not a time"),
                    (3, "2024-01-01T11:00:00+01:00"),
                ],
            )],
        };
        let (dir, report) = build_directory(dataset).unwrap();

        assert_eq!(report.posts_loaded, 2);
        assert_eq!(report.posts_skipped, 1);
        let ids: Vec<_> = dir.timeline(1, 20).iter().map(|p| p.post_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_repeated_post_id_keeps_first_and_skips_rest() {
        let dataset = Dataset {
            users: vec![record(
                1,
                vec![],
                vec![
                    (1, "2024-01-01T09:00:00Z"),
                    (1, "2024-01-01T12:00:00Z"),
                    (2, "2024-01-01T10:00:00Z"),
                ],
            )],
        };
        let (dir, report) = build_directory(dataset).unwrap();

        assert_eq!(report.posts_loaded, 2);
        assert_eq!(report.posts_skipped, 1);
        let stamps: Vec<_> = dir
            .timeline(1, 20)
            .iter()
            .map(|p| (p.post_id, rfc3339::format(&p.timestamp)))
            .collect();
        assert_eq!(
            stamps,
            vec![
                (2, "2024-01-01T10:00:00Z".to_string()),
                (1, "2024-01-01T09:00:00Z".to_string())
            ]
        );
    }

    #[test]
    fn test_dangling_follow_is_dropped() {
        let dataset = Dataset {
            users: vec![record(1, vec![2, 99, 2], vec![]), record(2, vec![], vec![])],
        };
        let (dir, report) = build_directory(dataset).unwrap();

        assert_eq!(dir.following_of(1), vec![2]);
        assert_eq!(report.follows_dropped, 1);
    }

    #[test]
    fn test_duplicate_user_fails_load() {
        let dataset = Dataset {
            users: vec![record(1, vec![], vec![]), record(1, vec![], vec![])],
        };
        assert_err!(build_directory(dataset));
    }

    #[tokio::test]
    async fn test_load_through_storage() {
        let json = r#"{"users": [
            {"user_id": 1, "user_name": "alice", "following": [2],
             "posts": [{"post_id": 1, "content": "hi", "timestamp": "2024-01-01T09:00:00Z"}]},
            {"user_id": 2, "user_name": "bob"}
        ]}"#;
        let loader = DirectoryLoader::new(storage_with("data.json", json));

        let (dir, report) = assert_ok!(loader.load("data.json").await);
        assert_eq!(dir.len(), 2);
        assert_eq!(report.posts_loaded, 1);
        assert_eq!(dir.get(1).unwrap().user_name(), "alice");
    }

    #[tokio::test]
    async fn test_load_failures_are_fatal() {
        let loader = DirectoryLoader::new(storage_with("data.json", "{ not json"));
        assert!(matches!(
            loader.load("data.json").await,
            Err(AggregatorError::SerializationError(_))
        ));
        assert!(matches!(
            loader.load("missing.json").await,
            Err(AggregatorError::IoError(_))
        ));
    }
}
