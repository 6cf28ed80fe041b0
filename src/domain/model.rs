use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub type UserId = i32;
pub type PostId = i32;

/// Wall-clock timestamp with its UTC offset, ordered by instant.
pub type Timestamp = DateTime<FixedOffset>;

/// A published post. Never mutated after construction, so it is shared
/// behind an `Arc` between the author's bucket and any feed being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: PostId,
    /// Author id.
    pub user_id: UserId,
    pub content: String,
    #[serde(with = "rfc3339")]
    pub timestamp: Timestamp,
}

impl Post {
    pub fn new(post_id: PostId, user_id: UserId, content: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            post_id,
            user_id,
            content: content.into(),
            timestamp,
        }
    }
}

/// Top-level shape of the dataset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub user_name: String,
    #[serde(default)]
    pub following: Vec<UserId>,
    #[serde(default)]
    pub posts: Vec<PostRecord>,
}

/// A post as it appears in the dataset; the timestamp is still raw text
/// so a single bad value can be skipped instead of failing the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: PostId,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectorySummary {
    pub users: usize,
    pub posts: usize,
    pub follow_edges: usize,
}

/// RFC 3339 text encoding used on every interface (`Z` for UTC offsets).
pub mod rfc3339 {
    use super::Timestamp;
    use chrono::{DateTime, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Result<Timestamp, chrono::ParseError> {
        DateTime::parse_from_rfc3339(value)
    }

    pub fn format(ts: &Timestamp) -> String {
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
