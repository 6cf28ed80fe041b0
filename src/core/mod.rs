pub mod directory;
pub mod feed;
pub mod heap;
pub mod service;
pub mod user;

pub use crate::domain::model::{Post, PostId, Timestamp, UserId};
pub use crate::domain::ports::{ConfigProvider, PostQuery, PostSource, Storage};
pub use crate::utils::error::Result;
