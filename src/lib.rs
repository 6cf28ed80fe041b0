pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::{cli::LocalStorage, toml_config::TomlConfig, Settings};

pub use adapters::loader::{build_directory, DirectoryLoader, LoadReport};
pub use core::{
    directory::UserDirectory, feed::FeedAggregator, heap::BoundedRecencyHeap, service::PostService,
    user::User,
};
pub use domain::model::{Dataset, Post, PostRecord, UserRecord};
pub use domain::ports::{PostQuery, PostSource};
pub use utils::error::{AggregatorError, Result};
