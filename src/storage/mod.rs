//! Durable key-value surface used to persist the conversation list and the
//! theme preference.

mod file;
mod memory;
mod redis;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use self::redis::RedisKeyValueStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error as ThisError;
use crate::cli::Args;

/// Key holding the serialized conversation list.
pub const CONVERSATIONS_KEY: &str = "chat";
/// Key holding the theme token.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

pub fn create_key_value_store(
    args: &Args
) -> Result<Arc<dyn KeyValueStore>, Box<dyn Error + Send + Sync>> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => Ok(Arc::new(FileKeyValueStore::new(&args.storage_path))),
        "redis" => {
            let store = RedisKeyValueStore::new(&args.storage_host, &args.storage_prefix)?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemoryKeyValueStore::new())),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported storage type: {}", args.storage_type)
                    )
                )
            ),
    }
}

pub fn initialize_key_value_store(
    args: &Args
) -> Result<Arc<dyn KeyValueStore>, Box<dyn Error + Send + Sync>> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => info!("Conversations will be stored in file: {}", args.storage_path),
        "redis" => info!("Conversations will be stored in redis at {}", args.storage_host),
        other => info!("Conversations will be stored in: {}", other),
    }
    create_key_value_store(args)
}
