use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::models::{HookRecord, NewRegistration, RepoRecord};

/// Name of the hash holding `owner:name` -> [`RepoRecord`].
pub const REPOS_KEY: &str = "repos";
/// Name of the hash holding callback token -> [`HookRecord`].
pub const HOOKS_KEY: &str = "hooks";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No hook registered for this token")]
    NotFound,
    #[error("Hook token is already registered")]
    Conflict,
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Durable registry of repositories and their callback tokens.
///
/// Every call goes to the backing store; nothing is cached in process.
#[async_trait]
pub trait HookStore: Send + Sync {
    /// `Ok(None)` when the repository was never registered.
    async fn get_repo_info(&self, owner: &str, name: &str)
        -> Result<Option<RepoRecord>, StoreError>;

    /// Fails with [`StoreError::NotFound`] for an unknown token.
    async fn get_hook_info(&self, token: &str) -> Result<HookRecord, StoreError>;

    async fn hook_exists(&self, token: &str) -> Result<bool, StoreError>;

    /// Writes the hook and repo records as one unit.
    ///
    /// Fails with [`StoreError::Conflict`] without writing anything when the
    /// token is already taken. A previous registration of the same repository
    /// loses its token and is returned, read inside the same atomic write.
    async fn register_hook(
        &self,
        registration: &NewRegistration,
    ) -> Result<Option<RepoRecord>, StoreError>;
}

/// Bounds a store call so an unreachable store cannot block a worker forever.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
}
