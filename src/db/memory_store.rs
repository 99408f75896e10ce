use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::store::{HookStore, StoreError};
use crate::models::{HookRecord, NewRegistration, RepoRecord};

#[derive(Default)]
struct Tables {
    repos: HashMap<String, RepoRecord>,
    hooks: HashMap<String, HookRecord>,
}

/// In-process [`HookStore`], used in tests and local runs without Redis.
#[derive(Default)]
pub struct MemoryHookStore {
    tables: Mutex<Tables>,
}

impl MemoryHookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HookStore for MemoryHookStore {
    async fn get_repo_info(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepoRecord>, StoreError> {
        Ok(self.lock().repos.get(&RepoRecord::key(owner, name)).cloned())
    }

    async fn get_hook_info(&self, token: &str) -> Result<HookRecord, StoreError> {
        self.lock()
            .hooks
            .get(token)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn hook_exists(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.lock().hooks.contains_key(token))
    }

    async fn register_hook(
        &self,
        registration: &NewRegistration,
    ) -> Result<Option<RepoRecord>, StoreError> {
        let mut tables = self.lock();

        if tables.hooks.contains_key(&registration.token) {
            return Err(StoreError::Conflict);
        }

        let key = RepoRecord::key(&registration.owner, &registration.name);
        let replaced = tables.repos.insert(key, registration.repo_record());
        if let Some(replaced) = &replaced {
            tables.hooks.remove(&replaced.hook_path);
        }
        tables
            .hooks
            .insert(registration.token.clone(), registration.hook_record());

        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(token: &str, hook_id: i64) -> NewRegistration {
        NewRegistration {
            owner: "acme".to_string(),
            name: "widgets".to_string(),
            token: token.to_string(),
            secret: format!("secret-{hook_id}"),
            hook_id,
            access_token: "gho_abc123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_lookup() {
        let store = MemoryHookStore::new();
        store
            .register_hook(&registration("tokenA", 42))
            .await
            .unwrap();

        let hook = store.get_hook_info("tokenA").await.unwrap();
        assert_eq!(hook.owner, "acme");
        assert_eq!(hook.name, "widgets");
        assert_eq!(hook.secret, "secret-42");

        let repo = store.get_repo_info("acme", "widgets").await.unwrap().unwrap();
        assert_eq!(repo.hook_path, "tokenA");
        assert_eq!(repo.hook_id, 42);
        assert_eq!(repo.access_token, "gho_abc123");
        assert!(store.hook_exists("tokenA").await.unwrap());
    }

    #[tokio::test]
    async fn test_unregistered_repo_is_absent() {
        let store = MemoryHookStore::new();

        assert!(store.get_repo_info("acme", "widgets").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let store = MemoryHookStore::new();

        let err = store.get_hook_info("nonexistent-token").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.hook_exists("nonexistent-token").await.unwrap());
    }

    #[tokio::test]
    async fn test_conflicting_token_is_rejected() {
        let store = MemoryHookStore::new();
        store
            .register_hook(&registration("tokenA", 1))
            .await
            .unwrap();

        let mut other = registration("tokenA", 2);
        other.owner = "mallory".to_string();
        let err = store.register_hook(&other).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.get_hook_info("tokenA").await.unwrap().owner, "acme");
        assert!(store.get_repo_info("mallory", "widgets").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reregistration_retires_old_token() {
        let store = MemoryHookStore::new();
        let first = store
            .register_hook(&registration("tokenA", 1))
            .await
            .unwrap();
        let replaced = store
            .register_hook(&registration("tokenB", 2))
            .await
            .unwrap()
            .unwrap();

        assert!(first.is_none());
        assert_eq!(replaced.hook_path, "tokenA");
        assert_eq!(replaced.hook_id, 1);

        assert!(store.get_hook_info("tokenA").await.unwrap_err().is_not_found());
        assert_eq!(store.get_hook_info("tokenB").await.unwrap().secret, "secret-2");
        assert_eq!(
            store.get_repo_info("acme", "widgets").await.unwrap().unwrap().hook_id,
            2
        );
    }
}
