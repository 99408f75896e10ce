use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::{AsyncCommands, Script};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::store::{with_timeout, HookStore, StoreError, HOOKS_KEY, REPOS_KEY};
use crate::models::{HookRecord, NewRegistration, RepoRecord};

// KEYS[1] hooks hash, KEYS[2] repos hash
// ARGV[1] token, ARGV[2] hook json, ARGV[3] repo field, ARGV[4] repo json
// Returns {written, replaced repo json or ''}.
const REGISTER_SCRIPT: &str = r#"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 1 then
    return {0, ''}
end
local previous = redis.call('HGET', KEYS[2], ARGV[3])
if previous then
    local ok, record = pcall(cjson.decode, previous)
    if ok and type(record) == 'table' and record.HookPath then
        redis.call('HDEL', KEYS[1], record.HookPath)
    end
else
    previous = ''
end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
redis.call('HSET', KEYS[2], ARGV[3], ARGV[4])
return {1, previous}
"#;

/// [`HookStore`] on two Redis hashes, `repos` and `hooks`, with JSON values.
pub struct RedisHookStore {
    pool: Pool,
    timeout: Duration,
    register: Script,
}

impl RedisHookStore {
    pub fn new(pool: Pool, timeout: Duration) -> Self {
        RedisHookStore {
            pool,
            timeout,
            register: Script::new(REGISTER_SCRIPT),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        hash: &str,
        field: &str,
    ) -> Result<Option<T>, StoreError> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.hget(hash, field).await?;

        match value {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn exists(&self, token: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let exists: bool = conn.hexists(HOOKS_KEY, token).await?;
        Ok(exists)
    }

    async fn write_pair(
        &self,
        registration: &NewRegistration,
    ) -> Result<Option<RepoRecord>, StoreError> {
        let hook_json = serde_json::to_string(&registration.hook_record())?;
        let repo_json = serde_json::to_string(&registration.repo_record())?;
        let repo_field = RepoRecord::key(&registration.owner, &registration.name);

        let mut conn = self.pool.get().await?;
        let mut invocation = self.register.prepare_invoke();
        invocation
            .key(HOOKS_KEY)
            .key(REPOS_KEY)
            .arg(&registration.token)
            .arg(&hook_json)
            .arg(&repo_field)
            .arg(&repo_json);
        let (written, replaced): (i64, String) = invocation.invoke_async(&mut conn).await?;

        if written == 0 {
            return Err(StoreError::Conflict);
        }
        if replaced.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&replaced)?))
    }
}

#[async_trait]
impl HookStore for RedisHookStore {
    async fn get_repo_info(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepoRecord>, StoreError> {
        let field = RepoRecord::key(owner, name);
        with_timeout(self.timeout, self.fetch::<RepoRecord>(REPOS_KEY, &field)).await
    }

    async fn get_hook_info(&self, token: &str) -> Result<HookRecord, StoreError> {
        with_timeout(self.timeout, self.fetch::<HookRecord>(HOOKS_KEY, token))
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn hook_exists(&self, token: &str) -> Result<bool, StoreError> {
        with_timeout(self.timeout, self.exists(token)).await
    }

    async fn register_hook(
        &self,
        registration: &NewRegistration,
    ) -> Result<Option<RepoRecord>, StoreError> {
        with_timeout(self.timeout, self.write_pair(registration)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use crate::utils::secret;

    async fn store() -> RedisHookStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let pool = create_pool(&url, 2, Duration::from_secs(2)).await.unwrap();
        RedisHookStore::new(pool, Duration::from_secs(2))
    }

    fn registration(name: &str, token: &str, hook_id: i64) -> NewRegistration {
        NewRegistration {
            owner: "hookline-test".to_string(),
            name: name.to_string(),
            token: token.to_string(),
            secret: secret::generate(40),
            hook_id,
            access_token: "gho_abc123".to_string(),
        }
    }

    #[tokio::test]
    #[ignore = "needs Redis: REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored"]
    async fn test_register_lookup_and_rotate() {
        let store = store().await;
        let name = secret::generate(12);
        let first = registration(&name, &secret::generate(20), 1);
        let second = registration(&name, &secret::generate(20), 2);

        assert!(store.register_hook(&first).await.unwrap().is_none());
        let hook = store.get_hook_info(&first.token).await.unwrap();
        assert_eq!(hook.secret, first.secret);
        let repo = store
            .get_repo_info("hookline-test", &name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repo.hook_path, first.token);
        assert_eq!(repo.hook_id, 1);

        let mut clash = registration("someone-else", &first.token, 3);
        clash.owner = "other".to_string();
        assert!(matches!(
            store.register_hook(&clash).await,
            Err(StoreError::Conflict)
        ));

        let replaced = store.register_hook(&second).await.unwrap().unwrap();
        assert_eq!(replaced.hook_path, first.token);
        assert_eq!(replaced.hook_id, 1);
        assert!(store
            .get_hook_info(&first.token)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.hook_exists(&second.token).await.unwrap());
    }
}
