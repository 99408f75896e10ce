use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts};
use std::time::Duration;

/// Builds the shared Redis pool.
///
/// Checkout waits up to `timeout` for a released connection instead of
/// failing as soon as the pool is exhausted.
pub async fn create_pool(
    redis_url: &str,
    max_connections: usize,
    timeout: Duration,
) -> Result<Pool, anyhow::Error> {
    let mut config = Config::from_url(redis_url);
    config.pool = Some(PoolConfig {
        max_size: max_connections,
        timeouts: Timeouts {
            wait: Some(timeout),
            create: Some(timeout),
            recycle: Some(timeout),
        },
        ..PoolConfig::default()
    });

    let pool = config.create_pool(Some(Runtime::Tokio1))?;

    // Fail at startup rather than on the first delivery.
    let mut conn = pool.get().await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    Ok(pool)
}
