use std::env;
use std::time::Duration;

/// Where registrations live. `Memory` loses them on restart and is meant for
/// local runs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub redis_pool_size: usize,
    pub store_timeout: Duration,
    pub public_url: String,
    pub github_api_url: String,
    pub max_payload_bytes: usize,
    pub event_queue_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let store_backend = match env::var("HOOK_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("redis") | Err(_) => StoreBackend::Redis,
            Ok(_) => return Err(ConfigError::InvalidStoreBackend),
        };
        let redis_url = match (env::var("REDIS_URL"), store_backend) {
            (Ok(url), _) => url,
            (Err(_), StoreBackend::Memory) => String::new(),
            (Err(_), StoreBackend::Redis) => return Err(ConfigError::MissingRedisUrl),
        };

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            store_backend,
            redis_url,
            redis_pool_size: parse_or("REDIS_POOL_SIZE", 10),
            store_timeout: Duration::from_secs(parse_or("STORE_TIMEOUT_SECS", 5)),
            public_url: env::var("PUBLIC_URL")
                .map_err(|_| ConfigError::MissingPublicUrl)?
                .trim_end_matches('/')
                .to_string(),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            max_payload_bytes: parse_or("MAX_PAYLOAD_BYTES", 5 * 1024 * 1024),
            event_queue_capacity: parse_or("EVENT_QUEUE_CAPACITY", 256),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("REDIS_URL environment variable is required")]
    MissingRedisUrl,
    #[error("PUBLIC_URL environment variable is required")]
    MissingPublicUrl,
    #[error("HOOK_STORE must be either \"redis\" or \"memory\"")]
    InvalidStoreBackend,
    #[error("Invalid PORT value")]
    InvalidPort,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8787,
            store_backend: StoreBackend::Redis,
            redis_url: "redis://127.0.0.1/".to_string(),
            redis_pool_size: 10,
            store_timeout: Duration::from_secs(5),
            public_url: "https://hooks.example.com".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            max_payload_bytes: 1024,
            event_queue_capacity: 8,
        }
    }

    #[test]
    fn test_server_address() {
        assert_eq!(config().server_address(), "127.0.0.1:8787");
    }
}
