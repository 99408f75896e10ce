pub mod memory_store;
pub mod pool;
pub mod redis_store;
pub mod store;

pub use memory_store::MemoryHookStore;
pub use pool::create_pool;
pub use redis_store::RedisHookStore;
pub use store::{HookStore, StoreError};
