pub mod hook;
pub mod repository;

pub use hook::{CreateHook, Hook, HookConfig, HOOK_EVENTS};
pub use repository::Repository;
