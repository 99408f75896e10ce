pub mod repositories;
pub mod webhook;

pub use repositories::{hook_status, install_hook, list_repositories, repository_detail};
pub use webhook::receive_hook;
