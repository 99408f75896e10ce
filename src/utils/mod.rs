pub mod auth;
pub mod secret;
pub mod signature;

pub use auth::access_token;
pub use signature::{verify_github_signature, SignatureError};
