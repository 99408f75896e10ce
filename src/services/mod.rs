pub mod dispatch;
pub mod github;
pub mod intake;
pub mod registration;

pub use dispatch::{event_channel, spawn_event_consumer};
pub use github::{GithubApi, GithubClient, GithubError};
pub use intake::{Delivery, IntakeError, WebhookIntake};
pub use registration::{RegistrationError, RegistrationService};
