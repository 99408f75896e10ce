pub mod github;
pub mod registration;
pub mod verified_event;

pub use registration::{HookRecord, NewRegistration, RepoRecord};
pub use verified_event::VerifiedEvent;
