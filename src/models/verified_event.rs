use actix_web::web::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A delivery whose signature checked out against the registered secret.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    pub owner: String,
    pub name: String,
    pub event_type: String,
    pub delivery_id: Option<Uuid>,
    pub body: Bytes,
    pub received_at: DateTime<Utc>,
}

impl VerifiedEvent {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// The payload's `action` field, when the body is JSON and has one.
    pub fn action(&self) -> Option<String> {
        let payload: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        payload["action"].as_str().map(|s| s.to_string())
    }
}
