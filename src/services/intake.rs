use actix_web::web::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::{HookStore, StoreError};
use crate::models::VerifiedEvent;
use crate::utils::{verify_github_signature, SignatureError};

/// One inbound callback, as received on `/hooks/{token}`.
#[derive(Debug)]
pub struct Delivery<'a> {
    pub token: &'a str,
    pub event_type: &'a str,
    /// `X-Hub-Signature` (`sha1=`).
    pub signature: Option<&'a str>,
    /// `X-Hub-Signature-256` (`sha256=`), checked first when present.
    pub signature_256: Option<&'a str>,
    pub delivery_id: Option<Uuid>,
    pub body: Bytes,
}

/// Authenticates callbacks against their registered secret and hands the
/// survivors to the event queue.
pub struct WebhookIntake {
    store: Arc<dyn HookStore>,
    events: mpsc::Sender<VerifiedEvent>,
}

impl WebhookIntake {
    pub fn new(store: Arc<dyn HookStore>, events: mpsc::Sender<VerifiedEvent>) -> Self {
        WebhookIntake { store, events }
    }

    pub async fn handle(&self, delivery: Delivery<'_>) -> Result<VerifiedEvent, IntakeError> {
        let hook = self
            .store
            .get_hook_info(delivery.token)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    IntakeError::UnknownHook
                } else {
                    IntakeError::Store(e)
                }
            })?;

        if !verify_delivery(&hook.secret, &delivery)? {
            return Err(IntakeError::SignatureMismatch {
                owner: hook.owner,
                name: hook.name,
            });
        }

        let event = VerifiedEvent {
            owner: hook.owner,
            name: hook.name,
            event_type: delivery.event_type.to_string(),
            delivery_id: delivery.delivery_id,
            body: delivery.body,
            received_at: Utc::now(),
        };

        self.events
            .send(event.clone())
            .await
            .map_err(|_| IntakeError::DispatchUnavailable)?;

        Ok(event)
    }
}

// A `sha256=` value that cannot be decoded falls back to the `sha1=` header;
// a decodable one that does not match is final.
fn verify_delivery(secret: &str, delivery: &Delivery<'_>) -> Result<bool, IntakeError> {
    match (delivery.signature_256, delivery.signature) {
        (None, None) => Err(IntakeError::MissingSignature),
        (None, Some(sha1)) => Ok(verify_github_signature(secret, &delivery.body, sha1)?),
        (Some(sha256), fallback) => match verify_github_signature(secret, &delivery.body, sha256) {
            Ok(matched) => Ok(matched),
            Err(e) => match fallback {
                Some(sha1) => {
                    log::debug!("Undecodable X-Hub-Signature-256 ({e}), checking X-Hub-Signature");
                    Ok(verify_github_signature(secret, &delivery.body, sha1)?)
                }
                None => Err(e.into()),
            },
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("No hook registered for this path")]
    UnknownHook,
    #[error("Delivery carries no signature")]
    MissingSignature,
    #[error("Malformed signature: {0}")]
    MalformedSignature(#[from] SignatureError),
    #[error("Signature does not match the secret registered for {owner}/{name}")]
    SignatureMismatch { owner: String, name: String },
    #[error("Store error: {0}")]
    Store(StoreError),
    #[error("Event queue is closed")]
    DispatchUnavailable,
}

impl IntakeError {
    /// Authentication failures, as opposed to faults on our side.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            IntakeError::UnknownHook
                | IntakeError::MissingSignature
                | IntakeError::MalformedSignature(_)
                | IntakeError::SignatureMismatch { .. }
        )
    }
}
