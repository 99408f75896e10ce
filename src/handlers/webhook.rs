use crate::services::{Delivery, IntakeError, WebhookIntake};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use uuid::Uuid;

/// Receives a GitHub delivery on its per-repository capability path.
///
/// `X-Hub-Signature-256` is checked when present. `X-Hub-Signature` is used
/// when the SHA-256 header is absent or cannot be decoded.
pub async fn receive_hook(
    req: HttpRequest,
    body: web::Bytes,
    path: web::Path<String>,
    intake: web::Data<WebhookIntake>,
) -> Result<HttpResponse> {
    let token = path.into_inner();

    let event_type = header(&req, "X-GitHub-Event")
        .ok_or_else(|| actix_web::error::ErrorBadRequest("Missing X-GitHub-Event header"))?;

    let delivery_id = header(&req, "X-GitHub-Delivery").and_then(|s| Uuid::parse_str(s).ok());

    let delivery = Delivery {
        token: &token,
        event_type,
        signature: header(&req, "X-Hub-Signature"),
        signature_256: header(&req, "X-Hub-Signature-256"),
        delivery_id,
        body,
    };

    match intake.handle(delivery).await {
        Ok(event) => {
            log::info!(
                "Received {} event for {} (delivery: {})",
                event.event_type,
                event.full_name(),
                display_delivery(delivery_id)
            );
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "status": "received"
            })))
        }
        Err(e) => Ok(rejection(e, delivery_id)),
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|h| h.to_str().ok())
}

fn display_delivery(delivery_id: Option<Uuid>) -> String {
    delivery_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

// Unknown paths and bad signatures share one response so the endpoint cannot
// be used to probe for registered tokens.
fn rejection(err: IntakeError, delivery_id: Option<Uuid>) -> HttpResponse {
    let delivery = display_delivery(delivery_id);

    if err.is_rejection() {
        match &err {
            IntakeError::UnknownHook => {
                log::warn!("Rejected delivery {delivery}: unknown hook path")
            }
            IntakeError::SignatureMismatch { owner, name } => {
                log::warn!("Rejected delivery {delivery} for {owner}/{name}: signature mismatch")
            }
            other => log::warn!("Rejected delivery {delivery}: {other}"),
        }
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": "Not found"
        }));
    }

    log::error!("Failed to accept delivery {delivery}: {err}");
    match err {
        IntakeError::DispatchUnavailable => HttpResponse::ServiceUnavailable().json(
            serde_json::json!({
                "error": "Event queue unavailable"
            }),
        ),
        _ => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Failed to look up hook"
        })),
    }
}
