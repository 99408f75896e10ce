use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::VerifiedEvent;

pub fn event_channel(
    capacity: usize,
) -> (mpsc::Sender<VerifiedEvent>, mpsc::Receiver<VerifiedEvent>) {
    mpsc::channel(capacity.max(1))
}

/// Drains verified events off the queue until every sender is gone.
pub fn spawn_event_consumer(mut events: mpsc::Receiver<VerifiedEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            process_event(&event);
        }
        log::info!("Event queue closed, consumer exiting");
    })
}

fn process_event(event: &VerifiedEvent) {
    let queued = Utc::now() - event.received_at;
    log::debug!(
        "Dequeued {} event after {}ms",
        event.event_type,
        queued.num_milliseconds()
    );

    let delivery = event
        .delivery_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    match event.action() {
        Some(action) => log::info!(
            "Verified {} ({action}) event for {} (delivery: {delivery}, {} bytes)",
            event.event_type,
            event.full_name(),
            event.body.len()
        ),
        None => log::info!(
            "Verified {} event for {} (delivery: {delivery}, {} bytes)",
            event.event_type,
            event.full_name(),
            event.body.len()
        ),
    }
}
