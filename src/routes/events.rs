use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::charts::ChartUpdate;
use crate::notifications::Notification;
use crate::state::{ConsoleEvent, SharedSession};

/// `None`, after logging, when the payload does not serialize.
fn sse_event<T: serde::Serialize>(name: &str, payload: &T) -> Option<Event> {
    match serde_json::to_string(payload) {
        Ok(data) => Some(Event::default().event(name).data(data)),
        Err(e) => {
            warn!("Dropping {} event: {}", name, e);
            None
        }
    }
}

/// GET /events: SSE stream of ticks, chart redraws, lifecycle changes and
/// notifications.
pub async fn event_stream(
    State(state): State<SharedSession>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let console = BroadcastStream::new(state.events_tx.subscribe()).filter_map(|result| {
        match result {
            Ok(ConsoleEvent::Tick(frame)) => sse_event("tick", &frame).map(Ok::<_, Infallible>),
            Ok(ConsoleEvent::Lifecycle(snapshot)) => sse_event("lifecycle", &snapshot).map(Ok),
            Err(_) => None, // Skip lagged messages
        }
    });

    let charts = BroadcastStream::new(state.chart_sink.subscribe()).filter_map(
        |result: Result<ChartUpdate, _>| {
            result
                .ok()
                .and_then(|update| sse_event("chart", &update))
                .map(Ok::<_, Infallible>)
        },
    );

    let notifications = BroadcastStream::new(state.notifications.subscribe()).filter_map(
        |result: Result<Notification, _>| {
            result
                .ok()
                .and_then(|note| sse_event("notification", &note))
                .map(Ok::<_, Infallible>)
        },
    );

    Sse::new(console.merge(charts).merge(notifications)).keep_alive(KeepAlive::default())
}

/// GET /charts: current chart contents, for a client joining mid-run.
pub async fn chart_snapshot(State(state): State<SharedSession>) -> Json<Vec<ChartUpdate>> {
    Json(state.charts.read().await.snapshot())
}

/// GET /notifications: recent notifications, newest first.
pub async fn notification_history(State(state): State<SharedSession>) -> Json<serde_json::Value> {
    let entries = state.notifications.history().await;
    let total = entries.len();
    let entries: Vec<_> = entries.into_iter().rev().collect();

    Json(serde_json::json!({
        "entries": entries,
        "total": total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Serialize, Serializer};

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn test_unserializable_payload_is_dropped() {
        assert!(sse_event("tick", &Unserializable).is_none());
    }

    #[test]
    fn test_serializable_payload_becomes_event() {
        assert!(sse_event("tick", &serde_json::json!({"tick": 1})).is_some());
    }
}
