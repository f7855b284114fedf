//! Server-Sent Events for real-time pose updates

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use super::PoseSnapshot;
use crate::AppState;

/// Create an SSE stream of `pose` events
pub fn create_pose_stream(
    app_state: Arc<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.subscribe_snapshots();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(snapshot) => snapshot_to_event(&snapshot).map(Ok),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert a snapshot to an SSE event
fn snapshot_to_event(snapshot: &PoseSnapshot) -> Option<Event> {
    match Event::default().event("pose").json_data(snapshot) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Failed to serialize pose snapshot {}: {}", snapshot.sequence, e);
            None
        }
    }
}
