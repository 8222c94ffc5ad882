//! Fan-out of one serialized message to every registered connection.

use crate::client::ConnectionId;
use crate::registry::{SharedRegistry, Snapshot};
use log::{debug, warn};
use std::time::Instant;

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Connections whose writer was gone or whose queue was full. Each has
    /// been asked to close.
    pub failed: Vec<ConnectionId>,
}

/// Queues `message` on every connection in `snapshot`.
///
/// A failed connection is closed through its own shutdown signal, so its
/// handler removes it from the registry exactly as it would after an abrupt
/// disconnect. The remaining connections are unaffected.
pub fn dispatch(message: &str, snapshot: &Snapshot) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for (client, _) in snapshot {
        match client.send(message) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("{}, scheduling disconnect", e);
                client.close();
                report.failed.push(client.id);
            }
        }
    }

    report
}

/// Takes a snapshot and dispatches to it. The registry lock is released
/// before anything is sent.
pub async fn broadcast(registry: &SharedRegistry, message: &str) -> BroadcastReport {
    let started = Instant::now();
    let snapshot = registry.read().await.snapshot();
    let report = dispatch(message, &snapshot);

    debug!(
        "Broadcast to {} of {} connections took {:?}",
        report.delivered,
        snapshot.len(),
        started.elapsed()
    );
    report
}
