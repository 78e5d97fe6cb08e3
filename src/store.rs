//! Remote store seam.
//!
//! The realtime database is an external collaborator. The core issues
//! requests through [`RemoteStore`] and never waits: every call returns an id
//! at once, and the outcome re-enters later as an
//! [`EditorEvent`](crate::events::EditorEvent) tagged with that id.
//!
//! DESIGN
//! ======
//! Chunk subscriptions are identified by a fresh [`SubscriptionId`] per load.
//! Unloading a chunk forgets its id, so data that arrives after an unload is
//! recognised as stale and dropped. One-shot requests (writes and lookups)
//! use [`RequestId`] so their settlements can be matched to pending work.
//!
//! [`RecordingStore`] keeps a log of calls without talking to anything. It
//! backs headless hosts and tests; replies are injected through the event
//! queue by whoever drives it.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::fmt;

use crate::chunk::ChunkCoord;
use crate::object::ObjectRecord;

/// Handle of a live chunk subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Handle of a one-shot store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Failure reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("request timed out")]
    Timeout,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Other(String),
}

/// Requests the editor core issues against the realtime store.
pub trait RemoteStore {
    /// Start streaming the objects of `chunk`. The first reply is a full
    /// snapshot; upserts and removals follow in arrival order.
    fn subscribe_chunk(&mut self, chunk: ChunkCoord) -> SubscriptionId;

    /// Stop a chunk stream. Unknown ids are ignored.
    fn unsubscribe(&mut self, subscription: SubscriptionId);

    /// Write `record` under `name` inside `chunk`.
    fn put_object(&mut self, chunk: ChunkCoord, name: &str, record: &ObjectRecord) -> RequestId;

    /// Delete the object `name` from `chunk`.
    fn delete_object(&mut self, chunk: ChunkCoord, name: &str) -> RequestId;

    /// Look up who placed the object `name`.
    fn fetch_placed_by(&mut self, name: &str) -> RequestId;

    /// Look up the display colour configured by `username`.
    fn fetch_display_color(&mut self, username: &str) -> RequestId;
}

/// Store path of a chunk's object map.
#[must_use]
pub fn chunk_path(chunk: ChunkCoord) -> String {
    format!("chunks/{chunk}")
}

/// Store path holding the username that placed `name`.
#[must_use]
pub fn placed_by_path(name: &str) -> String {
    format!("userPlaced/{name}")
}

/// Store path holding a user's display colour. Usernames are case-folded.
#[must_use]
pub fn display_color_path(username: &str) -> String {
    format!("userName/{}/displayColor", username.to_lowercase())
}

// =============================================================
// Recording store
// =============================================================

/// One call received by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Subscribe { chunk: ChunkCoord, subscription: SubscriptionId },
    Unsubscribe { subscription: SubscriptionId },
    Put { request: RequestId, chunk: ChunkCoord, name: String, record: ObjectRecord },
    Delete { request: RequestId, chunk: ChunkCoord, name: String },
    FetchPlacedBy { request: RequestId, name: String },
    FetchDisplayColor { request: RequestId, username: String },
}

/// A [`RemoteStore`] that only records what it was asked to do.
#[derive(Debug, Default, Clone)]
pub struct RecordingStore {
    calls: Vec<StoreCall>,
    next_id: u64,
}

impl RecordingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call in the order received.
    #[must_use]
    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    /// Forget the call log. Ids keep increasing.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Subscription id of the most recent subscribe for `chunk`.
    #[must_use]
    pub fn subscription_for(&self, chunk: ChunkCoord) -> Option<SubscriptionId> {
        self.calls.iter().rev().find_map(|call| match call {
            StoreCall::Subscribe { chunk: c, subscription } if *c == chunk => Some(*subscription),
            _ => None,
        })
    }

    /// Chunks subscribed so far, in call order.
    #[must_use]
    pub fn subscribed_chunks(&self) -> Vec<ChunkCoord> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Subscribe { chunk, .. } => Some(*chunk),
                _ => None,
            })
            .collect()
    }

    /// Number of placed-by and display-colour lookups issued.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, StoreCall::FetchPlacedBy { .. } | StoreCall::FetchDisplayColor { .. }))
            .count()
    }

    /// Number of object writes and deletions issued.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, StoreCall::Put { .. } | StoreCall::Delete { .. }))
            .count()
    }

    /// The most recent call, if any.
    #[must_use]
    pub fn last_call(&self) -> Option<&StoreCall> {
        self.calls.last()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl RemoteStore for RecordingStore {
    fn subscribe_chunk(&mut self, chunk: ChunkCoord) -> SubscriptionId {
        let subscription = SubscriptionId(self.next());
        self.calls.push(StoreCall::Subscribe { chunk, subscription });
        subscription
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.calls.push(StoreCall::Unsubscribe { subscription });
    }

    fn put_object(&mut self, chunk: ChunkCoord, name: &str, record: &ObjectRecord) -> RequestId {
        let request = RequestId(self.next());
        self.calls.push(StoreCall::Put { request, chunk, name: name.to_owned(), record: record.clone() });
        request
    }

    fn delete_object(&mut self, chunk: ChunkCoord, name: &str) -> RequestId {
        let request = RequestId(self.next());
        self.calls.push(StoreCall::Delete { request, chunk, name: name.to_owned() });
        request
    }

    fn fetch_placed_by(&mut self, name: &str) -> RequestId {
        let request = RequestId(self.next());
        self.calls.push(StoreCall::FetchPlacedBy { request, name: name.to_owned() });
        request
    }

    fn fetch_display_color(&mut self, username: &str) -> RequestId {
        let request = RequestId(self.next());
        self.calls.push(StoreCall::FetchDisplayColor { request, username: username.to_owned() });
        request
    }
}
