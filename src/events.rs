//! Event queue for store callbacks.
//!
//! Store replies never touch editor state directly. They are posted as
//! [`EditorEvent`]s into an unbounded channel and drained by the next
//! [`EditorCore::tick`](crate::engine::EditorCore::tick) in arrival order, so
//! every mutation of camera, chunks, selection and tooltip happens on the
//! tick/input path.
//!
//! The channel is tokio's unbounded mpsc. Only the non-blocking halves are
//! used (`send` and `try_recv`), so no runtime is required.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::object::{ObjectName, ObjectRecord};
use crate::store::{RequestId, StoreError, SubscriptionId};

/// A store callback re-entering the editor core.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Full contents of a chunk; always the first reply to a subscription.
    ChunkSnapshot { subscription: SubscriptionId, objects: Vec<(ObjectName, ObjectRecord)> },
    /// An object was added or changed inside a subscribed chunk.
    ObjectUpserted { subscription: SubscriptionId, name: ObjectName, record: ObjectRecord },
    /// An object was removed from a subscribed chunk.
    ObjectRemoved { subscription: SubscriptionId, name: ObjectName },
    /// A write or delete finished.
    MutationSettled { request: RequestId, result: Result<(), StoreError> },
    /// Placed-by lookup finished; `None` when nothing is recorded.
    PlacedByResolved { request: RequestId, result: Result<Option<String>, StoreError> },
    /// Display-colour lookup finished with the raw `"RR GG BB"` value.
    DisplayColorResolved { request: RequestId, result: Result<Option<String>, StoreError> },
}

/// Cloneable handle store callbacks use to post events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<EditorEvent>,
}

impl EventSender {
    /// Post an event. Returns false once the editor has been dropped.
    pub fn send(&self, event: EditorEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Receiving end, owned by the editor core.
#[derive(Debug)]
pub struct EventQueue {
    tx: UnboundedSender<EditorEvent>,
    rx: UnboundedReceiver<EditorEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender { tx: self.tx.clone() }
    }

    /// Everything posted since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
