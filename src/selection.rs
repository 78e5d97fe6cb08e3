//! Preview and selection state machine.
//!
//! Two orthogonal pieces of state:
//!
//! - **Preview**: at most one uncommitted object held locally with its own
//!   visual node. It is corrected into valid ranges before every re-render and
//!   written to the store on commit.
//! - **Selection**: at most one placed object, identified by name plus the
//!   chunk that owns it (deletes are routed by chunk).
//!
//! Store writes are fire-and-forget. Each returns a [`RequestId`] kept in a
//! pending map; settlements arrive through the event queue and failures become
//! user notices. Nothing is rolled back locally: the authoritative remote
//! state drives the scene.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::chunk::{ChunkCoord, ChunkGrid};
use crate::geom::{Rect, Vector};
use crate::node::ObjectNode;
use crate::notify::Notices;
use crate::object::{ObjectName, ObjectRecord};
use crate::render::{NodeId, SceneGraph};
use crate::store::{RemoteStore, RequestId, StoreError};
use crate::streaming::ChunkStreamer;

/// Name of the preview node under the preview layer.
pub const PREVIEW_NODE: &str = "preview";

/// The uncommitted object being placed.
#[derive(Debug)]
pub struct Preview {
    record: ObjectRecord,
    node: ObjectNode,
}

impl Preview {
    #[must_use]
    pub fn record(&self) -> &ObjectRecord {
        &self.record
    }

    #[must_use]
    pub fn node(&self) -> &ObjectNode {
        &self.node
    }
}

/// Reference to the selected placed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    pub chunk: ChunkCoord,
    pub name: ObjectName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationKind {
    Place,
    Move,
    Delete,
}

impl MutationKind {
    fn verb(self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::Move => "move",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone)]
struct PendingMutation {
    kind: MutationKind,
    name: ObjectName,
}

/// Preview + selection state and the store writes they issue.
#[derive(Debug)]
pub struct SelectionState {
    preview: Option<Preview>,
    selected: Option<Selected>,
    pending: HashMap<RequestId, PendingMutation>,
    bounds: Rect,
    outline: bool,
}

impl SelectionState {
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self { preview: None, selected: None, pending: HashMap::new(), bounds, outline: true }
    }

    // --- Preview ---

    /// Start previewing `template`, replacing any existing preview. Touches
    /// no store.
    pub fn begin_preview<G: SceneGraph>(&mut self, scene: &mut G, layer: NodeId, template: ObjectRecord) {
        self.cancel_preview(scene);
        let mut record = template;
        record.correct(&self.bounds);
        let node = ObjectNode::spawn(scene, layer, PREVIEW_NODE, &record, 0);
        self.preview = Some(Preview { record, node });
    }

    /// Clamp the preview into valid ranges. Returns false without a preview.
    pub fn correct_preview(&mut self) -> bool {
        let Some(preview) = self.preview.as_mut() else {
            return false;
        };
        preview.record.correct(&self.bounds);
        true
    }

    /// Mutate the preview record, correct it, and re-render its node.
    pub fn update_preview<G: SceneGraph>(&mut self, scene: &mut G, f: impl FnOnce(&mut ObjectRecord)) -> bool {
        let Some(preview) = self.preview.as_mut() else {
            return false;
        };
        f(&mut preview.record);
        preview.record.correct(&self.bounds);
        preview.node.apply(scene, &preview.record);
        true
    }

    /// Write the corrected preview into the chunk containing it under a fresh
    /// name. The preview stays in place for further placements (or a retry).
    /// Returns the new name, or `None` without a preview.
    pub fn commit_preview<S: RemoteStore>(&mut self, store: &mut S, grid: &ChunkGrid) -> Option<ObjectName> {
        let preview = self.preview.as_mut()?;
        preview.record.correct(&self.bounds);
        let name = Uuid::new_v4().to_string();
        let chunk = grid.coord_of(preview.record.position());
        let request = store.put_object(chunk, &name, &preview.record);
        debug!(%request, chunk = %chunk, name = %name, "placing object");
        self.pending.insert(request, PendingMutation { kind: MutationKind::Place, name: name.clone() });
        Some(name)
    }

    /// Destroy the preview node. No-op without a preview.
    pub fn cancel_preview<G: SceneGraph>(&mut self, scene: &mut G) -> bool {
        match self.preview.take() {
            Some(preview) => {
                preview.node.destroy(scene);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    // --- Selection ---

    /// Select the object `name` of `chunk`, replacing any selection. Returns
    /// false if no such object is materialized.
    pub fn select<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        streamer: &mut ChunkStreamer,
        chunk: ChunkCoord,
        name: &str,
    ) -> bool {
        if streamer.object(chunk, name).is_none() {
            return false;
        }
        self.deselect(scene, streamer);
        if let Some(node) = streamer.object_mut(chunk, name) {
            node.set_selected(scene, true, self.outline);
        }
        self.selected = Some(Selected { chunk, name: name.to_owned() });
        true
    }

    /// Remove selection styling and clear the selection. No-op without one.
    pub fn deselect<G: SceneGraph>(&mut self, scene: &mut G, streamer: &mut ChunkStreamer) -> bool {
        let Some(selected) = self.selected.take() else {
            return false;
        };
        if let Some(node) = streamer.object_mut(selected.chunk, &selected.name) {
            node.set_selected(scene, false, self.outline);
        }
        true
    }

    /// Deselect, then ask the store to delete the object from its chunk.
    /// Returns whether a deletion was requested.
    pub fn delete_selected<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        streamer: &mut ChunkStreamer,
        store: &mut S,
    ) -> bool {
        let Some(selected) = self.selected.clone() else {
            debug!("delete with nothing selected");
            return false;
        };
        self.deselect(scene, streamer);
        let request = store.delete_object(selected.chunk, &selected.name);
        debug!(%request, chunk = %selected.chunk, name = %selected.name, "deleting object");
        self.pending.insert(request, PendingMutation { kind: MutationKind::Delete, name: selected.name });
        true
    }

    /// Write the selected object at `pos` (clamped into the world). When the
    /// owning chunk changes the object is written to the new chunk and
    /// deleted from the old one, and the selection follows it.
    pub fn move_selected<S: RemoteStore>(&mut self, streamer: &ChunkStreamer, store: &mut S, pos: Vector) -> bool {
        let Some(selected) = self.selected.as_mut() else {
            return false;
        };
        let Some(node) = streamer.object(selected.chunk, &selected.name) else {
            return false;
        };
        let mut record = node.record().clone();
        record.set_position(pos);
        record.correct(&self.bounds);
        let target = streamer.grid().coord_of(record.position());

        let put = store.put_object(target, &selected.name, &record);
        self.pending.insert(put, PendingMutation { kind: MutationKind::Move, name: selected.name.clone() });
        if target != selected.chunk {
            let delete = store.delete_object(selected.chunk, &selected.name);
            self.pending.insert(delete, PendingMutation { kind: MutationKind::Move, name: selected.name.clone() });
            debug!(from = %selected.chunk, to = %target, name = %selected.name, "moving object across chunks");
            selected.chunk = target;
        }
        true
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Selected> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_selected(&self, chunk: ChunkCoord, name: &str) -> bool {
        self.selected.as_ref().is_some_and(|s| s.chunk == chunk && s.name == name)
    }

    /// Drop the selection without restyling (its node is already gone).
    pub fn forget_selection(&mut self) {
        self.selected = None;
    }

    /// Re-apply selection styling if the selected node was rebuilt (for
    /// example after moving into another chunk).
    pub fn restyle_selected<G: SceneGraph>(&self, scene: &mut G, streamer: &mut ChunkStreamer) {
        let Some(selected) = self.selected.as_ref() else {
            return;
        };
        if let Some(node) = streamer.object_mut(selected.chunk, &selected.name) {
            if !node.is_selected() {
                node.set_selected(scene, true, self.outline);
            }
        }
    }

    /// Whether newly selected objects get a select box.
    pub fn set_outline<G: SceneGraph>(&mut self, scene: &mut G, streamer: &mut ChunkStreamer, outline: bool) {
        self.outline = outline;
        if let Some(selected) = self.selected.as_ref() {
            if let Some(node) = streamer.object_mut(selected.chunk, &selected.name) {
                node.set_selected(scene, true, outline);
            }
        }
    }

    // --- Store settlements ---

    /// Match a write/delete settlement to its request. Failures raise a
    /// notice; unknown requests are ignored.
    pub fn settle(&mut self, request: RequestId, result: Result<(), StoreError>, notices: &mut Notices) -> bool {
        let Some(pending) = self.pending.remove(&request) else {
            debug!(%request, "settlement for unknown request");
            return false;
        };
        match result {
            Ok(()) => debug!(%request, name = %pending.name, "mutation settled"),
            Err(err) => notices.push_error(format!("Failed to {} object! ({err})", pending.kind.verb())),
        }
        true
    }

    /// Writes still awaiting settlement.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
