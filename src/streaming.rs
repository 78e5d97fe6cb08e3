//! Chunk streaming: visible set, reconcile, load/unload, idle eviction.
//!
//! Every grid cell gets a hidden container node up front. Only contents
//! stream: a chunk entering the visible set while unloaded subscribes to the
//! store, and a chunk that stays out of view past the idle threshold is torn
//! down by the periodic sweep.
//!
//! DESIGN
//! ======
//! Leaving the visible set only hides a chunk. Unloading is deferred to the
//! sweep, so panning back and forth over a boundary does not churn
//! subscriptions.
//!
//! Store updates carry the subscription id of the load that requested them.
//! The id is forgotten on unload, so late data for a chunk that has since been
//! unloaded (or reloaded under a new id) is dropped.
//!
//! TRADE-OFFS
//! ==========
//! Object nodes live under their chunk container so hiding a chunk is a single
//! visibility flip. Draw order `(z_order, insertion)` is therefore only sorted
//! among siblings by the scene graph; cross-chunk ordering is left to a host
//! layer that groups object nodes. Hit testing applies the global order.

#[cfg(test)]
#[path = "streaming_test.rs"]
mod streaming_test;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use crate::camera::Camera;
use crate::chunk::{Chunk, ChunkCoord, ChunkGrid, ChunkState};
use crate::config::EditorConfig;
use crate::geom::Vector;
use crate::hit::{self, Hit};
use crate::node::ObjectNode;
use crate::object::{ObjectName, ObjectRecord};
use crate::render::{DrawOrder, NodeId, NodeSpec, SceneGraph};
use crate::store::{RemoteStore, SubscriptionId};

/// Which object classes are hidden or marked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityFilter {
    pub hide_deco: bool,
    pub show_danger: bool,
    pub deco_ids: BTreeSet<u32>,
    pub danger_ids: BTreeSet<u32>,
}

impl VisibilityFilter {
    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            hide_deco: false,
            show_danger: false,
            deco_ids: config.deco_object_ids.clone(),
            danger_ids: config.danger_object_ids.clone(),
        }
    }

    /// Whether an object of this record is drawn at all.
    #[must_use]
    pub fn is_shown(&self, record: &ObjectRecord) -> bool {
        !(self.hide_deco && self.deco_ids.contains(&record.id))
    }

    /// Whether an object of this record carries the danger marker.
    #[must_use]
    pub fn is_marked(&self, record: &ObjectRecord) -> bool {
        self.show_danger && self.danger_ids.contains(&record.id)
    }

    fn restyle<G: SceneGraph>(&self, scene: &mut G, node: &ObjectNode) {
        node.set_visible(scene, self.is_shown(node.record()));
        node.set_danger_marker(scene, self.is_marked(node.record()));
    }
}

/// Owns every chunk and keeps their contents in step with the viewport.
#[derive(Debug)]
pub struct ChunkStreamer {
    grid: ChunkGrid,
    world: NodeId,
    chunks: BTreeMap<ChunkCoord, Chunk>,
    visible: BTreeSet<ChunkCoord>,
    subscriptions: HashMap<SubscriptionId, ChunkCoord>,
    next_insertion: u64,
    last_sweep: Option<f64>,
    idle_unload_ms: f64,
    sweep_interval_ms: f64,
    filter: VisibilityFilter,
}

impl ChunkStreamer {
    /// Create the world container under `parent` and a hidden placeholder
    /// container for every grid cell.
    pub fn new<G: SceneGraph>(scene: &mut G, parent: NodeId, config: &EditorConfig) -> Self {
        let grid = ChunkGrid::new(config.bounds, config.chunk_size);
        let world = scene.add_child(parent, NodeSpec::container("world"));
        scene.set_draw_order(world, DrawOrder { z: 0, insertion: 0 });
        let chunks = grid
            .iter()
            .map(|coord| {
                let container = scene.add_child(world, NodeSpec::container(coord.to_string()));
                scene.set_visible(container, false);
                (coord, Chunk::new(coord, container))
            })
            .collect();
        Self {
            grid,
            world,
            chunks,
            visible: BTreeSet::new(),
            subscriptions: HashMap::new(),
            next_insertion: 0,
            last_sweep: None,
            idle_unload_ms: config.idle_unload_ms,
            sweep_interval_ms: config.sweep_interval_ms,
            filter: VisibilityFilter::from_config(config),
        }
    }

    // --- Visible set ---

    /// Chunks overlapping the viewport: corners projected through the
    /// camera, normalised, clamped to the world, then every overlapping cell.
    #[must_use]
    pub fn compute_visible_set(&self, camera: &Camera, viewport: Vector) -> BTreeSet<ChunkCoord> {
        self.grid.cells_overlapping(&camera.visible_world_rect(viewport))
    }

    /// Recompute the visible set for the camera and reconcile against it.
    pub fn update_visible<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        store: &mut S,
        camera: &Camera,
        viewport: Vector,
        now: f64,
    ) {
        let next = self.compute_visible_set(camera, viewport);
        self.reconcile(scene, store, next, now);
    }

    /// Hide chunks that left the set, show (and load if unloaded) chunks that
    /// entered it, and stamp every chunk in either set as seen at `now`. The
    /// idle clock of a hidden chunk therefore starts when it leaves view.
    /// Reconciling the same set twice changes nothing but the timestamps.
    pub fn reconcile<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        store: &mut S,
        next: BTreeSet<ChunkCoord>,
        now: f64,
    ) {
        for coord in self.visible.difference(&next) {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.visible = false;
                chunk.last_time_visible = now;
                scene.set_visible(chunk.container, false);
            }
        }
        let entered: Vec<ChunkCoord> = next.difference(&self.visible).copied().collect();
        for coord in &entered {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.visible = true;
                scene.set_visible(chunk.container, true);
            }
        }
        self.visible = next;
        for coord in &self.visible {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.last_time_visible = now;
            }
        }
        for coord in entered {
            self.load(store, coord);
        }
    }

    // --- Load / unload ---

    /// Subscribe to an unloaded chunk. Returns false if the chunk is unknown
    /// or already loading/loaded.
    pub fn load<S: RemoteStore>(&mut self, store: &mut S, coord: ChunkCoord) -> bool {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if chunk.state != ChunkState::Unloaded {
            return false;
        }
        let subscription = store.subscribe_chunk(coord);
        chunk.state = ChunkState::Loading;
        chunk.subscription = Some(subscription);
        self.subscriptions.insert(subscription, coord);
        info!(chunk = %coord, subscription = subscription.0, "chunk load requested");
        true
    }

    /// Cancel the subscription and destroy every object node. Refused for
    /// chunks in the visible set and for chunks already unloaded.
    pub fn unload<G: SceneGraph, S: RemoteStore>(&mut self, scene: &mut G, store: &mut S, coord: ChunkCoord) -> bool {
        if self.visible.contains(&coord) {
            debug!(chunk = %coord, "refusing to unload visible chunk");
            return false;
        }
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if chunk.state == ChunkState::Unloaded {
            return false;
        }
        if let Some(subscription) = chunk.subscription.take() {
            store.unsubscribe(subscription);
            self.subscriptions.remove(&subscription);
        }
        for (_, node) in std::mem::take(&mut chunk.objects) {
            node.destroy(scene);
        }
        chunk.state = ChunkState::Unloaded;
        debug!(chunk = %coord, "chunk unloaded");
        true
    }

    /// Unload every chunk that is out of view, not yet unloaded, and unseen
    /// for longer than the idle threshold. Returns how many were unloaded.
    pub fn sweep_idle<G: SceneGraph, S: RemoteStore>(&mut self, scene: &mut G, store: &mut S, now: f64) -> usize {
        let idle: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|c| !c.visible && c.state != ChunkState::Unloaded && now - c.last_time_visible > self.idle_unload_ms)
            .map(|c| c.coord)
            .collect();
        let unloaded = idle.into_iter().filter(|coord| self.unload(scene, store, *coord)).count();
        if unloaded > 0 {
            info!(unloaded, "unloaded idle chunks");
        }
        unloaded
    }

    /// Run [`Self::sweep_idle`] when the sweep interval has elapsed. The
    /// first call only starts the interval.
    pub fn maybe_sweep<G: SceneGraph, S: RemoteStore>(&mut self, scene: &mut G, store: &mut S, now: f64) -> usize {
        match self.last_sweep {
            Some(last) if now - last < self.sweep_interval_ms => 0,
            Some(_) => {
                self.last_sweep = Some(now);
                self.sweep_idle(scene, store, now)
            }
            None => {
                self.last_sweep = Some(now);
                0
            }
        }
    }

    // --- Store updates ---

    /// Replace a chunk's contents with a snapshot and mark it loaded.
    /// Returns the chunk it applied to, or `None` for stale or unknown
    /// subscriptions.
    pub fn apply_snapshot<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        subscription: SubscriptionId,
        objects: Vec<(ObjectName, ObjectRecord)>,
    ) -> Option<ChunkCoord> {
        let coord = self.live_chunk(subscription)?;
        let keep: BTreeSet<&str> = objects.iter().map(|(name, _)| name.as_str()).collect();
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            let gone: Vec<ObjectName> = chunk.objects.keys().filter(|n| !keep.contains(n.as_str())).cloned().collect();
            for name in gone {
                if let Some(node) = chunk.objects.remove(&name) {
                    node.destroy(scene);
                }
            }
            chunk.state = ChunkState::Loaded;
        }
        let count = objects.len();
        for (name, record) in objects {
            self.upsert_object(scene, coord, &name, &record);
        }
        debug!(chunk = %coord, objects = count, "chunk snapshot applied");
        Some(coord)
    }

    /// Add or update one object of a subscribed chunk.
    pub fn apply_upsert<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        subscription: SubscriptionId,
        name: &str,
        record: &ObjectRecord,
    ) -> Option<ChunkCoord> {
        let coord = self.live_chunk(subscription)?;
        self.upsert_object(scene, coord, name, record);
        Some(coord)
    }

    /// Remove one object of a subscribed chunk. Returns the chunk it was
    /// removed from, if a node was destroyed.
    pub fn apply_remove<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        subscription: SubscriptionId,
        name: &str,
    ) -> Option<ChunkCoord> {
        let coord = self.live_chunk(subscription)?;
        let node = self.chunks.get_mut(&coord)?.objects.remove(name)?;
        node.destroy(scene);
        Some(coord)
    }

    fn live_chunk(&self, subscription: SubscriptionId) -> Option<ChunkCoord> {
        let coord = self.subscriptions.get(&subscription).copied();
        if coord.is_none() {
            debug!(subscription = subscription.0, "dropping update for stale subscription");
        }
        coord
    }

    /// Update the node in place if present (keeping its insertion index),
    /// otherwise spawn a new one.
    fn upsert_object<G: SceneGraph>(&mut self, scene: &mut G, coord: ChunkCoord, name: &str, record: &ObjectRecord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        if let Some(node) = chunk.objects.get_mut(name) {
            node.apply(scene, record);
            self.filter.restyle(scene, node);
            return;
        }
        let node = ObjectNode::spawn(scene, chunk.container, name, record, self.next_insertion);
        self.next_insertion += 1;
        self.filter.restyle(scene, &node);
        chunk.objects.insert(name.to_owned(), node);
    }

    // --- Filters ---

    pub fn set_hide_deco<G: SceneGraph>(&mut self, scene: &mut G, hide: bool) {
        self.filter.hide_deco = hide;
        self.restyle_all(scene);
    }

    pub fn set_show_danger<G: SceneGraph>(&mut self, scene: &mut G, show: bool) {
        self.filter.show_danger = show;
        self.restyle_all(scene);
    }

    #[must_use]
    pub fn filter(&self) -> &VisibilityFilter {
        &self.filter
    }

    fn restyle_all<G: SceneGraph>(&self, scene: &mut G) {
        for node in self.chunks.values().flat_map(Chunk::objects) {
            self.filter.restyle(scene, node);
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Container holding every chunk container.
    #[must_use]
    pub fn world(&self) -> NodeId {
        self.world
    }

    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    #[must_use]
    pub fn visible_set(&self) -> &BTreeSet<ChunkCoord> {
        &self.visible
    }

    /// Chunks currently loading or loaded.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.chunks.values().filter(|c| c.state != ChunkState::Unloaded).count()
    }

    #[must_use]
    pub fn object(&self, coord: ChunkCoord, name: &str) -> Option<&ObjectNode> {
        self.chunks.get(&coord)?.object(name)
    }

    pub(crate) fn object_mut(&mut self, coord: ChunkCoord, name: &str) -> Option<&mut ObjectNode> {
        self.chunks.get_mut(&coord)?.objects.get_mut(name)
    }

    /// Find an object by name in any chunk.
    #[must_use]
    pub fn find_object(&self, name: &str) -> Option<(ChunkCoord, &ObjectNode)> {
        self.chunks.values().find_map(|c| c.object(name).map(|node| (c.coord, node)))
    }

    /// Topmost shown object under a world point.
    #[must_use]
    pub fn hit_test<G: SceneGraph>(&self, scene: &G, world_pt: Vector) -> Option<Hit> {
        hit::hit_test(scene, self.chunks.values(), world_pt, |node| self.filter.is_shown(node.record()))
    }
}
