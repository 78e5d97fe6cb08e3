//! Top-level editor core.
//!
//! [`EditorCore`] owns every component and is the only thing a host talks
//! to. The host forwards input events to the `on_*` handlers, posts store
//! replies through [`EditorCore::event_sender`], and calls
//! [`EditorCore::tick`] once per frame with its clock.
//!
//! DESIGN
//! ======
//! The core is generic over its three collaborators (scene graph, remote
//! store, settings storage) so the whole editor runs headless against
//! [`MemoryScene`](crate::render::MemoryScene),
//! [`RecordingStore`](crate::store::RecordingStore) and
//! [`MemoryStorage`](crate::settings::MemoryStorage).
//!
//! Input handlers only change camera, preview, selection and hover state, or
//! issue store writes. Scene recomposition (visible set, grid, preview box,
//! due tooltips) happens in `tick`.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, info};

use crate::camera::{Camera, SavedCamera};
use crate::chunk::{ChunkCoord, ChunkState};
use crate::config::EditorConfig;
use crate::events::{EditorEvent, EventQueue, EventSender};
use crate::geom::{Vector, snap_to_cell};
use crate::hit::Hit;
use crate::input::{Button, InputState, Key, Modifiers, Tool, WheelDelta, exceeds_drag_threshold};
use crate::notify::{Notice, Notices};
use crate::object::{ObjectName, ObjectRecord};
use crate::render::SceneGraph;
use crate::scene::SceneComposer;
use crate::selection::{Preview, SelectionState};
use crate::settings::{KeyValueStorage, SettingEffect, SettingKey, Settings};
use crate::store::RemoteStore;
use crate::streaming::ChunkStreamer;
use crate::tooltip::Tooltip;

/// Editor state and the per-frame pipeline.
pub struct EditorCore<G: SceneGraph, S: RemoteStore, K: KeyValueStorage> {
    scene: G,
    store: S,
    storage: K,
    config: EditorConfig,
    camera: Camera,
    viewport: Vector,
    composer: SceneComposer,
    streamer: ChunkStreamer,
    selection: SelectionState,
    tooltip: Tooltip,
    settings: Settings,
    events: EventQueue,
    notices: Notices,
    input: InputState,
    tool: Tool,
    hovered: Option<Hit>,
    now: f64,
}

impl<G: SceneGraph, S: RemoteStore, K: KeyValueStorage> EditorCore<G, S, K> {
    /// Build the editor scene under the stage root of `scene`, load saved
    /// settings from `storage` and apply their effects. Nothing streams until
    /// the first [`Self::tick`]; with no viewport set yet that tick streams
    /// only the chunk under the camera.
    pub fn new(mut scene: G, store: S, mut storage: K, config: EditorConfig, camera: Camera) -> Self {
        let composer = SceneComposer::new(&mut scene, &config);
        let streamer = ChunkStreamer::new(&mut scene, composer.editor(), &config);
        let tooltip = Tooltip::new(&mut scene, composer.tooltip_layer(), config.hover_debounce_ms);
        let settings = Settings::load(&mut storage);
        let mut core = Self {
            scene,
            store,
            storage,
            selection: SelectionState::new(config.bounds),
            config,
            camera,
            viewport: Vector::ZERO,
            composer,
            streamer,
            tooltip,
            settings,
            events: EventQueue::new(),
            notices: Notices::new(),
            input: InputState::Idle,
            tool: Tool::default(),
            hovered: None,
            now: 0.0,
        };
        for effect in SettingKey::ALL.into_iter().filter_map(SettingKey::effect) {
            core.apply_effect(effect);
        }
        info!(
            columns = core.streamer.grid().columns(),
            rows = core.streamer.grid().rows(),
            x = core.camera.pos.x,
            y = core.camera.pos.y,
            zoom = core.camera.zoom_level,
            "editor initialised"
        );
        core
    }

    // --- Frame ---

    /// One frame: apply store events, clamp the camera, recompose the scene
    /// and fire due timers. `now` is the host clock in milliseconds.
    pub fn tick(&mut self, now: f64) {
        self.now = now;
        for event in self.events.drain() {
            self.handle_event(event);
        }

        self.camera.clamp_to(&self.config.bounds);
        if self.composer.apply_camera(&mut self.scene, &self.camera, self.viewport) {
            self.streamer.update_visible(&mut self.scene, &mut self.store, &self.camera, self.viewport, now);
        }
        if self.streamer.maybe_sweep(&mut self.scene, &mut self.store, now) > 0 {
            self.drop_unloaded_refs();
        }

        let scale = self.camera.zoom_scale();
        self.composer.redraw_grid(&mut self.scene, scale);
        self.composer.refresh_preview_box(&mut self.scene, self.selection.preview().map(Preview::node));
        self.tooltip.set_zoom_scale(&mut self.scene, &self.streamer, scale);
        self.tooltip.tick(&mut self.scene, &self.streamer, &mut self.store, now);
    }

    fn handle_event(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::ChunkSnapshot { subscription, objects } => {
                if let Some(coord) = self.streamer.apply_snapshot(&mut self.scene, subscription, objects) {
                    self.drop_missing_refs(coord);
                    self.selection.restyle_selected(&mut self.scene, &mut self.streamer);
                }
            }
            EditorEvent::ObjectUpserted { subscription, name, record } => {
                if self.streamer.apply_upsert(&mut self.scene, subscription, &name, &record).is_some() {
                    self.selection.restyle_selected(&mut self.scene, &mut self.streamer);
                }
            }
            EditorEvent::ObjectRemoved { subscription, name } => {
                if let Some(coord) = self.streamer.apply_remove(&mut self.scene, subscription, &name) {
                    self.drop_missing_refs(coord);
                }
            }
            EditorEvent::MutationSettled { request, result } => {
                self.selection.settle(request, result, &mut self.notices);
            }
            EditorEvent::PlacedByResolved { request, result } => {
                self.tooltip.on_placed_by(
                    &mut self.scene,
                    &self.streamer,
                    &mut self.store,
                    request,
                    result,
                    &mut self.notices,
                );
            }
            EditorEvent::DisplayColorResolved { request, result } => {
                self.tooltip.on_display_color(&mut self.scene, &self.streamer, request, result);
            }
        }
    }

    /// Forget selection, hover and tooltip targets in `coord` whose node no
    /// longer exists.
    fn drop_missing_refs(&mut self, coord: ChunkCoord) {
        if let Some(selected) = self.selection.selected() {
            if selected.chunk == coord && self.streamer.object(coord, &selected.name).is_none() {
                debug!(name = %selected.name, "selected object removed remotely");
                self.selection.forget_selection();
            }
        }
        if let Some(target) = self.tooltip.target() {
            if target.chunk == coord && self.streamer.object(coord, &target.name).is_none() {
                self.tooltip.hover_end(&mut self.scene, &self.streamer);
            }
        }
        if self.hovered.as_ref().is_some_and(|h| h.chunk == coord && self.streamer.object(coord, &h.name).is_none()) {
            self.hovered = None;
        }
    }

    /// Forget references into chunks the sweep just unloaded.
    fn drop_unloaded_refs(&mut self) {
        let unloaded =
            |streamer: &ChunkStreamer, coord: ChunkCoord| streamer.chunk(coord).is_none_or(|c| c.state == ChunkState::Unloaded);
        if self.selection.selected().is_some_and(|s| unloaded(&self.streamer, s.chunk)) {
            self.selection.forget_selection();
        }
        if self.tooltip.target().is_some_and(|t| unloaded(&self.streamer, t.chunk)) {
            self.tooltip.hover_end(&mut self.scene, &self.streamer);
        }
        if self.hovered.as_ref().is_some_and(|h| unloaded(&self.streamer, h.chunk)) {
            self.hovered = None;
        }
    }

    // --- Viewport / tool ---

    /// Update viewport dimensions in screen pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Vector::new(width.max(0.0), height.max(0.0));
    }

    /// Switch tools. Leaving the build tool drops the preview; entering it
    /// drops the selection.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        if !tool.uses_preview() {
            self.selection.cancel_preview(&mut self.scene);
        }
        if tool == Tool::Build {
            self.selection.deselect(&mut self.scene, &mut self.streamer);
        }
        self.input = InputState::Idle;
        debug!(from = ?self.tool, to = ?tool, "tool changed");
        self.tool = tool;
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen: Vector, button: Button, _modifiers: Modifiers) {
        self.input = match button {
            Button::Primary => InputState::Pressed { start_screen: screen, hit: self.hit_at(screen) },
            Button::Middle | Button::Secondary => InputState::Panning { last_screen: screen },
        };
    }

    pub fn on_pointer_move(&mut self, screen: Vector, modifiers: Modifiers) {
        match self.input.clone() {
            InputState::Idle => self.hover(screen, modifiers),
            InputState::Pressed { start_screen, hit } => {
                if !exceeds_drag_threshold(start_screen, screen) {
                    return;
                }
                let world = self.world_at(screen);
                match hit {
                    Some(hit) if self.tool == Tool::Edit && self.selection.is_selected(hit.chunk, &hit.name) => {
                        let grabbed = self.world_at(start_screen);
                        let origin = self.streamer.object(hit.chunk, &hit.name).map_or(grabbed, |n| n.record().position());
                        let grab_offset = origin - grabbed;
                        self.show_drag(&hit, self.placement(world + grab_offset, modifiers));
                        self.input = InputState::DraggingObject { hit, grab_offset, last_world: world };
                    }
                    _ => {
                        self.camera.pan_by_screen(screen - start_screen);
                        self.input = InputState::Panning { last_screen: screen };
                    }
                }
            }
            InputState::Panning { last_screen } => {
                self.camera.pan_by_screen(screen - last_screen);
                self.input = InputState::Panning { last_screen: screen };
            }
            InputState::DraggingObject { hit, grab_offset, .. } => {
                let world = self.world_at(screen);
                self.show_drag(&hit, self.placement(world + grab_offset, modifiers));
                self.input = InputState::DraggingObject { hit, grab_offset, last_world: world };
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen: Vector, button: Button, modifiers: Modifiers) {
        match std::mem::take(&mut self.input) {
            InputState::Pressed { hit, .. } if button == Button::Primary => self.click(screen, hit, modifiers),
            InputState::DraggingObject { hit, grab_offset, .. } => {
                let target = self.placement(self.world_at(screen) + grab_offset, modifiers);
                // The store echo moves the node; until then it sits at its record.
                if let Some(node) = self.streamer.object(hit.chunk, &hit.name) {
                    self.scene.set_transform(node.root(), node.transform());
                }
                self.selection.move_selected(&self.streamer, &mut self.store, target);
            }
            InputState::Idle | InputState::Pressed { .. } | InputState::Panning { .. } => {}
        }
    }

    /// Zoom one step per wheel event around the pointer. Returns whether the
    /// zoom level changed.
    pub fn on_wheel(&mut self, screen: Vector, delta: WheelDelta, _modifiers: Modifiers) -> bool {
        self.camera.zoom_at(delta.zoom_steps(), screen, self.viewport, &self.config)
    }

    /// Returns whether the key was handled.
    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> bool {
        if key.is_delete() {
            return self.delete_selected();
        }
        if key.is_escape() {
            let deselected = self.selection.deselect(&mut self.scene, &mut self.streamer);
            let cancelled = self.selection.cancel_preview(&mut self.scene);
            return deselected || cancelled;
        }
        if key.is_enter() && self.tool.uses_preview() {
            return self.commit_preview().is_some();
        }
        if let Some(direction) = key.arrow_direction() {
            return self.nudge(direction * self.config.grid_spacing);
        }
        false
    }

    /// Touch skips the hover debounce.
    pub fn on_touch_start(&mut self, screen: Vector) {
        if let Some(hit) = self.hit_at(screen) {
            self.tooltip.touch_start(&mut self.scene, &self.streamer, &mut self.store, hit);
        }
    }

    fn hover(&mut self, screen: Vector, modifiers: Modifiers) {
        let world = self.world_at(screen);
        if self.tool.uses_preview() {
            let place = self.placement(world, modifiers);
            self.selection.update_preview(&mut self.scene, |record| record.set_position(place));
        }
        let hit = self.hit_at(screen);
        if hit == self.hovered {
            return;
        }
        match hit.clone() {
            Some(target) => self.tooltip.hover_start(&mut self.scene, &self.streamer, target, self.now),
            None => self.tooltip.hover_end(&mut self.scene, &self.streamer),
        }
        self.hovered = hit;
    }

    fn click(&mut self, screen: Vector, hit: Option<Hit>, modifiers: Modifiers) {
        match self.tool {
            Tool::Build => {
                let place = self.placement(self.world_at(screen), modifiers);
                if self.selection.update_preview(&mut self.scene, |record| record.set_position(place)) {
                    self.commit_preview();
                }
            }
            Tool::Edit => match hit {
                Some(hit) => {
                    self.select(hit.chunk, &hit.name);
                }
                None => {
                    self.deselect();
                }
            },
            Tool::Delete => {
                if let Some(hit) = hit {
                    if self.select(hit.chunk, &hit.name) {
                        self.delete_selected();
                    }
                }
            }
        }
    }

    /// Move the selected object, or else the preview, by `offset`.
    fn nudge(&mut self, offset: Vector) -> bool {
        if let Some(selected) = self.selection.selected() {
            let Some(node) = self.streamer.object(selected.chunk, &selected.name) else {
                return false;
            };
            let target = node.record().position() + offset;
            return self.selection.move_selected(&self.streamer, &mut self.store, target);
        }
        self.selection.update_preview(&mut self.scene, |record| record.set_position(record.position() + offset))
    }

    fn show_drag(&mut self, hit: &Hit, position: Vector) {
        if let Some(node) = self.streamer.object(hit.chunk, &hit.name) {
            let mut transform = node.transform();
            transform.position = position.clamped(self.config.bounds.start, self.config.bounds.end);
            self.scene.set_transform(node.root(), transform);
        }
    }

    /// Pointer world position snapped to the grid cell centre, unless alt
    /// is held.
    fn placement(&self, world: Vector, modifiers: Modifiers) -> Vector {
        if modifiers.alt { world } else { snap_to_cell(world, self.config.grid_spacing) }
    }

    fn world_at(&self, screen: Vector) -> Vector {
        self.camera.screen_to_world(screen, self.viewport)
    }

    fn hit_at(&self, screen: Vector) -> Option<Hit> {
        self.streamer.hit_test(&self.scene, self.world_at(screen))
    }

    // --- Editing ---

    /// Start previewing `template` under the pointer.
    pub fn begin_preview(&mut self, template: ObjectRecord) {
        self.selection.begin_preview(&mut self.scene, self.composer.preview_layer(), template);
    }

    pub fn update_preview(&mut self, f: impl FnOnce(&mut ObjectRecord)) -> bool {
        self.selection.update_preview(&mut self.scene, f)
    }

    pub fn commit_preview(&mut self) -> Option<ObjectName> {
        self.selection.commit_preview(&mut self.store, self.streamer.grid())
    }

    pub fn cancel_preview(&mut self) -> bool {
        self.selection.cancel_preview(&mut self.scene)
    }

    /// Select an object. With "show object info" on, its record is posted as
    /// an info notice.
    pub fn select(&mut self, chunk: ChunkCoord, name: &str) -> bool {
        if !self.selection.select(&mut self.scene, &mut self.streamer, chunk, name) {
            return false;
        }
        if self.settings.get(SettingKey::ShowObjectInfo) {
            if let Some(node) = self.streamer.object(chunk, name) {
                self.notices.push_info(object_info(name, node.record()));
            }
        }
        true
    }

    pub fn deselect(&mut self) -> bool {
        self.selection.deselect(&mut self.scene, &mut self.streamer)
    }

    pub fn delete_selected(&mut self) -> bool {
        self.selection.delete_selected(&mut self.scene, &mut self.streamer, &mut self.store)
    }

    pub fn move_selected(&mut self, position: Vector) -> bool {
        self.selection.move_selected(&self.streamer, &mut self.store, position)
    }

    // --- Settings ---

    /// Change a setting, save it and apply its scene effect.
    pub fn set_setting(&mut self, key: SettingKey, enabled: bool) {
        if let Some(effect) = self.settings.set(&mut self.storage, key, enabled) {
            self.apply_effect(effect);
        }
    }

    pub fn toggle_setting(&mut self, key: SettingKey) {
        if let Some(effect) = self.settings.toggle(&mut self.storage, key) {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: SettingEffect) {
        match effect {
            SettingEffect::Ground => {
                self.composer.set_ground_visible(&mut self.scene, !self.settings.get(SettingKey::HideGround));
            }
            SettingEffect::DecoObjects => {
                self.streamer.set_hide_deco(&mut self.scene, self.settings.get(SettingKey::HideDecoObjects));
            }
            SettingEffect::DangerObjects => {
                self.streamer.set_show_danger(&mut self.scene, self.settings.get(SettingKey::ShowDanger));
            }
            SettingEffect::SelectionOutline => {
                let outline = !self.settings.get(SettingKey::DisableObjectOutline);
                self.selection.set_outline(&mut self.scene, &mut self.streamer, outline);
            }
            SettingEffect::Tooltips => {
                let enabled = self.settings.get(SettingKey::ShowTooltips);
                self.tooltip.set_enabled(&mut self.scene, &self.streamer, enabled);
            }
        }
    }

    // --- Host plumbing ---

    /// Handle store callbacks use to post replies.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.events.sender()
    }

    /// Notices raised since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Camera state for the host to persist.
    #[must_use]
    pub fn saved_camera(&self) -> SavedCamera {
        self.camera.to_saved()
    }

    // --- Queries ---

    #[must_use]
    pub fn scene(&self) -> &G {
        &self.scene
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn storage(&self) -> &K {
        &self.storage
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn viewport(&self) -> Vector {
        self.viewport
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&Hit> {
        self.hovered.as_ref()
    }

    #[must_use]
    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    #[must_use]
    pub fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[must_use]
    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

fn object_info(name: &str, record: &ObjectRecord) -> String {
    format!(
        "Object {name}: id {}, x {}, y {}, rotation {}, scale {}, z {}",
        record.id, record.x, record.y, record.rotation, record.scale, record.z_order
    )
}
