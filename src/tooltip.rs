//! Debounced attribution tooltip.
//!
//! Hovering an object arms a deadline; once it passes with the same object
//! still hovered, the tooltip resolves who placed the object and that user's
//! display colour, then shows a "Placed By:" label above it. Touch skips the
//! debounce.
//!
//! DESIGN
//! ======
//! Both lookups go through an [`AttributionCache`] owned by the tooltip:
//! answers are written once and reused for the rest of the session. Misses
//! become store reads whose results come back through the event queue as
//! [`crate::events::EditorEvent`]s. A result is always cached, but only drawn
//! if its object is still the current target.
//!
//! TRADE-OFFS
//! ==========
//! The cache is never invalidated, so a user who changes their display colour
//! mid-session keeps the old colour until reload.

#[cfg(test)]
#[path = "tooltip_test.rs"]
mod tooltip_test;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::consts::{
    DEFAULT_DISPLAY_COLOR, TOOLTIP_BACKGROUND_ALPHA, TOOLTIP_CORNER_RADIUS, TOOLTIP_FONT_MAX, TOOLTIP_FONT_MIN,
    TOOLTIP_PADDING, TOOLTIP_PREFIX, TOOLTIP_PREFIX_ALPHA, TOOLTIP_PREFIX_COLOR, TOOLTIP_PREFIX_FONT_RATIO,
    TOOLTIP_SCREEN_FONT_PX,
};
use crate::geom::{Rect, Vector, clamp};
use crate::hit::Hit;
use crate::notify::Notices;
use crate::object::ObjectName;
use crate::render::{NodeId, NodeSpec, SceneGraph, Shape, TextRun, Transform};
use crate::store::{RemoteStore, RequestId, StoreError};
use crate::streaming::ChunkStreamer;

// =============================================================================
// Cache
// =============================================================================

/// Write-once answers for object → placing user and user → display colour.
#[derive(Debug, Default, Clone)]
pub struct AttributionCache {
    placed_by: HashMap<ObjectName, String>,
    colors: HashMap<String, u32>,
}

impl AttributionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn placed_by(&self, name: &str) -> Option<&str> {
        self.placed_by.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn color(&self, username: &str) -> Option<u32> {
        self.colors.get(username).copied()
    }

    /// Record who placed `name`. An existing answer is kept.
    pub fn remember_placed_by(&mut self, name: &str, username: &str) {
        self.placed_by.entry(name.to_owned()).or_insert_with(|| username.to_owned());
    }

    /// Record a user's colour. An existing answer is kept.
    pub fn remember_color(&mut self, username: &str, color: u32) {
        self.colors.entry(username.to_owned()).or_insert(color);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.placed_by.len() + self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a stored display colour of the form `"RR GG BB"` (hex components
/// separated by whitespace). Absent or malformed values are white.
#[must_use]
pub fn parse_display_color(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_DISPLAY_COLOR;
    };
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != 3 {
        return DEFAULT_DISPLAY_COLOR;
    }
    let mut color = 0u32;
    for part in parts {
        match u8::from_str_radix(part, 16) {
            Ok(component) => color = (color << 8) | u32::from(component),
            Err(_) => return DEFAULT_DISPLAY_COLOR,
        }
    }
    color
}

/// Label font size for a zoom scale: a fixed screen size converted to world
/// units, kept readable at the extremes.
#[must_use]
pub fn font_size_for(zoom_scale: f64) -> f64 {
    let size = if zoom_scale > 0.0 { TOOLTIP_SCREEN_FONT_PX / zoom_scale } else { TOOLTIP_FONT_MAX };
    clamp(size, TOOLTIP_FONT_MIN, TOOLTIP_FONT_MAX)
}

// =============================================================================
// Tooltip
// =============================================================================

/// Label nodes under the tooltip layer.
#[derive(Debug, Clone, Copy)]
struct Label {
    root: NodeId,
    background: NodeId,
    prefix: NodeId,
    username: NodeId,
}

impl Label {
    fn spawn<G: SceneGraph>(scene: &mut G, layer: NodeId) -> Self {
        let root = scene.add_child(layer, NodeSpec::container("label"));
        let background = scene.add_child(root, NodeSpec::graphics("background"));
        let prefix = scene.add_child(root, NodeSpec::text("prefix"));
        let username = scene.add_child(root, NodeSpec::text("username"));
        scene.set_visible(root, false);
        Self { root, background, prefix, username }
    }
}

/// Hover state plus the label it draws.
#[derive(Debug)]
pub struct Tooltip {
    label: Label,
    cache: AttributionCache,
    target: Option<Hit>,
    deadline: Option<f64>,
    highlighted: Option<Hit>,
    placed_by_requests: HashMap<RequestId, ObjectName>,
    color_requests: HashMap<RequestId, String>,
    debounce_ms: f64,
    zoom_scale: f64,
    enabled: bool,
    shown: bool,
}

impl Tooltip {
    pub fn new<G: SceneGraph>(scene: &mut G, layer: NodeId, debounce_ms: f64) -> Self {
        Self {
            label: Label::spawn(scene, layer),
            cache: AttributionCache::new(),
            target: None,
            deadline: None,
            highlighted: None,
            placed_by_requests: HashMap::new(),
            color_requests: HashMap::new(),
            debounce_ms,
            zoom_scale: 1.0,
            enabled: true,
            shown: false,
        }
    }

    // --- Hover lifecycle ---

    /// Pointer entered `target`. Resolution happens in [`Self::tick`] once
    /// the debounce deadline passes.
    pub fn hover_start<G: SceneGraph>(&mut self, scene: &mut G, streamer: &ChunkStreamer, target: Hit, now: f64) {
        if !self.enabled {
            return;
        }
        if self.target.as_ref() == Some(&target) {
            return;
        }
        self.hide(scene, streamer);
        self.target = Some(target);
        self.deadline = Some(now + self.debounce_ms);
    }

    /// Touch on `target`: resolve without waiting.
    pub fn touch_start<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        streamer: &ChunkStreamer,
        store: &mut S,
        target: Hit,
    ) {
        if !self.enabled {
            return;
        }
        self.hide(scene, streamer);
        self.target = Some(target.clone());
        self.deadline = None;
        self.resolve(scene, streamer, store, &target);
    }

    /// Pointer left the hovered object: hide the label, drop the highlight
    /// and forget the target. A pending deadline never fires.
    pub fn hover_end<G: SceneGraph>(&mut self, scene: &mut G, streamer: &ChunkStreamer) {
        self.hide(scene, streamer);
        self.target = None;
        self.deadline = None;
    }

    /// Resolve a hover whose deadline passed.
    pub fn tick<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        streamer: &ChunkStreamer,
        store: &mut S,
        now: f64,
    ) -> bool {
        match (self.deadline, self.target.clone()) {
            (Some(deadline), Some(target)) if now >= deadline => {
                self.deadline = None;
                self.resolve(scene, streamer, store, &target);
                true
            }
            _ => false,
        }
    }

    /// Turn the tooltip on or off. Turning it off hides everything and
    /// cancels any pending hover.
    pub fn set_enabled<G: SceneGraph>(&mut self, scene: &mut G, streamer: &ChunkStreamer, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.hover_end(scene, streamer);
        }
    }

    /// Zoom scale used for the label font; relayouts a visible label.
    pub fn set_zoom_scale<G: SceneGraph>(&mut self, scene: &mut G, streamer: &ChunkStreamer, zoom_scale: f64) {
        if (self.zoom_scale - zoom_scale).abs() < f64::EPSILON {
            return;
        }
        self.zoom_scale = zoom_scale;
        if self.shown {
            self.show_current(scene, streamer);
        }
    }

    // --- Lookup results ---

    /// A placed-by read settled. Failures raise a notice. A username is
    /// cached regardless of whether its object is still hovered.
    pub fn on_placed_by<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        streamer: &ChunkStreamer,
        store: &mut S,
        request: RequestId,
        result: Result<Option<String>, StoreError>,
        notices: &mut Notices,
    ) -> bool {
        let Some(name) = self.placed_by_requests.remove(&request) else {
            debug!(%request, "placed-by result for unknown request");
            return false;
        };
        let username = match result {
            Ok(Some(username)) => username,
            Ok(None) => {
                debug!(name = %name, "object has no placed-by record");
                return true;
            }
            Err(err) => {
                notices.push_error(format!("Failed to get username! ({err})"));
                return true;
            }
        };
        self.cache.remember_placed_by(&name, &username);
        if self.is_current(&name) {
            self.resolve_color(scene, streamer, store, &username);
        } else {
            debug!(name = %name, "stale placed-by result cached");
        }
        true
    }

    /// A display-colour read settled. A missing colour is white; a failed
    /// read draws white without caching it.
    pub fn on_display_color<G: SceneGraph>(
        &mut self,
        scene: &mut G,
        streamer: &ChunkStreamer,
        request: RequestId,
        result: Result<Option<String>, StoreError>,
    ) -> bool {
        let Some(username) = self.color_requests.remove(&request) else {
            debug!(%request, "display colour result for unknown request");
            return false;
        };
        let color = match result {
            Ok(raw) => {
                let color = parse_display_color(raw.as_deref());
                self.cache.remember_color(&username, color);
                color
            }
            Err(err) => {
                warn!(username = %username, error = %err, "display colour lookup failed");
                DEFAULT_DISPLAY_COLOR
            }
        };
        if self.current_username().is_some_and(|current| current == username) {
            self.show(scene, streamer, &username, color);
        }
        true
    }

    // --- Queries ---

    #[must_use]
    pub fn cache(&self) -> &AttributionCache {
        &self.cache
    }

    #[must_use]
    pub fn target(&self) -> Option<&Hit> {
        self.target.as_ref()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Root node of the label.
    #[must_use]
    pub fn label(&self) -> NodeId {
        self.label.root
    }

    #[must_use]
    pub fn pending_lookups(&self) -> usize {
        self.placed_by_requests.len() + self.color_requests.len()
    }

    // --- Internals ---

    fn is_current(&self, name: &str) -> bool {
        self.target.as_ref().is_some_and(|t| t.name == name)
    }

    fn current_username(&self) -> Option<&str> {
        let target = self.target.as_ref()?;
        self.cache.placed_by(&target.name)
    }

    fn resolve<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        streamer: &ChunkStreamer,
        store: &mut S,
        target: &Hit,
    ) {
        let Some(node) = streamer.object(target.chunk, &target.name) else {
            debug!(name = %target.name, "hovered object is gone");
            self.target = None;
            return;
        };
        node.set_highlight(scene, true);
        self.highlighted = Some(target.clone());

        if let Some(username) = self.cache.placed_by(&target.name).map(str::to_owned) {
            self.resolve_color(scene, streamer, store, &username);
            return;
        }
        let request = store.fetch_placed_by(&target.name);
        debug!(%request, name = %target.name, "looking up placed-by");
        self.placed_by_requests.insert(request, target.name.clone());
    }

    fn resolve_color<G: SceneGraph, S: RemoteStore>(
        &mut self,
        scene: &mut G,
        streamer: &ChunkStreamer,
        store: &mut S,
        username: &str,
    ) {
        if let Some(color) = self.cache.color(username) {
            self.show(scene, streamer, username, color);
            return;
        }
        let request = store.fetch_display_color(username);
        debug!(%request, username, "looking up display colour");
        self.color_requests.insert(request, username.to_owned());
    }

    fn show_current<G: SceneGraph>(&mut self, scene: &mut G, streamer: &ChunkStreamer) {
        let Some(username) = self.current_username().map(str::to_owned) else {
            return;
        };
        let color = self.cache.color(&username).unwrap_or(DEFAULT_DISPLAY_COLOR);
        self.show(scene, streamer, &username, color);
    }

    /// Lay out the label above the current target and make it visible.
    fn show<G: SceneGraph>(&mut self, scene: &mut G, streamer: &ChunkStreamer, username: &str, color: u32) {
        let Some(target) = self.target.as_ref() else {
            return;
        };
        let Some(node) = streamer.object(target.chunk, &target.name) else {
            return;
        };
        let size = font_size_for(self.zoom_scale);
        let prefix = TextRun {
            text: TOOLTIP_PREFIX.to_owned(),
            font_size: size * TOOLTIP_PREFIX_FONT_RATIO,
            color: TOOLTIP_PREFIX_COLOR,
            alpha: TOOLTIP_PREFIX_ALPHA,
        };
        let name = TextRun { text: username.to_owned(), font_size: size, color, alpha: 1.0 };
        let prefix_size = scene.measure_text(&prefix);
        let name_size = scene.measure_text(&name);
        scene.set_text(self.label.prefix, prefix);
        scene.set_text(self.label.username, name);

        // Local layout is y-down; the root flips it into world space.
        let pad = TOOLTIP_PADDING;
        scene.set_transform(self.label.prefix, Transform::at(Vector::ZERO));
        scene.set_transform(self.label.username, Transform::at(Vector::new(prefix_size.x + pad, 0.0)));
        let width = prefix_size.x + name_size.x + pad * 2.0;
        let height = prefix_size.y.max(name_size.y) + pad;
        let rect = Rect::new(Vector::new(-pad / 2.0, -pad / 2.0), Vector::new(width - pad / 2.0, height - pad / 2.0));
        scene.set_shapes(
            self.label.background,
            vec![Shape::FilledRoundRect {
                rect,
                radius: TOOLTIP_CORNER_RADIUS,
                color: 0x00_0000,
                alpha: TOOLTIP_BACKGROUND_ALPHA,
            }],
        );

        let record = node.record();
        let object_top = record.y + node.size(scene).y / 2.0;
        let position = Vector::new(record.x - width / 2.0 + pad / 2.0, object_top + pad + rect.end.y);
        scene.set_transform(
            self.label.root,
            Transform { position, scale: Vector::new(1.0, -1.0), rotation: 0.0 },
        );
        scene.set_visible(self.label.root, true);
        self.shown = true;
    }

    fn hide<G: SceneGraph>(&mut self, scene: &mut G, streamer: &ChunkStreamer) {
        scene.set_visible(self.label.root, false);
        self.shown = false;
        if let Some(hit) = self.highlighted.take() {
            if let Some(node) = streamer.object(hit.chunk, &hit.name) {
                node.set_highlight(scene, false);
            }
        }
    }
}
