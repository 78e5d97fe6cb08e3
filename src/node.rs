//! Per-object visual node.
//!
//! An [`ObjectNode`] owns a small subtree in the scene graph: a container
//! positioned, rotated and scaled like the record, holding the main and detail
//! sprites. Overlay children (select box, hover highlight, danger marker,
//! preview box) are created on demand and looked up by name.
//!
//! DESIGN
//! ======
//! The node mirrors its record but never writes back to it. Selection
//! restyling only touches sprite appearance, so deselecting reapplies the
//! appearance derived from the record and lands on exactly the pre-selection
//! look.
//!
//! Tints persist across updates whose colour hex is empty, while opacity and
//! blending always follow the newest record.

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;

use crate::consts::{
    DANGER_MARKER_COLOR, HIGHLIGHT_ALPHA, HIGHLIGHT_COLOR, HIGHLIGHT_PADDING, OBJECT_SPRITE_SCALE, SELECT_BOX_COLOR,
    SELECT_BOX_PADDING, SELECT_TINT,
};
use crate::geom::{Rect, Vector};
use crate::object::{GdColor, ObjectName, ObjectRecord};
use crate::render::{Appearance, DrawOrder, NodeId, NodeSpec, SceneGraph, Shape, Stroke, Transform};

pub const SELECT_BOX: &str = "select_box";
pub const HIGHLIGHT: &str = "highlight";
pub const DANGER_MARKER: &str = "danger_marker";
pub const PREVIEW_BOX: &str = "box";

/// Visual representation of one placed (or previewed) object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    name: ObjectName,
    record: ObjectRecord,
    root: NodeId,
    main: NodeId,
    detail: NodeId,
    insertion: u64,
    main_tint: u32,
    detail_tint: u32,
    selected: bool,
}

impl ObjectNode {
    /// Build the subtree under `parent` and style it from `record`.
    pub fn spawn<G: SceneGraph>(scene: &mut G, parent: NodeId, name: &str, record: &ObjectRecord, insertion: u64) -> Self {
        let root = scene.add_child(parent, NodeSpec::container(name));
        let main = scene.add_child(root, NodeSpec::sprite("main", record.main_texture()));
        let detail = scene.add_child(root, NodeSpec::sprite("detail", record.detail_texture()));
        let sprite_transform = Transform {
            position: Vector::ZERO,
            scale: Vector::new(OBJECT_SPRITE_SCALE, -OBJECT_SPRITE_SCALE),
            rotation: 0.0,
        };
        scene.set_transform(main, sprite_transform);
        scene.set_transform(detail, sprite_transform);

        let mut node = Self {
            name: name.to_owned(),
            record: record.clone(),
            root,
            main,
            detail,
            insertion,
            main_tint: Appearance::default().tint,
            detail_tint: Appearance::default().tint,
            selected: false,
        };
        node.apply(scene, record);
        node
    }

    /// Mirror `record` onto the subtree. Keeps the insertion index and, if
    /// selected, the selection styling.
    pub fn apply<G: SceneGraph>(&mut self, scene: &mut G, record: &ObjectRecord) {
        if record.id != self.record.id {
            scene.set_texture(self.main, &record.main_texture());
            scene.set_texture(self.detail, &record.detail_texture());
        }
        if let Some(tint) = record.main_color.tint() {
            self.main_tint = tint;
        }
        if let Some(tint) = record.detail_color.tint() {
            self.detail_tint = tint;
        }
        self.record = record.clone();

        scene.set_transform(self.root, self.transform());
        scene.set_draw_order(self.root, self.draw_order());
        if self.selected {
            self.apply_selected_appearance(scene);
        } else {
            self.apply_record_appearance(scene);
        }
    }

    /// Destroy the whole subtree.
    pub fn destroy<G: SceneGraph>(self, scene: &mut G) {
        scene.remove(self.root);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn record(&self) -> &ObjectRecord {
        &self.record
    }

    /// Container node of the subtree.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn insertion(&self) -> u64 {
        self.insertion
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    #[must_use]
    pub fn draw_order(&self) -> DrawOrder {
        DrawOrder { z: self.record.z_order, insertion: self.insertion }
    }

    /// Container transform derived from the record. A flipped object mirrors
    /// horizontally; rotation is clockwise in degrees on the record.
    #[must_use]
    pub fn transform(&self) -> Transform {
        let s = self.record.scale;
        let sx = if self.record.flip { -s } else { s };
        Transform {
            position: self.record.position(),
            scale: Vector::new(sx, s),
            rotation: -self.record.rotation.to_radians(),
        }
    }

    /// Unscaled size of the main sprite in container units.
    #[must_use]
    pub fn local_size<G: SceneGraph>(&self, scene: &G) -> Vector {
        let px = scene.sprite_size(self.main).unwrap_or(Vector::ZERO);
        Vector::new(px.x.abs(), px.y.abs()) * OBJECT_SPRITE_SCALE
    }

    /// Size in world units, before rotation.
    #[must_use]
    pub fn size<G: SceneGraph>(&self, scene: &G) -> Vector {
        self.local_size(scene) * self.record.scale.abs()
    }

    /// Whether the world point `p` falls inside the object's rotated box.
    #[must_use]
    pub fn contains<G: SceneGraph>(&self, scene: &G, p: Vector) -> bool {
        let half = self.size(scene) / 2.0;
        let local = (p - self.record.position()).rotated(self.record.rotation.to_radians());
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }

    /// Apply or remove selection styling: select tint on both sprites and,
    /// when `outline` is set, a select box child.
    pub fn set_selected<G: SceneGraph>(&mut self, scene: &mut G, selected: bool, outline: bool) {
        self.selected = selected;
        if selected {
            self.apply_selected_appearance(scene);
            if outline {
                self.draw_outline(scene, SELECT_BOX, SELECT_BOX_PADDING, SELECT_BOX_COLOR, 1.0);
            } else {
                self.clear_overlay(scene, SELECT_BOX);
            }
        } else {
            self.clear_overlay(scene, SELECT_BOX);
            self.apply_record_appearance(scene);
        }
    }

    /// Hover highlight outline.
    pub fn set_highlight<G: SceneGraph>(&self, scene: &mut G, on: bool) {
        if on {
            let id = self.draw_outline(scene, HIGHLIGHT, HIGHLIGHT_PADDING, HIGHLIGHT_COLOR, 1.0);
            scene.set_appearance(id, Appearance { alpha: HIGHLIGHT_ALPHA, ..Appearance::default() });
        } else {
            self.clear_overlay(scene, HIGHLIGHT);
        }
    }

    /// Outline marking a hazardous object.
    pub fn set_danger_marker<G: SceneGraph>(&self, scene: &mut G, on: bool) {
        if on {
            self.draw_outline(scene, DANGER_MARKER, 0.0, DANGER_MARKER_COLOR, 1.0);
        } else {
            self.clear_overlay(scene, DANGER_MARKER);
        }
    }

    pub fn set_visible<G: SceneGraph>(&self, scene: &mut G, visible: bool) {
        scene.set_visible(self.root, visible);
    }

    /// Draw (or redraw) a rectangular outline child named `overlay`, padded
    /// by `padding` around the main sprite. Stroke width is one unit after
    /// the object's own scale.
    pub fn draw_outline<G: SceneGraph>(&self, scene: &mut G, overlay: &str, padding: f64, color: u32, alpha: f64) -> NodeId {
        let id = match scene.child_by_name(self.root, overlay) {
            Some(id) => id,
            None => scene.add_child(self.root, NodeSpec::graphics(overlay)),
        };
        let rect = Rect::centered(Vector::ZERO, self.local_size(scene)).padded(padding);
        let width = if self.record.scale.abs() > 0.0 { 1.0 / self.record.scale.abs() } else { 1.0 };
        scene.set_shapes(id, vec![Shape::RectOutline { rect, stroke: Stroke { width, color, alpha } }]);
        id
    }

    /// Remove an overlay child if present.
    pub fn clear_overlay<G: SceneGraph>(&self, scene: &mut G, overlay: &str) {
        if let Some(id) = scene.child_by_name(self.root, overlay) {
            scene.remove(id);
        }
    }

    fn apply_record_appearance<G: SceneGraph>(&self, scene: &mut G) {
        scene.set_appearance(self.main, Self::appearance(self.main_tint, &self.record.main_color));
        scene.set_appearance(self.detail, Self::appearance(self.detail_tint, &self.record.detail_color));
    }

    fn apply_selected_appearance<G: SceneGraph>(&self, scene: &mut G) {
        for (sprite, color) in [(self.main, &self.record.main_color), (self.detail, &self.record.detail_color)] {
            scene.set_appearance(sprite, Self::appearance(SELECT_TINT, color));
        }
    }

    fn appearance(tint: u32, color: &GdColor) -> Appearance {
        Appearance { tint, alpha: color.alpha(), additive: color.blending }
    }
}
