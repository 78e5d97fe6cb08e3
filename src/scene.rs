//! Editor node layout and per-tick scene composition.
//!
//! ```text
//! stage root
//! └── editor            camera transform applied here
//!     ├── grid          z -1, lines every grid cell
//!     ├── world         z 0, chunk containers (owned by the streamer)
//!     ├── preview       z 0, after world
//!     ├── ground        z 150, tinted tiling strip under the floor
//!     ├── ground_line   z 150, follows the camera x
//!     └── tooltip       z 300
//! ```
//!
//! The composer only draws. Deciding what is visible lives in
//! [`crate::streaming`]; deciding what is previewed lives in
//! [`crate::selection`].

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::consts::{
    GRID_LINE_ALPHA, GRID_LINE_COLOR, GROUND_LINE_TEXTURE, GROUND_SCALE, GROUND_TEXTURE, GROUND_TEXTURE_PX, GROUND_TINT,
    GROUND_Z, PREVIEW_BOX_COLOR, PREVIEW_BOX_PADDING,
};
use crate::geom::{Rect, Vector};
use crate::node::{ObjectNode, PREVIEW_BOX};
use crate::render::{Appearance, DrawOrder, NodeId, NodeSpec, SceneGraph, Shape, Stroke, Transform};

const TOOLTIP_Z: i32 = 300;

/// Fixed editor nodes and the state needed to redraw them lazily.
#[derive(Debug)]
pub struct SceneComposer {
    editor: NodeId,
    grid: NodeId,
    preview: NodeId,
    ground: NodeId,
    ground_line: NodeId,
    tooltip: NodeId,
    bounds: Rect,
    grid_spacing: f64,
    last_transform: Option<Transform>,
    last_viewport: Option<Vector>,
    grid_scale: Option<f64>,
}

impl SceneComposer {
    /// Build the fixed nodes under the stage root. The world container is
    /// added later by the streamer as a child of [`Self::editor`].
    pub fn new<G: SceneGraph>(scene: &mut G, config: &EditorConfig) -> Self {
        let root = scene.root();
        let editor = scene.add_child(root, NodeSpec::container("editor"));

        let grid = scene.add_child(editor, NodeSpec::graphics("grid"));
        scene.set_draw_order(grid, DrawOrder { z: -1, insertion: 0 });

        let preview = scene.add_child(editor, NodeSpec::container("preview"));
        scene.set_draw_order(preview, DrawOrder { z: 0, insertion: 1 });

        let bounds = config.bounds;
        let strip_height = GROUND_TEXTURE_PX * GROUND_SCALE;
        let ground = scene.add_child(
            editor,
            NodeSpec::tiling_sprite("ground", GROUND_TEXTURE, bounds.width(), strip_height),
        );
        scene.set_transform(ground, Transform::at(Vector::new(bounds.start.x, bounds.start.y - strip_height)));
        scene.set_appearance(ground, Appearance { tint: GROUND_TINT, ..Appearance::default() });
        scene.set_draw_order(ground, DrawOrder { z: GROUND_Z, insertion: 0 });

        let ground_line = scene.add_child(editor, NodeSpec::sprite("ground_line", GROUND_LINE_TEXTURE));
        scene.set_transform(ground_line, Transform::at(bounds.start));
        scene.set_draw_order(ground_line, DrawOrder { z: GROUND_Z, insertion: 1 });

        let tooltip = scene.add_child(editor, NodeSpec::container("tooltip"));
        scene.set_draw_order(tooltip, DrawOrder { z: TOOLTIP_Z, insertion: 0 });

        Self {
            editor,
            grid,
            preview,
            ground,
            ground_line,
            tooltip,
            bounds,
            grid_spacing: config.grid_spacing,
            last_transform: None,
            last_viewport: None,
            grid_scale: None,
        }
    }

    /// Apply the camera's forward transform and move the ground line under
    /// the camera. Returns whether the transform or viewport changed since
    /// the previous call.
    pub fn apply_camera<G: SceneGraph>(&mut self, scene: &mut G, camera: &Camera, viewport: Vector) -> bool {
        let transform = camera.world_transform();
        let changed = self.last_transform != Some(transform) || self.last_viewport != Some(viewport);
        if changed {
            scene.set_transform(self.editor, transform);
            self.last_transform = Some(transform);
            self.last_viewport = Some(viewport);
        }
        scene.set_transform(self.ground_line, Transform::at(Vector::new(camera.pos.x, self.bounds.start.y)));
        changed
    }

    /// Redraw the grid if the zoom scale changed: lines every grid cell
    /// across the whole world, one screen pixel thick.
    pub fn redraw_grid<G: SceneGraph>(&mut self, scene: &mut G, zoom_scale: f64) -> bool {
        if self.grid_scale == Some(zoom_scale) {
            return false;
        }
        self.grid_scale = Some(zoom_scale);
        let stroke = Stroke { width: 1.0 / zoom_scale, color: GRID_LINE_COLOR, alpha: GRID_LINE_ALPHA };
        let Rect { start, end } = self.bounds;
        let mut shapes = Vec::new();
        for x in grid_positions(start.x, end.x, self.grid_spacing) {
            shapes.push(Shape::Line { from: Vector::new(x, start.y), to: Vector::new(x, end.y), stroke });
        }
        for y in grid_positions(start.y, end.y, self.grid_spacing) {
            shapes.push(Shape::Line { from: Vector::new(start.x, y), to: Vector::new(end.x, y), stroke });
        }
        scene.set_shapes(self.grid, shapes);
        true
    }

    pub fn set_ground_visible<G: SceneGraph>(&self, scene: &mut G, visible: bool) {
        scene.set_visible(self.ground, visible);
        scene.set_visible(self.ground_line, visible);
    }

    /// Cyan box around the preview, padded and one unit thick in the
    /// preview's own scale.
    pub fn refresh_preview_box<G: SceneGraph>(&self, scene: &mut G, preview: Option<&ObjectNode>) {
        if let Some(node) = preview {
            node.draw_outline(scene, PREVIEW_BOX, PREVIEW_BOX_PADDING, PREVIEW_BOX_COLOR, 1.0);
        }
    }

    /// Container every other editor node hangs from.
    #[must_use]
    pub fn editor(&self) -> NodeId {
        self.editor
    }

    /// Parent of the preview node.
    #[must_use]
    pub fn preview_layer(&self) -> NodeId {
        self.preview
    }

    /// Parent of the tooltip label.
    #[must_use]
    pub fn tooltip_layer(&self) -> NodeId {
        self.tooltip
    }

    #[must_use]
    pub fn grid(&self) -> NodeId {
        self.grid
    }

    #[must_use]
    pub fn ground(&self) -> NodeId {
        self.ground
    }

    #[must_use]
    pub fn ground_line(&self) -> NodeId {
        self.ground_line
    }
}

/// `start, start + step, ...` up to and including `end`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn grid_positions(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = if step > 0.0 && end >= start { ((end - start) / step).floor() as u64 } else { 0 };
    (0..=count).map(move |k| start + k as f64 * step)
}
