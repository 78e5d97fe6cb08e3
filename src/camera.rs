//! Camera position, exponential zoom, and screen/world transforms.
//!
//! World space is y-up; screen space is y-down with the origin at the
//! viewport's top-left corner. The camera position is the world point shown
//! at the viewport centre.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::consts::{SPAWN_MAX_X, ZOOM_STEPS_PER_OCTAVE};
use crate::geom::{Rect, Vector};
use crate::render::Transform;

/// Camera state for pan/zoom over the level.
///
/// `pos` is in world units. `zoom_level` is an integer step; the rendered
/// scale is `2^(zoom_level / 8)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub pos: Vector,
    pub zoom_level: i32,
}

impl Camera {
    #[must_use]
    pub fn new(pos: Vector, zoom_level: i32) -> Self {
        Self { pos, zoom_level }
    }

    /// Fresh-session camera: random x in `[0, SPAWN_MAX_X)`, ground level, no zoom.
    pub fn spawn(rng: &mut impl Rng) -> Self {
        Self { pos: Vector::new(rng.random_range(0.0..SPAWN_MAX_X), 0.0), zoom_level: 0 }
    }

    /// Screen pixels per world unit.
    #[must_use]
    pub fn zoom_scale(&self) -> f64 {
        2f64.powf(f64::from(self.zoom_level) / ZOOM_STEPS_PER_OCTAVE)
    }

    /// Convert a screen-space point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Vector, viewport: Vector) -> Vector {
        ((screen - viewport / 2.0) / self.zoom_scale()).flip_y() + self.pos
    }

    /// Convert a world-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Vector, viewport: Vector) -> Vector {
        (world - self.pos).flip_y() * self.zoom_scale() + viewport / 2.0
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom_scale()
    }

    /// World rectangle covered by the viewport, normalised so `start <= end`.
    #[must_use]
    pub fn visible_world_rect(&self, viewport: Vector) -> Rect {
        Rect::from_corners(self.screen_to_world(Vector::ZERO, viewport), self.screen_to_world(viewport, viewport))
    }

    /// Keep the camera inside `bounds`.
    pub fn clamp_to(&mut self, bounds: &Rect) {
        self.pos = self.pos.clamped(bounds.start, bounds.end);
    }

    /// Move the camera so the world follows a pointer drag of `delta` screen pixels.
    pub fn pan_by_screen(&mut self, delta: Vector) {
        self.pos = self.pos - (delta / self.zoom_scale()).flip_y();
    }

    /// Change the zoom level by `steps`, keeping the world point under the
    /// screen `anchor` fixed. Returns whether the level changed.
    pub fn zoom_at(&mut self, steps: i32, anchor: Vector, viewport: Vector, config: &EditorConfig) -> bool {
        let level = config.clamp_zoom(self.zoom_level.saturating_add(steps));
        if level == self.zoom_level {
            return false;
        }
        let before = self.screen_to_world(anchor, viewport);
        self.zoom_level = level;
        let after = self.screen_to_world(anchor, viewport);
        self.pos = self.pos + (before - after);
        true
    }

    /// Forward transform of the world container: translation `-pos * scale`,
    /// uniform scale. The host's stage root centres the viewport and flips y.
    #[must_use]
    pub fn world_transform(&self) -> Transform {
        let scale = self.zoom_scale();
        Transform::scaled(-self.pos * scale, scale)
    }

    #[must_use]
    pub fn to_saved(&self) -> SavedCamera {
        SavedCamera { x: self.pos.x, y: self.pos.y, zoom: self.zoom_level }
    }
}

/// Camera position persisted by the host between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedCamera {
    pub x: f64,
    pub y: f64,
    pub zoom: i32,
}

impl From<SavedCamera> for Camera {
    fn from(saved: SavedCamera) -> Self {
        Self { pos: Vector::new(saved.x, saved.y), zoom_level: saved.zoom }
    }
}
