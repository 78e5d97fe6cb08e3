//! Object records: the persisted shape of a placed level object.
//!
//! Records travel to and from the remote store as camelCase JSON. The store
//! keys each record by its name, so the name is carried next to the record
//! rather than inside it.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use serde::{Deserialize, Serialize};

use crate::consts::{PREVIEW_SCALE_MAX, PREVIEW_SCALE_MIN, PREVIEW_Z_MAX, PREVIEW_Z_MIN};
use crate::geom::{Rect, Vector, clamp, wrap};

/// Unique store key of a placed object.
pub type ObjectName = String;

/// Colour channel of an object (main or detail sprite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdColor {
    /// Six hex digits without a leading `#`. Empty means "untinted".
    #[serde(default)]
    pub hex: String,
    /// Additive blending.
    #[serde(default)]
    pub blending: bool,
    /// Opacity in `[0, 1]`. Zero is treated as "unset" and renders opaque.
    #[serde(default)]
    pub opacity: f64,
}

impl Default for GdColor {
    fn default() -> Self {
        Self { hex: "ffffff".to_owned(), blending: false, opacity: 1.0 }
    }
}

impl GdColor {
    #[must_use]
    pub fn new(hex: impl Into<String>, blending: bool, opacity: f64) -> Self {
        Self { hex: hex.into(), blending, opacity }
    }

    /// Parsed tint, or `None` when the hex string is empty or malformed.
    #[must_use]
    pub fn tint(&self) -> Option<u32> {
        parse_hex_color(&self.hex)
    }

    /// Effective sprite alpha.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        if self.opacity > 0.0 { clamp(self.opacity, 0.0, 1.0) } else { 1.0 }
    }
}

fn one() -> f64 {
    1.0
}

/// A placed object as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Object type id; selects the main and detail textures.
    pub id: u32,
    /// Center x in world units.
    pub x: f64,
    /// Center y in world units (Y-up).
    pub y: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Uniform scale factor.
    #[serde(default = "one")]
    pub scale: f64,
    /// Horizontal flip.
    #[serde(default)]
    pub flip: bool,
    /// Draw priority; higher draws on top.
    #[serde(default)]
    pub z_order: i32,
    #[serde(default)]
    pub main_color: GdColor,
    #[serde(default)]
    pub detail_color: GdColor,
}

impl ObjectRecord {
    /// A default-styled object of type `id` at `position`.
    #[must_use]
    pub fn new(id: u32, position: Vector) -> Self {
        Self {
            id,
            x: position.x,
            y: position.y,
            rotation: 0.0,
            scale: 1.0,
            flip: false,
            z_order: PREVIEW_Z_MIN,
            main_color: GdColor::default(),
            detail_color: GdColor::default(),
        }
    }

    #[must_use]
    pub fn position(&self) -> Vector {
        Vector::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Vector) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Force every editable field into its valid range: position inside
    /// `bounds`, rotation in `[0, 360)`, scale in `[0.5, 2]`, z-order in
    /// `[1, 100]`.
    pub fn correct(&mut self, bounds: &Rect) {
        self.x = clamp(self.x, bounds.start.x, bounds.end.x);
        self.y = clamp(self.y, bounds.start.y, bounds.end.y);
        self.rotation = wrap(self.rotation, 0.0, 360.0);
        self.scale = clamp(self.scale, PREVIEW_SCALE_MIN, PREVIEW_SCALE_MAX);
        self.z_order = self.z_order.clamp(PREVIEW_Z_MIN, PREVIEW_Z_MAX);
    }

    /// Texture path of the main sprite.
    #[must_use]
    pub fn main_texture(&self) -> String {
        format!("objects/main/{}.png", self.id)
    }

    /// Texture path of the detail sprite.
    #[must_use]
    pub fn detail_texture(&self) -> String {
        format!("objects/detail/{}.png", self.id)
    }
}

/// Parse a six-digit hex colour, with or without a leading `#`.
#[must_use]
pub fn parse_hex_color(raw: &str) -> Option<u32> {
    let digits = raw.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return None;
    }
    match u32::from_str_radix(digits, 16) {
        Ok(value) => Some(value),
        Err(_) => None,
    }
}
