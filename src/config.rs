//! Editor configuration with environment overrides.
//!
//! Defaults come from [`crate::consts`]. Hosts that can read environment
//! variables (native builds, tests) may use [`EditorConfig::from_env`]; the
//! browser host uses [`EditorConfig::default`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::BTreeSet;

use tracing::warn;

use crate::consts::{
    CHUNK_SIZE, GRID_CELL, HOVER_DEBOUNCE_MS, IDLE_UNLOAD_MS, LEVEL_END, LEVEL_START, MAX_ZOOM, MIN_ZOOM,
    SWEEP_INTERVAL_MS,
};
use crate::geom::{Rect, Vector};

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Editable world rectangle; camera and objects are clamped into it.
    pub bounds: Rect,
    /// Streaming chunk size in world units.
    pub chunk_size: Vector,
    /// Spacing of background grid lines in world units.
    pub grid_spacing: f64,
    pub min_zoom: i32,
    pub max_zoom: i32,
    /// How long a chunk may stay off-screen before the sweep unloads it.
    pub idle_unload_ms: f64,
    /// Interval between idle sweeps.
    pub sweep_interval_ms: f64,
    /// Hover duration before the attribution tooltip resolves.
    pub hover_debounce_ms: f64,
    /// Object type ids hidden by the "hide decoration objects" toggle.
    pub deco_object_ids: BTreeSet<u32>,
    /// Object type ids marked by the "reveal dangerous objects" toggle.
    pub danger_object_ids: BTreeSet<u32>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::new(LEVEL_START, LEVEL_END),
            chunk_size: CHUNK_SIZE,
            grid_spacing: GRID_CELL,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            idle_unload_ms: IDLE_UNLOAD_MS,
            sweep_interval_ms: SWEEP_INTERVAL_MS,
            hover_debounce_ms: HOVER_DEBOUNCE_MS,
            deco_object_ids: BTreeSet::new(),
            danger_object_ids: BTreeSet::new(),
        }
    }
}

impl EditorConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `EDITOR_CHUNK_WIDTH`, `EDITOR_CHUNK_HEIGHT`: chunk size in world units
    /// - `EDITOR_IDLE_UNLOAD_MS`: default 10000
    /// - `EDITOR_SWEEP_INTERVAL_MS`: default 5000
    /// - `EDITOR_HOVER_DEBOUNCE_MS`: default 250
    /// - `EDITOR_DECO_IDS`, `EDITOR_DANGER_IDS`: comma-separated object type ids
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build config from an arbitrary key lookup. Unparseable values fall
    /// back to the default for that key.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let chunk_size = Vector::new(
            positive(parse_or(&lookup, "EDITOR_CHUNK_WIDTH", defaults.chunk_size.x), defaults.chunk_size.x),
            positive(parse_or(&lookup, "EDITOR_CHUNK_HEIGHT", defaults.chunk_size.y), defaults.chunk_size.y),
        );
        Self {
            chunk_size,
            idle_unload_ms: parse_or(&lookup, "EDITOR_IDLE_UNLOAD_MS", defaults.idle_unload_ms),
            sweep_interval_ms: parse_or(&lookup, "EDITOR_SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
            hover_debounce_ms: parse_or(&lookup, "EDITOR_HOVER_DEBOUNCE_MS", defaults.hover_debounce_ms),
            deco_object_ids: parse_ids(lookup("EDITOR_DECO_IDS").as_deref()),
            danger_object_ids: parse_ids(lookup("EDITOR_DANGER_IDS").as_deref()),
            ..defaults
        }
    }

    /// Clamp a zoom level into the configured range.
    #[must_use]
    pub fn clamp_zoom(&self, level: i32) -> i32 {
        level.clamp(self.min_zoom, self.max_zoom.max(self.min_zoom))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match lookup(key).map(|v| v.trim().parse::<T>()) {
        Some(Ok(value)) => value,
        Some(Err(_)) => {
            warn!(key, "ignoring unparseable config override");
            default
        }
        None => default,
    }
}

fn positive(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { default }
}

fn parse_ids(raw: Option<&str>) -> BTreeSet<u32> {
    raw.map(|s| {
        s.split(',')
            .flat_map(|part| part.trim().parse::<u32>())
            .collect()
    })
    .unwrap_or_default()
}
