//! Shared numeric constants for the editor core.

use crate::geom::Vector;

// ── World ───────────────────────────────────────────────────────

/// Edge length of one grid cell in world units. Object positions, grid
/// lines and chunk sizes are all multiples of this.
pub const GRID_CELL: f64 = 30.0;

/// Minimum corner of the editable world.
pub const LEVEL_START: Vector = Vector::new(0.0, 0.0);

/// Maximum corner of the editable world (3000 × 80 cells).
pub const LEVEL_END: Vector = Vector::new(GRID_CELL * 3000.0, GRID_CELL * 80.0);

/// Grid cells per chunk edge.
pub const CHUNK_CELLS: f64 = 20.0;

/// Size of one streaming chunk in world units.
pub const CHUNK_SIZE: Vector = Vector::new(CHUNK_CELLS * GRID_CELL, CHUNK_CELLS * GRID_CELL);

/// New sessions without a saved camera spawn at a random x in `[0, SPAWN_MAX_X)`.
pub const SPAWN_MAX_X: f64 = GRID_CELL * 1000.0;

// ── Camera ──────────────────────────────────────────────────────

pub const MIN_ZOOM: i32 = -36;
pub const MAX_ZOOM: i32 = 36;

/// Zoom levels per doubling of scale.
pub const ZOOM_STEPS_PER_OCTAVE: f64 = 8.0;

/// Pointer travel in screen pixels before a press becomes a pan.
pub const DRAG_THRESHOLD_PX: f64 = 4.0;

// ── Streaming ───────────────────────────────────────────────────

/// A chunk outside the visible set for longer than this is unloaded.
pub const IDLE_UNLOAD_MS: f64 = 10_000.0;

/// Interval between idle sweeps.
pub const SWEEP_INTERVAL_MS: f64 = 5_000.0;

// ── Grid & ground ───────────────────────────────────────────────

pub const GRID_LINE_COLOR: u32 = 0x00_0000;
pub const GRID_LINE_ALPHA: f64 = 0.35;

pub const GROUND_TEXTURE: &str = "world/ground.png";
pub const GROUND_LINE_TEXTURE: &str = "world/ground_line.png";
pub const GROUND_TEXTURE_PX: f64 = 512.0;
/// Ground texture scale: the strip is 4.25 cells tall.
pub const GROUND_SCALE: f64 = (GRID_CELL * 4.25) / GROUND_TEXTURE_PX;
pub const GROUND_TINT: u32 = 0x28_7dff;
/// Ground draws above every object (object z-order tops out at 100).
pub const GROUND_Z: i32 = 150;

// ── Objects ─────────────────────────────────────────────────────

/// Sprite scale applied to object textures (texture pixels → world units).
pub const OBJECT_SPRITE_SCALE: f64 = 0.25;

/// Texture size assumed when the renderer cannot report one.
pub const DEFAULT_OBJECT_TEXTURE_PX: f64 = 120.0;

pub const PREVIEW_SCALE_MIN: f64 = 0.5;
pub const PREVIEW_SCALE_MAX: f64 = 2.0;
pub const PREVIEW_Z_MIN: i32 = 1;
pub const PREVIEW_Z_MAX: i32 = 100;

pub const PREVIEW_BOX_PADDING: f64 = 5.0;
pub const PREVIEW_BOX_COLOR: u32 = 0x00_ffff;

pub const SELECT_TINT: u32 = 0x00_ff00;
pub const SELECT_BOX_COLOR: u32 = 0x00_ff00;
pub const SELECT_BOX_PADDING: f64 = 3.0;

pub const HIGHLIGHT_COLOR: u32 = 0x46_f0fc;
pub const HIGHLIGHT_ALPHA: f64 = 0.5;
pub const HIGHLIGHT_PADDING: f64 = 2.0;

pub const DANGER_MARKER_COLOR: u32 = 0xff_3030;

// ── Tooltip ─────────────────────────────────────────────────────

pub const HOVER_DEBOUNCE_MS: f64 = 250.0;
pub const TOOLTIP_PREFIX: &str = "Placed By:";
pub const TOOLTIP_PADDING: f64 = 5.0;
pub const TOOLTIP_CORNER_RADIUS: f64 = 5.0;
pub const TOOLTIP_BACKGROUND_ALPHA: f64 = 0.7;
pub const TOOLTIP_PREFIX_COLOR: u32 = 0xff_ffff;
pub const TOOLTIP_PREFIX_ALPHA: f64 = 0.53;
/// Label size on screen, in pixels, before clamping into world units.
pub const TOOLTIP_SCREEN_FONT_PX: f64 = 12.0;
pub const TOOLTIP_FONT_MIN: f64 = 6.0;
pub const TOOLTIP_FONT_MAX: f64 = 20.0;
/// Prefix text is drawn slightly smaller than the username.
pub const TOOLTIP_PREFIX_FONT_RATIO: f64 = 0.8;
pub const DEFAULT_DISPLAY_COLOR: u32 = 0xff_ffff;
