//! Editor tools, pointer buttons, keys, and the press/drag gesture machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the gesture tracked between pointer-down and
//! pointer-up. A press stays a click until the pointer travels more than
//! [`DRAG_THRESHOLD_PX`]; after that it becomes a pan, or a move of the
//! selected object when the edit tool pressed on it.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::DRAG_THRESHOLD_PX;
use crate::geom::Vector;
use crate::hit::Hit;

/// Active editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Place the preview object where the user clicks (default).
    #[default]
    Build,
    /// Select placed objects and drag them around.
    Edit,
    /// Delete the clicked object.
    Delete,
}

impl Tool {
    /// Whether this tool shows the preview under the pointer.
    #[must_use]
    pub fn uses_preview(self) -> bool {
        matches!(self, Self::Build)
    }
}

/// Modifier keys held during a pointer event. Alt disables grid snapping.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer button. Only `Primary` clicks; the others always pan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left button or a one-finger touch.
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }

    #[must_use]
    pub fn is_enter(&self) -> bool {
        self.0 == "Enter"
    }

    /// Unit direction of an arrow key in world space (y-up).
    #[must_use]
    pub fn arrow_direction(&self) -> Option<Vector> {
        match self.0.as_str() {
            "ArrowLeft" => Some(Vector::new(-1.0, 0.0)),
            "ArrowRight" => Some(Vector::new(1.0, 0.0)),
            "ArrowUp" => Some(Vector::new(0.0, 1.0)),
            "ArrowDown" => Some(Vector::new(0.0, -1.0)),
            _ => None,
        }
    }
}

/// Scroll delta of one wheel event.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal pixels; ignored for zoom.
    pub dx: f64,
    /// Vertical pixels, positive when scrolling down.
    pub dy: f64,
}

impl WheelDelta {
    /// Zoom levels to apply: one step per wheel event, in for scroll up.
    #[must_use]
    pub fn zoom_steps(self) -> i32 {
        if self.dy < 0.0 {
            1
        } else if self.dy > 0.0 {
            -1
        } else {
            0
        }
    }
}

/// Gesture between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// Nothing pressed. Pointer moves only hover.
    #[default]
    Idle,
    /// Primary button down, not yet moved past the drag threshold.
    Pressed {
        /// Screen position of the pointer-down.
        start_screen: Vector,
        /// Object under the pointer at pointer-down.
        hit: Option<Hit>,
    },
    /// The user is panning the camera.
    Panning {
        /// Screen position of the previous move; the next move pans by the difference.
        last_screen: Vector,
    },
    /// The user is dragging the selected object; it is written to the store
    /// on release.
    DraggingObject {
        /// The object being dragged.
        hit: Hit,
        /// World offset from the pointer to the object's position.
        grab_offset: Vector,
        /// Latest world position of the pointer.
        last_world: Vector,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Whether the pointer moved far enough from `start` to count as a drag.
#[must_use]
pub fn exceeds_drag_threshold(start: Vector, now: Vector) -> bool {
    (now - start).length() > DRAG_THRESHOLD_PX
}
