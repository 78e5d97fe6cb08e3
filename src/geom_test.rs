#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// =============================================================
// Vector
// =============================================================

#[test]
fn vector_arithmetic() {
    let a = Vector::new(3.0, 4.0);
    let b = Vector::new(1.0, -2.0);
    assert_eq!(a + b, Vector::new(4.0, 2.0));
    assert_eq!(a - b, Vector::new(2.0, 6.0));
    assert_eq!(a * 2.0, Vector::new(6.0, 8.0));
    assert_eq!(a / 2.0, Vector::new(1.5, 2.0));
    assert_eq!(-a, Vector::new(-3.0, -4.0));
}

#[test]
fn vector_clamped_inside_is_unchanged() {
    let v = Vector::new(5.0, 5.0).clamped(Vector::ZERO, Vector::new(10.0, 10.0));
    assert_eq!(v, Vector::new(5.0, 5.0));
}

#[test]
fn vector_clamped_outside_snaps_to_edges() {
    let v = Vector::new(-5.0, 50.0).clamped(Vector::ZERO, Vector::new(10.0, 10.0));
    assert_eq!(v, Vector::new(0.0, 10.0));
}

#[test]
fn vector_length() {
    assert_eq!(Vector::new(3.0, -4.0).length(), 5.0);
    assert_eq!(Vector::ZERO.length(), 0.0);
}

#[test]
fn vector_flip_y() {
    assert_eq!(Vector::new(2.0, 3.0).flip_y(), Vector::new(2.0, -3.0));
}

#[test]
fn vector_rotated_quarter_turn() {
    let v = Vector::new(1.0, 0.0).rotated(std::f64::consts::FRAC_PI_2);
    assert!(approx_eq(v.x, 0.0));
    assert!(approx_eq(v.y, 1.0));
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_from_corners_normalizes() {
    let r = Rect::from_corners(Vector::new(10.0, -5.0), Vector::new(-2.0, 7.0));
    assert_eq!(r.start, Vector::new(-2.0, -5.0));
    assert_eq!(r.end, Vector::new(10.0, 7.0));
    assert_eq!(r.width(), 12.0);
    assert_eq!(r.height(), 12.0);
}

#[test]
fn rect_centered() {
    let r = Rect::centered(Vector::new(10.0, 10.0), Vector::new(4.0, 2.0));
    assert_eq!(r.start, Vector::new(8.0, 9.0));
    assert_eq!(r.end, Vector::new(12.0, 11.0));
    assert_eq!(r.center(), Vector::new(10.0, 10.0));
}

#[test]
fn rect_contains_is_inclusive() {
    let r = Rect::new(Vector::ZERO, Vector::new(10.0, 10.0));
    assert!(r.contains(Vector::new(0.0, 0.0)));
    assert!(r.contains(Vector::new(10.0, 10.0)));
    assert!(!r.contains(Vector::new(10.1, 5.0)));
}

#[test]
fn rect_clamped_collapses_outside_rect() {
    let bounds = Rect::new(Vector::ZERO, Vector::new(100.0, 100.0));
    let r = Rect::new(Vector::new(200.0, 10.0), Vector::new(300.0, 20.0)).clamped(&bounds);
    assert_eq!(r.width(), 0.0);
    assert_eq!(r.start.x, 100.0);
}

#[test]
fn rect_padded() {
    let r = Rect::new(Vector::ZERO, Vector::new(10.0, 10.0)).padded(5.0);
    assert_eq!(r.start, Vector::new(-5.0, -5.0));
    assert_eq!(r.end, Vector::new(15.0, 15.0));
}

// =============================================================
// clamp / wrap
// =============================================================

#[test]
fn clamp_basic() {
    assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
    assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
    assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
}

#[test]
fn clamp_nan_resolves_to_min() {
    assert_eq!(clamp(f64::NAN, 1.0, 2.0), 1.0);
}

#[test]
fn clamp_inverted_range_does_not_panic() {
    assert_eq!(clamp(5.0, 10.0, 0.0), 10.0);
}

#[test]
fn wrap_in_range_is_unchanged() {
    assert_eq!(wrap(90.0, 0.0, 360.0), 90.0);
}

#[test]
fn wrap_large_negative() {
    // -7000 = -20 * 360 + 200
    assert!(approx_eq(wrap(-7000.0, 0.0, 360.0), 200.0));
}

#[test]
fn wrap_upper_bound_is_exclusive() {
    assert_eq!(wrap(360.0, 0.0, 360.0), 0.0);
    assert_eq!(wrap(720.0, 0.0, 360.0), 0.0);
}

#[test]
fn wrap_tiny_negative_stays_below_max() {
    let w = wrap(-1e-20, 0.0, 360.0);
    assert!((0.0..360.0).contains(&w));
}

#[test]
fn wrap_non_finite_resolves_to_min() {
    assert_eq!(wrap(f64::INFINITY, 0.0, 360.0), 0.0);
    assert_eq!(wrap(f64::NAN, 0.0, 360.0), 0.0);
}

// =============================================================
// snap_to_cell
// =============================================================

#[test]
fn snap_to_cell_centres() {
    assert_eq!(snap_to_cell(Vector::new(0.0, 29.9), 30.0), Vector::new(15.0, 15.0));
    assert_eq!(snap_to_cell(Vector::new(31.0, 61.0), 30.0), Vector::new(45.0, 75.0));
    assert_eq!(snap_to_cell(Vector::new(-1.0, 0.0), 30.0), Vector::new(-15.0, 15.0));
}

#[test]
fn snap_to_cell_ignores_bad_cell() {
    let p = Vector::new(7.0, 8.0);
    assert_eq!(snap_to_cell(p, 0.0), p);
    assert_eq!(snap_to_cell(p, f64::NAN), p);
}
