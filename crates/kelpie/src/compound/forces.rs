//! Force terms of the compound force-directed placement.
//!
//! All distances are boundary-to-boundary (clipped) so forces act on the gap
//! between boxes, not on center distance. Every function is zero-length safe:
//! coincident centers fall back to a tie-broken random unit direction and no
//! input can produce NaN.

use crate::geometry::{Point, Rect, clipped_distance};
use crate::rng::XorShift64Star;

/// Constants the force math needs, snapshotted once per level simulation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ForceParams {
    pub ideal_edge_length: f64,
    pub elastic_constant: f64,
    pub repulsion_constant: f64,
    /// Hard cutoff: pairs with a larger boundary gap exert no repulsion.
    pub repulsion_range: f64,
    /// Floor for the repulsion distance; also the minimum enforced
    /// separation for overlapping boxes.
    pub min_repulsion_distance: f64,
    pub gravitation_factor: f64,
    pub nesting_factor: f64,
}

/// Unit vector from `from` towards `to`, with a random tie-broken direction
/// when the points coincide.
pub(crate) fn direction(from: Point, to: Point, rng: &mut XorShift64Star) -> (f64, f64) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return rng.unit_direction();
    }
    (dx / len, dy / len)
}

/// Hookean spring anchored at the ideal edge length, acting on the clipped
/// distance between the two boxes. Returns the force on `a`; `b` receives the
/// negation. The force is exactly zero at the rest length, pulls `a` towards
/// `b` when the gap is too wide and pushes when it is too narrow.
pub(crate) fn spring_force(
    a: &Rect,
    b: &Rect,
    fp: &ForceParams,
    rng: &mut XorShift64Star,
) -> (f64, f64) {
    let gap = clipped_distance(a, b);
    let diff = gap - fp.ideal_edge_length;
    if diff == 0.0 {
        return (0.0, 0.0);
    }
    let magnitude = diff * diff / fp.elastic_constant;
    let (ux, uy) = direction(a.center, b.center, rng);
    if diff > 0.0 {
        (magnitude * ux, magnitude * uy)
    } else {
        (-magnitude * ux, -magnitude * uy)
    }
}

/// Repulsion of `a` away from `b`; `b` receives the negation. `None` when the
/// pair is beyond the repulsion range — a hard cutoff, not an attenuation,
/// which is what makes spatial pruning of the pair enumeration sound.
///
/// The falloff exponent is 2 when the center separation and the boundary
/// separation point the same way (the boxes are roughly aligned with their
/// separation vector) and 1 otherwise.
pub(crate) fn repulsion_force(
    a: &Rect,
    b: &Rect,
    fp: &ForceParams,
    rng: &mut XorShift64Star,
) -> Option<(f64, f64)> {
    let gap = clipped_distance(a, b);
    if gap > fp.repulsion_range {
        return None;
    }

    let (ux, uy) = direction(b.center, a.center, rng);

    let clip_a = a.clip_point_towards(b.center);
    let clip_b = b.clip_point_towards(a.center);
    let center_dx = a.center.x - b.center.x;
    let center_dy = a.center.y - b.center.y;
    let clip_dx = clip_a.x - clip_b.x;
    let clip_dy = clip_a.y - clip_b.y;
    let aligned = center_dx * clip_dx + center_dy * clip_dy > 0.0;

    let d = gap.max(fp.min_repulsion_distance);
    let magnitude = if aligned {
        fp.repulsion_constant / (d * d)
    } else {
        fp.repulsion_constant / d
    };
    Some((magnitude * ux, magnitude * uy))
}

/// Linear pull towards the gravitation center, normalized by the ideal edge
/// length so the factor is scale free. Keeps disconnected components from
/// drifting apart indefinitely.
pub(crate) fn gravity_force(position: Point, center: Point, fp: &ForceParams) -> (f64, f64) {
    let scale = fp.gravitation_factor / fp.ideal_edge_length;
    ((center.x - position.x) * scale, (center.y - position.y) * scale)
}

/// Pulls a box back towards the nearest fully-contained placement when it
/// protrudes from the level bound. Zero while the box is inside.
pub(crate) fn containment_force(rect: &Rect, bound: &Rect, fp: &ForceParams) -> (f64, f64) {
    let target_x = clamp_axis(
        rect.center.x,
        bound.left() + rect.half_width(),
        bound.right() - rect.half_width(),
        bound.center.x,
    );
    let target_y = clamp_axis(
        rect.center.y,
        bound.top() + rect.half_height(),
        bound.bottom() - rect.half_height(),
        bound.center.y,
    );
    (
        (target_x - rect.center.x) * fp.nesting_factor,
        (target_y - rect.center.y) * fp.nesting_factor,
    )
}

/// Clamp with a degenerate-interval fallback: a box wider than the bound has
/// no contained placement, so it is pulled to the bound's midline.
fn clamp_axis(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if lo > hi {
        return fallback;
    }
    value.clamp(lo, hi)
}
