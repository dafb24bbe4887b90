//! Overlap removal for vertex rectangles.
//!
//! The skeleton is fixed: inflate every rectangle by half the configured gap
//! per side, run a pluggable resolution strategy until no two rectangles
//! intersect, deflate back, and write the results into the caller's map in
//! place. The gap is therefore enforced implicitly; the strategy only has to
//! eliminate plain overlap.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::parameters::{LayoutParameters, ensure_non_negative, near_eq};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlapRemovalParameters {
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
}

impl Default for OverlapRemovalParameters {
    fn default() -> Self {
        Self {
            horizontal_gap: 10.0,
            vertical_gap: 10.0,
        }
    }
}

impl LayoutParameters for OverlapRemovalParameters {
    fn validate(&self) -> Result<()> {
        ensure_non_negative("horizontal_gap", self.horizontal_gap)?;
        ensure_non_negative("vertical_gap", self.vertical_gap)?;
        Ok(())
    }

    fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if !near_eq(self.horizontal_gap, other.horizontal_gap) {
            changed.push("horizontal_gap");
        }
        if !near_eq(self.vertical_gap, other.vertical_gap) {
            changed.push("vertical_gap");
        }
        changed
    }
}

/// One rectangle under resolution, tagged with its opaque owner key.
#[derive(Debug, Clone)]
pub struct OverlapItem<K> {
    pub key: K,
    pub rect: Rect,
}

/// The pluggable interior step of the engine: reposition the (already
/// gap-inflated) rectangles so that no two intersect.
pub trait OverlapResolver {
    fn resolve<K: Ord>(&mut self, items: &mut [OverlapItem<K>]);
}

/// Removes all pairwise overlap among `rects`, keeping at least the
/// configured gaps between them, using the default [`ScanResolver`].
pub fn remove_overlaps<K>(
    rects: &mut FxHashMap<K, Rect>,
    parameters: &OverlapRemovalParameters,
) -> Result<()>
where
    K: Clone + Ord + Hash + Display,
{
    remove_overlaps_with(rects, parameters, &mut ScanResolver)
}

/// Same as [`remove_overlaps`] with a caller-chosen strategy.
pub fn remove_overlaps_with<K, R>(
    rects: &mut FxHashMap<K, Rect>,
    parameters: &OverlapRemovalParameters,
    resolver: &mut R,
) -> Result<()>
where
    K: Clone + Ord + Hash + Display,
    R: OverlapResolver,
{
    parameters.validate()?;
    for (key, rect) in rects.iter() {
        if !rect.is_finite() || rect.size.width < 0.0 || rect.size.height < 0.0 {
            return Err(Error::NonFiniteInput {
                owner: key.to_string(),
            });
        }
    }
    if rects.len() <= 1 {
        return Ok(());
    }

    let half_h = parameters.horizontal_gap / 2.0;
    let half_v = parameters.vertical_gap / 2.0;

    // Sorted by key so the run is deterministic regardless of map iteration
    // order.
    let mut items: Vec<OverlapItem<K>> = rects
        .iter()
        .map(|(key, rect)| OverlapItem {
            key: key.clone(),
            rect: rect.inflate(half_h, half_v),
        })
        .collect();
    items.sort_by(|a, b| a.key.cmp(&b.key));

    resolver.resolve(&mut items);

    for item in items {
        rects.insert(item.key, item.rect.inflate(-half_h, -half_v));
    }
    Ok(())
}

/// Deterministic two-pass scan strategy.
///
/// The horizontal pass walks rectangles in center-x order and pushes each one
/// rightwards past earlier rectangles when the horizontal separation is the
/// cheaper axis for that pair. The vertical pass then walks in center-y order
/// and pushes downwards to clear every remaining overlap. After the vertical
/// pass any pair either has disjoint x-intervals or was pushed apart in y, so
/// the result has zero pairwise overlap; a second run finds nothing to move.
#[derive(Debug, Default)]
pub struct ScanResolver;

impl OverlapResolver for ScanResolver {
    fn resolve<K: Ord>(&mut self, items: &mut [OverlapItem<K>]) {
        horizontal_pass(items);
        vertical_pass(items);
    }
}

/// Overlap below this threshold counts as resolved. Push amounts are computed
/// from rectangle edges and can undershoot by an ulp; without the tolerance a
/// second run would chase that residue and the fixed point would never be
/// exact.
const RESOLVE_EPS: f64 = 1e-9;

fn overlap_amounts(a: &Rect, b: &Rect) -> Option<(f64, f64)> {
    let overlap_x = a.right().min(b.right()) - a.left().max(b.left());
    let overlap_y = a.bottom().min(b.bottom()) - a.top().max(b.top());
    if overlap_x > RESOLVE_EPS && overlap_y > RESOLVE_EPS {
        Some((overlap_x, overlap_y))
    } else {
        None
    }
}

fn sorted_order<K: Ord>(items: &[OverlapItem<K>], by_y: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        let (ca, cb) = if by_y {
            (items[a].rect.center.y, items[b].rect.center.y)
        } else {
            (items[a].rect.center.x, items[b].rect.center.x)
        };
        ca.partial_cmp(&cb)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| items[a].key.cmp(&items[b].key))
    });
    order
}

/// Pushes rectangle `i` rightwards past already-placed rectangles where the
/// x axis is the cheaper separation direction.
fn horizontal_pass<K: Ord>(items: &mut [OverlapItem<K>]) {
    let order = sorted_order(items, false);

    for (pos, &i) in order.iter().enumerate() {
        // Each pass either clears the placed set or moves strictly right, so
        // one retry per placed rectangle suffices.
        for _ in 0..=pos {
            let mut shift: Option<f64> = None;
            for &j in &order[..pos] {
                let (a, b) = (&items[i].rect, &items[j].rect);
                let Some((overlap_x, overlap_y)) = overlap_amounts(a, b) else {
                    continue;
                };
                if overlap_x <= overlap_y {
                    let needed = b.right() - a.left();
                    shift = Some(shift.map_or(needed, |s: f64| s.max(needed)));
                }
            }
            match shift {
                Some(dx) => items[i].rect.center.x += dx,
                None => break,
            }
        }
    }
}

/// Pushes rectangle `i` downwards until it clears every already-placed
/// rectangle. This pass resolves all overlap left behind by the horizontal
/// pass.
fn vertical_pass<K: Ord>(items: &mut [OverlapItem<K>]) {
    let order = sorted_order(items, true);

    for (pos, &i) in order.iter().enumerate() {
        for _ in 0..=pos {
            let mut shift: Option<f64> = None;
            for &j in &order[..pos] {
                let (a, b) = (&items[i].rect, &items[j].rect);
                if overlap_amounts(a, b).is_some() {
                    let needed = b.bottom() - a.top();
                    shift = Some(shift.map_or(needed, |s: f64| s.max(needed)));
                }
            }
            match shift {
                Some(dy) => items[i].rect.center.y += dy,
                None => break,
            }
        }
    }
}
