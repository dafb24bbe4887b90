//! Uniform spatial grid for pruning repulsion pairs.
//!
//! Cell size equals the repulsion range, so any pair whose boundary gap is
//! within range lands in the same or an adjacent cell. The grid only narrows
//! the candidate set; the caller still applies the exact range cutoff, which
//! keeps the pruned pass bit-identical to the naive O(n²) one.

use crate::geometry::Rect;

#[derive(Debug)]
pub(crate) struct RepulsionGrid {
    left: f64,
    top: f64,
    cell: f64,
    size_x: i32,
    size_y: i32,
    cells: Vec<Vec<usize>>,
}

impl RepulsionGrid {
    pub fn build(rects: &[Rect], cell: f64) -> Option<Self> {
        if rects.is_empty() || !cell.is_finite() || cell <= 0.0 {
            return None;
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for r in rects {
            min_x = min_x.min(r.left());
            min_y = min_y.min(r.top());
            max_x = max_x.max(r.right());
            max_y = max_y.max(r.bottom());
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }

        let w = (max_x - min_x).max(1.0);
        let h = (max_y - min_y).max(1.0);
        let size_x = ((w / cell).floor() as i32 + 1).max(1);
        let size_y = ((h / cell).floor() as i32 + 1).max(1);
        let mut cells: Vec<Vec<usize>> = vec![Vec::new(); (size_x as usize) * (size_y as usize)];

        for (idx, r) in rects.iter().enumerate() {
            let (sx, fx, sy, fy) = coords(r, min_x, min_y, cell, size_x, size_y);
            for gx in sx..=fx {
                for gy in sy..=fy {
                    cells[(gx as usize) * (size_y as usize) + (gy as usize)].push(idx);
                }
            }
        }

        Some(Self {
            left: min_x,
            top: min_y,
            cell,
            size_x,
            size_y,
            cells,
        })
    }

    /// Candidate pairs `(i, j)` with `i < j`, deduplicated, in ascending
    /// order of `i`. A superset of the pairs within range.
    pub fn candidate_pairs(&self, rects: &[Rect]) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = Vec::new();
        let mut seen: Vec<bool> = vec![false; rects.len()];

        for (i, r) in rects.iter().enumerate() {
            let (sx, fx, sy, fy) = coords(r, self.left, self.top, self.cell, self.size_x, self.size_y);
            let mut neighbors: Vec<usize> = Vec::new();
            for gx in (sx - 1).max(0)..=(fx + 1).min(self.size_x - 1) {
                for gy in (sy - 1).max(0)..=(fy + 1).min(self.size_y - 1) {
                    for &other in &self.cells[(gx as usize) * (self.size_y as usize) + (gy as usize)]
                    {
                        if other > i && !seen[other] {
                            seen[other] = true;
                            neighbors.push(other);
                        }
                    }
                }
            }
            neighbors.sort_unstable();
            for &j in &neighbors {
                seen[j] = false;
                pairs.push((i, j));
            }
        }
        pairs
    }
}

fn coords(
    r: &Rect,
    left: f64,
    top: f64,
    cell: f64,
    size_x: i32,
    size_y: i32,
) -> (i32, i32, i32, i32) {
    let sx = (((r.left() - left) / cell).floor() as i32).clamp(0, size_x - 1);
    let fx = (((r.right() - left) / cell).floor() as i32).clamp(0, size_x - 1);
    let sy = (((r.top() - top) / cell).floor() as i32).clamp(0, size_y - 1);
    let fy = (((r.bottom() - top) / cell).floor() as i32).clamp(0, size_y - 1);
    (sx, fx, sy, fy)
}
