//! Layout quality measurements: overlaps, edge crossings, area and edge
//! length statistics. Primarily used to assert layout quality in tests.

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::graph::CompoundGraph;
use crate::routing::clipped_endpoints;
use crate::{VertexPositions, VertexSizes};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeLengthStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutMetrics {
    /// Number of vertex rectangle pairs that intersect.
    pub overlap_count: usize,
    /// Number of edge pairs (not sharing an endpoint) whose clipped segments
    /// cross.
    pub crossing_count: usize,
    /// Area of the bounding box around all vertex rectangles.
    pub area: f64,
    /// Clipped-length statistics over all edges; `None` for edgeless graphs.
    pub edge_lengths: Option<EdgeLengthStats>,
}

impl LayoutMetrics {
    pub fn measure(
        graph: &CompoundGraph,
        positions: &VertexPositions,
        sizes: &VertexSizes,
    ) -> Result<LayoutMetrics> {
        let mut rects: Vec<Rect> = Vec::with_capacity(graph.vertex_count());
        for id in graph.vertex_ids() {
            let size = crate::vertex_size(sizes, id)?;
            let position = positions.get(id).copied().unwrap_or_default();
            rects.push(Rect::new(position, size));
        }

        // Nested rectangles legitimately contain each other, so containment
        // pairs are not counted as overlap.
        let mut overlap_count = 0;
        for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                let (a, b) = (&rects[i], &rects[j]);
                if a.intersects(b) && !a.contains_rect(b) && !b.contains_rect(a) {
                    overlap_count += 1;
                }
            }
        }

        let area = rects
            .iter()
            .copied()
            .reduce(|acc, r| acc.union(&r))
            .map(|bb| bb.area())
            .unwrap_or(0.0);

        let segments: Vec<(Point, Point, &str, &str)> = graph
            .edges()
            .iter()
            .filter_map(|e| {
                let sp = positions.get(&e.source)?;
                let tp = positions.get(&e.target)?;
                let ss = sizes.get(&e.source)?;
                let ts = sizes.get(&e.target)?;
                let (a, b) =
                    clipped_endpoints(&Rect::new(*sp, *ss), &Rect::new(*tp, *ts));
                Some((a, b, e.source.as_str(), e.target.as_str()))
            })
            .collect();

        let mut crossing_count = 0;
        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                let (a1, a2, as_, at) = segments[i];
                let (b1, b2, bs, bt) = segments[j];
                // Edges sharing a vertex meet at that vertex by definition.
                if as_ == bs || as_ == bt || at == bs || at == bt {
                    continue;
                }
                if segments_cross(a1, a2, b1, b2) {
                    crossing_count += 1;
                }
            }
        }

        let edge_lengths = if segments.is_empty() {
            None
        } else {
            let lengths: Vec<f64> = segments
                .iter()
                .map(|(a, b, _, _)| a.distance_to(*b))
                .collect();
            let sum: f64 = lengths.iter().sum();
            Some(EdgeLengthStats {
                min: lengths.iter().copied().fold(f64::INFINITY, f64::min),
                max: lengths.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                mean: sum / lengths.len() as f64,
            })
        };

        Ok(LayoutMetrics {
            overlap_count,
            crossing_count,
            area,
            edge_lengths,
        })
    }
}

/// Strict orientation of the triple (a, b, c): positive for counterclockwise,
/// negative for clockwise, zero for collinear.
fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Proper segment intersection; touching endpoints and collinear overlap do
/// not count as a crossing.
fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);
    (o1 * o2 < 0.0) && (o3 * o4 < 0.0)
}
