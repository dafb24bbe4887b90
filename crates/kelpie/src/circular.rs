//! Circular layout: places all vertices on a single circle, adjacent
//! vertices tangent to each other.

use crate::error::Result;
use crate::geometry::Point;
use crate::graph::CompoundGraph;
use crate::lifecycle::{LayoutAlgorithm, Lifecycle};
use crate::parameters::{LayoutParameters, ensure_positive, near_eq};
use crate::{VertexPositions, VertexSizes};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CircularLayoutParameters {
    /// Lower bound for the circle radius; keeps the angular stepping well
    /// defined for one- and two-vertex graphs.
    pub min_radius: f64,
}

impl Default for CircularLayoutParameters {
    fn default() -> Self {
        Self { min_radius: 5.0 }
    }
}

impl LayoutParameters for CircularLayoutParameters {
    fn validate(&self) -> Result<()> {
        ensure_positive("min_radius", self.min_radius)?;
        Ok(())
    }

    fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        if near_eq(self.min_radius, other.min_radius) {
            Vec::new()
        } else {
            vec!["min_radius"]
        }
    }
}

pub struct CircularLayout<'a> {
    graph: &'a CompoundGraph,
    sizes: &'a VertexSizes,
    parameters: CircularLayoutParameters,
    lifecycle: Lifecycle,
    positions: VertexPositions,
}

impl<'a> CircularLayout<'a> {
    pub fn new(
        graph: &'a CompoundGraph,
        sizes: &'a VertexSizes,
        parameters: CircularLayoutParameters,
    ) -> Self {
        Self {
            graph,
            sizes,
            parameters,
            lifecycle: Lifecycle::new(),
            positions: VertexPositions::default(),
        }
    }

    pub fn positions(&self) -> &VertexPositions {
        &self.positions
    }

    pub fn into_positions(self) -> VertexPositions {
        self.positions
    }

    /// Walks the vertices once, placing each on the circle of radius
    /// `radius` and advancing the angle so neighbors end up tangent. Returns
    /// the total angle consumed by the walk.
    fn place_on_circle(&mut self, half_sizes: &[(String, f64)], radius: f64) -> f64 {
        let mut angle: f64 = 0.0;
        for (id, half_size) in half_sizes {
            self.positions.insert(
                id.clone(),
                Point::new(radius * angle.cos(), radius * angle.sin()),
            );
            // Tangency: half the vertex spans asin(half / (2r)) of arc on
            // each side. The argument is clamped for vertices larger than
            // the circle itself.
            let step = (half_size / (2.0 * radius)).min(1.0).asin();
            angle += 2.0 * step;
        }
        angle
    }
}

impl LayoutAlgorithm for CircularLayout<'_> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn initialize(&mut self) -> Result<()> {
        self.parameters.validate()?;
        self.graph.validate()?;
        self.positions.clear();
        Ok(())
    }

    fn internal_compute(&mut self) -> Result<()> {
        let half_sizes: Vec<(String, f64)> = {
            let mut out = Vec::with_capacity(self.graph.vertex_count());
            for id in self.graph.vertex_ids() {
                let size = crate::vertex_size(self.sizes, id)?;
                out.push((id.clone(), size.half_diagonal()));
            }
            out
        };
        if half_sizes.is_empty() {
            return Ok(());
        }

        // The sum of the half-diagonals, doubled, estimates the perimeter a
        // tangent packing needs.
        let perimeter: f64 = half_sizes.iter().map(|(_, h)| h * 2.0).sum();
        let radius = (perimeter / std::f64::consts::TAU).max(self.parameters.min_radius);
        debug!(
            vertices = half_sizes.len(),
            radius, "circular layout pre-pass"
        );

        let total_angle = self.place_on_circle(&half_sizes, radius);
        self.lifecycle
            .report_iteration(1, 50.0, "pre-pass", &self.positions);
        self.lifecycle.check_continue()?;

        // Rescale so the walk closes into exactly one turn, then redo the
        // placement with the corrected radius.
        let corrected = (radius * total_angle / std::f64::consts::TAU)
            .max(self.parameters.min_radius);
        self.place_on_circle(&half_sizes, corrected);
        self.lifecycle
            .report_iteration(2, 100.0, "final placement", &self.positions);
        Ok(())
    }
}
