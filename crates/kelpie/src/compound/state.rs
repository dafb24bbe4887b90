//! Per-vertex simulation state for one level of the compound recursion.

use crate::geometry::{Point, Rect, Size};
use crate::graph::VertexId;

#[derive(Debug, Clone)]
pub(crate) struct SimVertex {
    pub id: VertexId,
    /// The opaque box this vertex occupies at the current level: its own size
    /// for simple vertices, the inner canvas size for compound vertices.
    pub size: Size,
    /// Center position in the level's local coordinates.
    pub position: Point,

    pub spring_fx: f64,
    pub spring_fy: f64,
    pub repulsion_fx: f64,
    pub repulsion_fy: f64,
    pub gravity_fx: f64,
    pub gravity_fy: f64,
    pub containment_fx: f64,
    pub containment_fy: f64,
}

impl SimVertex {
    pub fn new(id: VertexId, size: Size, position: Point) -> Self {
        Self {
            id,
            size,
            position,
            spring_fx: 0.0,
            spring_fy: 0.0,
            repulsion_fx: 0.0,
            repulsion_fy: 0.0,
            gravity_fx: 0.0,
            gravity_fy: 0.0,
            containment_fx: 0.0,
            containment_fy: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn total_force(&self) -> (f64, f64) {
        (
            self.spring_fx + self.repulsion_fx + self.gravity_fx + self.containment_fx,
            self.spring_fy + self.repulsion_fy + self.gravity_fy + self.containment_fy,
        )
    }

    pub fn reset_forces(&mut self) {
        self.spring_fx = 0.0;
        self.spring_fy = 0.0;
        self.repulsion_fx = 0.0;
        self.repulsion_fy = 0.0;
        self.gravity_fx = 0.0;
        self.gravity_fy = 0.0;
        self.containment_fx = 0.0;
        self.containment_fy = 0.0;
    }
}
