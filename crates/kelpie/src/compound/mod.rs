//! Compound force-directed placement.
//!
//! The containment forest is processed bottom-up: every compound vertex lays
//! out its children as an independent sub-simulation in local coordinates,
//! derives its inner canvas size from the children's bounding box plus a
//! border, and then takes part in its own parent's simulation as an opaque
//! box of that size. A final pre-order pass accumulates local offsets into
//! absolute positions.
//!
//! Each simulation runs three annealing phases over the same force terms
//! (spring, repulsion, gravity, containment) with per-phase temperature
//! scales and a geometric per-iteration decay; a vertex never moves further
//! in one iteration than the current temperature allows.

mod forces;
mod grid;
mod state;

use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::graph::{CompoundGraph, VertexId};
use crate::lifecycle::{LayoutAlgorithm, Lifecycle};
use crate::parameters::{
    LayoutParameters, ensure_non_negative, ensure_positive, ensure_rate, near_eq,
};
use crate::rng::XorShift64Star;
use crate::{InnerCanvasSizes, VertexPositions, VertexSizes};
use forces::ForceParams;
use grid::RepulsionGrid;
use rustc_hash::FxHashMap;
use serde::Serialize;
use state::SimVertex;
use tracing::{debug, trace};

/// Per-vertex policy for how a compound vertex's children are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompoundVertexInnerLayoutType {
    /// The algorithm's own sub-simulation.
    #[default]
    Automatic,
    /// Extension point; currently behaves like `Automatic`.
    ContextFree,
    /// Extension point; currently behaves like `Automatic`.
    Contextual,
    /// Children keep their pre-seeded arrangement; only the inner canvas is
    /// measured.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompoundFdpParameters {
    /// Rest length of the spring force, measured boundary to boundary.
    pub ideal_edge_length: f64,
    /// Divisor of the quadratic spring term; smaller values mean stiffer
    /// springs.
    pub elastic_constant: f64,
    pub repulsion_constant: f64,
    /// Scale of the containment pull on children protruding from their
    /// parent's canvas.
    pub nesting_factor: f64,
    pub gravitation_factor: f64,
    pub phase1_iterations: usize,
    pub phase2_iterations: usize,
    pub phase3_iterations: usize,
    /// Fraction of the current temperature a vertex may move per iteration.
    pub displacement_limit_multiplier: f64,
    /// Scales the minimum enforced separation between boxes (distinct from
    /// the repulsion range).
    pub separation_multiplier: f64,
    /// Per-iteration geometric temperature decay, in [0, 1].
    pub temperature_decreasing: f64,
    /// Border a compound vertex reserves around its children inside the
    /// inner canvas.
    pub inner_border: f64,
    pub seed: u64,
}

impl Default for CompoundFdpParameters {
    fn default() -> Self {
        Self {
            ideal_edge_length: 25.0,
            elastic_constant: 0.05,
            repulsion_constant: 4500.0,
            nesting_factor: 0.2,
            gravitation_factor: 0.1,
            phase1_iterations: 100,
            phase2_iterations: 100,
            phase3_iterations: 100,
            displacement_limit_multiplier: 0.5,
            separation_multiplier: 1.0,
            temperature_decreasing: 0.97,
            inner_border: 10.0,
            seed: 1,
        }
    }
}

impl CompoundFdpParameters {
    pub fn total_iterations(&self) -> usize {
        self.phase1_iterations + self.phase2_iterations + self.phase3_iterations
    }
}

impl LayoutParameters for CompoundFdpParameters {
    fn validate(&self) -> Result<()> {
        ensure_positive("ideal_edge_length", self.ideal_edge_length)?;
        ensure_positive("elastic_constant", self.elastic_constant)?;
        ensure_non_negative("repulsion_constant", self.repulsion_constant)?;
        ensure_rate("nesting_factor", self.nesting_factor)?;
        ensure_non_negative("gravitation_factor", self.gravitation_factor)?;
        ensure_positive(
            "displacement_limit_multiplier",
            self.displacement_limit_multiplier,
        )?;
        ensure_positive("separation_multiplier", self.separation_multiplier)?;
        ensure_rate("temperature_decreasing", self.temperature_decreasing)?;
        ensure_non_negative("inner_border", self.inner_border)?;
        Ok(())
    }

    fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        let floats = [
            ("ideal_edge_length", self.ideal_edge_length, other.ideal_edge_length),
            ("elastic_constant", self.elastic_constant, other.elastic_constant),
            ("repulsion_constant", self.repulsion_constant, other.repulsion_constant),
            ("nesting_factor", self.nesting_factor, other.nesting_factor),
            ("gravitation_factor", self.gravitation_factor, other.gravitation_factor),
            (
                "displacement_limit_multiplier",
                self.displacement_limit_multiplier,
                other.displacement_limit_multiplier,
            ),
            (
                "separation_multiplier",
                self.separation_multiplier,
                other.separation_multiplier,
            ),
            (
                "temperature_decreasing",
                self.temperature_decreasing,
                other.temperature_decreasing,
            ),
            ("inner_border", self.inner_border, other.inner_border),
        ];
        for (name, a, b) in floats {
            if !near_eq(a, b) {
                changed.push(name);
            }
        }
        if self.phase1_iterations != other.phase1_iterations {
            changed.push("phase1_iterations");
        }
        if self.phase2_iterations != other.phase2_iterations {
            changed.push("phase2_iterations");
        }
        if self.phase3_iterations != other.phase3_iterations {
            changed.push("phase3_iterations");
        }
        if self.seed != other.seed {
            changed.push("seed");
        }
        changed
    }
}

/// Named annealing phases with their temperature scales.
const PHASES: [(&str, f64); 3] = [
    ("global", 1.0),
    ("intermediate", 0.5),
    ("refinement", 0.25),
];

/// Sub-simulations fall back to the naive pair loop below this size; above
/// it, a spatial grid prunes the repulsion pairs.
const GRID_THRESHOLD: usize = 64;

pub struct CompoundFdpLayout<'a> {
    graph: &'a CompoundGraph,
    sizes: &'a VertexSizes,
    seed_positions: Option<&'a VertexPositions>,
    inner_layout_types: FxHashMap<VertexId, CompoundVertexInnerLayoutType>,
    parameters: CompoundFdpParameters,
    lifecycle: Lifecycle,
    rng: XorShift64Star,

    /// Center of each vertex within its parent's content box, where (0, 0)
    /// is the canvas top-left corner.
    local_positions: FxHashMap<VertexId, Point>,
    /// The box each vertex occupies in its parent's simulation.
    level_sizes: FxHashMap<VertexId, Size>,

    positions: VertexPositions,
    inner_sizes: InnerCanvasSizes,

    iterations_done: usize,
    iterations_total: usize,
}

impl<'a> CompoundFdpLayout<'a> {
    pub fn new(
        graph: &'a CompoundGraph,
        sizes: &'a VertexSizes,
        seed_positions: Option<&'a VertexPositions>,
        parameters: CompoundFdpParameters,
    ) -> Self {
        let seed = parameters.seed;
        Self {
            graph,
            sizes,
            seed_positions,
            inner_layout_types: FxHashMap::default(),
            parameters,
            lifecycle: Lifecycle::new(),
            rng: XorShift64Star::new(seed),
            local_positions: FxHashMap::default(),
            level_sizes: FxHashMap::default(),
            positions: VertexPositions::default(),
            inner_sizes: InnerCanvasSizes::default(),
            iterations_done: 0,
            iterations_total: 0,
        }
    }

    pub fn set_inner_layout_type(
        &mut self,
        id: impl Into<VertexId>,
        kind: CompoundVertexInnerLayoutType,
    ) {
        self.inner_layout_types.insert(id.into(), kind);
    }

    pub fn positions(&self) -> &VertexPositions {
        &self.positions
    }

    pub fn inner_canvas_sizes(&self) -> &InnerCanvasSizes {
        &self.inner_sizes
    }

    pub fn into_results(self) -> (VertexPositions, InnerCanvasSizes) {
        (self.positions, self.inner_sizes)
    }

    fn inner_layout_type(&self, id: &str) -> CompoundVertexInnerLayoutType {
        self.inner_layout_types.get(id).copied().unwrap_or_default()
    }

    /// Compound containers in post-order (children before parents), with the
    /// virtual root container last.
    fn containers_post_order(&self) -> Vec<Option<VertexId>> {
        fn dfs(graph: &CompoundGraph, v: &str, out: &mut Vec<Option<VertexId>>) {
            for c in graph.children(v) {
                dfs(graph, c, out);
            }
            if graph.is_compound(v) {
                out.push(Some(v.to_string()));
            }
        }

        let mut out = Vec::new();
        for r in self.graph.roots() {
            dfs(self.graph, r, &mut out);
        }
        out.push(None);
        out
    }

    fn members_of(&self, container: Option<&VertexId>) -> Vec<VertexId> {
        match container {
            Some(parent) => self.graph.children(parent).to_vec(),
            None => self.graph.roots().into_iter().cloned().collect(),
        }
    }

    fn runs_simulation(&self, container: Option<&VertexId>) -> bool {
        if self.members_of(container).len() < 2 {
            return false;
        }
        match container {
            Some(parent) => self.inner_layout_type(parent) != CompoundVertexInnerLayoutType::Fixed,
            None => true,
        }
    }

    fn force_params(&self) -> ForceParams {
        let p = &self.parameters;
        ForceParams {
            ideal_edge_length: p.ideal_edge_length,
            elastic_constant: p.elastic_constant,
            repulsion_constant: p.repulsion_constant,
            repulsion_range: 2.0 * p.ideal_edge_length,
            min_repulsion_distance: p.separation_multiplier * p.ideal_edge_length / 10.0,
            gravitation_factor: p.gravitation_factor,
            nesting_factor: p.nesting_factor,
        }
    }

    /// Initial local position: the pre-seeded value when one exists, a
    /// seeded random scatter otherwise.
    fn initial_local_position(&mut self, id: &str, scatter: f64) -> Point {
        if let Some(seeds) = self.seed_positions {
            if let Some(&p) = seeds.get(id) {
                if p.is_finite() {
                    return p;
                }
            }
        }
        Point::new(
            self.rng.next_range(0.0, scatter),
            self.rng.next_range(0.0, scatter),
        )
    }

    /// Bounding box of `members` at their current local positions.
    fn members_bbox(&self, members: &[VertexId]) -> Rect {
        let mut bbox: Option<Rect> = None;
        for m in members {
            let position = self.local_positions.get(m).copied().unwrap_or_default();
            let size = self.level_sizes.get(m).copied().unwrap_or_default();
            let r = Rect::new(position, size);
            bbox = Some(match bbox {
                Some(b) => b.union(&r),
                None => r,
            });
        }
        bbox.unwrap_or_default()
    }

    /// Normalizes member locals into the content box and, for a real
    /// compound container, measures and records its inner canvas size.
    fn finish_level(&mut self, container: Option<&VertexId>, members: &[VertexId]) {
        let border = self.parameters.inner_border;
        let bbox = self.members_bbox(members);

        let (canvas, offset_x, offset_y) = match container {
            Some(parent) => {
                let own = self.sizes.get(parent).copied().unwrap_or_default();
                let canvas = Size::new(
                    (bbox.size.width + 2.0 * border).max(own.width),
                    (bbox.size.height + 2.0 * border).max(own.height),
                );
                // Centering the content keeps the border symmetric when the
                // vertex's own size exceeds the measured content.
                let offset_x = (canvas.width - bbox.size.width) / 2.0;
                let offset_y = (canvas.height - bbox.size.height) / 2.0;
                (Some(canvas), offset_x, offset_y)
            }
            None => (None, 0.0, 0.0),
        };

        let shift_x = offset_x - bbox.left();
        let shift_y = offset_y - bbox.top();
        for m in members {
            if let Some(p) = self.local_positions.get_mut(m) {
                p.x += shift_x;
                p.y += shift_y;
            }
        }

        if let (Some(parent), Some(canvas)) = (container, canvas) {
            self.level_sizes.insert(parent.clone(), canvas);
            self.inner_sizes.insert(parent.clone(), canvas);
        }
    }

    /// Maps every vertex in the containment subtrees of `members` to the
    /// index of the member it belongs to, then projects graph edges onto
    /// member pairs at this level.
    fn project_edges(&self, members: &[VertexId]) -> Vec<(usize, usize)> {
        let mut representative: FxHashMap<VertexId, usize> = FxHashMap::default();
        for (idx, m) in members.iter().enumerate() {
            let mut stack = vec![m.clone()];
            while let Some(v) = stack.pop() {
                for c in self.graph.children(&v) {
                    stack.push(c.clone());
                }
                representative.insert(v, idx);
            }
        }

        let mut edges = Vec::new();
        for e in self.graph.edges() {
            if let (Some(&a), Some(&b)) = (
                representative.get(&e.source),
                representative.get(&e.target),
            ) {
                if a != b {
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    fn simulate_level(&mut self, container: Option<&VertexId>) -> Result<()> {
        let members = self.members_of(container);
        if members.is_empty() {
            return Ok(());
        }

        if !self.runs_simulation(container) {
            self.finish_level(container, &members);
            return Ok(());
        }

        let mut states: Vec<SimVertex> = members
            .iter()
            .map(|m| {
                SimVertex::new(
                    m.clone(),
                    self.level_sizes.get(m).copied().unwrap_or_default(),
                    self.local_positions.get(m).copied().unwrap_or_default(),
                )
            })
            .collect();
        let edges = self.project_edges(&members);

        // The level bound caps how far the simulation can spread; it doubles
        // as the canvas the containment force pulls protruding members back
        // into.
        let fp = self.force_params();
        let max_half = states
            .iter()
            .map(|s| s.size.width.max(s.size.height) / 2.0)
            .fold(0.0_f64, f64::max);
        let half_side = self.parameters.inner_border
            + max_half
            + fp.ideal_edge_length * (states.len() as f64).sqrt();
        let centroid = centroid(&states);
        let bound = Rect::new(centroid, Size::new(2.0 * half_side, 2.0 * half_side));

        debug!(
            container = container.map(String::as_str).unwrap_or("<root>"),
            members = states.len(),
            edges = edges.len(),
            "compound fdp level simulation"
        );

        let run = self.run_phases(&mut states, &edges, &fp, &bound);

        // Whatever progress the simulation made is kept, also when the run
        // unwinds on cancellation.
        for s in &states {
            self.local_positions.insert(s.id.clone(), s.position);
        }
        self.finish_level(container, &members);
        run
    }

    fn run_phases(
        &mut self,
        states: &mut [SimVertex],
        edges: &[(usize, usize)],
        fp: &ForceParams,
        bound: &Rect,
    ) -> Result<()> {
        let p = self.parameters;
        for (phase_index, &(phase_name, temperature_scale)) in PHASES.iter().enumerate() {
            let iterations = match phase_index {
                0 => p.phase1_iterations,
                1 => p.phase2_iterations,
                _ => p.phase3_iterations,
            };
            let mut temperature = p.ideal_edge_length * temperature_scale;

            for _ in 0..iterations {
                self.lifecycle.check_continue()?;

                self.accumulate_forces(states, edges, fp, bound);

                let max_displacement = temperature * p.displacement_limit_multiplier;
                let mut total_displacement = 0.0;
                for s in states.iter_mut() {
                    let (fx, fy) = s.total_force();
                    let (dx, dy) = clamp_vector(fx, fy, max_displacement);
                    s.position.x += dx;
                    s.position.y += dy;
                    total_displacement += dx.abs() + dy.abs();
                    s.reset_forces();
                }
                temperature *= p.temperature_decreasing;

                self.iterations_done += 1;
                let percent =
                    self.iterations_done as f64 / self.iterations_total.max(1) as f64 * 100.0;
                trace!(
                    phase = phase_name,
                    iteration = self.iterations_done,
                    total_displacement,
                    "iteration complete"
                );
                if self.lifecycle.has_observers() {
                    let snapshot: FxHashMap<VertexId, Point> = states
                        .iter()
                        .map(|s| (s.id.clone(), s.position))
                        .collect();
                    self.lifecycle.report_iteration(
                        self.iterations_done,
                        percent,
                        phase_name,
                        &snapshot,
                    );
                }
            }
        }
        Ok(())
    }

    fn accumulate_forces(
        &mut self,
        states: &mut [SimVertex],
        edges: &[(usize, usize)],
        fp: &ForceParams,
        bound: &Rect,
    ) {
        // Spring forces along the projected edges.
        for &(a, b) in edges {
            let (fx, fy) =
                forces::spring_force(&states[a].rect(), &states[b].rect(), fp, &mut self.rng);
            states[a].spring_fx += fx;
            states[a].spring_fy += fy;
            states[b].spring_fx -= fx;
            states[b].spring_fy -= fy;
        }

        // Repulsion between pairs within range. The grid only narrows the
        // candidate set; the hard cutoff in `repulsion_force` decides.
        let rects: Vec<Rect> = states.iter().map(SimVertex::rect).collect();
        let pairs: Vec<(usize, usize)> = if rects.len() > GRID_THRESHOLD {
            match RepulsionGrid::build(&rects, fp.repulsion_range) {
                Some(grid) => grid.candidate_pairs(&rects),
                None => naive_pairs(rects.len()),
            }
        } else {
            naive_pairs(rects.len())
        };
        for (i, j) in pairs {
            if let Some((fx, fy)) =
                forces::repulsion_force(&rects[i], &rects[j], fp, &mut self.rng)
            {
                states[i].repulsion_fx += fx;
                states[i].repulsion_fy += fy;
                states[j].repulsion_fx -= fx;
                states[j].repulsion_fy -= fy;
            }
        }

        // Gravity towards the sibling centroid.
        let center = centroid(states);
        for s in states.iter_mut() {
            let (fx, fy) = forces::gravity_force(s.position, center, fp);
            s.gravity_fx += fx;
            s.gravity_fy += fy;
        }

        // Containment within the level bound.
        for s in states.iter_mut() {
            let (fx, fy) = forces::containment_force(&s.rect(), bound, fp);
            s.containment_fx += fx;
            s.containment_fy += fy;
        }
    }

    /// Pre-order accumulation of local offsets into absolute centers.
    fn assemble_absolute(&mut self) {
        let mut stack: Vec<(VertexId, Point)> = Vec::new();
        for r in self.graph.roots() {
            let local = self.local_positions.get(r).copied().unwrap_or_default();
            stack.push((r.clone(), local));
        }

        while let Some((v, absolute)) = stack.pop() {
            self.positions.insert(v.clone(), absolute);
            if self.graph.is_compound(&v) {
                let canvas = self.level_sizes.get(&v).copied().unwrap_or_default();
                let origin_x = absolute.x - canvas.width / 2.0;
                let origin_y = absolute.y - canvas.height / 2.0;
                for c in self.graph.children(&v) {
                    let local = self.local_positions.get(c).copied().unwrap_or_default();
                    stack.push((c.clone(), Point::new(origin_x + local.x, origin_y + local.y)));
                }
            }
        }
    }
}

fn centroid(states: &[SimVertex]) -> Point {
    if states.is_empty() {
        return Point::default();
    }
    let n = states.len() as f64;
    let sum_x: f64 = states.iter().map(|s| s.position.x).sum();
    let sum_y: f64 = states.iter().map(|s| s.position.y).sum();
    Point::new(sum_x / n, sum_y / n)
}

fn clamp_vector(fx: f64, fy: f64, max_len: f64) -> (f64, f64) {
    let len = fx.hypot(fy);
    if len <= max_len || len == 0.0 {
        (fx, fy)
    } else {
        let scale = max_len / len;
        (fx * scale, fy * scale)
    }
}

fn naive_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push((i, j));
        }
    }
    out
}

impl LayoutAlgorithm for CompoundFdpLayout<'_> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn initialize(&mut self) -> Result<()> {
        self.parameters.validate()?;
        self.graph.validate()?;
        for id in self.graph.vertex_ids() {
            crate::vertex_size(self.sizes, id)?;
        }

        self.rng = XorShift64Star::new(self.parameters.seed);
        self.positions.clear();
        self.inner_sizes.clear();
        self.local_positions.clear();
        self.level_sizes.clear();
        self.iterations_done = 0;

        let simulations = self
            .containers_post_order()
            .iter()
            .filter(|c| self.runs_simulation(c.as_ref()))
            .count();
        self.iterations_total = simulations * self.parameters.total_iterations();

        // Every vertex gets a finite starting point and box immediately, so
        // the output maps are fully populated even if the run aborts before
        // a level has been simulated.
        let scatter =
            2.0 * self.parameters.ideal_edge_length * (self.graph.vertex_count() as f64).sqrt();
        let ids: Vec<VertexId> = self.graph.vertex_ids().cloned().collect();
        for id in &ids {
            let p = self.initial_local_position(id, scatter);
            self.local_positions.insert(id.clone(), p);
            let size = self.sizes.get(id).copied().unwrap_or_default();
            self.level_sizes.insert(id.clone(), size);
        }
        for container in self.containers_post_order() {
            if let Some(parent) = container {
                let members = self.members_of(Some(&parent));
                let bbox = self.members_bbox(&members);
                let border = self.parameters.inner_border;
                let own = self.sizes.get(&parent).copied().unwrap_or_default();
                let canvas = Size::new(
                    (bbox.size.width + 2.0 * border).max(own.width),
                    (bbox.size.height + 2.0 * border).max(own.height),
                );
                self.level_sizes.insert(parent.clone(), canvas);
                self.inner_sizes.insert(parent.clone(), canvas);
            }
        }
        self.assemble_absolute();
        Ok(())
    }

    fn internal_compute(&mut self) -> Result<()> {
        let containers = self.containers_post_order();
        let mut run = Ok(());
        for container in &containers {
            if let Err(e) = self.simulate_level(container.as_ref()) {
                run = Err(e);
                break;
            }
        }
        self.assemble_absolute();
        run
    }

    fn clean(&mut self) {
        self.local_positions = FxHashMap::default();
        self.level_sizes = FxHashMap::default();
    }
}
