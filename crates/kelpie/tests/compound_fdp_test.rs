use kelpie::geometry::clipped_distance;
use kelpie::{
    AlgorithmState, CompoundFdpLayout, CompoundFdpParameters, CompoundGraph,
    CompoundVertexInnerLayoutType, Control, LayoutAlgorithm, LayoutEvent, Point, Rect, Size,
    VertexPositions, VertexSizes,
};
use std::sync::{Arc, Mutex};

fn uniform_sizes(graph: &CompoundGraph, w: f64, h: f64) -> VertexSizes {
    graph
        .vertex_ids()
        .map(|id| (id.clone(), Size::new(w, h)))
        .collect()
}

/// The reference scenario: 8 vertices, tree-like edges, uniform 20x20 boxes.
fn reference_graph() -> CompoundGraph {
    let mut g = CompoundGraph::new();
    for i in 0..8 {
        g.add_vertex(i.to_string());
    }
    for (i, (s, t)) in [(0, 1), (1, 2), (2, 3), (2, 4), (0, 5), (1, 7), (4, 6), (0, 4)]
        .into_iter()
        .enumerate()
    {
        g.add_edge(format!("e{i}"), s.to_string(), t.to_string());
    }
    g
}

fn nested_graph() -> (CompoundGraph, VertexSizes) {
    let mut g = CompoundGraph::new();
    for id in ["group", "inner", "c1", "c2", "n1", "n2", "outside"] {
        g.add_vertex(id);
    }
    g.set_parent("inner", "group").unwrap();
    g.set_parent("c1", "inner").unwrap();
    g.set_parent("c2", "inner").unwrap();
    g.set_parent("n1", "group").unwrap();
    g.set_parent("n2", "group").unwrap();
    g.add_edge("e1", "c1", "c2");
    g.add_edge("e2", "n1", "n2");
    g.add_edge("e3", "n1", "outside");
    let sizes = uniform_sizes(&g, 30.0, 20.0);
    (g, sizes)
}

#[test]
fn reference_scenario_produces_a_readable_layout() {
    let graph = reference_graph();
    let sizes = uniform_sizes(&graph, 20.0, 20.0);
    let params = CompoundFdpParameters::default();
    assert_eq!(params.total_iterations(), 300);

    let mut layout = CompoundFdpLayout::new(&graph, &sizes, None, params);
    layout.compute().unwrap();
    assert_eq!(layout.state(), AlgorithmState::Finished);

    let positions = layout.positions();
    assert_eq!(positions.len(), 8);
    for (id, p) in positions {
        assert!(p.is_finite(), "vertex {id} has a non-finite position");
    }

    // All positions distinct, and no pair closer than the combined half
    // sizes (minus a small epsilon).
    let ids: Vec<&String> = graph.vertex_ids().collect();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let d = positions[ids[i]].distance_to(positions[ids[j]]);
            assert!(
                d >= 20.0 - 2.0,
                "vertices {} and {} are too close: {d}",
                ids[i],
                ids[j]
            );
        }
    }

    // The graph stays visually connected: no edge stretches beyond a small
    // multiple of the ideal edge length (boundary to boundary).
    for e in graph.edges() {
        let a = Rect::new(positions[&e.source], sizes[&e.source]);
        let b = Rect::new(positions[&e.target], sizes[&e.target]);
        let gap = clipped_distance(&a, &b);
        assert!(
            gap <= 4.0 * params.ideal_edge_length,
            "edge {} is overstretched: {gap}",
            e.id
        );
    }
}

#[test]
fn children_end_up_inside_their_parent_canvas_with_border() {
    let (graph, sizes) = nested_graph();
    let params = CompoundFdpParameters::default();
    let mut layout = CompoundFdpLayout::new(&graph, &sizes, None, params);
    layout.compute().unwrap();

    let positions = layout.positions();
    let canvases = layout.inner_canvas_sizes();

    for parent in ["group", "inner"] {
        let canvas = canvases
            .get(parent)
            .unwrap_or_else(|| panic!("no inner canvas for {parent}"));
        let parent_rect = Rect::new(positions[parent], *canvas);
        for child in graph.children(parent) {
            let child_size = canvases.get(child).copied().unwrap_or(sizes[child]);
            let child_rect = Rect::new(positions[child], child_size);
            assert!(
                parent_rect.contains_rect(&child_rect),
                "{child} protrudes from {parent}"
            );
            // Border margin on every side.
            let b = params.inner_border - 1e-9;
            assert!(child_rect.left() >= parent_rect.left() + b);
            assert!(child_rect.right() <= parent_rect.right() - b);
            assert!(child_rect.top() >= parent_rect.top() + b);
            assert!(child_rect.bottom() <= parent_rect.bottom() - b);
        }
    }

    // The canvas accommodates the children's bounding box plus the border.
    let inner_canvas = canvases["inner"];
    assert!(inner_canvas.width >= 30.0 + 2.0 * params.inner_border);
    assert!(inner_canvas.height >= 20.0 + 2.0 * params.inner_border);
}

#[test]
fn fixed_inner_layout_preserves_the_seeded_child_arrangement() {
    let mut g = CompoundGraph::new();
    for id in ["p", "c1", "c2", "c3", "q"] {
        g.add_vertex(id);
    }
    g.set_parent("c1", "p").unwrap();
    g.set_parent("c2", "p").unwrap();
    g.set_parent("c3", "p").unwrap();
    g.add_edge("e1", "p", "q");
    let sizes = uniform_sizes(&g, 20.0, 20.0);

    let mut seeds = VertexPositions::default();
    seeds.insert("c1".to_string(), Point::new(0.0, 0.0));
    seeds.insert("c2".to_string(), Point::new(70.0, 0.0));
    seeds.insert("c3".to_string(), Point::new(0.0, 55.0));

    let mut layout =
        CompoundFdpLayout::new(&g, &sizes, Some(&seeds), CompoundFdpParameters::default());
    layout.set_inner_layout_type("p", CompoundVertexInnerLayoutType::Fixed);
    layout.compute().unwrap();

    let positions = layout.positions();
    // The children may be translated as a block but never rearranged.
    let d12 = Point::new(
        positions["c2"].x - positions["c1"].x,
        positions["c2"].y - positions["c1"].y,
    );
    let d13 = Point::new(
        positions["c3"].x - positions["c1"].x,
        positions["c3"].y - positions["c1"].y,
    );
    assert!((d12.x - 70.0).abs() < 1e-9 && d12.y.abs() < 1e-9);
    assert!(d13.x.abs() < 1e-9 && (d13.y - 55.0).abs() < 1e-9);
}

#[test]
fn same_seed_is_deterministic() {
    let graph = reference_graph();
    let sizes = uniform_sizes(&graph, 20.0, 20.0);

    let mut first = CompoundFdpLayout::new(&graph, &sizes, None, CompoundFdpParameters::default());
    first.compute().unwrap();
    let mut second = CompoundFdpLayout::new(&graph, &sizes, None, CompoundFdpParameters::default());
    second.compute().unwrap();

    assert_eq!(first.positions(), second.positions());
}

#[test]
fn abort_from_an_observer_yields_a_valid_partial_result() {
    let graph = reference_graph();
    let sizes = uniform_sizes(&graph, 20.0, 20.0);

    let mut layout =
        CompoundFdpLayout::new(&graph, &sizes, None, CompoundFdpParameters::default());
    layout.lifecycle_mut().subscribe(|event| {
        if let LayoutEvent::IterationEnded { iteration, .. } = event {
            if *iteration >= 10 {
                return Control::Abort;
            }
        }
        Control::Continue
    });

    layout.compute().unwrap();
    assert_eq!(layout.state(), AlgorithmState::Aborted);

    let positions = layout.positions();
    assert_eq!(positions.len(), graph.vertex_count());
    for (id, p) in positions {
        assert!(p.is_finite(), "vertex {id} has a non-finite position");
    }
}

#[test]
fn abort_from_another_thread_yields_aborted_state() {
    let graph = reference_graph();
    let sizes = uniform_sizes(&graph, 20.0, 20.0);

    let mut params = CompoundFdpParameters::default();
    params.phase1_iterations = 200_000;
    params.phase2_iterations = 200_000;
    params.phase3_iterations = 200_000;

    let mut layout = CompoundFdpLayout::new(&graph, &sizes, None, params);
    let handle = layout.abort_handle();

    let (state, positions) = std::thread::scope(|scope| {
        let worker = scope.spawn(move || {
            layout.compute().unwrap();
            let state = layout.state();
            let (positions, _) = layout.into_results();
            (state, positions)
        });

        // Wait until the run is actually in flight, then cancel it.
        while handle.state() != AlgorithmState::Running && !worker.is_finished() {
            std::thread::yield_now();
        }
        handle.abort();
        worker.join().expect("layout thread panicked")
    });

    assert_eq!(state, AlgorithmState::Aborted);
    assert_eq!(positions.len(), graph.vertex_count());
    for p in positions.values() {
        assert!(p.is_finite());
    }
}

#[test]
fn iteration_events_report_strictly_increasing_percent() {
    let graph = reference_graph();
    let sizes = uniform_sizes(&graph, 20.0, 20.0);

    let mut params = CompoundFdpParameters::default();
    params.phase1_iterations = 10;
    params.phase2_iterations = 10;
    params.phase3_iterations = 10;

    let log: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);

    let mut layout = CompoundFdpLayout::new(&graph, &sizes, None, params);
    layout.lifecycle_mut().subscribe(move |event| {
        if let LayoutEvent::IterationEnded { percent, .. } = event {
            sink.lock().unwrap().push(*percent);
        }
        Control::Continue
    });
    layout.compute().unwrap();

    let percents = log.lock().unwrap().clone();
    assert_eq!(percents.len(), 30);
    for pair in percents.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    assert!((percents.last().unwrap() - 100.0).abs() < 1e-9);
}

#[test]
fn single_vertex_graph_finishes_without_iterating() {
    let mut g = CompoundGraph::new();
    g.add_vertex("only");
    let sizes = uniform_sizes(&g, 20.0, 20.0);

    let mut layout = CompoundFdpLayout::new(&g, &sizes, None, CompoundFdpParameters::default());
    layout.compute().unwrap();
    assert_eq!(layout.state(), AlgorithmState::Finished);
    assert!(layout.positions()["only"].is_finite());
}

#[test]
fn invalid_parameters_fail_before_any_work() {
    let graph = reference_graph();
    let sizes = uniform_sizes(&graph, 20.0, 20.0);

    let mut params = CompoundFdpParameters::default();
    params.temperature_decreasing = 2.0;
    let mut layout = CompoundFdpLayout::new(&graph, &sizes, None, params);
    assert!(layout.compute().is_err());
    assert_ne!(layout.state(), AlgorithmState::Running);
}
