use kelpie::{
    CompoundGraph, LayoutAlgorithm, Point, RandomLayout, RandomLayoutParameters, RandomVertexType,
    Size, VertexPositions, VertexSizes,
};

fn setup(count: usize) -> (CompoundGraph, VertexSizes) {
    let mut g = CompoundGraph::new();
    let mut sizes = VertexSizes::default();
    for i in 0..count {
        let id = format!("v{i}");
        g.add_vertex(id.clone());
        sizes.insert(id, Size::new(24.0, 16.0));
    }
    (g, sizes)
}

fn params() -> RandomLayoutParameters {
    RandomLayoutParameters {
        x_offset: -100.0,
        y_offset: 50.0,
        width: 400.0,
        height: 250.0,
        seed: 17,
    }
}

#[test]
fn free_vertices_stay_inside_the_bound_including_their_own_box() {
    let (graph, sizes) = setup(40);
    let seeds = VertexPositions::default();
    let p = params();
    let mut layout = RandomLayout::new(&graph, &sizes, &seeds, p);
    layout.compute().unwrap();

    for (id, pos) in layout.positions() {
        let size = sizes[id];
        assert!(pos.x - size.width / 2.0 >= p.x_offset - 1e-9, "{id} out left");
        assert!(
            pos.x + size.width / 2.0 <= p.x_offset + p.width + 1e-9,
            "{id} out right"
        );
        assert!(pos.y - size.height / 2.0 >= p.y_offset - 1e-9, "{id} out top");
        assert!(
            pos.y + size.height / 2.0 <= p.y_offset + p.height + 1e-9,
            "{id} out bottom"
        );
    }
}

#[test]
fn fixed_vertices_keep_their_seeded_positions_verbatim() {
    let (graph, sizes) = setup(10);
    let mut seeds = VertexPositions::default();
    seeds.insert("v3".to_string(), Point::new(-999.5, 1234.25));
    seeds.insert("v7".to_string(), Point::new(3.0, -4.0));

    let mut layout = RandomLayout::new(&graph, &sizes, &seeds, params());
    layout.set_vertex_type("v3", RandomVertexType::Fixed);
    layout.set_vertex_type("v7", RandomVertexType::Fixed);
    layout.compute().unwrap();

    let positions = layout.positions();
    assert_eq!(positions["v3"], Point::new(-999.5, 1234.25));
    assert_eq!(positions["v7"], Point::new(3.0, -4.0));
}

#[test]
fn same_seed_reproduces_the_same_layout() {
    let (graph, sizes) = setup(20);
    let seeds = VertexPositions::default();

    let mut first = RandomLayout::new(&graph, &sizes, &seeds, params());
    first.compute().unwrap();
    let mut second = RandomLayout::new(&graph, &sizes, &seeds, params());
    second.compute().unwrap();

    assert_eq!(first.positions(), second.positions());
}

#[test]
fn different_seeds_produce_different_layouts() {
    let (graph, sizes) = setup(20);
    let seeds = VertexPositions::default();

    let mut first = RandomLayout::new(&graph, &sizes, &seeds, params());
    first.compute().unwrap();

    let mut other_params = params();
    other_params.seed = 18;
    let mut second = RandomLayout::new(&graph, &sizes, &seeds, other_params);
    second.compute().unwrap();

    assert_ne!(first.positions(), second.positions());
}

#[test]
fn bound_narrower_than_the_vertex_collapses_to_the_midline() {
    let (graph, sizes) = setup(1);
    let seeds = VertexPositions::default();
    let p = RandomLayoutParameters {
        x_offset: 10.0,
        y_offset: 20.0,
        width: 10.0, // narrower than the 24-wide vertex
        height: 100.0,
        seed: 5,
    };
    let mut layout = RandomLayout::new(&graph, &sizes, &seeds, p);
    layout.compute().unwrap();
    let pos = layout.positions()["v0"];
    assert_eq!(pos.x, 15.0);
    assert!(pos.y >= 28.0 && pos.y <= 112.0);
}
