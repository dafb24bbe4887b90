use kelpie::routing::{
    EdgeRoutingAlgorithmFactory, EdgeRoutingParameters, RoutingContext, clipped_endpoints,
    straight_line_route,
};
use kelpie::{
    CompoundGraph, Error, Point, Rect, Size, StandardEdgeRoutingFactory, VertexPositions,
    VertexSizes,
};

fn context_fixture() -> (CompoundGraph, VertexPositions, VertexSizes) {
    let mut graph = CompoundGraph::new();
    graph.add_vertex("a");
    graph.add_vertex("b");
    graph.add_edge("e1", "a", "b");

    let mut positions = VertexPositions::default();
    positions.insert("a".to_string(), Point::new(0.0, 0.0));
    positions.insert("b".to_string(), Point::new(100.0, 0.0));

    let mut sizes = VertexSizes::default();
    sizes.insert("a".to_string(), Size::new(20.0, 20.0));
    sizes.insert("b".to_string(), Size::new(20.0, 20.0));

    (graph, positions, sizes)
}

#[test]
fn standard_factory_supports_no_algorithm_types() {
    let factory = StandardEdgeRoutingFactory::new();
    assert!(factory.algorithm_types().is_empty());
    assert!(!factory.is_valid_algorithm("orthogonal"));
    assert!(!factory.is_valid_algorithm(""));
}

#[test]
fn creating_an_unknown_algorithm_type_fails() {
    let (graph, positions, sizes) = context_fixture();
    let factory = StandardEdgeRoutingFactory::new();
    let context = RoutingContext {
        graph: &graph,
        positions: &positions,
        sizes: &sizes,
    };
    let err = match factory.create_algorithm(
        "orthogonal",
        context,
        &EdgeRoutingParameters::default(),
    ) {
        Ok(_) => panic!("expected create_algorithm to fail"),
        Err(e) => e,
    };
    match err {
        Error::UnknownAlgorithmType { name } => assert_eq!(name, "orthogonal"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn straight_line_routes_have_no_bend_points() {
    assert!(straight_line_route().is_empty());
}

#[test]
fn clipped_endpoints_touch_the_vertex_borders() {
    let source = Rect::new(Point::new(0.0, 0.0), Size::new(20.0, 20.0));
    let target = Rect::new(Point::new(100.0, 0.0), Size::new(20.0, 20.0));
    let (from, to) = clipped_endpoints(&source, &target);
    assert_eq!(from, Point::new(10.0, 0.0));
    assert_eq!(to, Point::new(90.0, 0.0));
}
