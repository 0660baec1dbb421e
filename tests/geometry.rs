use svgres::{NodeKind, Options, PathSegment, Shape, Tree};

fn resolve(text: &str) -> Tree {
    Tree::from_str(text, &Options::default()).unwrap()
}

fn shapes(tree: &Tree) -> Vec<Shape> {
    let mut list = Vec::new();
    for node in tree.root.descendants() {
        if let NodeKind::Shape(ref shape) = *node.borrow() {
            list.push(shape.clone());
        }
    }
    list
}

fn single_shape(text: &str) -> Shape {
    let tree = resolve(text);
    let mut shapes = shapes(&tree);
    assert_eq!(shapes.len(), 1);
    shapes.remove(0)
}

#[test]
fn simple_path() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <path d='M0,0 L10,0 L10,10 Z'/>\
         </svg>",
    );

    // Exactly 4 segments: move, line, line, close.
    assert_eq!(shape.data.len(), 4);
    assert!(matches!(shape.data[0], PathSegment::MoveTo { x, y } if x == 0.0 && y == 0.0));
    assert!(matches!(shape.data[1], PathSegment::LineTo { x, y } if x == 10.0 && y == 0.0));
    assert!(matches!(shape.data[2], PathSegment::LineTo { x, y } if x == 10.0 && y == 10.0));
    assert!(matches!(shape.data[3], PathSegment::ClosePath));
}

#[test]
fn arc_to_curves() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='200' height='200'>\
            <path d='M 0,0 A 50,50 0 0,1 100,0'/>\
         </svg>",
    );

    // The arc must be converted into cubic curves.
    assert!(shape.data.len() >= 2);
    assert!(shape
        .data
        .iter()
        .skip(1)
        .all(|seg| matches!(seg, PathSegment::CurveTo { .. })));

    // The endpoint is exact.
    match shape.data.last().unwrap() {
        PathSegment::CurveTo { x, y, .. } => {
            assert!((x - 100.0).abs() < 1e-6);
            assert!(y.abs() < 1e-6);
        }
        _ => panic!("expected a curve"),
    }

    // A half-circle: the bounding box height is the radius.
    let bbox = shape.data.bbox().unwrap();
    assert!((bbox.height() - 50.0).abs() < 0.5);
}

#[test]
fn zero_radius_arc_is_a_line() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='200' height='200'>\
            <path d='M 0,0 A 0,0 0 0,1 100,50'/>\
         </svg>",
    );

    assert_eq!(shape.data.len(), 2);
    assert!(matches!(shape.data[1], PathSegment::LineTo { x, y } if x == 100.0 && y == 50.0));
}

#[test]
fn implicit_line_after_move() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <path d='M 0,0 10,0 10,10'/>\
         </svg>",
    );

    assert_eq!(shape.data.len(), 3);
    assert!(matches!(shape.data[1], PathSegment::LineTo { .. }));
    assert!(matches!(shape.data[2], PathSegment::LineTo { .. }));
}

#[test]
fn relative_move_after_close() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <path d='M 10,10 L 20,10 Z m 5,5 l 1,0'/>\
         </svg>",
    );

    // 'm' after 'z' is relative to the subpath start.
    assert!(matches!(shape.data[3], PathSegment::MoveTo { x, y } if x == 15.0 && y == 15.0));
}

#[test]
fn smooth_curve_reflection() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <path d='M 0,0 C 0,10 10,10 10,0 S 20,-10 20,0'/>\
         </svg>",
    );

    // The first control point of `S` mirrors the previous control
    // point through the current point.
    match shape.data[2] {
        PathSegment::CurveTo { x1, y1, .. } => {
            assert_eq!((x1, y1), (10.0, -10.0));
        }
        _ => panic!("expected a curve"),
    }
}

#[test]
fn quadratic_segments_are_kept() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <path d='M 0,0 Q 5,10 10,0'/>\
         </svg>",
    );

    assert!(matches!(
        shape.data[1],
        PathSegment::QuadTo { x1, y1, x, y } if x1 == 5.0 && y1 == 10.0 && x == 10.0 && y == 0.0
    ));
}

#[test]
fn rect_with_rounded_corners() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect width='40' height='20' rx='5'/>\
         </svg>",
    );

    assert!(shape
        .data
        .iter()
        .any(|seg| matches!(seg, PathSegment::CurveTo { .. })));
    let bbox = shape.data.bbox().unwrap();
    assert!((bbox.width() - 40.0).abs() < 1e-6);
    assert!((bbox.height() - 20.0).abs() < 1e-6);
}

#[test]
fn polygon_is_closed() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <polygon points='0,0 10,0 10,10'/>\
         </svg>",
    );

    assert!(matches!(shape.data.last(), Some(PathSegment::ClosePath)));
}

#[test]
fn circle_geometry() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <circle cx='50' cy='50' r='20'/>\
         </svg>",
    );

    let bbox = shape.data.bbox().unwrap();
    assert!((bbox.x() - 30.0).abs() < 0.1);
    assert!((bbox.y() - 30.0).abs() < 0.1);
    assert!((bbox.width() - 40.0).abs() < 0.1);
}

#[test]
fn malformed_length_falls_back_to_zero() {
    // `x="abc"` resolves to 0; the shape survives.
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect x='abc' y='10' width='10' height='10'/>\
         </svg>",
    );

    let bbox = shape.data.bbox().unwrap();
    assert_eq!(bbox.x(), 0.0);
    assert_eq!(bbox.y(), 10.0);
}

#[test]
fn invalid_rect_size_is_skipped() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect width='0' height='10'/>\
            <rect width='-5' height='10'/>\
         </svg>",
    );

    assert!(shapes(&tree).is_empty());
}

#[test]
fn percent_lengths_resolve_against_the_viewport() {
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='200' height='100' \
              viewBox='0 0 200 100'>\
            <rect width='50%' height='50%'/>\
         </svg>",
    );

    let bbox = shape.data.bbox().unwrap();
    assert!((bbox.width() - 100.0).abs() < 1e-6);
    assert!((bbox.height() - 50.0).abs() < 1e-6);
}

#[test]
fn physical_units() {
    // 1in = 96px at the default DPI; 1m = 100cm.
    let shape = single_shape(
        "<svg xmlns='http://www.w3.org/2000/svg' width='10000' height='10000'>\
            <rect width='1in' height='0.001m'/>\
         </svg>",
    );

    let bbox = shape.data.bbox().unwrap();
    assert!((bbox.width() - 96.0).abs() < 1e-6);
    assert!((bbox.height() - 96.0 / 25.4).abs() < 1e-6);
}
