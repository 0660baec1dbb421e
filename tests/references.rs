use svgres::{NodeKind, Options, Paint, Shape, Transform, Tree};

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

fn fill_color(shape: &Shape) -> svgres::Color {
    match shape.fill.as_ref().map(|f| &f.paint) {
        Some(Paint::Color(c)) => *c,
        _ => panic!("expected a plain fill color"),
    }
}

#[test]
fn use_expands_the_reference() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <defs><rect id='r' width='10' height='10' fill='red'/></defs>\
            <use href='#r'/>\
            <use href='#r'/>\
         </svg>",
    );

    // The definition inside `defs` is not rendered; each `use` is.
    assert_eq!(shapes(&tree).len(), 2);
}

#[test]
fn use_fill_override() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <defs><rect id='r' width='10' height='10'/></defs>\
            <use href='#r' fill='blue'/>\
         </svg>",
    );

    assert_eq!(
        fill_color(&shapes(&tree)[0]),
        svgres::Color::new_rgb(0, 0, 255)
    );
}

#[test]
fn two_uses_resolve_independently() {
    // The shared definition must not be mutated by either reference.
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <defs><rect id='r' width='10' height='10'/></defs>\
            <use href='#r' fill='red'/>\
            <use href='#r' fill='blue'/>\
         </svg>",
    );

    let shapes = shapes(&tree);
    assert_eq!(fill_color(&shapes[0]), svgres::Color::new_rgb(255, 0, 0));
    assert_eq!(fill_color(&shapes[1]), svgres::Color::new_rgb(0, 0, 255));
}

#[test]
fn use_position_composes_after_transform() {
    let with_offset = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <defs><rect id='r' width='10' height='10'/></defs>\
            <use href='#r' transform='scale(2)' x='5' y='7'/>\
         </svg>",
    );

    let without_offset = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <defs><rect id='r' width='10' height='10'/></defs>\
            <use href='#r' transform='scale(2)'/>\
         </svg>",
    );

    // The geometry itself is identical; only the composed transform
    // differs, by the x/y offset applied after the scale.
    let a = &shapes(&with_offset)[0];
    let b = &shapes(&without_offset)[0];

    let bbox_a = a.data.bbox().unwrap();
    let bbox_b = b.data.bbox().unwrap();
    assert_eq!(bbox_a.x(), bbox_b.x());
    assert_eq!(bbox_a.width(), bbox_b.width());

    let mut expected = Transform::new_scale(2.0, 2.0);
    expected.translate(5.0, 7.0);
    assert_eq!(a.transform, expected);
    assert_eq!(b.transform, Transform::new_scale(2.0, 2.0));

    // scale(2) then translate: the offset lands at (10, 14).
    assert_eq!(a.transform.apply(0.0, 0.0), (10.0, 14.0));
}

#[test]
fn recursive_use_is_skipped() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <g id='g1'><use id='u1' href='#g1'/></g>\
         </svg>",
    );

    assert!(shapes(&tree).is_empty());
}

#[test]
fn use_of_symbol_establishes_a_viewport() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <symbol id='s' viewBox='0 0 10 10'>\
                <rect width='10' height='10' fill='red'/>\
            </symbol>\
            <use href='#s' width='50' height='50'/>\
         </svg>",
    );

    let shapes = shapes(&tree);
    assert_eq!(shapes.len(), 1);

    // The viewBox maps the 10x10 content onto the 50x50 viewport.
    let (sx, sy) = shapes[0].transform.get_scale();
    assert!((sx - 5.0).abs() < 1e-9);
    assert!((sy - 5.0).abs() < 1e-9);
}

#[test]
fn clip_path_resolution() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <clipPath id='c'>\
                <circle cx='5' cy='5' r='5'/>\
                <rect width='4' height='4' clip-rule='evenodd'/>\
            </clipPath>\
            <rect clip-path='url(#c)' width='10' height='10'/>\
         </svg>",
    );

    let shape = &shapes(&tree)[0];
    let clip = shape.clip_path.as_ref().expect("clip must be resolved");
    assert_eq!(clip.shapes.len(), 2);
    assert_eq!(clip.shapes[1].rule, svgres::FillRule::EvenOdd);
}

#[test]
fn invalid_clip_reference_drops_the_element() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect clip-path='url(#missing)' width='10' height='10'/>\
         </svg>",
    );

    assert!(shapes(&tree).is_empty());
}

#[test]
fn markers_are_instanced_per_vertex() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <marker id='m' markerWidth='4' markerHeight='4'>\
                <rect width='2' height='2' fill='red'/>\
            </marker>\
            <path d='M 10,10 L 50,10 L 90,10' fill='none' stroke='black' \
                  marker-start='url(#m)' marker-mid='url(#m)' marker-end='url(#m)'/>\
         </svg>",
    );

    // One path plus three marker instances.
    let shapes = shapes(&tree);
    assert_eq!(shapes.len(), 4);
}

#[test]
fn marker_content_reaches_context_stroke() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <marker id='m' markerWidth='4' markerHeight='4'>\
                <rect width='2' height='2' fill='context-stroke'/>\
            </marker>\
            <path d='M 10,10 L 90,10' fill='none' stroke='red' marker-start='url(#m)'/>\
         </svg>",
    );

    let shapes = shapes(&tree);
    assert_eq!(shapes.len(), 2);
    // The marker rect picked up the path's stroke paint.
    assert_eq!(fill_color(&shapes[1]), svgres::Color::new_rgb(255, 0, 0));
}

#[test]
fn gradient_is_memoized_per_document() {
    // Two shapes referencing the same user-space gradient share
    // the resolved definition.
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='lg' gradientUnits='userSpaceOnUse' x2='100'>\
                <stop offset='0' stop-color='red'/>\
                <stop offset='1' stop-color='blue'/>\
            </linearGradient>\
            <rect width='10' height='10' fill='url(#lg)'/>\
            <rect x='20' width='10' height='10' fill='url(#lg)'/>\
         </svg>",
    );

    let shapes = shapes(&tree);
    let lg = |shape: &Shape| match shape.fill.as_ref().map(|f| &f.paint) {
        Some(Paint::LinearGradient(lg)) => lg.clone(),
        _ => panic!("expected a linear gradient"),
    };

    assert_eq!(lg(&shapes[0]).stops.len(), 2);
    assert_eq!(lg(&shapes[0]).stops.len(), lg(&shapes[1]).stops.len());
}
