use svgres::{NodeKind, Options, Paint, Shape, SpreadMethod, Tree};

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

fn linear_gradient(shape: &Shape) -> std::rc::Rc<svgres::LinearGradient> {
    match shape.fill.as_ref().map(|f| &f.paint) {
        Some(Paint::LinearGradient(lg)) => lg.clone(),
        _ => panic!("expected a linear gradient fill"),
    }
}

#[test]
fn stop_offsets_are_strictly_increasing() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='lg'>\
                <stop offset='0.5' stop-color='red'/>\
                <stop offset='0.7' stop-color='green'/>\
                <stop offset='0.7' stop-color='blue'/>\
            </linearGradient>\
            <rect fill='url(#lg)' width='10' height='10'/>\
         </svg>",
    );

    let lg = linear_gradient(&shapes(&tree)[0]);
    for window in lg.stops.windows(2) {
        assert!(window[0].offset.get() < window[1].offset.get());
    }
}

#[test]
fn decreasing_stop_offsets_are_fixed() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='lg'>\
                <stop offset='0.8' stop-color='red'/>\
                <stop offset='0.2' stop-color='blue'/>\
            </linearGradient>\
            <rect fill='url(#lg)' width='10' height='10'/>\
         </svg>",
    );

    let lg = linear_gradient(&shapes(&tree)[0]);
    assert_eq!(lg.stops.len(), 2);
    assert!(lg.stops[0].offset.get() < lg.stops[1].offset.get());
}

#[test]
fn single_stop_degrades_to_color() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='lg'>\
                <stop offset='0' stop-color='red'/>\
            </linearGradient>\
            <rect fill='url(#lg)' width='10' height='10'/>\
         </svg>",
    );

    let shape = &shapes(&tree)[0];
    assert!(matches!(
        shape.fill.as_ref().unwrap().paint,
        Paint::Color(c) if c == svgres::Color::new_rgb(255, 0, 0)
    ));
}

#[test]
fn gradient_template_reference() {
    // The referencing gradient has no own stops and no spread method;
    // both fill in from the template.
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='base' spreadMethod='repeat'>\
                <stop offset='0' stop-color='red'/>\
                <stop offset='1' stop-color='blue'/>\
            </linearGradient>\
            <linearGradient id='lg' href='#base' x1='0' x2='10'/>\
            <rect fill='url(#lg)' width='10' height='10'/>\
         </svg>",
    );

    let lg = linear_gradient(&shapes(&tree)[0]);
    assert_eq!(lg.stops.len(), 2);
    assert_eq!(lg.spread_method, SpreadMethod::Repeat);
}

#[test]
fn cyclic_gradient_template() {
    // Two gradients referencing each other must not recurse forever.
    // Neither has stops, so the fill resolves to nothing and the
    // shape is dropped.
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='a' href='#b'/>\
            <linearGradient id='b' href='#a'/>\
            <rect fill='url(#a)' width='10' height='10'/>\
         </svg>",
    );

    assert!(shapes(&tree).is_empty());
}

#[test]
fn bounding_box_units_are_resolved() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='200' height='100'>\
            <linearGradient id='lg'>\
                <stop offset='0' stop-color='red'/>\
                <stop offset='1' stop-color='blue'/>\
            </linearGradient>\
            <rect x='10' y='20' width='100' height='50' fill='url(#lg)'/>\
         </svg>",
    );

    let lg = linear_gradient(&shapes(&tree)[0]);
    // Coordinates are unit fractions mapped onto the shape's bbox.
    assert_eq!(lg.transform.apply(lg.x1, lg.y1), (10.0, 20.0));
    assert_eq!(lg.transform.apply(lg.x2, lg.y2), (110.0, 20.0));
}

#[test]
fn user_space_units_are_absolute() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='200' height='100'>\
            <linearGradient id='lg' gradientUnits='userSpaceOnUse' x1='5' x2='25'>\
                <stop offset='0' stop-color='red'/>\
                <stop offset='1' stop-color='blue'/>\
            </linearGradient>\
            <rect x='10' y='20' width='100' height='50' fill='url(#lg)'/>\
         </svg>",
    );

    let lg = linear_gradient(&shapes(&tree)[0]);
    assert_eq!(lg.x1, 5.0);
    assert_eq!(lg.x2, 25.0);
    assert_eq!(lg.transform.apply(lg.x1, lg.y1), (5.0, 0.0));
}

#[test]
fn bbox_gradient_on_a_line_falls_back() {
    // A horizontal line has no bounding box; a bbox gradient cannot
    // be resolved and the declared fallback color applies.
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='lg'>\
                <stop offset='0' stop-color='red'/>\
                <stop offset='1' stop-color='blue'/>\
            </linearGradient>\
            <path d='M 0,10 L 50,10' fill='url(#lg) green'/>\
         </svg>",
    );

    let shape = &shapes(&tree)[0];
    assert!(matches!(
        shape.fill.as_ref().unwrap().paint,
        Paint::Color(c) if c == svgres::Color::new_rgb(0, 128, 0)
    ));
}

#[test]
fn missing_paint_reference_uses_fallback() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect fill='url(#nope) red' width='10' height='10'/>\
         </svg>",
    );

    let shape = &shapes(&tree)[0];
    assert!(matches!(
        shape.fill.as_ref().unwrap().paint,
        Paint::Color(c) if c == svgres::Color::new_rgb(255, 0, 0)
    ));
}

#[test]
fn missing_paint_reference_without_fallback_drops_the_shape() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect fill='url(#nope)' width='10' height='10'/>\
         </svg>",
    );

    assert!(shapes(&tree).is_empty());
}

#[test]
fn fill_none() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect fill='none' stroke='red' width='10' height='10'/>\
         </svg>",
    );

    let shape = &shapes(&tree)[0];
    assert!(shape.fill.is_none());
    assert!(shape.stroke.is_some());
}

#[test]
fn stroke_properties() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect stroke='red' stroke-width='3' stroke-linecap='round' \
                  stroke-dasharray='5 3' width='10' height='10'/>\
         </svg>",
    );

    let shape = &shapes(&tree)[0];
    let stroke = shape.stroke.as_ref().unwrap();
    assert_eq!(stroke.width.get(), 3.0);
    assert_eq!(stroke.linecap, svgres::LineCap::Round);
    assert_eq!(stroke.dasharray.as_deref(), Some(&[5.0, 3.0][..]));
}

#[test]
fn stop_opacity_folds_color_alpha() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <linearGradient id='lg'>\
                <stop offset='0' stop-color='rgba(255,0,0,0.5)' stop-opacity='0.5'/>\
                <stop offset='1' stop-color='blue'/>\
            </linearGradient>\
            <rect fill='url(#lg)' width='10' height='10'/>\
         </svg>",
    );

    let lg = linear_gradient(&shapes(&tree)[0]);
    assert!((lg.stops[0].opacity.get() - 0.25).abs() < 0.01);
}
