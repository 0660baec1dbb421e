use svgres::{NodeKind, Options, Paint, Shape, Tree};

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

const RED: svgres::Color = svgres::Color {
    red: 255,
    green: 0,
    blue: 0,
};
const BLUE: svgres::Color = svgres::Color {
    red: 0,
    green: 0,
    blue: 255,
};

#[test]
fn id_beats_tag() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <style>rect { fill: red } #r1 { fill: blue }</style>\
            <rect id='r1' width='10' height='10'/>\
         </svg>",
    );

    let shapes = shapes(&tree);
    assert_eq!(shapes.len(), 1);
    assert_eq!(fill_color(&shapes[0]), BLUE);
}

#[test]
fn later_rule_wins_on_equal_specificity() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <style>rect { fill: blue } rect { fill: red }</style>\
            <rect width='10' height='10'/>\
         </svg>",
    );

    assert_eq!(fill_color(&shapes(&tree)[0]), RED);
}

#[test]
fn class_beats_later_tag_rule() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <style>.hot { fill: red } rect { fill: blue }</style>\
            <rect class='hot' width='10' height='10'/>\
         </svg>",
    );

    assert_eq!(fill_color(&shapes(&tree)[0]), RED);
}

#[test]
fn descendant_combinator() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <style>g rect { fill: red }</style>\
            <g><rect width='10' height='10'/></g>\
            <rect width='10' height='10'/>\
         </svg>",
    );

    let shapes = shapes(&tree);
    assert_eq!(shapes.len(), 2);
    assert_eq!(fill_color(&shapes[0]), RED);
    // The second rect is outside of a `g` and keeps the default black.
    assert_eq!(fill_color(&shapes[1]), svgres::Color::black());
}

#[test]
fn inline_style_beats_stylesheet() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <style>#r1 { fill: blue }</style>\
            <rect id='r1' style='fill:red' width='10' height='10'/>\
         </svg>",
    );

    assert_eq!(fill_color(&shapes(&tree)[0]), RED);
}

#[test]
fn style_beats_presentation_attribute() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <style>rect { fill: red }</style>\
            <rect fill='blue' width='10' height='10'/>\
         </svg>",
    );

    assert_eq!(fill_color(&shapes(&tree)[0]), RED);
}

#[test]
fn fill_is_inherited() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <g fill='red'>\
                <rect width='10' height='10'/>\
            </g>\
         </svg>",
    );

    assert_eq!(fill_color(&shapes(&tree)[0]), RED);
}

#[test]
fn opacity_is_folded_into_paint() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <g opacity='0.5'>\
                <rect fill-opacity='0.5' width='10' height='10'/>\
            </g>\
         </svg>",
    );

    let shape = &shapes(&tree)[0];
    let opacity = shape.fill.as_ref().unwrap().opacity.get();
    assert!((opacity - 0.25).abs() < 1e-9);
}

#[test]
fn current_color() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <g color='red'>\
                <rect fill='currentColor' width='10' height='10'/>\
            </g>\
         </svg>",
    );

    assert_eq!(fill_color(&shapes(&tree)[0]), RED);
}

#[test]
fn display_none_is_skipped() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <rect display='none' width='10' height='10'/>\
            <rect width='10' height='10'/>\
         </svg>",
    );

    assert_eq!(shapes(&tree).len(), 1);
}

#[test]
fn lenient_namespaces_by_default() {
    let tree = Tree::from_str(
        "<svg width='100' height='100'><rect width='10' height='10'/></svg>",
        &Options::default(),
    )
    .unwrap();
    assert_eq!(shapes(&tree).len(), 1);

    let strict = Options {
        strict_namespaces: true,
        ..Options::default()
    };
    assert!(Tree::from_str("<svg width='100' height='100'/>", &strict).is_err());
}

#[test]
fn broken_xml_is_fatal() {
    assert!(Tree::from_str("<svg", &Options::default()).is_err());
}

#[test]
fn malformed_css_is_not_fatal() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <style>rect { fill: } @bogus { nonsense</style>\
            <rect width='10' height='10'/>\
         </svg>",
    );

    assert_eq!(shapes(&tree).len(), 1);
}
