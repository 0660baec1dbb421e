use svgres::{FilterKind, NodeKind, Options, Tree};

fn resolve(text: &str) -> Tree {
    Tree::from_str(text, &Options::default()).unwrap()
}

fn first_filter(tree: &Tree) -> std::rc::Rc<svgres::Filter> {
    for node in tree.root.descendants() {
        if let NodeKind::Group(ref g) = *node.borrow() {
            if let Some(ref filter) = g.filter {
                return filter.clone();
            }
        }
    }

    panic!("no filter in the tree");
}

#[test]
fn default_linkage_keeps_document_order() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <filter id='f'>\
                <feGaussianBlur stdDeviation='2'/>\
                <feOffset dx='5' dy='5'/>\
                <feGaussianBlur stdDeviation='1'/>\
            </filter>\
            <g filter='url(#f)'><rect width='10' height='10'/></g>\
         </svg>",
    );

    let filter = first_filter(&tree);
    let names: Vec<_> = filter.primitives.iter().map(|p| p.result.as_str()).collect();
    assert_eq!(names, ["result1", "result2", "result3"]);

    // The first primitive consumes the source; the rest chain off
    // the previous result.
    assert!(matches!(
        filter.primitives[0].kind,
        FilterKind::GaussianBlur(ref fe) if fe.input == svgres::FilterInput::SourceGraphic
    ));
    assert!(matches!(
        filter.primitives[1].kind,
        FilterKind::Offset(ref fe)
            if fe.input == svgres::FilterInput::Reference("result1".to_string())
    ));
}

#[test]
fn dead_branches_are_dropped() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <filter id='f'>\
                <feGaussianBlur in='SourceGraphic' stdDeviation='9' result='dead'/>\
                <feGaussianBlur in='SourceGraphic' stdDeviation='2' result='a'/>\
                <feOffset in='a' dx='5' dy='5'/>\
            </filter>\
            <g filter='url(#f)'><rect width='10' height='10'/></g>\
         </svg>",
    );

    let filter = first_filter(&tree);
    let names: Vec<_> = filter.primitives.iter().map(|p| p.result.as_str()).collect();
    assert!(!names.contains(&"dead"));
    assert_eq!(names.len(), 2);
}

#[test]
fn out_of_order_producers() {
    // `use`-before-declaration: the producer is declared after
    // the consumer, but must run first.
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <filter id='f'>\
                <feOffset in='late' dx='5' dy='5' result='shifted'/>\
                <feGaussianBlur in='SourceGraphic' stdDeviation='2' result='late'/>\
                <feMerge>\
                    <feMergeNode in='shifted'/>\
                </feMerge>\
            </filter>\
            <g filter='url(#f)'><rect width='10' height='10'/></g>\
         </svg>",
    );

    let filter = first_filter(&tree);
    let names: Vec<_> = filter.primitives.iter().map(|p| p.result.as_str()).collect();

    let late = names.iter().position(|n| *n == "late").unwrap();
    let shifted = names.iter().position(|n| *n == "shifted").unwrap();
    assert!(late < shifted);
}

#[test]
fn unsupported_primitive_is_a_passthrough() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <filter id='f'>\
                <feGaussianBlur stdDeviation='2'/>\
                <feTurbulence baseFrequency='0.05'/>\
            </filter>\
            <g filter='url(#f)'><rect width='10' height='10'/></g>\
         </svg>",
    );

    let filter = first_filter(&tree);
    assert!(matches!(
        filter.primitives.last().unwrap().kind,
        FilterKind::Passthrough(_)
    ));
}

#[test]
fn composite_and_lighting_are_structural() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <filter id='f'>\
                <feGaussianBlur stdDeviation='2' result='blur'/>\
                <feSpecularLighting surfaceScale='2' specularConstant='0.5' \
                                    specularExponent='10' lighting-color='white' result='spec'>\
                    <feDistantLight azimuth='45' elevation='60'/>\
                </feSpecularLighting>\
                <feComposite in='spec' in2='blur' operator='arithmetic' \
                             k1='0.5' k2='0.5' k3='0' k4='0'/>\
            </filter>\
            <g filter='url(#f)'><rect width='10' height='10'/></g>\
         </svg>",
    );

    let filter = first_filter(&tree);
    assert_eq!(filter.primitives.len(), 3);

    match filter.primitives[1].kind {
        FilterKind::SpecularLighting(ref fe) => {
            assert_eq!(fe.surface_scale, 2.0);
            assert!(matches!(
                fe.light_source,
                Some(svgres::LightSource::Distant { azimuth, elevation })
                    if azimuth == 45.0 && elevation == 60.0
            ));
        }
        _ => panic!("expected specular lighting"),
    }

    match filter.primitives[2].kind {
        FilterKind::Composite(ref fe) => {
            assert!(matches!(
                fe.operator,
                svgres::CompositeOperator::Arithmetic { k1, k2, .. } if k1 == 0.5 && k2 == 0.5
            ));
        }
        _ => panic!("expected a composite"),
    }
}

#[test]
fn invalid_filter_reference_drops_the_element() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <g filter='url(#missing)'><rect width='10' height='10'/></g>\
         </svg>",
    );

    let has_shapes = tree
        .root
        .descendants()
        .any(|n| matches!(*n.borrow(), NodeKind::Shape(_)));
    assert!(!has_shapes);
}

#[test]
fn empty_filter_drops_the_element() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <filter id='f'/>\
            <rect filter='url(#f)' width='10' height='10'/>\
         </svg>",
    );

    let has_shapes = tree
        .root
        .descendants()
        .any(|n| matches!(*n.borrow(), NodeKind::Shape(_)));
    assert!(!has_shapes);
}

#[test]
fn filter_region_is_resolved() {
    let tree = resolve(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
            <filter id='f' filterUnits='userSpaceOnUse' x='5' y='5' width='50' height='40'>\
                <feGaussianBlur stdDeviation='2'/>\
            </filter>\
            <g filter='url(#f)'><rect width='10' height='10'/></g>\
         </svg>",
    );

    let filter = first_filter(&tree);
    assert_eq!(filter.rect.x(), 5.0);
    assert_eq!(filter.rect.width(), 50.0);
}
