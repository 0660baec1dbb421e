// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use crate::clippath::{ClipPath, ClipShape};
use crate::converter;
use crate::element::SvgElement;
use crate::geom::{view_box_to_transform, FuzzyEq, FuzzyZero, Rect, Size, Transform};
use crate::pathdata::{PathData, PathSegment, SharedPathData};
use crate::style::FillRule;
use crate::svgtree::{AId, AttributeValue, EId, Node};
use crate::tree::{self, NodeExt};
use crate::units::Length;
use crate::Units;

pub(crate) fn is_valid(element: &SvgElement) -> bool {
    element.find_attribute::<AttributeValue>(AId::MarkerStart).is_some()
        || element.find_attribute::<AttributeValue>(AId::MarkerMid).is_some()
        || element.find_attribute::<AttributeValue>(AId::MarkerEnd).is_some()
}

pub(crate) fn convert(
    element: &SvgElement,
    path: &SharedPathData,
    state: &converter::State,
    cache: &mut converter::Cache,
    parent: &mut tree::Node,
) {
    let list = [
        (AId::MarkerStart, MarkerKind::Start),
        (AId::MarkerMid, MarkerKind::Middle),
        (AId::MarkerEnd, MarkerKind::End),
    ];

    for (aid, kind) in &list {
        let marker = match element.find_attribute::<AttributeValue>(*aid) {
            Some(AttributeValue::Link(link)) => match resolve_marker(&link, element, cache) {
                Some(v) => v,
                None => continue,
            },
            _ => continue,
        };

        // Check for recursive markers.
        if state.marker_stack.contains(&marker.id()) {
            continue;
        }

        resolve(element, path, marker, *kind, state, cache, parent);
    }
}

// The definition lookup, memoized by id.
fn resolve_marker<'a>(
    link: &str,
    element: &SvgElement<'a>,
    cache: &mut converter::Cache,
) -> Option<Node<'a>> {
    if let Some(cached) = cache.markers.get(link) {
        return (*cached).map(|id| element.document().get(id));
    }

    let node = element
        .document()
        .element_by_id(link)
        .filter(|n| n.has_tag_name(EId::Marker));

    if node.is_none() {
        log::warn!("Marker '{}' is not found.", link);
    }

    cache.markers.insert(link.to_string(), node.map(|n| n.id()));
    node
}

#[derive(Clone, Copy)]
enum MarkerKind {
    Start,
    Middle,
    End,
}

enum MarkerOrientation {
    Auto,
    Angle(f64),
}

fn resolve(
    shape_element: &SvgElement,
    path: &SharedPathData,
    marker_node: Node,
    marker_kind: MarkerKind,
    state: &converter::State,
    cache: &mut converter::Cache,
    parent: &mut tree::Node,
) -> Option<()> {
    let marker = SvgElement::from_node(marker_node);

    let stroke_scale = stroke_scale(shape_element, &marker, state)?;

    let r = convert_rect(&marker, state)?;

    let view_box = marker.get_viewbox().map(|rect| crate::geom::ViewBox {
        rect,
        aspect: marker
            .attribute(AId::PreserveAspectRatio)
            .unwrap_or_default(),
    });

    let has_overflow = {
        let overflow = marker.attribute::<String>(AId::Overflow);
        // `overflow` is `hidden` by default.
        matches!(overflow.as_deref(), None | Some("hidden") | Some("scroll"))
    };

    let clip_path = if has_overflow {
        let clip_rect = if let Some(vbox) = view_box {
            vbox.rect
        } else {
            r.size().to_rect(0.0, 0.0)
        };

        Some(Rc::new(ClipPath {
            id: cache.gen_clip_path_id(),
            units: Units::UserSpaceOnUse,
            transform: Transform::default(),
            clip_path: None,
            shapes: vec![ClipShape {
                data: Rc::new(PathData::from_rect(clip_rect)),
                rule: FillRule::NonZero,
                transform: Transform::default(),
            }],
        }))
    } else {
        None
    };

    // Marker content inherits from the marker's own context, so the
    // instance shadow is parented to the definition, not to the shape.
    // Shape paints are still reachable via `context-fill`.
    let instance = match marker_node.parent_element() {
        Some(parent_node) => {
            SvgElement::from_node(parent_node).create_instance_shadow(marker_node)
        }
        None => marker.clone(),
    };

    let mut draw_marker = |x: f64, y: f64, idx: usize| {
        let mut ts = Transform::new_translate(x, y);

        let angle = match convert_orientation(&marker) {
            MarkerOrientation::Auto => calc_vertex_angle(path, idx),
            MarkerOrientation::Angle(angle) => angle,
        };

        if !angle.is_fuzzy_zero() {
            ts.rotate(angle);
        }

        if let Some(vbox) = view_box {
            let size = match Size::new(r.width() * stroke_scale, r.height() * stroke_scale) {
                Some(v) => v,
                None => return,
            };
            let vbox_ts = view_box_to_transform(vbox.rect, vbox.aspect, size);
            let (sx, sy) = vbox_ts.get_scale();
            ts.scale(sx, sy);
        } else {
            ts.scale(stroke_scale, stroke_scale);
        }

        ts.translate(-r.x(), -r.y());

        let mut g_node = parent.append_kind(tree::NodeKind::Group(tree::Group {
            transform: ts,
            clip_path: clip_path.clone(),
            ..tree::Group::default()
        }));

        let mut marker_state = state.clone();
        marker_state.marker_stack.push(marker_node.id());

        for child in instance.children() {
            converter::convert_element(&child, &marker_state, cache, &mut g_node);
        }

        if !g_node.has_children() {
            g_node.detach();
        }
    };

    draw_markers(path, marker_kind, &mut draw_marker);

    Some(())
}

fn stroke_scale(
    shape_element: &SvgElement,
    marker: &SvgElement,
    state: &converter::State,
) -> Option<f64> {
    match marker.attribute::<String>(AId::MarkerUnits).as_deref() {
        Some("userSpaceOnUse") => Some(1.0),
        _ => shape_element.resolve_valid_length(AId::StrokeWidth, state, 1.0),
    }
}

fn convert_rect(marker: &SvgElement, state: &converter::State) -> Option<Rect> {
    Rect::new(
        marker.convert_user_length(AId::RefX, state, Length::zero()),
        marker.convert_user_length(AId::RefY, state, Length::zero()),
        marker.convert_user_length(AId::MarkerWidth, state, Length::new_number(3.0)),
        marker.convert_user_length(AId::MarkerHeight, state, Length::new_number(3.0)),
    )
}

fn convert_orientation(marker: &SvgElement) -> MarkerOrientation {
    match marker.attribute::<AttributeValue>(AId::Orient) {
        Some(AttributeValue::String(ref s)) if s == "auto" || s == "auto-start-reverse" => {
            MarkerOrientation::Auto
        }
        Some(AttributeValue::Angle(angle)) => MarkerOrientation::Angle(angle.to_degrees()),
        _ => MarkerOrientation::Angle(0.0),
    }
}

fn draw_markers<P>(path: &PathData, kind: MarkerKind, draw_marker: &mut P)
where
    P: FnMut(f64, f64, usize),
{
    match kind {
        MarkerKind::Start => {
            if let Some(PathSegment::MoveTo { x, y }) = path.first().cloned() {
                draw_marker(x, y, 0);
            }
        }
        MarkerKind::Middle => {
            let total = path.len() - 1;
            let mut i = 1;
            while i < total {
                let (x, y) = match path[i] {
                    PathSegment::MoveTo { x, y }
                    | PathSegment::LineTo { x, y }
                    | PathSegment::CurveTo { x, y, .. }
                    | PathSegment::QuadTo { x, y, .. } => (x, y),
                    _ => {
                        i += 1;
                        continue;
                    }
                };

                draw_marker(x, y, i);

                i += 1;
            }
        }
        MarkerKind::End => {
            let idx = path.len() - 1;
            match path.last().cloned() {
                Some(PathSegment::LineTo { x, y })
                | Some(PathSegment::CurveTo { x, y, .. })
                | Some(PathSegment::QuadTo { x, y, .. }) => {
                    draw_marker(x, y, idx);
                }
                Some(PathSegment::ClosePath) => {
                    let (x, y) = get_subpath_start(path, idx);
                    draw_marker(x, y, idx);
                }
                _ => {}
            }
        }
    }
}

// A segment normalized for tangent calculations.
// Quadratic curves use their single control point on both sides.
#[derive(Clone, Copy)]
enum Seg {
    Move(f64, f64),
    Line(f64, f64),
    Curve(f64, f64, f64, f64, f64, f64),
    Close,
}

fn normalize(seg: PathSegment) -> Seg {
    match seg {
        PathSegment::MoveTo { x, y } => Seg::Move(x, y),
        PathSegment::LineTo { x, y } => Seg::Line(x, y),
        PathSegment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => Seg::Curve(x1, y1, x2, y2, x, y),
        PathSegment::QuadTo { x1, y1, x, y } => Seg::Curve(x1, y1, x1, y1, x, y),
        PathSegment::ClosePath => Seg::Close,
    }
}

fn calc_vertex_angle(path: &PathData, idx: usize) -> f64 {
    if idx == 0 {
        // The first segment.

        debug_assert!(path.len() > 1);

        let seg1 = normalize(path[0]);
        let seg2 = normalize(path[1]);

        match (seg1, seg2) {
            (Seg::Move(mx, my), Seg::Line(x, y)) => calc_line_angle(mx, my, x, y),
            (Seg::Move(mx, my), Seg::Curve(x1, y1, _, _, x, y)) => {
                if mx.fuzzy_eq(&x1) && my.fuzzy_eq(&y1) {
                    calc_line_angle(mx, my, x, y)
                } else {
                    calc_line_angle(mx, my, x1, y1)
                }
            }
            _ => 0.0,
        }
    } else if idx == path.len() - 1 {
        // The last segment.

        let seg1 = normalize(path[idx - 1]);
        let seg2 = normalize(path[idx]);

        match (seg1, seg2) {
            (_, Seg::Move(_, _)) => 0.0, // unreachable
            (_, Seg::Line(x, y)) => {
                let (px, py) = get_prev_vertex(path, idx);
                calc_line_angle(px, py, x, y)
            }
            (_, Seg::Curve(x1, y1, x2, y2, x, y)) => {
                if x2.fuzzy_eq(&x) && y2.fuzzy_eq(&y) {
                    calc_line_angle(x1, y1, x, y)
                } else {
                    calc_line_angle(x2, y2, x, y)
                }
            }
            (Seg::Line(x, y), Seg::Close) => {
                let (nx, ny) = get_subpath_start(path, idx);
                calc_line_angle(x, y, nx, ny)
            }
            (Seg::Curve(_, _, x2, y2, x, y), Seg::Close) => {
                let (px, py) = get_prev_vertex(path, idx);
                let (nx, ny) = get_subpath_start(path, idx);
                calc_curves_angle(px, py, x2, y2, x, y, nx, ny, nx, ny)
            }
            (_, Seg::Close) => 0.0,
        }
    } else {
        // Middle segments.

        let seg1 = normalize(path[idx]);
        let seg2 = normalize(path[idx + 1]);

        match (seg1, seg2) {
            (Seg::Move(mx, my), Seg::Line(x, y)) => calc_line_angle(mx, my, x, y),
            (Seg::Move(mx, my), Seg::Curve(x1, y1, ..)) => calc_line_angle(mx, my, x1, y1),
            (Seg::Line(x1, y1), Seg::Line(x2, y2)) => {
                let (px, py) = get_prev_vertex(path, idx);
                calc_angle(px, py, x1, y1, x1, y1, x2, y2)
            }
            (Seg::Curve(_, _, c1_x2, c1_y2, x, y), Seg::Curve(c2_x1, c2_y1, _, _, nx, ny)) => {
                let (px, py) = get_prev_vertex(path, idx);
                calc_curves_angle(px, py, c1_x2, c1_y2, x, y, c2_x1, c2_y1, nx, ny)
            }
            (Seg::Line(x, y), Seg::Curve(x1, y1, _, _, nx, ny)) => {
                let (px, py) = get_prev_vertex(path, idx);
                calc_curves_angle(px, py, px, py, x, y, x1, y1, nx, ny)
            }
            (Seg::Curve(_, _, x2, y2, x, y), Seg::Line(nx, ny)) => {
                let (px, py) = get_prev_vertex(path, idx);
                calc_curves_angle(px, py, x2, y2, x, y, nx, ny, nx, ny)
            }
            (Seg::Line(x, y), Seg::Move(_, _)) => {
                let (px, py) = get_prev_vertex(path, idx);
                calc_line_angle(px, py, x, y)
            }
            (Seg::Curve(_, _, x2, y2, x, y), Seg::Move(_, _)) => {
                if x.fuzzy_eq(&x2) && y.fuzzy_eq(&y2) {
                    let (px, py) = get_prev_vertex(path, idx);
                    calc_line_angle(px, py, x, y)
                } else {
                    calc_line_angle(x2, y2, x, y)
                }
            }
            (Seg::Line(x, y), Seg::Close) => {
                let (px, py) = get_prev_vertex(path, idx);
                let (nx, ny) = get_subpath_start(path, idx);
                calc_angle(px, py, x, y, x, y, nx, ny)
            }
            (_, Seg::Close) => {
                let (px, py) = get_prev_vertex(path, idx);
                let (nx, ny) = get_subpath_start(path, idx);
                calc_line_angle(px, py, nx, ny)
            }
            (_, Seg::Move(_, _)) | (Seg::Close, _) => 0.0,
        }
    }
}

fn calc_line_angle(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    calc_angle(x1, y1, x2, y2, x1, y1, x2, y2)
}

fn calc_curves_angle(
    px: f64,
    py: f64, // previous vertex
    cx1: f64,
    cy1: f64, // previous control point
    x: f64,
    y: f64, // current vertex
    cx2: f64,
    cy2: f64, // next control point
    nx: f64,
    ny: f64, // next vertex
) -> f64 {
    if cx1.fuzzy_eq(&x) && cy1.fuzzy_eq(&y) {
        calc_angle(px, py, x, y, x, y, cx2, cy2)
    } else if x.fuzzy_eq(&cx2) && y.fuzzy_eq(&cy2) {
        calc_angle(cx1, cy1, x, y, x, y, nx, ny)
    } else {
        calc_angle(cx1, cy1, x, y, x, y, cx2, cy2)
    }
}

fn calc_angle(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> f64 {
    use std::f64::consts::*;

    fn normalize(rad: f64) -> f64 {
        let v = rad % (PI * 2.0);
        if v < 0.0 {
            v + PI * 2.0
        } else {
            v
        }
    }

    fn vector_angle(vx: f64, vy: f64) -> f64 {
        let rad = vy.atan2(vx);
        if rad.is_nan() {
            0.0
        } else {
            normalize(rad)
        }
    }

    let in_a = vector_angle(x2 - x1, y2 - y1);
    let out_a = vector_angle(x4 - x3, y4 - y3);
    let d = (out_a - in_a) * 0.5;

    let mut angle = in_a + d;
    if FRAC_PI_2 < d.abs() {
        angle -= PI;
    }

    normalize(angle).to_degrees()
}

fn get_subpath_start(segments: &[PathSegment], idx: usize) -> (f64, f64) {
    let offset = segments.len() - idx;
    for seg in segments.iter().rev().skip(offset) {
        if let PathSegment::MoveTo { x, y } = *seg {
            return (x, y);
        }
    }

    (0.0, 0.0)
}

fn get_prev_vertex(segments: &[PathSegment], idx: usize) -> (f64, f64) {
    match segments[idx - 1] {
        PathSegment::MoveTo { x, y }
        | PathSegment::LineTo { x, y }
        | PathSegment::CurveTo { x, y, .. }
        | PathSegment::QuadTo { x, y, .. } => (x, y),
        PathSegment::ClosePath => get_subpath_start(segments, idx),
    }
}
