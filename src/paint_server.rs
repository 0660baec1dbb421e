// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use strict_num::PositiveF64;

use crate::converter;
use crate::element::SvgElement;
use crate::geom::{f64_bound, FuzzyEq, FuzzyZero, IsValidLength, Line, Rect, Transform};
use crate::style::{Color, Paint, SvgColorExt};
use crate::svgtree::{AId, AttributeValue, EId, Node};
use crate::units::{Length, Unit};
use crate::{Opacity, Units};

/// An alias to `NormalizedF64`.
pub type StopOffset = strict_num::NormalizedF64;

/// A spread method.
///
/// `spreadMethod` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SpreadMethod {
    Pad,
    Reflect,
    Repeat,
}

impl_enum_default!(SpreadMethod, Pad);

impl_enum_from_str!(SpreadMethod,
    "pad"     => SpreadMethod::Pad,
    "reflect" => SpreadMethod::Reflect,
    "repeat"  => SpreadMethod::Repeat
);

/// Gradient's stop element.
///
/// `stop` element in SVG.
#[derive(Clone, Copy, Debug)]
pub struct Stop {
    /// Gradient stop offset.
    ///
    /// After resolution offsets are strictly increasing.
    pub offset: StopOffset,

    /// Gradient stop color.
    pub color: Color,

    /// Gradient stop opacity.
    ///
    /// The stop color alpha is already folded in.
    pub opacity: Opacity,
}

/// A generic gradient, fully resolved into user space.
#[derive(Clone, Debug)]
pub struct BaseGradient {
    /// Element's ID. Can't be empty.
    pub id: String,

    /// Gradient transform.
    ///
    /// For gradients declared in bounding-box units this already
    /// contains the unit-square to bounding-box mapping, composed
    /// before the gradient's own transform.
    pub transform: Transform,

    /// Gradient spreading method.
    pub spread_method: SpreadMethod,

    /// A list of `stop` elements. At least two.
    pub stops: Vec<Stop>,
}

/// A linear gradient.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct LinearGradient {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,

    /// Base gradient data.
    pub base: BaseGradient,
}

impl std::ops::Deref for LinearGradient {
    type Target = BaseGradient;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// A radial gradient.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct RadialGradient {
    pub cx: f64,
    pub cy: f64,
    pub r: PositiveF64,
    pub fx: f64,
    pub fy: f64,

    /// Base gradient data.
    pub base: BaseGradient,
}

impl std::ops::Deref for RadialGradient {
    type Target = BaseGradient;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

// A memoized gradient definition. Geometry is kept in its declared
// coordinate space; `instantiate` resolves it against a concrete shape.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedGradient {
    pub id: String,
    pub units: Units,
    pub transform: Transform,
    pub spread_method: SpreadMethod,
    pub stops: Vec<Stop>,
    pub kind: GradientKind,
}

#[derive(Clone, Debug)]
pub(crate) enum GradientKind {
    Linear {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Radial {
        cx: f64,
        cy: f64,
        r: f64,
        fx: f64,
        fy: f64,
    },
}

#[derive(Clone)]
pub(crate) enum ServerOrColor {
    Server(Rc<ResolvedGradient>),
    Color { color: Color, opacity: Opacity },
}

/// Resolves a gradient element into a definition or a plain color.
///
/// Memoized by the element id for the conversion's lifetime.
pub(crate) fn convert(
    node: Node,
    state: &converter::State,
    cache: &mut converter::Cache,
) -> Option<ServerOrColor> {
    let id = node.element_id().to_string();
    if let Some(cached) = cache.paint_servers.get(&id) {
        return cached.clone();
    }

    let result = convert_impl(node, state);
    cache.paint_servers.insert(id, result.clone());
    result
}

fn convert_impl(node: Node, state: &converter::State) -> Option<ServerOrColor> {
    let stops = convert_stops(find_gradient_with_stops(node)?);
    if stops.is_empty() {
        return None;
    }

    // 'If one stop is defined, then paint with the solid color fill
    // using the color defined for that gradient stop.'
    if stops.len() == 1 {
        let stop = stops[0];
        return Some(ServerOrColor::Color {
            color: stop.color,
            opacity: stop.opacity,
        });
    }

    let units = convert_units(node, AId::GradientUnits, Units::ObjectBoundingBox);
    let transform = resolve_element(node, AId::GradientTransform)
        .attribute(AId::GradientTransform)
        .unwrap_or_default();
    let spread_method = resolve_element(node, AId::SpreadMethod)
        .attribute(AId::SpreadMethod)
        .unwrap_or_default();

    let kind = match node.tag_name()? {
        EId::LinearGradient => GradientKind::Linear {
            x1: resolve_number(node, AId::X1, units, state, Length::zero()),
            y1: resolve_number(node, AId::Y1, units, state, Length::zero()),
            x2: resolve_number(node, AId::X2, units, state, Length::new(100.0, Unit::Percent)),
            y2: resolve_number(node, AId::Y2, units, state, Length::zero()),
        },
        EId::RadialGradient => {
            let r = resolve_number(node, AId::R, units, state, Length::new(50.0, Unit::Percent));

            // 'A value of zero will cause the area to be painted as a single
            // color using the color and opacity of the last gradient stop.'
            if !r.is_valid_length() {
                let stop = stops.last().unwrap();
                return Some(ServerOrColor::Color {
                    color: stop.color,
                    opacity: stop.opacity,
                });
            }

            let cx = resolve_number(node, AId::Cx, units, state, Length::new(50.0, Unit::Percent));
            let cy = resolve_number(node, AId::Cy, units, state, Length::new(50.0, Unit::Percent));
            let fx = resolve_number(node, AId::Fx, units, state, Length::new_number(cx));
            let fy = resolve_number(node, AId::Fy, units, state, Length::new_number(cy));
            let (fx, fy) = prepare_focal(cx, cy, r, fx, fy);

            GradientKind::Radial { cx, cy, r, fx, fy }
        }
        _ => return None,
    };

    Some(ServerOrColor::Server(Rc::new(ResolvedGradient {
        id: node.element_id().to_string(),
        units,
        transform,
        spread_method,
        stops,
        kind,
    })))
}

/// Instantiates a gradient definition for a concrete shape.
///
/// Bounding-box coordinates are resolved by composing the unit-square
/// to bbox mapping before the gradient's own transform. Returns `None`
/// for a bounding-box gradient on a shape without a bounding box.
pub(crate) fn instantiate(server: &ResolvedGradient, bbox: Option<Rect>) -> Option<Paint> {
    let transform = match server.units {
        Units::ObjectBoundingBox => {
            let bbox = match bbox {
                Some(v) => v,
                None => {
                    log::warn!(
                        "Gradient '{}' cannot be used on a shape without a bounding box.",
                        server.id
                    );
                    return None;
                }
            };

            let mut ts = Transform::from_bbox(bbox);
            ts.append(&server.transform);
            ts
        }
        Units::UserSpaceOnUse => server.transform,
    };

    let base = BaseGradient {
        id: server.id.clone(),
        transform,
        spread_method: server.spread_method,
        stops: server.stops.clone(),
    };

    match server.kind {
        GradientKind::Linear { x1, y1, x2, y2 } => {
            Some(Paint::LinearGradient(Rc::new(LinearGradient {
                x1,
                y1,
                x2,
                y2,
                base,
            })))
        }
        GradientKind::Radial { cx, cy, r, fx, fy } => {
            Some(Paint::RadialGradient(Rc::new(RadialGradient {
                cx,
                cy,
                r: PositiveF64::new(r)?,
                fx,
                fy,
                base,
            })))
        }
    }
}

// Searches for a gradient with stop children over the template chain.
// The chain iterator guards against reference cycles.
fn find_gradient_with_stops(node: Node) -> Option<Node> {
    for link in node.href_iter() {
        if !link.tag_name().map(|t| t.is_gradient()).unwrap_or(false) {
            log::warn!(
                "Gradient '{}' cannot reference '{}' via 'href'.",
                node.element_id(),
                link.tag_name().map(|t| t.to_str()).unwrap_or("?")
            );
            return None;
        }

        if link.children().any(|n| n.has_tag_name(EId::Stop)) {
            return Some(link);
        }
    }

    None
}

fn convert_stops(grad: Node) -> Vec<Stop> {
    let mut stops = Vec::new();

    {
        let mut prev_offset = 0.0;
        for stop in grad.children() {
            if !stop.has_tag_name(EId::Stop) {
                if stop.is_element() {
                    log::warn!("Invalid gradient child: '{:?}'.", stop.tag_name());
                }
                continue;
            }

            let element = SvgElement::from_node(stop);

            // `offset` = <number> | <percentage>
            let offset = match element.attribute::<Length>(AId::Offset) {
                Some(l) if l.unit == Unit::Percent => l.number / 100.0,
                Some(l) => l.number,
                None => prev_offset,
            };
            let offset = f64_bound(0.0, offset, 1.0);
            prev_offset = offset;

            let (color, alpha) = match element.attribute::<AttributeValue>(AId::StopColor) {
                Some(AttributeValue::CurrentColor) => element
                    .find_attribute(AId::Color)
                    .unwrap_or_else(svgtypes::Color::black),
                Some(AttributeValue::Color(c)) => c,
                _ => svgtypes::Color::black(),
            }
            .split_alpha();

            let stop_opacity = element
                .attribute::<Opacity>(AId::StopOpacity)
                .unwrap_or(Opacity::ONE);

            stops.push(Stop {
                offset: StopOffset::new_clamped(offset),
                color,
                opacity: Opacity::new_clamped(alpha.get() * stop_opacity.get()),
            });
        }
    }

    // Remove stops with equal offset.
    //
    // Example:
    // offset="0.5"
    // offset="0.7"
    // offset="0.7" <-- this one should be removed
    // offset="0.7"
    // offset="0.9"
    if stops.len() >= 3 {
        let mut i = 0;
        while i < stops.len() - 2 {
            let offset1 = stops[i + 0].offset.get();
            let offset2 = stops[i + 1].offset.get();
            let offset3 = stops[i + 2].offset.get();

            if offset1.fuzzy_eq(&offset2) && offset2.fuzzy_eq(&offset3) {
                // Remove the offset in the middle.
                stops.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    // Remove zeros.
    //
    // From:
    // offset="0.0"
    // offset="0.0"
    // offset="0.7"
    //
    // To:
    // offset="0.0"
    // offset="0.00000001"
    // offset="0.7"
    if stops.len() >= 2 {
        let mut i = 0;
        while i < stops.len() - 1 {
            let offset1 = stops[i + 0].offset.get();
            let offset2 = stops[i + 1].offset.get();

            if offset1.is_fuzzy_zero() && offset2.is_fuzzy_zero() {
                stops[i + 1].offset = StopOffset::new_clamped(offset1 + f64::EPSILON);
            }

            i += 1;
        }
    }

    // Shift equal offsets.
    //
    // From:
    // offset="0.5"
    // offset="0.7"
    // offset="0.7"
    //
    // To:
    // offset="0.5"
    // offset="0.699999999"
    // offset="0.7"
    {
        let mut i = 1;
        while i < stops.len() {
            let offset1 = stops[i - 1].offset.get();
            let offset2 = stops[i - 0].offset.get();

            // The next offset must be smaller than the previous one.
            if offset1 > offset2 || offset1.fuzzy_eq(&offset2) {
                // Make the previous offset a bit smaller.
                let new_offset = offset1 - f64::EPSILON;
                stops[i - 1].offset = StopOffset::new_clamped(f64_bound(0.0, new_offset, 1.0));
                stops[i - 0].offset = StopOffset::new_clamped(offset1);
            }

            i += 1;
        }
    }

    stops
}

#[inline(never)]
pub(crate) fn resolve_number(
    node: Node,
    aid: AId,
    units: Units,
    state: &converter::State,
    def: Length,
) -> f64 {
    SvgElement::from_node(resolve_attr(node, aid)).convert_length(aid, units, state, def)
}

fn resolve_element(node: Node, aid: AId) -> SvgElement {
    SvgElement::from_node(resolve_attr(node, aid))
}

// Unset gradient fields are filled transitively from the `href`
// template chain. Only compatible attributes can be resolved:
// coordinates require the same gradient kind.
fn resolve_attr(node: Node, aid: AId) -> Node {
    if node.has_attribute(aid) {
        return node;
    }

    for link in node.href_iter().skip(1) {
        let tag_name = match link.tag_name() {
            Some(v) => v,
            None => return node,
        };

        let compatible = match aid {
            AId::X1 | AId::Y1 | AId::X2 | AId::Y2 => tag_name == EId::LinearGradient,
            AId::Cx | AId::Cy | AId::R | AId::Fx | AId::Fy => tag_name == EId::RadialGradient,
            AId::GradientUnits | AId::SpreadMethod | AId::GradientTransform => {
                tag_name.is_gradient()
            }
            _ => false,
        };

        if !compatible {
            break;
        }

        if link.has_attribute(aid) {
            return link;
        }
    }

    node
}

/// Resolves element units over the template chain.
pub(crate) fn convert_units(node: Node, aid: AId, def: Units) -> Units {
    resolve_element(node, aid).attribute(aid).unwrap_or(def)
}

/// Prepares the radial gradient focal point.
///
/// According to the SVG spec: if the point defined by `fx` and `fy` lies
/// outside the circle defined by `cx`, `cy` and `r`, then the user agent
/// shall set the focal point to the intersection of the line from
/// (`cx`, `cy`) to (`fx`, `fy`) with the circle.
fn prepare_focal(cx: f64, cy: f64, r: f64, fx: f64, fy: f64) -> (f64, f64) {
    let max_r = r - r * 0.001;

    let mut line = Line::new(cx, cy, fx, fy);

    if line.length() > max_r {
        line.set_length(max_r);
    }

    (line.x2, line.y2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_stops() -> Vec<Stop> {
        vec![
            Stop {
                offset: StopOffset::new_clamped(0.0),
                color: Color::black(),
                opacity: Opacity::ONE,
            },
            Stop {
                offset: StopOffset::new_clamped(1.0),
                color: Color::black(),
                opacity: Opacity::ONE,
            },
        ]
    }

    #[test]
    fn bbox_units_composition() {
        let server = ResolvedGradient {
            id: "lg1".to_string(),
            units: Units::ObjectBoundingBox,
            transform: Transform::default(),
            spread_method: SpreadMethod::Pad,
            stops: dummy_stops(),
            kind: GradientKind::Linear {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 0.0,
            },
        };

        // Without a bbox the gradient cannot be instantiated.
        assert!(instantiate(&server, None).is_none());

        let bbox = Rect::new(10.0, 20.0, 100.0, 50.0).unwrap();
        match instantiate(&server, Some(bbox)) {
            Some(Paint::LinearGradient(lg)) => {
                // The unit square is mapped onto the bbox.
                assert_eq!(lg.transform.apply(lg.x1, lg.y1), (10.0, 20.0));
                assert_eq!(lg.transform.apply(lg.x2, lg.y2), (110.0, 20.0));
            }
            _ => panic!("expected a linear gradient"),
        }
    }

    #[test]
    fn user_space_keeps_transform() {
        let mut transform = Transform::default();
        transform.translate(5.0, 5.0);

        let server = ResolvedGradient {
            id: "lg2".to_string(),
            units: Units::UserSpaceOnUse,
            transform,
            spread_method: SpreadMethod::Pad,
            stops: dummy_stops(),
            kind: GradientKind::Linear {
                x1: 0.0,
                y1: 0.0,
                x2: 100.0,
                y2: 0.0,
            },
        };

        match instantiate(&server, None) {
            Some(Paint::LinearGradient(lg)) => {
                assert_eq!(lg.transform.apply(0.0, 0.0), (5.0, 5.0));
            }
            _ => panic!("expected a linear gradient"),
        }
    }
}
