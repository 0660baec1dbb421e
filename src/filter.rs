// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Filter subtree resolution.
//!
//! The core decides only which primitives run in what order over which
//! named buffers. The numeric implementation of each primitive belongs
//! to an external executor.

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::converter;
use crate::element::SvgElement;
use crate::geom::Rect;
use crate::paint_server::{convert_units, resolve_number};
use crate::style::Color;
use crate::svgtree::{AId, AttributeValue, EId, Node};
use crate::units::{Length, Unit};
use crate::Units;

/// A resolved filter.
#[derive(Clone, Debug)]
pub struct Filter {
    /// Element's ID. Can't be empty.
    pub id: String,

    /// Region coordinate system units.
    pub units: Units,

    /// Content coordinate system units.
    pub primitive_units: Units,

    /// Filter region.
    pub rect: Rect,

    /// The minimal ordered primitive chain: dead branches removed,
    /// producers before consumers.
    pub primitives: Vec<Primitive>,
}

/// A filter primitive with a resolved output buffer name.
#[derive(Clone, Debug)]
pub struct Primitive {
    /// The output buffer name: authored via `result` or generated,
    /// unique within the filter.
    pub result: String,

    /// Primitive kind with resolved input buffer names.
    pub kind: FilterKind,
}

/// An input buffer of a filter primitive.
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Debug)]
pub enum FilterInput {
    SourceGraphic,
    SourceAlpha,
    /// Another primitive's output buffer.
    Reference(String),
}

/// A filter primitive kind.
///
/// Composite and specular lighting are carried structurally, with
/// parsed parameters but no numeric implementation here. Unsupported
/// primitives degrade to [`FilterKind::Passthrough`].
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum FilterKind {
    GaussianBlur(FeGaussianBlur),
    Offset(FeOffset),
    Merge(FeMerge),
    Composite(FeComposite),
    SpecularLighting(FeSpecularLighting),
    Passthrough(FePassthrough),
}

impl FilterKind {
    /// Returns the primitive's ordered inputs.
    pub fn inputs(&self) -> Vec<&FilterInput> {
        match self {
            FilterKind::GaussianBlur(ref fe) => vec![&fe.input],
            FilterKind::Offset(ref fe) => vec![&fe.input],
            FilterKind::Merge(ref fe) => fe.inputs.iter().collect(),
            FilterKind::Composite(ref fe) => vec![&fe.input1, &fe.input2],
            FilterKind::SpecularLighting(ref fe) => vec![&fe.input],
            FilterKind::Passthrough(ref fe) => vec![&fe.input],
        }
    }
}

/// A gaussian blur primitive.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FeGaussianBlur {
    pub input: FilterInput,
    pub std_dev_x: f64,
    pub std_dev_y: f64,
}

/// An offset primitive.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FeOffset {
    pub input: FilterInput,
    pub dx: f64,
    pub dy: f64,
}

/// A merge primitive.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FeMerge {
    pub inputs: Vec<FilterInput>,
}

/// A composite primitive.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FeComposite {
    pub operator: CompositeOperator,
    pub input1: FilterInput,
    pub input2: FilterInput,
}

/// A composite operator.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CompositeOperator {
    Over,
    In,
    Out,
    Atop,
    Xor,
    Arithmetic { k1: f64, k2: f64, k3: f64, k4: f64 },
}

/// A specular lighting primitive.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FeSpecularLighting {
    pub input: FilterInput,
    pub surface_scale: f64,
    pub specular_constant: f64,
    pub specular_exponent: f64,
    pub lighting_color: Color,
    pub light_source: Option<LightSource>,
}

/// A light source of a lighting primitive.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub enum LightSource {
    Distant { azimuth: f64, elevation: f64 },
    Point { x: f64, y: f64, z: f64 },
}

/// A structurally accepted but unimplemented primitive.
///
/// Passes its input through unchanged.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FePassthrough {
    pub input: FilterInput,
}

/// Resolves the `filter` attribute of an element.
///
/// Returns `Ok(None)` when there is no filter, and `Err(())` when the
/// filter reference is invalid: such elements are dropped entirely.
pub(crate) fn convert(
    element: &SvgElement,
    state: &converter::State,
    cache: &mut converter::Cache,
) -> Result<Option<Rc<Filter>>, ()> {
    let link = match element.attribute::<AttributeValue>(AId::Filter) {
        Some(AttributeValue::Link(link)) => link,
        Some(AttributeValue::None) | None => return Ok(None),
        Some(_) => return Err(()),
    };

    if let Some(cached) = cache.filters.get(&link) {
        return match cached {
            Some(filter) => Ok(Some(filter.clone())),
            None => Err(()),
        };
    }

    let result = convert_link(&link, element, state);
    cache.filters.insert(link, result.clone());
    match result {
        Some(filter) => Ok(Some(filter)),
        None => Err(()),
    }
}

fn convert_link(
    link: &str,
    element: &SvgElement,
    state: &converter::State,
) -> Option<Rc<Filter>> {
    let node = match element.document().element_by_id(link) {
        Some(node) => node,
        None => {
            log::warn!("Filter '{}' is not found.", link);
            return None;
        }
    };

    if !node.has_tag_name(EId::Filter) {
        log::warn!("'{}' cannot be used as a filter.", link);
        return None;
    }

    let units = convert_units(node, AId::FilterUnits, Units::ObjectBoundingBox);
    let primitive_units = convert_units(node, AId::PrimitiveUnits, Units::UserSpaceOnUse);

    let rect = Rect::new(
        resolve_number(node, AId::X, units, state, Length::new(-10.0, Unit::Percent)),
        resolve_number(node, AId::Y, units, state, Length::new(-10.0, Unit::Percent)),
        resolve_number(node, AId::Width, units, state, Length::new(120.0, Unit::Percent)),
        resolve_number(node, AId::Height, units, state, Length::new(120.0, Unit::Percent)),
    );
    let rect = match rect {
        Some(rect) => rect,
        None => {
            log::warn!("Filter '{}' has an invalid region. Skipped.", link);
            return None;
        }
    };

    let node_with_primitives = find_filter_with_primitives(node)?;
    let primitives = collect_primitives(node_with_primitives, state);
    let primitives = build_chain(primitives);
    if primitives.is_empty() {
        return None;
    }

    Some(Rc::new(Filter {
        id: node.element_id().to_string(),
        units,
        primitive_units,
        rect,
        primitives,
    }))
}

fn find_filter_with_primitives(node: Node) -> Option<Node> {
    for link in node.href_iter() {
        if !link.has_tag_name(EId::Filter) {
            log::warn!(
                "Filter '{}' cannot reference '{}' via 'href'.",
                node.element_id(),
                link.tag_name().map(|t| t.to_str()).unwrap_or("?")
            );
            return None;
        }

        if link.children().any(|n| n.is_element()) {
            return Some(link);
        }
    }

    None
}

struct FilterResults {
    names: HashSet<String>,
    idx: usize,
}

fn collect_primitives(filter: Node, state: &converter::State) -> Vec<Primitive> {
    let mut primitives: Vec<Primitive> = Vec::new();

    let mut results = FilterResults {
        names: HashSet::new(),
        idx: 1,
    };

    for child in filter.children() {
        let tag_name = match child.tag_name() {
            Some(v) => v,
            None => continue,
        };

        if !tag_name.is_filter_primitive() {
            log::warn!("'{}' is not a valid filter primitive. Skipped.", tag_name);
            continue;
        }

        let element = SvgElement::from_node(child);
        let kind = match tag_name {
            EId::FeGaussianBlur => convert_gaussian_blur(&element, &primitives),
            EId::FeOffset => convert_offset(&element, &primitives, state),
            EId::FeMerge => convert_merge(child, &primitives),
            EId::FeComposite => convert_composite(&element, &primitives),
            EId::FeSpecularLighting => convert_specular_lighting(&element, &primitives, state),
            tag_name => {
                log::warn!("'{}' is not implemented. It will pass its input through.", tag_name);
                FilterKind::Passthrough(FePassthrough {
                    input: resolve_input(&element, AId::In, &primitives),
                })
            }
        };

        let result = gen_result(child, &mut results);
        primitives.push(Primitive { result, kind });
    }

    primitives
}

fn convert_gaussian_blur(element: &SvgElement, primitives: &[Primitive]) -> FilterKind {
    let (std_dev_x, std_dev_y) = parse_std_dev(element);
    FilterKind::GaussianBlur(FeGaussianBlur {
        input: resolve_input(element, AId::In, primitives),
        std_dev_x,
        std_dev_y,
    })
}

// stdDeviation = "<number> [<number>]"
fn parse_std_dev(element: &SvgElement) -> (f64, f64) {
    let text = match element.attribute::<String>(AId::StdDeviation) {
        Some(v) => v,
        None => return (0.0, 0.0),
    };

    let mut s = svgtypes::Stream::from(text.as_str());
    let std_dev_x = s.parse_list_number().unwrap_or(0.0);
    let std_dev_y = s.parse_list_number().unwrap_or(std_dev_x);

    // 'A negative value or a value of zero disables the effect.'
    if std_dev_x < 0.0 || std_dev_y < 0.0 {
        (0.0, 0.0)
    } else {
        (std_dev_x, std_dev_y)
    }
}

fn convert_offset(
    element: &SvgElement,
    primitives: &[Primitive],
    state: &converter::State,
) -> FilterKind {
    FilterKind::Offset(FeOffset {
        input: resolve_input(element, AId::In, primitives),
        dx: element.convert_user_length(AId::Dx, state, Length::zero()),
        dy: element.convert_user_length(AId::Dy, state, Length::zero()),
    })
}

fn convert_merge(node: Node, primitives: &[Primitive]) -> FilterKind {
    let mut inputs = Vec::new();
    for child in node.children() {
        if child.has_tag_name(EId::FeMergeNode) {
            let element = SvgElement::from_node(child);
            inputs.push(resolve_input(&element, AId::In, primitives));
        }
    }

    FilterKind::Merge(FeMerge { inputs })
}

fn convert_composite(element: &SvgElement, primitives: &[Primitive]) -> FilterKind {
    let operator = match element
        .attribute::<String>(AId::Operator)
        .as_deref()
        .unwrap_or("over")
    {
        "in" => CompositeOperator::In,
        "out" => CompositeOperator::Out,
        "atop" => CompositeOperator::Atop,
        "xor" => CompositeOperator::Xor,
        "arithmetic" => CompositeOperator::Arithmetic {
            k1: element.attribute(AId::K1).unwrap_or(0.0),
            k2: element.attribute(AId::K2).unwrap_or(0.0),
            k3: element.attribute(AId::K3).unwrap_or(0.0),
            k4: element.attribute(AId::K4).unwrap_or(0.0),
        },
        _ => CompositeOperator::Over,
    };

    let input1 = resolve_input(element, AId::In, primitives);
    let input2 = resolve_input(element, AId::In2, primitives);
    FilterKind::Composite(FeComposite {
        operator,
        input1,
        input2,
    })
}

fn convert_specular_lighting(
    element: &SvgElement,
    primitives: &[Primitive],
    _state: &converter::State,
) -> FilterKind {
    let specular_exponent = element.attribute(AId::SpecularExponent).unwrap_or(1.0);
    // Unlike the SVG spec, out-of-range values are clamped, not ignored.
    let specular_exponent = crate::geom::f64_bound(1.0, specular_exponent, 128.0);

    let lighting_color = match element.attribute::<AttributeValue>(AId::LightingColor) {
        Some(AttributeValue::CurrentColor) => element
            .find_attribute(AId::Color)
            .unwrap_or_else(svgtypes::Color::black),
        Some(AttributeValue::Color(c)) => c,
        _ => svgtypes::Color::new_rgb(255, 255, 255),
    };
    let lighting_color = Color::new_rgb(lighting_color.red, lighting_color.green, lighting_color.blue);

    FilterKind::SpecularLighting(FeSpecularLighting {
        input: resolve_input(element, AId::In, primitives),
        surface_scale: element.attribute(AId::SurfaceScale).unwrap_or(1.0),
        specular_constant: element.attribute(AId::SpecularConstant).unwrap_or(1.0),
        specular_exponent,
        lighting_color,
        light_source: convert_light_source(element.node()),
    })
}

fn convert_light_source(node: Node) -> Option<LightSource> {
    let light = node.children().find(|n| {
        matches!(
            n.tag_name(),
            Some(EId::FeDistantLight) | Some(EId::FePointLight) | Some(EId::FeSpotLight)
        )
    })?;

    let element = SvgElement::from_node(light);
    match light.tag_name()? {
        EId::FeDistantLight => Some(LightSource::Distant {
            azimuth: element.attribute(AId::Azimuth).unwrap_or(0.0),
            elevation: element.attribute(AId::Elevation).unwrap_or(0.0),
        }),
        EId::FePointLight => Some(LightSource::Point {
            x: element.attribute(AId::X).unwrap_or(0.0),
            y: element.attribute(AId::Y).unwrap_or(0.0),
            z: element.attribute(AId::Z).unwrap_or(0.0),
        }),
        _ => {
            log::warn!("Spot lights are not supported.");
            None
        }
    }
}

// Default linkage: a primitive with no explicit input consumes the
// previous primitive's output, or SourceGraphic if it is the first one.
fn resolve_input(element: &SvgElement, aid: AId, primitives: &[Primitive]) -> FilterInput {
    match element.attribute::<String>(aid) {
        Some(s) => match s.as_str() {
            "SourceGraphic" => FilterInput::SourceGraphic,
            "SourceAlpha" => FilterInput::SourceAlpha,
            "BackgroundImage" | "BackgroundAlpha" | "FillPaint" | "StrokePaint" => {
                log::warn!("'{}' filter input is not supported and will be treated as 'SourceGraphic'.", s);
                FilterInput::SourceGraphic
            }
            _ => FilterInput::Reference(s),
        },
        None => match primitives.last() {
            Some(prev) => FilterInput::Reference(prev.result.clone()),
            None => FilterInput::SourceGraphic,
        },
    }
}

fn gen_result(node: Node, results: &mut FilterResults) -> String {
    match node.attribute_value(AId::Result) {
        Some(AttributeValue::String(s)) => {
            // Remember the authored result.
            results.names.insert(s.clone());
            results.idx += 1;

            s.clone()
        }
        _ => {
            // Generate an unique name for `result`.
            loop {
                let name = format!("result{}", results.idx);
                results.idx += 1;

                if !results.names.contains(&name) {
                    return name;
                }
            }
        }
    }
}

/// Collapses collected primitives into the minimal ordered execution
/// chain.
///
/// The last primitive is the filter result. Backward reachability from
/// it drops dead branches and orders producers before consumers even
/// when the document declares them out of order. An input that no
/// primitive produces is reported and left unconnected.
pub(crate) fn build_chain(primitives: Vec<Primitive>) -> Vec<Primitive> {
    if primitives.is_empty() {
        return primitives;
    }

    let root = primitives.len() - 1;
    let mut queued = vec![false; primitives.len()];
    queued[root] = true;

    let mut queue = VecDeque::new();
    queue.push_back(root);

    let mut chain: VecDeque<usize> = VecDeque::new();
    let mut provided: HashSet<String> = HashSet::new();

    while let Some(idx) = queue.pop_front() {
        chain.push_front(idx);
        provided.insert(primitives[idx].result.clone());

        for input in primitives[idx].kind.inputs() {
            let name = match input {
                FilterInput::Reference(ref name) => name,
                _ => continue,
            };

            if provided.contains(name) {
                continue;
            }

            // The most recent producer wins when result names repeat.
            match (0..primitives.len())
                .rev()
                .find(|&j| primitives[j].result == *name)
            {
                Some(j) => {
                    if !queued[j] {
                        queued[j] = true;
                        queue.push_back(j);
                    }
                }
                None => {
                    log::warn!(
                        "Filter input '{}' is not produced by any primitive. \
                         It will be treated as unconnected.",
                        name
                    );
                }
            }
        }
    }

    let mut taken: Vec<Option<Primitive>> = primitives.into_iter().map(Some).collect();
    chain
        .into_iter()
        .map(|idx| taken[idx].take().unwrap())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blur(input: FilterInput) -> FilterKind {
        FilterKind::GaussianBlur(FeGaussianBlur {
            input,
            std_dev_x: 1.0,
            std_dev_y: 1.0,
        })
    }

    fn fe(result: &str, kind: FilterKind) -> Primitive {
        Primitive {
            result: result.to_string(),
            kind,
        }
    }

    #[test]
    fn linear_chain() {
        // P1 -> P2 -> P3 via default linkage.
        let primitives = vec![
            fe("result1", blur(FilterInput::SourceGraphic)),
            fe("result2", blur(FilterInput::Reference("result1".to_string()))),
            fe("result3", blur(FilterInput::Reference("result2".to_string()))),
        ];

        let chain = build_chain(primitives);
        let names: Vec<_> = chain.iter().map(|p| p.result.as_str()).collect();
        assert_eq!(names, ["result1", "result2", "result3"]);
    }

    #[test]
    fn dead_branch_is_dropped() {
        // P0 is never consumed.
        let primitives = vec![
            fe("dead", blur(FilterInput::SourceGraphic)),
            fe("result1", blur(FilterInput::SourceGraphic)),
            fe("result2", blur(FilterInput::Reference("result1".to_string()))),
        ];

        let chain = build_chain(primitives);
        let names: Vec<_> = chain.iter().map(|p| p.result.as_str()).collect();
        assert_eq!(names, ["result1", "result2"]);
    }

    #[test]
    fn out_of_order_declaration() {
        // The consumer is declared before the producer.
        let primitives = vec![
            fe("blurred", blur(FilterInput::Reference("shifted".to_string()))),
            fe("shifted", blur(FilterInput::SourceGraphic)),
            fe(
                "result",
                FilterKind::Merge(FeMerge {
                    inputs: vec![FilterInput::Reference("blurred".to_string())],
                }),
            ),
        ];

        let chain = build_chain(primitives);
        let names: Vec<_> = chain.iter().map(|p| p.result.as_str()).collect();
        assert_eq!(names, ["shifted", "blurred", "result"]);
    }

    #[test]
    fn unresolved_input() {
        // Must not panic and must keep the chain.
        let primitives = vec![fe(
            "result1",
            blur(FilterInput::Reference("missing".to_string())),
        )];

        let chain = build_chain(primitives);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn merge_consumes_both() {
        let primitives = vec![
            fe("a", blur(FilterInput::SourceGraphic)),
            fe("b", blur(FilterInput::SourceAlpha)),
            fe(
                "m",
                FilterKind::Merge(FeMerge {
                    inputs: vec![
                        FilterInput::Reference("a".to_string()),
                        FilterInput::Reference("b".to_string()),
                    ],
                }),
            ),
        ];

        let chain = build_chain(primitives);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.last().unwrap().result, "m");
    }
}
