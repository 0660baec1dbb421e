// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use crate::converter;
use crate::element::SvgElement;
use crate::geom::Transform;
use crate::paint_server::convert_units;
use crate::pathdata::SharedPathData;
use crate::shapes;
use crate::style::FillRule;
use crate::svgtree::{AId, EId, Node};
use crate::Units;

/// A resolved clip path.
#[derive(Clone, Debug)]
pub struct ClipPath {
    /// Element's ID. Can't be empty.
    pub id: String,

    /// Coordinate system units.
    ///
    /// For `ObjectBoundingBox` the geometry is kept in unit fractions.
    pub units: Units,

    /// Clip path transform.
    pub transform: Transform,

    /// A clip applied to this clip path itself.
    pub clip_path: Option<Rc<ClipPath>>,

    /// The clip geometry.
    pub shapes: Vec<ClipShape>,
}

/// One shape of a clip path.
#[derive(Clone, Debug)]
pub struct ClipShape {
    /// Shape geometry.
    pub data: SharedPathData,

    /// The clip rule, from `clip-rule`.
    pub rule: FillRule,

    /// The shape's own transform.
    pub transform: Transform,
}

/// Resolves a `clipPath` element. Memoized by id.
///
/// Returns `None` for an invalid clip; the caller is expected to skip
/// the clipped element entirely.
pub(crate) fn convert(
    node: Node,
    state: &converter::State,
    cache: &mut converter::Cache,
) -> Option<Rc<ClipPath>> {
    if !node.has_tag_name(EId::ClipPath) {
        log::warn!("'{}' cannot be used as a clip path.", node.element_id());
        return None;
    }

    let id = node.element_id().to_string();
    if let Some(cached) = cache.clip_paths.get(&id) {
        return cached.clone();
    }

    let result = convert_impl(node, state, cache);
    cache.clip_paths.insert(id, result.clone());
    result
}

fn convert_impl(
    node: Node,
    state: &converter::State,
    cache: &mut converter::Cache,
) -> Option<Rc<ClipPath>> {
    // A clip path can be clipped itself. Self-references were already
    // replaced with `none` during parsing.
    let self_clip = match node.attribute_value(AId::ClipPath) {
        Some(crate::svgtree::AttributeValue::Link(link)) => {
            let linked = node.document().element_by_id(link)?;
            Some(convert(linked, state, cache)?)
        }
        _ => None,
    };

    let element = SvgElement::from_node(node);

    let mut clip_shapes = Vec::new();
    for child in element.children() {
        let tag_name = match child.tag_name() {
            Some(v) => v,
            None => continue,
        };

        // `use` inside a clip path resolves through the usual
        // shadow mechanism.
        let (shape_el, geometry_el) = if tag_name == EId::Use {
            let linked = match child.attribute::<crate::svgtree::AttributeValue>(AId::Href) {
                Some(crate::svgtree::AttributeValue::Link(link)) => {
                    match node.document().element_by_id(&link) {
                        Some(v) => v,
                        None => continue,
                    }
                }
                _ => continue,
            };

            if !linked.tag_name().map(|t| t.is_graphic()).unwrap_or(false) {
                continue;
            }

            let shadow = child.create_reference_shadow(linked);
            (child.clone(), shadow)
        } else {
            if !tag_name.is_graphic() {
                log::warn!("'{}' is not a valid 'clip-path' child.", tag_name);
                continue;
            }

            (child.clone(), child.clone())
        };

        if !geometry_el.is_visible_element() {
            continue;
        }

        let data = match shapes::convert(&geometry_el, state) {
            Some(v) => v,
            None => continue,
        };

        let mut transform: Transform = shape_el.attribute(AId::Transform).unwrap_or_default();
        if tag_name == EId::Use {
            // The `use` positional offset composes after its transform.
            let x = shape_el.convert_user_length(AId::X, state, crate::units::Length::zero());
            let y = shape_el.convert_user_length(AId::Y, state, crate::units::Length::zero());
            transform.translate(x, y);
        }

        clip_shapes.push(ClipShape {
            data,
            rule: geometry_el
                .find_attribute(AId::ClipRule)
                .unwrap_or_default(),
            transform,
        });
    }

    if clip_shapes.is_empty() {
        return None;
    }

    Some(Rc::new(ClipPath {
        id: node.element_id().to_string(),
        units: convert_units(node, AId::ClipPathUnits, Units::UserSpaceOnUse),
        transform: element.attribute(AId::Transform).unwrap_or_default(),
        clip_path: self_clip,
        shapes: clip_shapes,
    }))
}
