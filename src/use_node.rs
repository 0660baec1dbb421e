// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use crate::clippath::{ClipPath, ClipShape};
use crate::converter;
use crate::element::SvgElement;
use crate::geom::{view_box_to_transform, Rect, Size, Transform};
use crate::pathdata::PathData;
use crate::style::FillRule;
use crate::svgtree::{AId, AttributeValue, EId};
use crate::tree::{self, NodeExt};
use crate::units::{Length, Unit};
use crate::Units;

// Expands a `use` element through a reference shadow.
//
// The referenced subtree is converted against the shadow, so the
// shared definition is never mutated and each `use` can resolve
// differently. The positional x/y offset composes after the `use`
// element's own transform.
pub(crate) fn convert(
    element: &SvgElement,
    state: &converter::State,
    cache: &mut converter::Cache,
    parent: &mut tree::Node,
) -> Option<()> {
    let link = match element.attribute::<AttributeValue>(AId::Href) {
        Some(AttributeValue::Link(link)) => element.document().element_by_id(&link)?,
        _ => return None,
    };

    if state.use_stack.contains(&link.id()) {
        log::warn!(
            "Recursive 'use' detected. '{}' will be skipped.",
            element.element_id()
        );
        return None;
    }

    // We don't support 'use' elements linked to 'svg' element.
    if link.has_tag_name(EId::Svg) {
        log::warn!("'use' elements linked to an 'svg' element are not supported. Skipped.");
        return None;
    }

    let mut state = state.clone();
    state.use_stack.push(element.node().id());
    state.use_stack.push(link.id());

    // The `use` element's own clip and filter stay on the `use`:
    // they are composed with, not overridden by, the definition's.
    let clip_path = match converter::resolve_clip(element, &state, cache) {
        Ok(v) => v,
        Err(()) => return None,
    };
    let filter = match crate::filter::convert(element, &state, cache) {
        Ok(v) => v,
        Err(()) => return None,
    };

    let shadow = element.create_reference_shadow(link);

    let mut ts: Transform = element.attribute(AId::Transform).unwrap_or_default();
    let x = element.convert_user_length(AId::X, &state, Length::zero());
    let y = element.convert_user_length(AId::Y, &state, Length::zero());

    if link.has_tag_name(EId::Symbol) {
        // A `symbol` establishes a viewport: the x/y offset and the
        // viewBox transform apply inside, the viewport clip outside.
        let (w, h) = use_node_size(element, &state);

        let mut inner_ts = Transform::new_translate(x, y);
        if let Some(vb) = shadow.get_viewbox() {
            if let Some(size) = Size::new(w, h) {
                let aspect = shadow
                    .attribute(AId::PreserveAspectRatio)
                    .unwrap_or_default();
                inner_ts.append(&view_box_to_transform(vb, aspect, size));
            }
        }

        let g = parent.append_kind(tree::NodeKind::Group(tree::Group {
            id: use_id(element),
            transform: ts,
            clip_path,
            filter,
        }));

        let mut viewport = g.clone();
        if let Some(viewport_clip) = symbol_clip(&shadow, x, y, w, h, cache) {
            viewport = g.append_kind(tree::NodeKind::Group(tree::Group {
                clip_path: Some(viewport_clip),
                ..tree::Group::default()
            }));
        }

        let mut inner = viewport.append_kind(tree::NodeKind::Group(tree::Group {
            transform: inner_ts,
            ..tree::Group::default()
        }));

        for child in shadow.children() {
            converter::convert_element(&child, &state, cache, &mut inner);
        }
    } else {
        // The positional offset is applied after the subtree is built,
        // as the innermost part of the group transform. Removing x/y
        // leaves the geometry unmoved relative to the group's own
        // transform.
        ts.translate(x, y);

        let mut g = parent.append_kind(tree::NodeKind::Group(tree::Group {
            id: use_id(element),
            transform: ts,
            clip_path,
            filter,
        }));

        converter::convert_element(&shadow, &state, cache, &mut g);
    }

    Some(())
}

fn use_id(element: &SvgElement) -> String {
    if element.node().has_authored_id() && !element.is_shadow() {
        element.element_id().to_string()
    } else {
        String::new()
    }
}

fn use_node_size(element: &SvgElement, state: &converter::State) -> (f64, f64) {
    let def = Length::new(100.0, Unit::Percent);
    let w = element.convert_user_length(AId::Width, state, def);
    let h = element.convert_user_length(AId::Height, state, def);
    (w, h)
}

fn symbol_clip(
    symbol: &SvgElement,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    cache: &mut converter::Cache,
) -> Option<Rc<ClipPath>> {
    // No need to clip elements with overflow:visible.
    if matches!(
        symbol.attribute::<String>(AId::Overflow).as_deref(),
        Some("visible") | Some("auto")
    ) {
        return None;
    }

    let clip_rect = Rect::new(x, y, w, h)?;

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
}
