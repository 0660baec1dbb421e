// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The conversion orchestrator.
//!
//! Walks the element tree top-down and assembles the final shape tree,
//! delegating to the shape, style, paint-server, clip, filter and
//! marker resolvers.

use std::collections::HashMap;
use std::rc::Rc;

use crate::clippath::{self, ClipPath};
use crate::element::SvgElement;
use crate::filter::{self, Filter};
use crate::geom::{view_box_to_transform, Rect, Size, Transform, ViewBox};
use crate::paint_server::ServerOrColor;
use crate::style::{self, Paint};
use crate::svgtree::{self, AId, AttributeValue, EId, NodeId};
use crate::tree::{self, NodeExt, NodeKind};
use crate::units::{Length, Unit};
use crate::{marker, shapes, use_node};
use crate::{Error, Options, Tree};

/// The resolution context.
///
/// Cheap to clone; cloned at every viewport or reference boundary.
#[derive(Clone)]
pub struct State<'a> {
    /// The size of the root SVG element.
    pub(crate) size: Size,
    /// A viewBox of the parent SVG element.
    pub(crate) view_box: Rect,
    /// The shape paints reachable via `context-fill`/`context-stroke`.
    pub(crate) context_fill: Option<Paint>,
    pub(crate) context_stroke: Option<Paint>,
    /// Guards against reference loops.
    pub(crate) use_stack: Vec<NodeId>,
    pub(crate) marker_stack: Vec<NodeId>,
    pub(crate) opt: &'a Options,
}

/// Per-conversion memoization caches.
///
/// Reference resolution results, keyed by element id. Every key is
/// written once and never invalidated during a conversion. Concurrent
/// conversions must use separate instances.
#[derive(Default)]
pub struct Cache {
    pub(crate) paint_servers: HashMap<String, Option<ServerOrColor>>,
    pub(crate) clip_paths: HashMap<String, Option<Rc<ClipPath>>>,
    pub(crate) filters: HashMap<String, Option<Rc<Filter>>>,
    pub(crate) markers: HashMap<String, Option<NodeId>>,

    clip_path_index: usize,
}

impl Cache {
    pub(crate) fn gen_clip_path_id(&mut self) -> String {
        // The `__` prefix cannot collide with authored ids:
        // generated sentinels use the same namespace.
        self.clip_path_index += 1;
        format!("__clip{}", self.clip_path_index)
    }
}

/// Converts a parsed document into a shape tree.
pub(crate) fn convert_doc(doc: &svgtree::Document, opt: &Options) -> Result<Tree, Error> {
    let svg = doc.root_element();
    let element = SvgElement::from_node(svg);
    let size = resolve_svg_size(&element, opt)?;
    let view_box = ViewBox {
        rect: element
            .get_viewbox()
            .unwrap_or_else(|| size.to_rect(0.0, 0.0)),
        aspect: element
            .attribute(AId::PreserveAspectRatio)
            .unwrap_or_default(),
    };

    let tree = Tree {
        size,
        view_box,
        root: tree::Node::new(NodeKind::Group(tree::Group::default())),
    };

    if !element.is_visible_element() {
        return Ok(tree);
    }

    let state = State {
        size,
        view_box: view_box.rect,
        context_fill: None,
        context_stroke: None,
        use_stack: Vec::new(),
        marker_stack: Vec::new(),
        opt,
    };

    let mut cache = Cache::default();
    let mut root = tree.root.clone();
    convert_children(&element, &state, &mut cache, &mut root);

    remove_empty_groups(&tree);
    dissolve_redundant_groups(&tree);

    Ok(tree)
}

fn resolve_svg_size(element: &SvgElement, opt: &Options) -> Result<Size, Error> {
    let mut state = State {
        size: opt.default_size,
        view_box: opt.default_size.to_rect(0.0, 0.0),
        context_fill: None,
        context_stroke: None,
        use_stack: Vec::new(),
        marker_stack: Vec::new(),
        opt,
    };

    let def = Length::new(100.0, Unit::Percent);
    let width: Length = element.attribute(AId::Width).unwrap_or(def);
    let height: Length = element.attribute(AId::Height).unwrap_or(def);

    let view_box = element.get_viewbox();

    let size = if let Some(vbox) = view_box {
        state.view_box = vbox;

        let w = if width.unit == Unit::Percent {
            vbox.width() * (width.number / 100.0)
        } else {
            element.convert_user_length(AId::Width, &state, def)
        };

        let h = if height.unit == Unit::Percent {
            vbox.height() * (height.number / 100.0)
        } else {
            element.convert_user_length(AId::Height, &state, def)
        };

        Size::new(w, h)
    } else {
        // Percentages without a viewBox resolve against the
        // fallback size.
        let w = if width.unit == Unit::Percent {
            (width.number / 100.0) * state.opt.default_size.width()
        } else {
            element.convert_user_length(AId::Width, &state, def)
        };

        let h = if height.unit == Unit::Percent {
            (height.number / 100.0) * state.opt.default_size.height()
        } else {
            element.convert_user_length(AId::Height, &state, def)
        };

        Size::new(w, h)
    };

    size.ok_or(Error::InvalidSize)
}

pub(crate) fn convert_children(
    parent_element: &SvgElement,
    state: &State,
    cache: &mut Cache,
    parent: &mut tree::Node,
) {
    for element in parent_element.children() {
        convert_element(&element, state, cache, parent);
    }
}

pub(crate) fn convert_element(
    element: &SvgElement,
    state: &State,
    cache: &mut Cache,
    parent: &mut tree::Node,
) -> Option<()> {
    let tag_name = element.tag_name()?;

    if !tag_name.is_graphic() && !matches!(tag_name, EId::G | EId::Svg) {
        return None;
    }

    if !element.is_visible_element() {
        return None;
    }

    if tag_name == EId::Use {
        use_node::convert(element, state, cache, parent);
        return None;
    }

    match tag_name {
        EId::Rect
        | EId::Circle
        | EId::Ellipse
        | EId::Line
        | EId::Polyline
        | EId::Polygon
        | EId::Path => {
            convert_shape(element, state, cache, parent);
        }
        EId::G => {
            let mut parent = match convert_group(element, state, cache, parent) {
                GroupKind::Create(g) => g,
                GroupKind::Skip => parent.clone(),
                GroupKind::Ignore => return None,
            };

            convert_children(element, state, cache, &mut parent);
        }
        EId::Svg => {
            if element.parent_element().is_some() {
                convert_nested_svg(element, state, cache, parent);
            } else {
                // The root `svg` itself.
                convert_children(element, state, cache, parent);
            }
        }
        EId::Text => {
            convert_text(element, state, cache, parent);
        }
        _ => {}
    }

    Some(())
}

pub(crate) enum GroupKind {
    /// A new group was created.
    Create(tree::Node),
    /// The group is not required; convert into the current parent.
    Skip,
    /// The element and all its children must be skipped.
    Ignore,
}

pub(crate) fn convert_group(
    element: &SvgElement,
    state: &State,
    cache: &mut Cache,
    parent: &mut tree::Node,
) -> GroupKind {
    let clip_path = match resolve_clip(element, state, cache) {
        Ok(v) => v,
        // A `clip-path` linked to an invalid element. The whole
        // element is skipped.
        Err(()) => return GroupKind::Ignore,
    };

    let filter = match filter::convert(element, state, cache) {
        Ok(v) => v,
        // Unlike `clip-path`, an invalid `filter` link also drops
        // the element. This is mostly an undefined behavior,
        // but it's what browsers do.
        Err(()) => return GroupKind::Ignore,
    };

    let transform: Transform = element.attribute(AId::Transform).unwrap_or_default();

    let required = clip_path.is_some() || filter.is_some() || !transform.is_default();

    if required {
        let g = parent.append_kind(NodeKind::Group(tree::Group {
            id: authored_id(element),
            transform,
            clip_path,
            filter,
        }));

        GroupKind::Create(g)
    } else {
        GroupKind::Skip
    }
}

fn authored_id(element: &SvgElement) -> String {
    if element.node().has_authored_id() && !element.is_shadow() {
        element.element_id().to_string()
    } else {
        String::new()
    }
}

pub(crate) fn resolve_clip(
    element: &SvgElement,
    state: &State,
    cache: &mut Cache,
) -> Result<Option<Rc<ClipPath>>, ()> {
    match element.attribute::<AttributeValue>(AId::ClipPath) {
        Some(AttributeValue::Link(link)) => match element.document().element_by_id(&link) {
            Some(node) => match clippath::convert(node, state, cache) {
                Some(clip) => Ok(Some(clip)),
                None => Err(()),
            },
            None => {
                log::warn!("Clip path '{}' is not found.", link);
                Err(())
            }
        },
        _ => Ok(None),
    }
}

fn convert_shape(
    element: &SvgElement,
    state: &State,
    cache: &mut Cache,
    parent: &mut tree::Node,
) -> Option<()> {
    let path = shapes::convert(element, state)?;
    if path.len() < 2 {
        return None;
    }

    let visible = !matches!(
        element
            .find_attribute::<String>(AId::Visibility)
            .as_deref(),
        Some("hidden") | Some("collapse")
    );
    if !visible {
        return None;
    }

    let bbox = path.bbox();
    let fill = style::resolve_fill(element, bbox, state, cache);
    let stroke = style::resolve_stroke(element, bbox, state, cache);

    // A path without a fill and a stroke is invisible.
    if fill.is_none() && stroke.is_none() {
        return None;
    }

    let clip_path = match resolve_clip(element, state, cache) {
        Ok(v) => v,
        Err(()) => return None,
    };

    let filter = match filter::convert(element, state, cache) {
        Ok(v) => v,
        Err(()) => return None,
    };

    let transform: Transform = element.attribute(AId::Transform).unwrap_or_default();

    // A filtered shape is wrapped into a group, since the filter
    // applies to the shape's coordinate system.
    let (mut parent, shape_transform) = match filter {
        Some(filter) => {
            let g = parent.append_kind(NodeKind::Group(tree::Group {
                id: String::new(),
                transform,
                clip_path: None,
                filter: Some(filter),
            }));
            (g, Transform::default())
        }
        None => (parent.clone(), transform),
    };

    let has_markers = matches!(
        element.tag_name(),
        Some(EId::Path) | Some(EId::Polyline) | Some(EId::Polygon) | Some(EId::Line)
    ) && marker::is_valid(element);

    parent.append_kind(NodeKind::Shape(tree::Shape {
        id: authored_id(element),
        transform: shape_transform,
        data: path.clone(),
        fill: fill.clone(),
        stroke: stroke.clone(),
        clip_path,
    }));

    if has_markers {
        // Marker content can reach the shape paints via
        // `context-fill` and `context-stroke`.
        let mut marker_state = state.clone();
        marker_state.context_fill = fill.map(|f| f.paint);
        marker_state.context_stroke = stroke.map(|s| s.paint);

        let mut markers_group = parent.append_kind(NodeKind::Group(tree::Group {
            transform: shape_transform,
            ..tree::Group::default()
        }));

        marker::convert(element, &path, &marker_state, cache, &mut markers_group);

        if !markers_group.has_children() {
            markers_group.detach();
        }
    }

    Some(())
}

// A nested `svg` establishes a new viewport: a positional offset,
// an optional viewBox transform and a viewport clip.
fn convert_nested_svg(
    element: &SvgElement,
    state: &State,
    cache: &mut Cache,
    parent: &mut tree::Node,
) {
    let transform: Transform = element.attribute(AId::Transform).unwrap_or_default();

    let x = element.convert_user_length(AId::X, state, Length::zero());
    let y = element.convert_user_length(AId::Y, state, Length::zero());
    let def = Length::new(100.0, Unit::Percent);
    let w = element.convert_user_length(AId::Width, state, def);
    let h = element.convert_user_length(AId::Height, state, def);

    let size = match Size::new(w, h) {
        Some(v) => v,
        None => {
            log::warn!(
                "Nested SVG '{}' has an invalid size. Skipped.",
                element.element_id()
            );
            return;
        }
    };

    let mut new_ts = Transform::new_translate(x, y);
    let mut new_state = state.clone();
    if let Some(vb) = element.get_viewbox() {
        let aspect = element
            .attribute(AId::PreserveAspectRatio)
            .unwrap_or_default();
        new_ts.append(&view_box_to_transform(vb, aspect, size));
        new_state.view_box = vb;
    } else {
        new_state.view_box = size.to_rect(0.0, 0.0);
    }

    let clip_path = if matches!(
        element.attribute::<String>(AId::Overflow).as_deref(),
        Some("visible") | Some("auto")
    ) {
        None
    } else {
        Rect::new(x, y, w, h).map(|clip_rect| {
            Rc::new(ClipPath {
                id: cache.gen_clip_path_id(),
                units: crate::Units::UserSpaceOnUse,
                transform: Transform::default(),
                clip_path: None,
                shapes: vec![crate::clippath::ClipShape {
                    data: Rc::new(crate::pathdata::PathData::from_rect(clip_rect)),
                    rule: crate::style::FillRule::NonZero,
                    transform: Transform::default(),
                }],
            })
        })
    };

    let g = parent.append_kind(NodeKind::Group(tree::Group {
        id: authored_id(element),
        transform,
        clip_path,
        filter: None,
    }));

    let mut inner = g.append_kind(NodeKind::Group(tree::Group {
        transform: new_ts,
        ..tree::Group::default()
    }));

    convert_children(element, &new_state, cache, &mut inner);
}

// Text resolution is delegated to the external shaping collaborator.
// Without one installed, text elements are skipped.
fn convert_text(
    element: &SvgElement,
    state: &State,
    cache: &mut Cache,
    parent: &mut tree::Node,
) -> Option<()> {
    let shaper = match state.opt.shaper {
        Some(ref v) => v.clone(),
        None => {
            log::warn!("Text element '{}' requires an outline shaper. Skipped.", element.element_id());
            return None;
        }
    };

    let text = element.node().text();
    if text.is_empty() {
        return None;
    }

    let font = crate::options::FontDescription {
        family: element
            .find_attribute(AId::FontFamily)
            .unwrap_or_else(|| state.opt.font_family.clone()),
        size: crate::units::resolve_font_size(element, state),
        italic: element.find_attribute::<String>(AId::FontStyle).as_deref() == Some("italic"),
        weight: resolve_font_weight(element),
    };

    let mut path = shaper.outline(&text, &font)?;
    if path.len() < 2 {
        return None;
    }

    let x = resolve_first_coord(element, AId::X, state);
    let y = resolve_first_coord(element, AId::Y, state);
    path.transform(Transform::new_translate(x, y));
    let path = Rc::new(path);

    let bbox = path.bbox();
    let fill = style::resolve_fill(element, bbox, state, cache);
    let stroke = style::resolve_stroke(element, bbox, state, cache);
    if fill.is_none() && stroke.is_none() {
        return None;
    }

    parent.append_kind(NodeKind::Shape(tree::Shape {
        id: authored_id(element),
        transform: element.attribute(AId::Transform).unwrap_or_default(),
        data: path,
        fill,
        stroke,
        clip_path: None,
    }));

    Some(())
}

// `text` x/y are coordinate lists; only the first one matters here.
fn resolve_first_coord(element: &SvgElement, aid: AId, state: &State) -> f64 {
    let text = match element.attribute::<String>(aid) {
        Some(v) => v,
        None => return 0.0,
    };

    match text
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|t| !t.is_empty())
        .and_then(|t| t.parse::<Length>().ok())
    {
        Some(length) => {
            crate::units::convert_length(length, element, aid, crate::Units::UserSpaceOnUse, state)
        }
        None => 0.0,
    }
}

fn resolve_font_weight(element: &SvgElement) -> u16 {
    match element
        .find_attribute::<String>(AId::FontWeight)
        .as_deref()
    {
        Some("bold") | Some("bolder") => 700,
        Some("lighter") => 300,
        Some(text) => text.parse().unwrap_or(400),
        None => 400,
    }
}

fn remove_empty_groups(tree: &Tree) {
    fn rm(parent: tree::Node) -> bool {
        let mut changed = false;

        let mut curr_node = parent.first_child();
        while let Some(node) = curr_node {
            curr_node = node.next_sibling();

            let is_g = if let NodeKind::Group(ref g) = *node.borrow() {
                // A filter can be set on an empty group,
                // which than filters an empty canvas.
                g.filter.is_none()
            } else {
                false
            };

            if is_g && !node.has_children() {
                node.detach();
                changed = true;
            } else if rm(node) {
                changed = true;
            }
        }

        changed
    }

    while rm(tree.root.clone()) {}
}

// Dissolves groups which no longer change rendering: no clip, no
// filter, no id. A transform is not a reason to keep a group alive,
// it composes before the children's own transforms.
fn dissolve_redundant_groups(tree: &Tree) {
    fn ungroup(parent: tree::Node) -> bool {
        let mut changed = false;

        let mut curr_node = parent.first_child();
        while let Some(node) = curr_node {
            curr_node = node.next_sibling();

            let (is_dissolvable, ts) = if let NodeKind::Group(ref g) = *node.borrow() {
                (
                    g.clip_path.is_none() && g.filter.is_none() && g.id.is_empty(),
                    g.transform,
                )
            } else {
                (false, Transform::default())
            };

            if is_dissolvable {
                let mut curr_child = node.last_child();
                while let Some(child) = curr_child {
                    curr_child = child.previous_sibling();

                    // The ancestor transform composes before
                    // the child's own.
                    child.prepend_transform(ts);

                    child.detach();
                    node.insert_after(child.clone());
                }

                node.detach();
                changed = true;
            } else if ungroup(node) {
                changed = true;
            }
        }

        changed
    }

    while ungroup(tree.root.clone()) {}
}
