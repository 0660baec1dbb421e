// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use log::warn;

use crate::css;
use crate::geom::Transform;
use crate::pathdata::{PathData, PathSegment};
use crate::units::Length;
use crate::{Error, Opacity, Options};

use super::{AId, Attribute, AttributeValue, Document, EId, Node, NodeData, NodeId, NodeKind};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NAMESPACE_NS: &str = "http://www.w3.org/XML/1998/namespace";

impl Document {
    /// Parses a `Document` from a string.
    pub fn parse(text: &str, opt: &Options) -> Result<Document, Error> {
        parse(text, opt)
    }

    fn append(&mut self, parent_id: NodeId, kind: NodeKind) -> NodeId {
        let new_child_id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent: Some(parent_id),
            prev_sibling: None,
            next_sibling: None,
            children: None,
            kind,
        });

        let last_child_id = self.nodes[parent_id.0].children.map(|(_, id)| id);
        self.nodes[new_child_id.0].prev_sibling = last_child_id;

        if let Some(id) = last_child_id {
            self.nodes[id.0].next_sibling = Some(new_child_id);
        }

        self.nodes[parent_id.0].children =
            Some(if let Some((first_child_id, _)) = self.nodes[parent_id.0].children {
                (first_child_id, new_child_id)
            } else {
                (new_child_id, new_child_id)
            });

        new_child_id
    }
}

fn parse(text: &str, opt: &Options) -> Result<Document, Error> {
    let xml = roxmltree::Document::parse(text)?;

    let mut doc = Document {
        nodes: Vec::new(),
        attrs: Vec::new(),
        links: HashMap::new(),
        inherited: Default::default(),
        opacities: Default::default(),
    };

    // Add a root node.
    doc.nodes.push(NodeData {
        parent: None,
        prev_sibling: None,
        next_sibling: None,
        children: None,
        kind: NodeKind::Root,
    });

    let root_id = doc.root().id();
    parse_xml_node_children(xml.root(), root_id, opt, &mut doc);

    // Check that the root element is `svg`.
    match doc.root().first_element_child() {
        Some(child) => {
            if child.tag_name() != Some(EId::Svg) {
                return Err(Error::NoRootNode);
            }
        }
        None => return Err(Error::NoRootNode),
    }

    resolve_element_ids(&mut doc);

    let style_sheet = resolve_css(&xml);
    apply_style(&style_sheet, &mut doc);

    fix_recursive_links(EId::ClipPath, AId::ClipPath, &mut doc);
    fix_recursive_links(EId::Filter, AId::Filter, &mut doc);

    Ok(doc)
}

fn parse_tag_name(node: roxmltree::Node, opt: &Options) -> Option<EId> {
    if !node.is_element() {
        return None;
    }

    match node.tag_name().namespace() {
        Some(SVG_NS) => {}
        // Namespace strictness is a toggle. Lenient by default.
        None if !opt.strict_namespaces => {}
        _ => return None,
    }

    EId::from_str(node.tag_name().name())
}

fn parse_xml_node_children(
    parent: roxmltree::Node,
    parent_id: NodeId,
    opt: &Options,
    doc: &mut Document,
) {
    for node in parent.children() {
        parse_xml_node(node, parent_id, opt, doc);
    }
}

fn parse_xml_node(node: roxmltree::Node, parent_id: NodeId, opt: &Options, doc: &mut Document) {
    let mut tag_name = match parse_tag_name(node, opt) {
        Some(id) => id,
        None => return,
    };

    // The style sheet is collected separately.
    if tag_name == EId::Style {
        return;
    }

    // Treat links as groups.
    if tag_name == EId::A {
        tag_name = EId::G;
    }

    let node_id = parse_svg_element(node, parent_id, tag_name, doc);
    if tag_name == EId::Text {
        parse_svg_text_element(node, node_id, doc);
    } else {
        parse_xml_node_children(node, node_id, opt, doc);
    }
}

fn parse_svg_element(
    xml_node: roxmltree::Node,
    parent_id: NodeId,
    tag_name: EId,
    doc: &mut Document,
) -> NodeId {
    let attrs_start_idx = doc.attrs.len();

    let mut element_id = String::new();
    for attr in xml_node.attributes() {
        match attr.namespace() {
            None | Some(SVG_NS) | Some(XLINK_NS) | Some(XML_NAMESPACE_NS) => {}
            _ => continue,
        }

        let aid = match AId::from_str(attr.name()) {
            Some(v) => v,
            None => continue,
        };

        if aid == AId::Id {
            element_id = attr.value().to_string();
        }

        append_attribute(parent_id, tag_name, aid, attr.value(), doc);
    }

    doc.append(
        parent_id,
        NodeKind::Element {
            tag_name,
            element_id,
            has_authored_id: false, // resolved later
            attributes: attrs_start_idx..doc.attrs.len(),
            style: Vec::new(),
        },
    )
}

fn append_attribute(parent_id: NodeId, tag_name: EId, aid: AId, value: &str, doc: &mut Document) {
    if aid.allows_inherit_value() && value == "inherit" {
        resolve_inherit(parent_id, tag_name, aid, doc);
        return;
    }

    match parse_svg_attribute(tag_name, aid, value) {
        Ok(value) => doc.attrs.push(Attribute { name: aid, value }),
        Err(_) => {
            warn!("Failed to parse {} value: '{}'.", aid, value);
            // `fill` has a documented fallback.
            if aid == AId::Fill {
                doc.attrs.push(Attribute {
                    name: aid,
                    value: AttributeValue::Color(svgtypes::Color::black()),
                });
            }
        }
    }
}

pub(crate) fn parse_svg_attribute(
    tag_name: EId,
    aid: AId,
    value: &str,
) -> Result<AttributeValue, svgtypes::Error> {
    Ok(match aid {
        AId::Href => {
            // `href` can contain base64 data and we do store it as is.
            match svgtypes::Stream::from(value).parse_iri() {
                Ok(link) => AttributeValue::Link(link.to_string()),
                Err(_) => AttributeValue::String(value.to_string()),
            }
        }

        AId::X | AId::Y | AId::Dx | AId::Dy => {
            // Some attributes can contain different data based on the element type.
            match tag_name {
                EId::Text | EId::Tspan => AttributeValue::String(value.to_string()),
                EId::FePointLight | EId::FeSpotLight => {
                    AttributeValue::Number(parse_number(value)?)
                }
                _ => AttributeValue::Length(Length::from_str(value)?),
            }
        }

        AId::X1
        | AId::Y1
        | AId::X2
        | AId::Y2
        | AId::R
        | AId::Rx
        | AId::Ry
        | AId::Cx
        | AId::Cy
        | AId::Fx
        | AId::Fy
        | AId::RefX
        | AId::RefY
        | AId::Width
        | AId::Height
        | AId::MarkerWidth
        | AId::MarkerHeight
        | AId::StrokeDashoffset
        | AId::StrokeWidth => AttributeValue::Length(Length::from_str(value)?),

        AId::Offset => {
            // offset = <number> | <percentage>
            let l = Length::from_str(value)?;
            if matches!(l.unit, crate::units::Unit::None | crate::units::Unit::Percent) {
                AttributeValue::Length(l)
            } else {
                return Err(svgtypes::Error::InvalidValue);
            }
        }

        AId::Opacity | AId::FillOpacity | AId::StrokeOpacity | AId::StopOpacity => {
            let n = parse_number(value)?;
            AttributeValue::Opacity(Opacity::new_clamped(n))
        }

        AId::Azimuth
        | AId::Elevation
        | AId::K1
        | AId::K2
        | AId::K3
        | AId::K4
        | AId::SpecularConstant
        | AId::SpecularExponent
        | AId::StrokeMiterlimit
        | AId::SurfaceScale
        | AId::Z => AttributeValue::Number(parse_number(value)?),

        AId::StrokeDasharray => match value {
            "none" => AttributeValue::None,
            _ => AttributeValue::String(value.to_string()),
        },

        AId::Fill | AId::Stroke => match value {
            // Not every `svgtypes` version knows these tokens,
            // so they are resolved before the `Paint` grammar.
            "context-fill" => AttributeValue::ContextFill,
            "context-stroke" => AttributeValue::ContextStroke,
            _ => match svgtypes::Paint::from_str(value)? {
                svgtypes::Paint::None => AttributeValue::None,
                svgtypes::Paint::CurrentColor => AttributeValue::CurrentColor,
                svgtypes::Paint::Color(color) => AttributeValue::Color(color),
                svgtypes::Paint::FuncIRI(link, fallback) => {
                    AttributeValue::Paint(link.to_string(), fallback)
                }
                // `inherit` is resolved before parsing.
                _ => return Err(svgtypes::Error::InvalidValue),
            },
        },

        AId::ClipPath | AId::Filter | AId::MarkerEnd | AId::MarkerMid | AId::MarkerStart => {
            match value {
                "none" => AttributeValue::None,
                _ => {
                    let mut s = svgtypes::Stream::from(value);
                    let link = s.parse_func_iri()?;
                    AttributeValue::Link(link.to_string())
                }
            }
        }

        AId::Color => AttributeValue::Color(svgtypes::Color::from_str(value)?),

        AId::LightingColor | AId::StopColor => match value {
            "currentColor" => AttributeValue::CurrentColor,
            _ => AttributeValue::Color(svgtypes::Color::from_str(value)?),
        },

        AId::D => {
            let path = parse_path(value);
            if path.len() >= 2 {
                AttributeValue::Path(Rc::new(path))
            } else {
                return Err(svgtypes::Error::InvalidValue);
            }
        }

        AId::Transform | AId::GradientTransform => {
            AttributeValue::Transform(Transform::from(svgtypes::Transform::from_str(value)?))
        }

        AId::FontSize => match Length::from_str(value) {
            Ok(l) => AttributeValue::Length(l),
            Err(_) => AttributeValue::String(value.to_string()),
        },

        AId::Display => match value {
            "none" => AttributeValue::None,
            _ => AttributeValue::String(value.to_string()),
        },

        AId::Orient => match value {
            "auto" | "auto-start-reverse" => AttributeValue::String(value.to_string()),
            _ => AttributeValue::Angle(svgtypes::Angle::from_str(value)?),
        },

        AId::ViewBox => AttributeValue::ViewBox(svgtypes::ViewBox::from_str(value)?),

        AId::PreserveAspectRatio => {
            AttributeValue::AspectRatio(svgtypes::AspectRatio::from_str(value)?)
        }

        _ => AttributeValue::String(value.to_string()),
    })
}

#[inline(never)]
fn parse_number(value: &str) -> Result<f64, svgtypes::Error> {
    let mut s = svgtypes::Stream::from(value);
    let n = s.parse_number()?;
    s.skip_spaces();

    if !s.at_end() {
        return Err(svgtypes::Error::InvalidValue);
    }

    Ok(n)
}

/// Parses path data into absolute move/line/cubic/quadratic/close segments.
#[inline(never)]
pub(crate) fn parse_path(text: &str) -> PathData {
    // Previous MoveTo coordinates.
    let mut prev_mx = 0.0;
    let mut prev_my = 0.0;

    // Previous coordinates.
    let mut prev_x = 0.0;
    let mut prev_y = 0.0;

    let mut prev_seg = svgtypes::PathSegment::MoveTo {
        abs: true,
        x: 0.0,
        y: 0.0,
    };

    let mut path = PathData::with_capacity(32);

    for segment in svgtypes::PathParser::from(text) {
        let segment = match segment {
            Ok(v) => v,
            Err(_) => break,
        };

        // A path must start with MoveTo.
        if path.is_empty() && !matches!(segment, svgtypes::PathSegment::MoveTo { .. }) {
            break;
        }

        match segment {
            svgtypes::PathSegment::MoveTo { abs, mut x, mut y } => {
                if !abs {
                    // A relative 'm' after 'z' is relative to the previous
                    // subpath start, not to the closed position.
                    if let Some(PathSegment::ClosePath) = path.last() {
                        x += prev_mx;
                        y += prev_my;
                    } else {
                        x += prev_x;
                        y += prev_y;
                    }
                }

                path.push_move_to(x, y);
                prev_seg = segment;
            }
            svgtypes::PathSegment::LineTo { abs, mut x, mut y } => {
                if !abs {
                    x += prev_x;
                    y += prev_y;
                }

                path.push_line_to(x, y);
                prev_seg = segment;
            }
            svgtypes::PathSegment::HorizontalLineTo { abs, mut x } => {
                if !abs {
                    x += prev_x;
                }

                path.push_line_to(x, prev_y);
                prev_seg = segment;
            }
            svgtypes::PathSegment::VerticalLineTo { abs, mut y } => {
                if !abs {
                    y += prev_y;
                }

                path.push_line_to(prev_x, y);
                prev_seg = segment;
            }
            svgtypes::PathSegment::CurveTo {
                abs,
                mut x1,
                mut y1,
                mut x2,
                mut y2,
                mut x,
                mut y,
            } => {
                if !abs {
                    x1 += prev_x;
                    y1 += prev_y;
                    x2 += prev_x;
                    y2 += prev_y;
                    x += prev_x;
                    y += prev_y;
                }

                path.push_curve_to(x1, y1, x2, y2, x, y);

                // Remember as absolute.
                prev_seg = svgtypes::PathSegment::CurveTo {
                    abs: true,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                };
            }
            svgtypes::PathSegment::SmoothCurveTo {
                abs,
                mut x2,
                mut y2,
                mut x,
                mut y,
            } => {
                // 'The first control point is assumed to be the reflection
                // of the second control point on the previous command
                // relative to the current point. (If there is no previous
                // command or if the previous command was not an C, c, S or s,
                // assume the first control point is coincident with the
                // current point.)'
                let (x1, y1) = match prev_seg {
                    svgtypes::PathSegment::CurveTo { x2, y2, x, y, .. } => {
                        (x * 2.0 - x2, y * 2.0 - y2)
                    }
                    _ => (prev_x, prev_y),
                };

                if !abs {
                    x2 += prev_x;
                    y2 += prev_y;
                    x += prev_x;
                    y += prev_y;
                }

                path.push_curve_to(x1, y1, x2, y2, x, y);

                // Remember as an absolute CurveTo, so the reflection logic
                // above stays uniform.
                prev_seg = svgtypes::PathSegment::CurveTo {
                    abs: true,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                };
            }
            svgtypes::PathSegment::Quadratic {
                abs,
                mut x1,
                mut y1,
                mut x,
                mut y,
            } => {
                if !abs {
                    x1 += prev_x;
                    y1 += prev_y;
                    x += prev_x;
                    y += prev_y;
                }

                path.push_quad_to(x1, y1, x, y);

                // Remember as absolute.
                prev_seg = svgtypes::PathSegment::Quadratic {
                    abs: true,
                    x1,
                    y1,
                    x,
                    y,
                };
            }
            svgtypes::PathSegment::SmoothQuadratic { abs, mut x, mut y } => {
                // 'The control point is assumed to be the reflection of
                // the control point on the previous command relative to
                // the current point. (If there is no previous command or
                // if the previous command was not a Q, q, T or t, assume
                // the control point is coincident with the current point.)'
                let (x1, y1) = match prev_seg {
                    svgtypes::PathSegment::Quadratic { x1, y1, x, y, .. } => {
                        (x * 2.0 - x1, y * 2.0 - y1)
                    }
                    _ => (prev_x, prev_y),
                };

                if !abs {
                    x += prev_x;
                    y += prev_y;
                }

                path.push_quad_to(x1, y1, x, y);

                // Remember as an absolute Quadratic.
                prev_seg = svgtypes::PathSegment::Quadratic {
                    abs: true,
                    x1,
                    y1,
                    x,
                    y,
                };
            }
            svgtypes::PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                mut x,
                mut y,
            } => {
                if !abs {
                    x += prev_x;
                    y += prev_y;
                }

                path.push_arc_to(rx, ry, x_axis_rotation, large_arc, sweep, x, y);
                prev_seg = segment;
            }
            svgtypes::PathSegment::ClosePath { .. } => {
                if let Some(PathSegment::ClosePath) = path.last() {
                    // Do not add sequential ClosePath segments.
                    // Otherwise it will break marker rendering.
                } else {
                    path.push_close_path();
                }

                prev_seg = segment;
            }
        }

        // Remember the last position.
        if let Some(seg) = path.last() {
            match *seg {
                PathSegment::MoveTo { x, y } => {
                    prev_x = x;
                    prev_y = y;
                    prev_mx = x;
                    prev_my = y;
                }
                PathSegment::LineTo { x, y }
                | PathSegment::CurveTo { x, y, .. }
                | PathSegment::QuadTo { x, y, .. } => {
                    prev_x = x;
                    prev_y = y;
                }
                PathSegment::ClosePath => {
                    // ClosePath moves us to the subpath start,
                    // not to the previous position.
                    prev_x = prev_mx;
                    prev_y = prev_my;
                }
            }
        }
    }

    path.shrink_to_fit();
    path
}

fn resolve_inherit(parent_id: NodeId, tag_name: EId, aid: AId, doc: &mut Document) {
    if aid.is_inheritable() {
        // Inheritable attributes can inherit a value from any ancestor.
        let node_id = doc
            .get(parent_id)
            .ancestors()
            .find(|n| n.has_attribute(aid))
            .map(|n| n.id());
        if let Some(node_id) = node_id {
            if let Some(value) = doc.get(node_id).attribute_value(aid).cloned() {
                doc.attrs.push(Attribute { name: aid, value });
                return;
            }
        }
    } else {
        // Non-inheritable attributes can inherit a value only
        // from a direct parent.
        if let Some(value) = doc.get(parent_id).attribute_value(aid).cloned() {
            doc.attrs.push(Attribute { name: aid, value });
            return;
        }
    }

    // Fall back to the default value if possible.
    let value = match aid {
        AId::ClipPath | AId::Filter | AId::MarkerEnd | AId::MarkerMid | AId::MarkerStart
        | AId::Stroke | AId::StrokeDasharray => "none",

        AId::Fill | AId::StopColor => "black",

        AId::FillOpacity | AId::Opacity | AId::StopOpacity | AId::StrokeOpacity => "1",

        AId::ClipRule | AId::FillRule => "nonzero",

        AId::Display => "inline",
        AId::FontSize => "medium",
        AId::FontStyle | AId::FontWeight => "normal",
        AId::StrokeDashoffset => "0",
        AId::StrokeLinecap => "butt",
        AId::StrokeLinejoin => "miter",
        AId::StrokeMiterlimit => "4",
        AId::StrokeWidth => "1",
        AId::Visibility => "visible",
        _ => return,
    };

    if let Ok(value) = parse_svg_attribute(tag_name, aid, value) {
        doc.attrs.push(Attribute { name: aid, value });
    }
}

// A minimal text collection: the concatenated, whitespace-collapsed
// content of the `text` subtree. Detailed tspan handling belongs to
// the text-shaping collaborator.
fn parse_svg_text_element(parent: roxmltree::Node, parent_id: NodeId, doc: &mut Document) {
    let preserve_spaces = parent
        .attribute((XML_NAMESPACE_NS, "space"))
        .map(|v| v == "preserve")
        .unwrap_or(false);

    let mut text = String::new();
    for node in parent.descendants().filter(|n| n.is_text()) {
        if let Some(t) = node.text() {
            text.push_str(t);
        }
    }

    let text = if preserve_spaces {
        text
    } else {
        trim_text(&text)
    };

    if !text.is_empty() {
        doc.append(parent_id, NodeKind::Text(text));
    }
}

fn trim_text(text: &str) -> String {
    let mut s = String::with_capacity(text.len());

    let mut prev = '0';
    for c in text.chars() {
        // \r, \n and \t should be converted into spaces.
        let c = match c {
            '\r' | '\n' | '\t' => ' ',
            _ => c,
        };

        // Skip continuous spaces.
        if c == ' ' && c == prev {
            continue;
        }

        prev = c;
        s.push(c);
    }

    s.trim().to_string()
}

// Elements without an id receive a generated sentinel id, so lookup
// is uniform. Generated ids never participate in id-selector matching
// and are not registered in the id cache.
fn resolve_element_ids(doc: &mut Document) {
    let mut links = HashMap::new();

    for (idx, node) in doc.nodes.iter_mut().enumerate() {
        if let NodeKind::Element {
            ref mut element_id,
            ref mut has_authored_id,
            ..
        } = node.kind
        {
            if element_id.is_empty() {
                *element_id = format!("__{}", idx);
                *has_authored_id = false;
            } else {
                *has_authored_id = true;
                links.insert(element_id.clone(), NodeId(idx));
            }
        }
    }

    doc.links = links;
}

fn resolve_css<'a>(xml: &'a roxmltree::Document<'a>) -> css::Stylesheet {
    let mut sheet = css::Stylesheet::new();

    for node in xml.descendants().filter(|n| n.has_tag_name("style")) {
        match node.attribute("type") {
            Some("text/css") | None => {}
            Some(_) => continue,
        }

        if let Some(text) = node.text() {
            sheet.parse_more(text);
        }
    }

    sheet
}

impl css::MatchingElement for Node<'_> {
    fn has_tag_name(&self, name: &str) -> bool {
        match self.tag_name() {
            Some(eid) => eid.to_str() == name,
            None => false,
        }
    }

    fn has_id(&self, id: &str) -> bool {
        self.has_authored_id() && self.element_id() == id
    }

    fn has_class(&self, name: &str) -> bool {
        Node::has_class(self, name)
    }

    fn parent_element(&self) -> Option<Self> {
        Node::parent_element(self)
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        Node::prev_sibling_element(self)
    }
}

// Walks every rule over every element and fills the local style tables.
// A new entry wins unless the existing one has a strictly greater
// specificity, so equal-specificity rules resolve to the later one.
fn apply_style(sheet: &css::Stylesheet, doc: &mut Document) {
    let mut pending: Vec<(NodeId, AId, AttributeValue, css::Specificity)> = Vec::new();

    for node in doc.descendants() {
        let tag_name = match node.tag_name() {
            Some(v) => v,
            None => continue,
        };

        let mut insert = |aid: AId, value: &str, specificity| {
            // Only presentation attributes participate in the cascade.
            // `transform` isn't a presentation attribute, but is widely
            // used in CSS anyway.
            if !(aid.is_presentation() || aid == AId::Transform) {
                return;
            }

            if value == "inherit" {
                // The cascade resolves `inherit` naturally for
                // inheritable properties; for the rest it is unsupported.
                return;
            }

            match parse_svg_attribute(tag_name, aid, value) {
                Ok(value) => pending.push((node.id(), aid, value, specificity)),
                Err(_) => warn!("Failed to parse {} value: '{}'.", aid, value),
            }
        };

        for rule in &sheet.rules {
            let specificity = rule
                .selectors
                .iter()
                .filter(|s| s.matches(&node))
                .map(|s| s.specificity())
                .max();

            let specificity = match specificity {
                Some(v) => v,
                None => continue,
            };

            for declaration in &rule.declarations {
                if let Some(aid) = AId::from_str(&declaration.name) {
                    insert(aid, &declaration.value, specificity);
                } else if declaration.name == "marker" {
                    insert(AId::MarkerStart, &declaration.value, specificity);
                    insert(AId::MarkerMid, &declaration.value, specificity);
                    insert(AId::MarkerEnd, &declaration.value, specificity);
                }
            }
        }

        // The inline `style` attribute participates in the cascade
        // above any selector.
        if let Some(AttributeValue::String(style)) = node.attribute_value(AId::Style) {
            for declaration in css::parse_declarations(style) {
                if let Some(aid) = AId::from_str(&declaration.name) {
                    insert(aid, &declaration.value, css::Specificity::INLINE);
                }
            }
        }
    }

    for (node_id, aid, value, specificity) in pending {
        if let NodeKind::Element { ref mut style, .. } = doc.nodes[node_id.0].kind {
            match style.iter_mut().find(|e| e.name == aid) {
                Some(entry) => {
                    if entry.specificity <= specificity {
                        entry.value = value;
                        entry.specificity = specificity;
                    }
                }
                None => style.push(super::StyleEntry {
                    name: aid,
                    value,
                    specificity,
                }),
            }
        }
    }
}

// An element inside e.g. a `clipPath` referencing the `clipPath` itself
// would recurse endlessly during conversion. Such links are replaced
// with `none` upfront.
fn fix_recursive_links(eid: EId, aid: AId, doc: &mut Document) {
    while let Some(attr_idx) = find_recursive_link(eid, aid, doc) {
        doc.attrs[attr_idx].value = AttributeValue::None;
    }
}

fn find_recursive_link(eid: EId, aid: AId, doc: &Document) -> Option<usize> {
    for node in doc.descendants().filter(|n| n.has_tag_name(eid)) {
        for child in node.descendants() {
            if let Some(AttributeValue::Link(ref link_id)) = child.attribute_value(aid).cloned() {
                let linked = match doc.element_by_id(link_id) {
                    Some(v) => v,
                    None => continue,
                };

                if linked == node {
                    return attribute_index(child, aid);
                }

                // The linked element's children must not link this
                // element either.
                for node2 in linked.descendants() {
                    if let Some(AttributeValue::Link(ref link_id2)) = node2.attribute_value(aid) {
                        if doc.element_by_id(link_id2) == Some(node) {
                            return attribute_index(node2, aid);
                        }
                    }
                }
            }
        }
    }

    None
}

fn attribute_index(node: Node, aid: AId) -> Option<usize> {
    match node.d.kind {
        NodeKind::Element { ref attributes, .. } => node
            .attributes()
            .iter()
            .position(|a| a.name == aid)
            .map(|idx| attributes.start + idx),
        _ => None,
    }
}
