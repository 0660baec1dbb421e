// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The element and attribute resolver.
//!
//! Wraps document nodes and resolves attribute values through the
//! override table, the local style table, raw XML attributes and,
//! for inheritable attributes, the resolved parent chain.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use crate::converter;
use crate::geom::{FuzzyEq, Rect, Transform};
use crate::pathdata::SharedPathData;
use crate::svgtree::{AId, AttributeValue, Document, EId, Node};
use crate::units::{self, Length};
use crate::{Opacity, Units};

/// A resolved element.
///
/// Either a node as authored in the document, or a transient shadow
/// copy created when a node is reached via a `use` or marker reference.
/// A shadow shares the underlying node, but has its own parent pointer
/// and an override table carrying the caller's values, so one reference
/// can differ stylistically from another without mutating the shared
/// definition.
#[derive(Clone, Debug)]
pub enum SvgElement<'a> {
    /// A node as it appears in the document.
    Authored(Node<'a>),
    /// A transient reference copy. Never registered in the id cache.
    Shadow(Rc<ShadowNode<'a>>),
}

/// The data of a shadow element.
#[derive(Debug)]
pub struct ShadowNode<'a> {
    node: Node<'a>,
    overrides: HashMap<AId, Override>,
    parent: SvgElement<'a>,
}

/// An override table entry.
#[derive(Clone, Debug)]
pub struct Override {
    value: AttributeValue,
    // Whether the value came from a raw XML attribute of the using
    // element rather than from its resolved style. A style entry may
    // replace an attribute-origin entry during seeding.
    from_attribute: bool,
}

impl<'a> SvgElement<'a> {
    /// Wraps an authored document node.
    #[inline]
    pub fn from_node(node: Node<'a>) -> Self {
        SvgElement::Authored(node)
    }

    /// Returns the underlying document node.
    #[inline]
    pub fn node(&self) -> Node<'a> {
        match self {
            SvgElement::Authored(node) => *node,
            SvgElement::Shadow(shadow) => shadow.node,
        }
    }

    /// Returns the document this element belongs to.
    #[inline]
    pub fn document(&self) -> &'a Document {
        self.node().document()
    }

    /// Checks that the element is a shadow copy.
    pub fn is_shadow(&self) -> bool {
        matches!(self, SvgElement::Shadow(_))
    }

    /// Returns the element tag name.
    #[inline]
    pub fn tag_name(&self) -> Option<EId> {
        self.node().tag_name()
    }

    /// Returns the element id, authored or generated.
    pub fn element_id(&self) -> &'a str {
        self.node().element_id()
    }

    /// Returns the resolved parent element.
    ///
    /// For a shadow this is the referencing context, not the
    /// definition's XML parent.
    pub fn parent_element(&self) -> Option<SvgElement<'a>> {
        match self {
            SvgElement::Authored(node) => node.parent_element().map(SvgElement::Authored),
            SvgElement::Shadow(shadow) => Some(shadow.parent.clone()),
        }
    }

    /// Returns an iterator over children elements.
    ///
    /// Children of a shadow element are shadows as well, with their
    /// parent pointers routed through this element.
    pub fn children(&self) -> Children<'a> {
        Children {
            parent: self.clone(),
            next: self.node().first_child(),
        }
    }

    // The own, non-inherited value: override table entry first,
    // then the local style table, then the raw attribute.
    fn own_value(&self, aid: AId) -> Option<AttributeValue> {
        if let SvgElement::Shadow(shadow) = self {
            if let Some(o) = shadow.overrides.get(&aid) {
                return Some(o.value.clone());
            }
        }

        self.node().cascaded_value(aid).cloned()
    }

    /// Returns the element's own attribute value.
    pub fn attribute<T: FromValue>(&self, aid: AId) -> Option<T> {
        T::from_value(self.own_value(aid)?)
    }

    /// Returns an attribute value, resolving inheritable attributes
    /// through the parent chain.
    ///
    /// The first inherited hit is cached per (node, attribute), so
    /// repeated lookups are O(1). The cache is scoped to the document
    /// and never invalidated.
    pub fn find_attribute<T: FromValue>(&self, aid: AId) -> Option<T> {
        T::from_value(self.find_value(aid)?)
    }

    pub(crate) fn find_value(&self, aid: AId) -> Option<AttributeValue> {
        if let Some(v) = self.own_value(aid) {
            return Some(v);
        }

        if !aid.is_inheritable() {
            return None;
        }

        if let SvgElement::Authored(node) = self {
            let key = (node.id(), aid);
            if let Some(v) = node.document().inherited.borrow().get(&key) {
                return Some(v.clone());
            }

            let value = self.parent_element()?.find_value(aid);
            if let Some(ref v) = value {
                node.document()
                    .inherited
                    .borrow_mut()
                    .insert(key, v.clone());
            }

            value
        } else {
            // Shadow instances are transient and skip the cache.
            self.parent_element()?.find_value(aid)
        }
    }

    // Like `find_value`, but also reports which element the value was
    // found on. Required by `currentColor`, which resolves against the
    // element that carries the paint. Not cached.
    pub(crate) fn find_value_with_source(
        &self,
        aid: AId,
    ) -> Option<(SvgElement<'a>, AttributeValue)> {
        let mut current = Some(self.clone());
        while let Some(el) = current {
            if let Some(v) = el.own_value(aid) {
                return Some((el, v));
            }

            if !aid.is_inheritable() {
                return None;
            }

            current = el.parent_element();
        }

        None
    }

    /// Returns the element's opacity multiplied by the parent's
    /// effective opacity. Memoized per node.
    pub fn effective_opacity(&self) -> Opacity {
        if let SvgElement::Authored(node) = self {
            if let Some(n) = node.document().opacities.borrow().get(&node.id()) {
                return Opacity::new_clamped(*n);
            }

            let n = self.calc_effective_opacity();
            node.document().opacities.borrow_mut().insert(node.id(), n);
            Opacity::new_clamped(n)
        } else {
            Opacity::new_clamped(self.calc_effective_opacity())
        }
    }

    fn calc_effective_opacity(&self) -> f64 {
        let own = self
            .attribute::<Opacity>(AId::Opacity)
            .map(|o| o.get())
            .unwrap_or(1.0);

        match self.parent_element() {
            Some(parent) => own * parent.effective_opacity().get(),
            None => own,
        }
    }

    /// Builds a shadow copy of `target` referenced from this element.
    ///
    /// The override table is seeded from: overrides already present on
    /// this element, this element's XML attributes and this element's
    /// resolved local style. `transform`, `clip-path`, `x` and `y` are
    /// excluded since they compose instead of replacing.
    pub(crate) fn create_reference_shadow(&self, target: Node<'a>) -> SvgElement<'a> {
        let mut overrides: HashMap<AId, Override> = HashMap::new();

        if let SvgElement::Shadow(shadow) = self {
            for (aid, o) in &shadow.overrides {
                overrides.insert(*aid, o.clone());
            }
        }

        for attr in self.node().attributes() {
            if is_composed_attribute(attr.name) {
                continue;
            }

            overrides.entry(attr.name).or_insert_with(|| Override {
                value: attr.value.clone(),
                from_attribute: true,
            });
        }

        for entry in self.node().style() {
            if is_composed_attribute(entry.name) {
                continue;
            }

            match overrides.entry(entry.name) {
                Entry::Occupied(mut e) => {
                    if e.get().from_attribute {
                        e.insert(Override {
                            value: entry.value.clone(),
                            from_attribute: false,
                        });
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(Override {
                        value: entry.value.clone(),
                        from_attribute: false,
                    });
                }
            }
        }

        SvgElement::Shadow(Rc::new(ShadowNode {
            node: target,
            overrides,
            parent: self.clone(),
        }))
    }

    /// Builds an override-free shadow of `target` with this element as
    /// the resolved parent. Used for marker instancing, where content
    /// inherits from the definition's context and not from the shape.
    pub(crate) fn create_instance_shadow(&self, target: Node<'a>) -> SvgElement<'a> {
        SvgElement::Shadow(Rc::new(ShadowNode {
            node: target,
            overrides: HashMap::new(),
            parent: self.clone(),
        }))
    }

    /// Returns the `viewBox` attribute as a rect.
    pub fn get_viewbox(&self) -> Option<Rect> {
        let vb: svgtypes::ViewBox = self.attribute(AId::ViewBox)?;
        Rect::new(vb.x, vb.y, vb.w, vb.h)
    }

    pub(crate) fn has_valid_transform(&self) -> bool {
        // Do not use `attribute::<Transform>`, because it always
        // returns a valid transform.
        match self.own_value(AId::Transform) {
            Some(AttributeValue::Transform(ts)) => {
                let (sx, sy) = ts.get_scale();
                !(sx.fuzzy_eq(&0.0) || sy.fuzzy_eq(&0.0))
            }
            _ => true,
        }
    }

    pub(crate) fn is_visible_element(&self) -> bool {
        self.attribute::<String>(AId::Display).as_deref() != Some("none")
            && self.has_valid_transform()
    }

    pub(crate) fn convert_length(
        &self,
        aid: AId,
        object_units: Units,
        state: &converter::State,
        def: Length,
    ) -> f64 {
        units::convert_length(
            self.attribute(aid).unwrap_or(def),
            self,
            aid,
            object_units,
            state,
        )
    }

    pub(crate) fn convert_user_length(
        &self,
        aid: AId,
        state: &converter::State,
        def: Length,
    ) -> f64 {
        self.convert_length(aid, Units::UserSpaceOnUse, state, def)
    }

    /// Resolves a length through the inheritance chain,
    /// in user units.
    pub(crate) fn resolve_length(&self, aid: AId, state: &converter::State, def: f64) -> f64 {
        if let Some((el, value)) = self.find_value_with_source(aid) {
            if let Some(length) = Length::from_value(value) {
                return units::convert_length(length, &el, aid, Units::UserSpaceOnUse, state);
            }
        }

        def
    }

    pub(crate) fn resolve_valid_length(
        &self,
        aid: AId,
        state: &converter::State,
        def: f64,
    ) -> Option<f64> {
        use crate::geom::IsValidLength;

        let n = self.resolve_length(aid, state, def);
        if n.is_valid_length() {
            Some(n)
        } else {
            None
        }
    }
}

fn is_composed_attribute(aid: AId) -> bool {
    matches!(
        aid,
        // Composed, not replaced.
        AId::Transform | AId::ClipPath | AId::X | AId::Y
        // Not styling at all.
        | AId::Id | AId::Href | AId::Class | AId::Style
        // Viewport sizing, resolved by the `use` conversion itself.
        | AId::Width | AId::Height
    )
}

/// An iterator over children elements.
pub struct Children<'a> {
    parent: SvgElement<'a>,
    next: Option<Node<'a>>,
}

impl<'a> Iterator for Children<'a> {
    type Item = SvgElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.next.take()?;
            self.next = node.next_sibling();

            if !node.is_element() {
                continue;
            }

            return Some(match self.parent {
                SvgElement::Authored(_) => SvgElement::Authored(node),
                SvgElement::Shadow(_) => SvgElement::Shadow(Rc::new(ShadowNode {
                    node,
                    overrides: HashMap::new(),
                    parent: self.parent.clone(),
                })),
            });
        }
    }
}

/// A typed view over an [`AttributeValue`].
pub trait FromValue: Sized {
    /// Converts the value, when the type matches.
    fn from_value(value: AttributeValue) -> Option<Self>;
}

impl FromValue for AttributeValue {
    fn from_value(value: AttributeValue) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for f64 {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl FromValue for Opacity {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Opacity(n) => Some(n),
            _ => None,
        }
    }
}

impl FromValue for Length {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Length(l) => Some(l),
            AttributeValue::Number(n) => Some(Length::new_number(n)),
            _ => None,
        }
    }
}

impl FromValue for svgtypes::Color {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Color(c) => Some(c),
            _ => None,
        }
    }
}

impl FromValue for svgtypes::ViewBox {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::ViewBox(vb) => Some(vb),
            _ => None,
        }
    }
}

impl FromValue for svgtypes::AspectRatio {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::AspectRatio(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for svgtypes::Angle {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Angle(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for Transform {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Transform(ts) => {
                let (sx, sy) = ts.get_scale();
                if sx.fuzzy_eq(&0.0) || sy.fuzzy_eq(&0.0) {
                    Some(Transform::default())
                } else {
                    Some(ts)
                }
            }
            _ => None,
        }
    }
}

impl FromValue for SharedPathData {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            // Cloning is cheap, since it's an Rc.
            AttributeValue::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::String(s) => Some(s),
            // A special case, so `el.attribute::<String>(aid)` can be
            // compared against "none" without matching the enum.
            AttributeValue::None => Some("none".to_string()),
            _ => None,
        }
    }
}

/// Enum-like attribute values parsing.
pub trait EnumFromStr: Sized {
    /// Parses the keyword.
    fn enum_from_str(text: &str) -> Option<Self>;
}

impl<T: EnumFromStr> FromValue for T {
    #[inline]
    fn from_value(value: AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::String(s) => EnumFromStr::enum_from_str(&s),
            AttributeValue::None => EnumFromStr::enum_from_str("none"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svgtree::Document;
    use crate::Options;

    fn parse(text: &str) -> Document {
        Document::parse(text, &Options::default()).unwrap()
    }

    fn element_by_id<'a>(doc: &'a Document, id: &str) -> SvgElement<'a> {
        SvgElement::from_node(doc.element_by_id(id).unwrap())
    }

    #[test]
    fn attribute_inheritance() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <g fill='green' opacity='0.5'>\
                    <rect id='r' width='10' height='10'/>\
                </g>\
             </svg>",
        );

        let rect = element_by_id(&doc, "r");

        // `fill` is inheritable.
        assert!(matches!(
            rect.find_value(AId::Fill),
            Some(AttributeValue::Color(c)) if c == svgtypes::Color::new_rgb(0, 128, 0)
        ));
        // Twice, to exercise the memoized path.
        assert!(rect.find_value(AId::Fill).is_some());

        // `opacity` is not.
        assert!(rect.find_value(AId::Opacity).is_none());
    }

    #[test]
    fn style_beats_attribute() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect id='r' fill='green' style='fill:red' width='10' height='10'/>\
             </svg>",
        );

        let rect = element_by_id(&doc, "r");
        assert!(matches!(
            rect.find_value(AId::Fill),
            Some(AttributeValue::Color(c)) if c == svgtypes::Color::new_rgb(255, 0, 0)
        ));
    }

    #[test]
    fn effective_opacity() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <g opacity='0.5'>\
                    <rect id='r' opacity='0.5' width='10' height='10'/>\
                </g>\
             </svg>",
        );

        let rect = element_by_id(&doc, "r");
        assert!((rect.effective_opacity().get() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn shadow_overrides() {
        let doc = parse(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
                <rect id='r' width='10' height='10'/>\
                <use id='u' href='#r' x='5' fill='blue'/>\
             </svg>",
        );

        let use_el = element_by_id(&doc, "u");
        let target = doc.element_by_id("r").unwrap();
        let shadow = use_el.create_reference_shadow(target);

        // The `use` fill override applies to the shadow.
        assert!(matches!(
            shadow.find_value(AId::Fill),
            Some(AttributeValue::Color(c)) if c == svgtypes::Color::new_rgb(0, 0, 255)
        ));

        // `x` is composed, not overridden.
        assert!(shadow.attribute::<Length>(AId::X).is_none());

        // The authored element is untouched.
        let rect = element_by_id(&doc, "r");
        assert!(rect.find_value(AId::Fill).is_none());
    }
}
