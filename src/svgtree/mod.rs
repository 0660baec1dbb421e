// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An SVG document representation.
//!
//! A read-only arena tree over the parsed XML with pre-parsed attribute
//! values and per-element style tables filled by the CSS cascade.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::css;
use crate::geom::Transform;
use crate::pathdata::SharedPathData;
use crate::units::Length;
use crate::Opacity;

mod names;
mod parse;

pub use names::{AId, EId};

type Range = std::ops::Range<usize>;

/// An SVG document.
///
/// Owns all elements for the duration of a conversion. The memoization
/// caches are populated lazily by a single, synchronous conversion;
/// each key is written at most once and never invalidated.
pub struct Document {
    nodes: Vec<NodeData>,
    attrs: Vec<Attribute>,
    links: HashMap<String, NodeId>,

    // Per-document memoization. See `SvgElement`.
    pub(crate) inherited: RefCell<HashMap<(NodeId, AId), AttributeValue>>,
    pub(crate) opacities: RefCell<HashMap<NodeId, f64>>,
}

impl Document {
    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> Node {
        Node {
            id: NodeId(0),
            d: &self.nodes[0],
            doc: self,
        }
    }

    /// Returns the `svg` element.
    pub fn root_element(&self) -> Node {
        // `unwrap` is safe, because `Document` is guarantee to have
        // at least one element.
        self.root().first_element_child().unwrap()
    }

    /// Returns an iterator over document's descendant nodes.
    pub fn descendants(&self) -> Descendants {
        self.root().descendants()
    }

    /// Returns an element by its authored ID.
    ///
    /// Generated sentinel ids are not searchable.
    #[inline]
    pub fn element_by_id(&self, id: &str) -> Option<Node> {
        let node_id = self.links.get(id)?;
        Some(self.get(*node_id))
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Node {
        Node {
            id,
            d: &self.nodes[id.0],
            doc: self,
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        fn print_children(
            parent: Node,
            depth: usize,
            f: &mut std::fmt::Formatter,
        ) -> std::fmt::Result {
            for child in parent.children() {
                for _ in 0..depth {
                    write!(f, "    ")?;
                }
                writeln!(f, "{:?}", child)?;
                print_children(child, depth + 1, f)?;
            }

            Ok(())
        }

        writeln!(f, "Document [")?;
        print_children(self.root(), 1, f)?;
        writeln!(f, "]")
    }
}

/// An element id inside the document arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(usize);

enum NodeKind {
    Root,
    Element {
        tag_name: EId,
        // Authored or a generated `__N` sentinel. Uniform lookup,
        // but sentinels never match id selectors.
        element_id: String,
        has_authored_id: bool,
        attributes: Range,
        style: Vec<StyleEntry>,
    },
    Text(String),
}

struct NodeData {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    children: Option<(NodeId, NodeId)>,
    kind: NodeKind,
}

/// A typed attribute value.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum AttributeValue {
    /// The `none` keyword.
    None,
    CurrentColor,
    ContextFill,
    ContextStroke,
    Angle(svgtypes::Angle),
    AspectRatio(svgtypes::AspectRatio),
    Color(svgtypes::Color),
    Length(Length),
    Link(String),
    Number(f64),
    Opacity(Opacity),
    Paint(String, Option<svgtypes::PaintFallback>),
    Path(SharedPathData),
    String(String),
    Transform(Transform),
    ViewBox(svgtypes::ViewBox),
}

/// A parsed XML attribute.
#[derive(Clone)]
pub struct Attribute {
    /// Attribute name.
    pub name: AId,
    /// Attribute value.
    pub value: AttributeValue,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Attribute {{ name: {:?}, value: {:?} }}",
            self.name, self.value
        )
    }
}

/// An entry of an element's local style table.
///
/// Filled by the cascade; competes on specificity.
#[derive(Clone, Debug)]
pub struct StyleEntry {
    /// Property name.
    pub name: AId,
    /// Parsed property value.
    pub value: AttributeValue,
    /// The specificity this entry won with.
    pub specificity: css::Specificity,
}

/// A node of the document arena.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    id: NodeId,
    doc: &'a Document,
    d: &'a NodeData,
}

impl Eq for Node<'_> {}

impl PartialEq for Node<'_> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.doc, other.doc)
    }
}

impl<'a> Node<'a> {
    /// Returns the arena id of the node.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the document this node belongs to.
    #[inline]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Checks that the node is an element.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.d.kind, NodeKind::Element { .. })
    }

    /// Checks that the node is a text node.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.d.kind, NodeKind::Text(_))
    }

    /// Returns the element tag name.
    #[inline]
    pub fn tag_name(&self) -> Option<EId> {
        match self.d.kind {
            NodeKind::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    /// Checks that the node is an element with the specified tag name.
    #[inline]
    pub fn has_tag_name(&self, name: EId) -> bool {
        self.tag_name() == Some(name)
    }

    /// Returns the element id.
    ///
    /// Either authored or a generated sentinel, so the lookup is uniform.
    pub fn element_id(&self) -> &'a str {
        match self.d.kind {
            NodeKind::Element { ref element_id, .. } => element_id,
            _ => "",
        }
    }

    /// Checks that the element has an authored, non-generated id.
    pub fn has_authored_id(&self) -> bool {
        match self.d.kind {
            NodeKind::Element {
                has_authored_id, ..
            } => has_authored_id,
            _ => false,
        }
    }

    /// Returns element's raw XML attributes.
    pub fn attributes(&self) -> &'a [Attribute] {
        match self.d.kind {
            NodeKind::Element { ref attributes, .. } => &self.doc.attrs[attributes.clone()],
            _ => &[],
        }
    }

    /// Returns a raw XML attribute value.
    pub fn attribute_value(&self, aid: AId) -> Option<&'a AttributeValue> {
        self.attributes()
            .iter()
            .find(|a| a.name == aid)
            .map(|a| &a.value)
    }

    /// Checks that the element has the specified raw XML attribute.
    pub fn has_attribute(&self, aid: AId) -> bool {
        self.attribute_value(aid).is_some()
    }

    /// Returns element's style table.
    pub fn style(&self) -> &'a [StyleEntry] {
        match self.d.kind {
            NodeKind::Element { ref style, .. } => style,
            _ => &[],
        }
    }

    /// Returns a value from the element's style table.
    pub fn style_value(&self, aid: AId) -> Option<&'a AttributeValue> {
        self.style()
            .iter()
            .find(|e| e.name == aid)
            .map(|e| &e.value)
    }

    /// Returns the cascade-resolved own value: style table first,
    /// then the raw attribute.
    pub fn cascaded_value(&self, aid: AId) -> Option<&'a AttributeValue> {
        self.style_value(aid).or_else(|| self.attribute_value(aid))
    }

    /// Checks the element's class list.
    pub fn has_class(&self, name: &str) -> bool {
        match self.attribute_value(AId::Class) {
            Some(AttributeValue::String(classes)) => {
                classes.split_ascii_whitespace().any(|c| c == name)
            }
            _ => false,
        }
    }

    /// Resolves a link attribute into the referenced element.
    pub fn href(&self) -> Option<Node<'a>> {
        match self.attribute_value(AId::Href)? {
            AttributeValue::Link(ref id) => self.doc.element_by_id(id),
            _ => None,
        }
    }

    /// Returns an iterator over the `xlink:href` chain,
    /// starting at this node.
    ///
    /// Reference cycles are reported and terminate the iteration.
    pub fn href_iter(&self) -> HrefIter<'a> {
        HrefIter {
            doc: self.doc,
            visited: vec![self.id],
            curr: self.id,
            is_first: true,
            is_finished: false,
        }
    }

    /// Returns the node text content: own for a text node,
    /// concatenated descendants' otherwise.
    pub fn text(&self) -> String {
        match self.d.kind {
            NodeKind::Text(ref text) => text.clone(),
            _ => {
                let mut s = String::new();
                for node in self.descendants() {
                    if let NodeKind::Text(ref text) = node.d.kind {
                        s.push_str(text);
                    }
                }
                s
            }
        }
    }

    #[inline]
    fn gen_node(&self, id: NodeId) -> Node<'a> {
        Node {
            id,
            d: &self.doc.nodes[id.0],
            doc: self.doc,
        }
    }

    /// Returns the parent node.
    pub fn parent(&self) -> Option<Self> {
        self.d.parent.map(|id| self.gen_node(id))
    }

    /// Returns the parent element.
    pub fn parent_element(&self) -> Option<Self> {
        self.ancestors().skip(1).find(|n| n.is_element())
    }

    /// Returns the previous sibling node.
    pub fn prev_sibling(&self) -> Option<Self> {
        self.d.prev_sibling.map(|id| self.gen_node(id))
    }

    /// Returns the previous sibling element.
    pub fn prev_sibling_element(&self) -> Option<Self> {
        let mut current = self.prev_sibling();
        while let Some(n) = current {
            if n.is_element() {
                return Some(n);
            }
            current = n.prev_sibling();
        }
        None
    }

    /// Returns the next sibling node.
    pub fn next_sibling(&self) -> Option<Self> {
        self.d.next_sibling.map(|id| self.gen_node(id))
    }

    /// Returns the first child node.
    pub fn first_child(&self) -> Option<Self> {
        self.d.children.map(|(id, _)| self.gen_node(id))
    }

    /// Returns the first child element.
    pub fn first_element_child(&self) -> Option<Self> {
        self.children().find(|n| n.is_element())
    }

    /// Returns the last child node.
    pub fn last_child(&self) -> Option<Self> {
        self.d.children.map(|(_, id)| self.gen_node(id))
    }

    /// Checks that the node has children.
    pub fn has_children(&self) -> bool {
        self.d.children.is_some()
    }

    /// Returns an iterator over ancestor nodes starting at this node.
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors(Some(*self))
    }

    /// Returns an iterator over children nodes.
    pub fn children(&self) -> Children<'a> {
        Children {
            front: self.first_child(),
            back: self.last_child(),
        }
    }

    /// Returns an iterator which traverses the subtree starting at this node.
    pub fn traverse(&self) -> Traverse<'a> {
        Traverse {
            root: *self,
            edge: None,
        }
    }

    /// Returns an iterator over this node and its descendants.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants(self.traverse())
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.d.kind {
            NodeKind::Root => write!(f, "Root"),
            NodeKind::Element { .. } => write!(
                f,
                "Element {{ tag_name: {:?}, attributes: {:?} }}",
                self.tag_name(),
                self.attributes()
            ),
            NodeKind::Text(ref text) => write!(f, "Text({:?})", text),
        }
    }
}

macro_rules! axis_iterators {
    ($($i:ident($f:path);)*) => {
        $(
            /// A node axis iterator.
            #[derive(Clone)]
            pub struct $i<'a>(Option<Node<'a>>);

            impl<'a> Iterator for $i<'a> {
                type Item = Node<'a>;

                #[inline]
                fn next(&mut self) -> Option<Self::Item> {
                    let node = self.0.take();
                    self.0 = node.as_ref().and_then($f);
                    node
                }
            }
        )*
    };
}

axis_iterators! {
    Ancestors(Node::parent);
}

/// An iterator over children nodes.
#[derive(Clone)]
pub struct Children<'a> {
    front: Option<Node<'a>>,
    back: Option<Node<'a>>,
}

impl<'a> Iterator for Children<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.front.take();
        if self.front == self.back {
            self.back = None;
        } else {
            self.front = node.as_ref().and_then(Node::next_sibling);
        }
        node
    }
}

/// A subtree traversal edge.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Edge<'a> {
    /// Entering a node.
    Open(Node<'a>),
    /// Leaving a node.
    Close(Node<'a>),
}

/// A subtree traversal iterator.
#[derive(Clone)]
pub struct Traverse<'a> {
    root: Node<'a>,
    edge: Option<Edge<'a>>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = Edge<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.edge {
            Some(Edge::Open(node)) => {
                self.edge = Some(match node.first_child() {
                    Some(first_child) => Edge::Open(first_child),
                    None => Edge::Close(node),
                });
            }
            Some(Edge::Close(node)) => {
                if node == self.root {
                    self.edge = None;
                } else if let Some(next_sibling) = node.next_sibling() {
                    self.edge = Some(Edge::Open(next_sibling));
                } else {
                    self.edge = node.parent().map(Edge::Close);
                }
            }
            None => {
                self.edge = Some(Edge::Open(self.root));
            }
        }

        self.edge
    }
}

/// An iterator over a node and its descendants.
#[derive(Clone)]
pub struct Descendants<'a>(Traverse<'a>);

impl<'a> Iterator for Descendants<'a> {
    type Item = Node<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for edge in &mut self.0 {
            if let Edge::Open(node) = edge {
                return Some(node);
            }
        }

        None
    }
}

/// An iterator over an `href` reference chain.
pub struct HrefIter<'a> {
    doc: &'a Document,
    visited: Vec<NodeId>,
    curr: NodeId,
    is_first: bool,
    is_finished: bool,
}

impl<'a> Iterator for HrefIter<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished {
            return None;
        }

        if self.is_first {
            self.is_first = false;
            return Some(self.doc.get(self.curr));
        }

        let link = self.doc.get(self.curr).href()?;
        if self.visited.contains(&link.id()) {
            log::warn!(
                "Element '#{}' has a circular 'href' reference chain.",
                self.doc.get(self.visited[0]).element_id()
            );
            self.is_finished = true;
            return None;
        }

        self.visited.push(link.id());
        self.curr = link.id();
        Some(link)
    }
}
