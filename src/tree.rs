// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The resolved shape tree.

use std::rc::Rc;

use crate::clippath::ClipPath;
use crate::filter::Filter;
use crate::geom::{Size, Transform, ViewBox};
use crate::pathdata::{PathData, SharedPathData};
use crate::style::{Fill, Stroke};

/// Element units.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Units {
    UserSpaceOnUse,
    ObjectBoundingBox,
}

impl_enum_from_str!(Units,
    "userSpaceOnUse"    => Units::UserSpaceOnUse,
    "objectBoundingBox" => Units::ObjectBoundingBox
);

/// A shape tree node.
pub type Node = rctree::Node<NodeKind>;

/// A shape tree node kind.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum NodeKind {
    Group(Group),
    Shape(Shape),
}

impl NodeKind {
    /// Returns node's transform.
    pub fn transform(&self) -> Transform {
        match self {
            NodeKind::Group(ref g) => g.transform,
            NodeKind::Shape(ref s) => s.transform,
        }
    }

    /// Returns node's id.
    pub fn id(&self) -> &str {
        match self {
            NodeKind::Group(ref g) => &g.id,
            NodeKind::Shape(ref s) => &s.id,
        }
    }
}

/// A group of shapes.
///
/// Created only when it changes rendering: a transform, a clip or
/// a filter. Opacity is already folded into children paints.
#[derive(Clone, Debug)]
pub struct Group {
    /// Element's id, when authored.
    pub id: String,

    /// Group transform, applied to all children.
    pub transform: Transform,

    /// Group clip.
    pub clip_path: Option<Rc<ClipPath>>,

    /// The resolved filter chain.
    pub filter: Option<Rc<Filter>>,
}

impl Default for Group {
    fn default() -> Self {
        Group {
            id: String::new(),
            transform: Transform::default(),
            clip_path: None,
            filter: None,
        }
    }
}

/// A finalized shape.
///
/// Geometry plus fully computed paint descriptors.
#[derive(Clone, Debug)]
pub struct Shape {
    /// Element's id, when authored.
    pub id: String,

    /// Shape transform.
    pub transform: Transform,

    /// Shape geometry: absolute move/line/cubic/quadratic/close segments.
    pub data: SharedPathData,

    /// The fill paint descriptor. `None` means no fill.
    ///
    /// The fill rule lives inside.
    pub fill: Option<Fill>,

    /// The stroke descriptor. `None` means no stroke.
    pub stroke: Option<Stroke>,

    /// Shape clip.
    pub clip_path: Option<Rc<ClipPath>>,
}

impl Default for Shape {
    fn default() -> Self {
        Shape {
            id: String::new(),
            transform: Transform::default(),
            data: Rc::new(PathData::new()),
            fill: None,
            stroke: None,
            clip_path: None,
        }
    }
}

/// The resolved shape tree.
#[derive(Clone, Debug)]
pub struct Tree {
    /// The image size, resolved from `width`/`height`/`viewBox`.
    pub size: Size,

    /// The root view box.
    pub view_box: ViewBox,

    /// The root node. Always a group.
    pub root: Node,
}

impl Tree {
    /// Returns an iterator over the whole tree.
    pub fn descendants(&self) -> rctree::Descendants<NodeKind> {
        self.root.descendants()
    }
}

/// Node helpers.
pub trait NodeExt {
    /// Appends a new child with `kind` and returns it.
    fn append_kind(&self, kind: NodeKind) -> Node;

    /// Composes `ts` before the node's own transform.
    ///
    /// Used when an ancestor is dissolved into its children.
    fn prepend_transform(&self, ts: Transform);

    /// Composes `ts` after the node's own transform.
    ///
    /// Used for positional offsets applied after the subtree is built,
    /// e.g. the `use` x/y shift.
    fn append_transform(&self, ts: Transform);
}

impl NodeExt for Node {
    fn append_kind(&self, kind: NodeKind) -> Node {
        let child = Node::new(kind);
        self.append(child.clone());
        child
    }

    fn prepend_transform(&self, ts: Transform) {
        match *self.borrow_mut() {
            NodeKind::Group(ref mut g) => g.transform.prepend(&ts),
            NodeKind::Shape(ref mut s) => s.transform.prepend(&ts),
        }
    }

    fn append_transform(&self, ts: Transform) {
        match *self.borrow_mut() {
            NodeKind::Group(ref mut g) => g.transform.append(&ts),
            NodeKind::Shape(ref mut s) => s.transform.append(&ts),
        }
    }
}
