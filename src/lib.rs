// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svgres` resolves an [SVG] document into a tree of geometric shapes
with fully computed paint and effect parameters, ready to hand to any
2D rendering backend.

## What gets resolved

- Presentation attributes via a CSS-like cascade: stylesheet rules with
  tag/id/class selectors and specificity, the inline `style` attribute
  and attribute inheritance.
- Shape geometry: path data, basic shapes and elliptical arcs are
  flattened into absolute move/line/cubic/quadratic/close segments.
- Reusable definitions: `use`, gradients and markers are expanded
  through non-destructive shadow copies, so one reference can carry
  its own overrides without mutating the shared definition.
- Filters: a `filter` subtree collapses into a minimal ordered
  primitive chain with resolved buffer names. The numeric filter
  implementation itself is left to the consumer.

## What doesn't

Rasterization, interactive viewing, animation and glyph outline
generation are out of scope. Text can still be resolved by installing
an [`OutlineShaper`] into [`Options`].

Recoverable input problems (malformed lengths, unknown colors, missing
references) never fail the conversion: they are reported through the
`log` crate and replaced with documented fallbacks. Only non-well-formed
XML is fatal.

[SVG]: https://en.wikipedia.org/wiki/Scalable_Vector_Graphics
*/

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

macro_rules! impl_enum_default {
    ($name:ident, $def_value:ident) => {
        impl Default for $name {
            #[inline]
            fn default() -> Self {
                $name::$def_value
            }
        }
    };
}

macro_rules! impl_enum_from_str {
    ($name:ident, $($string:pat => $result:expr),+) => {
        impl crate::element::EnumFromStr for $name {
            fn enum_from_str(s: &str) -> Option<Self> {
                match s {
                    $($string => Some($result)),+,
                    _ => None,
                }
            }
        }
    };
}

pub mod css;

mod clippath;
mod converter;
mod element;
mod error;
mod filter;
mod geom;
mod marker;
mod options;
mod paint_server;
mod pathdata;
mod shapes;
mod style;
mod svgtree;
mod tree;
mod units;
mod use_node;

pub use crate::clippath::{ClipPath, ClipShape};
pub use crate::error::Error;
pub use crate::filter::{
    CompositeOperator, FeComposite, FeGaussianBlur, FeMerge, FeOffset, FePassthrough,
    FeSpecularLighting, Filter, FilterInput, FilterKind, LightSource, Primitive,
};
pub use crate::geom::{
    view_box_to_transform, FuzzyEq, FuzzyZero, IsValidLength, Rect, Size, Transform, ViewBox,
};
pub use crate::options::{FontDescription, Options, OutlineShaper};
pub use crate::paint_server::{
    BaseGradient, LinearGradient, RadialGradient, SpreadMethod, Stop, StopOffset,
};
pub use crate::pathdata::{PathData, PathSegment, SharedPathData};
pub use crate::style::{
    Color, Fill, FillRule, LineCap, LineJoin, Paint, Stroke, StrokeMiterlimit, StrokeWidth,
};
pub use crate::tree::{Group, Node, NodeExt, NodeKind, Shape, Tree, Units};
pub use crate::units::{Length, Unit};

/// An alias to `NormalizedF64`.
pub type Opacity = strict_num::NormalizedF64;

impl Tree {
    /// Parses and resolves an SVG document from a string.
    ///
    /// # Errors
    ///
    /// Only structural problems are fatal: non-well-formed XML,
    /// a missing `svg` root element or an invalid root size.
    /// Everything else degrades with a logged warning.
    pub fn from_str(text: &str, opt: &Options) -> Result<Tree, Error> {
        let doc = svgtree::Document::parse(text, opt)?;
        converter::convert_doc(&doc, opt)
    }

    /// Parses and resolves an SVG document from raw data.
    ///
    /// SVGZ (gzip-compressed) input is detected and decompressed.
    pub fn from_data(data: &[u8], opt: &Options) -> Result<Tree, Error> {
        if data.starts_with(&[0x1f, 0x8b]) {
            let text = decompress_svgz(data)?;
            let text = std::str::from_utf8(&text).map_err(|_| Error::NotAnUtf8Str)?;
            Self::from_str(text, opt)
        } else {
            let text = std::str::from_utf8(data).map_err(|_| Error::NotAnUtf8Str)?;
            Self::from_str(text, opt)
        }
    }
}

/// Decompresses an SVGZ file.
pub fn decompress_svgz(data: &[u8]) -> Result<Vec<u8>, Error> {
    use std::io::Read;

    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decoded = Vec::with_capacity(data.len() * 2);
    decoder
        .read_to_end(&mut decoded)
        .map_err(|_| Error::MalformedGZip)?;
    Ok(decoded)
}
