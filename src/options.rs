// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use crate::geom::Size;
use crate::pathdata::PathData;

/// Processing options.
pub struct Options {
    /// Target DPI.
    ///
    /// Affects units conversion.
    ///
    /// Default: 96.0
    pub dpi: f64,

    /// A default font family.
    ///
    /// Will be used when no `font-family` attribute is set in the SVG.
    ///
    /// Default: Times New Roman
    pub font_family: String,

    /// A default font size.
    ///
    /// Will be used when no `font-size` attribute is set in the SVG.
    /// Also the base for `rem` units.
    ///
    /// Default: 12
    pub font_size: f64,

    /// The fallback viewport size.
    ///
    /// Used when the document has no `width`/`height` and no `viewBox`.
    ///
    /// Default: 100x100
    pub default_size: Size,

    /// Require the SVG namespace on elements.
    ///
    /// When disabled, elements without any namespace are accepted too.
    ///
    /// Default: false (lenient)
    pub strict_namespaces: bool,

    /// An external text-shaping service.
    ///
    /// Converts font attributes plus a string into outline geometry.
    /// Without one, `text` elements are skipped with a warning.
    ///
    /// Default: None
    pub shaper: Option<Rc<dyn OutlineShaper>>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            dpi: 96.0,
            font_family: "Times New Roman".to_string(),
            font_size: 12.0,
            default_size: Size::new(100.0, 100.0).unwrap(),
            strict_namespaces: false,
            shaper: None,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("dpi", &self.dpi)
            .field("font_family", &self.font_family)
            .field("font_size", &self.font_size)
            .field("default_size", &self.default_size)
            .field("strict_namespaces", &self.strict_namespaces)
            .field("shaper", &self.shaper.as_ref().map(|_| "<dyn OutlineShaper>"))
            .finish()
    }
}

/// A font description passed to the text-shaping service.
#[derive(Clone, PartialEq, Debug)]
pub struct FontDescription {
    /// Resolved `font-family`.
    pub family: String,
    /// Resolved `font-size`, in user units.
    pub size: f64,
    /// Whether `font-style` resolved to `italic`.
    pub italic: bool,
    /// Resolved `font-weight`: 100..=900.
    pub weight: u16,
}

/// An external glyph-outline generator.
///
/// The resolver itself never touches font files: it hands the cascaded
/// font description and the text content to this collaborator and
/// converts the returned geometry like any other path.
pub trait OutlineShaper {
    /// Converts a string into outline geometry.
    ///
    /// The returned path is expected to be positioned at the origin;
    /// the resolver applies the text position itself.
    fn outline(&self, text: &str, font: &FontDescription) -> Option<PathData>;
}
