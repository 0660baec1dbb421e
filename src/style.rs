// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use strict_num::NonZeroPositiveF64;

use crate::converter;
use crate::element::SvgElement;
use crate::geom::{FuzzyZero, Rect};
use crate::paint_server::{self, LinearGradient, RadialGradient};
use crate::svgtree::{AId, AttributeValue};
use crate::Opacity;

/// An alias to `NonZeroPositiveF64`.
pub type StrokeWidth = NonZeroPositiveF64;

/// A `stroke-miterlimit` value.
///
/// Just like `f64` but immutable and guarantee to be >= 1.0.
#[derive(Clone, Copy, Debug)]
pub struct StrokeMiterlimit(f64);

impl StrokeMiterlimit {
    /// Creates a new `StrokeMiterlimit` value.
    #[inline]
    pub fn new(n: f64) -> Self {
        let n = if n.is_finite() && n >= 1.0 { n } else { 1.0 };
        StrokeMiterlimit(n)
    }

    /// Returns an underlying value.
    #[inline]
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for StrokeMiterlimit {
    #[inline]
    fn default() -> Self {
        StrokeMiterlimit::new(4.0)
    }
}

/// A line cap.
///
/// `stroke-linecap` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl_enum_default!(LineCap, Butt);

impl_enum_from_str!(LineCap,
    "butt"   => LineCap::Butt,
    "round"  => LineCap::Round,
    "square" => LineCap::Square
);

/// A line join.
///
/// `stroke-linejoin` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl_enum_default!(LineJoin, Miter);

impl_enum_from_str!(LineJoin,
    "miter" => LineJoin::Miter,
    "round" => LineJoin::Round,
    "bevel" => LineJoin::Bevel
);

/// A fill rule.
///
/// `fill-rule` attribute in the SVG.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl_enum_default!(FillRule, NonZero);

impl_enum_from_str!(FillRule,
    "nonzero" => FillRule::NonZero,
    "evenodd" => FillRule::EvenOdd
);

/// A 8-bit RGB color.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Constructs a new `Color` from RGB values.
    #[inline]
    pub fn new_rgb(red: u8, green: u8, blue: u8) -> Color {
        Color { red, green, blue }
    }

    /// Constructs a new `Color` set to black.
    #[inline]
    pub fn black() -> Color {
        Color::new_rgb(0, 0, 0)
    }
}

pub(crate) trait SvgColorExt {
    fn split_alpha(self) -> (Color, Opacity);
}

impl SvgColorExt for svgtypes::Color {
    fn split_alpha(self) -> (Color, Opacity) {
        (
            Color::new_rgb(self.red, self.green, self.blue),
            Opacity::new_clamped(f64::from(self.alpha) / 255.0),
        )
    }
}

/// A paint style.
///
/// Gradient coordinates are fully resolved into user space,
/// including bounding-box units.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum Paint {
    Color(Color),
    LinearGradient(Rc<LinearGradient>),
    RadialGradient(Rc<RadialGradient>),
}

impl PartialEq for Paint {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Color(lc), Self::Color(rc)) => lc == rc,
            (Self::LinearGradient(ref lg1), Self::LinearGradient(ref lg2)) => Rc::ptr_eq(lg1, lg2),
            (Self::RadialGradient(ref rg1), Self::RadialGradient(ref rg2)) => Rc::ptr_eq(rg1, rg2),
            _ => false,
        }
    }
}

/// A fill style.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct Fill {
    pub paint: Paint,
    pub opacity: Opacity,
    pub rule: FillRule,
}

impl Default for Fill {
    fn default() -> Self {
        Fill {
            paint: Paint::Color(Color::black()),
            opacity: Opacity::ONE,
            rule: FillRule::default(),
        }
    }
}

/// A stroke style.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct Stroke {
    pub paint: Paint,
    pub dasharray: Option<Vec<f64>>,
    pub dashoffset: f64,
    pub miterlimit: StrokeMiterlimit,
    pub opacity: Opacity,
    pub width: StrokeWidth,
    pub linecap: LineCap,
    pub linejoin: LineJoin,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            // The actual default color is `none`,
            // but to simplify the `Stroke` object creation we use `black`.
            paint: Paint::Color(Color::black()),
            dasharray: None,
            dashoffset: 0.0,
            miterlimit: StrokeMiterlimit::default(),
            opacity: Opacity::ONE,
            width: StrokeWidth::new(1.0).unwrap(),
            linecap: LineCap::default(),
            linejoin: LineJoin::default(),
        }
    }
}

pub(crate) fn resolve_fill(
    element: &SvgElement,
    bbox: Option<Rect>,
    state: &converter::State,
    cache: &mut converter::Cache,
) -> Option<Fill> {
    let mut sub_opacity = Opacity::ONE;
    let paint = if let Some((found, value)) = element.find_value_with_source(AId::Fill) {
        convert_paint(&found, value, bbox, state, &mut sub_opacity, cache)?
    } else {
        Paint::Color(Color::black())
    };

    let fill_opacity = element
        .find_attribute::<Opacity>(AId::FillOpacity)
        .unwrap_or(Opacity::ONE);

    Some(Fill {
        paint,
        opacity: Opacity::new_clamped(
            sub_opacity.get() * fill_opacity.get() * element.effective_opacity().get(),
        ),
        rule: element.find_attribute(AId::FillRule).unwrap_or_default(),
    })
}

pub(crate) fn resolve_stroke(
    element: &SvgElement,
    bbox: Option<Rect>,
    state: &converter::State,
    cache: &mut converter::Cache,
) -> Option<Stroke> {
    let mut sub_opacity = Opacity::ONE;
    let paint = if let Some((found, value)) = element.find_value_with_source(AId::Stroke) {
        convert_paint(&found, value, bbox, state, &mut sub_opacity, cache)?
    } else {
        return None;
    };

    let width = element.resolve_valid_length(AId::StrokeWidth, state, 1.0)?;

    // Must be bigger than 1.
    let miterlimit = element
        .find_attribute(AId::StrokeMiterlimit)
        .unwrap_or(4.0);
    let miterlimit = StrokeMiterlimit::new(miterlimit);

    let stroke_opacity = element
        .find_attribute::<Opacity>(AId::StrokeOpacity)
        .unwrap_or(Opacity::ONE);

    let stroke = Stroke {
        paint,
        dasharray: conv_dasharray(element, state),
        dashoffset: element.resolve_length(AId::StrokeDashoffset, state, 0.0),
        miterlimit,
        opacity: Opacity::new_clamped(
            sub_opacity.get() * stroke_opacity.get() * element.effective_opacity().get(),
        ),
        width: StrokeWidth::new(width)?,
        linecap: element.find_attribute(AId::StrokeLinecap).unwrap_or_default(),
        linejoin: element
            .find_attribute(AId::StrokeLinejoin)
            .unwrap_or_default(),
    };

    Some(stroke)
}

fn convert_paint(
    element: &SvgElement,
    value: AttributeValue,
    bbox: Option<Rect>,
    state: &converter::State,
    opacity: &mut Opacity,
    cache: &mut converter::Cache,
) -> Option<Paint> {
    match value {
        AttributeValue::None => None,
        AttributeValue::CurrentColor => {
            let svg_color: svgtypes::Color = element
                .find_attribute(AId::Color)
                .unwrap_or_else(svgtypes::Color::black);
            let (color, alpha) = svg_color.split_alpha();
            *opacity = alpha;
            Some(Paint::Color(color))
        }
        AttributeValue::Color(svg_color) => {
            let (color, alpha) = svg_color.split_alpha();
            *opacity = alpha;
            Some(Paint::Color(color))
        }
        AttributeValue::ContextFill => match state.context_fill.clone() {
            Some(paint) => Some(paint),
            None => {
                log::warn!("'context-fill' is used outside of a context element.");
                None
            }
        },
        AttributeValue::ContextStroke => match state.context_stroke.clone() {
            Some(paint) => Some(paint),
            None => {
                log::warn!("'context-stroke' is used outside of a context element.");
                None
            }
        },
        AttributeValue::Paint(ref func_iri, fallback) => {
            if let Some(link) = element.document().element_by_id(func_iri) {
                let tag_name = link.tag_name().unwrap();
                if tag_name.is_gradient() {
                    match paint_server::convert(link, state, cache) {
                        Some(paint_server::ServerOrColor::Server(server)) => {
                            match paint_server::instantiate(&server, bbox) {
                                Some(paint) => Some(paint),
                                // A bounding-box gradient on a shape
                                // without a bounding box.
                                None => from_fallback(element, fallback, opacity),
                            }
                        }
                        Some(paint_server::ServerOrColor::Color {
                            color,
                            opacity: so,
                        }) => {
                            *opacity = so;
                            Some(Paint::Color(color))
                        }
                        None => from_fallback(element, fallback, opacity),
                    }
                } else if tag_name == crate::svgtree::EId::Pattern {
                    log::warn!("Pattern fills are not supported.");
                    from_fallback(element, fallback, opacity)
                } else {
                    log::warn!("'{}' cannot be used to paint a shape.", tag_name);
                    None
                }
            } else {
                from_fallback(element, fallback, opacity)
            }
        }
        _ => None,
    }
}

fn from_fallback(
    element: &SvgElement,
    fallback: Option<svgtypes::PaintFallback>,
    opacity: &mut Opacity,
) -> Option<Paint> {
    match fallback? {
        svgtypes::PaintFallback::None => None,
        svgtypes::PaintFallback::CurrentColor => {
            let svg_color: svgtypes::Color = element
                .find_attribute(AId::Color)
                .unwrap_or_else(svgtypes::Color::black);
            let (color, alpha) = svg_color.split_alpha();
            *opacity = alpha;
            Some(Paint::Color(color))
        }
        svgtypes::PaintFallback::Color(svg_color) => {
            let (color, alpha) = svg_color.split_alpha();
            *opacity = alpha;
            Some(Paint::Color(color))
        }
    }
}

// Prepare the 'stroke-dasharray' according to:
// https://www.w3.org/TR/SVG11/painting.html#StrokeDasharrayProperty
fn conv_dasharray(element: &SvgElement, state: &converter::State) -> Option<Vec<f64>> {
    if let Some(AttributeValue::None) = element.find_value(AId::StrokeDasharray) {
        return None;
    }

    let list = crate::units::convert_list(element, AId::StrokeDasharray, state)?;

    // `A negative value is an error`
    if list.iter().any(|n| n.is_sign_negative()) {
        return None;
    }

    // `If the sum of the values is zero, then the stroke is rendered
    // as if a value of none were specified.`
    {
        // no Iter::sum(), because of f64

        let mut sum = 0.0f64;
        for n in list.iter() {
            sum += *n;
        }

        if sum.is_fuzzy_zero() {
            return None;
        }
    }

    // `If an odd number of values is provided, then the list of values
    // is repeated to yield an even number of values.`
    if list.len() % 2 != 0 {
        let mut tmp_list = list.clone();
        tmp_list.extend_from_slice(&list);
        return Some(tmp_list);
    }

    Some(list)
}
