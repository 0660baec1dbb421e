// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::converter;
use crate::element::SvgElement;
use crate::svgtree::AId;
use crate::Units;

/// A length unit.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Unit {
    None,
    Px,
    Em,
    Rem,
    Ex,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    M,
    Percent,
}

/// A length.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Length {
    /// Length number.
    pub number: f64,
    /// Length unit.
    pub unit: Unit,
}

impl Length {
    /// Creates a new length.
    #[inline]
    pub fn new(number: f64, unit: Unit) -> Self {
        Length { number, unit }
    }

    /// Creates a new length in user units.
    #[inline]
    pub fn new_number(number: f64) -> Self {
        Length {
            number,
            unit: Unit::None,
        }
    }

    /// Creates a zero length.
    #[inline]
    pub fn zero() -> Self {
        Length::new_number(0.0)
    }
}

impl Default for Length {
    fn default() -> Self {
        Length::zero()
    }
}

impl std::str::FromStr for Length {
    type Err = svgtypes::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut s = svgtypes::Stream::from(text);
        s.skip_spaces();
        let number = s.parse_number()?;

        // The longest matching suffix wins, so `mm` is checked before `m`
        // and `rem` before `em`.
        const UNITS: &[(&[u8], Unit)] = &[
            (b"%", Unit::Percent),
            (b"px", Unit::Px),
            (b"pt", Unit::Pt),
            (b"pc", Unit::Pc),
            (b"rem", Unit::Rem),
            (b"em", Unit::Em),
            (b"ex", Unit::Ex),
            (b"in", Unit::In),
            (b"cm", Unit::Cm),
            (b"mm", Unit::Mm),
            (b"m", Unit::M),
        ];

        let mut unit = Unit::None;
        for &(text, u) in UNITS {
            if s.starts_with(text) {
                s.advance(text.len());
                unit = u;
                break;
            }
        }

        s.skip_spaces();
        if !s.at_end() {
            return Err(svgtypes::Error::InvalidValue);
        }

        Ok(Length { number, unit })
    }
}

/// Converts a `Length` into a user-space number.
///
/// Percentages resolve against the current view box, or become a unit
/// fraction when `object_units` is `ObjectBoundingBox`.
pub(crate) fn convert_length(
    length: Length,
    element: &SvgElement,
    aid: AId,
    object_units: Units,
    state: &converter::State,
) -> f64 {
    let dpi = state.opt.dpi;
    let n = length.number;
    match length.unit {
        Unit::None | Unit::Px => n,
        Unit::Em => n * resolve_font_size(element, state),
        Unit::Rem => n * state.opt.font_size,
        Unit::Ex => n * resolve_font_size(element, state) / 2.0,
        Unit::In => n * dpi,
        Unit::Cm => n * dpi / 2.54,
        Unit::Mm => n * dpi / 25.4,
        Unit::M => n * dpi / 0.0254,
        Unit::Pt => n * dpi / 72.0,
        Unit::Pc => n * dpi / 6.0,
        Unit::Percent => {
            if object_units == Units::ObjectBoundingBox {
                n / 100.0
            } else {
                let view_box = state.view_box;

                if aid.is_horizontal() {
                    convert_percent(length, view_box.width())
                } else if aid.is_vertical() {
                    convert_percent(length, view_box.height())
                } else {
                    let vb_len = (view_box.width() * view_box.width()
                        + view_box.height() * view_box.height())
                    .sqrt()
                        / std::f64::consts::SQRT_2;

                    convert_percent(length, vb_len)
                }
            }
        }
    }
}

/// Converts a length list attribute into user-space numbers.
pub(crate) fn convert_list(
    element: &SvgElement,
    aid: AId,
    state: &converter::State,
) -> Option<Vec<f64>> {
    let text: String = element.find_attribute(aid)?;

    let mut list = Vec::new();
    for token in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        match token.parse::<Length>() {
            Ok(length) => {
                list.push(convert_length(
                    length,
                    element,
                    aid,
                    Units::UserSpaceOnUse,
                    state,
                ));
            }
            Err(_) => {
                log::warn!("Failed to parse a length list value: '{}'.", text);
                return None;
            }
        }
    }

    Some(list)
}

fn convert_percent(length: Length, base: f64) -> f64 {
    base * length.number / 100.0
}

/// Resolves the font size of an element through the cascade.
///
/// Relative units accumulate down the ancestor chain.
pub(crate) fn resolve_font_size(element: &SvgElement, state: &converter::State) -> f64 {
    let mut chain = vec![element.clone()];
    let mut current = element.clone();
    while let Some(parent) = current.parent_element() {
        chain.push(parent.clone());
        current = parent;
    }

    let mut font_size = state.opt.font_size;
    for el in chain.iter().rev() {
        if let Some(length) = el.attribute::<Length>(AId::FontSize) {
            let dpi = state.opt.dpi;
            let n = length.number;
            font_size = match length.unit {
                Unit::None | Unit::Px => n,
                Unit::Em => n * font_size,
                Unit::Rem => n * state.opt.font_size,
                Unit::Ex => n * font_size / 2.0,
                Unit::In => n * dpi,
                Unit::Cm => n * dpi / 2.54,
                Unit::Mm => n * dpi / 25.4,
                Unit::M => n * dpi / 0.0254,
                Unit::Pt => n * dpi / 72.0,
                Unit::Pc => n * dpi / 6.0,
                // Relative to the parent font size.
                Unit::Percent => length.number * font_size * 0.01,
            }
        } else if let Some(name) = el.attribute::<String>(AId::FontSize) {
            font_size = convert_named_font_size(&name, font_size);
        }
    }

    font_size
}

fn convert_named_font_size(name: &str, parent_font_size: f64) -> f64 {
    let factor = match name {
        "xx-small" => -3,
        "x-small" => -2,
        "small" => -1,
        "medium" => 0,
        "large" => 1,
        "x-large" => 2,
        "xx-large" => 3,
        "smaller" => -1,
        "larger" => 1,
        _ => {
            log::warn!("Invalid 'font-size' value: '{}'.", name);
            0
        }
    };

    // 'On a computer screen a scaling factor of 1.2 is suggested
    // between adjacent indexes.'
    parent_font_size * 1.2f64.powi(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lengths() {
        assert_eq!("10".parse::<Length>().unwrap(), Length::new_number(10.0));
        assert_eq!(
            "-10px".parse::<Length>().unwrap(),
            Length::new(-10.0, Unit::Px)
        );
        assert_eq!(
            "1.5rem".parse::<Length>().unwrap(),
            Length::new(1.5, Unit::Rem)
        );
        assert_eq!("2m".parse::<Length>().unwrap(), Length::new(2.0, Unit::M));
        assert_eq!(
            "25mm".parse::<Length>().unwrap(),
            Length::new(25.0, Unit::Mm)
        );
        assert_eq!(
            "50%".parse::<Length>().unwrap(),
            Length::new(50.0, Unit::Percent)
        );
    }

    #[test]
    fn parse_invalid_lengths() {
        assert!("abc".parse::<Length>().is_err());
        assert!("10zz".parse::<Length>().is_err());
        assert!("10 20".parse::<Length>().is_err());
        assert!("".parse::<Length>().is_err());
    }
}
