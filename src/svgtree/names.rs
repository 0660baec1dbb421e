// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Closed sets of recognized element and attribute names.
//!
//! Names not listed here are invisible to the resolver.

macro_rules! define_names {
    ($enum_name:ident, $($string:literal => $variant:ident),+ $(,)?) => {
        #[allow(missing_docs)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum $enum_name {
            $($variant),+
        }

        impl $enum_name {
            /// Parses a name from an XML name.
            pub fn from_str(text: &str) -> Option<Self> {
                match text {
                    $($string => Some($enum_name::$variant)),+,
                    _ => None,
                }
            }

            /// Returns the original XML name.
            pub fn to_str(self) -> &'static str {
                match self {
                    $($enum_name::$variant => $string),+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            #[inline]
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.to_str())
            }
        }
    };
}

define_names!(EId,
    "a"                     => A,
    "circle"                => Circle,
    "clipPath"              => ClipPath,
    "defs"                  => Defs,
    "desc"                  => Desc,
    "ellipse"               => Ellipse,
    "feBlend"               => FeBlend,
    "feColorMatrix"         => FeColorMatrix,
    "feComponentTransfer"   => FeComponentTransfer,
    "feComposite"           => FeComposite,
    "feConvolveMatrix"      => FeConvolveMatrix,
    "feDiffuseLighting"     => FeDiffuseLighting,
    "feDisplacementMap"     => FeDisplacementMap,
    "feDistantLight"        => FeDistantLight,
    "feDropShadow"          => FeDropShadow,
    "feFlood"               => FeFlood,
    "feGaussianBlur"        => FeGaussianBlur,
    "feImage"               => FeImage,
    "feMerge"               => FeMerge,
    "feMergeNode"           => FeMergeNode,
    "feMorphology"          => FeMorphology,
    "feOffset"              => FeOffset,
    "fePointLight"          => FePointLight,
    "feSpecularLighting"    => FeSpecularLighting,
    "feSpotLight"           => FeSpotLight,
    "feTile"                => FeTile,
    "feTurbulence"          => FeTurbulence,
    "filter"                => Filter,
    "g"                     => G,
    "line"                  => Line,
    "linearGradient"        => LinearGradient,
    "marker"                => Marker,
    "path"                  => Path,
    "pattern"               => Pattern,
    "polygon"               => Polygon,
    "polyline"              => Polyline,
    "radialGradient"        => RadialGradient,
    "rect"                  => Rect,
    "stop"                  => Stop,
    "style"                 => Style,
    "svg"                   => Svg,
    "symbol"                => Symbol,
    "text"                  => Text,
    "title"                 => Title,
    "tspan"                 => Tspan,
    "use"                   => Use,
);

impl EId {
    /// Checks that the element is one of the graphic primitives.
    pub fn is_graphic(&self) -> bool {
        matches!(
            self,
            EId::Circle
                | EId::Ellipse
                | EId::Line
                | EId::Path
                | EId::Polygon
                | EId::Polyline
                | EId::Rect
                | EId::Text
                | EId::Use
        )
    }

    /// Checks that the element is a gradient.
    pub fn is_gradient(&self) -> bool {
        matches!(self, EId::LinearGradient | EId::RadialGradient)
    }

    /// Checks that the element is a paint server.
    pub fn is_paint_server(&self) -> bool {
        matches!(self, EId::LinearGradient | EId::RadialGradient | EId::Pattern)
    }

    /// Checks that the element is a filter primitive.
    pub fn is_filter_primitive(&self) -> bool {
        matches!(
            self,
            EId::FeBlend
                | EId::FeColorMatrix
                | EId::FeComponentTransfer
                | EId::FeComposite
                | EId::FeConvolveMatrix
                | EId::FeDiffuseLighting
                | EId::FeDisplacementMap
                | EId::FeDropShadow
                | EId::FeFlood
                | EId::FeGaussianBlur
                | EId::FeImage
                | EId::FeMerge
                | EId::FeMorphology
                | EId::FeOffset
                | EId::FeSpecularLighting
                | EId::FeTile
                | EId::FeTurbulence
        )
    }
}

define_names!(AId,
    "azimuth"               => Azimuth,
    "class"                 => Class,
    "clip-path"             => ClipPath,
    "clip-rule"             => ClipRule,
    "clipPathUnits"         => ClipPathUnits,
    "color"                 => Color,
    "cx"                    => Cx,
    "cy"                    => Cy,
    "d"                     => D,
    "display"               => Display,
    "dx"                    => Dx,
    "dy"                    => Dy,
    "elevation"             => Elevation,
    "fill"                  => Fill,
    "fill-opacity"          => FillOpacity,
    "fill-rule"             => FillRule,
    "filter"                => Filter,
    "filterUnits"           => FilterUnits,
    "font-family"           => FontFamily,
    "font-size"             => FontSize,
    "font-style"            => FontStyle,
    "font-weight"           => FontWeight,
    "fx"                    => Fx,
    "fy"                    => Fy,
    "gradientTransform"     => GradientTransform,
    "gradientUnits"         => GradientUnits,
    "height"                => Height,
    "href"                  => Href,
    "id"                    => Id,
    "in"                    => In,
    "in2"                   => In2,
    "k1"                    => K1,
    "k2"                    => K2,
    "k3"                    => K3,
    "k4"                    => K4,
    "lighting-color"        => LightingColor,
    "marker-end"            => MarkerEnd,
    "marker-mid"            => MarkerMid,
    "marker-start"          => MarkerStart,
    "markerHeight"          => MarkerHeight,
    "markerUnits"           => MarkerUnits,
    "markerWidth"           => MarkerWidth,
    "offset"                => Offset,
    "opacity"               => Opacity,
    "operator"              => Operator,
    "orient"                => Orient,
    "overflow"              => Overflow,
    "points"                => Points,
    "preserveAspectRatio"   => PreserveAspectRatio,
    "primitiveUnits"        => PrimitiveUnits,
    "r"                     => R,
    "refX"                  => RefX,
    "refY"                  => RefY,
    "result"                => Result,
    "rx"                    => Rx,
    "ry"                    => Ry,
    "space"                 => Space,
    "specularConstant"      => SpecularConstant,
    "specularExponent"      => SpecularExponent,
    "spreadMethod"          => SpreadMethod,
    "stdDeviation"          => StdDeviation,
    "stop-color"            => StopColor,
    "stop-opacity"          => StopOpacity,
    "stroke"                => Stroke,
    "stroke-dasharray"      => StrokeDasharray,
    "stroke-dashoffset"     => StrokeDashoffset,
    "stroke-linecap"        => StrokeLinecap,
    "stroke-linejoin"       => StrokeLinejoin,
    "stroke-miterlimit"     => StrokeMiterlimit,
    "stroke-opacity"        => StrokeOpacity,
    "stroke-width"          => StrokeWidth,
    "style"                 => Style,
    "surfaceScale"          => SurfaceScale,
    "transform"             => Transform,
    "viewBox"               => ViewBox,
    "visibility"            => Visibility,
    "width"                 => Width,
    "x"                     => X,
    "x1"                    => X1,
    "x2"                    => X2,
    "y"                     => Y,
    "y1"                    => Y1,
    "y2"                    => Y2,
    "z"                     => Z,
);

impl AId {
    /// Checks that the attribute is a presentation attribute.
    pub fn is_presentation(&self) -> bool {
        matches!(
            self,
            AId::ClipPath
                | AId::ClipRule
                | AId::Color
                | AId::Display
                | AId::Fill
                | AId::FillOpacity
                | AId::FillRule
                | AId::Filter
                | AId::FontFamily
                | AId::FontSize
                | AId::FontStyle
                | AId::FontWeight
                | AId::LightingColor
                | AId::MarkerEnd
                | AId::MarkerMid
                | AId::MarkerStart
                | AId::Opacity
                | AId::Overflow
                | AId::StopColor
                | AId::StopOpacity
                | AId::Stroke
                | AId::StrokeDasharray
                | AId::StrokeDashoffset
                | AId::StrokeLinecap
                | AId::StrokeLinejoin
                | AId::StrokeMiterlimit
                | AId::StrokeOpacity
                | AId::StrokeWidth
                | AId::Visibility
        )
    }

    /// Checks that the attribute value is inherited by descendants
    /// when not set.
    pub fn is_inheritable(&self) -> bool {
        if self.is_presentation() {
            !is_non_inheritable(*self)
        } else {
            false
        }
    }

    /// Checks that the attribute accepts the `inherit` keyword.
    pub fn allows_inherit_value(&self) -> bool {
        self.is_presentation()
    }

    pub(crate) fn is_horizontal(&self) -> bool {
        matches!(
            self,
            AId::X
                | AId::X1
                | AId::X2
                | AId::Cx
                | AId::Fx
                | AId::Dx
                | AId::Rx
                | AId::Width
                | AId::MarkerWidth
                | AId::RefX
        )
    }

    pub(crate) fn is_vertical(&self) -> bool {
        matches!(
            self,
            AId::Y
                | AId::Y1
                | AId::Y2
                | AId::Cy
                | AId::Fy
                | AId::Dy
                | AId::Ry
                | AId::Height
                | AId::MarkerHeight
                | AId::RefY
        )
    }
}

fn is_non_inheritable(id: AId) -> bool {
    matches!(
        id,
        AId::ClipPath
            | AId::Display
            | AId::Filter
            | AId::Opacity
            | AId::Overflow
            | AId::StopColor
            | AId::StopOpacity
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        assert_eq!(EId::from_str("linearGradient"), Some(EId::LinearGradient));
        assert_eq!(EId::LinearGradient.to_str(), "linearGradient");
        assert_eq!(AId::from_str("stroke-width"), Some(AId::StrokeWidth));
        assert_eq!(AId::StrokeWidth.to_str(), "stroke-width");
        assert_eq!(AId::from_str("bogus"), None);
    }

    #[test]
    fn inheritance() {
        assert!(AId::Fill.is_inheritable());
        assert!(AId::StrokeWidth.is_inheritable());
        assert!(!AId::Opacity.is_inheritable());
        assert!(!AId::Transform.is_inheritable());
        assert!(!AId::ClipPath.is_inheritable());
    }
}
