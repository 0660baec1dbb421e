// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use kurbo::ParamCurveExtrema;

use crate::geom::{Rect, Transform};

/// A path's absolute segment.
///
/// Unlike the SVG spec, can contain only `M`, `L`, `C`, `Q` and `Z` segments.
/// All other segments will be converted into these one.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub enum PathSegment {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    CurveTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    QuadTo {
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
    },
    ClosePath,
}

/// An SVG path data container.
///
/// All segments are in absolute coordinates.
#[derive(Clone, Default, Debug)]
pub struct PathData(pub Vec<PathSegment>);

/// A reference-counted `PathData`.
///
/// `PathData` is usually pretty big and it's expensive to clone it,
/// so we are using `Rc`.
pub type SharedPathData = Rc<PathData>;

impl PathData {
    /// Creates a new path.
    #[inline]
    pub fn new() -> Self {
        PathData(Vec::new())
    }

    /// Creates a new path with a specified capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        PathData(Vec::with_capacity(capacity))
    }

    /// Creates a path from a rect.
    #[inline]
    pub fn from_rect(rect: Rect) -> Self {
        let mut path = PathData::with_capacity(5);
        path.push_rect(rect);
        path
    }

    /// Pushes a MoveTo segment to the path.
    #[inline]
    pub fn push_move_to(&mut self, x: f64, y: f64) {
        self.push(PathSegment::MoveTo { x, y });
    }

    /// Pushes a LineTo segment to the path.
    #[inline]
    pub fn push_line_to(&mut self, x: f64, y: f64) {
        self.push(PathSegment::LineTo { x, y });
    }

    /// Pushes a CurveTo segment to the path.
    #[inline]
    pub fn push_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.push(PathSegment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    /// Pushes a QuadTo segment to the path.
    #[inline]
    pub fn push_quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.push(PathSegment::QuadTo { x1, y1, x, y });
    }

    /// Pushes an ArcTo segment to the path.
    ///
    /// The arc is converted into cubic curves using the standard
    /// endpoint-to-center parameterization. A zero radius produces
    /// a straight line.
    pub fn push_arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) {
        let (prev_x, prev_y) = self.last_pos();

        let svg_arc = kurbo::SvgArc {
            from: kurbo::Point::new(prev_x, prev_y),
            to: kurbo::Point::new(x, y),
            radii: kurbo::Vec2::new(rx, ry),
            x_rotation: x_axis_rotation.to_radians(),
            large_arc,
            sweep,
        };

        match kurbo::Arc::from_svg_arc(&svg_arc) {
            Some(arc) => {
                arc.to_cubic_beziers(0.1, |p1, p2, p| {
                    self.push_curve_to(p1.x, p1.y, p2.x, p2.y, p.x, p.y);
                });
            }
            None => {
                self.push_line_to(x, y);
            }
        }
    }

    /// Pushes a ClosePath segment to the path.
    #[inline]
    pub fn push_close_path(&mut self) {
        self.push(PathSegment::ClosePath);
    }

    /// Pushes a rect to the path.
    #[inline]
    pub fn push_rect(&mut self, rect: Rect) {
        self.extend_from_slice(&[
            PathSegment::MoveTo {
                x: rect.x(),
                y: rect.y(),
            },
            PathSegment::LineTo {
                x: rect.right(),
                y: rect.y(),
            },
            PathSegment::LineTo {
                x: rect.right(),
                y: rect.bottom(),
            },
            PathSegment::LineTo {
                x: rect.x(),
                y: rect.bottom(),
            },
            PathSegment::ClosePath,
        ]);
    }

    #[inline]
    fn last_pos(&self) -> (f64, f64) {
        let seg = self.last().expect("path must not be empty");
        match seg {
            PathSegment::MoveTo { x, y }
            | PathSegment::LineTo { x, y }
            | PathSegment::CurveTo { x, y, .. }
            | PathSegment::QuadTo { x, y, .. } => (*x, *y),
            PathSegment::ClosePath => {
                panic!("the previous segment must be M/L/C/Q")
            }
        }
    }

    /// Calculates path's bounding box.
    ///
    /// Returns `None` for paths with a zero area.
    ///
    /// This operation is expensive.
    pub fn bbox(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }

        let mut prev_x = 0.0;
        let mut prev_y = 0.0;
        let mut minx = 0.0;
        let mut miny = 0.0;
        let mut maxx = 0.0;
        let mut maxy = 0.0;

        if let PathSegment::MoveTo { x, y } = self.0[0] {
            prev_x = x;
            prev_y = y;
            minx = x;
            miny = y;
            maxx = x;
            maxy = y;
        }

        fn expand(r: kurbo::Rect, minx: &mut f64, miny: &mut f64, maxx: &mut f64, maxy: &mut f64) {
            if r.x0 < *minx {
                *minx = r.x0;
            }
            if r.x1 > *maxx {
                *maxx = r.x1;
            }
            if r.y0 < *miny {
                *miny = r.y0;
            }
            if r.y1 > *maxy {
                *maxy = r.y1;
            }
        }

        for seg in self.iter().cloned() {
            match seg {
                PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } => {
                    prev_x = x;
                    prev_y = y;

                    if x > maxx {
                        maxx = x;
                    } else if x < minx {
                        minx = x;
                    }

                    if y > maxy {
                        maxy = y;
                    } else if y < miny {
                        miny = y;
                    }
                }
                PathSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let curve = kurbo::CubicBez::new(
                        kurbo::Point::new(prev_x, prev_y),
                        kurbo::Point::new(x1, y1),
                        kurbo::Point::new(x2, y2),
                        kurbo::Point::new(x, y),
                    );
                    expand(
                        curve.bounding_box(),
                        &mut minx,
                        &mut miny,
                        &mut maxx,
                        &mut maxy,
                    );
                    prev_x = x;
                    prev_y = y;
                }
                PathSegment::QuadTo { x1, y1, x, y } => {
                    let curve = kurbo::QuadBez::new(
                        kurbo::Point::new(prev_x, prev_y),
                        kurbo::Point::new(x1, y1),
                        kurbo::Point::new(x, y),
                    );
                    expand(
                        curve.bounding_box(),
                        &mut minx,
                        &mut miny,
                        &mut maxx,
                        &mut maxy,
                    );
                    prev_x = x;
                    prev_y = y;
                }
                PathSegment::ClosePath => {}
            }
        }

        Rect::new(minx, miny, maxx - minx, maxy - miny)
    }

    /// Checks that the path has a bounding box with a non-zero area.
    ///
    /// This operation is expensive.
    #[inline]
    pub fn has_bbox(&self) -> bool {
        self.bbox().is_some()
    }

    /// Applies the transform to the path.
    pub fn transform(&mut self, ts: Transform) {
        for seg in self.iter_mut() {
            match seg {
                PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } => {
                    ts.apply_to(x, y);
                }
                PathSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    ts.apply_to(x1, y1);
                    ts.apply_to(x2, y2);
                    ts.apply_to(x, y);
                }
                PathSegment::QuadTo { x1, y1, x, y } => {
                    ts.apply_to(x1, y1);
                    ts.apply_to(x, y);
                }
                PathSegment::ClosePath => {}
            }
        }
    }
}

impl std::ops::Deref for PathData {
    type Target = Vec<PathSegment>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for PathData {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_to_curves() {
        let mut path = PathData::new();
        path.push_move_to(0.0, 0.0);
        path.push_arc_to(50.0, 50.0, 0.0, false, true, 100.0, 0.0);

        // Must be converted into cubic curves.
        assert!(path
            .iter()
            .skip(1)
            .all(|seg| matches!(seg, PathSegment::CurveTo { .. })));

        // The endpoint is the arc endpoint.
        if let Some(PathSegment::CurveTo { x, y, .. }) = path.last() {
            assert!((x - 100.0).abs() < 1e-6);
            assert!(y.abs() < 1e-6);
        } else {
            panic!("expected a curve");
        }

        // A half-circle above the baseline.
        let bbox = path.bbox().unwrap();
        assert!((bbox.height() - 50.0).abs() < 0.5);
        assert!((bbox.width() - 100.0).abs() < 0.5);
    }

    #[test]
    fn zero_radius_arc() {
        let mut path = PathData::new();
        path.push_move_to(10.0, 10.0);
        path.push_arc_to(0.0, 0.0, 0.0, false, true, 100.0, 10.0);

        assert!(matches!(
            path.last(),
            Some(PathSegment::LineTo { x, y }) if *x == 100.0 && *y == 10.0
        ));
    }

    #[test]
    fn degenerate_bbox() {
        let mut path = PathData::new();
        path.push_move_to(0.0, 0.0);
        path.push_line_to(10.0, 0.0);

        // A horizontal line has no area.
        assert!(path.bbox().is_none());
        assert!(!path.has_bbox());
    }

    #[test]
    fn quad_bbox() {
        let mut path = PathData::new();
        path.push_move_to(0.0, 0.0);
        path.push_quad_to(5.0, 10.0, 10.0, 0.0);

        let bbox = path.bbox().unwrap();
        // The quad apex is at half the control point height.
        assert!((bbox.height() - 5.0).abs() < 1e-6);
    }
}
