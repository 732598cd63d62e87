//! Normalized coordinate frame derived from the bounds of a target set.
//!
//! Every sampler sees positions through a [`BoundingFrame`]: a point's
//! coordinate on an axis is mapped to `(p - min) / (max - min)`, so the
//! selection's bounding box spans `[0, 1]` on each axis it actually extends
//! along. Axes with zero extent have no normalized coordinate at all; the
//! field sampler skips them, image sampling refuses them.

use super::{Axis, BBox, Point3, Tolerance};

/// Errors raised while building or querying a frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("cannot derive a frame from an empty set of points")]
    Empty,
    #[error("frame bounds must be finite")]
    NonFinite,
    #[error("selection has zero extent along {axis}")]
    DegenerateExtent { axis: Axis },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingFrame {
    bounds: BBox,
    tol: Tolerance,
}

impl BoundingFrame {
    /// Frame around an existing box.
    pub fn from_bbox(bounds: BBox) -> Result<Self, FrameError> {
        if !bounds.min.is_finite() || !bounds.max.is_finite() {
            return Err(FrameError::NonFinite);
        }
        Ok(Self {
            bounds,
            tol: Tolerance::ZERO_LENGTH,
        })
    }

    /// Frame around a set of representative points.
    pub fn from_points(points: &[Point3]) -> Result<Self, FrameError> {
        let bounds = BBox::from_points(points).ok_or(FrameError::Empty)?;
        Self::from_bbox(bounds)
    }

    /// Frame around the union of a set of boxes.
    pub fn from_boxes<I>(boxes: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = BBox>,
    {
        let bounds = boxes
            .into_iter()
            .reduce(BBox::union)
            .ok_or(FrameError::Empty)?;
        Self::from_bbox(bounds)
    }

    #[must_use]
    pub const fn bounds(&self) -> BBox {
        self.bounds
    }

    #[must_use]
    pub fn extent(&self, axis: Axis) -> f64 {
        self.bounds.max.get(axis) - self.bounds.min.get(axis)
    }

    #[must_use]
    pub fn is_degenerate(&self, axis: Axis) -> bool {
        self.tol.approx_zero_f64(self.extent(axis))
    }

    /// Normalized coordinate of `point` on `axis`, or `None` when the frame
    /// has no extent along that axis. Not clamped: points outside the
    /// bounds map outside `[0, 1]`.
    #[must_use]
    pub fn normalize(&self, point: Point3, axis: Axis) -> Option<f64> {
        if self.is_degenerate(axis) {
            return None;
        }
        Some((point.get(axis) - self.bounds.min.get(axis)) / self.extent(axis))
    }

    /// Like [`normalize`](Self::normalize), but a degenerate axis is an error.
    pub fn require(&self, point: Point3, axis: Axis) -> Result<f64, FrameError> {
        self.normalize(point, axis)
            .ok_or(FrameError::DegenerateExtent { axis })
    }

    /// Fails when any of `axes` has zero extent.
    pub fn require_extent(&self, axes: &[Axis]) -> Result<(), FrameError> {
        match axes.iter().find(|axis| self.is_degenerate(**axis)) {
            Some(axis) => Err(FrameError::DegenerateExtent { axis: *axis }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_frame() -> BoundingFrame {
        BoundingFrame::from_points(&[Point3::new(-1.0, 2.0, 5.0), Point3::new(3.0, 6.0, 5.0)])
            .unwrap()
    }

    #[test]
    fn corners_map_to_zero_and_one() {
        let frame = unit_frame();
        let min = frame.bounds().min;
        let max = frame.bounds().max;
        for axis in [Axis::X, Axis::Y] {
            assert_eq!(frame.normalize(min, axis), Some(0.0));
            assert_eq!(frame.normalize(max, axis), Some(1.0));
        }
        assert_eq!(frame.normalize(Point3::new(1.0, 4.0, 5.0), Axis::X), Some(0.5));
    }

    #[test]
    fn flat_axis_is_undefined() {
        let frame = unit_frame();
        assert!(frame.is_degenerate(Axis::Z));
        assert_eq!(frame.normalize(Point3::new(0.0, 0.0, 5.0), Axis::Z), None);
        assert_eq!(
            frame.require_extent(&[Axis::X, Axis::Z]),
            Err(FrameError::DegenerateExtent { axis: Axis::Z })
        );
        assert!(frame.require_extent(&[Axis::X, Axis::Y]).is_ok());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(BoundingFrame::from_points(&[]), Err(FrameError::Empty));
        assert_eq!(
            BoundingFrame::from_boxes(std::iter::empty::<BBox>()),
            Err(FrameError::Empty)
        );
    }

    #[test]
    fn union_of_boxes() {
        let frame = BoundingFrame::from_boxes([
            BBox::new(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0)),
            BBox::new(Point3::new(4.0, -1.0, 0.0), Point3::new(5.0, 0.0, 2.0)),
        ])
        .unwrap();
        assert_eq!(frame.extent(Axis::X), 5.0);
        assert_eq!(frame.extent(Axis::Y), 2.0);
        assert_eq!(frame.extent(Axis::Z), 2.0);
    }
}
