//! Turning a sampled scalar into a geometric change.
//!
//! [`synthesize`] maps a scalar and a [`TransformKind`] to one affine
//! transform about a pivot. [`Effect`] is what a batch does with each scalar:
//! apply a synthesized transform, displace points, or push/pull a face.

use serde::{Deserialize, Serialize};

use crate::geom::{Axis, Point3, Transform, Vec3};
use crate::params::Choice;

/// How a scalar becomes a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformKind {
    #[default]
    UniformScale,
    Scale(Axis),
    /// Rotation by `scalar` degrees, right-handed about the axis.
    Rotate(Axis),
    /// Translation by `scalar` model units.
    Translate(Axis),
}

impl TransformKind {
    /// Whether the scalar is a distance, so multipliers are lengths.
    #[must_use]
    pub const fn is_motion(self) -> bool {
        matches!(self, Self::Translate(_))
    }
}

impl Choice for TransformKind {
    const ALL: &'static [Self] = &[
        Self::UniformScale,
        Self::Scale(Axis::X),
        Self::Scale(Axis::Y),
        Self::Scale(Axis::Z),
        Self::Rotate(Axis::X),
        Self::Rotate(Axis::Y),
        Self::Rotate(Axis::Z),
        Self::Translate(Axis::X),
        Self::Translate(Axis::Y),
        Self::Translate(Axis::Z),
    ];

    fn label(self) -> &'static str {
        match self {
            Self::UniformScale => "Uniform Scaling",
            Self::Scale(Axis::X) => "Scaling in RED",
            Self::Scale(Axis::Y) => "Scaling in GREEN",
            Self::Scale(Axis::Z) => "Scaling in BLUE",
            Self::Rotate(Axis::X) => "Rotation about RED",
            Self::Rotate(Axis::Y) => "Rotation about GREEN",
            Self::Rotate(Axis::Z) => "Rotation about BLUE",
            Self::Translate(Axis::X) => "Motion in RED",
            Self::Translate(Axis::Y) => "Motion in GREEN",
            Self::Translate(Axis::Z) => "Motion in BLUE",
        }
    }
}

/// Affine transform for `scalar` under `kind`, acting about `pivot`.
#[must_use]
pub fn synthesize(scalar: f64, kind: TransformKind, pivot: Point3) -> Transform {
    let at_origin = match kind {
        TransformKind::UniformScale => Transform::uniform_scale(scalar),
        TransformKind::Scale(axis) => Transform::scale(Vec3::on_axis(axis, scalar, 1.0)),
        TransformKind::Rotate(axis) => Transform::rotate(axis, scalar.to_radians()),
        TransformKind::Translate(axis) => {
            return Transform::translate(Vec3::on_axis(axis, scalar, 0.0));
        }
    };
    at_origin.about(pivot)
}

/// Per-target change driven by the sampled scalar `s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Apply `synthesize(s, kind, pivot)`.
    Transform(TransformKind),
    /// Move points by `s * offset`.
    Displace(Vec3),
    /// Extrude a region along its normal by [`extrusion_distance`].
    PushPull {
        min: f64,
        max: f64,
        create_faces: bool,
    },
}

/// `min + s * (max - min)`
#[must_use]
pub fn extrusion_distance(min: f64, max: f64, s: f64) -> f64 {
    min + s * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn unit_uniform_scale_is_identity() {
        let pivot = Point3::new(3.0, -2.0, 7.0);
        let t = synthesize(1.0, TransformKind::UniformScale, pivot);
        assert!(t.approx_eq(Transform::identity(), Tolerance::DEFAULT));
    }

    #[test]
    fn scale_keeps_pivot_fixed() {
        let pivot = Point3::new(1.0, 1.0, 1.0);
        let t = synthesize(3.0, TransformKind::Scale(Axis::X), pivot);
        assert!(Tolerance::DEFAULT.approx_eq_point3(t.apply_point(pivot), pivot));
        let moved = t.apply_point(Point3::new(2.0, 2.0, 2.0));
        assert!(Tolerance::DEFAULT.approx_eq_point3(moved, Point3::new(4.0, 2.0, 2.0)));
    }

    #[test]
    fn rotation_is_in_degrees() {
        let t = synthesize(90.0, TransformKind::Rotate(Axis::Z), Point3::ORIGIN);
        let p = t.apply_point(Point3::new(1.0, 0.0, 0.0));
        assert!(Tolerance::DEFAULT.approx_eq_point3(p, Point3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn translation_ignores_pivot() {
        let t = synthesize(5.0, TransformKind::Translate(Axis::Y), Point3::new(9.0, 9.0, 9.0));
        assert_eq!(t.origin(), Point3::new(0.0, 5.0, 0.0));
        assert!(TransformKind::Translate(Axis::Y).is_motion());
        assert!(!TransformKind::Rotate(Axis::Y).is_motion());
    }

    #[test]
    fn every_kind_has_a_distinct_label() {
        let labels: std::collections::HashSet<_> =
            TransformKind::ALL.iter().map(|kind| kind.label()).collect();
        assert_eq!(labels.len(), TransformKind::ALL.len());
    }

    #[test]
    fn extrusion_interpolates_between_limits() {
        assert_eq!(extrusion_distance(2.0, 10.0, 0.0), 2.0);
        assert_eq!(extrusion_distance(2.0, 10.0, 1.0), 10.0);
        assert_eq!(extrusion_distance(2.0, 10.0, 0.25), 4.0);
    }
}
