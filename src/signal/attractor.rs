//! Distance-to-nearest-attractor signal.

use super::{Sampler, SignalError};
use crate::geom::{BoundingFrame, Point3};
use crate::params::Choice;

/// Falloff exponent applied to the normalized distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Falloff {
    Root,
    #[default]
    Linear,
    Square,
}

impl Falloff {
    #[must_use]
    pub const fn exponent(self) -> f64 {
        match self {
            Self::Root => 0.5,
            Self::Linear => 1.0,
            Self::Square => 2.0,
        }
    }
}

impl Choice for Falloff {
    const ALL: &'static [Self] = &[Self::Root, Self::Linear, Self::Square];

    fn label(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Linear => "Linear",
            Self::Square => "Square",
        }
    }
}

/// Whether the signal shrinks or grows towards the attractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Decrease,
    Increase,
}

impl Choice for Direction {
    const ALL: &'static [Self] = &[Self::Decrease, Self::Increase];

    fn label(self) -> &'static str {
        match self {
            Self::Decrease => "Decrease",
            Self::Increase => "Increase",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttractorSampler {
    attractors: Vec<Point3>,
    reference_distance: f64,
    falloff: Falloff,
    direction: Direction,
}

impl AttractorSampler {
    pub fn new(
        attractors: Vec<Point3>,
        reference_distance: f64,
        falloff: Falloff,
        direction: Direction,
    ) -> Result<Self, SignalError> {
        if attractors.is_empty() {
            return Err(SignalError::EmptyAttractorSet);
        }
        if !reference_distance.is_finite() || reference_distance <= 0.0 {
            return Err(SignalError::InvalidReferenceDistance(reference_distance));
        }
        Ok(Self {
            attractors,
            reference_distance,
            falloff,
            direction,
        })
    }

    fn nearest_distance(&self, point: Point3) -> f64 {
        self.attractors
            .iter()
            .map(|attractor| attractor.distance_to(point))
            .fold(f64::INFINITY, f64::min)
    }
}

impl Sampler for AttractorSampler {
    fn sample(&self, point: Point3, _frame: &BoundingFrame) -> Result<f64, SignalError> {
        let dist = self.nearest_distance(point);
        let scale = (dist / self.reference_distance).powf(self.falloff.exponent());
        match self.direction {
            Direction::Decrease => Ok(scale),
            Direction::Increase if scale == 0.0 => Err(SignalError::DivergentAttraction { point }),
            Direction::Increase => Ok(1.0 / scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBox;

    fn frame() -> BoundingFrame {
        BoundingFrame::from_bbox(BBox::new(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0))).unwrap()
    }

    #[test]
    fn reference_distance_gives_unit_scale() {
        for falloff in Falloff::ALL {
            for direction in Direction::ALL {
                let sampler =
                    AttractorSampler::new(vec![Point3::ORIGIN], 4.0, *falloff, *direction).unwrap();
                let scale = sampler.sample(Point3::new(0.0, 4.0, 0.0), &frame()).unwrap();
                assert!((scale - 1.0).abs() < 1e-12, "{falloff:?} {direction:?}");
            }
        }
    }

    #[test]
    fn nearest_attractor_wins() {
        let sampler = AttractorSampler::new(
            vec![Point3::new(100.0, 0.0, 0.0), Point3::ORIGIN],
            2.0,
            Falloff::Square,
            Direction::Decrease,
        )
        .unwrap();
        let scale = sampler.sample(Point3::new(1.0, 0.0, 0.0), &frame()).unwrap();
        assert!((scale - 0.25).abs() < 1e-12);
    }

    #[test]
    fn increase_inverts() {
        let sampler =
            AttractorSampler::new(vec![Point3::ORIGIN], 1.0, Falloff::Linear, Direction::Increase)
                .unwrap();
        let scale = sampler.sample(Point3::new(0.0, 0.0, 4.0), &frame()).unwrap();
        assert!((scale - 0.25).abs() < 1e-12);
    }

    #[test]
    fn coincident_point_diverges_when_increasing() {
        let sampler =
            AttractorSampler::new(vec![Point3::ORIGIN], 1.0, Falloff::Root, Direction::Increase)
                .unwrap();
        assert_eq!(
            sampler.sample(Point3::ORIGIN, &frame()),
            Err(SignalError::DivergentAttraction {
                point: Point3::ORIGIN
            })
        );

        let decreasing =
            AttractorSampler::new(vec![Point3::ORIGIN], 1.0, Falloff::Root, Direction::Decrease)
                .unwrap();
        assert_eq!(decreasing.sample(Point3::ORIGIN, &frame()), Ok(0.0));
    }

    #[test]
    fn construction_preconditions() {
        assert_eq!(
            AttractorSampler::new(Vec::new(), 1.0, Falloff::Linear, Direction::Decrease).unwrap_err(),
            SignalError::EmptyAttractorSet
        );
        assert_eq!(
            AttractorSampler::new(vec![Point3::ORIGIN], 0.0, Falloff::Linear, Direction::Decrease)
                .unwrap_err(),
            SignalError::InvalidReferenceDistance(0.0)
        );
    }
}
