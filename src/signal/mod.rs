//! Scalar signal sources sampled at an entity's representative point.
//!
//! The three sources share the [`Sampler`] interface: given a point and the
//! batch's [`BoundingFrame`], produce one finite scalar or fail. Attractor
//! sampling works in world space and ignores the frame; image and field
//! sampling read the point's normalized coordinates.

pub mod attractor;
pub mod field;
pub mod image;

use crate::geom::{Axis, BoundingFrame, FrameError, Point3};

pub use attractor::{AttractorSampler, Direction, Falloff};
pub use field::{FieldFormula, FieldSampler, PowerTerm, Wave, WaveTerm};
pub use image::{luminance, ImageSampler, Interpolation, Projection, RasterImage};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("could not load image {source_name}: {reason}")]
    ImageLoad { source_name: String, reason: String },
    #[error("at least one attractor is required")]
    EmptyAttractorSet,
    #[error("attraction reference distance must be positive and finite, got {0}")]
    InvalidReferenceDistance(f64),
    #[error(
        "point ({:.3}, {:.3}, {:.3}) coincides with an attractor; increasing attraction diverges",
        .point.x, .point.y, .point.z
    )]
    DivergentAttraction { point: Point3 },
    #[error("{axis} term raises {base} to the power {exponent}, which has no real value")]
    InvalidExponent { axis: Axis, base: f64, exponent: f64 },
    #[error("signal evaluated to a non-finite value ({0})")]
    NonFinite(f64),
}

/// Something that maps a representative point to a scalar.
pub trait Sampler {
    /// Check preconditions that only depend on the frame, once per batch.
    fn prepare(&self, _frame: &BoundingFrame) -> Result<(), SignalError> {
        Ok(())
    }

    fn sample(&self, point: Point3, frame: &BoundingFrame) -> Result<f64, SignalError>;
}

/// The configured signal of one tool invocation.
#[derive(Debug, Clone)]
pub enum SignalSource {
    Image(ImageSampler),
    Attractor(AttractorSampler),
    Field(FieldSampler),
}

impl Sampler for SignalSource {
    fn prepare(&self, frame: &BoundingFrame) -> Result<(), SignalError> {
        match self {
            Self::Image(sampler) => sampler.prepare(frame),
            Self::Attractor(sampler) => sampler.prepare(frame),
            Self::Field(sampler) => sampler.prepare(frame),
        }
    }

    fn sample(&self, point: Point3, frame: &BoundingFrame) -> Result<f64, SignalError> {
        let value = match self {
            Self::Image(sampler) => sampler.sample(point, frame),
            Self::Attractor(sampler) => sampler.sample(point, frame),
            Self::Field(sampler) => sampler.sample(point, frame),
        }?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(SignalError::NonFinite(value))
        }
    }
}

impl From<ImageSampler> for SignalSource {
    fn from(sampler: ImageSampler) -> Self {
        Self::Image(sampler)
    }
}

impl From<AttractorSampler> for SignalSource {
    fn from(sampler: AttractorSampler) -> Self {
        Self::Attractor(sampler)
    }
}

impl From<FieldSampler> for SignalSource {
    fn from(sampler: FieldSampler) -> Self {
        Self::Field(sampler)
    }
}
