//! Closed-form fields over the normalized frame.
//!
//! Each axis contributes one term evaluated on the centred coordinate
//! `c = normalize(axis) - 0.5`; the terms are summed with a constant offset.
//! Axes along which the frame is flat contribute nothing.

use std::f64::consts::PI;

use super::{Sampler, SignalError};
use crate::geom::{Axis, BoundingFrame, Point3};
use crate::params::Choice;

/// `amplitude * (factor * c) ^ exponent`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerTerm {
    pub amplitude: f64,
    pub factor: f64,
    pub exponent: f64,
}

impl PowerTerm {
    #[must_use]
    pub const fn new(amplitude: f64, factor: f64, exponent: f64) -> Self {
        Self {
            amplitude,
            factor,
            exponent,
        }
    }

    fn eval(self, axis: Axis, centred: f64) -> Result<f64, SignalError> {
        if self.amplitude == 0.0 {
            return Ok(0.0);
        }
        let base = self.factor * centred;
        let exponent = self.exponent;
        let integral = exponent.fract() == 0.0;

        if (base < 0.0 && !integral) || (base == 0.0 && exponent < 0.0) {
            return Err(SignalError::InvalidExponent {
                axis,
                base,
                exponent,
            });
        }

        let power = if !integral {
            base.powf(exponent)
        } else if exponent.abs() <= f64::from(i32::MAX) {
            base.powi(exponent as i32)
        } else {
            let magnitude = base.abs().powf(exponent);
            let odd = (exponent / 2.0).fract() != 0.0;
            if base < 0.0 && odd { -magnitude } else { magnitude }
        };
        Ok(self.amplitude * power)
    }
}

/// `amplitude * wave(period * PI * c)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveTerm {
    pub amplitude: f64,
    pub period: f64,
}

impl WaveTerm {
    #[must_use]
    pub const fn new(amplitude: f64, period: f64) -> Self {
        Self { amplitude, period }
    }

    fn eval(self, wave: Wave, centred: f64) -> f64 {
        let phase = self.period * PI * centred;
        let value = match wave {
            Wave::Sine => phase.sin(),
            Wave::Cosine => phase.cos(),
        };
        self.amplitude * value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wave {
    #[default]
    Sine,
    Cosine,
}

impl Choice for Wave {
    const ALL: &'static [Self] = &[Self::Sine, Self::Cosine];

    fn label(self) -> &'static str {
        match self {
            Self::Sine => "Sine",
            Self::Cosine => "Cosine",
        }
    }
}

/// Per-axis terms, indexed by [`Axis::index`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldFormula {
    Power([PowerTerm; 3]),
    Wave { wave: Wave, terms: [WaveTerm; 3] },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSampler {
    formula: FieldFormula,
    offset: f64,
}

impl FieldSampler {
    #[must_use]
    pub const fn new(formula: FieldFormula, offset: f64) -> Self {
        Self { formula, offset }
    }

    #[must_use]
    pub const fn formula(&self) -> &FieldFormula {
        &self.formula
    }

    /// Field value at already-centred coordinates; `None` marks a flat axis.
    pub fn evaluate(&self, centred: [Option<f64>; 3]) -> Result<f64, SignalError> {
        let mut sum = self.offset;
        for axis in Axis::ALL {
            let Some(c) = centred[axis.index()] else {
                continue;
            };
            sum += match &self.formula {
                FieldFormula::Power(terms) => terms[axis.index()].eval(axis, c)?,
                FieldFormula::Wave { wave, terms } => terms[axis.index()].eval(*wave, c),
            };
        }
        Ok(sum)
    }
}

impl Sampler for FieldSampler {
    fn sample(&self, point: Point3, frame: &BoundingFrame) -> Result<f64, SignalError> {
        let centred = Axis::ALL.map(|axis| frame.normalize(point, axis).map(|t| t - 0.5));
        self.evaluate(centred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBox;

    fn cube() -> BoundingFrame {
        BoundingFrame::from_bbox(BBox::new(Point3::ORIGIN, Point3::new(2.0, 2.0, 2.0))).unwrap()
    }

    fn symmetric_power() -> FieldSampler {
        FieldSampler::new(FieldFormula::Power([PowerTerm::new(1.0, 1.0, 2.0); 3]), 0.0)
    }

    fn unit_sine() -> FieldSampler {
        FieldSampler::new(
            FieldFormula::Wave {
                wave: Wave::Sine,
                terms: [WaveTerm::new(1.0, 1.0), WaveTerm::new(0.0, 1.0), WaveTerm::new(0.0, 1.0)],
            },
            0.0,
        )
    }

    #[test]
    fn power_is_zero_at_midpoint() {
        let value = symmetric_power()
            .sample(Point3::new(1.0, 1.0, 1.0), &cube())
            .unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn power_sums_axes_and_offset() {
        let sampler = FieldSampler::new(symmetric_power().formula, 3.0);
        // Each corner sits at c = 0.5 on every axis.
        let value = sampler.sample(Point3::new(2.0, 2.0, 2.0), &cube()).unwrap();
        assert!((value - (3.0 + 3.0 * 0.25)).abs() < 1e-12);
    }

    #[test]
    fn sine_midpoint_and_edge() {
        let sampler = unit_sine();
        let mid = sampler.sample(Point3::new(1.0, 1.0, 1.0), &cube()).unwrap();
        assert!(mid.abs() < 1e-12);
        let edge = sampler.sample(Point3::new(2.0, 1.0, 1.0), &cube()).unwrap();
        assert!((edge - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_peaks_at_midpoint() {
        let sampler = FieldSampler::new(
            FieldFormula::Wave {
                wave: Wave::Cosine,
                terms: [WaveTerm::new(2.0, 1.0); 3],
            },
            0.5,
        );
        let mid = sampler.sample(Point3::new(1.0, 1.0, 1.0), &cube()).unwrap();
        assert!((mid - 6.5).abs() < 1e-12);
    }

    #[test]
    fn flat_axes_are_skipped() {
        let flat = BoundingFrame::from_bbox(BBox::new(Point3::ORIGIN, Point3::new(2.0, 0.0, 0.0)))
            .unwrap();
        let value = symmetric_power()
            .sample(Point3::new(2.0, 0.0, 0.0), &flat)
            .unwrap();
        assert!((value - 0.25).abs() < 1e-12);
    }

    #[test]
    fn negative_base_with_fractional_exponent_is_rejected() {
        let sampler = FieldSampler::new(
            FieldFormula::Power([
                PowerTerm::new(1.0, 1.0, 0.5),
                PowerTerm::new(0.0, 1.0, 0.5),
                PowerTerm::new(0.0, 1.0, 0.5),
            ]),
            0.0,
        );
        let err = sampler.sample(Point3::ORIGIN, &cube()).unwrap_err();
        assert_eq!(
            err,
            SignalError::InvalidExponent {
                axis: Axis::X,
                base: -0.5,
                exponent: 0.5
            }
        );
        assert!(sampler.sample(Point3::new(2.0, 0.0, 0.0), &cube()).is_ok());
    }

    #[test]
    fn negative_base_with_integer_exponent_keeps_sign() {
        let sampler = FieldSampler::new(
            FieldFormula::Power([
                PowerTerm::new(1.0, 2.0, 3.0),
                PowerTerm::new(0.0, 0.0, 0.0),
                PowerTerm::new(0.0, 0.0, 0.0),
            ]),
            0.0,
        );
        let value = sampler.sample(Point3::ORIGIN, &cube()).unwrap();
        assert!((value + 1.0).abs() < 1e-12);
    }

    #[test]
    fn integer_exponents_beyond_i32_keep_sign() {
        // factor 2 at c = -0.5 gives a base of -1.
        let even = PowerTerm::new(1.0, 2.0, 4e9).eval(Axis::X, -0.5).unwrap();
        assert_eq!(even, 1.0);
        let odd = PowerTerm::new(1.0, 2.0, 4e9 + 1.0).eval(Axis::X, -0.5).unwrap();
        assert_eq!(odd, -1.0);
        let tiny = PowerTerm::new(1.0, 1.0, 4e9).eval(Axis::X, -0.5).unwrap();
        assert_eq!(tiny, 0.0);
    }

    #[test]
    fn zero_base_with_negative_exponent_is_rejected() {
        let sampler = FieldSampler::new(FieldFormula::Power([PowerTerm::new(1.0, 1.0, -1.0); 3]), 0.0);
        assert!(matches!(
            sampler.sample(Point3::new(1.0, 1.0, 1.0), &cube()),
            Err(SignalError::InvalidExponent { .. })
        ));
    }
}
