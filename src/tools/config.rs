//! Typed tool configuration parsed once from dialog values.

use crate::geom::Vec3;
use crate::params::{choice, flag, length, number, ParamError, ParamMap};
use crate::signal::{Direction, Falloff, FieldFormula, PowerTerm, Projection, Wave, WaveTerm};
use crate::transform::TransformKind;

use super::ToolKind;

/// Multiplier is a distance for motion kinds, a plain number otherwise.
fn multiplier(params: &ParamMap, kind: TransformKind) -> Result<f64, ParamError> {
    if kind.is_motion() {
        length(params, "multiplier")
    } else {
        number(params, "multiplier")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageToolConfig {
    pub kind: TransformKind,
    pub projection: Projection,
    pub multiplier: f64,
}

impl ImageToolConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let kind = choice(params, "kind")?;
        Ok(Self {
            kind,
            projection: choice(params, "orientation")?,
            multiplier: multiplier(params, kind)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttractorToolConfig {
    pub kind: TransformKind,
    pub reference_distance: f64,
    pub falloff: Falloff,
    pub direction: Direction,
    pub multiplier: f64,
}

impl AttractorToolConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let kind = choice(params, "kind")?;
        Ok(Self {
            kind,
            reference_distance: length(params, "reference_distance")?,
            falloff: choice(params, "falloff")?,
            direction: choice(params, "direction")?,
            multiplier: multiplier(params, kind)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerToolConfig {
    pub kind: TransformKind,
    pub terms: [PowerTerm; 3],
    pub offset: f64,
}

impl PowerToolConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let term = |coord: &str| -> Result<PowerTerm, ParamError> {
            Ok(PowerTerm::new(
                number(params, &format!("a_{coord}"))?,
                number(params, &format!("b_{coord}"))?,
                number(params, &format!("c_{coord}"))?,
            ))
        };
        Ok(Self {
            kind: choice(params, "kind")?,
            terms: [term("x")?, term("y")?, term("z")?],
            offset: number(params, "offset")?,
        })
    }

    #[must_use]
    pub const fn formula(&self) -> FieldFormula {
        FieldFormula::Power(self.terms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveToolConfig {
    pub kind: TransformKind,
    pub wave: Wave,
    pub terms: [WaveTerm; 3],
    pub offset: f64,
}

impl WaveToolConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let term = |coord: &str| -> Result<WaveTerm, ParamError> {
            Ok(WaveTerm::new(
                number(params, &format!("a_{coord}"))?,
                number(params, &format!("b_{coord}"))?,
            ))
        };
        Ok(Self {
            kind: choice(params, "kind")?,
            wave: choice(params, "wave")?,
            terms: [term("x")?, term("y")?, term("z")?],
            offset: number(params, "offset")?,
        })
    }

    #[must_use]
    pub const fn formula(&self) -> FieldFormula {
        FieldFormula::Wave {
            wave: self.wave,
            terms: self.terms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushPullToolConfig {
    pub min: f64,
    pub max: f64,
    pub create_faces: bool,
    pub projection: Projection,
}

impl PushPullToolConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        Ok(Self {
            min: length(params, "min")?,
            max: length(params, "max")?,
            create_faces: flag(params, "create_faces")?,
            projection: choice(params, "orientation")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexToolConfig {
    /// Motion at full brightness.
    pub max: Vec3,
    pub projection: Projection,
}

impl VertexToolConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        Ok(Self {
            max: Vec3::new(
                length(params, "max_x")?,
                length(params, "max_y")?,
                length(params, "max_z")?,
            ),
            projection: choice(params, "orientation")?,
        })
    }
}

/// Configuration of any tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolConfig {
    Image(ImageToolConfig),
    Attractor(AttractorToolConfig),
    Power(PowerToolConfig),
    Wave(WaveToolConfig),
    PushPull(PushPullToolConfig),
    Vertices(VertexToolConfig),
}

impl ToolConfig {
    pub fn parse(tool: ToolKind, params: &ParamMap) -> Result<Self, ParamError> {
        Ok(match tool {
            ToolKind::ImageTransform => Self::Image(ImageToolConfig::from_params(params)?),
            ToolKind::AttractorTransform => {
                Self::Attractor(AttractorToolConfig::from_params(params)?)
            }
            ToolKind::PowerTransform => Self::Power(PowerToolConfig::from_params(params)?),
            ToolKind::WaveTransform => Self::Wave(WaveToolConfig::from_params(params)?),
            ToolKind::PushPullFaces => Self::PushPull(PushPullToolConfig::from_params(params)?),
            ToolKind::MoveVertices => Self::Vertices(VertexToolConfig::from_params(params)?),
        })
    }
}
