//! One tool invocation from selection to commit.
//!
//! ```text
//! Idle -> Collecting -> Parameterizing -> Running -> Committed | Aborted
//! ```
//!
//! An empty selection fails in `Collecting`. Declining the dialog or the
//! image picker returns [`ToolOutcome::Cancelled`]; neither case starts a
//! transaction. Once `Running`, a failure aborts the host transaction and
//! the batch is rolled back.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::config::ToolConfig;
use super::{ToolKind, ToolSpec, SelectionKind, ATTRACTOR_NAME, EXTENSION_ID};
use crate::batch::{apply_batch, frame_for, ApplySpace, BatchError, BatchPlan, BatchReport, Pivot};
use crate::geom::Point3;
use crate::host::{
    ImageSource, ParameterCollector, PreferenceStore, ProgressSink, TransactionBracket,
};
use crate::params::{merge_known, suggestion_suffix, ParamError, ParamMap, ParamValue};
use crate::scene::{EntityRef, ObjectKind, Scene, SceneError};
use crate::signal::{
    AttractorSampler, FieldSampler, ImageSampler, RasterImage, SignalError, SignalSource,
};
use crate::transform::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Collecting,
    Parameterizing,
    Running,
    Committed,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Collecting => "collecting",
            Self::Parameterizing => "parameterizing",
            Self::Running => "running",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// The host collaborators one invocation talks to.
pub struct HostServices<'a> {
    pub parameters: &'a mut dyn ParameterCollector,
    pub images: &'a mut dyn ImageSource,
    pub preferences: &'a mut dyn PreferenceStore,
    pub transactions: &'a mut dyn TransactionBracket,
    pub progress: &'a mut dyn ProgressSink,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolReport {
    pub tool: &'static str,
    pub title: &'static str,
    /// Objects consumed as attractors rather than transformed.
    pub attractors: usize,
    #[serde(flatten)]
    pub batch: BatchReport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Committed(ToolReport),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool `{name}`{}", suggestion_suffix(.suggestion.as_deref()))]
    UnknownTool {
        name: String,
        suggestion: Option<&'static str>,
    },
    #[error("{hint}")]
    EmptySelection {
        tool: &'static str,
        hint: &'static str,
    },
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("Couldn't do it! Error: {0}")]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("Couldn't do it! Error: {0}")]
    Batch(#[from] BatchError),
}

fn enter(tool: ToolKind, phase: Phase) {
    log::debug!("{}: {phase}", tool.key());
}

/// Run `tool` on `selection`.
pub fn run_tool(
    tool: ToolKind,
    scene: &mut Scene,
    selection: &[EntityRef],
    host: &mut HostServices<'_>,
) -> Result<ToolOutcome, ToolError> {
    enter(tool, Phase::Idle);

    enter(tool, Phase::Collecting);
    let Collected {
        targets,
        attractors,
        context,
    } = collect_targets(tool, scene, selection)?;

    enter(tool, Phase::Parameterizing);
    let spec = tool.spec();
    let Some(params) = collect_parameters(tool, &spec, host) else {
        log::info!("{}: cancelled at parameter input", tool.title());
        return Ok(ToolOutcome::Cancelled);
    };
    let config = ToolConfig::parse(tool, &params)?;

    let image = if tool.needs_image() {
        let Some(input) = host.images.choose_image() else {
            log::info!("{}: cancelled at image selection", tool.title());
            return Ok(ToolOutcome::Cancelled);
        };
        Some(input.load()?)
    } else {
        None
    };

    let mut frame_entities = targets.clone();
    frame_entities.extend(attractors.iter().chain(&context).copied());
    let frame = frame_for(scene, &frame_entities)?;

    let attractor_points = attractors
        .iter()
        .map(|entity| scene.representative_point(*entity))
        .collect::<Result<Vec<Point3>, _>>()?;
    let (sampler, effect, multiplier) = build_signal(config, image, attractor_points)?;

    let plan = BatchPlan {
        label: tool.title().to_owned(),
        targets,
        frame,
        effect,
        multiplier,
        pivot: Pivot::Origin,
        space: ApplySpace::Local,
    };

    enter(tool, Phase::Running);
    host.transactions.start(tool.title());
    let progress = &mut *host.progress;
    let mut status = |label: &str, done: usize| {
        log::trace!("{label} | Done with item #{done}");
        progress.progress(label, done);
    };
    match apply_batch(scene, &plan, &sampler, &mut status) {
        Ok(batch) => {
            host.transactions.commit();
            enter(tool, Phase::Committed);
            log::info!("{}: processed {} item(s)", tool.title(), batch.processed);
            Ok(ToolOutcome::Committed(ToolReport {
                tool: tool.key(),
                title: tool.title(),
                attractors: attractors.len(),
                batch,
            }))
        }
        Err(err) => {
            host.transactions.abort();
            enter(tool, Phase::Aborted);
            Err(err.into())
        }
    }
}

/// Selection split for one tool.
struct Collected {
    targets: Vec<EntityRef>,
    /// Attractor objects; they widen the frame but are never transformed.
    attractors: Vec<EntityRef>,
    /// Selected faces around the vertices tool's edges; frame only.
    context: Vec<EntityRef>,
}

/// Split the selection into targets, attractors and frame context for `tool`.
fn collect_targets(
    tool: ToolKind,
    scene: &Scene,
    selection: &[EntityRef],
) -> Result<Collected, ToolError> {
    for entity in selection {
        scene.check(*entity)?;
    }
    let mut seen = HashSet::new();
    let unique = selection.iter().copied().filter(|entity| seen.insert(*entity));

    let (targets, attractors, context) = match tool.selection() {
        SelectionKind::Objects => {
            let objects: Vec<_> = unique
                .filter(|entity| matches!(entity, EntityRef::Object(_)))
                .collect();
            if tool == ToolKind::AttractorTransform {
                let mut attractors = Vec::new();
                let mut targets = Vec::new();
                for entity in objects {
                    if is_attractor(scene, entity)? {
                        attractors.push(entity);
                    } else {
                        targets.push(entity);
                    }
                }
                (targets, attractors, Vec::new())
            } else {
                (objects, Vec::new(), Vec::new())
            }
        }
        SelectionKind::Faces => (
            unique
                .filter(|entity| matches!(entity, EntityRef::Region(_)))
                .collect(),
            Vec::new(),
            Vec::new(),
        ),
        SelectionKind::Edges => {
            let mut edges = Vec::new();
            let mut faces = Vec::new();
            for entity in unique {
                match entity {
                    EntityRef::Edge(id) => edges.push(id),
                    EntityRef::Region(_) => faces.push(entity),
                    EntityRef::Object(_) | EntityRef::Point(_) => {}
                }
            }
            let points = scene.edge_vertices(&edges)?;
            (points.into_iter().map(EntityRef::Point).collect(), Vec::new(), faces)
        }
    };

    let missing_attractors = tool == ToolKind::AttractorTransform && attractors.is_empty();
    if targets.is_empty() || missing_attractors {
        log::info!("{}: nothing usable in a selection of {}", tool.title(), selection.len());
        return Err(ToolError::EmptySelection {
            tool: tool.key(),
            hint: tool.hint(),
        });
    }
    Ok(Collected {
        targets,
        attractors,
        context,
    })
}

fn is_attractor(scene: &Scene, entity: EntityRef) -> Result<bool, SceneError> {
    let EntityRef::Object(id) = entity else {
        return Ok(false);
    };
    let object = scene.object(id)?;
    Ok(object.kind == ObjectKind::Component && object.name == ATTRACTOR_NAME)
}

/// Stored values over built-in defaults, through the dialog, and back into
/// the store. `None` when the user declines.
fn collect_parameters(
    tool: ToolKind,
    spec: &ToolSpec,
    host: &mut HostServices<'_>,
) -> Option<ParamMap> {
    let builtin = spec.defaults();
    let defaults = match host.preferences.read(EXTENSION_ID, tool.key()) {
        Some(stored) => merge_known(&builtin, &stored),
        None => builtin,
    };

    let entered = host.parameters.collect(spec, &defaults)?;
    let values = merge_known(&defaults, &entered);
    host.preferences
        .write(EXTENSION_ID, tool.key(), &strip_inch_marks(&values));
    Some(values)
}

/// Stored lengths drop the `"` mark; a bare number already means inches.
fn strip_inch_marks(values: &ParamMap) -> ParamMap {
    values
        .iter()
        .map(|(key, value)| {
            let value = match value {
                ParamValue::Text(text) => ParamValue::Text(text.replace('"', "")),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn build_signal(
    config: ToolConfig,
    image: Option<RasterImage>,
    attractors: Vec<Point3>,
) -> Result<(SignalSource, Effect, f64), ToolError> {
    let image_sampler = |projection| {
        image
            .clone()
            .map(|raster| ImageSampler::new(raster, projection))
            .ok_or_else(|| SignalError::ImageLoad {
                source_name: "selection".to_owned(),
                reason: "no image was provided".to_owned(),
            })
    };

    Ok(match config {
        ToolConfig::Image(config) => (
            image_sampler(config.projection)?.into(),
            Effect::Transform(config.kind),
            config.multiplier,
        ),
        ToolConfig::Attractor(config) => (
            AttractorSampler::new(
                attractors,
                config.reference_distance,
                config.falloff,
                config.direction,
            )?
            .into(),
            Effect::Transform(config.kind),
            config.multiplier,
        ),
        ToolConfig::Power(config) => (
            FieldSampler::new(config.formula(), config.offset).into(),
            Effect::Transform(config.kind),
            1.0,
        ),
        ToolConfig::Wave(config) => (
            FieldSampler::new(config.formula(), config.offset).into(),
            Effect::Transform(config.kind),
            1.0,
        ),
        ToolConfig::PushPull(config) => (
            image_sampler(config.projection)?.into(),
            Effect::PushPull {
                min: config.min,
                max: config.max,
                create_faces: config.create_faces,
            },
            1.0,
        ),
        ToolConfig::Vertices(config) => (
            image_sampler(config.projection)?.into(),
            Effect::Displace(config.max),
            1.0,
        ),
    })
}
