//! Tool registry: the six user-facing tools, their dialog fields and the
//! names they are resolved by.

use std::collections::HashMap;

use serde::Serialize;

use crate::geom::Axis;
use crate::params::{Choice, ParamMap, ParamValue};
use crate::signal::{Direction, Falloff, Projection, Wave};
use crate::transform::TransformKind;

pub mod config;
pub mod runner;

pub use config::{
    AttractorToolConfig, ImageToolConfig, PowerToolConfig, PushPullToolConfig, ToolConfig,
    VertexToolConfig, WaveToolConfig,
};
pub use runner::{run_tool, HostServices, Phase, ToolError, ToolOutcome, ToolReport};

/// Namespace for persisted preferences.
pub const EXTENSION_ID: &str = "as_scaleby";

/// Component definition name that marks an attractor.
pub const ATTRACTOR_NAME: &str = "A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ToolKind {
    ImageTransform,
    AttractorTransform,
    PowerTransform,
    WaveTransform,
    PushPullFaces,
    MoveVertices,
}

/// What a tool picks out of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionKind {
    Objects,
    Faces,
    Edges,
}

#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub key: &'static str,
    pub names: &'static [&'static str],
    pub kind: ToolKind,
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        key: "image",
        names: &["Transform Objects by Image", "scale_by_image"],
        kind: ToolKind::ImageTransform,
    },
    Registration {
        key: "attractor",
        names: &["Transform Objects by Attractors", "scale_by_attractor"],
        kind: ToolKind::AttractorTransform,
    },
    Registration {
        key: "power",
        names: &["Transform Objects by Power Equation", "scale_by_power"],
        kind: ToolKind::PowerTransform,
    },
    Registration {
        key: "sine",
        names: &[
            "Transform Objects by Sine/Cosine Equation",
            "scale_by_sine",
            "cosine",
        ],
        kind: ToolKind::WaveTransform,
    },
    Registration {
        key: "pushpull",
        names: &["Push/Pull Faces by Image", "push_pull", "extrude_by_image"],
        kind: ToolKind::PushPullFaces,
    },
    Registration {
        key: "vertices",
        names: &["Move Vertices by Image", "move_vertices"],
        kind: ToolKind::MoveVertices,
    },
];

const OBJECT_HINT: &str = "Select several objects (groups or component instances) first.";

impl ToolKind {
    pub const ALL: [Self; 6] = [
        Self::ImageTransform,
        Self::AttractorTransform,
        Self::PowerTransform,
        Self::WaveTransform,
        Self::PushPullFaces,
        Self::MoveVertices,
    ];

    fn registration(self) -> &'static Registration {
        // Every kind has exactly one registration.
        REGISTRATIONS
            .iter()
            .find(|registration| registration.kind == self)
            .unwrap_or(&REGISTRATIONS[0])
    }

    /// Short stable identifier, also the preference key.
    #[must_use]
    pub fn key(self) -> &'static str {
        self.registration().key
    }

    /// Display name, also the undo transaction name.
    #[must_use]
    pub fn title(self) -> &'static str {
        self.registration().names[0]
    }

    /// Shown when the selection holds nothing the tool can use.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Self::AttractorTransform => {
                "Select several objects (groups or component instances) and one or more components named 'A' first."
            }
            Self::PushPullFaces => {
                "Select several faces first. You will be asked to select the image second."
            }
            Self::MoveVertices => {
                "Select several edges (and faces if connected) first (their vertices will be moved). You will be asked to select the image second."
            }
            Self::ImageTransform | Self::PowerTransform | Self::WaveTransform => OBJECT_HINT,
        }
    }

    #[must_use]
    pub const fn selection(self) -> SelectionKind {
        match self {
            Self::PushPullFaces => SelectionKind::Faces,
            Self::MoveVertices => SelectionKind::Edges,
            _ => SelectionKind::Objects,
        }
    }

    #[must_use]
    pub const fn needs_image(self) -> bool {
        matches!(
            self,
            Self::ImageTransform | Self::PushPullFaces | Self::MoveVertices
        )
    }

    /// Dialog description with the built-in defaults.
    #[must_use]
    pub fn spec(self) -> ToolSpec {
        let fields = match self {
            Self::ImageTransform => vec![
                kind_field(),
                orientation_field("Image Orientation (local coords)"),
                FieldSpec::text("multiplier", "Multiplier (scale|angle|distance)", "2"),
            ],
            Self::AttractorTransform => vec![
                kind_field(),
                FieldSpec::text("reference_distance", "Attraction Scaling (distance)", "10'"),
                FieldSpec::choice("falloff", "Attraction Falloff", Falloff::Linear),
                FieldSpec::choice("direction", "Attraction Type", Direction::Decrease),
                FieldSpec::text("multiplier", "Multiplier (scale|angle|distance)", "2"),
            ],
            Self::PowerTransform => {
                let mut fields = vec![kind_field()];
                let defaults = [["1", "2", "2"], ["1", "2", "2"], ["0", "0", "0"]];
                for (axis, defaults) in Axis::ALL.into_iter().zip(defaults) {
                    let (colour, coord) = (axis.colour_name(), axis);
                    fields.push(FieldSpec::text_owned(
                        format!("a_{coord}"),
                        format!("Multiplier in {colour} ({coord}) (A in f = A(B{coord})^C+D)"),
                        defaults[0],
                    ));
                    fields.push(FieldSpec::text_owned(
                        format!("b_{coord}"),
                        format!("Power Factor in {colour} ({coord}) (B in f = A(B{coord})^C+D)"),
                        defaults[1],
                    ));
                    fields.push(FieldSpec::text_owned(
                        format!("c_{coord}"),
                        format!("Power in {colour} ({coord}) (C in f = A(B{coord})^C+D)"),
                        defaults[2],
                    ));
                }
                fields.push(FieldSpec::text("offset", "Offset (D) (all in local coords)", "0"));
                fields
            }
            Self::WaveTransform => {
                let mut fields = vec![kind_field(), FieldSpec::choice("wave", "Use", Wave::Sine)];
                let defaults = [["1", "1"], ["1", "1"], ["0", "0"]];
                for (axis, defaults) in Axis::ALL.into_iter().zip(defaults) {
                    let (colour, coord) = (axis.colour_name(), axis);
                    fields.push(FieldSpec::text_owned(
                        format!("a_{coord}"),
                        format!("Amplitude in {colour} ({coord}) (A in f = A*sin(B{coord})+D)"),
                        defaults[0],
                    ));
                    fields.push(FieldSpec::text_owned(
                        format!("b_{coord}"),
                        format!("Period in {colour} ({coord}) (B in f = A*sin(B{coord})+D)"),
                        defaults[1],
                    ));
                }
                fields.push(FieldSpec::text("offset", "Offset (D) (all in local coords)", "0"));
                fields
            }
            Self::PushPullFaces => vec![
                FieldSpec::text("min", "MIN Extrusion (distance)", "0"),
                FieldSpec::text("max", "MAX Extrusion (distance)", "1'"),
                FieldSpec {
                    key: "create_faces".into(),
                    prompt: "Create New Faces".into(),
                    default: "Yes".into(),
                    choices: vec!["Yes", "No"],
                },
                orientation_field("Image Orientation (local coords)"),
            ],
            Self::MoveVertices => vec![
                FieldSpec::text("max_x", "MAX Motion in RED (x distance)", "0"),
                FieldSpec::text("max_y", "MAX Motion in GREEN (y distance)", "0"),
                FieldSpec::text("max_z", "MAX Motion in BLUE (z distance)", "1'"),
                orientation_field("Image Orientation (all in local coords)"),
            ],
        };

        ToolSpec {
            key: self.key(),
            title: self.title(),
            hint: self.hint(),
            fields,
        }
    }
}

fn kind_field() -> FieldSpec {
    FieldSpec::choice(
        "kind",
        "Transformation to apply (object coords)",
        TransformKind::UniformScale,
    )
}

fn orientation_field(prompt: &'static str) -> FieldSpec {
    FieldSpec::choice("orientation", prompt, Projection::XY)
}

/// One dialog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub key: String,
    pub prompt: String,
    pub default: String,
    /// Dropdown labels; empty for free text.
    pub choices: Vec<&'static str>,
}

impl FieldSpec {
    fn text(key: &str, prompt: &str, default: &str) -> Self {
        Self::text_owned(key.to_owned(), prompt.to_owned(), default)
    }

    fn text_owned(key: String, prompt: String, default: &str) -> Self {
        Self {
            key,
            prompt,
            default: default.to_owned(),
            choices: Vec::new(),
        }
    }

    fn choice<T: Choice>(key: &str, prompt: &str, default: T) -> Self {
        Self {
            key: key.to_owned(),
            prompt: prompt.to_owned(),
            default: default.label().to_owned(),
            choices: T::ALL.iter().map(|choice| choice.label()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub hint: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl ToolSpec {
    /// Built-in default value of every field, as dialog text.
    #[must_use]
    pub fn defaults(&self) -> ParamMap {
        self.fields
            .iter()
            .map(|field| (field.key.clone(), ParamValue::Text(field.default.clone())))
            .collect()
    }
}

/// Resolves tools by key or display name, ignoring case.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    by_name: HashMap<String, ToolKind>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        for registration in REGISTRATIONS {
            registry.register_names(&[registration.key], registration.kind);
            registry.register_names(registration.names, registration.kind);
        }
        registry
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    pub fn register_names(&mut self, names: &[&str], kind: ToolKind) {
        for name in names {
            self.by_name.insert(normalize_name(name), kind);
        }
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ToolKind> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    /// Like [`resolve`](Self::resolve), with the closest known name on failure.
    pub fn lookup(&self, name: &str) -> Result<ToolKind, ToolError> {
        self.resolve(name).ok_or_else(|| {
            let needle = normalize_name(name);
            let suggestion = REGISTRATIONS
                .iter()
                .flat_map(|registration| {
                    std::iter::once(registration.key).chain(registration.names.iter().copied())
                })
                .map(|candidate| {
                    let distance = levenshtein::levenshtein(&normalize_name(candidate), &needle);
                    (distance, candidate)
                })
                .min_by_key(|(distance, _)| *distance)
                .filter(|(distance, _)| *distance <= needle.len().max(3) / 2)
                .map(|(_, candidate)| candidate);
            ToolError::UnknownTool {
                name: name.to_owned(),
                suggestion,
            }
        })
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
