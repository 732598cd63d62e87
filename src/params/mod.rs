//! Parameter values as they come back from the host's input dialog, and the
//! coercions the tools use to turn them into typed configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

mod length;

pub use length::{parse_length, LengthError, INCHES_PER_FOOT};

/// Named parameter values of one tool invocation.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A single configuration value. Dialogs hand back text; programmatic
/// callers may pass numbers and booleans directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl ParamValue {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("missing value for `{key}`")]
    Missing { key: String },
    #[error("`{key}` expects a {expected}, got {kind} `{value}`")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        kind: &'static str,
        value: String,
    },
    #[error("`{key}`: {source}")]
    Length {
        key: String,
        #[source]
        source: LengthError,
    },
    #[error("`{key}`: unknown choice `{value}`{}", suggestion_suffix(.suggestion.as_deref()))]
    UnknownChoice {
        key: String,
        value: String,
        suggestion: Option<&'static str>,
    },
}

pub(crate) fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion
        .map(|label| format!(" (did you mean `{label}`?)"))
        .unwrap_or_default()
}

/// Closed set of labelled options offered as a dropdown.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Pipe-separated list, the host's dropdown notation.
    #[must_use]
    fn choice_list() -> String {
        Self::ALL
            .iter()
            .map(|choice| choice.label())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Largest edit distance at which an unknown label still gets a suggestion.
const SUGGESTION_DISTANCE: usize = 4;

/// Resolve a label to its choice. Matching ignores case and surrounding
/// whitespace.
pub fn parse_choice<T: Choice>(key: &str, text: &str) -> Result<T, ParamError> {
    let needle = text.trim().to_lowercase();
    if let Some(choice) = T::ALL
        .iter()
        .find(|choice| choice.label().to_lowercase() == needle)
    {
        return Ok(*choice);
    }

    let suggestion = T::ALL
        .iter()
        .map(|choice| {
            let distance = levenshtein::levenshtein(&choice.label().to_lowercase(), &needle);
            (distance, choice.label())
        })
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
        .map(|(_, label)| label);

    Err(ParamError::UnknownChoice {
        key: key.to_owned(),
        value: text.to_owned(),
        suggestion,
    })
}

fn lookup<'a>(params: &'a ParamMap, key: &str) -> Result<&'a ParamValue, ParamError> {
    params.get(key).ok_or_else(|| ParamError::Missing {
        key: key.to_owned(),
    })
}

fn mismatch(key: &str, expected: &'static str, value: &ParamValue) -> ParamError {
    ParamError::TypeMismatch {
        key: key.to_owned(),
        expected,
        kind: value.kind(),
        value: value.to_string(),
    }
}

/// Plain number. Text is parsed, surrounding quotes are tolerated.
pub fn number(params: &ParamMap, key: &str) -> Result<f64, ParamError> {
    let value = lookup(params, key)?;
    let parsed = match value {
        ParamValue::Number(n) => Some(*n),
        ParamValue::Text(s) => s.trim().trim_matches('"').trim().parse::<f64>().ok(),
        ParamValue::Boolean(_) => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| mismatch(key, "number", value))
}

/// Length in model units (inches). Text may carry a unit suffix.
pub fn length(params: &ParamMap, key: &str) -> Result<f64, ParamError> {
    match lookup(params, key)? {
        ParamValue::Number(n) if n.is_finite() => Ok(*n),
        ParamValue::Text(s) => parse_length(s).map_err(|source| ParamError::Length {
            key: key.to_owned(),
            source,
        }),
        other => Err(mismatch(key, "length", other)),
    }
}

/// Yes/No flag. Accepts booleans, `Yes`/`No`, `true`/`false` and 1/0.
pub fn flag(params: &ParamMap, key: &str) -> Result<bool, ParamError> {
    let value = lookup(params, key)?;
    match value {
        ParamValue::Boolean(b) => Ok(*b),
        ParamValue::Number(n) => Ok(n.abs() > f64::EPSILON),
        ParamValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "yes" | "true" | "1" => Ok(true),
            "no" | "false" | "0" => Ok(false),
            _ => Err(mismatch(key, "Yes/No", value)),
        },
    }
}

pub fn choice<T: Choice>(params: &ParamMap, key: &str) -> Result<T, ParamError> {
    match lookup(params, key)? {
        ParamValue::Text(s) => parse_choice(key, s),
        other => Err(mismatch(key, "choice", other)),
    }
}

/// Overlay `values` on `base`, keeping only keys known to `base`.
#[must_use]
pub fn merge_known(base: &ParamMap, values: &ParamMap) -> ParamMap {
    base.iter()
        .map(|(key, default)| {
            let value = values.get(key).unwrap_or(default);
            (key.clone(), value.clone())
        })
        .collect()
}
