//! Collaborators the tools call into: the parameter dialog, the image file
//! picker, preference persistence, undo bracketing and progress text.
//!
//! Each is a small trait so an embedding can supply its own; the in-memory
//! implementations here back the [`Engine`](crate::Engine), the CLI and the
//! tests.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::params::{merge_known, ParamMap};
use crate::signal::{RasterImage, SignalError};
use crate::tools::ToolSpec;

/// Presents a tool's fields and returns the confirmed values, or `None`
/// when the user cancels.
pub trait ParameterCollector {
    fn collect(&mut self, spec: &ToolSpec, defaults: &ParamMap) -> Option<ParamMap>;
}

/// Uses the defaults as entered values.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl ParameterCollector for AcceptDefaults {
    fn collect(&mut self, _spec: &ToolSpec, defaults: &ParamMap) -> Option<ParamMap> {
        Some(defaults.clone())
    }
}

/// Overlays fixed values on the defaults; unknown keys are dropped.
#[derive(Debug, Clone, Default)]
pub struct PresetParameters(pub ParamMap);

impl ParameterCollector for PresetParameters {
    fn collect(&mut self, _spec: &ToolSpec, defaults: &ParamMap) -> Option<ParamMap> {
        Some(merge_known(defaults, &self.0))
    }
}

/// Always cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineParameters;

impl ParameterCollector for DeclineParameters {
    fn collect(&mut self, _spec: &ToolSpec, _defaults: &ParamMap) -> Option<ParamMap> {
        None
    }
}

/// An image picked by the user, not yet decoded.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
    Raster(RasterImage),
}

impl ImageInput {
    pub fn load(self) -> Result<RasterImage, SignalError> {
        match self {
            Self::Path(path) => RasterImage::open(&path),
            Self::Bytes { name, bytes } => RasterImage::decode(&bytes, &name),
            Self::Raster(image) => Ok(image),
        }
    }
}

/// File picker. `None` means the user closed it without choosing.
pub trait ImageSource {
    fn choose_image(&mut self) -> Option<ImageInput>;
}

impl ImageSource for Option<ImageInput> {
    fn choose_image(&mut self) -> Option<ImageInput> {
        self.take()
    }
}

/// Last-used values per tool, namespaced by extension id.
pub trait PreferenceStore {
    fn read(&self, extension: &str, tool: &str) -> Option<ParamMap>;
    fn write(&mut self, extension: &str, tool: &str, values: &ParamMap);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    entries: HashMap<(String, String), ParamMap>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn read(&self, extension: &str, tool: &str) -> Option<ParamMap> {
        self.entries
            .get(&(extension.to_owned(), tool.to_owned()))
            .cloned()
    }

    fn write(&mut self, extension: &str, tool: &str, values: &ParamMap) {
        self.entries
            .insert((extension.to_owned(), tool.to_owned()), values.clone());
    }
}

/// Host undo bracket around one batch.
pub trait TransactionBracket {
    fn start(&mut self, name: &str);
    fn commit(&mut self);
    fn abort(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEvent {
    Started(String),
    Committed,
    Aborted,
}

/// Records bracket calls in order.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    pub events: Vec<TransactionEvent>,
}

impl TransactionBracket for TransactionLog {
    fn start(&mut self, name: &str) {
        self.events.push(TransactionEvent::Started(name.to_owned()));
    }

    fn commit(&mut self) {
        self.events.push(TransactionEvent::Committed);
    }

    fn abort(&mut self) {
        self.events.push(TransactionEvent::Aborted);
    }
}

/// Receives `(tool, done)` after each processed item.
pub trait ProgressSink {
    fn progress(&mut self, tool: &str, done: usize);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str, usize),
{
    fn progress(&mut self, tool: &str, done: usize) {
        self(tool, done);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _tool: &str, _done: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn preferences_are_keyed_by_extension_and_tool() {
        let mut store = MemoryPreferences::new();
        let mut values = ParamMap::new();
        values.insert("multiplier".into(), ParamValue::from("3"));
        store.write("as_scaleby", "image", &values);

        assert_eq!(store.read("as_scaleby", "image"), Some(values));
        assert_eq!(store.read("as_scaleby", "attractor"), None);
        assert_eq!(store.read("other", "image"), None);
    }

    #[test]
    fn option_image_source_yields_once() {
        let image = RasterImage::filled(1, 1, [0, 0, 0]).unwrap();
        let mut source = Some(ImageInput::Raster(image));
        assert!(source.choose_image().is_some());
        assert!(source.choose_image().is_none());
    }

    #[test]
    fn closures_are_progress_sinks() {
        let mut seen = Vec::new();
        let mut sink = |tool: &str, done: usize| seen.push(format!("{tool}:{done}"));
        sink.progress("t", 1);
        sink.progress("t", 2);
        assert_eq!(seen, ["t:1", "t:2"]);
    }
}
