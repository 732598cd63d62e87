#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod geom;
pub mod host;
pub mod params;
pub mod scene;
pub mod signal;
pub mod tools;
pub mod transform;

use std::fmt;

use host::{
    ImageInput, MemoryPreferences, NoProgress, PreferenceStore, PresetParameters, TransactionLog,
};
use params::{merge_known, ParamMap};
use scene::{EntityRef, Scene};
use tools::{HostServices, ToolError, ToolOutcome, ToolRegistry, EXTENSION_ID};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    registry: ToolRegistry,
    scene: Scene,
    preferences: MemoryPreferences,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            registry: ToolRegistry::default(),
            scene: Scene::new(),
            preferences: MemoryPreferences::new(),
        }
    }

    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Replace the scene with one given as a plain JS object.
    #[wasm_bindgen]
    pub fn load_scene(&mut self, scene: JsValue) -> Result<(), JsValue> {
        let scene: Scene = serde_wasm_bindgen::from_value(scene).map_err(to_js_error)?;
        debug_log!(
            "scene loaded: {} objects, {} faces, {} edges",
            scene.objects().len(),
            scene.regions().len(),
            scene.edges().len()
        );
        self.scene = scene;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn get_scene(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.scene).map_err(to_js_error)
    }

    /// Dialog descriptions of every tool.
    #[wasm_bindgen]
    pub fn list_tools(&self) -> Result<JsValue, JsValue> {
        let specs: Vec<_> = tools::ToolKind::ALL.iter().map(|tool| tool.spec()).collect();
        serde_wasm_bindgen::to_value(&specs).map_err(to_js_error)
    }

    /// Values the dialog of `tool` would open with.
    #[wasm_bindgen]
    pub fn tool_defaults(&self, tool: &str) -> Result<JsValue, JsValue> {
        let defaults = self.defaults(tool).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&defaults).map_err(to_js_error)
    }

    /// Run a tool. Resolves to the report, or `null` when nothing was done.
    #[wasm_bindgen]
    pub fn run_tool(
        &mut self,
        tool: &str,
        selection: JsValue,
        params: JsValue,
        image: Option<Vec<u8>>,
    ) -> Result<JsValue, JsValue> {
        let selection: Vec<EntityRef> =
            serde_wasm_bindgen::from_value(selection).map_err(to_js_error)?;
        let params: ParamMap = if params.is_undefined() || params.is_null() {
            ParamMap::new()
        } else {
            serde_wasm_bindgen::from_value(params).map_err(to_js_error)?
        };
        let image = image.map(|bytes| ImageInput::Bytes {
            name: "image".to_owned(),
            bytes,
        });

        match self.run(tool, &selection, &params, image).map_err(to_js_error)? {
            ToolOutcome::Committed(report) => {
                serde_wasm_bindgen::to_value(&report).map_err(to_js_error)
            }
            ToolOutcome::Cancelled => Ok(JsValue::NULL),
        }
    }
}

impl Engine {
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn preferences(&self) -> &MemoryPreferences {
        &self.preferences
    }

    /// Stored values of `tool` over its built-in defaults.
    pub fn defaults(&self, tool: &str) -> Result<ParamMap, ToolError> {
        let tool = self.registry.lookup(tool)?;
        let builtin = tool.spec().defaults();
        Ok(match self.preferences.read(EXTENSION_ID, tool.key()) {
            Some(stored) => merge_known(&builtin, &stored),
            None => builtin,
        })
    }

    /// Run `tool` with `params` laid over its defaults. Without an image an
    /// image tool cancels, as if the picker had been closed.
    pub fn run(
        &mut self,
        tool: &str,
        selection: &[EntityRef],
        params: &ParamMap,
        image: Option<ImageInput>,
    ) -> Result<ToolOutcome, ToolError> {
        let tool = self.registry.lookup(tool)?;
        let mut parameters = PresetParameters(params.clone());
        let mut images = image;
        let mut transactions = TransactionLog::default();
        let mut progress = NoProgress;

        let mut host = HostServices {
            parameters: &mut parameters,
            images: &mut images,
            preferences: &mut self.preferences,
            transactions: &mut transactions,
            progress: &mut progress,
        };
        let outcome = tools::run_tool(tool, &mut self.scene, selection, &mut host);
        log::debug!("{}: transaction log {:?}", tool.key(), transactions.events);
        outcome
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::geom::{Transform, Vec3};
    use crate::params::{ParamMap, ParamValue};
    use crate::scene::{EntityRef, RigidObject, Scene};
    use crate::tools::{ToolError, ToolOutcome};

    #[test]
    fn unknown_tool_is_an_error() {
        let mut engine = Engine::new();
        let err = engine.run("scale_by_magic", &[], &ParamMap::new(), None).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { .. }));
    }

    #[test]
    fn run_persists_entered_values() {
        let mut scene = Scene::new();
        let selection: Vec<EntityRef> = (0..4)
            .map(|i| {
                let at = Transform::translate(Vec3::new(f64::from(i), f64::from(i % 2), 0.0));
                scene.add_object(RigidObject::component("box", at)).into()
            })
            .collect();
        let mut engine = Engine::new();
        engine.set_scene(scene);

        let mut params = ParamMap::new();
        params.insert("kind".into(), ParamValue::from("Rotation about BLUE"));
        params.insert("offset".into(), ParamValue::from(45.0));
        let outcome = engine.run("sine", &selection, &params, None).unwrap();
        assert!(matches!(outcome, ToolOutcome::Committed(_)));

        let defaults = engine.defaults("Transform Objects by Sine/Cosine Equation").unwrap();
        assert_eq!(defaults["kind"], ParamValue::from("Rotation about BLUE"));
        assert_eq!(defaults["offset"], ParamValue::Number(45.0));
    }
}
