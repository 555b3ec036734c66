//! WASM bindings for the in-browser node editor.
//!
//! Exposes graph compilation, module resolution and preview messages to
//! JavaScript via wasm-bindgen.
//! Build with: `wasm-pack build --target web --features wasm`

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::BuildConfig;
use crate::preview::PreviewMessage;

fn config_from(config_json: Option<String>) -> Result<BuildConfig, JsError> {
    match config_json {
        Some(json) => BuildConfig::from_json(&json).map_err(|e| JsError::new(&e.to_string())),
        None => Ok(BuildConfig::default()),
    }
}

/// Compile graph JSON to the game program.
///
/// Returns the JavaScript source on success, or throws a JS error on failure.
#[wasm_bindgen(js_name = compileGraph)]
pub fn compile_graph(source: &str, config_json: Option<String>) -> Result<String, JsError> {
    let config = config_from(config_json)?;
    crate::compile_with(source, &config)
        .map(|output| output.code)
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Compile graph JSON to a self-contained HTML page.
#[wasm_bindgen(js_name = compileHtml)]
pub fn compile_html(source: &str, config_json: Option<String>) -> Result<String, JsError> {
    let config = config_from(config_json)?;
    crate::compile_html(source, &config).map_err(|e| JsError::new(&e.to_string()))
}

/// Module load plan for a config, as an array of
/// `{ name, file, className, required }`.
#[wasm_bindgen(js_name = resolveModules)]
pub fn resolve_modules(config_json: Option<String>) -> Result<JsValue, JsError> {
    let config = config_from(config_json)?;
    let plan = config.registry().load_plan().map_err(|e| JsError::new(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&plan).map_err(|e| JsError::new(&e.to_string()))
}

/// Compile graph JSON and wrap it in an `update-game-graph` message ready
/// for `postMessage`.
#[wasm_bindgen(js_name = previewMessage)]
pub fn preview_message(source: &str, config_json: Option<String>) -> Result<JsValue, JsError> {
    let config = config_from(config_json)?;
    let output = crate::compile_with(source, &config).map_err(|e| JsError::new(&e.to_string()))?;
    let data: serde_json::Value = serde_json::from_str(source).map_err(|e| JsError::new(&e.to_string()))?;
    let message = PreviewMessage::now(data).with_code(crate::runtime::game_js(&output));
    message
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Validate graph JSON without producing a page.
///
/// Returns an object with:
/// - `valid`: boolean
/// - `error`: string (only if invalid)
/// - `warnings`: string[] (only if valid)
/// - `nodes`: number (only if valid)
/// - `assets`: string[] (only if valid)
#[wasm_bindgen]
pub fn validate(source: &str) -> JsValue {
    let obj = js_sys::Object::new();
    match crate::compile_graph(source) {
        Ok(output) => {
            let _ = js_sys::Reflect::set(&obj, &"valid".into(), &JsValue::TRUE);
            let warnings = js_sys::Array::new();
            for w in &output.warnings {
                warnings.push(&JsValue::from_str(w));
            }
            let _ = js_sys::Reflect::set(&obj, &"warnings".into(), &warnings.into());
            let _ = js_sys::Reflect::set(&obj, &"nodes".into(), &JsValue::from_f64(output.node_count as f64));
            let assets = js_sys::Array::new();
            for a in &output.assets {
                assets.push(&JsValue::from_str(&a.url));
            }
            let _ = js_sys::Reflect::set(&obj, &"assets".into(), &assets.into());
        }
        Err(e) => {
            let _ = js_sys::Reflect::set(&obj, &"valid".into(), &JsValue::FALSE);
            let _ = js_sys::Reflect::set(&obj, &"error".into(), &JsValue::from_str(&e.to_string()));
        }
    }
    obj.into()
}
