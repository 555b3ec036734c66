//! Runtime shell: the HTML/CSS/JS that boots the rendering library, loads
//! modules and assets, and drives the frame loop around a compiled game.
//!
//! This module is split into:
//! - `html`: page builders (single file, exported index, preview frame)
//! - `loader`: module loader script for a resolved load plan
//! - `builtins`: sources of the stock runtime modules
//! - `helpers`: escaping and small shared snippets

mod builtins;
mod helpers;
mod html;
mod loader;

pub use builtins::builtin_module;
pub use html::{game_js, index_html, preview_html, style_css, wrap_html, wrap_html_at, Shell};
pub use loader::loader_js;
pub(crate) use helpers::{html_escape, script_json};
