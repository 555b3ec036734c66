pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod layers;
pub mod lexer;
pub mod modules;
pub mod nodes;
pub mod parser;
pub mod physics;
pub mod preview;
pub mod runtime;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;
pub mod template;
pub mod token;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use codegen::{generate, CompileOutput, GenerateOptions};
pub use config::BuildConfig;
pub use error::{GameError, Result};
pub use graph::Graph;

use export::Manifest;
use runtime::Shell;

/// A compiled game with the shell and manifest around it.
#[derive(Debug, Clone)]
pub struct Build {
    pub output: CompileOutput,
    pub shell: Shell,
    pub manifest: Manifest,
}

/// Compile graph JSON to the game program with default settings.
pub fn compile_graph(source: &str) -> Result<CompileOutput> {
    compile_with(source, &BuildConfig::default())
}

/// Compile graph JSON to the game program.
pub fn compile_with(source: &str, config: &BuildConfig) -> Result<CompileOutput> {
    let graph = Graph::from_json(source)?;
    generate(
        &graph,
        &GenerateOptions {
            unresolved: config.unresolved(),
            timestamp: None,
        },
    )
}

/// Compile and resolve everything a page or bundle needs.
pub fn build(source: &str, config: &BuildConfig) -> Result<Build> {
    let output = compile_with(source, config)?;
    let shell = Shell::new(config, output.stage.as_ref())?;
    let manifest = Manifest::from_assets(&output.assets);
    Ok(Build {
        output,
        shell,
        manifest,
    })
}

/// Compile graph JSON to a self-contained HTML page.
pub fn compile_html(source: &str, config: &BuildConfig) -> Result<String> {
    let build = build(source, config)?;
    runtime::wrap_html(&build.output, &build.shell, &build.manifest)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::error::ErrorKind;

    const EGG_GAME: &str = r##"{
        "nodes": [
            {"id": 1, "type": "game/stage", "title": "Stage",
             "properties": {"width": 480, "height": 800, "background": "#102030"}},
            {"id": 2, "type": "game/container", "title": "Board",
             "outputs": [{"name": "container", "links": [1, 2]}]},
            {"id": 3, "type": "game/sprite", "title": "Egg",
             "properties": {"texture": "egg.png", "x": 240, "y": 700},
             "inputs": [{"name": "parent", "link": 1}]},
            {"id": 4, "type": "game/text", "title": "Score",
             "properties": {"text": "Score: 0", "x": 12, "y": 12},
             "inputs": [{"name": "parent", "link": 2}]}
        ],
        "links": [
            [1, 2, 0, 3, 0, "container"],
            [2, 2, 0, 4, 0, "container"]
        ]
    }"##;

    #[test]
    fn end_to_end_egg_game() {
        let output = compile_graph(EGG_GAME).expect("compilation should succeed");
        assert_eq!(output.node_count, 4);
        assert!(output.code.contains("const container_1 = new PIXI.Container();"));
        assert!(output.code.contains("container_1.addChild(sprite_1);"));
        assert!(output.code.contains("container_1.addChild(text_1);"));
        assert!(output.code.contains("app.renderer.resize(480, 800);"));
        assert_eq!(output.assets.len(), 1);
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    }

    #[test]
    fn html_page_uses_stage_size() {
        let html = compile_html(EGG_GAME, &BuildConfig::default()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("width: 480,"));
        assert!(html.contains(r#""source":"egg.png""#));
    }

    #[test]
    fn build_resolves_modules_from_config() {
        let config = BuildConfig::from_json(r#"{"modules": {"debug": {"priority": -5}}}"#).unwrap();
        let build = build(EGG_GAME, &config).unwrap();
        let names: Vec<_> = build.shell.plan.iter().map(|s| s.name.as_str()).collect();
        // debug still waits for input, then jumps ahead of audio.
        assert_eq!(names, vec!["events", "assets", "input", "debug", "audio"]);
        assert_eq!(build.manifest.assets[0].path, "assets/egg.png");
    }

    #[test]
    fn module_cycle_fails_the_build() {
        let config = BuildConfig::from_json(
            r#"{"modules": {"a": {"dependencies": ["b"]}, "b": {"dependencies": ["a"]}}}"#,
        )
        .unwrap();
        let err = build(EGG_GAME, &config).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DependencyCycle { .. }));
    }

    #[test]
    fn script_code_is_not_rendered_as_template() {
        let graph = r#"{"nodes": [{"id": 1, "type": "logic/script", "properties": {"code": "log('{{missing}}');"}}]}"#;
        let out = compile_graph(graph).unwrap();
        assert!(out.code.contains("log('{{missing}}');"));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = compile_graph("{nodes: ").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Json(_)));
    }
}
