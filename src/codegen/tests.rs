use chrono::TimeZone;

use super::*;
use crate::error::ErrorKind;

fn options() -> GenerateOptions {
    GenerateOptions {
        unresolved: Unresolved::Error,
        timestamp: Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
    }
}

fn generate_src(src: &str) -> CompileOutput {
    let graph = Graph::from_json(src).expect("graph should parse");
    generate(&graph, &options()).expect("codegen failed")
}

#[test]
fn codegen_header_lists_count_and_types() {
    let out = generate_src(
        r#"{"nodes": [
            {"id": 1, "type": "game/stage", "title": "Stage"},
            {"id": 2, "type": "game/text", "title": "Score"},
            {"id": 3, "type": "game/text", "title": "Lives"}
        ]}"#,
    );
    assert!(out.code.contains("// Generated at: 2026-01-02T03:04:05Z"));
    assert!(out.code.contains("// Nodes: 3"));
    assert!(out.code.contains("// Node types: game/stage, game/text"));
    assert_eq!(out.node_types, vec!["game/stage", "game/text"]);
    assert_eq!(out.node_count, 3);
}

#[test]
fn codegen_two_text_nodes_get_distinct_names() {
    let out = generate_src(
        r#"{"nodes": [
            {"id": 7, "type": "game/text", "properties": {"text": "a"}},
            {"id": 9, "type": "game/text", "properties": {"text": "b"}}
        ]}"#,
    );
    assert_eq!(out.variables[&7], "text_1");
    assert_eq!(out.variables[&9], "text_2");
    assert!(out.code.contains("const text_1 = new PIXI.Text(\"a\""));
    assert!(out.code.contains("const text_2 = new PIXI.Text(\"b\""));
}

#[test]
fn codegen_upstream_block_precedes_dependent() {
    // B is listed first but depends on A.
    let out = generate_src(
        r#"{"nodes": [
            {"id": 2, "type": "game/text", "title": "B",
             "inputs": [{"name": "parent", "link": 1}]},
            {"id": 1, "type": "game/container", "title": "A",
             "outputs": [{"name": "container", "links": [1]}]}
        ],
        "links": [[1, 1, 0, 2, 0, "container"]]}"#,
    );
    let a = out.code.find("// ── Node #1: A").expect("A comment missing");
    let b = out.code.find("// ── Node #2: B").expect("B comment missing");
    assert!(a < b, "A must be emitted before B");
    assert!(out.code.contains("container_1.addChild(text_1);"));
}

#[test]
fn codegen_binds_declared_slots_by_catalog_name() {
    // The editor labels the slot "Parent"; the template still sees {{parent}}.
    let out = generate_src(
        r#"{"nodes": [
            {"id": 1, "type": "game/container"},
            {"id": 2, "type": "game/text", "title": "Score",
             "inputs": [{"name": "Parent", "link": 1}, {"name": "var", "link": 2}]},
            {"id": 3, "type": "game/container"}
        ],
        "links": [[1, 1, 0, 2, 0, "container"], [2, 3, 0, 2, 1, "container"]]}"#,
    );
    assert!(out.code.contains("container_1.addChild(text_1);"));
    assert!(!out.code.contains("container_1.addChild(container_2);"));
    assert!(out.warnings.iter().any(|w| w.contains("input 'var' clashes with a node field")));
}

#[test]
fn codegen_unlinked_parent_defaults_to_root() {
    let out = generate_src(r#"{"nodes": [{"id": 1, "type": "shape/circle"}]}"#);
    assert!(out.code.contains("root.addChild(circle_1);"));
}

#[test]
fn codegen_trigger_wiring_only_when_linked() {
    let out = generate_src(
        r#"{"nodes": [
            {"id": 1, "type": "game/button"},
            {"id": 2, "type": "audio/sound", "properties": {"src": "pop.mp3"},
             "inputs": [{"name": "trigger", "link": 1}]},
            {"id": 3, "type": "audio/sound", "properties": {"src": "bg.mp3", "looping": true}}
        ],
        "links": [[1, 1, 1, 2, 0, "event"]]}"#,
    );
    assert!(out.code.contains("button_1.clicked.connect(() => { sound_1.currentTime = 0;"));
    assert!(!out.code.contains("sound_2.currentTime = 0"));
    assert!(out.code.contains("sound_2.loop = true;"));
    assert_eq!(out.assets.len(), 2);
}

#[test]
fn codegen_each_block_expands_frames() {
    let out = generate_src(
        r#"{"nodes": [{"id": 1, "type": "game/animated-sprite",
            "properties": {"frames": ["egg_0.png", "egg_1.png"], "autoplay": false}}]}"#,
    );
    assert!(out.code.contains("PIXI.Texture.from(resolveAsset(\"egg_0.png\")),"));
    assert!(out.code.contains("PIXI.Texture.from(resolveAsset(\"egg_1.png\")),"));
    assert!(!out.code.contains("anim_1.play();"));
}

#[test]
fn codegen_script_gets_fallback_prefix() {
    let out = generate_src(
        r#"{"nodes": [{"id": 4, "type": "logic/script", "properties": {"code": "console.log(input);"}}]}"#,
    );
    assert_eq!(out.variables[&4], "script_1");
    assert!(out.code.contains("console.log(input);"));
    assert!(out.code.contains("script_1(null);"));
}

#[test]
fn codegen_runtime_contract() {
    let out = generate_src(r#"{"nodes": []}"#);
    assert!(out.code.contains("function initGame(app)"));
    assert!(out.code.contains("update(deltaTime)"));
    assert!(out.code.contains("destroy()"));
    assert!(out.code.contains("global.initGame = initGame;"));
    assert!(out.code.contains("// Node types: (none)"));
}

#[test]
fn codegen_rejects_cycles() {
    let graph = Graph::from_json(
        r#"{"nodes": [{"id": 1, "type": "game/container"}, {"id": 2, "type": "game/container"}],
            "links": [[1, 1, 0, 2, 0, null], [2, 2, 0, 1, 0, null]]}"#,
    )
    .unwrap();
    let err = generate(&graph, &options()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::GraphCycle { .. }));
}

#[test]
fn codegen_unknown_type_names_the_node() {
    let graph = Graph::from_json(r#"{"nodes": [{"id": 5, "type": "game/laser", "title": "Pew"}]}"#).unwrap();
    let err = generate(&graph, &options()).unwrap_err();
    assert!(err.to_string().starts_with("node #5 'Pew': unknown node type"), "{err}");
}

#[test]
fn codegen_warns_on_fan_in_and_extra_stage() {
    let out = generate_src(
        r#"{"nodes": [
            {"id": 1, "type": "game/stage"},
            {"id": 2, "type": "game/stage", "properties": {"width": 100}},
            {"id": 3, "type": "game/container"},
            {"id": 4, "type": "game/container"},
            {"id": 5, "type": "game/text", "inputs": [{"name": "parent", "link": 1}]}
        ],
        "links": [[1, 3, 0, 5, 0, null], [2, 4, 0, 5, 0, null]]}"#,
    );
    assert_eq!(out.stage.as_ref().map(|s| s.width), Some(720));
    assert!(out.warnings.iter().any(|w| w.contains("only the first stage")));
    assert!(out.warnings.iter().any(|w| w.contains("has 2 links, only the first is used")));
    assert!(out.code.contains("container_1.addChild(text_1);"));
}

#[test]
fn codegen_fresh_names_each_pass() {
    let graph = Graph::from_json(r#"{"nodes": [{"id": 1, "type": "game/text"}]}"#).unwrap();
    let first = generate(&graph, &options()).unwrap();
    let second = generate(&graph, &options()).unwrap();
    assert_eq!(first.variables[&1], "text_1");
    assert_eq!(second.variables[&1], "text_1");
    assert_eq!(first.code, second.code);
}
