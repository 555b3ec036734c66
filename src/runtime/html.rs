//! Pages that host a compiled game: a self-contained single file, the
//! exported `index.html`, and the dev preview frame.

use crate::codegen::CompileOutput;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::export::Manifest;
use crate::layers::LayerTable;
use crate::modules::LoadStep;
use crate::nodes::{js_string, StageProps};
use crate::preview;

use super::builtins::builtin_module;
use super::helpers::{html_escape, inline_script, script_json, warnings_js};
use super::loader::loader_js;

/// Everything a page needs besides the game program itself.
#[derive(Debug, Clone)]
pub struct Shell {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub pixi_url: String,
    pub layers: LayerTable,
    pub plan: Vec<LoadStep>,
}

impl Shell {
    /// Resolve the module plan and layer table. Canvas settings come from the
    /// config first, then the graph's stage node, then stage defaults.
    pub fn new(config: &BuildConfig, stage: Option<&StageProps>) -> Result<Self> {
        let stage = stage.cloned().unwrap_or_default();
        Ok(Self {
            title: config.title.clone(),
            width: config.width.unwrap_or(stage.width),
            height: config.height.unwrap_or(stage.height),
            background: config.background.clone().unwrap_or(stage.background),
            pixi_url: config.pixi_url.clone(),
            layers: config.layer_table()?,
            plan: config.registry().load_plan()?,
        })
    }

    fn z(&self, path: &str, fallback: i32) -> i32 {
        self.layers.get(path).unwrap_or(fallback)
    }
}

/// Page stylesheet: layout plus one rule per layer.
pub fn style_css(shell: &Shell) -> String {
    format!(
        r#"* {{ margin: 0; padding: 0; box-sizing: border-box; }}
html, body {{ width: 100%; height: 100%; overflow: hidden; background: #000; }}
#game {{
  position: fixed;
  inset: 0;
  display: flex;
  align-items: center;
  justify-content: center;
  z-index: {stage};
}}
#game canvas {{ display: block; touch-action: none; }}
#boot-error {{
  position: fixed;
  left: 50%;
  top: 50%;
  transform: translate(-50%, -50%);
  max-width: 80vw;
  padding: 16px 20px;
  color: #ff8a80;
  background: rgba(20, 20, 20, 0.92);
  border: 1px solid #5a2020;
  border-radius: 6px;
  font: 13px/1.6 'JetBrains Mono', 'Fira Code', monospace;
  white-space: pre-wrap;
  z-index: {modal};
}}
.debug-overlay {{
  position: fixed;
  top: 8px;
  left: 8px;
  padding: 4px 8px;
  color: #9cff9c;
  background: rgba(0, 0, 0, 0.6);
  font: 11px 'JetBrains Mono', monospace;
  pointer-events: none;
}}
{layers}"#,
        stage = shell.z("GAME.STAGE", 10),
        modal = shell.z("MODAL.DIALOG", 2010),
        layers = shell.layers.css(),
    )
}

/// Script defining `bootGame(code?)`, `teardownGame()` and
/// `NodeGame.start(options)`. Needs the loader script first.
fn boot_js(shell: &Shell) -> String {
    format!(
        r#"(function (global) {{
  'use strict';
  const NodeGame = global.NodeGame;
  const ctx = {{ app: null, game: null, manifest: null, assetBase: '', modules: {{}} }};
  NodeGame.ctx = ctx;

  function showError(err) {{
    console.error('[nodegame]', err);
    let el = document.getElementById('boot-error');
    if (!el) {{
      el = document.createElement('div');
      el.id = 'boot-error';
      document.body.appendChild(el);
    }}
    el.textContent = String(err && err.message ? err.message : err);
  }}
  NodeGame.showError = showError;

  function fit(app) {{
    const scale = Math.min(global.innerWidth / {width}, global.innerHeight / {height});
    app.view.style.width = Math.floor({width} * scale) + 'px';
    app.view.style.height = Math.floor({height} * scale) + 'px';
  }}

  function createApp() {{
    const app = new PIXI.Application({{
      width: {width},
      height: {height},
      background: {background},
      antialias: true,
    }});
    document.getElementById('game').appendChild(app.view);
    fit(app);
    global.addEventListener('resize', () => fit(app));
    app.ticker.add(() => {{
      const dt = app.ticker.deltaMS;
      NodeGame.updateModules(ctx, dt);
      if (ctx.game) ctx.game.update(dt);
    }});
    return app;
  }}

  global.bootGame = function (code) {{
    if (typeof code === 'string') new Function(code)();
    if (typeof global.initGame !== 'function') throw new Error('game program did not define initGame');
    ctx.game = global.initGame(ctx.app);
    if (ctx.events) ctx.events.emit('game:started');
  }};

  global.teardownGame = function () {{
    if (!ctx.game) return;
    ctx.game.destroy();
    ctx.game = null;
  }};

  NodeGame.start = async function (options) {{
    options = options || {{}};
    ctx.manifest = options.manifest || null;
    ctx.assetBase = options.assetBase || '';
    try {{
      ctx.app = createApp();
      await NodeGame.loadModules(ctx, options.moduleBase || '');
      if (options.autostart) global.bootGame();
    }} catch (e) {{
      showError(e);
    }}
  }};
}})(window);
"#,
        width = shell.width,
        height = shell.height,
        background = js_string(&shell.background),
    )
}

/// The game program plus `console.warn` calls for compiler warnings.
pub fn game_js(output: &CompileOutput) -> String {
    let mut js = output.code.clone();
    js.push_str(&warnings_js(&output.warnings));
    js
}

fn page_head(shell: &Shell, style: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1, user-scalable=no">
<title>{title}</title>
{style}
<script src="{pixi}"></script>
</head>
<body>
<div id="game"></div>
"#,
        title = html_escape(&shell.title),
        pixi = html_escape(&shell.pixi_url),
    )
}

/// Stock module sources inlined as scripts, in plan order.
fn inline_builtins(shell: &Shell) -> String {
    let mut out = String::new();
    for step in &shell.plan {
        if let Some(source) = builtin_module(&step.file) {
            out.push_str(&format!("<script>\n{}</script>\n", inline_script(source)));
        }
    }
    out
}

/// One self-contained HTML file. Only the rendering library, custom module
/// files and assets are fetched.
pub fn wrap_html(output: &CompileOutput, shell: &Shell, manifest: &Manifest) -> Result<String> {
    let start = format!("manifest: {}, autostart: true", script_json(manifest)?);
    single_page(output, shell, &start)
}

/// Like [`wrap_html`] for a page served next to the project files: no
/// manifest, modules and relative assets come from `file_base`.
pub fn wrap_html_at(output: &CompileOutput, shell: &Shell, file_base: &str) -> Result<String> {
    let base = js_string(file_base);
    let start = format!("moduleBase: {base}, assetBase: {base}, manifest: null, autostart: true");
    single_page(output, shell, &start)
}

fn single_page(output: &CompileOutput, shell: &Shell, start_options: &str) -> Result<String> {
    let style = format!("<style>\n{}</style>", style_css(shell));
    let mut html = page_head(shell, &style);
    html.push_str(&format!("<script>\n{}</script>\n", inline_script(&loader_js(&shell.plan)?)));
    html.push_str(&inline_builtins(shell));
    html.push_str(&format!("<script>\n{}</script>\n", inline_script(&game_js(output))));
    html.push_str(&format!("<script>\n{}</script>\n", inline_script(&boot_js(shell))));
    html.push_str(&format!(
        "<script>\nNodeGame.start({{ {start_options} }});\n</script>\n</body>\n</html>\n"
    ));
    Ok(html)
}

/// `index.html` of an exported bundle; loads the sibling files.
pub fn index_html(shell: &Shell) -> String {
    let mut html = page_head(shell, r#"<link rel="stylesheet" href="style.css">"#);
    html.push_str("<script src=\"loader.js\"></script>\n");
    html.push_str("<script src=\"game.js\"></script>\n");
    html.push_str(&format!("<script>\n{}</script>\n", inline_script(&boot_js(shell))));
    html.push_str(
        r#"<script>
fetch('manifest.json')
  .then((r) => (r.ok ? r.json() : null))
  .catch((e) => { console.warn('[nodegame] manifest unavailable', e); return null; })
  .then((manifest) => NodeGame.start({ manifest, autostart: true }));
</script>
</body>
</html>
"#,
    );
    html
}

/// Dev preview frame: boots the runtime without a game and waits for
/// `update-game-graph` messages. Custom modules and relative assets are
/// served from `file_base`.
pub fn preview_html(shell: &Shell, file_base: &str) -> Result<String> {
    let style = format!("<style>\n{}</style>", style_css(shell));
    let mut html = page_head(shell, &style);
    html.push_str(&format!("<script>\n{}</script>\n", inline_script(&loader_js(&shell.plan)?)));
    html.push_str(&inline_builtins(shell));
    html.push_str(&format!("<script>\n{}</script>\n", inline_script(&boot_js(shell))));
    html.push_str(&format!("<script>\n{}</script>\n", inline_script(&preview::receiver_js())));
    html.push_str(&format!(
        "<script>\nNodeGame.start({{ moduleBase: {base}, assetBase: {base}, autostart: false }});\n</script>\n</body>\n</html>\n",
        base = js_string(file_base),
    ));
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{generate, GenerateOptions};
    use crate::graph::Graph;

    fn shell() -> Shell {
        Shell::new(&BuildConfig::default(), None).unwrap()
    }

    fn compiled() -> CompileOutput {
        let graph = Graph::from_json(
            r#"{"nodes": [{"id": 1, "type": "game/stage", "properties": {"width": 400, "height": 300}},
                          {"id": 2, "type": "game/sprite"}]}"#,
        )
        .unwrap();
        generate(&graph, &GenerateOptions::default()).unwrap()
    }

    #[test]
    fn shell_prefers_config_over_stage() {
        let output = compiled();
        let config = BuildConfig {
            width: Some(1024),
            ..BuildConfig::default()
        };
        let shell = Shell::new(&config, output.stage.as_ref()).unwrap();
        assert_eq!((shell.width, shell.height), (1024, 300));
        assert_eq!(shell.background, "#1a1a2e");
    }

    #[test]
    fn single_file_page_orders_scripts() {
        let output = compiled();
        let manifest = Manifest::from_assets(&output.assets);
        let html = wrap_html(&output, &shell(), &manifest).unwrap();
        let loader = html.find("NodeGame.loadModules = ").unwrap();
        let events = html.find("NodeGame.define('EventBus'").unwrap();
        let game = html.find("function initGame(app)").unwrap();
        let start = html.find("NodeGame.start({ manifest:").unwrap();
        assert!(loader < events && events < game && game < start);
        assert!(html.contains("sprite has no texture"));
        assert!(html.contains(".z-floating-panels { z-index: 1000; }"));
    }

    #[test]
    fn served_page_loads_from_file_base() {
        let html = wrap_html_at(&compiled(), &shell(), "/files/").unwrap();
        assert!(html.contains(r#"NodeGame.start({ moduleBase: "/files/", assetBase: "/files/", manifest: null"#));
    }

    #[test]
    fn index_page_references_bundle_files() {
        let html = index_html(&shell());
        for file in ["style.css", "loader.js", "game.js", "manifest.json"] {
            assert!(html.contains(file), "{file} not referenced");
        }
        assert!(!html.contains("function initGame"));
    }

    #[test]
    fn preview_page_waits_for_messages() {
        let html = preview_html(&shell(), "/files/").unwrap();
        assert!(html.contains("autostart: false"));
        assert!(html.contains(r#"moduleBase: "/files/""#));
        assert!(html.contains("update-game-graph"));
    }

    #[test]
    fn title_is_escaped() {
        let config = BuildConfig {
            title: "<Eggs & Co>".into(),
            ..BuildConfig::default()
        };
        let html = index_html(&Shell::new(&config, None).unwrap());
        assert!(html.contains("<title>&lt;Eggs &amp; Co&gt;</title>"));
    }
}
