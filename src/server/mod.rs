use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::{self, State};
use axum::http::{header, StatusCode};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use notify::{Event, RecursiveMode, Watcher};
use serde::Serialize;
use tower_livereload::LiveReloadLayer;

use crate::config::BuildConfig;
use crate::preview::PreviewMessage;
use crate::runtime;

mod page;

/// Prefix under which project files (custom modules, assets) are served.
const FILE_BASE: &str = "/files/";

struct DevState {
    graph_path: PathBuf,
    config_path: Option<PathBuf>,
    extra_modules: Option<PathBuf>,
    /// Bumped on every graph change; the host page polls it.
    revision: u64,
}

type Shared = Arc<Mutex<DevState>>;

/// Options for [`run_dev_server`].
#[derive(Debug, Clone)]
pub struct DevOptions {
    pub graph: PathBuf,
    pub config: Option<PathBuf>,
    pub modules: Option<PathBuf>,
    pub port: u16,
}

/// Start the dev server for a graph file.
///
/// Graph edits are pushed into the running preview as hot updates. Edits to
/// any other file in the project directory reload the page.
pub async fn run_dev_server(options: DevOptions) -> Result<(), Box<dyn std::error::Error>> {
    let DevOptions {
        graph,
        config,
        modules,
        port,
    } = options;
    let state: Shared = Arc::new(Mutex::new(DevState {
        graph_path: graph.clone(),
        config_path: config,
        extra_modules: modules,
        revision: 1,
    }));

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    // File watcher
    let watch_state = state.clone();
    let graph_name = graph.file_name().map(|n| n.to_os_string());
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        let Ok(event) = res else { return };
        if !(event.kind.is_modify() || event.kind.is_create()) {
            return;
        }
        let graph_changed = event.paths.iter().any(|p| p.file_name().map(|n| n.to_os_string()) == graph_name);
        if let Ok(mut s) = watch_state.lock() {
            s.revision += 1;
            tracing::debug!(revision = s.revision, graph_changed, "project changed");
        }
        if !graph_changed {
            reloader.reload();
        }
    })?;
    let project_dir = project_dir(&graph);
    watcher.watch(&project_dir, RecursiveMode::Recursive)?;

    let app = Router::new()
        .route("/", get(serve_host))
        .route("/preview.html", get(serve_preview_frame))
        .route("/update.json", get(serve_update))
        .route("/game.html", get(serve_game_page))
        .route("/graph.json", get(serve_graph))
        .route("/files/{*path}", get(serve_file))
        .layer(livereload)
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    eprintln!("nodegame dev server");
    eprintln!("  graph:     {}", graph.display());
    eprintln!("  editor:    http://localhost:{port}/");
    eprintln!("  game only: http://localhost:{port}/game.html");
    eprintln!("  watching {} for changes...", project_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    // Keep watcher alive
    drop(watcher);
    Ok(())
}

fn project_dir(graph: &Path) -> PathBuf {
    match graph.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ── Compile helper ────────────────────────────────────────────────────

struct Snapshot {
    graph_path: PathBuf,
    config: Result<BuildConfig, String>,
    source: Result<String, String>,
}

fn snapshot(state: &Shared) -> Result<Snapshot, String> {
    let s = state.lock().map_err(|e| format!("Lock error: {e}"))?;
    let config = BuildConfig::for_graph(&s.graph_path, s.config_path.as_deref())
        .and_then(|mut config| {
            if let Some(extra) = &s.extra_modules {
                config.merge_modules_file(extra)?;
            }
            Ok(config)
        })
        .map_err(|e| e.to_string());
    let source = std::fs::read_to_string(&s.graph_path).map_err(|e| format!("Read error: {e}"));
    Ok(Snapshot {
        graph_path: s.graph_path.clone(),
        config,
        source,
    })
}

fn compile(state: &Shared) -> Result<(Snapshot, crate::Build), String> {
    let snap = snapshot(state)?;
    let config = snap.config.clone()?;
    let source = snap.source.clone()?;
    let build = crate::build(&source, &config).map_err(|e| e.to_string())?;
    Ok((snap, build))
}

// ── Route handlers ────────────────────────────────────────────────────

/// Editor shell: status bar plus the preview frame.
async fn serve_host(State(state): State<Shared>) -> Html<String> {
    match snapshot(&state).and_then(|snap| {
        let layers = snap.config?.layer_table().map_err(|e| e.to_string())?;
        Ok((snap.graph_path.display().to_string(), layers))
    }) {
        Ok((title, layers)) => Html(page::build_host_page(&title, &layers)),
        Err(e) => Html(page::build_error_page("editor", &e)),
    }
}

/// Preview frame; waits for graph updates from the host.
async fn serve_preview_frame(State(state): State<Shared>) -> Html<String> {
    let shell = snapshot(&state)
        .and_then(|snap| snap.config)
        .and_then(|config| runtime::Shell::new(&config, None).map_err(|e| e.to_string()));
    match shell.and_then(|shell| runtime::preview_html(&shell, FILE_BASE).map_err(|e| e.to_string())) {
        Ok(html) => Html(html),
        Err(e) => Html(page::build_error_page("preview", &e)),
    }
}

#[derive(Serialize)]
struct UpdateResponse {
    revision: u64,
    message: Option<PreviewMessage>,
    warnings: Vec<String>,
    error: Option<String>,
}

/// Latest compile result as a preview message.
async fn serve_update(State(state): State<Shared>) -> axum::Json<UpdateResponse> {
    let revision = state.lock().map(|s| s.revision).unwrap_or_default();
    let result = compile(&state).and_then(|(snap, build)| {
        let source = snap.source?;
        let data: serde_json::Value = serde_json::from_str(&source).map_err(|e| e.to_string())?;
        Ok((data, build))
    });
    match result {
        Ok((data, build)) => axum::Json(UpdateResponse {
            revision,
            message: Some(PreviewMessage::now(data).with_code(runtime::game_js(&build.output))),
            warnings: build.output.warnings,
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "dev compile failed");
            axum::Json(UpdateResponse {
                revision,
                message: None,
                warnings: Vec::new(),
                error: Some(e),
            })
        }
    }
}

/// Standalone single-file game page.
async fn serve_game_page(State(state): State<Shared>) -> Html<String> {
    match compile(&state) {
        Ok((snap, build)) => match runtime::wrap_html_at(&build.output, &build.shell, FILE_BASE) {
            Ok(html) => Html(html),
            Err(e) => Html(page::build_error_page(&snap.graph_path.display().to_string(), &e.to_string())),
        },
        Err(e) => Html(page::build_error_page("game", &e)),
    }
}

async fn serve_graph(State(state): State<Shared>) -> ([(header::HeaderName, &'static str); 1], String) {
    let body = snapshot(&state)
        .and_then(|snap| snap.source)
        .unwrap_or_else(|e| format!(r#"{{"error":{}}}"#, runtime::script_json(&e).unwrap_or_default()));
    ([(header::CONTENT_TYPE, "application/json")], body)
}

/// Project files, confined to the graph's directory.
async fn serve_file(
    State(state): State<Shared>,
    extract::Path(path): extract::Path<String>,
) -> Result<([(header::HeaderName, &'static str); 1], Vec<u8>), StatusCode> {
    let relative = Path::new(&path);
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(StatusCode::FORBIDDEN);
    }
    let root = state
        .lock()
        .map(|s| project_dir(&s.graph_path))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let bytes = tokio::fs::read(root.join(relative)).await.map_err(|e| {
        tracing::debug!(file = %path, error = %e, "file not served");
        StatusCode::NOT_FOUND
    })?;
    Ok(([(header::CONTENT_TYPE, content_type(relative))], bytes))
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("a/egg.PNG")), "image/png");
        assert_eq!(content_type(Path::new("modules/score.js")), "text/javascript");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn project_dir_of_bare_file_is_cwd() {
        assert_eq!(project_dir(Path::new("graph.json")), PathBuf::from("."));
        assert_eq!(project_dir(Path::new("demo/graph.json")), PathBuf::from("demo"));
    }
}
