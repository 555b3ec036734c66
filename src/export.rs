//! Export bundle: the asset manifest plus a directory with the HTML/CSS/JS
//! runtime package, ready to serve from any static host.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen::CompileOutput;
use crate::error::{GameError, Result};
use crate::nodes::{AssetKind, AssetRef};
use crate::runtime::{self, Shell};

pub const MANIFEST_VERSION: &str = "1.0";

/// `manifest.json` of an exported game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub assets: Vec<ManifestAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// Location inside the bundle, or the source URL for remote assets.
    pub path: String,
    /// URL as written in the graph.
    pub source: String,
}

/// What [`write_bundle`] produced.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub files: Vec<PathBuf>,
    pub copied_assets: usize,
    /// Asset sources that could not be copied; the game still runs without
    /// them.
    pub failed_assets: Vec<String>,
}

impl ManifestAsset {
    /// Remote assets are referenced in place, local ones are copied.
    pub fn is_remote(&self) -> bool {
        is_remote(&self.source)
    }
}

impl Manifest {
    pub fn from_assets(assets: &[AssetRef]) -> Self {
        let (mut images, mut sounds) = (0, 0);
        // bundle path -> the source that claimed it first
        let mut claimed: HashMap<String, &str> = HashMap::new();
        let assets = assets
            .iter()
            .map(|asset| {
                let id = match asset.kind {
                    AssetKind::Image => {
                        images += 1;
                        format!("image_{images}")
                    }
                    AssetKind::Audio => {
                        sounds += 1;
                        format!("audio_{sounds}")
                    }
                };
                let path = if is_remote(&asset.url) {
                    asset.url.clone()
                } else {
                    claim_path(bundle_path(&asset.url), &asset.url, &mut claimed)
                };
                ManifestAsset {
                    id,
                    kind: asset.kind,
                    path,
                    source: asset.url.clone(),
                }
            })
            .collect();
        Self {
            version: MANIFEST_VERSION.to_string(),
            assets,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn is_remote(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    // Single-letter schemes are drive letters.
    url.split_once(':').is_some_and(|(scheme, _)| {
        scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c))
    })
}

/// `./img/../egg.png` → `assets/img/egg.png`. Only plain path components
/// survive so nothing lands outside `assets/`.
fn bundle_path(url: &str) -> String {
    let parts: Vec<String> = Path::new(url)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        "assets/unnamed".to_string()
    } else {
        format!("assets/{}", parts.join("/"))
    }
}

/// Give `path` to `source`, suffixing the file stem (`egg_2.png`) when a
/// different source already holds it.
fn claim_path<'a>(path: String, source: &'a str, claimed: &mut HashMap<String, &'a str>) -> String {
    let mut candidate = path.clone();
    let mut n = 1;
    while let Some(owner) = claimed.get(&candidate) {
        if *owner == source {
            return candidate;
        }
        n += 1;
        candidate = suffixed(&path, n);
    }
    claimed.insert(candidate.clone(), source);
    candidate
}

fn suffixed(path: &str, n: usize) -> String {
    let (dir, file) = path.rsplit_once('/').unwrap_or(("", path));
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{n}.{ext}"),
        _ => format!("{file}_{n}"),
    };
    if dir.is_empty() {
        file
    } else {
        format!("{dir}/{file}")
    }
}

/// Module files keep their configured relative path inside the bundle, so
/// anything but plain components is refused.
fn module_path(file: &str) -> Result<&str> {
    let path = Path::new(file);
    if file.is_empty() || path.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(GameError::message(format!(
            "module file '{file}' must be a relative path inside the project"
        )));
    }
    Ok(file)
}

fn write_file(outdir: &Path, relative: &str, contents: &str, report: &mut ExportReport) -> Result<()> {
    let path = outdir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| GameError::io(format!("cannot create '{}'", parent.display()), e))?;
    }
    std::fs::write(&path, contents).map_err(|e| GameError::io(format!("cannot write '{}'", path.display()), e))?;
    tracing::debug!(file = %path.display(), "wrote bundle file");
    report.files.push(path);
    Ok(())
}

/// Write the runtime package for `output` into `outdir`.
///
/// Local assets and custom module files are looked up relative to
/// `project_dir`. A missing asset is logged and skipped; a missing required
/// module file fails the export.
pub fn write_bundle(output: &CompileOutput, shell: &Shell, project_dir: &Path, outdir: &Path) -> Result<ExportReport> {
    let manifest = Manifest::from_assets(&output.assets);
    let mut report = ExportReport::default();

    write_file(outdir, "index.html", &runtime::index_html(shell), &mut report)?;
    write_file(outdir, "style.css", &runtime::style_css(shell), &mut report)?;
    write_file(outdir, "loader.js", &runtime::loader_js(&shell.plan)?, &mut report)?;
    write_file(outdir, "game.js", &runtime::game_js(output), &mut report)?;
    write_file(outdir, "manifest.json", &manifest.to_json_pretty()?, &mut report)?;

    for step in &shell.plan {
        let file = module_path(&step.file)?;
        if let Some(source) = runtime::builtin_module(file) {
            write_file(outdir, file, source, &mut report)?;
            continue;
        }
        let from = project_dir.join(file);
        match std::fs::read_to_string(&from) {
            Ok(source) => write_file(outdir, file, &source, &mut report)?,
            Err(e) if step.required => {
                return Err(GameError::io(
                    format!("required module '{}' not found at '{}'", step.name, from.display()),
                    e,
                ));
            }
            Err(e) => tracing::warn!(module = %step.name, error = %e, "optional module file missing, skipped"),
        }
    }

    for asset in manifest.assets.iter().filter(|a| !a.is_remote()) {
        let from = project_dir.join(&asset.source);
        let to = outdir.join(&asset.path);
        let copied = to
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::copy(&from, &to));
        match copied {
            Ok(_) => {
                report.copied_assets += 1;
                report.files.push(to);
            }
            Err(e) => {
                tracing::warn!(asset = %asset.source, error = %e, "asset copy failed, continuing without it");
                report.failed_assets.push(asset.source.clone());
            }
        }
    }

    Ok(report)
}
