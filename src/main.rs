use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nodegame::config::BuildConfig;
use nodegame::layers::LayerTable;
use nodegame::modules::ModuleRegistry;

#[derive(Parser)]
#[command(name = "nodegame", version)]
#[command(about = "nodegame: compile node graphs into playable H5 games")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a graph JSON file to a game program or HTML page
    Compile {
        /// Input graph JSON file
        file: PathBuf,

        /// Output a self-contained HTML file
        #[arg(long)]
        html: bool,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,

        /// Module configuration merged over the project config
        #[arg(long)]
        modules: Option<PathBuf>,

        /// Project config (default: nodegame.json next to the graph)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep unresolved template placeholders instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Validate a graph file without producing output
    Check {
        /// Input graph JSON file
        file: PathBuf,

        /// Project config (default: nodegame.json next to the graph)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the module load order for a module configuration file
    Order {
        /// Module configuration JSON
        file: PathBuf,

        /// Resolve the file on its own, without the stock modules
        #[arg(long)]
        bare: bool,
    },

    /// Print the z-index layer table
    Layers {
        /// Print as CSS classes
        #[arg(long)]
        css: bool,

        /// Project config with layer overrides
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Start the live preview server for a graph file
    Dev {
        /// Input graph JSON file
        file: PathBuf,

        /// Server port
        #[arg(long, default_value_t = 3333)]
        port: u16,

        /// Project config (default: nodegame.json next to the graph)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Module configuration merged over the project config
        #[arg(long)]
        modules: Option<PathBuf>,
    },

    /// Export a runnable bundle: HTML/CSS/JS runtime, manifest and assets
    Export {
        /// Input graph JSON file
        file: PathBuf,

        /// Output directory
        #[arg(long, default_value = "dist")]
        outdir: PathBuf,

        /// Project config (default: nodegame.json next to the graph)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Module configuration merged over the project config
        #[arg(long)]
        modules: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            file,
            html,
            o,
            modules,
            config,
            lenient,
        } => compile(&file, html, o.as_deref(), modules.as_deref(), config.as_deref(), lenient),
        Commands::Check { file, config } => check(&file, config.as_deref()),
        Commands::Order { file, bare } => order(&file, bare),
        Commands::Layers { css, config } => layers(css, config.as_deref()),
        Commands::Dev {
            file,
            port,
            config,
            modules,
        } => dev(nodegame::server::DevOptions {
            graph: file,
            config,
            modules,
            port,
        }),
        Commands::Export {
            file,
            outdir,
            config,
            modules,
        } => export(&file, &outdir, config.as_deref(), modules.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn read_source(file: &Path) -> anyhow::Result<String> {
    fs::read_to_string(file).with_context(|| format!("cannot read '{}'", file.display()))
}

fn load_config(graph: &Path, config: Option<&Path>, modules: Option<&Path>) -> anyhow::Result<BuildConfig> {
    let mut config = BuildConfig::for_graph(graph, config)?;
    if let Some(modules) = modules {
        config.merge_modules_file(modules)?;
    }
    Ok(config)
}

fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("warning: {w}");
    }
}

fn compile(
    file: &Path,
    html: bool,
    o: Option<&Path>,
    modules: Option<&Path>,
    config: Option<&Path>,
    lenient: bool,
) -> anyhow::Result<()> {
    let source = read_source(file)?;
    let mut config = load_config(file, config, modules)?;
    if lenient {
        config.strict = false;
    }

    let build = nodegame::build(&source, &config).with_context(|| format!("{}", file.display()))?;
    print_warnings(&build.output.warnings);

    let (output_str, kind) = if html {
        (
            nodegame::runtime::wrap_html(&build.output, &build.shell, &build.manifest)?,
            "HTML",
        )
    } else {
        (build.output.code.clone(), "JS")
    };

    match o {
        Some(out_path) => {
            fs::write(out_path, &output_str).with_context(|| format!("cannot write '{}'", out_path.display()))?;
            eprintln!("wrote {kind} to {} ({} bytes)", out_path.display(), output_str.len());
        }
        None => print!("{output_str}"),
    }
    Ok(())
}

fn check(file: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let source = read_source(file)?;
    let config = load_config(file, config, None)?;
    let build = nodegame::build(&source, &config).with_context(|| format!("{}", file.display()))?;
    print_warnings(&build.output.warnings);

    let warning_count = build.output.warnings.len();
    if warning_count > 0 {
        eprintln!(
            "{}: {} nodes, {} warning(s)",
            file.display(),
            build.output.node_count,
            warning_count
        );
    } else {
        eprintln!("{}: {} nodes, ok", file.display(), build.output.node_count);
    }
    Ok(())
}

fn order(file: &Path, bare: bool) -> anyhow::Result<()> {
    let mut registry = if bare {
        ModuleRegistry::new()
    } else {
        ModuleRegistry::with_defaults()
    };
    registry.register_file(file)?;
    for (i, step) in registry.load_plan()?.iter().enumerate() {
        let marker = if step.required { "" } else { " (optional)" };
        println!("{:>2}. {:<12} {}{marker}", i + 1, step.name, step.file);
    }
    Ok(())
}

fn layers(css: bool, config: Option<&Path>) -> anyhow::Result<()> {
    let table = match config {
        Some(path) => BuildConfig::load(path)?.layer_table()?,
        None => LayerTable::default(),
    };
    if css {
        print!("{}", table.css());
    } else {
        for (path, z) in table.entries() {
            println!("{z:>6}  {path}");
        }
    }
    Ok(())
}

fn dev(options: nodegame::server::DevOptions) -> anyhow::Result<()> {
    if !options.graph.is_file() {
        bail!("'{}' is not a file", options.graph.display());
    }
    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    rt.block_on(nodegame::server::run_dev_server(options))
        .map_err(|e| anyhow::anyhow!("dev server failed: {e}"))
}

fn export(file: &Path, outdir: &Path, config: Option<&Path>, modules: Option<&Path>) -> anyhow::Result<()> {
    let source = read_source(file)?;
    let config = load_config(file, config, modules)?;
    let build = nodegame::build(&source, &config).with_context(|| format!("{}", file.display()))?;
    print_warnings(&build.output.warnings);

    let project_dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let report = nodegame::export::write_bundle(&build.output, &build.shell, &project_dir, outdir)?;

    for f in &report.files {
        eprintln!("  {}", f.display());
    }
    for a in &report.failed_assets {
        eprintln!("warning: asset '{a}' not copied");
    }
    eprintln!(
        "exported {} files to {} ({} assets copied, {} missing)",
        report.files.len(),
        outdir.display(),
        report.copied_assets,
        report.failed_assets.len()
    );
    Ok(())
}
