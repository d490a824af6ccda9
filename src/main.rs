mod config;

/// Version injected at compile time via DATAPROJ_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("DATAPROJ_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::{Config, OutputFormat};
use dataproj::{Deployment, ProjectSpec};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Compile a data project spec into a deployment document
#[derive(Parser, Debug)]
#[command(name = "dataproj", version, about, long_about = None)]
struct Args {
    /// Project spec file (YAML, or JSON with a .json extension)
    spec: PathBuf,

    /// GCP project to compile for (overrides the spec's project_id)
    #[arg(short, long)]
    project: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the deployment here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Save the effective project as the default for later runs
    #[arg(long)]
    remember_project: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("dataproj {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("dataproj").join("dataproj.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".dataproj").join("dataproj.log");
    }
    PathBuf::from("dataproj.log")
}

/// Load a spec file, picking the parser by extension
fn load_spec(path: &Path) -> Result<ProjectSpec> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec file {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let spec = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON spec {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML spec {}", path.display()))?
    };
    Ok(spec)
}

fn render(deployment: &Deployment, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Yaml => serde_yaml::to_string(deployment)?,
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(deployment)?;
            text.push('\n');
            text
        }
    };
    Ok(text)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();
    let spec = load_spec(&args.spec)?;
    let project = config.effective_project(args.project.as_deref(), spec.project_id.as_deref());

    let deployment = dataproj::compile_deployment(&spec, project.as_deref())
        .with_context(|| format!("Failed to compile {}", args.spec.display()))?
        .with_imports(config.imports.clone());
    tracing::info!(
        "Compiled {} resources from {:?}",
        deployment.resources.len(),
        args.spec
    );

    let text = render(&deployment, config.effective_format(args.format))?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote deployment to {:?}", path);
        }
        None => print!("{}", text),
    }

    if args.remember_project {
        let effective = project.or_else(|| spec.project_id.clone());
        if let Some(project) = effective {
            config
                .set_project(&project)
                .context("Failed to save configuration")?;
            tracing::info!("Saved default project {}", project);
        }
    }

    Ok(())
}
