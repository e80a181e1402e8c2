use crate::{
    catalog::{JsonCatalog, PriceCatalog},
    config::Config,
    engine::{pdftotext::PdfToTextEngine, TextExtractor},
    pipeline::{JobOutput, Pipeline},
    util::{ensure_dir, now_rfc3339, sha256_hex},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "pricelist-extract")]
#[command(about = "Vehicle price-list PDF extractor (pdftotext + line heuristics + catalog upsert)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./pricelist-extract.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the text extraction tool runs.
    Doctor {},
    /// Extract records from a PDF into a job directory.
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Parse already-extracted text and print the records.
    Parse {
        #[arg(long)]
        text: PathBuf,
    },
    /// Extract records from a PDF and upsert them into the catalog.
    Import {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print the catalog contents.
    Catalog {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = Config::load_or_default(cfg_path.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => {
            let _guard = init_logging(&args, &cfg, None)?;
            doctor(&cfg)
        }
        Command::Extract { input, out_dir } => extract(&args, &cfg, input, out_dir.as_deref()),
        Command::Parse { text } => {
            let _guard = init_logging(&args, &cfg, None)?;
            parse(&cfg, text)
        }
        Command::Import { input, catalog } => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            import(&cfg, input, catalog.as_deref())
        }
        Command::Catalog { catalog } => {
            let _guard = init_logging(&args, &cfg, None)?;
            let path = catalog_path(&cfg, catalog.as_deref());
            let cat = JsonCatalog::open(&path)?;
            println!("{}", serde_json::to_string_pretty(&cat.entries())?);
            Ok(())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("pricelist-extract.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output, so logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn doctor(cfg: &Config) -> Result<()> {
    let engine = PdfToTextEngine::new(cfg)?;
    let diag = engine.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn parse(cfg: &Config, text_path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(text_path)
        .with_context(|| format!("reading text: {}", text_path.display()))?;
    let engine = PdfToTextEngine::new(cfg)?;
    let pipeline = Pipeline::new(cfg, engine)?;
    let out = pipeline.parse_text(&raw);
    println!("{}", serde_json::to_string_pretty(&out.records)?);
    Ok(())
}

fn extract(args: &Args, cfg: &Config, input: &Path, out_override: Option<&Path>) -> Result<()> {
    validate_input(cfg, input)?;

    let engine = PdfToTextEngine::new(cfg)?;
    let pipeline = Pipeline::new(cfg, engine)?;
    let input_info = pipeline.inspect_input(input)?;

    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    let job_id = sha256_hex(format!("{}:{}", cfg_hash, input_info.sha256).as_bytes());

    let out_root = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    let job_dir = out_root.join(&job_id);

    if job_dir.exists() && !cfg.global.resume {
        return Err(anyhow!(
            "job_dir already exists and resume=false: {}",
            job_dir.display()
        ));
    }

    ensure_dir(&job_dir)?;
    ensure_dir(&job_dir.join("logs"))?;

    let log_path = resolve_log_path(cfg, Some(&job_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    info!("job_id={job_id} out={}", job_dir.display());

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(job_dir.join("effective-config.toml"), raw)?;
    }

    let started = now_rfc3339();
    let result = pipeline.run_inspected(input, input_info)?;
    write_job_outputs(cfg, &job_dir, &job_id, &started, &result)?;

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "job_id": job_id,
                "job_dir": job_dir,
                "records": result.records.len(),
                "skipped": result.report.parse.skipped.total(),
                "status": "ok"
            }))?
        );
    }

    Ok(())
}

fn write_job_outputs(
    cfg: &Config,
    job_dir: &Path,
    job_id: &str,
    started: &str,
    result: &JobOutput,
) -> Result<()> {
    if cfg.output.write_records_json {
        std::fs::write(
            job_dir.join(&cfg.output.records_filename),
            serde_json::to_string_pretty(&result.records)?,
        )?;
    }

    if cfg.output.write_report_json {
        std::fs::write(
            job_dir.join(&cfg.output.report_filename),
            serde_json::to_string_pretty(&result.report)?,
        )?;
    }

    if cfg.output.write_index_json {
        let index = serde_json::json!({
            "job_id": job_id,
            "job_name": cfg.global.job_name,
            "started": started,
            "finished": now_rfc3339(),
            "records": cfg.output.records_filename,
            "report": cfg.output.report_filename,
        });
        std::fs::write(job_dir.join("index.json"), serde_json::to_string_pretty(&index)?)?;
    }

    Ok(())
}

fn import(cfg: &Config, input: &Path, catalog_override: Option<&Path>) -> Result<()> {
    validate_input(cfg, input)?;

    let engine = PdfToTextEngine::new(cfg)?;
    let pipeline = Pipeline::new(cfg, engine)?;
    let result = pipeline
        .run_job(input)
        .with_context(|| "extraction failed during import")?;

    let path = catalog_path(cfg, catalog_override);
    let mut catalog = JsonCatalog::open(&path)?;
    let summary = catalog.upsert(&result.records)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "catalog": path,
            "extracted": result.records.len(),
            "inserted": summary.inserted,
            "updated": summary.updated,
        }))?
    );
    Ok(())
}

fn catalog_path(cfg: &Config, user: Option<&Path>) -> PathBuf {
    user.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.catalog_path))
}

pub fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    if let Some(ext) = input.extension().and_then(|s| s.to_str()) {
        if !ext.eq_ignore_ascii_case("pdf") {
            return Err(anyhow!("input is not a PDF: {}", input.display()));
        }
    } else {
        warn!("input has no extension; assuming PDF: {}", input.display());
    }

    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}

fn resolve_log_path(cfg: &Config, job_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    if let Some(job_dir) = job_dir {
        return Some(job_dir.join("logs").join("pricelist-extract.log"));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("pricelist-extract.log"))
}
