use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cv_builder::app_log;
use cv_builder::document::html::render_preview;
use cv_builder::document::{DocumentRenderer, TypstRenderer};
use cv_builder::wizard::validate_section;
use cv_builder::{start_web_server, AggregatedCvData, AppConfig, SectionKey};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "cvbuilder")]
#[command(about = "Guided CV builder for healthcare professionals")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the wizard API server (default)
    Serve,
    /// Render the HTML preview of an aggregated CV file
    Preview {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compile an aggregated CV file to PDF
    Render {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Validate every section of an aggregated CV file
    Check {
        #[arg(long)]
        data: PathBuf,
    },
}

fn init_tracing(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cv_builder=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}

async fn read_cv_data(path: &Path) -> Result<AggregatedCvData> {
    let raw = cv_builder::utils::read_file_safe(path).await?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid CV data in {}", path.display()))
}

async fn preview(data: &Path, output: Option<PathBuf>) -> Result<()> {
    let cv = read_cv_data(data).await?;
    let html = render_preview(&cv);
    match output {
        Some(path) => {
            cv_builder::utils::write_file_safe(&path, html.as_bytes()).await?;
            app_log!(info, "Preview written to {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

async fn render(config: &AppConfig, data: &Path, output: &Path) -> Result<()> {
    let cv = read_cv_data(data).await?;
    let renderer = TypstRenderer::new(config.typst_bin.clone(), config.scratch_dir.clone());
    let bytes = renderer.render(&cv).await?;
    cv_builder::utils::write_file_safe(output, &bytes).await?;
    app_log!(info, "PDF written to {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

async fn check(data: &Path) -> Result<()> {
    let cv = read_cv_data(data).await?;
    let mut complete = 0;

    for key in SectionKey::ALL {
        match cv.get(key) {
            None => println!("[ ] {:<28} missing", key.name()),
            Some(value) if value.is_empty() => println!("[ ] {:<28} empty", key.name()),
            Some(value) => match validate_section(key, value) {
                Ok(()) => {
                    complete += 1;
                    println!("[x] {:<28} ok", key.name());
                }
                Err(errors) => {
                    println!("[!] {:<28} {}", key.name(), errors);
                    for error in &errors.errors {
                        println!("      {}: {}", error.path, error.message);
                    }
                }
            },
        }
    }

    let percent = complete * 100 / SectionKey::ALL.len();
    println!("{}/{} sections complete ({}%)", complete, SectionKey::ALL.len(), percent);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_tracing(&config.log_file)?;
    config.log_loaded();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            app_log!(info, "Starting CV builder");
            start_web_server(config).await
        }
        Command::Preview { data, output } => preview(&data, output).await,
        Command::Render { data, output } => render(&config, &data, &output).await,
        Command::Check { data } => check(&data).await,
    }
}
