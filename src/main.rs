use clap::{Parser, Subcommand};
use scanbrief::config::LoggingSettings;
use scanbrief::pipeline::services::analysis::{AnalysisRequest, AnalysisServiceBuilder};
use scanbrief::pipeline::services::ocr::TesseractCli;
use scanbrief::{AnalysisOrchestrator, AppError, RequestedType, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tracing::info;

#[derive(Parser)]
#[command(name = "scanbrief")]
#[command(about = "Describe images and extract their text")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one image and print the JSON result
    Analyze {
        path: PathBuf,

        /// auto, general, document or technical
        #[arg(long = "type", default_value = "auto")]
        requested: RequestedType,

        /// Skip local OCR and only describe the image
        #[arg(long)]
        no_ocr: bool,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Report whether a tesseract executable can be used
    Check,
}

fn init_logging(settings: &LoggingSettings) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(settings.max_level())
        .with_writer(std::io::stderr);

    if settings.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_logging(&settings.logging);

    match cli.command {
        Commands::Analyze {
            path,
            requested,
            no_ocr,
            timeout_secs,
        } => {
            let success = analyze(&settings, path, requested, no_ocr, timeout_secs).await?;
            if !success {
                std::process::exit(2);
            }
        }
        Commands::Check => check_ocr(&settings),
    }

    Ok(())
}

async fn analyze(
    settings: &Settings,
    path: PathBuf,
    requested: RequestedType,
    no_ocr: bool,
    timeout_secs: Option<u64>,
) -> Result<bool, AppError> {
    let bytes = tokio::fs::read(&path).await?;
    info!("Read {} bytes from {}", bytes.len(), path.display());

    let mut builder = AnalysisOrchestrator::builder(settings.analysis.clone());
    if settings.ocr.enabled && !no_ocr {
        builder = builder.ocr_engine(Arc::new(TesseractCli::discover(&settings.ocr)));
    }
    let orchestrator = builder.build()?;

    let mut service = AnalysisServiceBuilder::new(orchestrator);
    if let Some(secs) = timeout_secs {
        service = service.timeout(Duration::from_secs(secs));
    }

    let request = AnalysisRequest::new(bytes).with_requested_type(requested);
    let result = service
        .build()
        .oneshot(request)
        .await
        .map_err(|e| AppError::Service(e.to_string()))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.success)
}

fn check_ocr(settings: &Settings) {
    let engine = TesseractCli::discover(&settings.ocr);
    match engine.command() {
        Some(command) => match engine.version() {
            Ok(version) => println!("tesseract: {} ({})", command.display(), version),
            Err(e) => println!("tesseract: {} is not usable: {}", command.display(), e),
        },
        None => println!("tesseract: not found"),
    }
}
