use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use respiro::audio::decode_wav_file;
#[cfg(feature = "http")]
use respiro::AppConfig;
use respiro::{FeatureExtractor, FeatureVector, InferenceContext, FEATURE_SCHEMA, SCHEMA_VERSION};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "respiro",
    about = "Respiratory sound feature extraction and classification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the 30-value feature vector from a WAV clip
    Extract {
        #[arg(long)]
        input: PathBuf,
        /// Write the JSON report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Classify a WAV clip with a model artifact
    Classify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        model: PathBuf,
    },
    /// Print the feature schema descriptor
    Schema,
    /// Run the HTTP classification service
    #[cfg(feature = "http")]
    Serve {
        /// JSON config file (defaults to config/respiro.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the bind address
        #[arg(long)]
        bind: Option<String>,
        /// Override the model artifact path
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    respiro::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { input, output } => run_extract(&input, output),
        Commands::Classify { input, model } => run_classify(&input, &model),
        Commands::Schema => run_schema(),
        #[cfg(feature = "http")]
        Commands::Serve {
            config,
            bind,
            model,
        } => run_serve(config, bind, model),
    }
}

fn run_extract(input: &Path, output_path: Option<PathBuf>) -> Result<ExitCode> {
    let audio =
        decode_wav_file(input).with_context(|| format!("decoding {}", input.display()))?;
    let features = FeatureExtractor::new()
        .extract_samples(&audio.samples, audio.sample_rate)
        .with_context(|| format!("extracting features from {}", input.display()))?;

    let report = FeatureReportPayload {
        schema_version: SCHEMA_VERSION,
        sample_rate: audio.sample_rate,
        source_samples: audio.samples.len(),
        features: &features,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(ExitCode::from(0))
}

fn run_classify(input: &Path, model: &Path) -> Result<ExitCode> {
    let context = InferenceContext::from_model_path(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let prediction = context
        .classify_wav_bytes(&bytes)
        .with_context(|| format!("classifying {}", input.display()))?;

    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(ExitCode::from(0))
}

fn run_schema() -> Result<ExitCode> {
    println!(
        "{}",
        serde_json::to_string_pretty(&FEATURE_SCHEMA.descriptor())?
    );
    Ok(ExitCode::from(0))
}

#[cfg(feature = "http")]
fn run_serve(
    config_path: Option<PathBuf>,
    bind: Option<String>,
    model: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut config = AppConfig::load(config_path.as_deref());
    if let Some(addr) = bind {
        config.server.bind_addr = addr;
    }
    if let Some(path) = model {
        config.model.path = path;
    }

    let context = InferenceContext::from_model_path(&config.model.path)
        .with_context(|| format!("loading model {}", config.model.path.display()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(respiro::http::run_http_server(context, &config.server))?;
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct FeatureReportPayload<'a> {
    schema_version: u32,
    sample_rate: u32,
    source_samples: usize,
    features: &'a FeatureVector,
}
