use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use emovoice::config::default_bundle_path;
use emovoice::model::{ModelBundle, EMOTIONS};
use emovoice::EmotionClassifier;

/// Classify the emotional content of a spoken-audio WAV clip
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a .wav file to classify
    audio: Option<PathBuf>,

    /// Path to the model artifact bundle (JSON)
    #[arg(short, long)]
    bundle: Option<PathBuf>,

    /// List the supported emotion labels and exit
    #[arg(long)]
    emotions: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.emotions {
        println!("Supported emotions:\n");
        for emotion in EMOTIONS {
            println!("  - {}", emotion);
        }
        return Ok(());
    }

    let audio_path = match &args.audio {
        Some(path) => path.clone(),
        None => {
            eprintln!("No audio file given. Usage: emotion-cli <audio.wav>");
            std::process::exit(2);
        }
    };

    let bundle_path = match args.bundle {
        Some(path) => path,
        None => default_bundle_path().context("Failed to determine home directory")?,
    };

    if !bundle_path.exists() {
        error!("Model bundle not found: {:?}", bundle_path);
        eprintln!("\nModel bundle not found: {:?}", bundle_path);
        eprintln!("\nExport the trained artifacts (classifier, scaler, label encoder)");
        eprintln!("as a single JSON bundle and place it at the expected location,");
        eprintln!("or pass a custom path with: --bundle /path/to/emotion_bundle.json");
        std::process::exit(1);
    }

    info!("Loading model bundle from {:?}", bundle_path);
    let bundle = ModelBundle::load(&bundle_path)
        .with_context(|| format!("Failed to load model bundle from {:?}", bundle_path))?;

    let classifier = EmotionClassifier::new(Arc::new(bundle));

    let bytes = std::fs::read(&audio_path)
        .with_context(|| format!("Failed to read audio file {:?}", audio_path))?;
    info!("Classifying {:?} ({} bytes)", audio_path, bytes.len());

    let result = classifier
        .classify(&bytes)
        .context("Classification failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}
