//! MimicTTS CLI - clone a voice from a reference sample
//!
//! Talks to a Qwen3-TTS inference server, shows live progress while the
//! server generates, and writes the result as WAV.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mimic_tts::{
    AppConfig, CloneOutcome, CloneRequest, CloneRequestPipeline, EngineCell, HttpEngine,
    Language, VoiceCloneEngine, VERSION,
};

/// Engine handle shared by every request in this process
static ENGINE: EngineCell = EngineCell::new();

/// MimicTTS - zero-shot voice cloning
#[derive(Parser, Debug)]
#[command(name = "mimic-tts")]
#[command(author, version, about = "Zero-shot voice cloning with live progress", long_about = "
MimicTTS clones a voice from a 3-15 second reference sample and its exact
transcript, then speaks new text with it.

Examples:
  # Clone a voice (server at http://127.0.0.1:7861)
  mimic-tts clone --ref-audio voice.wav --ref-text \"Hi, this is me.\" --text \"Hello world\"

  # Spanish output to a custom file
  mimic-tts clone --ref-audio voice.wav --ref-text \"Hi.\" --text \"Hola\" --language es --output hola.wav

  # List supported languages
  mimic-tts languages
")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Speak text in the voice of a reference sample
    Clone {
        /// Reference voice sample (WAV/MP3, 3-15 seconds)
        #[arg(long)]
        ref_audio: PathBuf,

        /// Exact transcript of the reference sample
        #[arg(long)]
        ref_text: String,

        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Output language (name or ISO code)
        #[arg(short, long)]
        language: Option<String>,

        /// Output WAV path (overwritten if present). A bare file name goes
        /// into the configured output directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Inference server URL
        #[arg(long)]
        engine_url: Option<String>,

        /// Skip the summary line after generation
        #[arg(long)]
        no_summary: bool,
    },

    /// List supported languages
    Languages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    setup_logging(cli.verbose, &config.log_level);

    debug!("MimicTTS v{}", VERSION);

    match cli.command {
        Commands::Languages => {
            for language in Language::ALL {
                println!("  {:<12} {}", language.name(), language.code());
            }
            Ok(())
        }
        Commands::Clone {
            ref_audio,
            ref_text,
            text,
            language,
            output,
            engine_url,
            no_summary,
        } => {
            if let Some(url) = engine_url {
                config.engine_url = url;
            }
            if no_summary {
                config.progress.summary = false;
            }

            let request = CloneRequest {
                text,
                reference_audio: locate_reference(&ref_audio, &config.reference_audio_dir),
                reference_text: ref_text,
                language: language.unwrap_or_else(|| config.default_language.clone()),
                output_path: config
                    .resolve_output(output.as_deref().unwrap_or(&config.default_output_file)),
                x_vector_only: config.x_vector_only,
            };

            let engine = load_engine(&config)?;
            let pipeline = CloneRequestPipeline::new(engine)
                .with_reporter_options(config.reporter_options());

            match pipeline.run(&request) {
                CloneOutcome::Success(path) => {
                    println!("Saved to {}", path.display());
                    Ok(())
                }
                CloneOutcome::Failure(failure) => {
                    eprintln!("Error ({}): {}", failure.kind, failure.reason);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Connect to the server once; later calls reuse the handle.
fn load_engine(config: &AppConfig) -> Result<Arc<dyn VoiceCloneEngine>> {
    let pb = create_progress_bar(&format!("Connecting to {}...", config.engine_url));
    let start = Instant::now();

    let engine = ENGINE.get_or_load(|| {
        let engine = HttpEngine::connect(config.http_engine_config())?;
        Ok(Arc::new(engine) as Arc<dyn VoiceCloneEngine>)
    });

    match engine {
        Ok(engine) => {
            pb.finish_with_message(format!(
                "Engine ready in {:.1}s",
                start.elapsed().as_secs_f32()
            ));
            info!(engine = engine.id(), model = %config.model_id, "Engine loaded");
            Ok(engine)
        }
        Err(e) => {
            pb.abandon_with_message("Engine unavailable");
            Err(e).context("Failed to load voice-clone engine")
        }
    }
}

/// Relative paths that do not exist here are looked up in the reference directory.
fn locate_reference(path: &Path, reference_dir: &Path) -> PathBuf {
    if path.is_relative() && !path.exists() {
        let candidate = reference_dir.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    path.to_path_buf()
}

fn setup_logging(verbose: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { level };
        EnvFilter::new(format!("mimic_tts={}", level))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
