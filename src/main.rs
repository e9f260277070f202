use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sonara::{Config, ConnectionPhase, SessionConfig, SpeechSession};
use tracing::info;

#[derive(Parser)]
#[command(name = "sonara", about = "Live speech transcription dashboard core")]
struct Cli {
    /// Config file path (built-in defaults are used when it is absent)
    #[arg(long, default_value = "config/sonara")]
    config: String,

    /// Override the configured language tag (e.g. "vi-VN", "en-US")
    #[arg(long)]
    language: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream the microphone live and print transcription updates
    Listen,
    /// Transcribe a pre-recorded audio file
    Upload { file: PathBuf },
    /// Classify ambient sound in an audio file
    Classify {
        file: PathBuf,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Probe the backend services
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config).unwrap_or_else(|_| {
        info!("no config file at {}, using defaults", cli.config);
        Config::default()
    });

    let mut session_config = SessionConfig::from(&config);
    if let Some(language) = cli.language {
        session_config.language = language;
    }

    info!(
        "{} starting (language: {})",
        config.service.name, session_config.language
    );

    let session = SpeechSession::new(session_config)?;

    match cli.command {
        Command::Listen => listen(&session).await?,
        Command::Upload { file } => {
            let result = session.upload_file(&file, None).await?;
            println!(
                "{} (confidence {:.2})",
                result.transcription, result.confidence
            );
        }
        Command::Classify { file, top_k } => {
            let result = session.api().classify_audio(&file, top_k).await?;
            for classification in &result.classifications {
                println!(
                    "{:5.1}%  {}",
                    classification.confidence * 100.0,
                    classification.class
                );
            }
            println!(
                "top prediction: {} ({:.2})",
                result.top_prediction.class, result.top_prediction.confidence
            );
        }
        Command::Status => {
            match session.api().speech_status().await {
                Ok(status) => println!("speech:     {} ({})", status.status, status.service),
                Err(e) => println!("speech:     unreachable ({e})"),
            }
            match session.api().classifier_status().await {
                Ok(status) => println!("classifier: {} ({})", status.status, status.service),
                Err(e) => println!("classifier: unreachable ({e})"),
            }
        }
    }

    Ok(())
}

async fn listen(session: &SpeechSession) -> Result<()> {
    session.start_listening().await?;
    println!("Listening... press Ctrl+C to stop.");

    let mut shown = String::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                let state = session.snapshot().await;
                if let Some(error) = &state.last_error {
                    eprintln!("error: {error}");
                    break;
                }
                if state.transcript != shown {
                    shown = state.transcript.clone();
                    println!("[level {:>3.0}] {}", state.audio_level, shown);
                }
                // The backend can end the session on its side.
                if state.phase == ConnectionPhase::Idle {
                    break;
                }
            }
        }
    }

    session.stop_listening().await;

    let history = session.transcript_history().await;
    if !history.is_empty() {
        println!("--- {} updates this session ---", history.len());
    }

    Ok(())
}
