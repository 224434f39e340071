//! Persona studio binary.

use clap::Parser;
use persona_genai::GenAiClient;
use persona_studio::{load_config, read_image, AvatarProxyClient, Repl, Session, StudioError};
use persona_voice::{EspeakSynthesizer, Speaker};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "persona-studio", version, about = "Turn a photo into a persona and talk to it")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "PERSONA_STUDIO_CONFIG", default_value = "persona-studio.toml")]
    config: String,

    /// Photo to load before the prompt opens.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Do not speak replies.
    #[arg(long)]
    no_speech: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("persona-studio: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), StudioError> {
    let config = load_config(Some(&args.config))?;

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(path = %args.config, ?config, "loaded configuration");

    let genai = Arc::new(GenAiClient::new(config.genai.clone())?);

    let speaker = if config.speech.enabled && !args.no_speech {
        let synth = Arc::new(EspeakSynthesizer::new(&config.speech.binary));
        Some(Arc::new(Speaker::new(synth, &config.speech)?))
    } else {
        None
    };

    let session = Arc::new(Session::new(genai.clone(), genai, speaker));
    if let Some(path) = &args.image {
        let image = read_image(path).await?;
        if let Err(e) = session.upload(image) {
            tracing::warn!(error = %e, "initial upload rejected");
        }
    }

    let proxy = match AvatarProxyClient::new(config.proxy.clone()) {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            tracing::warn!(error = %e, "avatar proxy unavailable; /video is disabled");
            None
        }
    };

    let mut repl = Repl::new(session, proxy);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl.run(stdin, &mut stdout).await
}
