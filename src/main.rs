use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use voiceflip::config::Overrides;
use voiceflip::{
    CommandCaptureProvider, Config, Dataset, DatasetProvider, GameRuntime, Input, PermissionState,
    RuntimeHandle, TerminalPresenter,
};

/// voiceflip - say the translation before the clock runs out
#[derive(Parser)]
#[command(name = "voiceflip", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/voiceflip/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Words per round
    #[arg(long, env = "VOICEFLIP_ROUND_WORDS")]
    words: Option<usize>,

    /// Round length in seconds
    #[arg(long, env = "VOICEFLIP_ROUND_SECS")]
    seconds: Option<u32>,

    /// Recognition language tag (e.g. "ru-RU")
    #[arg(long, env = "VOICEFLIP_LANG")]
    lang: Option<String>,

    /// Recognizer program writing JSON lines on stdout
    #[arg(long, env = "VOICEFLIP_RECOGNIZER")]
    recognizer: Option<String>,

    /// TOML word list replacing the built-in words
    #[arg(long, env = "VOICEFLIP_WORDS_FILE")]
    words_file: Option<PathBuf>,

    /// Type answers only
    #[arg(long, env = "VOICEFLIP_DISABLE_VOICE")]
    disable_voice: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            round_words: self.words,
            round_secs: self.seconds,
            language: self.lang.clone(),
            recognizer: self.recognizer.clone(),
            words_file: self.words_file.clone(),
            disable_voice: self.disable_voice,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voiceflip=info",
        1 => "info,voiceflip=debug",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so they never interleave with the game on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.overrides())?;

    let dataset = match &config.words_file {
        Some(path) => Dataset::from_file(path)?,
        None => Dataset::builtin(),
    };
    let dataset: Arc<dyn DatasetProvider> = Arc::new(dataset);

    tracing::info!(
        words = config.game.round_words,
        secs = config.game.round_secs,
        language = %config.voice.language,
        recognizer = ?config.voice.recognizer,
        voice = config.voice.enabled,
        "starting voiceflip"
    );

    let provider = config
        .voice
        .recognizer
        .clone()
        .map(|program| CommandCaptureProvider::new(program, config.voice.recognizer_args.clone()));

    let presenter = Arc::new(TerminalPresenter::stdout());
    let runtime = GameRuntime::new(
        &config,
        dataset,
        provider,
        PermissionState::Unknown,
        presenter.clone(),
        presenter,
    );

    let handle = runtime.handle();
    let reader = tokio::spawn(read_commands(handle.clone()));
    handle.send(Input::StartGame);

    runtime.run().await;
    reader.abort();
    Ok(())
}

/// Forward stdin lines as player input until EOF or `/quit`
async fn read_commands(handle: RuntimeHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                break;
            }
        };

        let input = match line.trim() {
            "/start" => Input::StartGame,
            "/review" => Input::StartReview,
            "/menu" => Input::Menu,
            "/quit" | "/exit" => break,
            _ => Input::Answer(line),
        };
        if !handle.send(input) {
            return;
        }
    }

    handle.send(Input::Quit);
}
