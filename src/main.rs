use clap::{Args, Parser, Subcommand};
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trend_decline::config::AnalyzerConfig;
use trend_decline::server::{self, ServeOptions};
use trend_decline::youtube::{KeyCheck, YoutubeClient};
use trend_decline::{TopicRequest, TrendAnalyzer};

#[derive(Parser)]
#[command(name = "trend-decline", about = "Trend decline risk analyzer")]
struct Cli {
    /// Path to a TOML config file (defaults to TREND_CONFIG_PATH or config/analyzer.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Analyze(AnalyzeArgs),
    Serve(ServeArgs),
    /// Probe the YouTube API key in YOUTUBE_API_KEY.
    CheckKey,
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    #[arg(long)]
    topic: Option<String>,
    #[arg(long, default_value = "48h")]
    time_window: String,
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8000)]
    port: u16,
    #[arg(long)]
    web_root: Option<String>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, _) = AnalyzerConfig::load(cli.config)?;

    match cli.command {
        Command::Analyze(args) => run_analyze(args, &config).await,
        Command::Serve(args) => {
            let analyzer = Arc::new(TrendAnalyzer::from_config(&config)?);
            let options = ServeOptions {
                host: args.host,
                port: args.port,
                web_root: args.web_root,
            };
            server::serve(options, analyzer).await
        }
        Command::CheckKey => run_check_key(&config).await,
    }
}

async fn run_analyze(args: AnalyzeArgs, config: &AnalyzerConfig) -> Result<(), String> {
    let topic = read_topic(args.topic)?;
    let analyzer = TrendAnalyzer::from_config(config)?;
    let request = TopicRequest::new(topic).with_time_window(args.time_window);
    let response = analyzer.analyze(&request).await;

    let output = if args.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .map_err(|err| format!("failed to serialize response: {}", err))?;
    println!("{}", output);
    Ok(())
}

async fn run_check_key(config: &AnalyzerConfig) -> Result<(), String> {
    match YoutubeClient::check_key(&config.youtube).await? {
        KeyCheck::Missing => {
            println!("YOUTUBE_API_KEY is missing");
        }
        KeyCheck::Placeholder => {
            println!("YOUTUBE_API_KEY still holds the placeholder value");
        }
        KeyCheck::Active { sample_title } => {
            println!("YouTube API key is active");
            if let Some(title) = sample_title {
                println!("Sample: {}", title);
            }
        }
        KeyCheck::Rejected {
            status,
            message,
            reason,
        } => {
            println!("YouTube API key rejected: status {}", status);
            println!("Message: {}", message);
            println!("Reason: {}", reason);
        }
    }
    Ok(())
}

/// An explicit `--topic` wins, even when empty; otherwise stdin is read when
/// it is piped.
fn read_topic(arg: Option<String>) -> Result<String, String> {
    if let Some(topic) = arg {
        return Ok(topic);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err("missing topic: pass --topic or pipe stdin".to_string());
    }
    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    Ok(buffer.trim().to_string())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trend_decline=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
