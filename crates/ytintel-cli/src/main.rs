mod analyze;
mod check;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ytintel_core::{AnalysisFocus, DEFAULT_VIDEO_COUNT};

#[derive(Debug, Parser)]
#[command(name = "ytintel")]
#[command(about = "YouTube channel intelligence reports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze one or more channels and write JSON, Markdown and CSV reports
    Analyze(AnalyzeArgs),
    /// Validate configuration and the topic map without fetching anything
    CheckConfig,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Target channel URLs or handles; each gets its own report
    #[arg(required = true)]
    channels: Vec<String>,

    /// Competitor channel to compare against (repeatable, at most 5)
    #[arg(long = "competitor", short = 'c')]
    competitors: Vec<String>,

    /// Videos to fetch per channel (10-100)
    #[arg(long, default_value_t = DEFAULT_VIDEO_COUNT)]
    video_count: u32,

    /// Skip transcript fetching; keywords will be empty
    #[arg(long)]
    no_transcripts: bool,

    /// Aspect the recommendations should concentrate on
    #[arg(long, default_value = "comprehensive")]
    focus: AnalysisFocus,

    /// Reasoning service key for this run; overrides ANTHROPIC_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Read `<slug>.json` datasets from this directory instead of calling Apify
    #[arg(long)]
    from_dir: Option<PathBuf>,

    /// Where reports are written; defaults to YTINTEL_OUTPUT_DIR
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ytintel_core::load_app_config()?;
    init_tracing(&config.log_level);

    match cli.command {
        Some(Commands::Analyze(args)) => analyze::run_analyze(&config, args).await,
        Some(Commands::CheckConfig) => check::run_check_config(&config),
        None => {
            println!("ytintel: run `ytintel analyze <channel>` or `ytintel --help`");
            Ok(())
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `YTINTEL_LOG_LEVEL` applies.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
