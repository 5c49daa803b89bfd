use clap::Parser;
use std::path::PathBuf;
use tailgate::{Mode, Sink, TailConfig, TailerBuilder};

#[derive(Parser)]
#[command(name = "tailgate", about = "Follow a file and print what gets appended")]
struct Cli {
    /// File to tail. Overrides `path` from the config file.
    path: Option<PathBuf>,

    /// TOML config file layered over the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Split deliveries into lines instead of passing raw bytes.
    #[arg(long)]
    line: bool,

    /// Poll every N milliseconds instead of waiting for filesystem events.
    #[arg(long, value_name = "MS")]
    poll_ms: Option<u64>,

    /// Disable filesystem events (with no --poll-ms: read once and idle).
    #[arg(long)]
    no_fs_events: bool,

    /// Delay before reading existing content.
    #[arg(long, value_name = "MS")]
    init_delay_ms: Option<u64>,

    /// Maximum bytes per read.
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Log every delivery.
    #[arg(long)]
    trace_deliveries: bool,

    /// Verbose logging to stderr (RUST_LOG still wins when set).
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<TailConfig> {
        let mut config = TailConfig::load(self.config.as_deref())?;
        if let Some(path) = self.path {
            config.path = path;
        }
        if self.line {
            config.mode = Mode::Line;
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval_ms = Some(ms);
            config.fs_events = false;
        }
        if self.no_fs_events {
            config.fs_events = false;
        }
        if let Some(ms) = self.init_delay_ms {
            config.init_delay_ms = ms;
        }
        if let Some(bytes) = self.chunk_size {
            config.chunk_size = bytes;
        }
        config.log.trace_deliveries |= self.trace_deliveries;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = cli.into_config()?;
    let handle = TailerBuilder::from_config(config).sink(Sink::Stdout).spawn()?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("interrupted");
        }
        _ = handle.stopped() => {}
    }

    let status = handle.shutdown().await?;
    let snapshot = serde_json::to_string(&status)?;
    tracing::info!(
        offset = status.offset,
        deliveries = status.deliveries,
        status = %snapshot,
        "final status"
    );
    Ok(())
}
