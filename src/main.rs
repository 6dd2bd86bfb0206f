use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kafkawatch::console::{self, Command};
use kafkawatch::period::format_period;
use kafkawatch::{Dashboard, Overrides, Settings, ViewChoice};
use kafkawatch_adapters::{DiskSpaceAdapter, MetricsApiClient, TopicMetricsAdapter};
use kafkawatch_sync::PollingDriver;

#[derive(Parser, Debug)]
#[command(name = "kafkawatch")]
#[command(about = "Watch disk space and topic metrics of a managed Kafka instance")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kafka instance identifier
    #[arg(short, long)]
    instance: Option<String>,

    /// Base path of the metrics API
    #[arg(long)]
    api_base: Option<String>,

    /// Bearer token (prefer KAFKAWATCH_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Which views to run
    #[arg(long, value_enum)]
    view: Option<ViewChoice>,

    /// Time window (e.g., "5m", "1h", "7d")
    #[arg(short, long)]
    duration: Option<String>,

    /// Narrow the topics view to one topic
    #[arg(short, long)]
    topic: Option<String>,

    /// Poll period (e.g., "5m", "30s")
    #[arg(short, long)]
    poll: Option<String>,

    /// Export the settled views to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            instance: self.instance.clone(),
            api_base: self.api_base.clone(),
            token: self.token.clone(),
            view: self.view,
            duration: self.duration.clone(),
            topic: self.topic.clone(),
            poll: self.poll.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;

    let client = MetricsApiClient::builder().build()?;
    let dashboard = Dashboard::start(
        &settings,
        Arc::new(DiskSpaceAdapter::new(client.clone())),
        Arc::new(TopicMetricsAdapter::new(client)),
    )?;

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        let result = export_to_file(&dashboard, &export_path).await;
        dashboard.shutdown().await;
        return result;
    }

    run_console(dashboard, &settings).await
}

/// Print status lines and react to stdin commands until quit or Ctrl-C.
async fn run_console(dashboard: Dashboard, settings: &Settings) -> Result<()> {
    let period = settings.poll_period()?;
    let poller = dashboard.start_polling(PollingDriver::new(period));
    let (mut lines, printers) = dashboard.watch_lines();

    info!(poll = %format_period(period), "Watching instance {}", settings.instance);
    println!("{}", console::HELP);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(line) = lines.recv() => println!("{}", line),

            input = stdin.next_line(), if stdin_open => match input {
                Ok(Some(input)) => match console::parse_command(&input) {
                    Ok(Some(Command::Help)) => println!("{}", console::HELP),
                    Ok(Some(command)) => {
                        if !dashboard.apply(command) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                },
                Ok(None) => {
                    info!("stdin closed; press Ctrl-C to quit");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    stdin_open = false;
                }
            },

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop();
    for printer in printers {
        printer.abort();
    }
    dashboard.shutdown().await;
    Ok(())
}

/// Wait for every view to settle, then write them as JSON
async fn export_to_file(dashboard: &Dashboard, export_path: &Path) -> Result<()> {
    use std::io::Write;

    dashboard.settled().await;

    let json = serde_json::to_string_pretty(&dashboard.export())?;
    let mut file = std::fs::File::create(export_path)?;
    file.write_all(json.as_bytes())?;

    println!("Exported metric views to: {}", export_path.display());
    Ok(())
}
