use anyhow::{Context, Result};
use clap::Parser;
use phishscan::analysis::HttpClassifier;
use phishscan::config::Config;
use phishscan::host::PageHost;
use phishscan::popup::PopupController;
use phishscan::ui::ConsoleSink;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "phishscan")]
#[command(
    version,
    about = "Check the email open in a webmail page for phishing",
    long_about = None
)]
struct Cli {
    /// Page to inspect: an http(s) URL, a file:// URL or a saved HTML file
    target: Option<String>,

    /// Text to use when no message body can be found on the page
    #[arg(short, long)]
    selection: Option<String>,

    /// Analysis endpoint (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the result instead of opening the terminal popup
    #[arg(long)]
    plain: bool,

    /// Append logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

/// Logs go to `log_file` when given, to stderr in plain mode, and nowhere
/// otherwise so they cannot corrupt the popup.
fn init_tracing(log_file: Option<&Path>, plain: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "phishscan=info".into());

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else if plain {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.log_file.as_deref(), cli.plain)?;

    if cli.init_config {
        let path = match cli.config.clone().or_else(Config::default_path) {
            Some(path) => path,
            None => anyhow::bail!("Could not determine config directory"),
        };
        Config::write_default(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.analysis.endpoint = endpoint;
    }
    if let Some(timeout) = cli.timeout {
        config.analysis.timeout_secs = Some(timeout);
    }
    let endpoint = config.endpoint_url()?;
    tracing::debug!(%endpoint, "configuration loaded");

    let controller = PopupController::new(
        Box::new(PageHost::new(cli.target, cli.selection, config.timeout())),
        Box::new(HttpClassifier::new(endpoint, config.timeout())),
        config.popup_settings(),
    );

    let outcome = if cli.plain {
        let width = crossterm::terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(80);
        let mut sink = ConsoleSink::new(std::io::stdout(), width);
        controller.run(&mut sink).await
    } else {
        match phishscan::app::run_popup(&controller).await? {
            Some(outcome) => outcome,
            // Closed before a verdict
            None => return Ok(ExitCode::FAILURE),
        }
    };

    Ok(ExitCode::from(outcome.exit_code()))
}
