use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depwatch::{
    config::Config,
    output::{print_report, OutputFormat},
    remote::{self, Checkout},
    ScanEngine, ScanRequest,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const VULNERABLE: u8 = 1;
    pub const ERROR: u8 = 2;
}

#[derive(Parser)]
#[command(name = "depwatch")]
#[command(
    author,
    version,
    about = "Check project dependencies against known vulnerability advisories"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a manifest, a directory, or a GitHub/GitLab repository URL
    Scan {
        /// File, directory, or repository URL to check
        target: String,

        /// Exit successfully even if vulnerable packages are found
        #[arg(short, long)]
        dont_fail: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Read configuration from this file instead of the default location
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Abort the scan after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(exit_codes::ERROR);
    }

    match run(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("error initializing logging")
}

async fn run(command: Commands) -> Result<u8> {
    match command {
        Commands::Scan {
            target,
            dont_fail,
            format,
            config,
            timeout,
        } => run_scan(&target, dont_fail, &format, config.as_deref(), timeout).await,
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    target: &str,
    dont_fail: bool,
    format: &str,
    config_path: Option<&Path>,
    timeout: Option<u64>,
) -> Result<u8> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table;

    let mut config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if timeout.is_some() {
        config.scan_timeout_secs = timeout;
    }
    config.validate()?;

    let started = Instant::now();

    let checkout: Option<Checkout> = if remote::is_remote_url(target) {
        let pb = is_interactive.then(|| spinner(format!("Cloning {}...", target)));
        let result = remote::clone_repository(target).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        Some(result?)
    } else {
        None
    };

    let request = match &checkout {
        Some(checkout) => ScanRequest::new(checkout.path(), true, true),
        None => {
            let path = PathBuf::from(target);
            let is_dir = path.is_dir();
            ScanRequest::new(path, is_dir, false)
        }
    };
    debug!(path = %request.path.display(), remote = request.is_remote_origin, "starting scan");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let pb = is_interactive.then(|| spinner(format!("Checking {} for vulnerable packages...", target)));
    let engine = ScanEngine::new(&config);
    let result = engine.scan(request, cancel).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let mut report = result?;

    if let Some(checkout) = &checkout {
        report.rebase_paths(checkout.path(), Path::new(checkout.name()));
    }

    print_report(&report, format)?;

    if is_interactive {
        println!();
        println!("Finished in {:.2}s", started.elapsed().as_secs_f64());
    }

    if report.is_clean() || dont_fail {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::VULNERABLE)
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depwatch config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
