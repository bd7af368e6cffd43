//! LanShare
//!
//! Share files and folders with devices on the local network.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lanshare::config::{default_config_path, Config};
use lanshare::server::ShareServer;
use lanshare::{net, ui};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// LanShare - share files and folders with devices on the local network.
#[derive(Parser, Debug)]
#[command(name = "lanshare")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the share server
    Serve {
        /// Port to listen on
        #[arg(long, short)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Share a file or directory at startup (repeatable)
        #[arg(long = "share", short = 's', value_name = "PATH")]
        shares: Vec<PathBuf>,

        /// Do not print the QR code
        #[arg(long)]
        no_qr: bool,
    },

    /// Show a QR code for the share URL
    Qr {
        /// Output format
        #[arg(long, short, value_enum, default_value = "terminal")]
        format: QrFormat,

        /// Output file path for PNG format (defaults to ./lanshare-qr.png)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List the LAN addresses clients can use
    Ips,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Output format for QR codes.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrFormat {
    /// Render in the terminal
    Terminal,
    /// Write a PNG image
    Png,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    if let Commands::Config(ConfigCommands::Init { force }) = cli.command {
        let _guard = init_tracing(cli.verbose, &Config::default());
        return init_config(&config_path, force);
    }

    let mut config = Config::load(&config_path)?;
    config.apply_env_overrides();

    if let Commands::Serve { port, bind, .. } = &cli.command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(bind) = bind {
            config.server.bind_address = bind.clone();
        }
    }

    config.validate()?;
    let _guard = init_tracing(cli.verbose, &config);
    tracing::debug!("Using config file: {:?}", config_path);

    match cli.command {
        Commands::Serve { shares, no_qr, .. } => serve(config, shares, no_qr).await?,
        Commands::Qr { format, output } => {
            let url = net::share_url(config.server.port);
            match format {
                QrFormat::Terminal => {
                    println!("{}", ui::terminal_qr(&url)?);
                    println!("{}", url);
                }
                QrFormat::Png => {
                    let output = output.unwrap_or_else(|| PathBuf::from("lanshare-qr.png"));
                    ui::save_png_qr(&url, &output)?;
                    println!("QR code for {} saved to {}", url, output.display());
                }
            }
        }
        Commands::Ips => {
            let ips = net::local_ipv4_addrs();
            if ips.is_empty() {
                println!("No LAN IPv4 addresses found.");
            }
            for ip in ips {
                println!("{}", ip);
            }
        }
        Commands::Config(ConfigCommands::Show) => {
            print!("{}", config.to_toml()?);
        }
        Commands::Config(ConfigCommands::Init { force }) => init_config(&config_path, force)?,
    }

    Ok(())
}

/// Install the global subscriber: stdout, plus a daily log file when
/// `daemon.log_dir` is set. The returned guard flushes the file on drop.
fn init_tracing(verbose: bool, config: &Config) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.daemon.log_level.to_lowercase()))
    };

    let (file_layer, guard) = match &config.daemon.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lanshare.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Run the server until SIGINT/SIGTERM.
async fn serve(config: Config, shares: Vec<PathBuf>, no_qr: bool) -> anyhow::Result<()> {
    let port = config.server.port;
    let open_browser = config.server.open_browser;
    let server = Arc::new(ShareServer::new(config));

    for path in &shares {
        let outcome = server
            .registry()
            .add(path)
            .with_context(|| format!("Cannot share {}", path.display()))?;
        tracing::info!(id = %outcome.id, "Shared {:?}", path);
    }

    let listener = server.bind().await?;

    println!();
    println!("LanShare is running. Open one of these on your phone or laptop:");
    let urls = net::share_urls(port);
    if urls.is_empty() {
        println!("  http://localhost:{}", port);
    }
    for url in &urls {
        println!("  {}", url);
    }
    println!("Admin page: {}", ui::admin_url(port));

    if !no_qr {
        let url = net::share_url(port);
        match ui::terminal_qr(&url) {
            Ok(qr) => println!("{}", qr),
            Err(e) => tracing::warn!("Failed to render QR code: {}", e),
        }
    }

    if open_browser {
        if let Err(e) = ui::open_browser(&ui::admin_url(port)) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let watcher = Arc::clone(&server);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        watcher.shutdown().await;
    });

    server.serve(listener).await
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        _ => {
            tracing::warn!("Failed to register signal handlers, falling back to Ctrl-C");
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT");
        }
    }
}

/// Wait for Ctrl-C.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C"),
        Err(e) => {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
