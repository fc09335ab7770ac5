use clap::Parser;
use log::info;
use rustpusher::daemon::genai::Gemini;
use rustpusher::daemon::git_ops::Git;
use rustpusher::daemon::github::GitHub;
use rustpusher::daemon::{Collaborators, Daemon, ReloadPolicy};
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Periodically commits local folders and pushes them to GitHub.
#[derive(Parser)]
struct Cli {
    /// Path to config JSON (or TOML)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
    /// File the log is appended to, besides the console
    #[arg(short, long, default_value = "log.txt")]
    log_file: PathBuf,
    /// Seconds between config file checks
    #[arg(long, default_value_t = 60)]
    reload_every: u64,
    /// Keep the current projects scheduled when a changed config fails to load
    #[arg(long)]
    keep_jobs_on_bad_reload: bool,
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    rustpusher::logging::init_logger(&args.log_file);

    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let collaborators = Collaborators {
        vcs: Box::new(Git),
        host: Box::new(GitHub::new(client.clone())),
        generator: Box::new(Gemini::new(client)),
    };

    let policy = if args.keep_jobs_on_bad_reload {
        ReloadPolicy::KeepOnFailure
    } else {
        ReloadPolicy::CancelFirst
    };
    let mut daemon = Daemon::new(&args.config, collaborators)
        .with_reload_every(Duration::from_secs(args.reload_every.max(1)))
        .with_policy(policy);

    info!("Watching {}", daemon.config_path().display());

    tokio::select! {
        _ = async {
            daemon.start(Instant::now()).await;
            daemon.run().await;
        } => {}
        result = shutdown_signal() => {
            result?;
            info!("Stopping...");
        }
    }

    Ok(())
}
