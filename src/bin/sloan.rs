use clap::Parser;
use sloan_core::SloanResult;
use sloan_core::config::{ConfigStore, app_dir};
use sloan_core::logging::init_logging;
use sloan_core::watcher::service::WatcherService;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// Watch a downloads folder and print each file once it has finished arriving.
#[derive(Debug, Parser)]
#[command(name = "sloan", version)]
struct Cli {
    /// Config file (defaults to ~/.sloan_suite/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Watch this folder instead of the configured one
    #[arg(long)]
    watch_folder: Option<PathBuf>,

    /// Treat this file as ready immediately (shell "open with" integration)
    #[arg(long = "open", value_name = "FILE")]
    open_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sloan: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> SloanResult<()> {
    let store = match cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::default_location()?,
    };
    let log_dir = match store.path().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => app_dir()?,
    };
    let _guard = init_logging(&log_dir)?;

    let mut cfg = store.load()?;
    if let Some(folder) = cli.watch_folder {
        cfg.watch_folder = folder;
    }

    let mut service = WatcherService::create(&cfg.watch_folder, &cfg.watch)?;

    if let Some(path) = cli.open_path {
        let path = std::path::absolute(&path)?;
        if path.is_file() {
            info!(path = %path.display(), "--open requested");
            service.gate().mark_seen(&path);
            println!("{}", path.display());
        } else {
            warn!(path = %path.display(), "--open path not found");
        }
    }

    let ready = service.run()?;
    for path in ready {
        println!("{}", path.display());
    }

    service.shutdown()
}
