//! BabyBaby CLI - mounts the landing page and prints frames as it hydrates.
//!
//! # Flow
//!
//! ```text
//! main() -> load settings -> PageShell::mount(landing sections)
//!              |
//!              v
//!   render frame -> print if changed -> wait for shell.changed()
//!              |                               ^
//!              +---- until quiescent ----------+
//!              v
//!   PageShell::unmount() -> TeardownReport
//! ```
//!
//! A simulated reader scrolls the page while it loads, so sections gated on
//! visibility start their heavy work as they come into view. Logs go to a
//! file to keep stdout for frames.

mod landing;
mod reader;

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use babybaby_config::{BabyConfig, config_path};
use babybaby_engine::{PageShell, PollingIntersection, ShellContext};
use babybaby_types::ShellSettings;

use crate::reader::ScrollingPage;

const VIEWPORT_HEIGHT: f32 = 800.0;

#[derive(Parser)]
#[command(name = "babybaby")]
#[command(about = "Mount the BabyBaby landing page and print each frame as sections load")]
struct Cli {
    /// Config file (defaults to $BABYBABY_CONFIG, then ~/.babybaby/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Make the named section's factory fail (repeatable)
    #[arg(long = "fail", value_name = "SECTION")]
    fail: Vec<String>,
    /// Reader scroll speed in pixels per second
    #[arg(long, default_value_t = 1500.0)]
    scroll_speed: f32,
    /// Stop waiting after this many seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

/// Sends logs to `babybaby.log` in the first writable log directory.
///
/// Stdout is reserved for frames, so without a writable directory the
/// subscriber only filters and nothing is printed.
fn init_tracing(config: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let mut failures = Vec::new();
    let opened = log_dirs(config).into_iter().find_map(|dir| {
        let path = dir.join("babybaby.log");
        let file = fs::create_dir_all(&dir)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
        match file {
            Ok(file) => Some((path, file)),
            Err(e) => {
                failures.push(format!("{}: {e}", path.display()));
                None
            }
        }
    });

    let Some((path, file)) = opened else {
        tracing_subscriber::registry().with(env_filter).init();
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(env_filter)
        .init();
    tracing::info!(path = %path.display(), "Logging initialized");
    for failure in failures {
        tracing::warn!(log = %failure, "Skipped unwritable log location");
    }
}

/// `logs/` beside the config in use, then `./.babybaby/logs`.
fn log_dirs(config: Option<&Path>) -> Vec<PathBuf> {
    let config = config.map(Path::to_path_buf).or_else(config_path);
    config
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join("logs"))
        .into_iter()
        .chain([PathBuf::from(".babybaby").join("logs")])
        .collect()
}

fn load_settings(explicit: Option<&Path>) -> Result<ShellSettings> {
    let config = match explicit {
        Some(path) => Some(
            BabyConfig::load_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
        ),
        None => BabyConfig::load().context("loading config")?,
    };
    Ok(config.map(BabyConfig::into_settings).unwrap_or_default())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.config.as_deref());

    let settings = load_settings(cli.config.as_deref())?;
    let sections = landing::sections(&cli.fail)?;

    let page = Arc::new(ScrollingPage::new(
        landing::PAGE_WIDTH,
        VIEWPORT_HEIGHT,
        landing::layout(),
    ));
    let intersection = Arc::new(PollingIntersection::new(
        page.clone(),
        settings.viewport.poll_interval(),
    ));
    let ctx = ShellContext::new(settings, intersection);

    let started = Instant::now();
    let mut shell = PageShell::mount(&ctx, sections).context("mounting landing page")?;
    for (section, delay) in shell.schedule() {
        tracing::info!(section = %section, delay_ms = delay.as_millis() as u64, "Scheduled");
    }

    let reader = {
        let page = page.clone();
        let speed = cli.scroll_speed;
        tokio::spawn(async move { page.scroll_to_bottom(speed).await })
    };

    let deadline = tokio::time::sleep(Duration::from_secs(cli.timeout_secs));
    tokio::pin!(deadline);
    let mut last_frame = String::new();
    loop {
        let frame = shell.render().to_text();
        if frame != last_frame {
            println!("--- t+{}ms ---", started.elapsed().as_millis());
            print!("{frame}");
            last_frame = frame;
        }
        if shell.is_quiescent() {
            break;
        }

        tokio::select! {
            () = shell.changed() => {}
            () = &mut deadline => {
                tracing::warn!(timeout_secs = cli.timeout_secs, "Page did not settle in time");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for ctrl-c: {e}");
                }
                break;
            }
        }
    }

    reader.abort();
    let report = shell.unmount();
    println!(
        "--- unmounted: {} timers cancelled, {} observers disconnected ---",
        report.timers_cancelled, report.observers_disconnected
    );
    Ok(())
}
