//! Watch command: follow the codes file and settings until Ctrl-C.

use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::config::Settings;
use crate::daemon::Daemon;
use crate::status::StatusReport;
use crate::watcher::FileWatcher;

fn print_report(report: &StatusReport) {
    println!("{report} remaining ({})", report.band);
}

/// Watch the store's files; every settled change reloads and reports.
fn spawn_codes_watcher(
    daemon: &Arc<Daemon>,
    reports: mpsc::UnboundedSender<StatusReport>,
) -> Result<FileWatcher> {
    let settings = daemon.settings();
    let callback_daemon = Arc::clone(daemon);

    let watcher = FileWatcher::builder()
        .paths(daemon.store().watched_paths())
        .timings(&settings.watcher)
        .spawn(move || {
            let _ = reports.send(callback_daemon.reload_codes());
        })
        .context("Failed to watch codes file")?;

    Ok(watcher)
}

fn spawn_settings_watcher(
    config_path: &Path,
    settings: &Settings,
    changed: mpsc::UnboundedSender<()>,
) -> Result<FileWatcher> {
    FileWatcher::builder()
        .path(config_path)
        .timings(&settings.watcher)
        .spawn(move || {
            let _ = changed.send(());
        })
        .context("Failed to watch settings file")
}

pub async fn run(config_path: PathBuf, settings: Settings) -> Result<()> {
    let daemon = Arc::new(Daemon::start(settings.clone()).context("Failed to prepare storage")?);
    let mut alerts = daemon.alerts().subscribe();

    let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
    let (settings_tx, mut settings_rx) = mpsc::unbounded_channel();

    let mut codes_watcher = spawn_codes_watcher(&daemon, reports_tx.clone())?;
    let settings_watcher = spawn_settings_watcher(&config_path, &settings, settings_tx)?;

    println!(
        "{} {}",
        style("Watching").cyan().bold(),
        daemon.store().paths().codes.display()
    );
    print_report(&daemon.refresh());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                crate::log_event!("watch", "interrupted");
                break;
            }

            Some(report) = reports_rx.recv() => {
                print_report(&report);
            }

            Some(()) = settings_rx.recv() => {
                let new_settings = match Settings::load_from(&config_path) {
                    Ok(new_settings) => new_settings,
                    Err(e) => {
                        // Keep running on the last good settings
                        tracing::warn!("[watch] ignoring settings change: {e}");
                        continue;
                    }
                };

                let change = daemon.apply_settings(new_settings);
                if change.is_empty() {
                    continue;
                }

                if change.storage || change.watcher {
                    // Tear down first so the old watches never fire on the new store
                    drop(codes_watcher);
                    codes_watcher = spawn_codes_watcher(&daemon, reports_tx.clone())?;
                }
                print_report(&daemon.refresh());
            }

            alert = alerts.recv() => {
                match alert {
                    Ok(alert) => {
                        if let Some(message) = alert.message() {
                            eprintln!("{} {}", alert.band.symbol(), style(message).yellow().bold());
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        crate::debug_event!("watch", "alerts lagged", "{skipped}");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    codes_watcher.cancel();
    settings_watcher.cancel();
    println!("{}", style("Stopped").dim());
    Ok(())
}
