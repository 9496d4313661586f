//! Queue commands: status, peek, next, add, reset-index.

use anyhow::{Context, Result, bail};
use console::style;
use std::io::BufRead;

use crate::band::{BandTracker, ColorBand};
use crate::config::Settings;
use crate::notifications::Alert;
use crate::paste::{PasteOutcome, StdoutSink, paste_next};
use crate::storage::{CodeStore, ConsumeMode};

/// Bootstrap (if needed) and load the configured store.
pub fn open_store(settings: &Settings) -> Result<CodeStore> {
    let store = CodeStore::from_settings(settings);
    store
        .bootstrap_if_needed()
        .context("Failed to prepare storage")?;
    store.load_all();
    Ok(store)
}

fn band_of(store: &CodeStore, settings: &Settings) -> ColorBand {
    ColorBand::from_remaining(store.remaining(), &settings.thresholds)
}

pub fn run_status(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;
    let snapshot = store.snapshot();
    let remaining = snapshot.remaining();
    let band = band_of(&store, settings);

    println!("{} {remaining} remaining ({band})", band.symbol());
    println!(
        "  {} {}",
        style("codes:").dim(),
        store.paths().codes.display()
    );
    if store.mode() == ConsumeMode::Indexed {
        println!(
            "  {} {} of {}",
            style("cursor:").dim(),
            snapshot.next_index,
            snapshot.codes.len()
        );
    }
    Ok(())
}

pub fn run_peek(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;
    match store.peek_next() {
        Some(code) => {
            println!("{code}");
            Ok(())
        }
        None => bail!("No codes left"),
    }
}

/// Deliver the next code and consume it; warn on stderr when the band drops.
pub fn run_next(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;
    let mut tracker = BandTracker::new();
    tracker.observe(band_of(&store, settings));

    match paste_next(&store, &StdoutSink::new(settings.paste.method)) {
        PasteOutcome::Pasted { remaining, .. } => {
            let band = band_of(&store, settings);
            let alert = Alert { band, remaining };
            if tracker.observe(band) {
                if let Some(message) = alert.message() {
                    eprintln!("{} {}", band.symbol(), style(message).yellow());
                }
            }
            Ok(())
        }
        PasteOutcome::Empty => bail!("No codes left"),
        PasteOutcome::Failed { .. } => bail!("Failed to deliver code"),
    }
}

/// Append codes from arguments, or from stdin lines when none are given.
pub fn run_add(settings: &Settings, codes: Vec<String>) -> Result<()> {
    let inputs = if codes.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("Failed to read codes from stdin")?
    } else {
        codes
    };

    let store = open_store(settings)?;
    let mut added = 0;
    let mut rejected = 0;

    for input in &inputs {
        match store.append(input) {
            Ok(true) => added += 1,
            Ok(false) => {}
            Err(e) => {
                rejected += 1;
                eprintln!("{}: {e}", style(input.trim()).red());
            }
        }
    }

    println!("Added {added} codes ({} remaining)", store.remaining());
    if rejected > 0 {
        bail!("{rejected} codes rejected");
    }
    Ok(())
}

pub fn run_reset_index(settings: &Settings, to: usize) -> Result<()> {
    let store = open_store(settings)?;
    let cursor = store.reset_index(to)?;
    println!("Cursor set to {cursor} ({} remaining)", store.remaining());
    Ok(())
}
