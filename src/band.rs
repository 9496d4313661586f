//! Remaining-count severity bands.
//!
//! Thresholds are inclusive upper bounds: with the defaults (100/40/10)
//! a count of 10 is red, 11..=40 orange, 41..=100 yellow, above that green.

use serde::{Deserialize, Serialize};

/// Severity of the remaining code count, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorBand {
    Green,
    Yellow,
    Orange,
    Red,
}

impl ColorBand {
    /// Classify a remaining count against the thresholds.
    pub fn from_remaining(remaining: usize, thresholds: &Thresholds) -> Self {
        if remaining <= thresholds.red {
            ColorBand::Red
        } else if remaining <= thresholds.orange {
            ColorBand::Orange
        } else if remaining <= thresholds.yellow {
            ColorBand::Yellow
        } else {
            ColorBand::Green
        }
    }

    /// Strictly more severe than `other`.
    pub fn is_worse_than(self, other: ColorBand) -> bool {
        self > other
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorBand::Green => "green",
            ColorBand::Yellow => "yellow",
            ColorBand::Orange => "orange",
            ColorBand::Red => "red",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ColorBand::Green => "🟢",
            ColorBand::Yellow => "🟡",
            ColorBand::Orange => "🟠",
            ColorBand::Red => "🔴",
        }
    }
}

impl std::fmt::Display for ColorBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Band cutoffs, each an inclusive upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub yellow: usize,
    pub orange: usize,
    pub red: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(100, 40, 10)
    }
}

impl Thresholds {
    pub fn new(yellow: usize, orange: usize, red: usize) -> Self {
        Self {
            yellow,
            orange,
            red,
        }
    }

    /// Require `yellow > orange > red`.
    pub fn validate(&self) -> Result<(), String> {
        if self.yellow > self.orange && self.orange > self.red {
            Ok(())
        } else {
            Err(format!(
                "expected yellow > orange > red, got {}/{}/{}",
                self.yellow, self.orange, self.red
            ))
        }
    }
}

/// Remembers the last observed band to detect downgrades.
#[derive(Debug, Default)]
pub struct BandTracker {
    last: Option<ColorBand>,
}

impl BandTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `band`; true when it is strictly worse than the previous one.
    ///
    /// The first observation never reports a downgrade.
    pub fn observe(&mut self, band: ColorBand) -> bool {
        let downgraded = self.last.is_some_and(|last| band.is_worse_than(last));
        self.last = Some(band);
        downgraded
    }

    pub fn last(&self) -> Option<ColorBand> {
        self.last
    }
}
