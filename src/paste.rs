//! Delivering the next code and consuming it.
//!
//! Keystroke injection is platform glue; it sits behind `CodeSink`. A
//! code is only consumed after the sink reports success, so a failed
//! paste never burns a code and one paste never consumes more than one.

use std::io::Write;

use crate::config::PasteMethod;
use crate::storage::CodeStore;

/// Something that can hand a code to the focused application.
pub trait CodeSink {
    /// Deliver `code`; `false` means nothing was delivered.
    fn deliver(&self, code: &str) -> bool;
}

/// Writes codes to standard output.
#[derive(Debug, Clone, Copy)]
pub struct StdoutSink {
    method: PasteMethod,
}

impl StdoutSink {
    pub fn new(method: PasteMethod) -> Self {
        Self { method }
    }

    fn write_to(&self, out: &mut impl Write, code: &str) -> std::io::Result<()> {
        match self.method {
            PasteMethod::Clipboard => writeln!(out, "{code}")?,
            PasteMethod::TypeDigits => {
                // One write per key; anything but digits has no key to press
                for digit in code.chars().filter(char::is_ascii_digit) {
                    write!(out, "{digit}")?;
                    out.flush()?;
                }
                writeln!(out)?;
            }
        }
        out.flush()
    }
}

impl CodeSink for StdoutSink {
    fn deliver(&self, code: &str) -> bool {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match self.write_to(&mut out, code) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[paste] failed to write code: {e}");
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// Delivered and consumed.
    Pasted { code: String, remaining: usize },
    /// Nothing left to paste.
    Empty,
    /// The sink refused the code; it stays at the head of the queue.
    Failed { code: String },
}

/// Peek the next code, deliver it, and consume it on success.
pub fn paste_next(store: &CodeStore, sink: &dyn CodeSink) -> PasteOutcome {
    let Some(code) = store.peek_next() else {
        return PasteOutcome::Empty;
    };

    if !sink.deliver(&code) {
        crate::debug_event!("paste", "delivery failed");
        return PasteOutcome::Failed { code };
    }

    if !store.consume_delivered(&code) {
        // The store changed underneath us between peek and consume
        tracing::warn!("[paste] code delivered but could not be consumed");
    }

    PasteOutcome::Pasted {
        code,
        remaining: store.remaining(),
    }
}
