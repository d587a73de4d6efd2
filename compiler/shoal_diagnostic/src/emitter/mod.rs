//! Diagnostic Emitters
//!
//! The driver renders diagnostics for humans on stderr through the
//! [`TerminalEmitter`]. Each emitter implements the `DiagnosticEmitter`
//! trait so tests can capture output into a `Vec<u8>`.

mod terminal;

pub use terminal::{ColorMode, TerminalEmitter};

use crate::Diagnostic;

/// Something that reports diagnostics to a user.
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic);

    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        diagnostics.iter().for_each(|diagnostic| self.emit(diagnostic));
    }

    fn flush(&mut self);

    /// Closing line such as `error: aborting due to 1 previous error`.
    /// Prints nothing when both counts are zero.
    fn emit_summary(&mut self, error_count: usize, warning_count: usize);
}
