//! Human-readable diagnostics for a terminal.
//!
//! ```text
//! error[E2001]: Cannot override final method Neato::Dog#Wag
//!   --> Neato::Pup#Wag: overrides a final method
//!       Neato::Dog#Wag: declared final here
//!   = help: drop the override or remove `final` from the ancestor
//! ```

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

use super::DiagnosticEmitter;

/// Which ANSI style a piece of output gets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Style {
    Error,
    Warning,
    Note,
    Help,
    Emphasis,
    Context,
}

impl Style {
    fn ansi(self) -> &'static str {
        match self {
            Style::Error => "\x1b[1;31m",
            Style::Warning => "\x1b[1;33m",
            Style::Note => "\x1b[1;36m",
            Style::Help => "\x1b[1;32m",
            Style::Emphasis => "\x1b[1m",
            Style::Context => "\x1b[1;34m",
        }
    }

    fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Error => Style::Error,
            Severity::Warning => Style::Warning,
            Severity::Note => Style::Note,
            Severity::Help => Style::Help,
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Color output mode for terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Colour only when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve to a boolean; `Auto` defers to `is_tty`.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }

    /// Parse a `--color` flag value.
    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(ColorMode::Auto),
            "always" => Some(ColorMode::Always),
            "never" => Some(ColorMode::Never),
            _ => None,
        }
    }
}

/// Writes diagnostics as text, optionally coloured.
///
/// Write errors are ignored: there is nowhere left to report them.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
        }
    }

    pub fn stderr(mode: ColorMode, is_tty: bool) -> TerminalEmitter<io::Stderr> {
        TerminalEmitter::with_color_mode(io::stderr(), mode, is_tty)
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.colors {
            format!("{}{text}{RESET}", style.ansi())
        } else {
            text.to_string()
        }
    }

    fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = format!(
            "{}{}: {}\n",
            self.paint(
                &diagnostic.severity.to_string(),
                Style::for_severity(diagnostic.severity)
            ),
            self.paint(&format!("[{}]", diagnostic.code), Style::Emphasis),
            diagnostic.message
        );

        for label in &diagnostic.labels {
            let (marker, style) = if label.is_primary {
                ("-->", Style::Error)
            } else {
                ("   ", Style::Context)
            };
            out.push_str(&format!(
                "  {marker} {}: {}\n",
                self.paint(&label.subject, Style::Emphasis),
                self.paint(&label.message, style)
            ));
        }
        for note in &diagnostic.notes {
            out.push_str(&format!("  = {}: {note}\n", self.paint("note", Style::Emphasis)));
        }
        for suggestion in &diagnostic.suggestions {
            out.push_str(&format!("  = {}: {suggestion}\n", self.paint("help", Style::Help)));
        }
        out.push('\n');
        out
    }
}

fn count(n: usize, what: &str) -> String {
    if n == 1 {
        format!("1 {what}")
    } else {
        format!("{n} {what}s")
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        let text = self.render(diagnostic);
        let _ = self.writer.write_all(text.as_bytes());
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        let line = match (error_count, warning_count) {
            (0, 0) => return,
            (0, warnings) => format!(
                "{}: {} emitted",
                self.paint("warning", Style::Warning),
                count(warnings, "warning")
            ),
            (errors, warnings) => {
                let mut line = format!(
                    "{}: aborting due to {}",
                    self.paint("error", Style::Error),
                    count(errors, "previous error")
                );
                if warnings > 0 {
                    line.push_str(&format!("; {} emitted", count(warnings, "warning")));
                }
                line
            }
        };
        let _ = writeln!(self.writer, "{line}");
    }
}
