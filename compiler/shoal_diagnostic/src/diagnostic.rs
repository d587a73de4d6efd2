use std::fmt;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A label attached to a model symbol.
///
/// The subject is whatever the user declared: a class name
/// (`Neato::Dog`), a method (`Neato::Dog#Speak`), or a parcel.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub subject: String,
    pub message: String,
    pub is_primary: bool,
}

impl Label {
    /// Create a primary label (the symbol that broke the rule).
    pub fn primary(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Label {
            subject: subject.into(),
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a secondary label (related context, e.g. the ancestor).
    pub fn secondary(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Label {
            subject: subject.into(),
            message: message.into(),
            is_primary: false,
        }
    }
}

/// A rich diagnostic with all context needed for a useful error message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    /// Error code for searchability.
    pub code: ErrorCode,
    /// Severity level.
    pub severity: Severity,
    /// Main error message.
    pub message: String,
    /// Labeled symbols showing what the error is about.
    pub labels: Vec<Label>,
    /// Additional notes providing context.
    pub notes: Vec<String>,
    /// Text suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a warning diagnostic.
    #[cold]
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    /// Set the main message.
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = msg.into();
        self
    }

    /// Add a primary label.
    pub fn with_label(mut self, subject: impl Into<String>, msg: impl Into<String>) -> Self {
        self.labels.push(Label::primary(subject, msg));
        self
    }

    /// Add a secondary label.
    pub fn with_secondary_label(
        mut self,
        subject: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        self.labels.push(Label::secondary(subject, msg));
        self
    }

    /// Add a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Check if this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Get the primary subject, if any.
    pub fn primary_subject(&self) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.is_primary)
            .map(|l| l.subject.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;

        for label in &self.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            write!(f, "\n  {marker} {}: {}", label.subject, label.message)?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }

        for suggestion in &self.suggestions {
            write!(f, "\n  = help: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Build an internal compiler error diagnostic.
#[cold]
pub fn internal_error(message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9001)
        .with_message(message)
        .with_note("this is a bug in the compiler; please report it")
}
