//! Non-fatal diagnostics
//!
//! Grammar handlers never abort. Every problem is appended to a
//! [`Diagnostics`] sink keyed by the source range of the offending symbol,
//! and the handler returns a best-effort node so parsing can continue at the
//! next statement boundary.

use super::ast::Range;
use log::debug;
use std::fmt;

/// Diagnostic severity. Lower values are more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 1,
    Warning = 2,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(range: Range, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, character {}: {}",
            self.severity,
            self.range.start.line + 1,
            self.range.start.character + 1,
            self.message
        )
    }
}

/// Ordered, append-only diagnostic collection.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, range: Range, severity: Severity, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(range, severity, message);
        debug!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn error(&mut self, range: Range, message: impl Into<String>) {
        self.report(range, Severity::Error, message);
    }

    pub fn warn(&mut self, range: Range, message: impl Into<String>) {
        self.report(range, Severity::Warning, message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Position;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error < Severity::Warning);
    }

    #[test]
    fn test_diagnostics_keep_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(Range::from(((0, 4), (0, 5))), "Already defined: x");
        diagnostics.error(Range::from(((1, 0), (1, 1))), "Undefined");

        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["Already defined: x", "Undefined"]);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::new(
            Range::empty(Position::new(2, 7)),
            Severity::Error,
            "Expected: \";\" Actual: \"}\"",
        );
        assert_eq!(
            diagnostic.to_string(),
            "error at line 3, character 8: Expected: \";\" Actual: \"}\""
        );
    }
}
