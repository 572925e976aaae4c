//! Error reporting (spec.md §7).
//!
//! `CompileError` covers the hard failures the CLI exits non-zero on;
//! `Diagnostic` covers softer, possibly-multiple analyzer findings
//! (warnings in addition to errors) collected into a `DiagnosticSink`
//! before being rendered.

use crate::span::{offset_to_line_col, Span};
use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Warning,
        }
    }

    /// Render as `"<message> on line <N>"`, matching the collaborator
    /// program's plain-text diagnostic format exactly (spec.md §7).
    pub fn plain_text(&self, source: &str) -> String {
        let (line, _col) = offset_to_line_col(source, self.span.start);
        format!("{} on line {}", self.message, line)
    }
}

/// Accumulates diagnostics during analysis; the analyzer keeps going
/// after an error so a single `abmc` invocation reports as many problems
/// as it can find in one pass (spec.md §7).
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::error(message, span));
    }

    pub fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::warning(message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Pretty, source-quoting report for each diagnostic, used by the
    /// interactive CLI path; `source_name` is the file path to display.
    pub fn render_pretty(&self, source_name: &str, source: &str) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| {
                let kind = match d.severity {
                    Severity::Error => ReportKind::Error,
                    Severity::Warning => ReportKind::Warning,
                };
                let color = match d.severity {
                    Severity::Error => Color::Red,
                    Severity::Warning => Color::Yellow,
                };
                let mut buf = Vec::new();
                let report = Report::build(kind, (source_name, d.span.clone()))
                    .with_label(
                        Label::new((source_name, d.span.clone()))
                            .with_message(&d.message)
                            .with_color(color),
                    )
                    .finish();
                let _ = report.write((source_name, Source::from(source)), &mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
            .collect()
    }
}

/// Top-level failure modes the CLI maps to process exit codes
/// (spec.md §5, §7).
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{message} on line {line}")]
    Lex { message: String, line: usize },

    #[error("{message} on line {line}")]
    Parse { message: String, line: usize },

    /// Carries every diagnostic collected during analysis, already
    /// formatted, so the CLI can print them all before exiting.
    #[error("analysis failed with {} error(s)", .messages.len())]
    Analysis { messages: Vec<String> },

    #[error("{0}")]
    Backend(String),

    #[error("malformed {kind}: missing \"=\" in {text:?}")]
    Param { kind: &'static str, text: String },
}

impl CompileError {
    pub fn lex_at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, _) = offset_to_line_col(source, offset);
        CompileError::Lex {
            message: message.into(),
            line,
        }
    }

    pub fn parse_at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, _) = offset_to_line_col(source, offset);
        CompileError::Parse {
            message: message.into(),
            line,
        }
    }

    pub fn from_sink(sink: &DiagnosticSink, source: &str) -> Self {
        let messages = sink
            .all()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.plain_text(source))
            .collect();
        CompileError::Analysis { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_reports_one_indexed_line() {
        let source = "a\nb\nc";
        let diag = Diagnostic::error("unexpected token", 2..3);
        assert_eq!(diag.plain_text(source), "unexpected token on line 2");
    }

    #[test]
    fn sink_tracks_whether_any_error_was_pushed() {
        let mut sink = DiagnosticSink::new();
        sink.warning("heads up", 0..1);
        assert!(!sink.has_errors());
        sink.error("boom", 0..1);
        assert!(sink.has_errors());
    }
}
