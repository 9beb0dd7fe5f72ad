//! Compiler diagnostics
//!
//! Every phase reports problems as [`CompilerDiagnostic`] values. Diagnostics
//! are scoped to a single compilation attempt; [`CompileError`] carries the
//! diagnostics of the phase that stopped the pipeline.

use super::token::Position;
use std::fmt::{self, Display};
use thiserror::Error;

/// The phase a diagnostic was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical,
    Syntax,
    Semantic,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Lexical => write!(f, "Lexical Error"),
            DiagnosticKind::Syntax => write!(f, "Syntax Error"),
            DiagnosticKind::Semantic => write!(f, "Semantic Error"),
        }
    }
}

/// A problem found while compiling a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at Line {line}, Column {column}: {message}")]
pub struct CompilerDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl CompilerDiagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }

    pub fn lexical(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::Lexical, message, position)
    }

    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::Syntax, message, position)
    }

    pub fn semantic(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::Semantic, message, position)
    }
}

/// The first pipeline phase that failed, with its diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("lexical analysis failed with {} error(s)", .0.len())]
    Lexical(Vec<CompilerDiagnostic>),
    #[error("syntax analysis failed: {0}")]
    Syntax(CompilerDiagnostic),
    #[error("semantic analysis failed with {} error(s)", .0.len())]
    Semantic(Vec<CompilerDiagnostic>),
}

impl CompileError {
    pub fn diagnostics(&self) -> &[CompilerDiagnostic] {
        match self {
            CompileError::Lexical(diagnostics) | CompileError::Semantic(diagnostics) => {
                diagnostics
            }
            CompileError::Syntax(diagnostic) => std::slice::from_ref(diagnostic),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            CompileError::Lexical(_) => DiagnosticKind::Lexical,
            CompileError::Syntax(_) => DiagnosticKind::Syntax,
            CompileError::Semantic(_) => DiagnosticKind::Semantic,
        }
    }
}

/// Renders diagnostics with the offending source line and a caret marker
///
/// # Example
/// ```text
/// [Error 1] Lexical Error at Line 1, Column 8: Unexpected character '@'
///   1 | SELECT @ FROM users;
///     |        ^~~~
/// ```
pub fn render_report(source: &str, diagnostics: &[CompilerDiagnostic]) -> String {
    let mut report = String::new();
    for (i, diagnostic) in diagnostics.iter().enumerate() {
        report.push_str(&format!("[Error {}] {}\n", i + 1, diagnostic));
        if source.is_empty() {
            continue;
        }
        let line = source_line(source, diagnostic.line);
        report.push_str(&format!("  {} | {}\n", diagnostic.line, line));
        let pad = " ".repeat(diagnostic.column.saturating_sub(1));
        report.push_str(&format!("  {} | {}^~~~\n", " ".repeat(digits(diagnostic.line)), pad));
    }
    report
}

// Single-line queries fall back to the whole source.
fn source_line(source: &str, line: usize) -> &str {
    source
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or(source)
}

fn digits(n: usize) -> usize {
    n.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diagnostic =
            CompilerDiagnostic::syntax("Expected 'FROM' keyword (found 'x')", Position::new(2, 5));
        assert_eq!(
            diagnostic.to_string(),
            "Syntax Error at Line 2, Column 5: Expected 'FROM' keyword (found 'x')"
        );
    }

    #[test]
    fn test_render_report_points_at_column() {
        let source = "SELECT @ FROM users;";
        let diagnostics = vec![CompilerDiagnostic::lexical(
            "Unexpected character '@'",
            Position::new(1, 8),
        )];
        let report = render_report(source, &diagnostics);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines[0],
            "[Error 1] Lexical Error at Line 1, Column 8: Unexpected character '@'"
        );
        assert_eq!(lines[1], "  1 | SELECT @ FROM users;");
        assert_eq!(lines[2], "    |        ^~~~");
    }

    #[test]
    fn test_render_report_multiline_source() {
        let source = "SELECT *\nFROM users\nWHERE #;";
        let diagnostics = vec![CompilerDiagnostic::lexical(
            "Unexpected character '#'",
            Position::new(3, 7),
        )];
        let report = render_report(source, &diagnostics);
        assert!(report.contains("  3 | WHERE #;"));
    }

    #[test]
    fn test_compile_error_diagnostics() {
        let diagnostic = CompilerDiagnostic::syntax("boom", Position::new(1, 1));
        let err = CompileError::Syntax(diagnostic.clone());
        assert_eq!(err.diagnostics(), &[diagnostic]);
        assert_eq!(err.kind(), DiagnosticKind::Syntax);
        assert!(CompileError::Semantic(vec![]).diagnostics().is_empty());
    }
}
