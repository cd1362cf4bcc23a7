use std::fmt;
use std::ops::Range;

use adv_core::{StepId, ValidationError};
use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::error::FormatError;
use crate::lint::LintWarning;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stops the document from loading.
    Error,
    /// Worth fixing, but the adventure still plays.
    Warning,
}

/// A diagnostic message with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// How serious the problem is.
    pub severity: Severity,
    /// Byte range the diagnostic points at.
    pub span: Range<usize>,
    /// Headline message.
    pub message: String,
    /// Text attached to the highlighted span.
    pub label: Option<String>,
}

impl Diagnostic {
    /// An error diagnostic.
    pub fn error(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// A warning diagnostic.
    pub fn warning(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Attach a label to the highlighted span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Point a format error at the line it names.
    pub fn from_format_error(err: &FormatError) -> Self {
        let diag = Self::error(err.span.clone().unwrap_or(0..0), err.kind.to_string());
        match &err.section {
            Some(section) => diag.with_label(format!("in [{section}]")),
            None => diag,
        }
    }

    /// Point a validation error at the step it concerns.
    pub fn from_validation_error(source: &str, err: &ValidationError) -> Self {
        let span = match err {
            ValidationError::DanglingTarget { step, .. } => step_span(source, step),
            ValidationError::MissingStartStep | ValidationError::DanglingRandomEvent { .. } => 0..0,
        };
        Self::error(span, err.to_string())
    }

    /// Point a lint warning at the step it concerns, if any.
    pub fn from_lint(source: &str, warning: &LintWarning) -> Self {
        let span = warning
            .step()
            .map(|step| step_span(source, step))
            .unwrap_or(0..0);
        Self::warning(span, warning.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {}", self.message)
    }
}

/// Byte range of the `[STEP_<n>]` tag opening a step, or `0..0`.
pub fn step_span(source: &str, step: &StepId) -> Range<usize> {
    let tag = format!("[{step}]");
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&tag) {
            let start = offset + (line.len() - trimmed.len());
            return start..start + tag.len();
        }
        offset += line.len();
    }
    0..0
}

/// Render diagnostics using ariadne for pretty terminal output.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match diag.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let span = (filename, diag.span.clone());
        let mut report = Report::build(kind, span).with_message(&diag.message);

        let label_text = diag.label.as_deref().unwrap_or(&diag.message);
        report = report.with_label(
            Label::new((filename, diag.span.clone()))
                .with_message(label_text)
                .with_color(color),
        );

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adv_core::Label as ChoiceLabel;

    use crate::error::FormatErrorKind;

    const SOURCE: &str = "[GAME_NAME] T [/GAME_NAME]\n[STEP_1]\n[NARRATIVE] x [/NARRATIVE]\n";

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(0..5, "STEP_1 has no narrative");
        assert_eq!(d.to_string(), "error: STEP_1 has no narrative");
    }

    #[test]
    fn finds_step_tags() {
        let span = step_span(SOURCE, &StepId::new("1").unwrap());
        assert_eq!(&SOURCE[span], "[STEP_1]");
        assert_eq!(step_span(SOURCE, &StepId::new("2").unwrap()), 0..0);
    }

    #[test]
    fn format_errors_keep_their_span() {
        let err = FormatError {
            line: Some(2),
            span: Some(27..35),
            section: Some("STEP_1".to_string()),
            kind: FormatErrorKind::StrayText,
        };
        let diag = Diagnostic::from_format_error(&err);
        assert_eq!(diag.span, 27..35);
        assert_eq!(diag.label.as_deref(), Some("in [STEP_1]"));
    }

    #[test]
    fn validation_errors_point_at_step() {
        let err = ValidationError::DanglingTarget {
            step: StepId::new("1").unwrap(),
            label: ChoiceLabel::A,
            target: StepId::new("9").unwrap(),
        };
        let diag = Diagnostic::from_validation_error(SOURCE, &err);
        assert_eq!(&SOURCE[diag.span.clone()], "[STEP_1]");
        assert_eq!(diag.severity, Severity::Error);
    }

    #[test]
    fn render_produces_output() {
        let diags = vec![
            Diagnostic::error(27..35, "STEP_1 choice A targets missing step STEP_9")
                .with_label("defined here"),
        ];
        let output = render_diagnostics(SOURCE, "test.adv", &diags);
        assert!(!output.is_empty());
        assert!(output.contains("targets missing step"));
    }
}
