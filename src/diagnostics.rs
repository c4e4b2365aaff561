//! Severity-graded diagnostics collected during a conversion.
//!
//! A conversion run accumulates human-readable warnings and structured
//! [`ConversionError`] records in a [`Diagnostics`] sink. At the end of the
//! run the sink is frozen into a [`ConversionResult`].

use crate::version_detection::SbomFormat;
use colored::*;
use log::debug;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Severity of a recorded problem, ordered `Info < Warning < Error < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn is_at_least(self, level: Severity) -> bool {
        self >= level
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// A single recorded problem with the component that reported it.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionError {
    message: String,
    severity: Severity,
    component: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    context: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(
        serialize_with = "serialize_cause",
        skip_serializing_if = "Option::is_none"
    )]
    cause: Option<Cause>,
}

fn serialize_cause<S: Serializer>(cause: &Option<Cause>, serializer: S) -> Result<S::Ok, S::Error> {
    match cause {
        Some(c) => serializer.serialize_str(&c.to_string()),
        None => serializer.serialize_none(),
    }
}

impl ConversionError {
    pub fn new(severity: Severity, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            component: component.into(),
            context: Map::new(),
            code: None,
            cause: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn is_at_least(&self, level: Severity) -> bool {
        self.severity.is_at_least(level)
    }

    /// Format the error with colors for terminal output
    pub fn format_colored(&self) -> String {
        let (icon, color_fn): (&str, fn(&str) -> ColoredString) = match self.severity {
            Severity::Critical => ("✗✗", |s: &str| s.red().bold()),
            Severity::Error => ("✗", |s: &str| s.red().bold()),
            Severity::Warning => ("⚠", |s: &str| s.yellow().bold()),
            Severity::Info => ("ℹ", |s: &str| s.cyan().bold()),
        };

        let mut output = format!("{} [{}] ", color_fn(icon), self.component.bright_blue());
        if let Some(ref code) = self.code {
            output.push_str(&format!("{} ", code.bright_black()));
        }
        output.push_str(&self.message);
        output.push('\n');
        if !self.context.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                "→".bright_green(),
                Value::Object(self.context.clone()).to_string().green()
            ));
        }
        output
    }

    /// Format without colors for logs or non-terminal output
    pub fn format_plain(&self) -> String {
        let mut output = format!("[{}] [{}] ", self.severity, self.component);
        if let Some(ref code) = self.code {
            output.push_str(&format!("{} ", code));
        }
        output.push_str(&self.message);
        output.push('\n');
        if !self.context.is_empty() {
            output.push_str(&format!("  Context: {}\n", Value::Object(self.context.clone())));
        }
        if let Some(ref cause) = self.cause {
            output.push_str(&format!("  Caused by: {}\n", cause));
        }
        output
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.component, self.message)
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// Mutable sink threaded through validators, transformers and the converter.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
    errors: Vec<ConversionError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records are only traced here. Callers render the finished
    /// [`ConversionResult`] themselves.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("warning: {}", message);
        self.warnings.push(message);
    }

    pub fn record(&mut self, err: ConversionError) {
        debug!("{}", err);
        self.errors.push(err);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[ConversionError] {
        &self.errors
    }

    /// True when anything Error-or-worse has been recorded.
    pub fn has_failures(&self) -> bool {
        self.errors.iter().any(|e| e.is_at_least(Severity::Error))
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<ConversionError>) {
        (self.warnings, self.errors)
    }

    pub fn into_errors(self) -> Vec<ConversionError> {
        self.errors
    }
}

/// Terminal value of one `convert` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    #[serde(skip)]
    content: String,
    target_format: SbomFormat,
    warnings: Vec<String>,
    errors: Vec<ConversionError>,
    success: bool,
}

impl ConversionResult {
    pub fn new(content: String, target_format: SbomFormat, diagnostics: Diagnostics) -> Self {
        let success = !diagnostics.has_failures();
        let (warnings, errors) = diagnostics.into_parts();
        Self {
            content,
            target_format,
            warnings,
            errors,
            success,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn target_format(&self) -> SbomFormat {
        self.target_format
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[ConversionError] {
        &self.errors
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// Diagnostics (without the converted content) as pretty JSON.
    pub fn report_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render warnings, errors and a summary line with colors.
    pub fn format_colored(&self) -> String {
        let mut output = String::new();
        for warning in &self.warnings {
            output.push_str(&format!("{} {}\n", "⚠".yellow().bold(), warning));
        }
        for err in &self.errors {
            output.push_str(&err.format_colored());
        }

        let status = if self.success {
            "✓ Conversion succeeded".green().bold()
        } else {
            "✗ Conversion failed".red().bold()
        };
        output.push_str(&format!(
            "{} ({} {}, {} {})\n",
            status,
            self.warnings.len(),
            if self.warnings.len() == 1 { "warning" } else { "warnings" },
            self.errors.len(),
            if self.errors.len() == 1 { "error" } else { "errors" },
        ));
        output
    }

    /// Render without colors (for logs)
    pub fn format_plain(&self) -> String {
        let mut output = String::new();
        for warning in &self.warnings {
            output.push_str(&format!("[WARNING] {}\n", warning));
        }
        for err in &self.errors {
            output.push_str(&err.format_plain());
        }
        output.push_str(&format!(
            "Summary: success={}, {} warnings, {} errors\n",
            self.success,
            self.warnings.len(),
            self.errors.len()
        ));
        output
    }
}
