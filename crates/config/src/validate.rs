//! Settings validation.
//!
//! Checks the values that would otherwise only fail on the first request
//! (malformed endpoint, zero timeout) and reports them up front.

use crate::schema::SetupConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "endpoint.base_url"
    pub path: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating settings.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Validate loaded settings.
pub fn validate(config: &SetupConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let base_url = config.endpoint.base_url.trim();
    match url::Url::parse(base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.query().is_some() || url.fragment().is_some() {
                result.push(
                    Severity::Warning,
                    "endpoint.base_url",
                    "query and fragment are dropped when building API URLs",
                );
            }
        },
        Ok(url) => result.push(
            Severity::Error,
            "endpoint.base_url",
            format!("unsupported scheme \"{}\", expected http or https", url.scheme()),
        ),
        Err(e) => result.push(
            Severity::Error,
            "endpoint.base_url",
            format!("invalid URL \"{base_url}\": {e}"),
        ),
    }

    if config.endpoint.timeout_secs == Some(0) {
        result.push(
            Severity::Error,
            "endpoint.timeout_secs",
            "timeout must be at least one second; omit it to disable",
        );
    }

    if config.wizard.provider.trim().is_empty() {
        result.push(Severity::Error, "wizard.provider", "provider must not be empty");
    }

    if config
        .wizard
        .custom_env_key
        .as_deref()
        .is_some_and(|k| k.trim().is_empty())
    {
        result.push(
            Severity::Warning,
            "wizard.custom_env_key",
            "blank custom credential variable is ignored",
        );
    }

    result
}
