use thiserror::Error;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with a JSON-pointer style location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn error(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            ..Self::error(code, path, message)
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Route an issue by its severity.
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            IssueSeverity::Error => self.errors.push(issue),
            IssueSeverity::Warning => self.warnings.push(issue),
        }
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Failures while loading, validating or applying a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(String),
    /// The script did not pass validation.
    #[error("invalid script: {} error(s)", .0.errors.len())]
    Invalid(ValidationReport),
    /// A step failed while being applied.
    #[error("step {index} ({op}) failed: {source}")]
    Step {
        index: usize,
        op: &'static str,
        #[source]
        source: schemata_core::Error,
    },
}

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;
