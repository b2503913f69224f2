//! Diagnostic infrastructure.
//!
//! Analyses never format or print diagnostics. They attach a [`Diagnostic`]
//! to the unit being checked through a [`DiagnosticBag`], and the front end
//! decides how to render them.
//!
//! # Components
//!
//! - `DiagnosticSeverity` - Error or Warning
//! - `Diagnostic` - one message, attached to a file and a subject node
//! - `DiagnosticBag` - the per-unit collection, with running counts
//! - `diagnostic_codes` / `DiagnosticMessage` - the message table

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Severity
// =============================================================================

/// The severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// A warning
    Warning = 2,
    /// An error (highest severity)
    Error = 1,
}

impl DiagnosticSeverity {
    /// Get the severity name for display.
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DiagnosticSeverity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, DiagnosticSeverity::Warning)
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Message table
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub severity: DiagnosticSeverity,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    // Tree validation
    pub const NON_ASCII_FILE_NAME: u32 = 1001;
    pub const IDENTICAL_SOURCE_FILES: u32 = 1002;
    pub const FILE_NAMES_DIFFER_BY_CASE: u32 = 1003;
    pub const DUPLICATE_DECLARATION: u32 = 1004;
    pub const DUPLICATE_TYPE_PARAMETER: u32 = 1005;

    // Wiring and type scanning
    pub const TYPE_NOT_FOUND: u32 = 2001;
    pub const WRONG_TYPE_ARGUMENT_COUNT: u32 = 2002;
    pub const MISSING_TYPE_ARGUMENT: u32 = 2003;
    pub const NOT_A_TYPE: u32 = 2004;

    // Refinement validation
    pub const CIRCULAR_ALIAS: u32 = 3001;
    pub const CIRCULAR_INHERITANCE: u32 = 3002;
    pub const UNDECIDABLE_SUPERTYPE: u32 = 3003;
    pub const VARIANCE_VIOLATION: u32 = 3004;
    pub const REFINEMENT_NOT_ASSIGNABLE: u32 = 3005;

    // Type analysis
    pub const NOT_ASSIGNABLE: u32 = 4001;
    pub const NOT_EXACTLY: u32 = 4002;
    pub const MEMBER_NOT_FOUND: u32 = 4003;
    pub const UNDECIDABLE_TYPE_QUERY: u32 = 4004;

    // Flow analysis
    pub const CASES_DO_NOT_COVER: u32 = 5001;

    // Module validation
    pub const MODULE_NOT_FOUND: u32 = 6001;
    pub const MODULE_CYCLE: u32 = 6002;
    pub const MODULE_HIERARCHY: u32 = 6003;

    // Usage analysis
    pub const UNUSED_DECLARATION: u32 = 7001;

    // Driver and assertions
    pub const EXPECTED_ERROR_NOT_FOUND: u32 = 9001;
    pub const PHASE_FAILURE: u32 = 9002;
}

use diagnostic_codes as codes;

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: codes::NON_ASCII_FILE_NAME,
        severity: DiagnosticSeverity::Warning,
        message: "source file name has non-ASCII characters: {0}",
    },
    DiagnosticMessage {
        code: codes::IDENTICAL_SOURCE_FILES,
        severity: DiagnosticSeverity::Error,
        message: "identical source files: {0} and {1}",
    },
    DiagnosticMessage {
        code: codes::FILE_NAMES_DIFFER_BY_CASE,
        severity: DiagnosticSeverity::Warning,
        message: "source file names differ only by case: {0} and {1}",
    },
    DiagnosticMessage {
        code: codes::DUPLICATE_DECLARATION,
        severity: DiagnosticSeverity::Error,
        message: "duplicate declaration name: {0}",
    },
    DiagnosticMessage {
        code: codes::DUPLICATE_TYPE_PARAMETER,
        severity: DiagnosticSeverity::Error,
        message: "duplicate type parameter name: {0} of {1}",
    },
    DiagnosticMessage {
        code: codes::TYPE_NOT_FOUND,
        severity: DiagnosticSeverity::Error,
        message: "type declaration does not exist: {0}",
    },
    DiagnosticMessage {
        code: codes::WRONG_TYPE_ARGUMENT_COUNT,
        severity: DiagnosticSeverity::Error,
        message: "wrong number of type arguments to {0}: expected {1} but found {2}",
    },
    DiagnosticMessage {
        code: codes::MISSING_TYPE_ARGUMENT,
        severity: DiagnosticSeverity::Error,
        message: "missing type argument for type parameter {0} of {1}",
    },
    DiagnosticMessage {
        code: codes::NOT_A_TYPE,
        severity: DiagnosticSeverity::Error,
        message: "not a type: {0}",
    },
    DiagnosticMessage {
        code: codes::CIRCULAR_ALIAS,
        severity: DiagnosticSeverity::Error,
        message: "type alias is circular: definition of {0} is recursive, involving {1}",
    },
    DiagnosticMessage {
        code: codes::CIRCULAR_INHERITANCE,
        severity: DiagnosticSeverity::Error,
        message: "inheritance is circular: definition of {0} is recursive, involving {1}",
    },
    DiagnosticMessage {
        code: codes::UNDECIDABLE_SUPERTYPE,
        severity: DiagnosticSeverity::Error,
        message: "type with contravariant type parameter {0} appears in contravariant or invariant location in supertype: {1}",
    },
    DiagnosticMessage {
        code: codes::VARIANCE_VIOLATION,
        severity: DiagnosticSeverity::Error,
        message: "{0} type parameter {1} appears in {2} location in {3}",
    },
    DiagnosticMessage {
        code: codes::REFINEMENT_NOT_ASSIGNABLE,
        severity: DiagnosticSeverity::Error,
        message: "type of member {0} must be assignable to the type of the refined member: {1} is not assignable to {2}",
    },
    DiagnosticMessage {
        code: codes::NOT_ASSIGNABLE,
        severity: DiagnosticSeverity::Error,
        message: "{0} is not assignable to {1}",
    },
    DiagnosticMessage {
        code: codes::NOT_EXACTLY,
        severity: DiagnosticSeverity::Error,
        message: "{0} is not exactly {1}",
    },
    DiagnosticMessage {
        code: codes::MEMBER_NOT_FOUND,
        severity: DiagnosticSeverity::Error,
        message: "member {0} does not exist or has no matching signature in {1}",
    },
    DiagnosticMessage {
        code: codes::UNDECIDABLE_TYPE_QUERY,
        severity: DiagnosticSeverity::Error,
        message: "type query could not be decided: {0}",
    },
    DiagnosticMessage {
        code: codes::CASES_DO_NOT_COVER,
        severity: DiagnosticSeverity::Error,
        message: "case types must cover all cases of the switch type {0}: missing {1}",
    },
    DiagnosticMessage {
        code: codes::MODULE_NOT_FOUND,
        severity: DiagnosticSeverity::Error,
        message: "cannot find module {0} imported by {1}",
    },
    DiagnosticMessage {
        code: codes::MODULE_CYCLE,
        severity: DiagnosticSeverity::Error,
        message: "module dependency cycle: {0}",
    },
    DiagnosticMessage {
        code: codes::MODULE_HIERARCHY,
        severity: DiagnosticSeverity::Error,
        message: "found two modules within the same hierarchy: '{0}' and '{1}'",
    },
    DiagnosticMessage {
        code: codes::UNUSED_DECLARATION,
        severity: DiagnosticSeverity::Warning,
        message: "declaration is never used: {0}",
    },
    DiagnosticMessage {
        code: codes::EXPECTED_ERROR_NOT_FOUND,
        severity: DiagnosticSeverity::Error,
        message: "expected an error for {0} but none was reported",
    },
    DiagnosticMessage {
        code: codes::PHASE_FAILURE,
        severity: DiagnosticSeverity::Error,
        message: "phase {0} failed: {1}",
    },
];

pub fn get_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

// =============================================================================
// Diagnostic
// =============================================================================

/// Additional information related to a diagnostic, such as where a
/// conflicting declaration lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRelatedInfo {
    pub file_name: String,
    pub message: String,
}

/// A diagnostic message attached to a file and, optionally, to the node
/// (declaration or statement) that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The unit the diagnostic belongs to
    pub file_name: String,
    /// The node the diagnostic is attached to, e.g. `Box.T` or `check #2`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject: Option<String>,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub code: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub related: Vec<DiagnosticRelatedInfo>,
}

impl Diagnostic {
    pub fn new(
        file_name: impl Into<String>,
        message: impl Into<String>,
        severity: DiagnosticSeverity,
        code: u32,
    ) -> Self {
        Diagnostic {
            file_name: file_name.into(),
            subject: None,
            message: message.into(),
            severity,
            code,
            related: Vec::new(),
        }
    }

    pub fn error(file_name: impl Into<String>, message: impl Into<String>, code: u32) -> Self {
        Self::new(file_name, message, DiagnosticSeverity::Error, code)
    }

    pub fn warning(file_name: impl Into<String>, message: impl Into<String>, code: u32) -> Self {
        Self::new(file_name, message, DiagnosticSeverity::Warning, code)
    }

    /// Build a diagnostic from the message table.
    ///
    /// Unknown codes produce an error whose text is the joined arguments.
    pub fn from_code(file_name: impl Into<String>, code: u32, args: &[&str]) -> Self {
        match get_message(code) {
            Some(template) => Self::new(
                file_name,
                format_message(template.message, args),
                template.severity,
                code,
            ),
            None => Self::error(file_name, args.join(" "), code),
        }
    }

    /// Attach the diagnostic to a named node.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_related(mut self, file_name: impl Into<String>, message: impl Into<String>) -> Self {
        self.related.push(DiagnosticRelatedInfo {
            file_name: file_name.into(),
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    pub fn is_warning(&self) -> bool {
        self.severity.is_warning()
    }

    /// Format the diagnostic in a simple format.
    ///
    /// Returns a string like: "error[L4001]: Dog is not assignable to Cat"
    pub fn format_simple(&self) -> String {
        format!("{}[L{}]: {}", self.severity, self.code, self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

// =============================================================================
// DiagnosticBag
// =============================================================================

/// The diagnostics reported against one compilation unit.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    default_file: String,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new diagnostic bag with a default file name.
    pub fn with_file(file_name: impl Into<String>) -> Self {
        DiagnosticBag {
            default_file: file_name.into(),
            ..Self::default()
        }
    }

    pub fn default_file(&self) -> &str {
        &self.default_file
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            DiagnosticSeverity::Error => self.error_count += 1,
            DiagnosticSeverity::Warning => self.warning_count += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    /// Report a table message against the default file.
    pub fn report(&mut self, code: u32, subject: impl Into<String>, args: &[&str]) {
        let diagnostic = Diagnostic::from_code(self.default_file.clone(), code, args)
            .with_subject(subject);
        self.add(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, code: u32) {
        self.add(Diagnostic::error(self.default_file.clone(), message, code));
    }

    pub fn warning(&mut self, message: impl Into<String>, code: u32) {
        self.add(Diagnostic::warning(self.default_file.clone(), message, code));
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics attached to the given subject.
    pub fn for_subject<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.subject.as_deref() == Some(subject))
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
