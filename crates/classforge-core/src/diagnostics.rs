//! Build-phase diagnostics.
//!
//! The builder reports non-fatal observations (a normalized flag, a shadowed
//! ancestor member) as diagnostics instead of failing or printing. The
//! embedder decides whether and where to surface them.

use std::fmt;

/// The severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A problem that prevented the class from being built. Fatal failures
    /// are also returned as errors; the diagnostic form exists for embedders
    /// that collect everything in one stream.
    Error,
    /// Something that built successfully but probably is not what the caller
    /// meant.
    Warning,
    /// An informational note about a normalization the builder applied.
    Info,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Error => write!(f, "error"),
            DiagnosticKind::Warning => write!(f, "warning"),
            DiagnosticKind::Info => write!(f, "info"),
        }
    }
}

/// A single message emitted during a class build.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity.
    pub kind: DiagnosticKind,
    /// Message text.
    pub message: String,
    /// The class being built when the message was emitted, if any.
    pub class: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class {
            Some(class) => write!(f, "{}: {}: {}", class, self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// A collection of diagnostics accumulated across builds.
///
/// Owned by the engine; the builder appends, the embedder drains or inspects.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Append an info message for a class.
    pub fn info(&mut self, class: &str, message: impl Into<String>) {
        self.items.push(Diagnostic {
            kind: DiagnosticKind::Info,
            message: message.into(),
            class: Some(class.to_string()),
        });
    }

    /// Append a warning for a class.
    pub fn warning(&mut self, class: &str, message: impl Into<String>) {
        self.items.push(Diagnostic {
            kind: DiagnosticKind::Warning,
            message: message.into(),
            class: Some(class.to_string()),
        });
    }

    /// Check whether any diagnostics were collected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check for warnings.
    pub fn has_warnings(&self) -> bool {
        self.items
            .iter()
            .any(|d| d.kind == DiagnosticKind::Warning)
    }

    /// Check for errors.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.kind == DiagnosticKind::Error)
    }

    /// Iterate over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Iterate over warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Warning)
    }

    /// Remove all collected diagnostics.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        assert!(!diagnostics.has_warnings());
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn push_and_query() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info("Person", "required flag cleared by default value");
        diagnostics.warning("Car", "attribute 'wheels' shadows an ancestor member");

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_warnings());
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    #[test]
    fn display_format() {
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::Warning,
            message: "shadowed member".into(),
            class: Some("Car".into()),
        };
        assert_eq!(format!("{diagnostic}"), "Car: warning: shadowed member");
    }

    #[test]
    fn clear_resets() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info("Person", "note");
        diagnostics.clear();
        assert!(diagnostics.is_empty());
    }
}
