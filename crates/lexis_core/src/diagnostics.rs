//! Recoverable diagnostics produced during name resolution.
//!
//! Nothing in this crate aborts a pass because of a problem in the analysed
//! code.  Every such problem becomes a [`Diagnostic`] handed to the injected
//! [`DiagnosticListener`], and resolution carries on with a best-effort
//! result.

use std::cell::RefCell;
use std::fmt;

use thiserror::Error;

use crate::element::ElementId;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// What went wrong. The `Display` impl is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("the name '{name}' is already defined")]
    DuplicateDefinition { name: String },

    #[error("'{name}' cannot be used to name a method, there is already a getter with the same name")]
    MethodAndGetterWithSameName { name: String },

    #[error("'{name}' cannot be used to name a getter, there is already a method with the same name")]
    GetterAndMethodWithSameName { name: String },

    #[error(
        "the name '{prefix}' is already used as an import prefix and cannot be used to name a top-level element"
    )]
    PrefixCollidesWithTopLevelMember { prefix: String },

    #[error("local variables cannot be referenced before they are declared")]
    ReferencedBeforeDeclaration { name: String },

    /// `libraries` is already formatted as a quoted list.
    #[error("the name '{name}' is defined in the libraries {libraries}")]
    AmbiguousImport { name: String, libraries: String },

    #[error("element '{name}' from SDK library '{sdk_library}' is implicitly hidden by '{other_library}'")]
    ConflictingSdkImport {
        name: String,
        sdk_library: String,
        other_library: String,
    },
}

impl DiagnosticKind {
    /// Stable upper-snake-case code for the diagnostic.
    /// Stable code of the underlying kind.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateDefinition { .. } => "DUPLICATE_DEFINITION",
            DiagnosticKind::MethodAndGetterWithSameName { .. } => "METHOD_AND_GETTER_WITH_SAME_NAME",
            DiagnosticKind::GetterAndMethodWithSameName { .. } => "GETTER_AND_METHOD_WITH_SAME_NAME",
            DiagnosticKind::PrefixCollidesWithTopLevelMember { .. } => {
                "PREFIX_COLLIDES_WITH_TOP_LEVEL_MEMBER"
            }
            DiagnosticKind::ReferencedBeforeDeclaration { .. } => "REFERENCED_BEFORE_DECLARATION",
            DiagnosticKind::AmbiguousImport { .. } => "AMBIGUOUS_IMPORT",
            DiagnosticKind::ConflictingSdkImport { .. } => "CONFLICTING_SDK_IMPORT",
        }
    }

    /// Import problems and early references are warnings; the rest are errors.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::AmbiguousImport { .. }
            | DiagnosticKind::ConflictingSdkImport { .. }
            | DiagnosticKind::ReferencedBeforeDeclaration { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A located diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Compilation unit the location refers to, when known.
    pub unit: Option<ElementId>,
    pub offset: usize,
    pub length: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(unit: Option<ElementId>, offset: usize, length: usize, kind: DiagnosticKind) -> Self {
        Self {
            unit,
            offset,
            length,
            kind,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}] {}: {}",
            self.offset,
            self.offset + self.length,
            self.code(),
            self.kind
        )
    }
}

/// Receiver of diagnostics. Shared by every scope of a pass, hence `&self`.
pub trait DiagnosticListener {
    fn on_diagnostic(&self, diagnostic: Diagnostic);
}

/// Listener that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreDiagnostics;

impl DiagnosticListener for IgnoreDiagnostics {
    fn on_diagnostic(&self, _diagnostic: Diagnostic) {}
}

/// Listener that keeps every diagnostic in arrival order.
#[derive(Debug, Default)]
pub struct DiagnosticRecorder {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Codes of the recorded diagnostics, in arrival order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.borrow().iter().map(Diagnostic::code).collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl DiagnosticListener for DiagnosticRecorder {
    fn on_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

/// Formats `names` as `'a' and 'b'` or `'a', 'b' and 'c'`.
pub(crate) fn quoted_name_list(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => format!("'{only}'"),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(|n| format!("'{n}'"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{head} and '{last}'")
        }
    }
}
