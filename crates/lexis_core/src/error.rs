//! Error types for the Lexis resolution engine.
//!
//! These are caller-contract failures. Problems in the analysed source code
//! are never reported here; they go through a
//! [`DiagnosticListener`](crate::diagnostics::DiagnosticListener) instead.

use thiserror::Error;

use crate::element::ElementKind;
use crate::syntax::NodeKind;

/// All hard failures that can be produced while assembling scopes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// The node (or one of its ancestors) has no enclosing compilation unit.
    #[error("cannot create scope: node is not part of a compilation unit")]
    NotInCompilationUnit,

    /// A scope-introducing node was never annotated with its element.
    #[error("cannot build a scope for an unresolved {kind:?}")]
    UnresolvedNode {
        /// The kind of the offending node.
        kind: NodeKind,
    },

    /// The compilation unit element is not owned by any library.
    #[error("cannot create scope: compilation unit is not part of a library")]
    UnitNotInLibrary,

    /// A scope constructor was handed an element of the wrong kind.
    #[error("expected {expected}, found {found:?} element")]
    WrongElementKind {
        /// Human-readable description of the accepted kinds.
        expected: &'static str,
        /// The kind that was actually supplied.
        found: ElementKind,
    },

    /// A node id that does not belong to the syntax tree.
    #[error("node does not belong to this syntax tree")]
    UnknownNode,
}

/// Convenient `Result` alias for fallible scope construction.
pub type ScopeResult<T> = Result<T, ScopeError>;
