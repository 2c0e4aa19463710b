//! `lexis_core`: lexical scope and namespace resolution for the Lexis
//! analyzer.
//!
//! Given a fully built element graph, the engine answers "which declaration
//! does this name refer to here?" and reports the conflicts it meets on the
//! way: duplicate definitions, ambiguous imports, SDK imports shadowed by
//! user libraries and references to locals before their declaration.
//!
//! # Crate layout
//!
//! - [`element`]: Element arena, import/export directives and combinators.
//! - [`syntax`]: Annotated syntax-tree slice and identifiers.
//! - [`namespace`]: Export, import and public namespaces.
//! - [`scope`]: Scope arena, lookup rules and label chains.
//! - [`builder`]: Scope chain reconstruction for arbitrary nodes.
//! - [`cursor`]: Push/pop scope bookkeeping for tree walkers.
//! - [`diagnostics`]: Recoverable problems and their listeners.
//! - [`error`]: Hard failures of scope construction.
//! - [`zone`]: Region allocator backing label chains.

/// Scope chain reconstruction from syntax nodes.
pub mod builder;
/// Scope bookkeeping for resolvers walking a tree.
pub mod cursor;
/// Diagnostics and diagnostic listeners.
pub mod diagnostics;
/// The element graph consumed by resolution.
pub mod element;
/// Hard-failure error types.
pub mod error;
/// Name-to-element mappings computed from libraries and directives.
pub mod namespace;
/// Lexical scopes, import scopes and label scopes.
pub mod scope;
/// The syntax-tree slice needed to rebuild scopes.
pub mod syntax;
/// Bump allocation for label chains.
pub mod zone;
