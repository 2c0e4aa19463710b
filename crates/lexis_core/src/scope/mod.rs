//! Lexical scopes and identifier lookup.
//!
//! # Overview
//!
//! A [`ScopeArena`] owns every scope built during one resolution pass.  Each
//! scope is a local name table plus a link to its enclosing scope, and its
//! [`ScopeKind`] says how it was populated and which lookup or duplicate rules
//! apply to it:
//!
//! | Kind | Populated with |
//! |---|---|
//! | `Enclosed` | whatever the owner defines (block locals, catch parameters) |
//! | `Class` | the instance accessors and methods of a class |
//! | `TypeParameter` | the type parameters of a generic declaration |
//! | `Function` | body locals; parameters live in the wrapping `Enclosed` tier |
//! | `FunctionType` | alias parameters; type parameters in the wrapping tier |
//! | `Library` | import prefixes and top-level declarations of all units |
//! | `LibraryImport` | memoized resolutions over the import namespaces |
//!
//! Scope handles are stamped with the generation of the arena that created
//! them; handing a handle to a different arena is a caller bug and panics.
//!
//! # Diagnostics
//!
//! - Redefining a name in the same scope reports a duplicate and keeps the
//!   first binding.
//! - Referencing a name of an enclosed scope before its declaration reports
//!   `REFERENCED_BEFORE_DECLARATION` and resolution continues outward.
//! - Import ambiguities are reported from the library import scope (see
//!   the `library` submodule).

pub mod label;
mod library;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use smallvec::SmallVec;

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticListener};
use crate::element::{ElementId, ElementKind, ElementModel};
use crate::error::{ScopeError, ScopeResult};
use crate::namespace::Namespace;
use crate::syntax::Identifier;

// ─────────────────────────────────────────────────────────────────────────────
// Reserved tokens
// ─────────────────────────────────────────────────────────────────────────────

/// Leading character of library-private names.
pub const PRIVATE_NAME_PREFIX: &str = "_";

/// Suffix that turns a property name into its setter name.
pub const SETTER_SUFFIX: &str = "=";

/// Binding key of a zero-parameter `-` operator, keeping unary minus apart
/// from the binary `-`.
pub const UNARY_MINUS: &str = "unary-";

/// Separator between an import prefix and the imported name.
pub const PREFIX_SEPARATOR: &str = ".";

/// Returns `true` if `name` is library-private.
pub fn is_private_name(name: &str) -> bool {
    name.starts_with(PRIVATE_NAME_PREFIX)
}

/// The key under which `element` is bound in a scope.
pub fn binding_key(model: &ElementModel, element: ElementId) -> &str {
    let e = model.element(element);
    if e.kind() == ElementKind::Method && e.name == "-" && e.parameters().is_empty() {
        return UNARY_MINUS;
    }
    &e.name
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookup results
// ─────────────────────────────────────────────────────────────────────────────

/// Synthetic stand-in for two or more distinct declarations found under one
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplyDefinedElement {
    name: String,
    conflicting: SmallVec<[ElementId; 4]>,
}

impl MultiplyDefinedElement {
    fn from_pair(model: &ElementModel, first: ElementId, second: ElementId) -> Self {
        let mut marker = Self {
            name: model.element(first).display_name().to_owned(),
            conflicting: SmallVec::new(),
        };
        marker.push_distinct(first);
        marker.push_distinct(second);
        marker
    }

    fn from_elements(name: String, elements: &[ElementId]) -> Self {
        Self {
            name,
            conflicting: elements.iter().copied().collect(),
        }
    }

    fn push_distinct(&mut self, element: ElementId) {
        if !self.conflicting.contains(&element) {
            self.conflicting.push(element);
        }
    }

    /// Display name shared by the conflicting declarations.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The conflicting declarations, in the order they were found.
    pub fn conflicting_elements(&self) -> &[ElementId] {
        &self.conflicting
    }

    /// Number of conflicting declarations.
    pub fn len(&self) -> usize {
        self.conflicting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicting.is_empty()
    }
}

/// What a name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Exactly one declaration.
    Element(ElementId),
    /// Several distinct declarations, none preferred.
    MultiplyDefined(MultiplyDefinedElement),
}

impl Binding {
    /// The resolved element, or `None` for an ambiguity.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Binding::Element(e) => Some(*e),
            Binding::MultiplyDefined(_) => None,
        }
    }

    /// Returns `true` for an ambiguity.
    pub fn is_multiply_defined(&self) -> bool {
        matches!(self, Binding::MultiplyDefined(_))
    }

    /// Folds another candidate into this result.
    fn merge(self, model: &ElementModel, other: ElementId) -> Binding {
        match self {
            Binding::Element(e) if e == other => Binding::Element(e),
            Binding::Element(e) => Binding::MultiplyDefined(MultiplyDefinedElement::from_pair(model, e, other)),
            Binding::MultiplyDefined(mut marker) => {
                marker.push_distinct(other);
                Binding::MultiplyDefined(marker)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope handles and kinds
// ─────────────────────────────────────────────────────────────────────────────

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Handle to a scope in a [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId {
    index: u32,
    generation: u32,
}

/// How a scope was built and which rules it follows.
#[derive(Debug)]
pub enum ScopeKind {
    /// A plain nested region such as a block.
    Enclosed,
    /// Instance members of `class`.
    Class {
        class: ElementId,
    },
    /// Type parameters of a class, executable or function type alias.
    TypeParameter {
        declaration: ElementId,
    },
    /// The body of `function`.
    Function {
        function: ElementId,
        /// Set once `define_parameters` has run.
        parameters_defined: bool,
    },
    /// The signature of a function type alias.
    FunctionType {
        alias: ElementId,
        /// Set once `define_parameters` has run.
        parameters_defined: bool,
    },
    /// Prefixes and top-level declarations of `library`.
    Library {
        library: ElementId,
    },
    /// Root of every library chain. Its name table doubles as the memo of
    /// resolved imports.
    LibraryImport {
        library: ElementId,
        /// One namespace per import directive, in directive order.
        namespaces: Vec<Namespace>,
    },
}

#[derive(Debug)]
struct ScopeData {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    defined: HashMap<String, ElementId>,
    /// Names declared later in this region.
    hidden: HashSet<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ScopeArena
// ─────────────────────────────────────────────────────────────────────────────

/// All scopes of one resolution pass.
///
/// The arena borrows the element model and the diagnostic listener for the
/// duration of the pass.  It is neither `Sync` nor meant to be reused across
/// passes: build a fresh arena per pass.
pub struct ScopeArena<'a> {
    model: &'a ElementModel,
    listener: &'a dyn DiagnosticListener,
    generation: u32,
    scopes: Vec<ScopeData>,
}

impl<'a> ScopeArena<'a> {
    /// An empty arena resolving against `model` and reporting to `listener`.
    pub fn new(model: &'a ElementModel, listener: &'a dyn DiagnosticListener) -> Self {
        Self {
            model,
            listener,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            scopes: Vec::new(),
        }
    }

    /// The element model scopes are built from.
    pub fn model(&self) -> &'a ElementModel {
        self.model
    }

    /// Where duplicate and lookup diagnostics go.
    pub fn listener(&self) -> &'a dyn DiagnosticListener {
        self.listener
    }

    /// Number of scopes allocated so far.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    fn data(&self, id: ScopeId) -> &ScopeData {
        assert_eq!(
            id.generation, self.generation,
            "scope handle used with an arena that did not create it"
        );
        &self.scopes[id.index as usize]
    }

    fn data_mut(&mut self, id: ScopeId) -> &mut ScopeData {
        assert_eq!(
            id.generation, self.generation,
            "scope handle used with an arena that did not create it"
        );
        &mut self.scopes[id.index as usize]
    }

    fn alloc(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        if let Some(p) = parent {
            // Validates the parent handle.
            self.data(p);
        }
        let id = ScopeId {
            index: self.scopes.len() as u32,
            generation: self.generation,
        };
        self.scopes.push(ScopeData {
            parent,
            kind,
            defined: HashMap::new(),
            hidden: HashSet::new(),
        });
        id
    }

    fn expect_kind(
        &self,
        element: ElementId,
        expected: &'static str,
        accepts: impl Fn(ElementKind) -> bool,
    ) -> ScopeResult<()> {
        let found = self.model.kind(element);
        if accepts(found) {
            Ok(())
        } else {
            Err(ScopeError::WrongElementKind { expected, found })
        }
    }

    // ── Construction ─────────────────────────────────────────────────────────

    /// A plain nested scope.
    pub fn enclosed(&mut self, enclosing: ScopeId) -> ScopeId {
        self.alloc(Some(enclosing), ScopeKind::Enclosed)
    }

    /// A nested scope whose `declared_later` elements are hidden until the
    /// owner defines them.
    pub fn block(&mut self, enclosing: ScopeId, declared_later: &[ElementId]) -> ScopeId {
        let scope = self.enclosed(enclosing);
        for &element in declared_later {
            self.hide(scope, element);
        }
        scope
    }

    /// A scope holding the instance accessors and methods of `class`.
    ///
    /// Members are defined in source order, so the earlier of two clashing
    /// members keeps the name.
    pub fn class_scope(&mut self, enclosing: ScopeId, class: ElementId) -> ScopeResult<ScopeId> {
        self.expect_kind(class, "a class", |k| k == ElementKind::Class)?;
        let scope = self.alloc(Some(enclosing), ScopeKind::Class { class });
        let model = self.model;
        if let Some(data) = model.element(class).as_class() {
            let mut members: Vec<ElementId> = data
                .accessors
                .iter()
                .chain(&data.methods)
                .copied()
                .filter(|&m| !model.element(m).is_static())
                .collect();
            members.sort_by_key(|&m| model.element(m).offset);
            for member in members {
                self.define(scope, member);
            }
        }
        Ok(scope)
    }

    /// A scope holding the type parameters of a generic declaration.
    pub fn type_parameter_scope(&mut self, enclosing: ScopeId, declaration: ElementId) -> ScopeResult<ScopeId> {
        self.expect_kind(declaration, "a generic declaration", |k| {
            k == ElementKind::Class || k == ElementKind::FunctionTypeAlias || k.is_executable()
        })?;
        let scope = self.alloc(Some(enclosing), ScopeKind::TypeParameter { declaration });
        let model = self.model;
        for &tp in model.element(declaration).type_parameters() {
            self.define(scope, tp);
        }
        Ok(scope)
    }

    /// The body scope of an executable. Parameters are not defined until
    /// [`define_parameters`](Self::define_parameters) is called.
    pub fn function_scope(&mut self, enclosing: ScopeId, function: ElementId) -> ScopeResult<ScopeId> {
        self.expect_kind(function, "an executable", ElementKind::is_executable)?;
        let parameters = self.enclosed(enclosing);
        Ok(self.alloc(
            Some(parameters),
            ScopeKind::Function {
                function,
                parameters_defined: false,
            },
        ))
    }

    /// The scope of a function type alias. Its type parameters are defined in
    /// the wrapping tier right away.
    pub fn function_type_scope(&mut self, enclosing: ScopeId, alias: ElementId) -> ScopeResult<ScopeId> {
        self.expect_kind(alias, "a function type alias", |k| k == ElementKind::FunctionTypeAlias)?;
        let outer = self.enclosed(enclosing);
        let scope = self.alloc(
            Some(outer),
            ScopeKind::FunctionType {
                alias,
                parameters_defined: false,
            },
        );
        let model = self.model;
        for &tp in model.element(alias).type_parameters() {
            self.define(outer, tp);
        }
        Ok(scope)
    }

    /// Defines the parameters of a function or function-type scope. Repeated
    /// calls, and calls on other scope kinds, do nothing.
    pub fn define_parameters(&mut self, scope: ScopeId) {
        let model = self.model;
        let parent = self.data(scope).parent;
        match &mut self.data_mut(scope).kind {
            ScopeKind::Function {
                function,
                parameters_defined,
            } if !*parameters_defined => {
                *parameters_defined = true;
                let function = *function;
                let Some(tier) = parent else {
                    return;
                };
                let e = model.element(function);
                let is_local = e.enclosing.is_some_and(|outer| model.kind(outer).is_executable());
                if is_local && !e.name.is_empty() {
                    self.define(tier, function);
                }
                for &param in e.parameters() {
                    if !model.element(param).is_initializing_formal() {
                        self.define(tier, param);
                    }
                }
            }
            ScopeKind::FunctionType {
                alias,
                parameters_defined,
            } if !*parameters_defined => {
                *parameters_defined = true;
                let alias = *alias;
                for &param in model.element(alias).parameters() {
                    self.define(scope, param);
                }
            }
            _ => {}
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Binds `element` in `scope`. A name that is already bound keeps its
    /// first binding and the conflict is reported.
    pub fn define(&mut self, scope: ScopeId, element: ElementId) {
        let model = self.model;
        let key = binding_key(model, element);
        if key.is_empty() {
            return;
        }
        let data = self.data(scope);
        if matches!(data.kind, ScopeKind::LibraryImport { .. })
            && is_private_name(model.element(element).display_name())
        {
            return;
        }
        match data.defined.get(key) {
            Some(&existing) if existing == element => {}
            Some(&existing) => {
                let diagnostic = self.error_for_duplicate(scope, existing, element);
                self.listener.on_diagnostic(diagnostic);
            }
            None => {
                self.data_mut(scope).defined.insert(key.to_owned(), element);
            }
        }
    }

    /// Marks the name of `element` as declared later in `scope`.
    pub fn hide(&mut self, scope: ScopeId, element: ElementId) {
        let name = self.model.name(element);
        if !name.is_empty() {
            self.data_mut(scope).hidden.insert(name.to_owned());
        }
    }

    fn error_for_duplicate(&self, scope: ScopeId, existing: ElementId, duplicate: ElementId) -> Diagnostic {
        let model = self.model;
        match self.data(scope).kind {
            ScopeKind::Class { .. } => {
                if let Some(diagnostic) = self.member_collision(existing, duplicate) {
                    return diagnostic;
                }
            }
            ScopeKind::Library { .. } if model.kind(existing) == ElementKind::Prefix => {
                let dup = model.element(duplicate);
                let offset = match dup.as_accessor() {
                    Some(accessor) if accessor.is_synthetic => accessor
                        .variable
                        .map_or(dup.offset, |v| model.element(v).offset),
                    _ => dup.offset,
                };
                return Diagnostic::new(
                    model.unit_of(duplicate),
                    offset,
                    dup.display_name().len(),
                    DiagnosticKind::PrefixCollidesWithTopLevelMember {
                        prefix: model.element(existing).display_name().to_owned(),
                    },
                );
            }
            _ => {}
        }
        let dup = model.element(duplicate);
        Diagnostic::new(
            model.unit_of(duplicate),
            dup.offset,
            dup.display_name().len(),
            DiagnosticKind::DuplicateDefinition {
                name: model.element(existing).display_name().to_owned(),
            },
        )
    }

    /// A method and an accessor sharing a name inside one class. The member
    /// declared later in the source is blamed.
    fn member_collision(&self, existing: ElementId, duplicate: ElementId) -> Option<Diagnostic> {
        let model = self.model;
        let is_pair = matches!(
            (model.kind(existing), model.kind(duplicate)),
            (ElementKind::PropertyAccessor, ElementKind::Method)
                | (ElementKind::Method, ElementKind::PropertyAccessor)
        );
        if !is_pair {
            return None;
        }
        let blamed = if model.element(existing).offset < model.element(duplicate).offset {
            duplicate
        } else {
            existing
        };
        let e = model.element(blamed);
        let name = e.display_name().to_owned();
        let kind = if e.kind() == ElementKind::Method {
            DiagnosticKind::MethodAndGetterWithSameName { name }
        } else {
            DiagnosticKind::GetterAndMethodWithSameName { name }
        };
        Some(Diagnostic::new(model.unit_of(blamed), e.offset, e.display_name().len(), kind))
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// The parent of `scope`; `None` for the library import scope.
    pub fn enclosing_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        self.data(scope).parent
    }

    /// How `scope` was built.
    pub fn kind(&self, scope: ScopeId) -> &ScopeKind {
        &self.data(scope).kind
    }

    /// The binding of `name` in `scope` itself, without consulting enclosing
    /// scopes.
    pub fn local_lookup(&self, scope: ScopeId, name: &str) -> Option<ElementId> {
        self.data(scope).defined.get(name).copied()
    }

    /// Resolves `identifier` as seen from `scope`.
    ///
    /// `referencing_library` is the library the reference occurs in.
    /// Returns `None` when nothing in the chain binds the name; whether that
    /// is an error is up to the caller.
    pub fn lookup(&mut self, scope: ScopeId, identifier: &Identifier, referencing_library: ElementId) -> Option<Binding> {
        let mut current = scope;
        loop {
            let data = self.data(current);
            if let Some(&element) = data.defined.get(&identifier.name) {
                return Some(Binding::Element(element));
            }
            if matches!(data.kind, ScopeKind::LibraryImport { .. }) {
                return self.lookup_in_imports(current, identifier, referencing_library);
            }
            if data.hidden.contains(&identifier.name) {
                self.report(
                    identifier,
                    DiagnosticKind::ReferencedBeforeDeclaration {
                        name: identifier.name.clone(),
                    },
                );
            }
            current = data.parent?;
        }
    }

    fn report(&self, identifier: &Identifier, kind: DiagnosticKind) {
        self.listener.on_diagnostic(Diagnostic::new(
            identifier.unit,
            identifier.offset,
            identifier.length,
            kind,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticRecorder;

    struct Fixture {
        model: ElementModel,
        lib: ElementId,
        unit: ElementId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut model = ElementModel::new();
            let lib = model.add_library("app", false);
            let unit = model.library(lib).defining_unit.unwrap();
            Self { model, lib, unit }
        }
    }

    fn ident(name: &str) -> Identifier {
        Identifier::new(name, 100)
    }

    // ── Keys and privacy ─────────────────────────────────────────────────────

    #[test]
    fn test_is_private_name() {
        assert!(is_private_name("_x"));
        assert!(!is_private_name("x"));
        assert!(!is_private_name(""));
    }

    #[test]
    fn test_unary_minus_does_not_collide_with_binary_minus() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Vec2", 0);
        let neg = fx.model.add_method(class, "-", 10);
        let sub = fx.model.add_method(class, "-", 20);
        fx.model.add_parameter(sub, "other", 22);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let lib_scope = arena.library_scope(fx.lib).unwrap();
        let scope = arena.class_scope(lib_scope, class).unwrap();
        assert!(recorder.is_empty());
        assert_eq!(arena.local_lookup(scope, UNARY_MINUS), Some(neg));
        assert_eq!(arena.local_lookup(scope, "-"), Some(sub));
    }

    #[test]
    fn test_two_unary_minus_methods_collide() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Vec2", 0);
        let first = fx.model.add_method(class, "-", 10);
        fx.model.add_method(class, "-", 20);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let lib_scope = arena.library_scope(fx.lib).unwrap();
        let scope = arena.class_scope(lib_scope, class).unwrap();
        assert_eq!(recorder.codes(), vec!["DUPLICATE_DEFINITION"]);
        assert_eq!(arena.local_lookup(scope, UNARY_MINUS), Some(first));
    }

    // ── Define / duplicates ──────────────────────────────────────────────────

    #[test]
    fn test_duplicate_keeps_first_binding() {
        let mut fx = Fixture::new();
        let f = fx.model.add_function(fx.unit, "main", 0);
        let a = fx.model.add_local_variable(f, "a", 10);
        let a2 = fx.model.add_local_variable(f, "a", 20);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let block = arena.enclosed(root);
        arena.define(block, a);
        arena.define(block, a2);

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].offset, 20);
        assert_eq!(diagnostics[0].length, 1);
        assert_eq!(arena.local_lookup(block, "a"), Some(a));
    }

    #[test]
    fn test_redefining_same_element_is_silent() {
        let mut fx = Fixture::new();
        let f = fx.model.add_function(fx.unit, "main", 0);
        let a = fx.model.add_local_variable(f, "a", 10);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let block = arena.enclosed(root);
        arena.define(block, a);
        arena.define(block, a);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_empty_names_are_not_bound() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "C", 0);
        let ctor = fx.model.add_constructor(class, "", 5);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let block = arena.enclosed(root);
        arena.define(block, ctor);
        assert_eq!(arena.local_lookup(block, ""), None);
    }

    // ── Shadowing and hidden names ───────────────────────────────────────────

    #[test]
    fn test_inner_binding_shadows_outer() {
        let mut fx = Fixture::new();
        let f = fx.model.add_function(fx.unit, "main", 0);
        let outer_x = fx.model.add_local_variable(f, "x", 10);
        let inner_x = fx.model.add_local_variable(f, "x", 30);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let outer = arena.enclosed(root);
        arena.define(outer, outer_x);
        let inner = arena.enclosed(outer);
        arena.define(inner, inner_x);

        assert_eq!(arena.lookup(inner, &ident("x"), fx.lib), Some(Binding::Element(inner_x)));
        assert_eq!(arena.lookup(outer, &ident("x"), fx.lib), Some(Binding::Element(outer_x)));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_reference_before_declaration_reports_and_falls_through() {
        let mut fx = Fixture::new();
        let f = fx.model.add_function(fx.unit, "main", 0);
        let outer_x = fx.model.add_local_variable(f, "x", 10);
        let later_x = fx.model.add_local_variable(f, "x", 50);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let outer = arena.enclosed(root);
        arena.define(outer, outer_x);
        let block = arena.block(outer, &[later_x]);

        let found = arena.lookup(block, &Identifier::new("x", 40).in_unit(fx.unit), fx.lib);
        assert_eq!(found, Some(Binding::Element(outer_x)));
        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "REFERENCED_BEFORE_DECLARATION");
        assert_eq!(diagnostics[0].offset, 40);
        assert_eq!(diagnostics[0].unit, Some(fx.unit));

        // Once declared, the local binding wins silently.
        recorder.clear();
        arena.define(block, later_x);
        assert_eq!(arena.lookup(block, &ident("x"), fx.lib), Some(Binding::Element(later_x)));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_unresolved_name_is_absent_not_an_error() {
        let fx = Fixture::new();
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let block = arena.enclosed(root);
        assert_eq!(arena.lookup(block, &ident("nowhere"), fx.lib), None);
        assert!(recorder.is_empty());
    }

    // ── Class scopes ─────────────────────────────────────────────────────────

    #[test]
    fn test_method_then_later_getter_keeps_method() {
        // class Pt { get() {} ... get get => ...; }
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Pt", 0);
        let method = fx.model.add_method(class, "get", 10);
        let getter = fx.model.add_accessor(class, "get", 40, true);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.class_scope(root, class).unwrap();

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "GETTER_AND_METHOD_WITH_SAME_NAME");
        assert_eq!(diagnostics[0].offset, 40);
        assert_eq!(diagnostics[0].unit, Some(fx.unit));
        assert_eq!(arena.local_lookup(scope, "get"), Some(method));
        assert_ne!(arena.local_lookup(scope, "get"), Some(getter));
    }

    #[test]
    fn test_getter_then_later_method_blames_method() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Pt", 0);
        let getter = fx.model.add_accessor(class, "size", 10, true);
        fx.model.add_method(class, "size", 40);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.class_scope(root, class).unwrap();

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "METHOD_AND_GETTER_WITH_SAME_NAME");
        assert_eq!(diagnostics[0].offset, 40);
        assert_eq!(arena.local_lookup(scope, "size"), Some(getter));
    }

    #[test]
    fn test_duplicate_setters_report_the_property_name() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Box", 0);
        let first = fx.model.add_accessor(class, "x", 10, false);
        fx.model.add_accessor(class, "x", 30, false);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.class_scope(root, class).unwrap();

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "DUPLICATE_DEFINITION");
        assert_eq!(diagnostics[0].offset, 30);
        assert_eq!(diagnostics[0].length, 1);
        assert_eq!(diagnostics[0].kind.to_string(), "the name 'x' is already defined");
        assert_eq!(arena.local_lookup(scope, "x="), Some(first));
    }

    #[test]
    fn test_static_members_are_not_bound() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Counter", 0);
        let next = fx.model.add_method(class, "next", 10);
        fx.model.add_static_method(class, "create", 20);
        fx.model.add_static_accessor(class, "total", 30, true);
        // A static member does not collide with an instance member.
        fx.model.add_static_method(class, "next", 40);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.class_scope(root, class).unwrap();

        assert!(recorder.is_empty());
        assert_eq!(arena.local_lookup(scope, "next"), Some(next));
        assert_eq!(arena.local_lookup(scope, "create"), None);
        assert_eq!(arena.local_lookup(scope, "total"), None);
    }

    #[test]
    fn test_getter_and_setter_coexist() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Box", 0);
        fx.model.add_accessor(class, "value", 10, true);
        fx.model.add_accessor(class, "value", 20, false);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.class_scope(root, class).unwrap();
        assert!(recorder.is_empty());
        assert!(arena.local_lookup(scope, "value").is_some());
        assert!(arena.local_lookup(scope, "value=").is_some());
    }

    #[test]
    fn test_class_scope_rejects_non_class() {
        let fx = Fixture::new();
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let err = arena.class_scope(root, fx.unit).unwrap_err();
        assert_eq!(
            err,
            ScopeError::WrongElementKind {
                expected: "a class",
                found: ElementKind::CompilationUnit
            }
        );
    }

    // ── Type parameter scopes ────────────────────────────────────────────────

    #[test]
    fn test_type_parameters_are_defined_eagerly() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "Pair", 0);
        let k = fx.model.add_type_parameter(class, "K", 5);
        let v = fx.model.add_type_parameter(class, "V", 8);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.type_parameter_scope(root, class).unwrap();
        assert_eq!(arena.local_lookup(scope, "K"), Some(k));
        assert_eq!(arena.local_lookup(scope, "V"), Some(v));
        assert!(arena.type_parameter_scope(root, fx.lib).is_err());
    }

    // ── Function scopes ──────────────────────────────────────────────────────

    #[test]
    fn test_parameters_live_in_outer_tier() {
        let mut fx = Fixture::new();
        let class = fx.model.add_class(fx.unit, "P", 0);
        let ctor = fx.model.add_constructor(class, "", 10);
        fx.model.add_initializing_formal(ctor, "x", 12);
        let y = fx.model.add_parameter(ctor, "y", 20);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.function_scope(root, ctor).unwrap();
        assert_eq!(arena.lookup(scope, &ident("y"), fx.lib), None);

        arena.define_parameters(scope);
        arena.define_parameters(scope);
        assert!(recorder.is_empty());
        let tier = arena.enclosing_scope(scope).unwrap();
        assert_eq!(arena.local_lookup(tier, "y"), Some(y));
        assert_eq!(arena.local_lookup(scope, "y"), None);
        assert_eq!(arena.local_lookup(tier, "x"), None);
        assert_eq!(arena.lookup(scope, &ident("y"), fx.lib), Some(Binding::Element(y)));
    }

    #[test]
    fn test_body_local_may_shadow_parameter() {
        let mut fx = Fixture::new();
        let f = fx.model.add_function(fx.unit, "run", 0);
        let param = fx.model.add_parameter(f, "n", 5);
        let local = fx.model.add_local_variable(f, "n", 20);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.function_scope(root, f).unwrap();
        arena.define_parameters(scope);
        arena.define(scope, local);
        assert!(recorder.is_empty());
        assert_eq!(arena.lookup(scope, &ident("n"), fx.lib), Some(Binding::Element(local)));
        let tier = arena.enclosing_scope(scope).unwrap();
        assert_eq!(arena.local_lookup(tier, "n"), Some(param));
    }

    #[test]
    fn test_local_function_can_reference_itself() {
        let mut fx = Fixture::new();
        let outer = fx.model.add_function(fx.unit, "outer", 0);
        let inner = fx.model.add_local_function(outer, "fact", 10);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let outer_scope = arena.function_scope(root, outer).unwrap();
        arena.define_parameters(outer_scope);
        let inner_scope = arena.function_scope(outer_scope, inner).unwrap();
        arena.define_parameters(inner_scope);
        assert_eq!(arena.lookup(inner_scope, &ident("fact"), fx.lib), Some(Binding::Element(inner)));
        // A top-level function is not re-bound by its own scope.
        let tier = arena.enclosing_scope(outer_scope).unwrap();
        assert_eq!(arena.local_lookup(tier, "outer"), None);
    }

    #[test]
    fn test_function_type_scope_tiers() {
        let mut fx = Fixture::new();
        let alias = fx.model.add_function_type_alias(fx.unit, "Mapper", 0);
        let t = fx.model.add_type_parameter(alias, "T", 7);
        let arg = fx.model.add_parameter(alias, "value", 12);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let scope = arena.function_type_scope(root, alias).unwrap();
        let outer = arena.enclosing_scope(scope).unwrap();
        assert_eq!(arena.local_lookup(outer, "T"), Some(t));
        assert_eq!(arena.local_lookup(scope, "value"), None);
        arena.define_parameters(scope);
        assert_eq!(arena.local_lookup(scope, "value"), Some(arg));
    }

    #[test]
    fn test_define_parameters_ignores_other_kinds() {
        let fx = Fixture::new();
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&fx.model, &recorder);
        let root = arena.library_scope(fx.lib).unwrap();
        let block = arena.enclosed(root);
        arena.define_parameters(block);
        assert!(matches!(arena.kind(block), ScopeKind::Enclosed));
    }

    // ── Handles ──────────────────────────────────────────────────────────────

    #[test]
    #[should_panic(expected = "did not create it")]
    fn test_foreign_handle_panics() {
        let fx = Fixture::new();
        let recorder = DiagnosticRecorder::new();
        let mut first = ScopeArena::new(&fx.model, &recorder);
        let mut second = ScopeArena::new(&fx.model, &recorder);
        let scope = first.library_scope(fx.lib).unwrap();
        second.enclosed(scope);
    }
}
