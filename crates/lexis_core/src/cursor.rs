//! Scope bookkeeping for a resolver walking a syntax tree.
//!
//! A [`ScopeCursor`] holds the current name scope and the current label
//! chain.  Every `enter_*` call saves both and pushes the scopes a construct
//! introduces; the matching [`exit`](ScopeCursor::exit) restores them.  The
//! cursor never walks a tree itself, so it works with any visitor.
//!
//! ```
//! use lexis_core::cursor::ScopeCursor;
//! use lexis_core::diagnostics::IgnoreDiagnostics;
//! use lexis_core::element::ElementModel;
//! use lexis_core::scope::ScopeArena;
//! use lexis_core::syntax::Identifier;
//! use lexis_core::zone::Zone;
//!
//! let mut model = ElementModel::new();
//! let lib = model.add_library("app", false);
//! let unit = model.library(lib).defining_unit.unwrap();
//! let main = model.add_function(unit, "main", 0);
//! let count = model.add_local_variable(main, "count", 12);
//!
//! let zone = Zone::new();
//! let arena = ScopeArena::new(&model, &IgnoreDiagnostics);
//! let mut cursor = ScopeCursor::new(arena, &zone, lib).unwrap();
//! cursor.enter_function(main).unwrap();
//! cursor.enter_loop();
//! cursor.declare(count);
//! let found = cursor.lookup(&Identifier::new("count", 30));
//! assert_eq!(found.and_then(|b| b.element()), Some(count));
//! assert!(cursor.lookup_label(None).is_some());
//! cursor.exit();
//! cursor.exit();
//! ```

use crate::builder::ScopeBuilder;
use crate::element::ElementId;
use crate::error::{ScopeError, ScopeResult};
use crate::scope::label::{EMPTY_LABEL, LabelScope, LabelTarget};
use crate::scope::{Binding, ScopeArena, ScopeId, ScopeKind};
use crate::syntax::{Identifier, NodeId, SyntaxTree};
use crate::zone::Zone;

type Labels<'z> = Option<&'z LabelScope<'z>>;

/// Current name scope and label chain of a resolver.
pub struct ScopeCursor<'a, 'z> {
    arena: ScopeArena<'a>,
    zone: &'z Zone,
    library: ElementId,
    scope: ScopeId,
    labels: Labels<'z>,
    saved: Vec<(ScopeId, Labels<'z>)>,
}

impl<'a, 'z> ScopeCursor<'a, 'z> {
    /// Starts at the scope of `library`.
    pub fn new(mut arena: ScopeArena<'a>, zone: &'z Zone, library: ElementId) -> ScopeResult<Self> {
        let scope = arena.library_scope(library)?;
        Ok(Self::at(arena, zone, library, scope))
    }

    /// Starts at the scope visible at `node`.
    pub fn from_node(mut arena: ScopeArena<'a>, zone: &'z Zone, tree: &SyntaxTree, node: NodeId) -> ScopeResult<Self> {
        let scope = ScopeBuilder.scope_for(&mut arena, tree, node)?;
        let library = owning_library(&arena, scope).ok_or(ScopeError::NotInCompilationUnit)?;
        Ok(Self::at(arena, zone, library, scope))
    }

    fn at(arena: ScopeArena<'a>, zone: &'z Zone, library: ElementId, scope: ScopeId) -> Self {
        Self {
            arena,
            zone,
            library,
            scope,
            labels: None,
            saved: Vec::new(),
        }
    }

    /// The current name scope.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The library lookups are made from.
    pub fn library(&self) -> ElementId {
        self.library
    }

    /// Number of `enter_*` calls not yet matched by [`exit`](Self::exit).
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn arena(&self) -> &ScopeArena<'a> {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ScopeArena<'a> {
        &mut self.arena
    }

    /// Ends the walk and hands back the arena with every scope it built.
    pub fn into_arena(self) -> ScopeArena<'a> {
        self.arena
    }

    fn save(&mut self) {
        self.saved.push((self.scope, self.labels));
    }

    // ── Name scopes ──────────────────────────────────────────────────────────

    /// Enters a block. `declared_later` are the elements declared by the
    /// block's statements; they are hidden until [`declare`](Self::declare)d.
    pub fn enter_block(&mut self, declared_later: &[ElementId]) {
        self.save();
        self.scope = self.arena.block(self.scope, declared_later);
    }

    /// Enters a `catch` clause binding its exception and stack-trace
    /// parameters.
    pub fn enter_catch(&mut self, exception: Option<ElementId>, stack_trace: Option<ElementId>) {
        self.save();
        self.scope = self.arena.enclosed(self.scope);
        for parameter in exception.into_iter().chain(stack_trace) {
            self.arena.define(self.scope, parameter);
        }
    }

    /// Enters the body of `class`.
    pub fn enter_class(&mut self, class: ElementId) -> ScopeResult<()> {
        let type_parameters = self.arena.type_parameter_scope(self.scope, class)?;
        let scope = self.arena.class_scope(type_parameters, class)?;
        self.save();
        self.scope = scope;
        Ok(())
    }

    /// Enters the body of a constructor, method or function.
    pub fn enter_function(&mut self, executable: ElementId) -> ScopeResult<()> {
        let scope = self.arena.function_scope(self.scope, executable)?;
        self.arena.define_parameters(scope);
        self.save();
        self.scope = scope;
        Ok(())
    }

    /// Enters the signature of a function type alias, parameters included.
    pub fn enter_function_type_alias(&mut self, alias: ElementId) -> ScopeResult<()> {
        let scope = self.arena.function_type_scope(self.scope, alias)?;
        self.arena.define_parameters(scope);
        self.save();
        self.scope = scope;
        Ok(())
    }

    /// Binds `element` in the current scope as its declaration is reached.
    pub fn declare(&mut self, element: ElementId) {
        self.arena.define(self.scope, element);
    }

    // ── Label scopes ─────────────────────────────────────────────────────────

    /// Enters a loop body: a fresh name scope and the implicit target of
    /// unlabeled `break` and `continue`.
    pub fn enter_loop(&mut self) {
        self.save();
        self.scope = self.arena.enclosed(self.scope);
        self.labels = Some(LabelScope::anonymous(self.zone, self.labels, false, false));
    }

    /// Enters a switch statement whose members carry `case_labels`.
    pub fn enter_switch(&mut self, case_labels: &[ElementId]) {
        self.save();
        self.labels = Some(LabelScope::anonymous(self.zone, self.labels, true, false));
        self.push_labels(case_labels);
    }

    /// Enters a labeled statement.
    pub fn enter_labels(&mut self, labels: &[ElementId]) {
        self.save();
        self.push_labels(labels);
    }

    fn push_labels(&mut self, labels: &[ElementId]) {
        let model = self.arena.model();
        for &label in labels {
            self.labels = Some(LabelScope::named(self.zone, self.labels, model.name(label), label));
        }
    }

    /// Leaves the construct of the matching `enter_*` call. Does nothing at
    /// the starting scope.
    pub fn exit(&mut self) {
        if let Some((scope, labels)) = self.saved.pop() {
            self.scope = scope;
            self.labels = labels;
        }
    }

    // ── Resolution ───────────────────────────────────────────────────────────

    /// Resolves `identifier` in the current scope.
    pub fn lookup(&mut self, identifier: &Identifier) -> Option<Binding> {
        self.arena.lookup(self.scope, identifier, self.library)
    }

    /// Resolves the target of `break`/`continue`; `None` means unlabeled.
    pub fn lookup_label(&self, label: Option<&str>) -> Option<LabelTarget> {
        self.labels?.lookup(label.unwrap_or(EMPTY_LABEL)).copied()
    }
}

/// The library whose import scope roots the chain of `scope`.
fn owning_library(arena: &ScopeArena<'_>, scope: ScopeId) -> Option<ElementId> {
    let mut current = scope;
    loop {
        if let ScopeKind::LibraryImport { library, .. } | ScopeKind::Library { library } = arena.kind(current) {
            return Some(*library);
        }
        current = arena.enclosing_scope(current)?;
    }
}
