//! Rebuilding the scope chain that is visible at an arbitrary syntax node.
//!
//! Incremental consumers (completion, refactoring) often start resolution in
//! the middle of a unit.  [`ScopeBuilder::scope_for`] walks from the node up
//! to its compilation unit and then layers one scope per scope-introducing
//! ancestor on top of the library scope, outermost first:
//!
//! | Ancestor | Scopes layered |
//! |---|---|
//! | compilation unit | library import scope, library scope |
//! | class declaration / class type alias | type-parameter scope, class scope |
//! | constructor / function / method | function scope with parameters |
//! | function type alias | function-type scope with parameters |
//!
//! The node's own scope is not entered: asking for the scope of a method
//! declaration yields the class scope it is declared in.

use crate::element::{ElementId, ElementKind};
use crate::error::{ScopeError, ScopeResult};
use crate::scope::{ScopeArena, ScopeId};
use crate::syntax::{NodeId, NodeKind, SyntaxNode, SyntaxTree};

/// Builds scope chains from annotated syntax trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeBuilder;

impl ScopeBuilder {
    /// Returns the scope in which names occurring at `node` are resolved.
    pub fn scope_for(&self, arena: &mut ScopeArena<'_>, tree: &SyntaxTree, node: NodeId) -> ScopeResult<ScopeId> {
        let start = match tree.node(node) {
            None => return Err(ScopeError::UnknownNode),
            Some(n) if n.kind == NodeKind::CompilationUnit => node,
            Some(n) => n.parent.ok_or(ScopeError::NotInCompilationUnit)?,
        };

        let mut path: Vec<&SyntaxNode> = Vec::new();
        for id in tree.ancestors(start) {
            let Some(n) = tree.node(id) else {
                return Err(ScopeError::UnknownNode);
            };
            path.push(n);
            if n.kind == NodeKind::CompilationUnit {
                break;
            }
        }
        let Some(unit) = path.pop().filter(|n| n.kind == NodeKind::CompilationUnit) else {
            return Err(ScopeError::NotInCompilationUnit);
        };

        let mut scope = self.unit_scope(arena, unit)?;
        for n in path.into_iter().rev() {
            scope = self.layer(arena, n, scope)?;
        }
        Ok(scope)
    }

    fn unit_scope(&self, arena: &mut ScopeArena<'_>, unit: &SyntaxNode) -> ScopeResult<ScopeId> {
        let element = resolved(unit)?;
        let model = arena.model();
        let found = model.kind(element);
        if found != ElementKind::CompilationUnit {
            return Err(ScopeError::WrongElementKind {
                expected: "a compilation unit",
                found,
            });
        }
        let library = model.library_of(element).ok_or(ScopeError::UnitNotInLibrary)?;
        arena.library_scope(library)
    }

    fn layer(&self, arena: &mut ScopeArena<'_>, node: &SyntaxNode, scope: ScopeId) -> ScopeResult<ScopeId> {
        match node.kind {
            NodeKind::ClassDeclaration | NodeKind::ClassTypeAlias => {
                let class = resolved(node)?;
                let type_parameters = arena.type_parameter_scope(scope, class)?;
                arena.class_scope(type_parameters, class)
            }
            NodeKind::ConstructorDeclaration | NodeKind::FunctionDeclaration | NodeKind::MethodDeclaration => {
                let function = arena.function_scope(scope, resolved(node)?)?;
                arena.define_parameters(function);
                Ok(function)
            }
            NodeKind::FunctionTypeAlias => {
                let alias = arena.function_type_scope(scope, resolved(node)?)?;
                arena.define_parameters(alias);
                Ok(alias)
            }
            NodeKind::CompilationUnit | NodeKind::Block | NodeKind::Other => Ok(scope),
        }
    }
}

fn resolved(node: &SyntaxNode) -> ScopeResult<ElementId> {
    node.element
        .ok_or(ScopeError::UnresolvedNode { kind: node.kind })
}
