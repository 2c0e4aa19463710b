//! The slice of the syntax tree that scope construction needs.
//!
//! Parsing and element annotation happen elsewhere.  A [`SyntaxTree`] only
//! records, for each node, its kind, its parent and the element an earlier
//! phase attached to it.  [`ScopeBuilder`] walks parent
//! links of this tree to rebuild the scope chain valid at any node.
//!
//! [`ScopeBuilder`]: crate::builder::ScopeBuilder

use crate::element::ElementId;
use crate::scope::PREFIX_SEPARATOR;

/// Index of a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in its tree.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node kinds that matter to scope construction; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    ClassDeclaration,
    ClassTypeAlias,
    ConstructorDeclaration,
    FunctionDeclaration,
    MethodDeclaration,
    FunctionTypeAlias,
    Block,
    Other,
}

/// One node of a [`SyntaxTree`].
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// `None` for roots.
    pub parent: Option<NodeId>,
    /// The element attached by the element-building phase, if any.
    pub element: Option<ElementId>,
}

/// Arena of annotated syntax nodes linked to their parents.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parentless node.
    pub fn add_root(&mut self, kind: NodeKind, element: Option<ElementId>) -> NodeId {
        self.push(kind, None, element)
    }

    /// Adds a node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind, element: Option<ElementId>) -> NodeId {
        self.push(kind, Some(parent), element)
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>, element: Option<ElementId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SyntaxNode { kind, parent, element });
        id
    }

    /// The node behind `id`, or `None` if `id` belongs to another tree.
    pub fn node(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id.index())
    }

    /// The parent of `id`, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Iterates `id` and its ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).map(|_| id), move |&n| self.parent(n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A reference to a name at a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// The lookup key; `prefix.name` for prefixed identifiers.
    pub name: String,
    /// Offset of the reference in its compilation unit.
    pub offset: usize,
    /// Length of the reference, used as the diagnostic span.
    pub length: usize,
    /// The compilation unit the reference occurs in.
    pub unit: Option<ElementId>,
}

impl Identifier {
    /// A reference spanning `name` at `offset`, outside any known unit.
    pub fn new(name: impl Into<String>, offset: usize) -> Self {
        let name = name.into();
        let length = name.len();
        Self {
            name,
            offset,
            length,
            unit: None,
        }
    }

    /// A `prefix.name` reference through an import prefix.
    pub fn prefixed(prefix: &str, name: &str, offset: usize) -> Self {
        Self::new(format!("{prefix}{PREFIX_SEPARATOR}{name}"), offset)
    }

    /// Attributes the reference to `unit`; lookup diagnostics report it.
    pub fn in_unit(mut self, unit: ElementId) -> Self {
        self.unit = Some(unit);
        self
    }
}
