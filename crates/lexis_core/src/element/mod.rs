//! The semantic element graph consumed by scope resolution.
//!
//! # Overview
//!
//! An [`ElementModel`] is an arena of immutable [`Element`]s: libraries,
//! compilation units, classes, members, functions, parameters, prefixes and
//! labels.  The graph is produced by an earlier analysis phase; this crate
//! only reads it.  The model-building methods in [`build`] exist so that
//! that phase (and the tests) can populate the arena.
//!
//! Besides the arena, the model plays the role of the analysis context: it
//! caches one public [`Namespace`] per library so that repeated resolution
//! passes do not recompute it.

mod build;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::namespace::{Namespace, NamespaceBuilder};
use crate::scope::SETTER_SUFFIX;

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque handle to an [`Element`] in an [`ElementModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the element in its model.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Element kinds and payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminator for [`ElementData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Library,
    CompilationUnit,
    Class,
    Constructor,
    Method,
    Function,
    PropertyAccessor,
    Variable,
    FunctionTypeAlias,
    TypeParameter,
    Parameter,
    Prefix,
    Label,
}

impl ElementKind {
    /// Returns `true` for elements with a body and parameters.
    pub fn is_executable(self) -> bool {
        matches!(
            self,
            ElementKind::Constructor
                | ElementKind::Method
                | ElementKind::Function
                | ElementKind::PropertyAccessor
        )
    }
}

/// A show/hide filter attached to an import or export directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combinator {
    /// Keep only the listed names (and their setters).
    Show(Vec<String>),
    /// Drop the listed names (and their setters).
    Hide(Vec<String>),
}

impl Combinator {
    /// A `show` combinator over `names`.
    pub fn show<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Combinator::Show(names.into_iter().map(Into::into).collect())
    }

    /// A `hide` combinator over `names`.
    pub fn hide<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Combinator::Hide(names.into_iter().map(Into::into).collect())
    }
}

/// An `import` directive of a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// The URI as written in the source.
    pub uri: String,
    /// Offset of the directive in the defining unit.
    pub offset: usize,
    /// The imported library, or `None` when the URI did not resolve.
    pub imported_library: Option<ElementId>,
    /// The prefix element for `import '...' as p`.
    pub prefix: Option<ElementId>,
    /// Show/hide combinators, in declaration order.
    pub combinators: Vec<Combinator>,
}

impl ImportDirective {
    /// An unprefixed import of `library` without combinators.
    pub fn of(uri: impl Into<String>, library: ElementId) -> Self {
        Self {
            uri: uri.into(),
            offset: 0,
            imported_library: Some(library),
            prefix: None,
            combinators: Vec::new(),
        }
    }

    /// Binds the imported names under `prefix`.
    pub fn with_prefix(mut self, prefix: ElementId) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinators.push(combinator);
        self
    }
}

/// An `export` directive of a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDirective {
    /// The URI as written in the source.
    pub uri: String,
    /// Offset of the directive in the defining unit.
    pub offset: usize,
    /// The exported library, or `None` when the URI did not resolve.
    pub exported_library: Option<ElementId>,
    /// Show/hide combinators, in declaration order.
    pub combinators: Vec<Combinator>,
}

impl ExportDirective {
    /// An export of `library` without combinators.
    pub fn of(uri: impl Into<String>, library: ElementId) -> Self {
        Self {
            uri: uri.into(),
            offset: 0,
            exported_library: Some(library),
            combinators: Vec::new(),
        }
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinators.push(combinator);
        self
    }
}

/// Data carried by a library element.
#[derive(Debug, Clone, Default)]
pub struct LibraryData {
    /// The unit holding the library's directives.
    pub defining_unit: Option<ElementId>,
    pub parts: Vec<ElementId>,
    pub imports: Vec<ImportDirective>,
    pub exports: Vec<ExportDirective>,
    /// Import prefixes declared by the library.
    pub prefixes: Vec<ElementId>,
    /// `true` for platform (SDK) libraries.
    pub is_sdk: bool,
}

/// Top-level declarations of one compilation unit, in source order.
#[derive(Debug, Clone, Default)]
pub struct UnitData {
    pub accessors: Vec<ElementId>,
    pub functions: Vec<ElementId>,
    pub type_aliases: Vec<ElementId>,
    /// Classes and enums.
    pub types: Vec<ElementId>,
    pub variables: Vec<ElementId>,
}

/// Members of a class. Enums are modelled as classes.
#[derive(Debug, Clone, Default)]
pub struct ClassData {
    pub accessors: Vec<ElementId>,
    pub methods: Vec<ElementId>,
    pub constructors: Vec<ElementId>,
    pub type_parameters: Vec<ElementId>,
}

/// Signature data shared by constructors, methods and functions.
#[derive(Debug, Clone, Default)]
pub struct ExecutableData {
    pub parameters: Vec<ElementId>,
    pub type_parameters: Vec<ElementId>,
    /// Set for `static` class methods.
    pub is_static: bool,
}

/// A getter or setter, explicit or implied by a variable.
#[derive(Debug, Clone, Default)]
pub struct AccessorData {
    pub is_getter: bool,
    /// Set for `static` class accessors.
    pub is_static: bool,
    /// Accessors implied by a variable declaration rather than written out.
    pub is_synthetic: bool,
    /// The variable a synthetic accessor was derived from.
    pub variable: Option<ElementId>,
    pub parameters: Vec<ElementId>,
}

/// A variable and the accessors derived from it.
#[derive(Debug, Clone, Default)]
pub struct VariableData {
    pub getter: Option<ElementId>,
    pub setter: Option<ElementId>,
}

/// Signature data of a function type alias.
#[derive(Debug, Clone, Default)]
pub struct FunctionTypeAliasData {
    pub parameters: Vec<ElementId>,
    pub type_parameters: Vec<ElementId>,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterData {
    /// Constructor shorthand that binds straight to a field (`this.x`).
    pub is_initializing_formal: bool,
}

/// Kind-specific payload of an [`Element`].
#[derive(Debug, Clone)]
pub enum ElementData {
    Library(LibraryData),
    CompilationUnit(UnitData),
    Class(ClassData),
    Constructor(ExecutableData),
    Method(ExecutableData),
    Function(ExecutableData),
    PropertyAccessor(AccessorData),
    Variable(VariableData),
    FunctionTypeAlias(FunctionTypeAliasData),
    TypeParameter,
    Parameter(ParameterData),
    Prefix,
    Label,
}

// ─────────────────────────────────────────────────────────────────────────────
// Element
// ─────────────────────────────────────────────────────────────────────────────

/// A named semantic declaration.
#[derive(Debug, Clone)]
pub struct Element {
    /// The declared name. Setters carry the `=` suffix; may be empty for
    /// unnamed constructors and synthetic entries.
    pub name: String,
    /// Offset of the declaring name in its compilation unit.
    pub offset: usize,
    /// The element this one is declared inside of.
    pub enclosing: Option<ElementId>,
    pub data: ElementData,
}

impl Element {
    /// The name as written in the source: a setter shows without its `=`.
    pub fn display_name(&self) -> &str {
        match &self.data {
            ElementData::PropertyAccessor(a) if !a.is_getter => {
                self.name.strip_suffix(SETTER_SUFFIX).unwrap_or(&self.name)
            }
            _ => &self.name,
        }
    }

    /// Returns `true` for static methods and accessors.
    pub fn is_static(&self) -> bool {
        match &self.data {
            ElementData::Method(e) => e.is_static,
            ElementData::PropertyAccessor(a) => a.is_static,
            _ => false,
        }
    }

    /// Discriminator of the payload.
    pub fn kind(&self) -> ElementKind {
        match &self.data {
            ElementData::Library(_) => ElementKind::Library,
            ElementData::CompilationUnit(_) => ElementKind::CompilationUnit,
            ElementData::Class(_) => ElementKind::Class,
            ElementData::Constructor(_) => ElementKind::Constructor,
            ElementData::Method(_) => ElementKind::Method,
            ElementData::Function(_) => ElementKind::Function,
            ElementData::PropertyAccessor(_) => ElementKind::PropertyAccessor,
            ElementData::Variable(_) => ElementKind::Variable,
            ElementData::FunctionTypeAlias(_) => ElementKind::FunctionTypeAlias,
            ElementData::TypeParameter => ElementKind::TypeParameter,
            ElementData::Parameter(_) => ElementKind::Parameter,
            ElementData::Prefix => ElementKind::Prefix,
            ElementData::Label => ElementKind::Label,
        }
    }

    /// Parameters of an executable, accessor or function type alias.
    pub fn parameters(&self) -> &[ElementId] {
        match &self.data {
            ElementData::Constructor(e) | ElementData::Method(e) | ElementData::Function(e) => {
                &e.parameters
            }
            ElementData::PropertyAccessor(a) => &a.parameters,
            ElementData::FunctionTypeAlias(f) => &f.parameters,
            _ => &[],
        }
    }

    /// Type parameters of a generic declaration.
    pub fn type_parameters(&self) -> &[ElementId] {
        match &self.data {
            ElementData::Class(c) => &c.type_parameters,
            ElementData::Constructor(e) | ElementData::Method(e) | ElementData::Function(e) => {
                &e.type_parameters
            }
            ElementData::FunctionTypeAlias(f) => &f.type_parameters,
            _ => &[],
        }
    }

    pub fn as_library(&self) -> Option<&LibraryData> {
        match &self.data {
            ElementData::Library(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<&UnitData> {
        match &self.data {
            ElementData::CompilationUnit(u) => Some(u),
            _ => None,
        }
    }

    /// Class payload, or `None` for other kinds.
    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.data {
            ElementData::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_accessor(&self) -> Option<&AccessorData> {
        match &self.data {
            ElementData::PropertyAccessor(a) => Some(a),
            _ => None,
        }
    }

    /// Returns `true` for `this.x` constructor parameters.
    pub fn is_initializing_formal(&self) -> bool {
        matches!(
            &self.data,
            ElementData::Parameter(ParameterData {
                is_initializing_formal: true
            })
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ElementModel
// ─────────────────────────────────────────────────────────────────────────────

/// Arena owning every element of an analysis, plus the per-library public
/// namespace cache.
///
/// A fully built model is `Send + Sync`: the cache is guarded by a lock and
/// cached namespaces are handed out as shared [`Arc`]s.
#[derive(Debug, Default)]
pub struct ElementModel {
    elements: Vec<Element>,
    public_namespaces: RwLock<HashMap<ElementId, Arc<Namespace>>>,
}

impl ElementModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the element with the given `id`.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this model.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.index()]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The binding key of `id`; setters carry the `=` suffix.
    pub fn name(&self, id: ElementId) -> &str {
        &self.element(id).name
    }

    /// Kind of the element behind `id`.
    pub fn kind(&self, id: ElementId) -> ElementKind {
        self.element(id).kind()
    }

    /// Walks the enclosing chain of `id` (inclusive) to the first element of
    /// `kind`.
    fn nearest(&self, id: ElementId, kind: ElementKind) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(e) = current {
            if self.kind(e) == kind {
                return Some(e);
            }
            current = self.element(e).enclosing;
        }
        None
    }

    /// The library that owns `id`; a library owns itself.
    pub fn library_of(&self, id: ElementId) -> Option<ElementId> {
        self.nearest(id, ElementKind::Library)
    }

    /// The compilation unit that contains `id`.
    pub fn unit_of(&self, id: ElementId) -> Option<ElementId> {
        self.nearest(id, ElementKind::CompilationUnit)
    }

    /// Returns `true` if `id` is declared in an SDK library.
    pub fn is_in_sdk(&self, id: ElementId) -> bool {
        self.library_of(id)
            .and_then(|lib| self.element(lib).as_library())
            .is_some_and(|lib| lib.is_sdk)
    }

    /// Library payload of `library`, or an empty one for non-library ids.
    pub fn library(&self, library: ElementId) -> &LibraryData {
        static EMPTY: LibraryData = LibraryData {
            defining_unit: None,
            parts: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            prefixes: Vec::new(),
            is_sdk: false,
        };
        self.element(library).as_library().unwrap_or(&EMPTY)
    }

    /// Libraries named by resolved export directives of `library`.
    pub fn exported_libraries(&self, library: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.library(library)
            .exports
            .iter()
            .filter_map(|export| export.exported_library)
    }

    /// The name shown for `library` in diagnostics: the display name of its
    /// defining compilation unit.
    pub fn library_display_name(&self, library: ElementId) -> &str {
        match self.library(library).defining_unit {
            Some(unit) => self.element(unit).display_name(),
            None => self.element(library).display_name(),
        }
    }

    /// The defining unit followed by the parts of `library`.
    pub fn units_of(&self, library: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let data = self.library(library);
        data.defining_unit.into_iter().chain(data.parts.iter().copied())
    }

    /// Returns the cached public namespace of `library`, computing it on first
    /// use.
    pub fn public_namespace(&self, library: ElementId) -> Arc<Namespace> {
        if let Some(ns) = self
            .public_namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&library)
        {
            return Arc::clone(ns);
        }
        let computed = Arc::new(NamespaceBuilder.create_public_namespace_for_library(self, library));
        let mut cache = self
            .public_namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(library).or_insert(computed))
    }

    fn invalidate_public_namespaces(&mut self) {
        self.public_namespaces
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
