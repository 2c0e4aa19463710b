//! Model-building API.
//!
//! Every `add_*` method allocates an element and links it into the member
//! list of its owner, so the owner's lists stay in source (insertion) order.
//! Owners must be of the kind each method documents; anything else is a bug
//! in the producing phase and panics.

use super::{
    AccessorData, ClassData, Element, ElementData, ElementId, ElementModel, ExecutableData,
    ExportDirective, FunctionTypeAliasData, ImportDirective, LibraryData, ParameterData, UnitData,
    VariableData,
};
use crate::scope::SETTER_SUFFIX;

impl ElementModel {
    fn push(&mut self, name: &str, offset: usize, enclosing: Option<ElementId>, data: ElementData) -> ElementId {
        self.invalidate_public_namespaces();
        let id = ElementId::new(self.elements.len());
        self.elements.push(Element {
            name: name.to_owned(),
            offset,
            enclosing,
            data,
        });
        id
    }

    fn data_mut(&mut self, id: ElementId) -> &mut ElementData {
        &mut self.elements[id.index()].data
    }

    fn library_mut(&mut self, library: ElementId) -> &mut LibraryData {
        match self.data_mut(library) {
            ElementData::Library(l) => l,
            other => panic!("element is not a library: {other:?}"),
        }
    }

    fn unit_mut(&mut self, unit: ElementId) -> &mut UnitData {
        match self.data_mut(unit) {
            ElementData::CompilationUnit(u) => u,
            other => panic!("element is not a compilation unit: {other:?}"),
        }
    }

    fn class_mut(&mut self, class: ElementId) -> &mut ClassData {
        match self.data_mut(class) {
            ElementData::Class(c) => c,
            other => panic!("element is not a class: {other:?}"),
        }
    }

    // ── Libraries and units ──────────────────────────────────────────────────

    /// Adds a library together with its defining compilation unit; both are
    /// named `uri`.
    pub fn add_library(&mut self, uri: &str, is_sdk: bool) -> ElementId {
        let library = self.push(
            uri,
            0,
            None,
            ElementData::Library(LibraryData {
                is_sdk,
                ..LibraryData::default()
            }),
        );
        let unit = self.push(uri, 0, Some(library), ElementData::CompilationUnit(UnitData::default()));
        self.library_mut(library).defining_unit = Some(unit);
        library
    }

    /// Adds a part unit to `library`.
    pub fn add_part(&mut self, library: ElementId, uri: &str) -> ElementId {
        let unit = self.push(uri, 0, Some(library), ElementData::CompilationUnit(UnitData::default()));
        self.library_mut(library).parts.push(unit);
        unit
    }

    /// Appends an import directive to `library`.
    pub fn add_import(&mut self, library: ElementId, import: ImportDirective) {
        self.invalidate_public_namespaces();
        self.library_mut(library).imports.push(import);
    }

    /// Appends an export directive to `library`.
    pub fn add_export(&mut self, library: ElementId, export: ExportDirective) {
        self.invalidate_public_namespaces();
        self.library_mut(library).exports.push(export);
    }

    /// Adds an import prefix (`import '...' as name`) to `library`.
    pub fn add_prefix(&mut self, library: ElementId, name: &str, offset: usize) -> ElementId {
        let prefix = self.push(name, offset, Some(library), ElementData::Prefix);
        self.library_mut(library).prefixes.push(prefix);
        prefix
    }

    // ── Types ────────────────────────────────────────────────────────────────

    /// Adds a class (or enum) to `unit`.
    pub fn add_class(&mut self, unit: ElementId, name: &str, offset: usize) -> ElementId {
        let class = self.push(name, offset, Some(unit), ElementData::Class(ClassData::default()));
        self.unit_mut(unit).types.push(class);
        class
    }

    /// Adds a function type alias (`typedef`) to `unit`.
    pub fn add_function_type_alias(&mut self, unit: ElementId, name: &str, offset: usize) -> ElementId {
        let alias = self.push(
            name,
            offset,
            Some(unit),
            ElementData::FunctionTypeAlias(FunctionTypeAliasData::default()),
        );
        self.unit_mut(unit).type_aliases.push(alias);
        alias
    }

    /// Adds a type parameter to a class, executable or function type alias.
    pub fn add_type_parameter(&mut self, owner: ElementId, name: &str, offset: usize) -> ElementId {
        let tp = self.push(name, offset, Some(owner), ElementData::TypeParameter);
        match self.data_mut(owner) {
            ElementData::Class(c) => c.type_parameters.push(tp),
            ElementData::Constructor(e) | ElementData::Method(e) | ElementData::Function(e) => {
                e.type_parameters.push(tp)
            }
            ElementData::FunctionTypeAlias(f) => f.type_parameters.push(tp),
            other => panic!("element cannot declare type parameters: {other:?}"),
        }
        tp
    }

    // ── Members ──────────────────────────────────────────────────────────────

    /// Adds a constructor to `class`. Unnamed constructors have an empty name.
    pub fn add_constructor(&mut self, class: ElementId, name: &str, offset: usize) -> ElementId {
        let ctor = self.push(name, offset, Some(class), ElementData::Constructor(ExecutableData::default()));
        self.class_mut(class).constructors.push(ctor);
        ctor
    }

    /// Adds an instance method to `class`.
    pub fn add_method(&mut self, class: ElementId, name: &str, offset: usize) -> ElementId {
        self.push_method(class, name, offset, false)
    }

    /// Adds a static method to `class`.
    pub fn add_static_method(&mut self, class: ElementId, name: &str, offset: usize) -> ElementId {
        self.push_method(class, name, offset, true)
    }

    fn push_method(&mut self, class: ElementId, name: &str, offset: usize, is_static: bool) -> ElementId {
        let data = ExecutableData {
            is_static,
            ..ExecutableData::default()
        };
        let method = self.push(name, offset, Some(class), ElementData::Method(data));
        self.class_mut(class).methods.push(method);
        method
    }

    /// Adds an explicit getter (or setter when `is_getter` is false) to a
    /// class or compilation unit. Setter names receive the `=` suffix.
    pub fn add_accessor(&mut self, owner: ElementId, name: &str, offset: usize, is_getter: bool) -> ElementId {
        self.push_accessor(owner, name, offset, is_getter, false)
    }

    /// Adds a static getter or setter to `class`.
    pub fn add_static_accessor(&mut self, class: ElementId, name: &str, offset: usize, is_getter: bool) -> ElementId {
        self.push_accessor(class, name, offset, is_getter, true)
    }

    fn push_accessor(&mut self, owner: ElementId, name: &str, offset: usize, is_getter: bool, is_static: bool) -> ElementId {
        let key = if is_getter {
            name.to_owned()
        } else {
            format!("{name}{SETTER_SUFFIX}")
        };
        let data = AccessorData {
            is_getter,
            is_static,
            ..AccessorData::default()
        };
        let accessor = self.push(&key, offset, Some(owner), ElementData::PropertyAccessor(data));
        self.attach_accessor(owner, accessor);
        accessor
    }

    fn attach_accessor(&mut self, owner: ElementId, accessor: ElementId) {
        match self.data_mut(owner) {
            ElementData::Class(c) => c.accessors.push(accessor),
            ElementData::CompilationUnit(u) => u.accessors.push(accessor),
            other => panic!("element cannot own accessors: {other:?}"),
        }
    }

    /// Adds a top-level variable to `unit` with its synthetic getter and
    /// setter. Returns the variable.
    pub fn add_top_level_variable(&mut self, unit: ElementId, name: &str, offset: usize) -> ElementId {
        let variable = self.push(name, offset, Some(unit), ElementData::Variable(VariableData::default()));
        self.unit_mut(unit).variables.push(variable);
        let getter = self.push_synthetic_accessor(unit, variable, name, offset, true);
        let setter = self.push_synthetic_accessor(unit, variable, name, offset, false);
        if let ElementData::Variable(v) = self.data_mut(variable) {
            v.getter = Some(getter);
            v.setter = Some(setter);
        }
        variable
    }

    fn push_synthetic_accessor(
        &mut self,
        owner: ElementId,
        variable: ElementId,
        name: &str,
        offset: usize,
        is_getter: bool,
    ) -> ElementId {
        let key = if is_getter {
            name.to_owned()
        } else {
            format!("{name}{SETTER_SUFFIX}")
        };
        let data = AccessorData {
            is_getter,
            is_synthetic: true,
            variable: Some(variable),
            ..AccessorData::default()
        };
        // Synthetic accessors have no name token of their own.
        let accessor = self.push(&key, offset, Some(owner), ElementData::PropertyAccessor(data));
        self.attach_accessor(owner, accessor);
        accessor
    }

    // ── Functions ────────────────────────────────────────────────────────────

    /// Adds a top-level function to `unit`.
    pub fn add_function(&mut self, unit: ElementId, name: &str, offset: usize) -> ElementId {
        let function = self.push(name, offset, Some(unit), ElementData::Function(ExecutableData::default()));
        self.unit_mut(unit).functions.push(function);
        function
    }

    /// Adds a function declared inside the body of another executable.
    pub fn add_local_function(&mut self, executable: ElementId, name: &str, offset: usize) -> ElementId {
        assert!(
            self.kind(executable).is_executable(),
            "local functions must be declared inside an executable"
        );
        self.push(name, offset, Some(executable), ElementData::Function(ExecutableData::default()))
    }

    /// Adds a local variable declared inside `executable`.
    pub fn add_local_variable(&mut self, executable: ElementId, name: &str, offset: usize) -> ElementId {
        self.push(name, offset, Some(executable), ElementData::Variable(VariableData::default()))
    }

    /// Adds a label declared inside `executable`.
    pub fn add_label(&mut self, executable: ElementId, name: &str, offset: usize) -> ElementId {
        self.push(name, offset, Some(executable), ElementData::Label)
    }

    // ── Parameters ───────────────────────────────────────────────────────────

    /// Adds a plain parameter to an executable, accessor or function type alias.
    pub fn add_parameter(&mut self, owner: ElementId, name: &str, offset: usize) -> ElementId {
        self.push_parameter(owner, name, offset, false)
    }

    /// Adds a `this.name` constructor parameter.
    pub fn add_initializing_formal(&mut self, constructor: ElementId, name: &str, offset: usize) -> ElementId {
        self.push_parameter(constructor, name, offset, true)
    }

    fn push_parameter(&mut self, owner: ElementId, name: &str, offset: usize, is_initializing_formal: bool) -> ElementId {
        let param = self.push(
            name,
            offset,
            Some(owner),
            ElementData::Parameter(ParameterData {
                is_initializing_formal,
            }),
        );
        match self.data_mut(owner) {
            ElementData::Constructor(e) | ElementData::Method(e) | ElementData::Function(e) => {
                e.parameters.push(param)
            }
            ElementData::PropertyAccessor(a) => a.parameters.push(param),
            ElementData::FunctionTypeAlias(f) => f.parameters.push(param),
            other => panic!("element cannot declare parameters: {other:?}"),
        }
        param
    }
}
