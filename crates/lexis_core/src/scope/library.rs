//! Library scopes and import resolution.
//!
//! Every library chain is rooted in a `LibraryImport` scope.  It holds one
//! namespace per import directive and resolves names against all of them:
//!
//! 1. A name found in exactly one import namespace (or the same element in
//!    several) resolves to that element and is memoized.
//! 2. When several distinct elements are found and some of them come from
//!    SDK libraries, the SDK candidates are dropped in favour of the others
//!    and `CONFLICTING_SDK_IMPORT` is reported.
//! 3. Anything still ambiguous is reported as `AMBIGUOUS_IMPORT` on every
//!    lookup and never memoized.
//!
//! Above it sits the `Library` scope with the import prefixes and the
//! top-level declarations of every unit of the library.

use tracing::{debug, info, trace};

use super::{Binding, MultiplyDefinedElement, ScopeArena, ScopeId, ScopeKind};
use crate::diagnostics::{DiagnosticKind, quoted_name_list};
use crate::element::{ElementId, ElementKind};
use crate::error::ScopeResult;
use crate::namespace::{Namespace, NamespaceBuilder};
use crate::syntax::Identifier;

impl<'a> ScopeArena<'a> {
    /// The import scope of `library`. Import namespaces are computed here,
    /// once per scope.
    pub fn library_import_scope(&mut self, library: ElementId) -> ScopeResult<ScopeId> {
        self.expect_kind(library, "a library", |k| k == ElementKind::Library)?;
        let model = self.model;
        let namespaces: Vec<Namespace> = model
            .library(library)
            .imports
            .iter()
            .map(|import| NamespaceBuilder.create_import_namespace_for_directive(model, import))
            .collect();
        debug!(
            library = model.library_display_name(library),
            imports = namespaces.len(),
            "materialized import namespaces"
        );
        Ok(self.alloc(None, ScopeKind::LibraryImport { library, namespaces }))
    }

    /// The scope of a whole library: import prefixes, then for each unit its
    /// accessors, functions, type aliases and types.
    pub fn library_scope(&mut self, library: ElementId) -> ScopeResult<ScopeId> {
        let imports = self.library_import_scope(library)?;
        let scope = self.alloc(Some(imports), ScopeKind::Library { library });
        let model = self.model;
        for &prefix in &model.library(library).prefixes {
            self.define(scope, prefix);
        }
        for unit in model.units_of(library) {
            let Some(data) = model.element(unit).as_unit() else {
                continue;
            };
            let members = data
                .accessors
                .iter()
                .chain(&data.functions)
                .chain(&data.type_aliases)
                .chain(&data.types);
            for &member in members {
                self.define(scope, member);
            }
        }
        Ok(scope)
    }

    pub(super) fn lookup_in_imports(
        &mut self,
        scope: ScopeId,
        identifier: &Identifier,
        referencing_library: ElementId,
    ) -> Option<Binding> {
        let model = self.model;
        let ScopeKind::LibraryImport { library, namespaces } = &self.data(scope).kind else {
            return None;
        };
        let library = *library;

        let mut found: Option<Binding> = None;
        for namespace in namespaces {
            if let Some(element) = namespace.get(&identifier.name) {
                found = Some(match found {
                    None => Binding::Element(element),
                    Some(previous) => previous.merge(model, element),
                });
            }
        }

        let binding = match found? {
            Binding::MultiplyDefined(marker) => self.remove_sdk_elements(library, identifier, marker),
            single => single,
        };
        match binding {
            Binding::Element(element) => {
                trace!(
                    name = identifier.name.as_str(),
                    referencing = model.library_display_name(referencing_library),
                    "memoized import resolution"
                );
                self.data_mut(scope)
                    .defined
                    .insert(identifier.name.clone(), element);
                Some(Binding::Element(element))
            }
            Binding::MultiplyDefined(marker) => {
                let mut names: Vec<String> = marker
                    .conflicting_elements()
                    .iter()
                    .map(|&e| self.library_name(library, e))
                    .collect();
                names.sort();
                self.report(
                    identifier,
                    DiagnosticKind::AmbiguousImport {
                        name: marker.name().to_owned(),
                        libraries: quoted_name_list(&names),
                    },
                );
                Some(Binding::MultiplyDefined(marker))
            }
        }
    }

    /// Drops SDK candidates from an ambiguous import result when non-SDK
    /// candidates remain.
    fn remove_sdk_elements(
        &self,
        library: ElementId,
        identifier: &Identifier,
        marker: MultiplyDefinedElement,
    ) -> Binding {
        let model = self.model;
        let (sdk, others): (Vec<ElementId>, Vec<ElementId>) = marker
            .conflicting_elements()
            .iter()
            .partition(|&&e| model.is_in_sdk(e));

        if let (Some(&sdk_element), Some(&first_other)) = (sdk.last(), others.first()) {
            self.report(
                identifier,
                DiagnosticKind::ConflictingSdkImport {
                    name: marker.name().to_owned(),
                    sdk_library: self.library_name(library, sdk_element),
                    other_library: self.library_name(library, first_other),
                },
            );
        }

        match others.as_slice() {
            _ if sdk.is_empty() => Binding::MultiplyDefined(marker),
            [only] => Binding::Element(*only),
            [] => {
                info!(
                    name = identifier.name.as_str(),
                    candidates = marker.len(),
                    "every candidate comes from the SDK"
                );
                Binding::MultiplyDefined(marker)
            }
            rest => Binding::MultiplyDefined(MultiplyDefinedElement::from_elements(
                marker.name().to_owned(),
                rest,
            )),
        }
    }

    /// Name of the library declaring `element`, as shown in import
    /// diagnostics of `library`. Libraries reached through a re-export of a
    /// directly imported library are annotated with `(via ...)`.
    fn library_name(&self, library: ElementId, element: ElementId) -> String {
        let model = self.model;
        let Some(declaring) = model.library_of(element) else {
            return String::new();
        };
        let name = model.library_display_name(declaring).to_owned();
        let imports = &model.library(library).imports;
        if imports.iter().any(|i| i.imported_library == Some(declaring)) {
            return name;
        }
        // Only one level of re-export is traced.
        let mut via: Vec<String> = imports
            .iter()
            .filter_map(|i| i.imported_library)
            .filter(|&imported| model.exported_libraries(imported).any(|e| e == declaring))
            .map(|imported| model.library_display_name(imported).to_owned())
            .collect();
        if via.is_empty() {
            return name;
        }
        via.sort();
        via.dedup();
        format!("{name} (via {})", quoted_name_list(&via))
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticRecorder;
    use crate::element::{Combinator, ElementId, ElementModel, ExportDirective, ImportDirective};
    use crate::scope::{Binding, ScopeArena, ScopeKind};
    use crate::syntax::Identifier;

    fn unit(model: &ElementModel, library: ElementId) -> ElementId {
        model.library(library).defining_unit.unwrap()
    }

    fn ident(name: &str) -> Identifier {
        Identifier::new(name, 70)
    }

    /// `app` imports `a` and `b`, both declaring `foo`.
    fn ambiguous_model() -> (ElementModel, ElementId, ElementId, ElementId) {
        let mut model = ElementModel::new();
        let a = model.add_library("lib_a", false);
        let a_foo = model.add_function(unit(&model, a), "foo", 3);
        let b = model.add_library("lib_b", false);
        let b_foo = model.add_function(unit(&model, b), "foo", 3);
        let app = model.add_library("app", false);
        model.add_import(app, ImportDirective::of("lib_b", b));
        model.add_import(app, ImportDirective::of("lib_a", a));
        (model, app, a_foo, b_foo)
    }

    #[test]
    fn test_ambiguous_import_is_reported_on_every_lookup() {
        let (model, app, a_foo, b_foo) = ambiguous_model();
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();

        let first = arena.lookup(scope, &ident("foo"), app).unwrap();
        let Binding::MultiplyDefined(marker) = &first else {
            panic!("expected an ambiguity, got {first:?}");
        };
        assert_eq!(marker.name(), "foo");
        assert_eq!(marker.conflicting_elements(), &[b_foo, a_foo]);

        let second = arena.lookup(scope, &ident("foo"), app).unwrap();
        assert_eq!(first, second);

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0], diagnostics[1]);
        assert_eq!(diagnostics[0].code(), "AMBIGUOUS_IMPORT");
        assert_eq!(diagnostics[0].offset, 70);
        assert_eq!(
            diagnostics[0].kind.to_string(),
            "the name 'foo' is defined in the libraries 'lib_a' and 'lib_b'"
        );
    }

    #[test]
    fn test_ambiguous_setter_is_reported_by_property_name() {
        let mut model = ElementModel::new();
        let a = model.add_library("a", false);
        model.add_top_level_variable(unit(&model, a), "v", 4);
        let b = model.add_library("b", false);
        model.add_top_level_variable(unit(&model, b), "v", 4);
        let app = model.add_library("app", false);
        let app_unit = unit(&model, app);
        model.add_import(app, ImportDirective::of("a", a));
        model.add_import(app, ImportDirective::of("b", b));

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        let found = arena
            .lookup(scope, &Identifier::new("v=", 12).in_unit(app_unit), app)
            .unwrap();
        let Binding::MultiplyDefined(marker) = &found else {
            panic!("expected an ambiguity, got {found:?}");
        };
        assert_eq!(marker.name(), "v");

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].unit, Some(app_unit));
        assert_eq!(diagnostics[0].offset, 12);
        assert_eq!(
            diagnostics[0].kind.to_string(),
            "the name 'v' is defined in the libraries 'a' and 'b'"
        );
    }

    #[test]
    fn test_same_element_through_two_imports_is_not_ambiguous() {
        let mut model = ElementModel::new();
        let core = model.add_library("core", false);
        let f = model.add_function(unit(&model, core), "f", 0);
        let app = model.add_library("app", false);
        model.add_import(app, ImportDirective::of("core", core));
        model.add_import(app, ImportDirective::of("core", core).with_combinator(Combinator::show(["f"])));

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        assert_eq!(arena.lookup(scope, &ident("f"), app), Some(Binding::Element(f)));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_non_sdk_import_wins_over_sdk() {
        let mut model = ElementModel::new();
        let sdk = model.add_library("dart.core", true);
        model.add_class(unit(&model, sdk), "Duration", 0);
        let mine = model.add_library("my_time", false);
        let my_duration = model.add_class(unit(&model, mine), "Duration", 0);
        let app = model.add_library("app", false);
        model.add_import(app, ImportDirective::of("dart:core", sdk));
        model.add_import(app, ImportDirective::of("my_time", mine));

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();

        let found = arena.lookup(scope, &ident("Duration"), app);
        assert_eq!(found, Some(Binding::Element(my_duration)));
        // Memoized: the second lookup reports nothing new.
        assert_eq!(arena.lookup(scope, &ident("Duration"), app), found);

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "CONFLICTING_SDK_IMPORT");
        assert_eq!(
            diagnostics[0].kind.to_string(),
            "element 'Duration' from SDK library 'dart.core' is implicitly hidden by 'my_time'"
        );
    }

    #[test]
    fn test_all_sdk_candidates_stay_ambiguous() {
        let mut model = ElementModel::new();
        let s1 = model.add_library("dart.async", true);
        model.add_class(unit(&model, s1), "Timer", 0);
        let s2 = model.add_library("dart.io", true);
        model.add_class(unit(&model, s2), "Timer", 0);
        let app = model.add_library("app", false);
        model.add_import(app, ImportDirective::of("dart:async", s1));
        model.add_import(app, ImportDirective::of("dart:io", s2));

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        let found = arena.lookup(scope, &ident("Timer"), app).unwrap();
        assert!(found.is_multiply_defined());
        assert_eq!(recorder.codes(), vec!["AMBIGUOUS_IMPORT"]);
    }

    #[test]
    fn test_sdk_removal_leaving_several_candidates() {
        let mut model = ElementModel::new();
        let sdk = model.add_library("dart.core", true);
        model.add_class(unit(&model, sdk), "Box", 0);
        let a = model.add_library("a", false);
        let a_box = model.add_class(unit(&model, a), "Box", 0);
        let b = model.add_library("b", false);
        let b_box = model.add_class(unit(&model, b), "Box", 0);
        let app = model.add_library("app", false);
        model.add_import(app, ImportDirective::of("dart:core", sdk));
        model.add_import(app, ImportDirective::of("a", a));
        model.add_import(app, ImportDirective::of("b", b));

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        let Some(Binding::MultiplyDefined(marker)) = arena.lookup(scope, &ident("Box"), app) else {
            panic!("expected an ambiguity");
        };
        assert_eq!(marker.conflicting_elements(), &[a_box, b_box]);
        assert_eq!(recorder.codes(), vec!["CONFLICTING_SDK_IMPORT", "AMBIGUOUS_IMPORT"]);
    }

    #[test]
    fn test_reexported_library_name_mentions_the_importer() {
        let mut model = ElementModel::new();
        let base = model.add_library("base", false);
        model.add_function(unit(&model, base), "log", 0);
        let facade = model.add_library("facade", false);
        model.add_export(facade, ExportDirective::of("base", base));
        let other = model.add_library("other", false);
        model.add_function(unit(&model, other), "log", 0);
        let app = model.add_library("app", false);
        model.add_import(app, ImportDirective::of("facade", facade));
        model.add_import(app, ImportDirective::of("other", other));

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        arena.lookup(scope, &ident("log"), app);
        let diagnostics = recorder.diagnostics();
        assert_eq!(
            diagnostics[0].kind.to_string(),
            "the name 'log' is defined in the libraries 'base (via 'facade')' and 'other'"
        );
    }

    #[test]
    fn test_local_declaration_shadows_imports() {
        let (mut model, app, _, _) = ambiguous_model();
        let local = model.add_function(unit(&model, app), "foo", 40);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        assert_eq!(arena.lookup(scope, &ident("foo"), app), Some(Binding::Element(local)));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_prefixed_lookup_and_prefix_collision() {
        let mut model = ElementModel::new();
        let math = model.add_library("math", false);
        let max = model.add_function(unit(&model, math), "max", 0);
        let app = model.add_library("app", false);
        let prefix = model.add_prefix(app, "m", 20);
        model.add_import(app, ImportDirective::of("math", math).with_prefix(prefix));
        model.add_top_level_variable(unit(&model, app), "m", 55);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();

        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "PREFIX_COLLIDES_WITH_TOP_LEVEL_MEMBER");
        assert_eq!(diagnostics[0].offset, 55);
        assert_eq!(arena.local_lookup(scope, "m"), Some(prefix));

        let found = arena.lookup(scope, &Identifier::prefixed("m", "max", 80), app);
        assert_eq!(found, Some(Binding::Element(max)));
        assert_eq!(arena.lookup(scope, &ident("max"), app), None);
    }

    #[test]
    fn test_private_names_never_enter_import_scope() {
        let mut model = ElementModel::new();
        let lib = model.add_library("lib", false);
        let private = model.add_function(unit(&model, lib), "_secret", 0);
        let app = model.add_library("app", false);
        model.add_import(app, ImportDirective::of("lib", lib));

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        let imports = arena.enclosing_scope(scope).unwrap();
        assert!(matches!(arena.kind(imports), ScopeKind::LibraryImport { .. }));

        arena.define(imports, private);
        assert_eq!(arena.local_lookup(imports, "_secret"), None);
        assert_eq!(arena.lookup(scope, &ident("_secret"), app), None);
    }

    #[test]
    fn test_library_scope_spans_parts() {
        let mut model = ElementModel::new();
        let app = model.add_library("app", false);
        let part = model.add_part(app, "app_part");
        let helper = model.add_function(part, "helper", 0);
        let alias = model.add_function_type_alias(unit(&model, app), "Callback", 0);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        assert_eq!(arena.local_lookup(scope, "helper"), Some(helper));
        assert_eq!(arena.local_lookup(scope, "Callback"), Some(alias));
    }

    #[test]
    fn test_duplicate_top_level_across_parts() {
        let mut model = ElementModel::new();
        let app = model.add_library("app", false);
        let first = model.add_function(unit(&model, app), "run", 5);
        let part = model.add_part(app, "app_part");
        model.add_function(part, "run", 9);

        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        let scope = arena.library_scope(app).unwrap();
        let diagnostics = recorder.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "DUPLICATE_DEFINITION");
        assert_eq!(diagnostics[0].unit, Some(part));
        assert_eq!(arena.local_lookup(scope, "run"), Some(first));
    }

    #[test]
    fn test_library_scope_rejects_non_library() {
        let mut model = ElementModel::new();
        let app = model.add_library("app", false);
        let class = model.add_class(unit(&model, app), "C", 0);
        let recorder = DiagnosticRecorder::new();
        let mut arena = ScopeArena::new(&model, &recorder);
        assert!(arena.library_scope(class).is_err());
        assert!(arena.is_empty());
    }
}
