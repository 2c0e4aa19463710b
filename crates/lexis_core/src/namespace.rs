//! Namespaces: the immutable name tables that flow through imports and
//! exports.
//!
//! # Overview
//!
//! A [`Namespace`] maps names to elements and is never mutated once built.
//! [`NamespaceBuilder`] computes the four namespaces the language defines:
//!
//! - the **public** namespace of a library: every non-private top-level
//!   accessor, function, type alias and type across its units;
//! - the **export** namespace of a library: its public namespace plus,
//!   transitively, whatever its export directives re-export;
//! - the export namespace of one **export directive**;
//! - the **import** namespace of one import directive, with combinators
//!   applied and keys rewritten to `prefix.name` when the import is prefixed.
//!
//! Show/hide combinators always treat `name` and its setter `name=` as a pair.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::element::{Combinator, ElementId, ElementModel, ExportDirective, ImportDirective};
use crate::scope::{PREFIX_SEPARATOR, SETTER_SUFFIX, is_private_name};

type NameMap = HashMap<String, ElementId>;

// ─────────────────────────────────────────────────────────────────────────────
// Namespace
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable mapping from names to elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    defined_names: NameMap,
}

impl Namespace {
    /// A namespace binding nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The element bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<ElementId> {
        self.defined_names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defined_names.contains_key(name)
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.defined_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defined_names.is_empty()
    }

    /// Every `(name, element)` pair, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.defined_names.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Names in this namespace, sorted.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.defined_names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// A new namespace with `combinators` applied in order.
    pub fn filtered(&self, combinators: &[Combinator]) -> Namespace {
        Namespace::from(apply_combinators(self.defined_names.clone(), combinators))
    }
}

impl From<NameMap> for Namespace {
    fn from(defined_names: NameMap) -> Self {
        Self { defined_names }
    }
}

impl FromIterator<(String, ElementId)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (String, ElementId)>>(iter: I) -> Self {
        Self {
            defined_names: iter.into_iter().collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NamespaceBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Stateless namespace calculator. Safe to share between threads and passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NamespaceBuilder;

impl NamespaceBuilder {
    /// The export namespace of `library`, including everything it re-exports.
    pub fn create_export_namespace_for_library(&self, model: &ElementModel, library: ElementId) -> Namespace {
        let mut visiting = HashSet::new();
        Namespace::from(self.export_mapping(model, library, &mut visiting))
    }

    /// The names that flow through one export directive. An unresolved target
    /// yields an empty namespace.
    pub fn create_export_namespace_for_directive(&self, model: &ElementModel, export: &ExportDirective) -> Namespace {
        let Some(library) = export.exported_library else {
            return Namespace::empty();
        };
        let mut visiting = HashSet::new();
        let names = self.export_mapping(model, library, &mut visiting);
        Namespace::from(apply_combinators(names, &export.combinators))
    }

    /// The names one import directive makes visible, keyed `prefix.name` when
    /// the import has a prefix. An unresolved target yields an empty
    /// namespace.
    pub fn create_import_namespace_for_directive(&self, model: &ElementModel, import: &ImportDirective) -> Namespace {
        let Some(library) = import.imported_library else {
            return Namespace::empty();
        };
        let mut visiting = HashSet::new();
        let names = self.export_mapping(model, library, &mut visiting);
        let names = apply_combinators(names, &import.combinators);
        let names = match import.prefix {
            Some(prefix) => apply_prefix(names, model.name(prefix)),
            None => names,
        };
        Namespace::from(names)
    }

    /// Non-private top-level declarations of every unit of `library`.
    pub fn create_public_namespace_for_library(&self, model: &ElementModel, library: ElementId) -> Namespace {
        let mut names = NameMap::new();
        for unit in model.units_of(library) {
            let Some(data) = model.element(unit).as_unit() else {
                continue;
            };
            let declarations = data
                .accessors
                .iter()
                .chain(&data.functions)
                .chain(&data.type_aliases)
                .chain(&data.types);
            for &element in declarations {
                let name = model.name(element);
                if !name.is_empty() && !is_private_name(name) {
                    names.insert(name.to_owned(), element);
                }
            }
        }
        Namespace::from(names)
    }

    /// Depth-first export computation. `visiting` holds the libraries whose
    /// computation is in progress on the current path; re-entering one of
    /// them is an export cycle and contributes nothing.
    fn export_mapping(&self, model: &ElementModel, library: ElementId, visiting: &mut HashSet<ElementId>) -> NameMap {
        visiting.insert(library);
        let mut names = NameMap::new();
        for export in &model.library(library).exports {
            let Some(exported) = export.exported_library else {
                continue;
            };
            if visiting.contains(&exported) {
                debug!(
                    library = model.name(library),
                    exported = model.name(exported),
                    "skipping export cycle"
                );
                continue;
            }
            let exported_names = self.export_mapping(model, exported, visiting);
            names.extend(apply_combinators(exported_names, &export.combinators));
        }
        names.extend(
            model
                .public_namespace(library)
                .iter()
                .map(|(name, element)| (name.to_owned(), element)),
        );
        visiting.remove(&library);
        names
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Combinators
// ─────────────────────────────────────────────────────────────────────────────

fn apply_combinators(mut names: NameMap, combinators: &[Combinator]) -> NameMap {
    for combinator in combinators {
        names = match combinator {
            Combinator::Hide(hidden) => hide(names, hidden),
            Combinator::Show(shown) => show(&names, shown),
        };
    }
    names
}

fn hide(mut names: NameMap, hidden: &[String]) -> NameMap {
    for name in hidden {
        names.remove(name);
        names.remove(&format!("{name}{SETTER_SUFFIX}"));
    }
    names
}

fn show(names: &NameMap, shown: &[String]) -> NameMap {
    let mut kept = NameMap::with_capacity(shown.len() * 2);
    for name in shown {
        let setter = format!("{name}{SETTER_SUFFIX}");
        for key in [name, &setter] {
            if let Some(&element) = names.get(key) {
                kept.insert(key.clone(), element);
            }
        }
    }
    kept
}

fn apply_prefix(names: NameMap, prefix: &str) -> NameMap {
    names
        .into_iter()
        .map(|(name, element)| (format!("{prefix}{PREFIX_SEPARATOR}{name}"), element))
        .collect()
}
