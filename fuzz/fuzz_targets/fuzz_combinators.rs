#![no_main]

use libfuzzer_sys::fuzz_target;
use lexis_core::element::{Combinator, ElementModel, ImportDirective};
use lexis_core::namespace::NamespaceBuilder;
use lexis_core::scope::is_private_name;

const NAMES: [&str; 8] = ["a", "b", "_c", "d", "_e", "f", "g", "_h"];

fuzz_target!(|data: &[u8]| {
    // Input layout:
    //   first half  → one declaration per byte; bits 0-2 pick the name,
    //                 bits 6-7 pick the declaration kind
    //   second half → one combinator per byte; bit 7 picks show/hide,
    //                 bits 0-6 select names from NAMES as a bit mask
    let (decls, combs) = data.split_at(data.len() / 2);

    let mut model = ElementModel::new();
    let lib = model.add_library("fuzz", false);
    let unit = model.library(lib).defining_unit.unwrap();
    for (i, &byte) in decls.iter().take(64).enumerate() {
        let name = NAMES[usize::from(byte & 0x07)];
        match byte >> 6 {
            0 => {
                model.add_function(unit, name, i);
            }
            1 => {
                model.add_top_level_variable(unit, name, i);
            }
            2 => {
                model.add_class(unit, name, i);
            }
            _ => {
                model.add_function_type_alias(unit, name, i);
            }
        }
    }

    let combinators: Vec<Combinator> = combs
        .iter()
        .take(8)
        .map(|&byte| {
            let names: Vec<&str> = NAMES
                .iter()
                .enumerate()
                .filter(|(bit, _)| byte & (1 << (bit % 7)) != 0)
                .map(|(_, name)| *name)
                .collect();
            if byte & 0x80 != 0 {
                Combinator::show(names)
            } else {
                Combinator::hide(names)
            }
        })
        .collect();

    let public = NamespaceBuilder.create_public_namespace_for_library(&model, lib);
    assert!(public.iter().all(|(name, _)| !is_private_name(name)));

    // Identities of the combinator algebra.
    assert_eq!(public.filtered(&[Combinator::hide(Vec::<String>::new())]), public);
    assert!(public.filtered(&[Combinator::show(Vec::<String>::new())]).is_empty());

    let filtered = public.filtered(&combinators);
    assert!(filtered.len() <= public.len());
    for (name, element) in filtered.iter() {
        assert!(!is_private_name(name));
        assert_eq!(public.get(name), Some(element));
    }

    // An import without a prefix sees exactly the filtered export namespace.
    let mut import = ImportDirective::of("fuzz", lib);
    for combinator in &combinators {
        import = import.with_combinator(combinator.clone());
    }
    let imported = NamespaceBuilder.create_import_namespace_for_directive(&model, &import);
    let exported = NamespaceBuilder.create_export_namespace_for_library(&model, lib);
    assert_eq!(imported, exported.filtered(&combinators));
});
