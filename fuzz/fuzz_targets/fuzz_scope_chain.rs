#![no_main]

use libfuzzer_sys::fuzz_target;
use lexis_core::cursor::ScopeCursor;
use lexis_core::diagnostics::DiagnosticRecorder;
use lexis_core::element::{ElementId, ElementModel};
use lexis_core::scope::ScopeArena;
use lexis_core::syntax::Identifier;
use lexis_core::zone::Zone;

const NAMES: [&str; 4] = ["x", "y", "z", "w"];

fuzz_target!(|data: &[u8]| {
    // Each byte drives one cursor operation; bits 0-1 pick a name.
    //   0 → enter a block hiding the picked name
    //   1 → enter a loop
    //   2 → declare a fresh local with the picked name
    //   3 → exit
    //   4 → look the picked name up
    //   5 → unlabeled break lookup
    //   6 → enter a labeled statement
    //   7 → enter a switch
    let mut model = ElementModel::new();
    let lib = model.add_library("fuzz", false);
    let unit = model.library(lib).defining_unit.unwrap();
    let main = model.add_function(unit, "main", 0);
    let locals: Vec<ElementId> = data
        .iter()
        .take(256)
        .enumerate()
        .map(|(i, &byte)| model.add_local_variable(main, NAMES[usize::from(byte & 0x03)], i + 1))
        .collect();
    let label = model.add_label(main, "l", 0);

    let zone = Zone::new();
    let recorder = DiagnosticRecorder::new();
    let Ok(mut cursor) = ScopeCursor::new(ScopeArena::new(&model, &recorder), &zone, lib) else {
        return;
    };
    if cursor.enter_function(main).is_err() {
        return;
    }
    let mut breakable = 0usize;
    let mut frames: Vec<bool> = Vec::new();

    for (i, &byte) in data.iter().take(256).enumerate() {
        let name = NAMES[usize::from(byte & 0x03)];
        match (byte >> 2) % 8 {
            0 => {
                cursor.enter_block(&[locals[i]]);
                frames.push(false);
            }
            1 => {
                cursor.enter_loop();
                breakable += 1;
                frames.push(true);
            }
            2 => {
                let local = locals[i];
                cursor.declare(local);
                // A declared name always resolves.
                let found = cursor.lookup(&Identifier::new(name, i)).and_then(|b| b.element());
                assert!(found.is_some());
            }
            3 => {
                if let Some(was_breakable) = frames.pop() {
                    cursor.exit();
                    if was_breakable {
                        breakable -= 1;
                    }
                }
            }
            4 => {
                let _ = cursor.lookup(&Identifier::new(name, i));
            }
            5 => {
                assert_eq!(cursor.lookup_label(None).is_some(), breakable > 0);
            }
            6 => {
                cursor.enter_labels(&[label]);
                frames.push(false);
                assert!(cursor.lookup_label(Some("l")).is_some());
            }
            _ => {
                cursor.enter_switch(&[]);
                breakable += 1;
                frames.push(true);
            }
        }
        assert_eq!(cursor.depth(), frames.len() + 1);
    }
});
