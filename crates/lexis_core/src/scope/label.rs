//! Label scopes for `break` and `continue`.
//!
//! Labels live in their own chain, parallel to the name scopes.  Each node
//! binds one label text; loops and switches push an anonymous node (empty
//! text) so that an unlabeled `break`/`continue` finds the nearest enclosing
//! one.  Nodes are allocated in a [`Zone`] and released with it.

use crate::element::ElementId;
use crate::zone::Zone;

/// Text of the anonymous label pushed for loops and switches.
pub const EMPTY_LABEL: &str = "";

/// What a label resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTarget {
    /// A label declared in source.
    Label(ElementId),
    /// The implicit target of an unlabeled loop or switch.
    Anonymous {
        on_switch_statement: bool,
        on_switch_member: bool,
    },
}

/// One node of a label chain.
#[derive(Debug)]
pub struct LabelScope<'z> {
    outer: Option<&'z LabelScope<'z>>,
    label: &'z str,
    target: LabelTarget,
}

impl<'z> LabelScope<'z> {
    /// Pushes a named label in front of `outer`.
    pub fn named(
        zone: &'z Zone,
        outer: Option<&'z LabelScope<'z>>,
        label: &str,
        element: ElementId,
    ) -> &'z LabelScope<'z> {
        zone.alloc(LabelScope {
            outer,
            label: zone.alloc_str(label),
            target: LabelTarget::Label(element),
        })
    }

    /// Pushes the anonymous label of a loop or switch in front of `outer`.
    pub fn anonymous(
        zone: &'z Zone,
        outer: Option<&'z LabelScope<'z>>,
        on_switch_statement: bool,
        on_switch_member: bool,
    ) -> &'z LabelScope<'z> {
        zone.alloc(LabelScope {
            outer,
            label: EMPTY_LABEL,
            target: LabelTarget::Anonymous {
                on_switch_statement,
                on_switch_member,
            },
        })
    }

    /// The next node outward, `None` at the outermost label.
    pub fn outer(&self) -> Option<&'z LabelScope<'z>> {
        self.outer
    }

    /// The label text; [`EMPTY_LABEL`] for anonymous nodes.
    pub fn label(&self) -> &str {
        self.label
    }

    pub fn target(&self) -> LabelTarget {
        self.target
    }

    /// Finds the nearest node bound to `label`. Pass [`EMPTY_LABEL`] for an
    /// unlabeled `break`/`continue`.
    pub fn lookup(&self, label: &str) -> Option<&LabelTarget> {
        let mut current = self;
        loop {
            if current.label == label {
                return Some(&current.target);
            }
            current = current.outer?;
        }
    }
}
