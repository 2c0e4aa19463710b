//! Region allocator for label chains.
//!
//! A [`Zone`] is a bump-pointer region backed by [`bumpalo`].  Label scopes
//! of one executable body are allocated into a zone and released together
//! when the zone is dropped, so a chain can link to its outer scopes by
//! plain reference.
//!
//! # Example
//!
//! ```
//! use lexis_core::zone::Zone;
//!
//! let zone = Zone::new();
//! let label: &str = zone.alloc_str("outer");
//! assert_eq!(label, "outer");
//! ```

use bumpalo::Bump;

/// A bump-pointer region.
///
/// Destructors of values allocated here are **not** run when the zone is
/// dropped; only allocate types whose `Drop` may be skipped.
pub struct Zone {
    bump: Bump,
}

impl Zone {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Moves `value` into the zone.
    pub fn alloc<T>(&self, value: T) -> &T {
        self.bump.alloc(value)
    }

    /// Copies `s` into the zone.
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Bytes currently held by the zone.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::new()
    }
}
