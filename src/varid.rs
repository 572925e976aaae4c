//! Globally unique variable identity.
//!
//! `spec.md` calls for "a process-wide monotonic integer" that a
//! compilation session owns explicitly rather than a hidden global
//! (spec.md §9, Design Notes: "Global mutable `VarId::max_id` counter").
//! `VarIdSource` is that explicit owner; resetting it between independent
//! compilations is part of the lifecycle contract (spec.md §5).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(u32);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Monotonic source of fresh `VarId`s, owned by a single compilation
/// session (analyzer + flame model builder share one).
#[derive(Debug, Default)]
pub struct VarIdSource {
    next: u32,
}

impl VarIdSource {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn fresh(&mut self) -> VarId {
        let id = VarId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique_and_increasing() {
        let mut src = VarIdSource::new();
        let a = src.fresh();
        let b = src.fresh();
        let c = src.fresh();
        assert!(a < b && b < c);
    }

    #[test]
    fn independent_sources_can_reset() {
        let mut src1 = VarIdSource::new();
        let mut src2 = VarIdSource::new();
        assert_eq!(src1.fresh(), src2.fresh());
    }
}
