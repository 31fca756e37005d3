use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one field or local variable within one analyzed method or
/// lambda body.
///
/// Slots are handed out by the resolver and stay stable for the duration of
/// one body's analysis. The flow analyzer partitions them into a field range
/// and a local range but otherwise treats them as opaque.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot(pub u32);

impl Slot {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Slot(index)
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

/// A variable or field record as supplied by the resolver.
///
/// The flow analyzer reads nothing about a variable beyond this record: its
/// slot, whether its type is a non-nullable primitive kind (such slots never
/// carry null state), and whether its declaration sits in reachable code
/// (used to silence definite-assignment complaints inside code that is dead
/// only because of constant folding).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub slot: Slot,
    pub primitive: bool,
    pub declaration_reachable: bool,
}

impl Variable {
    #[must_use]
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            primitive: false,
            declaration_reachable: true,
        }
    }

    #[must_use]
    pub fn primitive(slot: Slot) -> Self {
        Self {
            slot,
            primitive: true,
            declaration_reachable: true,
        }
    }

    #[must_use]
    pub fn with_unreachable_declaration(mut self) -> Self {
        self.declaration_reachable = false;
        self
    }
}
