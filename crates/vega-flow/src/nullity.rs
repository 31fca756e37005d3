//! The per-slot null lattice.
//!
//! Each tracked slot carries one of thirteen states: no information yet, a
//! set of values that became possible on some already-merged path, a fact
//! that is definite on the current path, or a definite null/non-null fact
//! that survived a merge where both arms agreed ("protected"). The packed
//! representation stores a 4-bit code per slot across four bit planes; all
//! combination logic decodes to [`Nullity`], runs a match, and re-encodes.

use std::fmt;

/// One of the three concrete nullness values a slot can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NullValue {
    Null,
    NonNull,
    Unknown,
}

/// A set of [`NullValue`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PotentialSet(u8);

impl PotentialSet {
    pub const EMPTY: Self = PotentialSet(0);
    pub const NULL: Self = PotentialSet(1);
    pub const NON_NULL: Self = PotentialSet(2);
    pub const UNKNOWN: Self = PotentialSet(4);

    #[must_use]
    pub const fn of(value: NullValue) -> Self {
        match value {
            NullValue::Null => Self::NULL,
            NullValue::NonNull => Self::NON_NULL,
            NullValue::Unknown => Self::UNKNOWN,
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        PotentialSet(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        PotentialSet(self.0 & other.0)
    }

    #[must_use]
    pub const fn contains(self, value: NullValue) -> bool {
        self.0 & Self::of(value).0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for PotentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.contains(NullValue::Null) {
            set.entry(&NullValue::Null);
        }
        if self.contains(NullValue::NonNull) {
            set.entry(&NullValue::NonNull);
        }
        if self.contains(NullValue::Unknown) {
            set.entry(&NullValue::Unknown);
        }
        set.finish()
    }
}

/// The observable null state of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Nullity {
    /// No information recorded yet.
    Unset,
    /// One or more values became possible on some already-merged path, none
    /// guaranteed. The set is never empty.
    Potential(PotentialSet),
    /// Guaranteed on the current path.
    DefinitelyNull,
    DefinitelyNonNull,
    DefinitelyUnknown,
    /// A definite fact that survived a merge where both arms agreed. A
    /// further disagreeing merge reopens it to `Potential` exactly as a
    /// plain definite fact would.
    ProtectedNull,
    ProtectedNonNull,
}

impl Nullity {
    /// The 4-bit packed code. `Potential` occupies codes 1..=7 (its set
    /// bits), the definite and protected tiers 8..=12; codes 13..=15 do not
    /// correspond to any state.
    pub(crate) fn encode(self) -> u8 {
        match self {
            Nullity::Unset => 0,
            Nullity::Potential(set) => {
                debug_assert!(!set.is_empty());
                set.0
            }
            Nullity::DefinitelyNull => 8,
            Nullity::DefinitelyNonNull => 9,
            Nullity::DefinitelyUnknown => 10,
            Nullity::ProtectedNull => 11,
            Nullity::ProtectedNonNull => 12,
        }
    }

    pub(crate) fn decode(code: u8) -> Nullity {
        match code {
            0 => Nullity::Unset,
            1..=7 => Nullity::Potential(PotentialSet(code)),
            8 => Nullity::DefinitelyNull,
            9 => Nullity::DefinitelyNonNull,
            10 => Nullity::DefinitelyUnknown,
            11 => Nullity::ProtectedNull,
            12 => Nullity::ProtectedNonNull,
            _ => unreachable!("corrupt null lattice code {code:#06b}"),
        }
    }

    /// Every value this state admits on at least one path.
    #[must_use]
    pub fn possible(self) -> PotentialSet {
        match self {
            Nullity::Unset => PotentialSet::EMPTY,
            Nullity::Potential(set) => set,
            Nullity::DefinitelyNull | Nullity::ProtectedNull => PotentialSet::NULL,
            Nullity::DefinitelyNonNull | Nullity::ProtectedNonNull => PotentialSet::NON_NULL,
            Nullity::DefinitelyUnknown => PotentialSet::UNKNOWN,
        }
    }

    /// The value guaranteed on the current path, if any.
    #[must_use]
    pub fn definite(self) -> Option<NullValue> {
        match self {
            Nullity::DefinitelyNull | Nullity::ProtectedNull => Some(NullValue::Null),
            Nullity::DefinitelyNonNull | Nullity::ProtectedNonNull => Some(NullValue::NonNull),
            Nullity::DefinitelyUnknown => Some(NullValue::Unknown),
            Nullity::Unset | Nullity::Potential(_) => None,
        }
    }

    /// `Potential(set)`, or `Unset` for the empty set.
    fn weakened(set: PotentialSet) -> Nullity {
        if set.is_empty() {
            Nullity::Unset
        } else {
            Nullity::Potential(set)
        }
    }

    /// Parallel merge of two sibling arms.
    ///
    /// `a_leak` / `b_leak` are the values the respective arm's incoming
    /// markers admit: when one arm never recorded anything for the slot,
    /// they bound what that arm's path could still have delivered. An arm
    /// whose markers admit nothing contributes nothing, and the other arm
    /// passes through unchanged.
    #[must_use]
    pub fn join(a: Nullity, b: Nullity, a_leak: PotentialSet, b_leak: PotentialSet) -> Nullity {
        match (a, b) {
            (Nullity::Unset, Nullity::Unset) => Nullity::Unset,
            (Nullity::Unset, informed) => {
                if a_leak.is_empty() {
                    informed
                } else {
                    Nullity::weakened(informed.possible().union(a_leak))
                }
            }
            (informed, Nullity::Unset) => {
                if b_leak.is_empty() {
                    informed
                } else {
                    Nullity::weakened(informed.possible().union(b_leak))
                }
            }
            (a, b) => match (a.definite(), b.definite()) {
                (Some(va), Some(vb)) if va == vb => match va {
                    NullValue::Null => Nullity::ProtectedNull,
                    NullValue::NonNull => Nullity::ProtectedNonNull,
                    NullValue::Unknown => Nullity::DefinitelyUnknown,
                },
                _ => Nullity::weakened(a.possible().union(b.possible())),
            },
        }
    }

    /// Sequential composition: fold a definitely-executed later state into
    /// an earlier one.
    ///
    /// A later fact replaces the earlier one outright. Where the later state
    /// recorded nothing, `later_leak` (what its incoming markers admit)
    /// decides the earlier fact's fate: admitted values pass through, with a
    /// definite fact surviving intact if its value is admitted. Markers that
    /// admit nothing kill the fact, which is what a re-scope reset in the
    /// later region produces. Unknown is not tracked by the markers and
    /// passes whenever anything does.
    #[must_use]
    pub fn compose(earlier: Nullity, later: Nullity, later_leak: PotentialSet) -> Nullity {
        if later != Nullity::Unset {
            return later;
        }
        if later_leak.is_empty() {
            return Nullity::Unset;
        }
        let passable = later_leak.union(PotentialSet::UNKNOWN);
        if let Some(value) = earlier.definite() {
            if passable.contains(value) {
                return earlier;
            }
        }
        Nullity::weakened(earlier.possible().intersect(passable))
    }

    /// Potential composition: fold a maybe-executed later state into an
    /// earlier one. Later facts only ever weaken: a definite later fact
    /// degrades to `Potential` unless it restates the earlier definite fact
    /// exactly; an absent later fact leaves the earlier one untouched.
    #[must_use]
    pub fn compose_potential(earlier: Nullity, later: Nullity) -> Nullity {
        if later == Nullity::Unset {
            return earlier;
        }
        if let Some(value) = earlier.definite() {
            if later.possible() == PotentialSet::of(value) {
                return earlier;
            }
        }
        Nullity::weakened(earlier.possible().union(later.possible()))
    }

    /// One more value became possible. A no-op when the slot is already
    /// definitely that value; otherwise degrades to the `Potential` union.
    #[must_use]
    pub fn weaken(self, value: NullValue) -> Nullity {
        if self.definite() == Some(value) {
            return self;
        }
        Nullity::Potential(self.possible().union(PotentialSet::of(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use NullValue::{NonNull, Null, Unknown};
    use Nullity::{
        DefinitelyNonNull, DefinitelyNull, DefinitelyUnknown, Potential, ProtectedNonNull,
        ProtectedNull, Unset,
    };

    const NO_LEAK: PotentialSet = PotentialSet::EMPTY;

    fn pot(values: &[NullValue]) -> Nullity {
        let mut set = PotentialSet::EMPTY;
        for &v in values {
            set = set.union(PotentialSet::of(v));
        }
        Potential(set)
    }

    #[test]
    fn codes_roundtrip() {
        let all = [
            Unset,
            pot(&[Null]),
            pot(&[NonNull]),
            pot(&[Unknown]),
            pot(&[Null, NonNull]),
            pot(&[Null, Unknown]),
            pot(&[NonNull, Unknown]),
            pot(&[Null, NonNull, Unknown]),
            DefinitelyNull,
            DefinitelyNonNull,
            DefinitelyUnknown,
            ProtectedNull,
            ProtectedNonNull,
        ];
        for state in all {
            assert_eq!(Nullity::decode(state.encode()), state);
        }
    }

    #[test]
    #[should_panic(expected = "corrupt null lattice code")]
    fn unused_codes_are_rejected() {
        let _ = Nullity::decode(13);
    }

    #[test]
    fn join_agreement_rows() {
        for (a, b) in [
            (DefinitelyNull, DefinitelyNull),
            (DefinitelyNull, ProtectedNull),
            (ProtectedNull, DefinitelyNull),
            (ProtectedNull, ProtectedNull),
        ] {
            assert_eq!(Nullity::join(a, b, NO_LEAK, NO_LEAK), ProtectedNull);
        }
        for (a, b) in [
            (DefinitelyNonNull, DefinitelyNonNull),
            (DefinitelyNonNull, ProtectedNonNull),
            (ProtectedNonNull, ProtectedNonNull),
        ] {
            assert_eq!(Nullity::join(a, b, NO_LEAK, NO_LEAK), ProtectedNonNull);
        }
        assert_eq!(
            Nullity::join(DefinitelyUnknown, DefinitelyUnknown, NO_LEAK, NO_LEAK),
            DefinitelyUnknown
        );
    }

    #[test]
    fn join_disagreement_rows() {
        assert_eq!(
            Nullity::join(DefinitelyNull, DefinitelyNonNull, NO_LEAK, NO_LEAK),
            pot(&[Null, NonNull])
        );
        assert_eq!(
            Nullity::join(ProtectedNull, ProtectedNonNull, NO_LEAK, NO_LEAK),
            pot(&[Null, NonNull])
        );
        assert_eq!(
            Nullity::join(DefinitelyNonNull, DefinitelyUnknown, NO_LEAK, NO_LEAK),
            pot(&[NonNull, Unknown])
        );
        assert_eq!(
            Nullity::join(pot(&[Null]), DefinitelyNonNull, NO_LEAK, NO_LEAK),
            pot(&[Null, NonNull])
        );
        assert_eq!(
            Nullity::join(pot(&[Null]), pot(&[Unknown]), NO_LEAK, NO_LEAK),
            pot(&[Null, Unknown])
        );
    }

    #[test]
    fn join_against_unset_filters_by_markers() {
        // Markers admitting nothing: the informed arm passes through intact.
        assert_eq!(
            Nullity::join(DefinitelyNonNull, Unset, NO_LEAK, NO_LEAK),
            DefinitelyNonNull
        );
        assert_eq!(
            Nullity::join(Unset, ProtectedNull, NO_LEAK, NO_LEAK),
            ProtectedNull
        );
        // A permissive unset arm weakens the informed one.
        assert_eq!(
            Nullity::join(DefinitelyNonNull, Unset, NO_LEAK, PotentialSet::NULL),
            pot(&[Null, NonNull])
        );
        assert_eq!(
            Nullity::join(Unset, DefinitelyNull, PotentialSet::NON_NULL, NO_LEAK),
            pot(&[Null, NonNull])
        );
        // The informed arm's own markers play no role in its survival.
        assert_eq!(
            Nullity::join(DefinitelyNull, Unset, PotentialSet::NON_NULL, NO_LEAK),
            DefinitelyNull
        );
    }

    #[test]
    fn compose_rows() {
        // Later facts win outright.
        assert_eq!(
            Nullity::compose(DefinitelyNull, DefinitelyNonNull, NO_LEAK),
            DefinitelyNonNull
        );
        assert_eq!(
            Nullity::compose(ProtectedNonNull, pot(&[Null]), PotentialSet::NULL),
            pot(&[Null])
        );
        // Later never observed the slot, markers admit nothing: fact dies.
        assert_eq!(Nullity::compose(DefinitelyNull, Unset, NO_LEAK), Unset);
        // Markers admit the fact's value: it survives intact.
        assert_eq!(
            Nullity::compose(ProtectedNull, Unset, PotentialSet::NULL),
            ProtectedNull
        );
        // Markers admit only the other value: the fact narrows away.
        assert_eq!(
            Nullity::compose(DefinitelyNull, Unset, PotentialSet::NON_NULL),
            Unset
        );
        // Unknown passes whenever anything does.
        assert_eq!(
            Nullity::compose(DefinitelyUnknown, Unset, PotentialSet::NULL),
            DefinitelyUnknown
        );
        assert_eq!(
            Nullity::compose(pot(&[Null, Unknown]), Unset, PotentialSet::NON_NULL),
            pot(&[Unknown])
        );
        assert_eq!(Nullity::compose(Unset, Unset, PotentialSet::NULL), Unset);
    }

    #[test]
    fn compose_potential_rows() {
        // A maybe-executed region degrades definite facts to potential.
        assert_eq!(
            Nullity::compose_potential(DefinitelyNull, DefinitelyNonNull),
            pot(&[Null, NonNull])
        );
        // Restating the same definite fact leaves it definite.
        assert_eq!(
            Nullity::compose_potential(DefinitelyNonNull, DefinitelyNonNull),
            DefinitelyNonNull
        );
        assert_eq!(
            Nullity::compose_potential(ProtectedNull, DefinitelyNull),
            ProtectedNull
        );
        // Absent later facts leave the earlier slot untouched.
        assert_eq!(
            Nullity::compose_potential(DefinitelyNull, Unset),
            DefinitelyNull
        );
        assert_eq!(
            Nullity::compose_potential(Unset, DefinitelyNonNull),
            pot(&[NonNull])
        );
        assert_eq!(
            Nullity::compose_potential(pot(&[Null]), pot(&[NonNull, Unknown])),
            pot(&[Null, NonNull, Unknown])
        );
    }

    #[test]
    fn weaken_rows() {
        assert_eq!(Unset.weaken(Null), pot(&[Null]));
        assert_eq!(DefinitelyNull.weaken(Null), DefinitelyNull);
        assert_eq!(ProtectedNonNull.weaken(NonNull), ProtectedNonNull);
        assert_eq!(DefinitelyNull.weaken(NonNull), pot(&[Null, NonNull]));
        assert_eq!(pot(&[Null]).weaken(Unknown), pot(&[Null, Unknown]));
    }
}
