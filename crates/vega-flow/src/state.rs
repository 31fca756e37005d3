//! Flow states for one analyzed method or lambda body.
//!
//! A [`FlowState`] is either reachable, owning the bit planes that track
//! definite/potential assignment and per-slot nullness, or the unreachable
//! sentinel for code that provably never executes. The tree walker forks a
//! state before control flow diverges, mutates each copy in place along its
//! path, and merges the copies back with [`FlowState::join`]; straight-line
//! sequencing and maybe-executed regions fold in through
//! [`FlowState::compose`] and [`FlowState::compose_potential`].

use tracing::trace;
use vega_core::{Slot, Variable};

use crate::bits::Plane;
use crate::nullity::{NullValue, Nullity, PotentialSet};

/// Reachability of the code a state describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReachMode {
    Reachable,
    /// Dead for every analysis. Definite-assignment queries stop
    /// complaining about variables whose declarations sit in live code.
    Dead,
    /// Dead for null analysis only; assignment tracking still applies.
    DeadByNullAnalysis,
}

/// The data-carrying variant of [`FlowState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReachableState {
    /// Assigned on every path so far.
    assign_definite: Plane,
    /// Assigned on at least one path so far.
    assign_potential: Plane,
    /// Bit `k` of a slot's 4-bit null code lives in `null_bits[k]`.
    null_bits: [Plane; 4],
    /// A null / non-null value arriving from an enclosing, unresolved fork
    /// may still pass through this state for the slot. Cleared whenever a
    /// definite fact is re-asserted.
    incoming_null: Plane,
    incoming_non_null: Plane,
    /// The null planes carry meaning only once this is set.
    has_null_info: bool,
    unreachable: bool,
    null_unreachable: bool,
    /// Created without inherited context; untouched incoming markers read
    /// permissive instead of empty.
    unrooted: bool,
    /// Slots below this are fields, the rest locals.
    field_slot_count: u32,
}

impl ReachableState {
    fn new(field_slot_count: u32, unrooted: bool) -> Self {
        let marker_fill = if unrooted { !0 } else { 0 };
        Self {
            assign_definite: Plane::new(0),
            assign_potential: Plane::new(0),
            null_bits: [Plane::new(0), Plane::new(0), Plane::new(0), Plane::new(0)],
            incoming_null: Plane::new(marker_fill),
            incoming_non_null: Plane::new(marker_fill),
            has_null_info: false,
            unreachable: false,
            null_unreachable: false,
            unrooted,
            field_slot_count,
        }
    }

    #[must_use]
    pub fn field_slot_count(&self) -> u32 {
        self.field_slot_count
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    pub fn is_null_analysis_unreachable(&self) -> bool {
        self.unreachable || self.null_unreachable
    }

    /// Whether this state was created without inherited context and has
    /// kept that status through every merge since.
    pub fn is_unrooted(&self) -> bool {
        self.unrooted
    }

    pub fn set_reach_mode(&mut self, mode: ReachMode) {
        match mode {
            ReachMode::Reachable => {
                self.unreachable = false;
                self.null_unreachable = false;
            }
            ReachMode::Dead => self.unreachable = true,
            ReachMode::DeadByNullAnalysis => self.null_unreachable = true,
        }
    }

    /// Materialize every plane through the word containing `slot`.
    /// Mutators also grow lazily; this is for callers that know the final
    /// slot count up front and want the allocation out of the hot path.
    pub fn ensure_capacity(&mut self, slot: Slot) {
        let index = slot.index();
        let mut grew = false;
        grew |= self.assign_definite.reserve_through(index);
        grew |= self.assign_potential.reserve_through(index);
        for plane in &mut self.null_bits {
            grew |= plane.reserve_through(index);
        }
        grew |= self.incoming_null.reserve_through(index);
        grew |= self.incoming_non_null.reserve_through(index);
        if grew {
            trace!(slot = index, "grew flow state planes");
        }
    }

    // === Assignment tracking ===

    /// Record an assignment: a fact, not a possibility, so both planes are
    /// set.
    pub fn mark_assigned(&mut self, var: &Variable) {
        let slot = var.slot.index();
        self.assign_definite.set(slot);
        self.assign_potential.set(slot);
    }

    pub fn reset_assignment_info(&mut self, var: &Variable) {
        let slot = var.slot.index();
        self.assign_definite.clear(slot);
        self.assign_potential.clear(slot);
    }

    pub fn is_definitely_assigned(&self, var: &Variable) -> bool {
        // Inside code dead only by constant folding, complaining that a
        // live declaration might not be initialized would be noise.
        if self.unreachable && var.declaration_reachable {
            return true;
        }
        self.assign_definite.get(var.slot.index())
    }

    pub fn is_potentially_assigned(&self, var: &Variable) -> bool {
        self.assign_potential.get(var.slot.index())
    }

    // === Null tracking ===

    fn nullity_at(&self, slot: u32) -> Nullity {
        let mut code = 0u8;
        for (bit, plane) in self.null_bits.iter().enumerate() {
            if plane.get(slot) {
                code |= 1 << bit;
            }
        }
        Nullity::decode(code)
    }

    fn set_nullity(&mut self, slot: u32, nullity: Nullity) {
        let code = nullity.encode();
        for (bit, plane) in self.null_bits.iter_mut().enumerate() {
            if code & (1 << bit) != 0 {
                plane.set(slot);
            } else {
                plane.clear(slot);
            }
        }
    }

    fn leak_at(&self, slot: u32) -> PotentialSet {
        let mut set = PotentialSet::EMPTY;
        if self.incoming_null.get(slot) {
            set = set.union(PotentialSet::NULL);
        }
        if self.incoming_non_null.get(slot) {
            set = set.union(PotentialSet::NON_NULL);
        }
        set
    }

    fn set_leak(&mut self, slot: u32, leak: PotentialSet) {
        if leak.contains(NullValue::Null) {
            self.incoming_null.set(slot);
        } else {
            self.incoming_null.clear(slot);
        }
        if leak.contains(NullValue::NonNull) {
            self.incoming_non_null.set(slot);
        } else {
            self.incoming_non_null.clear(slot);
        }
    }

    fn clear_markers(&mut self, slot: u32) {
        self.incoming_null.clear(slot);
        self.incoming_non_null.clear(slot);
    }

    /// The observable null state of a variable. Primitive-kind records are
    /// opaque, and the planes carry no meaning without the global flag or
    /// inside null-analysis-dead code.
    #[must_use]
    pub fn nullity(&self, var: &Variable) -> Nullity {
        if var.primitive || !self.has_null_info || self.is_null_analysis_unreachable() {
            return Nullity::Unset;
        }
        self.nullity_at(var.slot.index())
    }

    pub fn is_definitely_null(&self, var: &Variable) -> bool {
        matches!(
            self.nullity(var),
            Nullity::DefinitelyNull | Nullity::ProtectedNull
        )
    }

    pub fn is_definitely_non_null(&self, var: &Variable) -> bool {
        matches!(
            self.nullity(var),
            Nullity::DefinitelyNonNull | Nullity::ProtectedNonNull
        )
    }

    pub fn is_protected_null(&self, var: &Variable) -> bool {
        self.nullity(var) == Nullity::ProtectedNull
    }

    pub fn is_protected_non_null(&self, var: &Variable) -> bool {
        self.nullity(var) == Nullity::ProtectedNonNull
    }

    /// True on at least one path; a definite fact qualifies.
    pub fn is_potentially_null(&self, var: &Variable) -> bool {
        self.nullity(var).possible().contains(NullValue::Null)
    }

    pub fn is_potentially_non_null(&self, var: &Variable) -> bool {
        self.nullity(var).possible().contains(NullValue::NonNull)
    }

    /// The strongest null guarantee, the basis for "this dereference will
    /// fail" reports. A lone `Potential` possibility does not qualify: the
    /// slot could still hold an unrecorded value.
    pub fn can_only_be_null(&self, var: &Variable) -> bool {
        self.is_definitely_null(var)
    }

    /// The strongest non-null guarantee, the basis for suppressing
    /// possible-null reports.
    pub fn cannot_be_null(&self, var: &Variable) -> bool {
        self.is_definitely_non_null(var)
    }

    pub fn has_null_info_for(&self, var: &Variable) -> bool {
        if var.primitive || !self.has_null_info || self.is_null_analysis_unreachable() {
            return false;
        }
        let slot = var.slot.index();
        self.nullity_at(slot) != Nullity::Unset || !self.leak_at(slot).is_empty()
    }

    fn assert_null(&mut self, var: &Variable, nullity: Nullity) {
        if var.primitive {
            return;
        }
        let slot = var.slot.index();
        self.set_nullity(slot, nullity);
        // A fresh definite fact invalidates whatever could have leaked in
        // from an unresolved fork.
        self.clear_markers(slot);
        self.has_null_info = true;
    }

    pub fn mark_as_definitely_null(&mut self, var: &Variable) {
        self.assert_null(var, Nullity::DefinitelyNull);
    }

    pub fn mark_as_definitely_non_null(&mut self, var: &Variable) {
        self.assert_null(var, Nullity::DefinitelyNonNull);
    }

    pub fn mark_as_definitely_unknown(&mut self, var: &Variable) {
        self.assert_null(var, Nullity::DefinitelyUnknown);
    }

    /// The variable just compared equal to `null`: definitely null on this
    /// path, and protected because the comparison guards it.
    pub fn mark_as_compared_equal_to_null(&mut self, var: &Variable) {
        self.assert_null(var, Nullity::ProtectedNull);
    }

    pub fn mark_as_compared_equal_to_non_null(&mut self, var: &Variable) {
        self.assert_null(var, Nullity::ProtectedNonNull);
    }

    fn weaken_null(&mut self, var: &Variable, value: NullValue) {
        if var.primitive {
            return;
        }
        let slot = var.slot.index();
        let next = self.nullity_at(slot).weaken(value);
        self.set_nullity(slot, next);
        self.has_null_info = true;
    }

    pub fn mark_potentially_null(&mut self, var: &Variable) {
        self.weaken_null(var, NullValue::Null);
    }

    pub fn mark_potentially_non_null(&mut self, var: &Variable) {
        self.weaken_null(var, NullValue::NonNull);
    }

    pub fn mark_potentially_unknown(&mut self, var: &Variable) {
        self.weaken_null(var, NullValue::Unknown);
    }

    /// Drop all null information for one slot, e.g. when its variable goes
    /// out of scope and the slot is redeclared.
    pub fn reset_null_info(&mut self, var: &Variable) {
        let slot = var.slot.index();
        for plane in &mut self.null_bits {
            plane.clear(slot);
        }
        self.clear_markers(slot);
    }

    // === Whole-plane discards ===

    /// Drop both assignment planes, keeping null information.
    pub fn discard_initialization_info(&mut self) {
        self.assign_definite.clear_all();
        self.assign_potential.clear_all();
    }

    /// Drop every fact about local slots, keeping fields. Used when a state
    /// crosses a method or field boundary and must not leak local-variable
    /// facts into the nested analysis.
    pub fn discard_local_info(&mut self) {
        let boundary = self.field_slot_count;
        self.assign_definite.clear_from(boundary);
        self.assign_potential.clear_from(boundary);
        for plane in &mut self.null_bits {
            plane.clear_from(boundary);
        }
        self.incoming_null.clear_from(boundary);
        self.incoming_non_null.clear_from(boundary);
    }

    /// The complement: drop every fact about field slots, keeping locals.
    pub fn discard_field_info(&mut self) {
        let boundary = self.field_slot_count;
        self.assign_definite.clear_below(boundary);
        self.assign_potential.clear_below(boundary);
        for plane in &mut self.null_bits {
            plane.clear_below(boundary);
        }
        self.incoming_null.clear_below(boundary);
        self.incoming_non_null.clear_below(boundary);
    }

    // === Internals shared by the composition operators ===

    fn null_code_word_count(&self) -> usize {
        self.null_bits
            .iter()
            .map(Plane::word_count)
            .max()
            .unwrap_or(1)
    }

    fn null_word_count(&self) -> usize {
        self.null_code_word_count()
            .max(self.incoming_null.word_count())
            .max(self.incoming_non_null.word_count())
    }

    fn width(&self) -> usize {
        self.null_word_count()
            .max(self.assign_definite.word_count())
            .max(self.assign_potential.word_count())
    }

    fn null_code_word(&self, idx: usize) -> u64 {
        self.null_bits
            .iter()
            .fold(0u64, |acc, plane| acc | plane.word(idx))
    }
}

/// A flow state at one program point.
///
/// The sentinel variant stands for code that provably never executes: it
/// carries no per-slot data, every mutator is a no-op on it, and it is the
/// identity of [`join`](FlowState::join), so callers can thread it through
/// dead branches without allocating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    Reachable(ReachableState),
    Unreachable,
}

impl FlowState {
    /// Fresh state for a method or lambda entry: everything unassigned,
    /// nothing known about nullness.
    #[must_use]
    pub fn initial(field_slot_count: u32) -> FlowState {
        FlowState::Reachable(ReachableState::new(field_slot_count, false))
    }

    /// Fresh detached state, created without inherited context (loop-exit
    /// collectors, nested-scope analyses). Its untouched incoming markers
    /// read permissive, including across growth, so facts folded through it
    /// weaken instead of passing unchallenged.
    #[must_use]
    pub fn unrooted(field_slot_count: u32) -> FlowState {
        FlowState::Reachable(ReachableState::new(field_slot_count, true))
    }

    /// Deep copy for one arm of diverging control flow. Mutating the copy
    /// never affects the original.
    #[must_use]
    pub fn fork(&self) -> FlowState {
        self.clone()
    }

    pub fn is_unreachable(&self) -> bool {
        match self {
            FlowState::Unreachable => true,
            FlowState::Reachable(state) => state.is_unreachable(),
        }
    }

    pub fn is_null_analysis_unreachable(&self) -> bool {
        match self {
            FlowState::Unreachable => true,
            FlowState::Reachable(state) => state.is_null_analysis_unreachable(),
        }
    }

    pub fn set_reach_mode(&mut self, mode: ReachMode) {
        if let FlowState::Reachable(state) = self {
            state.set_reach_mode(mode);
        }
    }

    pub fn ensure_capacity(&mut self, slot: Slot) {
        if let FlowState::Reachable(state) = self {
            state.ensure_capacity(slot);
        }
    }

    // === Queries ===

    /// True when the variable is assigned on every path, and
    /// unconditionally inside unreachable code (dead code cannot use an
    /// uninitialized variable).
    pub fn is_definitely_assigned(&self, var: &Variable) -> bool {
        match self {
            FlowState::Unreachable => true,
            FlowState::Reachable(state) => state.is_definitely_assigned(var),
        }
    }

    pub fn is_potentially_assigned(&self, var: &Variable) -> bool {
        match self {
            FlowState::Unreachable => false,
            FlowState::Reachable(state) => state.is_potentially_assigned(var),
        }
    }

    #[must_use]
    pub fn nullity(&self, var: &Variable) -> Nullity {
        match self {
            FlowState::Unreachable => Nullity::Unset,
            FlowState::Reachable(state) => state.nullity(var),
        }
    }

    pub fn is_definitely_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::is_definitely_null)
    }

    pub fn is_definitely_non_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::is_definitely_non_null)
    }

    pub fn is_protected_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::is_protected_null)
    }

    pub fn is_protected_non_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::is_protected_non_null)
    }

    pub fn is_potentially_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::is_potentially_null)
    }

    pub fn is_potentially_non_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::is_potentially_non_null)
    }

    pub fn can_only_be_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::can_only_be_null)
    }

    pub fn cannot_be_null(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::cannot_be_null)
    }

    pub fn has_null_info_for(&self, var: &Variable) -> bool {
        self.reachable_query(var, ReachableState::has_null_info_for)
    }

    fn reachable_query(
        &self,
        var: &Variable,
        query: impl Fn(&ReachableState, &Variable) -> bool,
    ) -> bool {
        match self {
            FlowState::Unreachable => false,
            FlowState::Reachable(state) => query(state, var),
        }
    }

    // === Mutators (no-ops on the sentinel) ===

    pub fn mark_assigned(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_assigned(var));
    }

    pub fn reset_assignment_info(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.reset_assignment_info(var));
    }

    pub fn mark_as_definitely_null(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_as_definitely_null(var));
    }

    pub fn mark_as_definitely_non_null(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_as_definitely_non_null(var));
    }

    pub fn mark_as_definitely_unknown(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_as_definitely_unknown(var));
    }

    pub fn mark_as_compared_equal_to_null(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_as_compared_equal_to_null(var));
    }

    pub fn mark_as_compared_equal_to_non_null(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_as_compared_equal_to_non_null(var));
    }

    pub fn mark_potentially_null(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_potentially_null(var));
    }

    pub fn mark_potentially_non_null(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_potentially_non_null(var));
    }

    pub fn mark_potentially_unknown(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.mark_potentially_unknown(var));
    }

    pub fn reset_null_info(&mut self, var: &Variable) {
        self.reachable_mutate(|state| state.reset_null_info(var));
    }

    pub fn discard_initialization_info(&mut self) {
        self.reachable_mutate(ReachableState::discard_initialization_info);
    }

    pub fn discard_local_info(&mut self) {
        self.reachable_mutate(ReachableState::discard_local_info);
    }

    pub fn discard_field_info(&mut self) {
        self.reachable_mutate(ReachableState::discard_field_info);
    }

    fn reachable_mutate(&mut self, mutate: impl FnOnce(&mut ReachableState)) {
        if let FlowState::Reachable(state) = self {
            mutate(state);
        }
    }

    // === Composition operators ===

    /// Parallel merge of two sibling arms reconverging. The sentinel is the
    /// identity, and a reachable arm flagged dead contributes nothing.
    /// Assignment facts stay definite only when both arms agree; agreeing
    /// definite null facts come out protected, disagreeing ones reopen to
    /// potential.
    #[must_use]
    pub fn join(self, other: FlowState) -> FlowState {
        match (self, other) {
            (FlowState::Unreachable, other) => other,
            (state, FlowState::Unreachable) => state,
            (FlowState::Reachable(mut a), FlowState::Reachable(b)) => {
                if b.is_unreachable() && !a.is_unreachable() {
                    return FlowState::Reachable(a);
                }
                if a.is_unreachable() && !b.is_unreachable() {
                    return FlowState::Reachable(b);
                }
                merge_parallel(&mut a, &b);
                FlowState::Reachable(a)
            }
        }
    }

    /// Fold a later, definitely-executed state into this one. Later facts
    /// only ever add assignment information; later null facts replace
    /// earlier ones except for slots the later state never observed.
    #[must_use]
    pub fn compose(self, later: FlowState) -> FlowState {
        match (self, later) {
            (FlowState::Unreachable, _) => FlowState::Unreachable,
            (earlier, FlowState::Unreachable) => earlier,
            (FlowState::Reachable(mut earlier), FlowState::Reachable(later)) => {
                debug_assert_eq!(earlier.field_slot_count, later.field_slot_count);
                earlier.assign_definite.or_with(&later.assign_definite);
                earlier.assign_potential.or_with(&later.assign_potential);
                if later.has_null_info {
                    compose_null_planes(&mut earlier, &later);
                }
                earlier.has_null_info |= later.has_null_info;
                earlier.unreachable |= later.unreachable;
                earlier.null_unreachable |= later.null_unreachable;
                FlowState::Reachable(earlier)
            }
        }
    }

    /// Fold a state that may or may not have executed (a loop body before
    /// its first confirmed iteration, one arm of a conditional expression)
    /// into this one. Nothing is upgraded to definite: assignment only ORs
    /// the potential plane, and definite later null facts degrade to
    /// potential unless they restate the earlier fact.
    #[must_use]
    pub fn compose_potential(self, later: FlowState) -> FlowState {
        match (self, later) {
            (FlowState::Unreachable, _) => FlowState::Unreachable,
            (earlier, FlowState::Unreachable) => earlier,
            (FlowState::Reachable(mut earlier), FlowState::Reachable(later)) => {
                debug_assert_eq!(earlier.field_slot_count, later.field_slot_count);
                earlier.assign_potential.or_with(&later.assign_potential);
                if later.has_null_info {
                    compose_potential_null_planes(&mut earlier, &later);
                }
                earlier.has_null_info |= later.has_null_info;
                FlowState::Reachable(earlier)
            }
        }
    }
}

fn merge_parallel(a: &mut ReachableState, b: &ReachableState) {
    debug_assert_eq!(a.field_slot_count, b.field_slot_count);
    if a.width() != b.width() {
        trace!(
            left = a.width(),
            right = b.width(),
            "reconciling flow state widths"
        );
    }

    a.assign_definite.and_with(&b.assign_definite);
    a.assign_potential.or_with(&b.assign_potential);

    if a.has_null_info || b.has_null_info {
        if b.is_null_analysis_unreachable() && !a.is_null_analysis_unreachable() {
            // The null-dead arm contributes no null facts.
        } else if a.is_null_analysis_unreachable() && !b.is_null_analysis_unreachable() {
            a.null_bits = b.null_bits.clone();
            a.incoming_null = b.incoming_null.clone();
            a.incoming_non_null = b.incoming_non_null.clone();
        } else {
            join_null_planes(a, b);
        }
    }

    a.has_null_info |= b.has_null_info;
    a.unreachable &= b.unreachable;
    a.null_unreachable &= b.null_unreachable;
    a.unrooted &= b.unrooted;
}

fn join_null_planes(a: &mut ReachableState, b: &ReachableState) {
    let words = a.null_code_word_count().max(b.null_code_word_count());
    for idx in 0..words {
        // Two unset slots join to unset no matter what the markers say.
        if a.null_code_word(idx) == 0 && b.null_code_word(idx) == 0 {
            continue;
        }
        let base = idx as u32 * u64::BITS;
        for offset in 0..u64::BITS {
            let slot = base + offset;
            let left = a.nullity_at(slot);
            let right = b.nullity_at(slot);
            if left == Nullity::Unset && right == Nullity::Unset {
                continue;
            }
            let joined = Nullity::join(left, right, a.leak_at(slot), b.leak_at(slot));
            if joined != left {
                a.set_nullity(slot, joined);
            }
        }
    }
    a.incoming_null.or_with(&b.incoming_null);
    a.incoming_non_null.or_with(&b.incoming_non_null);
}

fn compose_null_planes(earlier: &mut ReachableState, later: &ReachableState) {
    let words = earlier.null_word_count().max(later.null_word_count());
    for idx in 0..words {
        let later_any = later.null_code_word(idx)
            | later.incoming_null.word(idx)
            | later.incoming_non_null.word(idx);
        if later_any == 0 {
            // The later region re-scoped these slots or admits nothing
            // through: earlier facts die wholesale.
            for plane in &mut earlier.null_bits {
                if plane.word(idx) != 0 {
                    *plane.word_mut(idx) = 0;
                }
            }
            if earlier.incoming_null.word(idx) != 0 {
                *earlier.incoming_null.word_mut(idx) = 0;
            }
            if earlier.incoming_non_null.word(idx) != 0 {
                *earlier.incoming_non_null.word_mut(idx) = 0;
            }
            continue;
        }
        let base = idx as u32 * u64::BITS;
        for offset in 0..u64::BITS {
            let slot = base + offset;
            let late = later.nullity_at(slot);
            let leak = later.leak_at(slot);
            let early = earlier.nullity_at(slot);
            let combined = Nullity::compose(early, late, leak);
            if combined != early {
                earlier.set_nullity(slot, combined);
            }
            if late == Nullity::Unset {
                // Pass-through across the whole sequence needs both
                // regions to admit the value.
                earlier.set_leak(slot, earlier.leak_at(slot).intersect(leak));
            } else {
                earlier.set_leak(slot, leak);
            }
        }
    }
    let null_fill = earlier.incoming_null.fill() & later.incoming_null.fill();
    earlier.incoming_null.set_fill(null_fill);
    let non_null_fill = earlier.incoming_non_null.fill() & later.incoming_non_null.fill();
    earlier.incoming_non_null.set_fill(non_null_fill);
}

fn compose_potential_null_planes(earlier: &mut ReachableState, later: &ReachableState) {
    let words = later.null_code_word_count();
    for idx in 0..words {
        if later.null_code_word(idx) == 0 {
            continue;
        }
        let base = idx as u32 * u64::BITS;
        for offset in 0..u64::BITS {
            let slot = base + offset;
            let late = later.nullity_at(slot);
            if late == Nullity::Unset {
                continue;
            }
            let early = earlier.nullity_at(slot);
            let combined = Nullity::compose_potential(early, late);
            if combined != early {
                earlier.set_nullity(slot, combined);
            }
        }
    }
}
