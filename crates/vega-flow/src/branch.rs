use crate::state::FlowState;

/// The two flow states a boolean expression leaves behind: one for the path
/// where it evaluated true, one for false. Null comparisons assert opposite
/// facts on the two arms; `merge` folds them back together once the
/// condition's scope ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchPair {
    pub when_true: FlowState,
    pub when_false: FlowState,
}

impl BranchPair {
    /// Fork one state into both arms.
    #[must_use]
    pub fn duplicate(state: FlowState) -> Self {
        let when_true = state.fork();
        Self {
            when_true,
            when_false: state,
        }
    }

    /// The pair for the negated condition.
    #[must_use]
    pub fn negate(self) -> Self {
        Self {
            when_true: self.when_false,
            when_false: self.when_true,
        }
    }

    /// Reconverge the arms.
    #[must_use]
    pub fn merge(self) -> FlowState {
        self.when_true.join(self.when_false)
    }
}
