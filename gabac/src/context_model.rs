use derive_more::{Deref, DerefMut};

use crate::cabac_tables::{NEXT_STATE_LPS, NEXT_STATE_MPS, NUM_STATES};

/// Adaptive probability estimate of a single binary decision.
///
/// The model keeps the currently favored bit (the "most probable symbol") and
/// an index into the fixed table of LPS probabilities. The higher the state,
/// the more confident the model is about its MPS.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ContextModel {
    state: u8,
    mps: u8,
}

impl ContextModel {
    /// Creates a fresh model: state 0, MPS 0.
    ///
    /// # Examples
    /// ```
    /// use gabac::context_model::ContextModel;
    ///
    /// let model = ContextModel::new();
    /// assert_eq!(model.state(), 0);
    /// assert_eq!(model.mps(), 0);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self { state: 0, mps: 0 }
    }

    /// Creates a model in an arbitrary state.
    ///
    /// # Panics
    /// This function panics if `state` is not in `0..64`, or if `mps` is not
    /// a single bit.
    #[must_use]
    pub const fn with_state(state: u8, mps: u8) -> Self {
        assert!((state as usize) < NUM_STATES);
        assert!(mps <= 1);

        Self { state, mps }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> u8 {
        self.state
    }

    #[inline]
    #[must_use]
    pub const fn mps(&self) -> u8 {
        self.mps
    }

    /// Updates the model after coding its most probable symbol.
    #[inline]
    pub fn update_mps(&mut self) {
        self.state = NEXT_STATE_MPS[self.state as usize];
    }

    /// Updates the model after coding its least probable symbol.
    ///
    /// A misprediction at the lowest confidence swaps the MPS.
    #[inline]
    pub fn update_lps(&mut self) {
        if self.state == 0 {
            self.mps = 1 - self.mps;
        }
        self.state = NEXT_STATE_LPS[self.state as usize];
    }
}

/// Builds `num_contexts` freshly initialized context models.
///
/// # Examples
/// ```
/// use gabac::context_model::{build_context_table, ContextModel};
///
/// let table = build_context_table(3);
/// assert_eq!(table, vec![ContextModel::new(); 3]);
/// ```
#[must_use]
pub fn build_context_table(num_contexts: usize) -> Vec<ContextModel> {
    vec![ContextModel::new(); num_contexts]
}

/// Context models of one coding session, addressed by index.
///
/// The binarization layer picks the context by offset; the arithmetic coder
/// only ever sees a single `&mut ContextModel`.
#[derive(Deref, DerefMut, Debug, Clone, Eq, PartialEq)]
pub struct ContextTable(Vec<ContextModel>);

impl ContextTable {
    #[must_use]
    pub fn new(num_contexts: usize) -> Self {
        Self(build_context_table(num_contexts))
    }

    /// Returns the context at `index`.
    ///
    /// # Panics
    /// This function panics if `index` is out of bounds, which means the
    /// binarization parameters do not fit the configured number of contexts.
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> &mut ContextModel {
        let len = self.0.len();
        self.0.get_mut(index).unwrap_or_else(|| {
            panic!(
                "Context index out of bounds (index: {}, number of contexts: {})",
                index, len
            )
        })
    }

    /// Returns the last context of the table, used by sign flags.
    ///
    /// # Panics
    /// This function panics if the table is empty.
    #[inline]
    #[must_use]
    pub fn last_mut(&mut self) -> &mut ContextModel {
        self.0
            .last_mut()
            .expect("Sign flag requires at least one context")
    }
}
