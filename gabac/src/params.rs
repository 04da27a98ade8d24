/// Parameters of a single coding session.
///
/// Neither of these is stored in the coded stream, so the [`crate::Writer`]
/// and the [`crate::Reader`] of one session have to be constructed with equal
/// parameters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct GabacParams {
    num_contexts: usize,
    bypass: bool,
}

impl GabacParams {
    pub fn builder() -> GabacParamsBuilder {
        GabacParamsBuilder::new()
    }

    /// Number of context models allocated for the session.
    #[inline]
    #[must_use]
    pub fn num_contexts(&self) -> usize {
        self.num_contexts
    }

    /// Whether all the bins are coded as equiprobable, skipping the contexts.
    #[inline]
    #[must_use]
    pub fn bypass(&self) -> bool {
        self.bypass
    }
}

#[derive(Debug, Clone)]
pub struct GabacParamsBuilder {
    num_contexts: usize,
    bypass: bool,
}

impl GabacParamsBuilder {
    pub fn new() -> Self {
        Self {
            num_contexts: 0,
            bypass: false,
        }
    }

    pub fn num_contexts(&mut self, num_contexts: usize) -> &mut Self {
        let mut new = self;
        new.num_contexts = num_contexts;
        new
    }

    pub fn bypass(&mut self, bypass: bool) -> &mut Self {
        let mut new = self;
        new.bypass = bypass;
        new
    }

    pub fn build(&mut self) -> GabacParams {
        GabacParams {
            num_contexts: self.num_contexts,
            bypass: self.bypass,
        }
    }
}

impl Default for GabacParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
