use crate::algebra::Algebra;
use crate::node::VariableId;

/// Value assignment for the leaf variables of an evaluation, indexed by [`VariableId`].
///
/// Each concurrent evaluation owns its own `Values`; the graph itself is never written to.
#[derive(Clone, Debug, PartialEq)]
pub struct Values<A> {
    entries: Vec<Option<A>>,
}

impl<A> Default for Values<A> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<A: Algebra> Values<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(num_variables: usize) -> Self {
        Self {
            entries: Vec::with_capacity(num_variables),
        }
    }

    pub fn set(&mut self, variable: VariableId, value: A) {
        let i = variable.index();
        if i >= self.entries.len() {
            self.entries.resize(i + 1, None);
        }
        self.entries[i] = Some(value);
    }

    pub fn unset(&mut self, variable: VariableId) {
        if let Some(slot) = self.entries.get_mut(variable.index()) {
            *slot = None;
        }
    }

    pub fn get(&self, variable: VariableId) -> Option<&A> {
        self.entries.get(variable.index())?.as_ref()
    }

    /// Number of addressable entries (bound or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: Algebra> FromIterator<A> for Values<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Some).collect(),
        }
    }
}

impl Values<f64> {
    pub fn from_slice(x: &[f64]) -> Self {
        x.iter().copied().collect()
    }
}

impl<A: Algebra> Values<A> {
    /// Seed every entry of `x` as an independent variable.
    pub fn seeded(x: &[f64]) -> Self {
        x.iter()
            .enumerate()
            .map(|(i, &v)| A::seed(VariableId::new(i), v))
            .collect()
    }
}
