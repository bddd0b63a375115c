//! Named alternative implementations with one selected

use crate::error::NotFound;
use crate::source::Source;

/// Ordered set of alternatives ("fidelities") for the same quantity
///
/// The first alternative registered is selected until another one is
/// chosen with [`FidelitySet::select`].
#[derive(Debug, Clone, Default)]
pub struct FidelitySet {
    alternatives: Vec<(String, Source)>,
    selected: usize,
    changed: bool,
}

impl FidelitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FidelitySet::insert`]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<Source>) -> Self {
        self.insert(name, source);
        self
    }

    /// Register an alternative, replacing one with the same name in place
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<Source>) {
        let name = name.into();
        let source = source.into();
        match self.alternatives.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = source,
            None => self.alternatives.push((name, source)),
        }
    }

    /// Select an alternative by name; any successful selection marks the set changed
    pub fn select(&mut self, name: &str) -> Result<(), NotFound> {
        let index = self
            .alternatives
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| NotFound {
                name: name.to_string(),
                available: self.names(),
            })?;

        self.selected = index;
        self.changed = true;
        Ok(())
    }

    pub fn selected(&self) -> Option<&Source> {
        self.alternatives.get(self.selected).map(|(_, s)| s)
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.alternatives.get(self.selected).map(|(n, _)| n.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.alternatives
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Alternative names in registration order
    pub fn names(&self) -> Vec<String> {
        self.alternatives.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Whether a selection was made since the flag was last cleared
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}
