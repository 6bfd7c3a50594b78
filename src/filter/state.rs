//! Generic multi-stage filter-builder state machine.
//!
//! Backs every "Add Filter" popover: choose a filter key, then choose a
//! concrete value (from a snapshotted option list, or free text), then
//! commit. Instantiations supply a [`FilterKey`] enum describing their
//! filterable dimensions; everything else is shared.
//!
//! All transitions are copy-on-write: each one takes `&self` and returns a
//! new state value, so observers can detect change with plain equality.
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::resources::ResourceCache;

/// A filterable dimension. Implementations are closed enums; the
/// key -> behavior dispatch in [`FilterKey::options`] must be a total match
/// over the enum so that unhandled keys are a compile error.
pub trait FilterKey: Copy + Eq + std::hash::Hash + std::fmt::Debug + 'static {
    /// Every selectable key, in the order offered at the SelectKey stage.
    fn all() -> &'static [Self];

    /// Display label for the key command and committed chips.
    fn label(&self) -> &'static str;

    /// How values for this key are chosen: a concrete option list built from
    /// the current resource snapshot, or free text.
    fn options(&self, resources: &ResourceCache) -> KeyOptions;
}

/// Option population behavior for a selected key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOptions {
    /// Finite option list: resource-backed or a hardcoded enumeration.
    Items(Vec<ItemCommand>),
    /// Free-text value entered directly by the user.
    FreeText,
}

/// A selectable concrete value at the SelectItem stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCommand {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
}

impl ItemCommand {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            disabled: false,
        }
    }
}

/// A selectable option offered by the popover at its current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCommand<K: FilterKey> {
    /// Pick which dimension to filter on.
    SelectKey { key: K, disabled: bool },
    /// Pick a concrete value for the dimension chosen earlier.
    SelectItem(ItemCommand),
}

impl<K: FilterKey> FilterCommand<K> {
    pub fn label(&self) -> &str {
        match self {
            FilterCommand::SelectKey { key, .. } => key.label(),
            FilterCommand::SelectItem(item) => &item.label,
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            FilterCommand::SelectKey { disabled, .. } => *disabled,
            FilterCommand::SelectItem(item) => item.disabled,
        }
    }
}

/// Insertion-ordered id -> label map with idempotent overwrite semantics.
///
/// Re-inserting an existing id updates its label in place instead of
/// duplicating or reordering the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionMap(Vec<(String, String)>);

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, label: impl Into<String>) {
        let id = id.into();
        let label = label.into();
        if let Some(entry) = self.0.iter_mut().find(|(existing, _)| *existing == id) {
            entry.1 = label;
        } else {
            self.0.push((id, label));
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.0.retain(|(existing, _)| existing != id);
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, label)| label.as_str())
    }

    pub fn ids(&self) -> Vec<String> {
        self.0.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|(_, label)| label.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(id, label)| (id.as_str(), label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A committed constraint for one filter key.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Filter {
    /// "key is one of {v1, v2, ...}" (OR semantics within the key).
    MultiSelect(SelectionMap),
    /// Single free-text value.
    Value(String),
}

impl Filter {
    /// Concrete values for query construction: ids of a multi-select, the
    /// singleton of a non-empty scalar.
    pub fn values(&self) -> Option<Vec<String>> {
        match self {
            Filter::MultiSelect(map) => Some(map.ids()),
            Filter::Value(value) => {
                if value.is_empty() {
                    None
                } else {
                    Some(vec![value.clone()])
                }
            }
        }
    }

    /// Human-readable summary used by chips: labels joined with " OR ".
    pub fn summary(&self) -> String {
        match self {
            Filter::MultiSelect(map) => map.labels().join(" OR "),
            Filter::Value(value) => value.clone(),
        }
    }
}

/// The popover's current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage<K: FilterKey> {
    /// No key chosen yet; the list of available keys is shown.
    SelectKey,
    /// A key with a finite option list was chosen. `children` is a snapshot
    /// of the options at the moment of selection.
    SelectItem { key: K, children: Vec<ItemCommand> },
    /// A free-text key was chosen; holds the in-progress value.
    SelectValue { key: K, value: String },
}

/// State of one filter-builder instance: the committed filter set, the
/// popover's open flag, the autocomplete input text, and the current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState<K: FilterKey> {
    pub open: bool,
    pub input_value: String,
    pub stage: Stage<K>,
    filters: Vec<(K, Filter)>,
    allowed_keys: Option<Vec<K>>,
}

impl<K: FilterKey> Default for FilterState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: FilterKey> FilterState<K> {
    pub fn new() -> Self {
        Self {
            open: false,
            input_value: String::new(),
            stage: Stage::SelectKey,
            filters: Vec::new(),
            allowed_keys: None,
        }
    }

    /// Restrict the SelectKey stage to a caller-supplied subset of keys.
    pub fn with_allowed_keys(mut self, keys: Vec<K>) -> Self {
        self.allowed_keys = Some(keys);
        self
    }

    /// Pure replace of the stage. Transition legality is not validated: the
    /// popover only ever requests legal transitions.
    #[must_use]
    pub fn with_stage(&self, stage: Stage<K>) -> Self {
        let mut next = self.clone();
        next.stage = stage;
        next
    }

    /// Open the popover at the SelectKey stage.
    #[must_use]
    pub fn opened(&self) -> Self {
        let mut next = self.clone();
        next.open = true;
        next
    }

    /// Close the popover, resetting the stage and clearing the input text.
    /// Committed filters are untouched.
    #[must_use]
    pub fn closed(&self) -> Self {
        let mut next = self.clone();
        next.open = false;
        next.stage = Stage::SelectKey;
        next.input_value.clear();
        next
    }

    /// Replace the autocomplete input text.
    #[must_use]
    pub fn with_input(&self, input: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.input_value = input.into();
        next
    }

    /// Handle selection of a filter key: snapshot that key's options from
    /// the current resource lists into a SelectItem stage, or move to a
    /// SelectValue stage for free-text keys. Clears the input text.
    ///
    /// When the backing resource list has not loaded yet the snapshot is
    /// empty and the popover shows no selectable items; reopening after the
    /// data arrives rebuilds the snapshot.
    #[must_use]
    pub fn key_selected(&self, key: K, resources: &ResourceCache) -> Self {
        let mut next = self.clone();
        next.input_value.clear();
        next.stage = match key.options(resources) {
            KeyOptions::Items(children) => Stage::SelectItem { key, children },
            KeyOptions::FreeText => Stage::SelectValue {
                key,
                value: String::new(),
            },
        };
        next
    }

    /// Commit a concrete value for the key chosen at the SelectItem stage.
    ///
    /// Fetch-or-creates the multi-select entry for the key and inserts
    /// `id -> label` (idempotent: reselecting an id only refreshes its
    /// label), then resets the stage and closes the popover. A no-op when
    /// the current stage is not SelectItem.
    #[must_use]
    pub fn item_selected(&self, id: &str, label: &str) -> Self {
        let key = match &self.stage {
            Stage::SelectItem { key, .. } => *key,
            _ => return self.clone(),
        };
        let mut next = self.clone();
        next.input_value.clear();
        next.open = false;
        next.stage = Stage::SelectKey;

        let mut map = match next.remove_entry(key) {
            Some(Filter::MultiSelect(map)) => map,
            _ => SelectionMap::new(),
        };
        map.insert(id, label);
        next.filters.push((key, Filter::MultiSelect(map)));
        next
    }

    /// Update the in-progress free-text value at the SelectValue stage.
    #[must_use]
    pub fn value_changed(&self, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let Stage::SelectValue { value: current, .. } = &mut next.stage {
            *current = value.into();
        }
        next
    }

    /// Commit the free-text value (Enter at the SelectValue stage):
    /// overwrites any prior filter for the key, resets the stage and closes
    /// the popover. A no-op when the current stage is not SelectValue.
    #[must_use]
    pub fn value_committed(&self) -> Self {
        let (key, value) = match &self.stage {
            Stage::SelectValue { key, value } => (*key, value.clone()),
            _ => return self.clone(),
        };
        let mut next = self.clone();
        next.input_value.clear();
        next.open = false;
        next.stage = Stage::SelectKey;
        next.remove_entry(key);
        next.filters.push((key, Filter::Value(value)));
        next
    }

    /// Remove the committed filter for `key`, if any. Idempotent; leaves the
    /// stage untouched.
    #[must_use]
    pub fn without_filter(&self, key: K) -> Self {
        let mut next = self.clone();
        next.remove_entry(key);
        next
    }

    /// Derive the selectable options for the current stage.
    pub fn commands(&self) -> Vec<FilterCommand<K>> {
        match &self.stage {
            Stage::SelectKey => K::all()
                .iter()
                .filter(|key| match &self.allowed_keys {
                    Some(allowed) => allowed.contains(key),
                    None => true,
                })
                .map(|key| FilterCommand::SelectKey {
                    key: *key,
                    disabled: false,
                })
                .collect(),
            Stage::SelectItem { children, .. } => children
                .iter()
                .cloned()
                .map(FilterCommand::SelectItem)
                .collect(),
            Stage::SelectValue { .. } => Vec::new(),
        }
    }

    /// Apply a selected command: keys move the stage forward, items commit.
    #[must_use]
    pub fn command_applied(&self, command: &FilterCommand<K>, resources: &ResourceCache) -> Self {
        match command {
            FilterCommand::SelectKey { key, .. } => self.key_selected(*key, resources),
            FilterCommand::SelectItem(item) => self.item_selected(&item.id, &item.label),
        }
    }

    pub fn filter(&self, key: K) -> Option<&Filter> {
        self.filters
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, filter)| filter)
    }

    /// Committed filters in insertion order.
    pub fn filters(&self) -> impl Iterator<Item = (K, &Filter)> {
        self.filters.iter().map(|(key, filter)| (*key, filter))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Concrete values committed for `key`, for query construction.
    pub fn filter_values(&self, key: K) -> Option<Vec<String>> {
        self.filter(key).and_then(Filter::values)
    }

    fn remove_entry(&mut self, key: K) -> Option<Filter> {
        let index = self
            .filters
            .iter()
            .position(|(existing, _)| *existing == key)?;
        Some(self.filters.remove(index).1)
    }
}
