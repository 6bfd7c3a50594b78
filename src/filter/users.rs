//! Users-table filter instantiation.
//!
//! This variant differs from the generic machine: values for one user
//! property accumulate as a set, segment and subscription-group membership
//! are id sets, and hosts can pin static segments/subscription-groups that
//! the user can neither add nor remove. State lives in an injected store so
//! several surfaces (chip row, popover, table) share one copy.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::Display;

/// The users popover's current step.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum UserFilterStage {
    /// Choosing between the property / segment / subscription-group branches.
    ComputedPropertyType,
    /// Choosing which user property to constrain.
    UserProperty,
    /// Entering a value for the chosen user property.
    UserPropertyValue { id: String, value: String },
    /// Choosing a segment.
    Segment,
    /// Choosing a subscription group.
    SubscriptionGroup,
}

/// Committed users-table filters plus the popover stage.
///
/// Static segments and subscription groups are host-pinned: they always
/// apply, are rendered as non-deletable chips, and add/remove requests
/// naming them are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilterState {
    user_properties: BTreeMap<String, BTreeSet<String>>,
    segments: BTreeSet<String>,
    static_segments: BTreeSet<String>,
    subscription_groups: BTreeSet<String>,
    static_subscription_groups: BTreeSet<String>,
    pub stage: Option<UserFilterStage>,
}

impl UserFilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static_segments(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.static_segments = ids.into_iter().collect();
        self
    }

    pub fn with_static_subscription_groups(
        mut self,
        ids: impl IntoIterator<Item = String>,
    ) -> Self {
        self.static_subscription_groups = ids.into_iter().collect();
        self
    }

    /// Replace the popover stage. `None` means the popover is closed.
    #[must_use]
    pub fn with_stage(&self, stage: Option<UserFilterStage>) -> Self {
        let mut next = self.clone();
        next.stage = stage;
        next
    }

    /// Update the in-progress value at the UserPropertyValue stage.
    #[must_use]
    pub fn value_changed(&self, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let Some(UserFilterStage::UserPropertyValue { value: current, .. }) = &mut next.stage {
            *current = value.into();
        }
        next
    }

    /// Commit the staged property value: adds it to the property's value set
    /// and closes the popover. A no-op outside the UserPropertyValue stage or
    /// when the staged value is empty.
    #[must_use]
    pub fn user_property_added(&self) -> Self {
        let (id, value) = match &self.stage {
            Some(UserFilterStage::UserPropertyValue { id, value }) if !value.is_empty() => {
                (id.clone(), value.clone())
            }
            _ => return self.clone(),
        };
        let mut next = self.clone();
        next.stage = None;
        next.user_properties.entry(id).or_default().insert(value);
        next
    }

    /// Add a segment filter. Refused outside the Segment stage and for
    /// host-pinned static segments.
    #[must_use]
    pub fn segment_added(&self, id: &str) -> Self {
        if !matches!(self.stage, Some(UserFilterStage::Segment)) {
            return self.clone();
        }
        if self.static_segments.contains(id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.stage = None;
        next.segments.insert(id.to_string());
        next
    }

    /// Add a subscription-group filter. Same guards as [`Self::segment_added`].
    #[must_use]
    pub fn subscription_group_added(&self, id: &str) -> Self {
        if !matches!(self.stage, Some(UserFilterStage::SubscriptionGroup)) {
            return self.clone();
        }
        if self.static_subscription_groups.contains(id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.stage = None;
        next.subscription_groups.insert(id.to_string());
        next
    }

    /// Drop every committed value for one user property. Idempotent.
    #[must_use]
    pub fn user_property_removed(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.user_properties.remove(id);
        next
    }

    /// Remove a segment filter. Static segments are refused.
    #[must_use]
    pub fn segment_removed(&self, id: &str) -> Self {
        if self.static_segments.contains(id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.segments.remove(id);
        next
    }

    /// Remove a subscription-group filter. Static groups are refused.
    #[must_use]
    pub fn subscription_group_removed(&self, id: &str) -> Self {
        if self.static_subscription_groups.contains(id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.subscription_groups.remove(id);
        next
    }

    pub fn user_properties(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.user_properties
    }

    pub fn segments(&self) -> &BTreeSet<String> {
        &self.segments
    }

    pub fn static_segments(&self) -> &BTreeSet<String> {
        &self.static_segments
    }

    pub fn subscription_groups(&self) -> &BTreeSet<String> {
        &self.subscription_groups
    }

    pub fn static_subscription_groups(&self) -> &BTreeSet<String> {
        &self.static_subscription_groups
    }

    /// User-committed and static segment ids combined, for query building.
    pub fn effective_segments(&self) -> BTreeSet<String> {
        self.segments.union(&self.static_segments).cloned().collect()
    }

    /// User-committed and static subscription-group ids combined.
    pub fn effective_subscription_groups(&self) -> BTreeSet<String> {
        self.subscription_groups
            .union(&self.static_subscription_groups)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.user_properties.is_empty()
            && self.segments.is_empty()
            && self.subscription_groups.is_empty()
    }

    /// Stable digest of the user-adjustable filters, used to key pagination
    /// resets. Stage and static entries are deliberately excluded: only a
    /// change to the committed set should invalidate a page cursor.
    pub fn filter_hash(&self) -> String {
        #[derive(Serialize)]
        struct Digest<'a> {
            user_properties: &'a BTreeMap<String, BTreeSet<String>>,
            segments: &'a BTreeSet<String>,
            subscription_groups: &'a BTreeSet<String>,
        }
        serde_json::to_string(&Digest {
            user_properties: &self.user_properties,
            segments: &self.segments,
            subscription_groups: &self.subscription_groups,
        })
        .unwrap_or_default()
    }
}

/// Shared, versioned container for [`UserFilterState`].
///
/// Observers compare versions instead of deep state; the version only moves
/// when a transition actually changed the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilterStore {
    state: UserFilterState,
    version: u64,
}

impl UserFilterStore {
    pub fn new(state: UserFilterState) -> Self {
        Self { state, version: 0 }
    }

    pub fn state(&self) -> &UserFilterState {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a copy-on-write transition, bumping the version only when the
    /// resulting state differs from the current one.
    pub fn update(&mut self, transition: impl FnOnce(&UserFilterState) -> UserFilterState) {
        let next = transition(&self.state);
        if next != self.state {
            self.state = next;
            self.version += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn property_stage(id: &str, value: &str) -> Option<UserFilterStage> {
        Some(UserFilterStage::UserPropertyValue {
            id: id.to_string(),
            value: value.to_string(),
        })
    }

    #[test]
    fn property_values_accumulate_as_a_set() {
        let state = UserFilterState::new()
            .with_stage(property_stage("plan", "pro"))
            .user_property_added()
            .with_stage(property_stage("plan", "enterprise"))
            .user_property_added()
            .with_stage(property_stage("plan", "pro"))
            .user_property_added();
        let values = state.user_properties().get("plan").unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.contains("pro") && values.contains("enterprise"));
    }

    #[test]
    fn segment_add_requires_segment_stage() {
        let state = UserFilterState::new();
        let after = state.segment_added("s1");
        assert_eq!(state, after);

        let committed = state
            .with_stage(Some(UserFilterStage::Segment))
            .segment_added("s1");
        assert!(committed.segments().contains("s1"));
        assert_eq!(committed.stage, None);
    }

    #[test]
    fn static_segments_are_refused_on_add_and_remove() {
        let state = UserFilterState::new()
            .with_static_segments(["locked".to_string()])
            .with_stage(Some(UserFilterStage::Segment));
        let after_add = state.segment_added("locked");
        assert!(after_add.segments().is_empty());

        let after_remove = state.segment_removed("locked");
        assert!(after_remove.static_segments().contains("locked"));
        assert!(after_remove.effective_segments().contains("locked"));
    }

    #[test]
    fn static_subscription_groups_are_refused() {
        let state = UserFilterState::new()
            .with_static_subscription_groups(["g-static".to_string()])
            .with_stage(Some(UserFilterStage::SubscriptionGroup));
        let after = state
            .subscription_group_added("g-static")
            .subscription_group_removed("g-static");
        assert!(after.subscription_groups().is_empty());
        assert!(after.effective_subscription_groups().contains("g-static"));
    }

    #[test]
    fn remove_is_idempotent() {
        let state = UserFilterState::new()
            .with_stage(Some(UserFilterStage::Segment))
            .segment_added("s1");
        let once = state.segment_removed("s1");
        let twice = once.segment_removed("s1");
        assert_eq!(once, twice);
        assert!(once.segments().is_empty());
    }

    #[test]
    fn filter_hash_ignores_stage_and_static_entries() {
        let base = UserFilterState::new()
            .with_stage(Some(UserFilterStage::Segment))
            .segment_added("s1");
        let with_stage = base.with_stage(Some(UserFilterStage::UserProperty));
        let with_static = base.clone().with_static_segments(["locked".to_string()]);
        assert_eq!(base.filter_hash(), with_stage.filter_hash());
        assert_eq!(base.filter_hash(), with_static.filter_hash());

        let changed = base.segment_removed("s1");
        assert_ne!(base.filter_hash(), changed.filter_hash());
    }

    #[test]
    fn store_version_bumps_only_on_change() {
        let mut store = UserFilterStore::new(UserFilterState::new());
        assert_eq!(store.version(), 0);

        store.update(|state| state.with_stage(Some(UserFilterStage::Segment)));
        assert_eq!(store.version(), 1);

        store.update(|state| state.segment_added("s1"));
        assert_eq!(store.version(), 2);

        // Re-adding the same segment and removing an unknown one are no-ops.
        store.update(|state| state.segment_added("s1"));
        store.update(|state| state.segment_removed("unknown"));
        assert_eq!(store.version(), 2);
    }
}
