//! Translation of committed filter state into outbound query parameters.
//!
//! These structs mirror the platform API's camelCase request bodies; the
//! dashboard renders them as a JSON preview pane.
use serde::{Deserialize, Serialize};

use crate::filter::analysis::{AnalysisFilterKey, AnalysisFilters};
use crate::filter::user_events::{UserEventsFilterKey, UserEventsFilterState};
use crate::filter::users::UserFilterState;

/// Query parameters for the analysis charts endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journey_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_states: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
}

impl AnalysisQuery {
    /// Union committed and host-injected values per key, preserving committed
    /// order and skipping duplicates.
    pub fn from_filters(filters: &AnalysisFilters) -> Self {
        let field = |key: AnalysisFilterKey| -> Option<Vec<String>> {
            let mut values = filters.state.filter_values(key).unwrap_or_default();
            if let Some(hardcoded) = filters.hardcoded().values(key) {
                for value in hardcoded {
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }
            }
            if values.is_empty() {
                None
            } else {
                Some(values)
            }
        };
        Self {
            journey_ids: field(AnalysisFilterKey::JourneyIds),
            broadcast_ids: field(AnalysisFilterKey::BroadcastIds),
            channels: field(AnalysisFilterKey::Channels),
            providers: field(AnalysisFilterKey::Providers),
            message_states: field(AnalysisFilterKey::MessageStates),
            template_ids: field(AnalysisFilterKey::TemplateIds),
            user_ids: field(AnalysisFilterKey::UserIds),
        }
    }
}

/// Query parameters for the user-events table endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserEventsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journey_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Vec<String>>,
}

impl UserEventsQuery {
    pub fn from_state(state: &UserEventsFilterState) -> Self {
        Self {
            event: state.filter_values(UserEventsFilterKey::Event),
            broadcast_id: state.filter_values(UserEventsFilterKey::BroadcastId),
            journey_id: state.filter_values(UserEventsFilterKey::JourneyId),
            event_type: state.filter_values(UserEventsFilterKey::EventType),
            message_id: state.filter_values(UserEventsFilterKey::MessageId),
            user_id: state.filter_values(UserEventsFilterKey::UserId),
        }
    }
}

/// One user-property constraint: property id plus its accepted values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPropertyConstraint {
    pub id: String,
    pub values: Vec<String>,
}

/// Query parameters for the users table endpoint. Static constraints are
/// folded in here: the API sees one flat filter set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsersQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segment_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subscription_group_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_property_filters: Vec<UserPropertyConstraint>,
}

impl UsersQuery {
    pub fn from_state(state: &UserFilterState) -> Self {
        Self {
            segment_ids: state.effective_segments().into_iter().collect(),
            subscription_group_ids: state.effective_subscription_groups().into_iter().collect(),
            user_property_filters: state
                .user_properties()
                .iter()
                .map(|(id, values)| UserPropertyConstraint {
                    id: id.clone(),
                    values: values.iter().cloned().collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::analysis::AnalysisChartFilters;
    use crate::filter::users::UserFilterStage;
    use crate::resources::ResourceCache;
    use pretty_assertions::assert_eq;

    #[test]
    fn multi_select_filter_serializes_to_id_array() {
        let filters = AnalysisFilters::new()
            .key_selected(AnalysisFilterKey::Channels, &ResourceCache::default());
        let mut filters = filters;
        filters.state = filters.state.item_selected("Email", "Email");
        let query = AnalysisQuery::from_filters(&filters);
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"channels":["Email"]}"#);
    }

    #[test]
    fn hardcoded_filters_are_unioned_without_duplicates() {
        let hardcoded = AnalysisChartFilters {
            journey_ids: Some(vec!["j1".to_string(), "j2".to_string()]),
            ..AnalysisChartFilters::default()
        };
        let mut filters = AnalysisFilters::new().with_hardcoded(hardcoded);
        let resources = ResourceCache::default();
        filters = filters.key_selected(AnalysisFilterKey::JourneyIds, &resources);
        // Committed by hand since the unloaded journey list has no options.
        filters.state = filters
            .state
            .with_stage(crate::filter::state::Stage::SelectItem {
                key: AnalysisFilterKey::JourneyIds,
                children: vec![crate::filter::state::ItemCommand::new("j1", "Onboarding")],
            })
            .item_selected("j1", "Onboarding");

        let query = AnalysisQuery::from_filters(&filters);
        assert_eq!(
            query.journey_ids,
            Some(vec!["j1".to_string(), "j2".to_string()])
        );
    }

    #[test]
    fn scalar_filter_becomes_singleton_array() {
        let state = UserEventsFilterState::new()
            .opened()
            .key_selected(UserEventsFilterKey::UserId, &ResourceCache::default())
            .value_changed("u-123")
            .value_committed();
        let query = UserEventsQuery::from_state(&state);
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"userId":["u-123"]}"#);
    }

    #[test]
    fn users_query_folds_static_constraints_in() {
        let state = UserFilterState::new()
            .with_static_segments(["locked".to_string()])
            .with_stage(Some(UserFilterStage::Segment))
            .segment_added("s1")
            .with_stage(Some(UserFilterStage::UserPropertyValue {
                id: "plan".to_string(),
                value: "pro".to_string(),
            }))
            .user_property_added();
        let query = UsersQuery::from_state(&state);
        assert_eq!(query.segment_ids, vec!["locked", "s1"]);
        assert_eq!(
            query.user_property_filters,
            vec![UserPropertyConstraint {
                id: "plan".to_string(),
                values: vec!["pro".to_string()],
            }]
        );
    }
}
