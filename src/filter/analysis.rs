//! Analysis-chart filter instantiation: journeys, broadcasts, channels,
//! providers, message states, templates, and free-text user ids.
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::filter::state::{FilterKey, FilterState, ItemCommand, KeyOptions, Stage};
use crate::resources::{
    ChannelType, EmailProviderType, InternalEventType, NamedResource, ResourceCache,
};

/// Filterable dimensions of the analysis charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisFilterKey {
    JourneyIds,
    BroadcastIds,
    Channels,
    Providers,
    MessageStates,
    TemplateIds,
    UserIds,
}

fn resource_items(list: &[NamedResource]) -> Vec<ItemCommand> {
    list.iter()
        .map(|resource| ItemCommand::new(resource.id.clone(), resource.name.clone()))
        .collect()
}

impl FilterKey for AnalysisFilterKey {
    fn all() -> &'static [Self] {
        &[
            AnalysisFilterKey::JourneyIds,
            AnalysisFilterKey::BroadcastIds,
            AnalysisFilterKey::Channels,
            AnalysisFilterKey::Providers,
            AnalysisFilterKey::MessageStates,
            AnalysisFilterKey::TemplateIds,
            AnalysisFilterKey::UserIds,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            AnalysisFilterKey::JourneyIds => "Journey",
            AnalysisFilterKey::BroadcastIds => "Broadcast",
            AnalysisFilterKey::Channels => "Channel",
            AnalysisFilterKey::Providers => "Provider",
            AnalysisFilterKey::MessageStates => "Message Status",
            AnalysisFilterKey::TemplateIds => "Template",
            AnalysisFilterKey::UserIds => "User ID",
        }
    }

    fn options(&self, resources: &ResourceCache) -> KeyOptions {
        match self {
            AnalysisFilterKey::JourneyIds => KeyOptions::Items(resource_items(&resources.journeys)),
            AnalysisFilterKey::BroadcastIds => {
                KeyOptions::Items(resource_items(&resources.broadcasts))
            }
            AnalysisFilterKey::Channels => KeyOptions::Items(
                ChannelType::ALL
                    .iter()
                    .map(|channel| ItemCommand::new(channel.id(), channel.label()))
                    .collect(),
            ),
            AnalysisFilterKey::Providers => KeyOptions::Items(
                EmailProviderType::ALL
                    .iter()
                    .map(|provider| ItemCommand::new(provider.id(), provider.label()))
                    .collect(),
            ),
            AnalysisFilterKey::MessageStates => KeyOptions::Items(
                InternalEventType::ALL
                    .iter()
                    .map(|state| ItemCommand::new(state.id(), state.label()))
                    .collect(),
            ),
            AnalysisFilterKey::TemplateIds => {
                KeyOptions::Items(resource_items(&resources.message_templates))
            }
            AnalysisFilterKey::UserIds => KeyOptions::FreeText,
        }
    }
}

/// Host-injected analysis filters: fixed constraints supplied by the page
/// embedding the chart (e.g. a journey page pinning its own journey id).
/// Rendered as disabled chips; never deletable through the popover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisChartFilters {
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

impl AnalysisChartFilters {
    pub fn values(&self, key: AnalysisFilterKey) -> Option<&[String]> {
        let values = match key {
            AnalysisFilterKey::JourneyIds => &self.journey_ids,
            AnalysisFilterKey::BroadcastIds => &self.broadcast_ids,
            AnalysisFilterKey::Channels => &self.channels,
            AnalysisFilterKey::Providers => &self.providers,
            AnalysisFilterKey::MessageStates => &self.message_states,
            AnalysisFilterKey::TemplateIds => &self.template_ids,
            AnalysisFilterKey::UserIds => &self.user_ids,
        };
        values.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        AnalysisFilterKey::all()
            .iter()
            .all(|key| self.values(*key).is_none())
    }
}

/// Analysis filter builder: the generic state machine plus the page-level
/// configuration the host supplies (channel allow-list, hardcoded filters).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFilters {
    pub state: FilterState<AnalysisFilterKey>,
    allowed_channels: Option<Vec<ChannelType>>,
    hardcoded: AnalysisChartFilters,
}

impl Default for AnalysisFilters {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisFilters {
    pub fn new() -> Self {
        Self {
            state: FilterState::new(),
            allowed_channels: None,
            hardcoded: AnalysisChartFilters::default(),
        }
    }

    /// Restrict which filter keys the popover offers.
    pub fn with_allowed_keys(mut self, keys: Vec<AnalysisFilterKey>) -> Self {
        self.state = self.state.with_allowed_keys(keys);
        self
    }

    /// Restrict the channel enumeration offered under the Channel key.
    pub fn with_allowed_channels(mut self, channels: Vec<ChannelType>) -> Self {
        self.allowed_channels = Some(channels);
        self
    }

    /// Install host-injected filters shown as non-deletable chips.
    pub fn with_hardcoded(mut self, hardcoded: AnalysisChartFilters) -> Self {
        self.hardcoded = hardcoded;
        self
    }

    pub fn hardcoded(&self) -> &AnalysisChartFilters {
        &self.hardcoded
    }

    /// Key selection with the channel allow-list applied to the snapshotted
    /// children. Other keys behave exactly as the generic machine does.
    #[must_use]
    pub fn key_selected(&self, key: AnalysisFilterKey, resources: &ResourceCache) -> Self {
        let mut next = self.clone();
        next.state = self.state.key_selected(key, resources);
        if key == AnalysisFilterKey::Channels {
            if let Some(allowed) = &self.allowed_channels {
                if let Stage::SelectItem { children, .. } = &mut next.state.stage {
                    children.retain(|item| allowed.iter().any(|channel| channel.id() == item.id));
                }
            }
        }
        next
    }

    /// Resolve a committed or hardcoded id to a display name.
    pub fn resolve_id_to_name<'a>(
        key: AnalysisFilterKey,
        id: &'a str,
        resources: &'a ResourceCache,
    ) -> &'a str {
        match key {
            AnalysisFilterKey::JourneyIds => ResourceCache::resolve_name(&resources.journeys, id),
            AnalysisFilterKey::BroadcastIds => {
                ResourceCache::resolve_name(&resources.broadcasts, id)
            }
            AnalysisFilterKey::TemplateIds => {
                ResourceCache::resolve_name(&resources.message_templates, id)
            }
            AnalysisFilterKey::Channels
            | AnalysisFilterKey::Providers
            | AnalysisFilterKey::MessageStates
            | AnalysisFilterKey::UserIds => id,
        }
    }
}
