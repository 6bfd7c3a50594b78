//! User-events table filter instantiation.
//!
//! Most keys here are free text (event names, message ids, user ids come from
//! arbitrary ingest payloads); the event-type key is a fixed enumeration and
//! the broadcast/journey keys read the workspace resource lists.
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::filter::state::{FilterKey, FilterState, ItemCommand, KeyOptions};
use crate::resources::{EventType, NamedResource, ResourceCache};

/// Filterable dimensions of the user-events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserEventsFilterKey {
    Event,
    BroadcastId,
    JourneyId,
    EventType,
    MessageId,
    UserId,
}

fn resource_items(list: &[NamedResource]) -> Vec<ItemCommand> {
    list.iter()
        .map(|resource| ItemCommand::new(resource.id.clone(), resource.name.clone()))
        .collect()
}

impl FilterKey for UserEventsFilterKey {
    fn all() -> &'static [Self] {
        &[
            UserEventsFilterKey::Event,
            UserEventsFilterKey::BroadcastId,
            UserEventsFilterKey::JourneyId,
            UserEventsFilterKey::EventType,
            UserEventsFilterKey::MessageId,
            UserEventsFilterKey::UserId,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            UserEventsFilterKey::Event => "Event Name",
            UserEventsFilterKey::BroadcastId => "Broadcast",
            UserEventsFilterKey::JourneyId => "Journey",
            UserEventsFilterKey::EventType => "Event Type",
            UserEventsFilterKey::MessageId => "Message ID",
            UserEventsFilterKey::UserId => "User ID",
        }
    }

    fn options(&self, resources: &ResourceCache) -> KeyOptions {
        match self {
            UserEventsFilterKey::Event
            | UserEventsFilterKey::MessageId
            | UserEventsFilterKey::UserId => KeyOptions::FreeText,
            UserEventsFilterKey::EventType => KeyOptions::Items(
                EventType::ALL
                    .iter()
                    .map(|event_type| ItemCommand::new(event_type.id(), event_type.label()))
                    .collect(),
            ),
            UserEventsFilterKey::BroadcastId => {
                KeyOptions::Items(resource_items(&resources.broadcasts))
            }
            UserEventsFilterKey::JourneyId => KeyOptions::Items(resource_items(&resources.journeys)),
        }
    }
}

/// The user-events table uses the generic machine with no extra page config.
pub type UserEventsFilterState = FilterState<UserEventsFilterKey>;
