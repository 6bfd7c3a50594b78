//! Workspace resource snapshots: the already-fetched lists (journeys,
//! broadcasts, templates, segments, user properties, subscription groups)
//! that filter popovers draw their options from.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading a workspace snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A named resource as returned by the platform API: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedResource {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NamedResource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            updated_at: None,
        }
    }
}

/// In-memory cache of every resource list the filter builders read from.
///
/// These are read-only snapshots: a list refreshed after a popover stage was
/// built does not retroactively update that stage's options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceCache {
    pub journeys: Vec<NamedResource>,
    pub broadcasts: Vec<NamedResource>,
    pub message_templates: Vec<NamedResource>,
    pub segments: Vec<NamedResource>,
    pub user_properties: Vec<NamedResource>,
    pub subscription_groups: Vec<NamedResource>,
}

impl ResourceCache {
    /// Resolve a resource id to its display name within one list.
    /// Falls back to the id when the resource is unknown (e.g. deleted).
    pub fn resolve_name<'a>(list: &'a [NamedResource], id: &'a str) -> &'a str {
        list.iter()
            .find(|r| r.id == id)
            .map(|r| r.name.as_str())
            .unwrap_or(id)
    }
}

/// On-disk workspace snapshot: resource lists exported for offline browsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    #[serde(default)]
    pub workspace_name: String,
    #[serde(flatten)]
    pub resources: ResourceCache,
}

impl WorkspaceSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        let snapshot: WorkspaceSnapshot = serde_json::from_reader(BufReader::new(file))?;
        info!(
            "Loaded workspace snapshot '{}' from {}",
            snapshot.workspace_name,
            path.display()
        );
        Ok(snapshot)
    }

    /// Built-in demo fixtures used when no snapshot file is supplied.
    pub fn demo() -> Self {
        fn named(name: &str) -> NamedResource {
            NamedResource {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                updated_at: Some(Utc::now()),
            }
        }
        Self {
            workspace_name: "Demo Workspace".to_string(),
            resources: ResourceCache {
                journeys: vec![
                    named("Onboarding"),
                    named("Re-engagement"),
                    named("Churn Prevention"),
                ],
                broadcasts: vec![named("Spring Sale"), named("Product Launch")],
                message_templates: vec![
                    named("Welcome Email"),
                    named("Order Confirmation"),
                    named("Password Reset"),
                ],
                segments: vec![named("Power Users"), named("Trial Users")],
                user_properties: vec![named("plan"), named("language"), named("firstName")],
                subscription_groups: vec![named("Marketing Emails"), named("Product Updates")],
            },
        }
    }
}

/// Messaging channel a template is delivered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ChannelType {
    Email,
    Sms,
    MobilePush,
    Webhook,
}

impl ChannelType {
    pub const ALL: [ChannelType; 4] = [
        ChannelType::Email,
        ChannelType::Sms,
        ChannelType::MobilePush,
        ChannelType::Webhook,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ChannelType::Email => "Email",
            ChannelType::Sms => "Sms",
            ChannelType::MobilePush => "MobilePush",
            ChannelType::Webhook => "Webhook",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChannelType::Email => "Email",
            ChannelType::Sms => "SMS",
            ChannelType::MobilePush => "Mobile Push",
            ChannelType::Webhook => "Webhook",
        }
    }
}

/// Email delivery provider integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum EmailProviderType {
    SendGrid,
    AmazonSes,
    Postmark,
    Resend,
    Smtp,
    Gmail,
}

impl EmailProviderType {
    pub const ALL: [EmailProviderType; 6] = [
        EmailProviderType::SendGrid,
        EmailProviderType::AmazonSes,
        EmailProviderType::Postmark,
        EmailProviderType::Resend,
        EmailProviderType::Smtp,
        EmailProviderType::Gmail,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            EmailProviderType::SendGrid => "SendGrid",
            EmailProviderType::AmazonSes => "AmazonSes",
            EmailProviderType::Postmark => "Postmark",
            EmailProviderType::Resend => "Resend",
            EmailProviderType::Smtp => "Smtp",
            EmailProviderType::Gmail => "Gmail",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmailProviderType::SendGrid => "SendGrid",
            EmailProviderType::AmazonSes => "Amazon SES",
            EmailProviderType::Postmark => "Postmark",
            EmailProviderType::Resend => "Resend",
            EmailProviderType::Smtp => "SMTP",
            EmailProviderType::Gmail => "Gmail",
        }
    }
}

/// Internal message lifecycle events, used as the "Message Status" buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum InternalEventType {
    MessageSent,
    EmailBounced,
    EmailMarkedSpam,
    EmailOpened,
    EmailClicked,
    EmailDelivered,
    EmailDropped,
    SmsDelivered,
    SmsFailed,
}

impl InternalEventType {
    pub const ALL: [InternalEventType; 9] = [
        InternalEventType::MessageSent,
        InternalEventType::EmailBounced,
        InternalEventType::EmailMarkedSpam,
        InternalEventType::EmailOpened,
        InternalEventType::EmailClicked,
        InternalEventType::EmailDelivered,
        InternalEventType::EmailDropped,
        InternalEventType::SmsDelivered,
        InternalEventType::SmsFailed,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            InternalEventType::MessageSent => "DFInternalMessageSent",
            InternalEventType::EmailBounced => "DFEmailBounced",
            InternalEventType::EmailMarkedSpam => "DFEmailMarkedSpam",
            InternalEventType::EmailOpened => "DFEmailOpened",
            InternalEventType::EmailClicked => "DFEmailClicked",
            InternalEventType::EmailDelivered => "DFEmailDelivered",
            InternalEventType::EmailDropped => "DFEmailDropped",
            InternalEventType::SmsDelivered => "DFSmsDelivered",
            InternalEventType::SmsFailed => "DFSmsFailed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InternalEventType::MessageSent => "Sent",
            InternalEventType::EmailBounced => "Email Bounced",
            InternalEventType::EmailMarkedSpam => "Email Marked as Spam",
            InternalEventType::EmailOpened => "Email Opened",
            InternalEventType::EmailClicked => "Email Link Clicked",
            InternalEventType::EmailDelivered => "Email Delivered",
            InternalEventType::EmailDropped => "Email Dropped",
            InternalEventType::SmsDelivered => "Sms Delivered",
            InternalEventType::SmsFailed => "Sms Failed",
        }
    }
}

/// User event kinds as tracked by the ingestion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Track,
    Identify,
    Page,
    Screen,
    Group,
    Alias,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Track,
        EventType::Identify,
        EventType::Page,
        EventType::Screen,
        EventType::Group,
        EventType::Alias,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            EventType::Track => "track",
            EventType::Identify => "identify",
            EventType::Page => "page",
            EventType::Screen => "screen",
            EventType::Group => "group",
            EventType::Alias => "alias",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::Track => "Track",
            EventType::Identify => "Identify",
            EventType::Page => "Page",
            EventType::Screen => "Screen",
            EventType::Group => "Group",
            EventType::Alias => "Alias",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_roundtrip() {
        let snapshot = WorkspaceSnapshot::demo();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: WorkspaceSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn snapshot_accepts_partial_resource_lists() {
        let json = r#"{
            "workspaceName": "Minimal",
            "journeys": [{ "id": "j1", "name": "Onboarding" }]
        }"#;
        let snapshot: WorkspaceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.workspace_name, "Minimal");
        assert_eq!(snapshot.resources.journeys.len(), 1);
        assert!(snapshot.resources.broadcasts.is_empty());
    }

    #[test]
    fn resolve_name_falls_back_to_id() {
        let list = vec![NamedResource::new("j1", "Onboarding")];
        assert_eq!(ResourceCache::resolve_name(&list, "j1"), "Onboarding");
        assert_eq!(ResourceCache::resolve_name(&list, "missing"), "missing");
    }

    #[test]
    fn channel_labels_and_ids() {
        assert_eq!(ChannelType::MobilePush.label(), "Mobile Push");
        assert_eq!(ChannelType::MobilePush.id(), "MobilePush");
        assert_eq!(ChannelType::ALL.len(), 4);
    }
}
