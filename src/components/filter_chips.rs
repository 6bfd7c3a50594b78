//! Chip row summarizing committed filters, with keyboard selection.
//!
//! Static/host-injected filters render dimmed and are skipped by deletion;
//! everything else maps back to a removal target in its filter state.
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::config::{Config, Mode};
use crate::filter::analysis::{AnalysisFilterKey, AnalysisFilters};
use crate::filter::state::FilterKey as _;
use crate::filter::user_events::{UserEventsFilterKey, UserEventsFilterState};
use crate::filter::users::UserFilterState;
use crate::resources::ResourceCache;

/// What deleting a chip should remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChipTarget {
    Analysis(AnalysisFilterKey),
    UserEvents(UserEventsFilterKey),
    UserProperty(String),
    Segment(String),
    SubscriptionGroup(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    pub label: String,
    /// `None` for static/host-injected chips, which cannot be deleted.
    pub target: Option<ChipTarget>,
}

impl FilterChip {
    pub fn deletable(&self) -> bool {
        self.target.is_some()
    }
}

/// Selectable chip row.
#[derive(Debug, Clone, Default)]
pub struct FilterChips {
    chips: Vec<FilterChip>,
    selected: usize,
    config: Config,
}

impl FilterChips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Replace the chip list, clamping the selection.
    pub fn set_chips(&mut self, chips: Vec<FilterChip>) {
        self.chips = chips;
        if self.selected >= self.chips.len() {
            self.selected = self.chips.len().saturating_sub(1);
        }
    }

    pub fn chips(&self) -> &[FilterChip] {
        &self.chips
    }

    pub fn selected_chip(&self) -> Option<&FilterChip> {
        self.chips.get(self.selected)
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.chips.len() {
            self.selected += 1;
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let styles = self.config.styles.get(&Mode::Dashboard);
        let style_for = |key: &str, fallback: Style| {
            styles
                .and_then(|map| map.get(key))
                .copied()
                .unwrap_or(fallback)
        };
        let chip_style = style_for("chip", Style::default());
        let selected_style = style_for("chip_selected", Style::default().reversed());
        let static_style = style_for("chip_static", Style::default().dim());

        let mut spans: Vec<Span> = Vec::new();
        if self.chips.is_empty() {
            spans.push(Span::styled("(no filters)", static_style));
        }
        for (index, chip) in self.chips.iter().enumerate() {
            let style = if index == self.selected {
                selected_style
            } else if chip.deletable() {
                chip_style
            } else {
                static_style
            };
            spans.push(Span::styled(format!(" {} ", chip.label), style));
            spans.push(Span::raw(" "));
        }
        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Filters"));
        frame.render_widget(paragraph, area);
    }
}

/// Chips for the analysis view: host-injected filters first, dimmed, then the
/// committed set in insertion order.
pub fn analysis_chips(filters: &AnalysisFilters, resources: &ResourceCache) -> Vec<FilterChip> {
    let mut chips = Vec::new();
    for key in AnalysisFilterKey::all() {
        if let Some(values) = filters.hardcoded().values(*key) {
            let names: Vec<&str> = values
                .iter()
                .map(|id| AnalysisFilters::resolve_id_to_name(*key, id, resources))
                .collect();
            chips.push(FilterChip {
                label: format!("{} = {}", key.label(), names.join(" OR ")),
                target: None,
            });
        }
    }
    for (key, filter) in filters.state.filters() {
        chips.push(FilterChip {
            label: format!("{} = {}", key.label(), filter.summary()),
            target: Some(ChipTarget::Analysis(key)),
        });
    }
    chips
}

pub fn user_events_chips(state: &UserEventsFilterState) -> Vec<FilterChip> {
    state
        .filters()
        .map(|(key, filter)| FilterChip {
            label: format!("{} = {}", key.label(), filter.summary()),
            target: Some(ChipTarget::UserEvents(key)),
        })
        .collect()
}

/// Chips for the users view: static segments/groups first, dimmed.
pub fn users_chips(state: &UserFilterState, resources: &ResourceCache) -> Vec<FilterChip> {
    let mut chips = Vec::new();
    for id in state.static_segments() {
        chips.push(FilterChip {
            label: format!(
                "Segment = {}",
                ResourceCache::resolve_name(&resources.segments, id)
            ),
            target: None,
        });
    }
    for id in state.static_subscription_groups() {
        chips.push(FilterChip {
            label: format!(
                "Subscribed to {}",
                ResourceCache::resolve_name(&resources.subscription_groups, id)
            ),
            target: None,
        });
    }
    for id in state.segments() {
        chips.push(FilterChip {
            label: format!(
                "Segment = {}",
                ResourceCache::resolve_name(&resources.segments, id)
            ),
            target: Some(ChipTarget::Segment(id.clone())),
        });
    }
    for id in state.subscription_groups() {
        chips.push(FilterChip {
            label: format!(
                "Subscribed to {}",
                ResourceCache::resolve_name(&resources.subscription_groups, id)
            ),
            target: Some(ChipTarget::SubscriptionGroup(id.clone())),
        });
    }
    for (id, values) in state.user_properties() {
        let property = ResourceCache::resolve_name(&resources.user_properties, id);
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        chips.push(FilterChip {
            label: format!("{} = {}", property, values.join(" OR ")),
            target: Some(ChipTarget::UserProperty(id.clone())),
        });
    }
    chips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::analysis::AnalysisChartFilters;
    use crate::filter::users::UserFilterStage;
    use crate::resources::NamedResource;
    use pretty_assertions::assert_eq;

    #[test]
    fn hardcoded_chips_come_first_and_are_not_deletable() {
        let resources = ResourceCache {
            journeys: vec![NamedResource::new("j1", "Onboarding")],
            ..ResourceCache::default()
        };
        let mut filters = AnalysisFilters::new().with_hardcoded(AnalysisChartFilters {
            journey_ids: Some(vec!["j1".to_string()]),
            ..AnalysisChartFilters::default()
        });
        filters = filters.key_selected(AnalysisFilterKey::Channels, &resources);
        filters.state = filters.state.item_selected("Email", "Email");

        let chips = analysis_chips(&filters, &resources);
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].label, "Journey = Onboarding");
        assert!(!chips[0].deletable());
        assert_eq!(chips[1].label, "Channel = Email");
        assert_eq!(chips[1].target, Some(ChipTarget::Analysis(AnalysisFilterKey::Channels)));
    }

    #[test]
    fn multi_value_chip_joins_labels_with_or() {
        let resources = ResourceCache::default();
        let mut state = UserEventsFilterState::new();
        for (id, label) in [("Email", "Email"), ("Sms", "SMS")] {
            state = state
                .key_selected(UserEventsFilterKey::EventType, &resources)
                .item_selected(id, label);
        }
        // EventType chip reflects both committed values.
        let chips = user_events_chips(&state);
        assert_eq!(chips[0].label, "Event Type = Email OR SMS");
    }

    #[test]
    fn static_user_chips_resolve_names_and_refuse_deletion() {
        let resources = ResourceCache {
            segments: vec![NamedResource::new("locked", "Power Users")],
            ..ResourceCache::default()
        };
        let state = UserFilterState::new()
            .with_static_segments(["locked".to_string()])
            .with_stage(Some(UserFilterStage::Segment))
            .segment_added("s-unknown");
        let chips = users_chips(&state, &resources);
        assert_eq!(chips[0].label, "Segment = Power Users");
        assert!(!chips[0].deletable());
        assert_eq!(chips[1].target, Some(ChipTarget::Segment("s-unknown".to_string())));
    }

    #[test]
    fn selection_clamps_when_chips_shrink() {
        let mut row = FilterChips::new();
        row.set_chips(vec![
            FilterChip { label: "a".to_string(), target: Some(ChipTarget::Segment("a".to_string())) },
            FilterChip { label: "b".to_string(), target: Some(ChipTarget::Segment("b".to_string())) },
        ]);
        row.select_next();
        assert_eq!(row.selected_chip().unwrap().label, "b");
        row.set_chips(vec![FilterChip {
            label: "a".to_string(),
            target: Some(ChipTarget::Segment("a".to_string())),
        }]);
        assert_eq!(row.selected_chip().unwrap().label, "a");
    }
}
