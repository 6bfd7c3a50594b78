//! End-to-end filter flows: key events in, query parameters out.

use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;

use engagetui::action::Action;
use engagetui::components::{Component, Dashboard, DashboardView};
use engagetui::config::Config;
use engagetui::filter::users::{UserFilterState, UserFilterStore};
use engagetui::query::{AnalysisQuery, UsersQuery};
use engagetui::resources::WorkspaceSnapshot;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}

fn type_text(dashboard: &mut Dashboard, text: &str) {
    for c in text.chars() {
        dashboard.handle_key_event(key(KeyCode::Char(c))).unwrap();
    }
}

fn sample_dashboard() -> Dashboard {
    let snapshot =
        WorkspaceSnapshot::load(Path::new("sample-data/workspace-example.json")).unwrap();
    let mut dashboard = Dashboard::new(snapshot);
    let config: Config = json5::from_str(include_str!("../.config/config.json5")).unwrap();
    dashboard.register_config_handler(config).unwrap();
    dashboard
}

#[test]
fn sample_snapshot_loads() {
    let snapshot =
        WorkspaceSnapshot::load(Path::new("sample-data/workspace-example.json")).unwrap();
    assert_eq!(snapshot.workspace_name, "Acme Retail");
    assert_eq!(snapshot.resources.journeys.len(), 3);
    assert_eq!(snapshot.resources.segments.len(), 2);
}

#[test]
fn analysis_flow_from_keys_to_query() {
    let mut dashboard = sample_dashboard();

    // Journey filter: open popover, pick the Journey key, pick "Onboarding"
    dashboard.update(Action::OpenFilterPopover).unwrap();
    type_text(&mut dashboard, "journey");
    dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    type_text(&mut dashboard, "onboarding");
    let action = dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    assert_eq!(action, Some(Action::FiltersChanged));

    // Channel filter on top
    dashboard.update(Action::OpenFilterPopover).unwrap();
    type_text(&mut dashboard, "chan");
    dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    type_text(&mut dashboard, "sms");
    dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();

    let query = AnalysisQuery::from_filters(&dashboard.analysis.driver);
    assert_eq!(
        query.journey_ids,
        Some(vec!["9d3f7a1c-0b2e-4f5a-8c6d-1e2f3a4b5c6d".to_string()])
    );
    assert_eq!(query.channels, Some(vec!["Sms".to_string()]));
    assert_eq!(query.user_ids, None);
}

#[test]
fn user_events_free_text_flow() {
    let mut dashboard = sample_dashboard();
    dashboard.update(Action::NextView).unwrap();
    assert_eq!(dashboard.view, DashboardView::UserEvents);

    dashboard.update(Action::OpenFilterPopover).unwrap();
    type_text(&mut dashboard, "user id");
    dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    type_text(&mut dashboard, "u-1001");
    let action = dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    assert_eq!(action, Some(Action::FiltersChanged));

    let json = dashboard.query_preview();
    assert!(json.contains("\"userId\""));
    assert!(json.contains("u-1001"));
}

#[test]
fn users_flow_with_static_segment() {
    let static_id = "3c7e1b5f-9d2a-4b8e-a0c6-7f1d3b5e9a2c"; // Power Users
    let mut dashboard = sample_dashboard().with_users_store(UserFilterStore::new(
        UserFilterState::new().with_static_segments([static_id.to_string()]),
    ));
    dashboard.update(Action::PrevView).unwrap();
    assert_eq!(dashboard.view, DashboardView::Users);

    // Add the Trial Users segment through the popover
    dashboard.update(Action::OpenFilterPopover).unwrap();
    type_text(&mut dashboard, "segment");
    dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    type_text(&mut dashboard, "trial");
    let action = dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    assert_eq!(action, Some(Action::FiltersChanged));

    let query = UsersQuery::from_state(dashboard.users_store.borrow().state());
    assert_eq!(query.segment_ids.len(), 2);
    assert!(query
        .segment_ids
        .contains(&"0f4b8d2e-6a1c-4d7f-b9e5-2c6a8d0f4b7e".to_string()));
    assert!(query.segment_ids.contains(&static_id.to_string()));

    // The static segment cannot be deleted from the chip row
    dashboard.update(Action::DeleteSelectedChip).unwrap();
    let query = UsersQuery::from_state(dashboard.users_store.borrow().state());
    assert!(query.segment_ids.contains(&static_id.to_string()));
}

#[test]
fn escape_closes_without_committing() {
    let mut dashboard = sample_dashboard();
    dashboard.update(Action::OpenFilterPopover).unwrap();
    type_text(&mut dashboard, "broadcast");
    dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
    dashboard.handle_key_event(key(KeyCode::Esc)).unwrap();
    let action = dashboard.handle_key_event(key(KeyCode::Esc)).unwrap();
    assert_eq!(action, Some(Action::DialogClose));

    assert!(!dashboard.popover_open());
    assert_eq!(dashboard.query_preview(), "{}");
}
