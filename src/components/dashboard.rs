//! Dashboard: tabbed container for the three filterable views, the chip row,
//! the query preview pane, and the popover overlay.

use std::cell::RefCell;
use std::rc::Rc;

use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::action::Action;
use crate::components::filter_chips::{
    analysis_chips, user_events_chips, users_chips, ChipTarget, FilterChips,
};
use crate::components::Component;
use crate::config::{Config, Mode};
use crate::dialog::filter_popover::FilterPopover;
use crate::dialog::users_filter_popover::UsersFilterPopover;
use crate::filter::analysis::AnalysisFilters;
use crate::filter::user_events::UserEventsFilterState;
use crate::filter::users::UserFilterStore;
use crate::query::{AnalysisQuery, UserEventsQuery, UsersQuery};
use crate::resources::WorkspaceSnapshot;
use crate::tui::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Analysis,
    UserEvents,
    Users,
}

impl DashboardView {
    const ALL: [DashboardView; 3] = [
        DashboardView::Analysis,
        DashboardView::UserEvents,
        DashboardView::Users,
    ];

    fn title(&self) -> &'static str {
        match self {
            DashboardView::Analysis => "Analysis",
            DashboardView::UserEvents => "User Events",
            DashboardView::Users => "Users",
        }
    }
}

pub struct Dashboard {
    pub view: DashboardView,
    pub analysis: FilterPopover<AnalysisFilters>,
    pub user_events: FilterPopover<UserEventsFilterState>,
    pub users_store: Rc<RefCell<UserFilterStore>>,
    pub users_popover: UsersFilterPopover,
    chips: FilterChips,
    snapshot: WorkspaceSnapshot,
    config: Config,
    action_tx: Option<UnboundedSender<Action>>,
}

impl Dashboard {
    pub fn new(snapshot: WorkspaceSnapshot) -> Self {
        let users_store = Rc::new(RefCell::new(UserFilterStore::default()));
        let mut dashboard = Self {
            view: DashboardView::Analysis,
            analysis: FilterPopover::new(AnalysisFilters::new()),
            user_events: FilterPopover::new(UserEventsFilterState::new()),
            users_popover: UsersFilterPopover::new(Rc::clone(&users_store)),
            users_store,
            chips: FilterChips::new(),
            snapshot,
            config: Config::default(),
            action_tx: None,
        };
        dashboard.refresh_chips();
        dashboard
    }

    /// Replace the users store, e.g. to seed static segments.
    pub fn with_users_store(mut self, store: UserFilterStore) -> Self {
        self.users_store = Rc::new(RefCell::new(store));
        self.users_popover = UsersFilterPopover::new(Rc::clone(&self.users_store));
        self.users_popover.config = self.config.clone();
        self.refresh_chips();
        self
    }

    pub fn popover_open(&self) -> bool {
        match self.view {
            DashboardView::Analysis => self.analysis.is_open(),
            DashboardView::UserEvents => self.user_events.is_open(),
            DashboardView::Users => self.users_popover.is_open(),
        }
    }

    fn refresh_chips(&mut self) {
        let chips = match self.view {
            DashboardView::Analysis => {
                analysis_chips(&self.analysis.driver, &self.snapshot.resources)
            }
            DashboardView::UserEvents => user_events_chips(&self.user_events.driver),
            DashboardView::Users => {
                users_chips(self.users_store.borrow().state(), &self.snapshot.resources)
            }
        };
        self.chips.set_chips(chips);
    }

    /// JSON body the active view would send, rendered in the preview pane.
    pub fn query_preview(&self) -> String {
        let json = match self.view {
            DashboardView::Analysis => {
                serde_json::to_string_pretty(&AnalysisQuery::from_filters(&self.analysis.driver))
            }
            DashboardView::UserEvents => {
                serde_json::to_string_pretty(&UserEventsQuery::from_state(&self.user_events.driver))
            }
            DashboardView::Users => serde_json::to_string_pretty(&UsersQuery::from_state(
                self.users_store.borrow().state(),
            )),
        };
        json.unwrap_or_else(|e| format!("<serialization error: {e}>"))
    }

    fn switch_view(&mut self, forward: bool) {
        let index = DashboardView::ALL
            .iter()
            .position(|view| *view == self.view)
            .unwrap_or(0);
        let len = DashboardView::ALL.len();
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        self.view = DashboardView::ALL[next];
        self.refresh_chips();
    }

    fn open_popover(&mut self) {
        match self.view {
            DashboardView::Analysis => self.analysis.open(),
            DashboardView::UserEvents => self.user_events.open(),
            DashboardView::Users => self.users_popover.open(),
        }
    }

    fn delete_selected_chip(&mut self) {
        let Some(chip) = self.chips.selected_chip() else {
            return;
        };
        let Some(target) = chip.target.clone() else {
            debug!("Ignoring delete on static chip '{}'", chip.label);
            return;
        };
        match target {
            ChipTarget::Analysis(key) => {
                let state = self.analysis.driver.state.without_filter(key);
                self.analysis.driver.state = state;
            }
            ChipTarget::UserEvents(key) => {
                self.user_events.driver = self.user_events.driver.without_filter(key);
            }
            ChipTarget::UserProperty(id) => {
                self.users_store
                    .borrow_mut()
                    .update(|state| state.user_property_removed(&id));
            }
            ChipTarget::Segment(id) => {
                self.users_store
                    .borrow_mut()
                    .update(|state| state.segment_removed(&id));
            }
            ChipTarget::SubscriptionGroup(id) => {
                self.users_store
                    .borrow_mut()
                    .update(|state| state.subscription_group_removed(&id));
            }
        }
        self.refresh_chips();
    }
}

impl Component for Dashboard {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(tx);
        Ok(())
    }

    fn register_config_handler(&mut self, config: Config) -> Result<()> {
        self.analysis.config = config.clone();
        self.user_events.config = config.clone();
        self.users_popover.config = config.clone();
        self.chips.set_config(config.clone());
        self.config = config;
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // An open popover consumes keys first
        if self.popover_open() {
            let action = match self.view {
                DashboardView::Analysis => {
                    self.analysis.handle_key_event(key, &self.snapshot.resources)?
                }
                DashboardView::UserEvents => self
                    .user_events
                    .handle_key_event(key, &self.snapshot.resources)?,
                DashboardView::Users => self
                    .users_popover
                    .handle_key_event(key, &self.snapshot.resources)?,
            };
            if matches!(action, Some(Action::FiltersChanged)) {
                self.refresh_chips();
            }
            return Ok(action);
        }
        Ok(self.config.action_for_key(Mode::Dashboard, key))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::NextView => self.switch_view(true),
            Action::PrevView => self.switch_view(false),
            Action::OpenFilterPopover => self.open_popover(),
            Action::PrevChip => self.chips.select_prev(),
            Action::NextChip => self.chips.select_next(),
            Action::DeleteSelectedChip => {
                self.delete_selected_chip();
                return Ok(Some(Action::FiltersChanged));
            }
            Action::FiltersChanged => self.refresh_chips(),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

        let styles = self.config.styles.get(&Mode::Dashboard);
        let style_for = |key: &str, fallback: Style| {
            styles
                .and_then(|map| map.get(key))
                .copied()
                .unwrap_or(fallback)
        };

        let titles: Vec<&str> = DashboardView::ALL.iter().map(|view| view.title()).collect();
        let selected = DashboardView::ALL
            .iter()
            .position(|view| *view == self.view)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .style(style_for("tab_inactive", Style::default().dim()))
            .highlight_style(style_for("tab_active", Style::default().bold()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.snapshot.workspace_name.clone()),
            );
        frame.render_widget(tabs, chunks[0]);

        self.chips.render(frame, chunks[1]);

        let preview = Paragraph::new(self.query_preview())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(style_for("preview_border", Style::default()))
                    .title("Query"),
            );
        frame.render_widget(preview, chunks[2]);

        match self.view {
            DashboardView::Analysis => self.analysis.draw(frame, area),
            DashboardView::UserEvents => self.user_events.draw(frame, area),
            DashboardView::Users => self.users_popover.draw(frame, area, &self.snapshot.resources),
        }
        Ok(())
    }

    fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
        match event {
            Some(Event::Key(key_event)) => self.handle_key_event(key_event),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::users::{UserFilterStage, UserFilterState};
    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;

    fn dashboard() -> Dashboard {
        let mut dashboard = Dashboard::new(WorkspaceSnapshot::demo());
        let config: Config =
            json5::from_str(include_str!("../../.config/config.json5")).unwrap();
        dashboard.register_config_handler(config).unwrap();
        dashboard
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn tab_cycles_through_all_views() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.view, DashboardView::Analysis);
        dashboard.update(Action::NextView).unwrap();
        assert_eq!(dashboard.view, DashboardView::UserEvents);
        dashboard.update(Action::NextView).unwrap();
        assert_eq!(dashboard.view, DashboardView::Users);
        dashboard.update(Action::NextView).unwrap();
        assert_eq!(dashboard.view, DashboardView::Analysis);
        dashboard.update(Action::PrevView).unwrap();
        assert_eq!(dashboard.view, DashboardView::Users);
    }

    #[test]
    fn open_filter_popover_targets_the_active_view() {
        let mut dashboard = dashboard();
        dashboard.update(Action::OpenFilterPopover).unwrap();
        assert!(dashboard.analysis.is_open());
        assert!(!dashboard.user_events.is_open());
    }

    #[test]
    fn committed_filter_appears_as_chip_and_in_preview() {
        let mut dashboard = dashboard();
        dashboard.update(Action::OpenFilterPopover).unwrap();
        // Channel is the third key command
        for c in "chan".chars() {
            dashboard.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
        dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
        let action = dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(action, Some(Action::FiltersChanged));

        assert_eq!(dashboard.chips.chips().len(), 1);
        assert_eq!(dashboard.chips.chips()[0].label, "Channel = Email");
        assert!(dashboard.query_preview().contains("\"channels\""));
    }

    #[test]
    fn delete_selected_chip_removes_the_filter() {
        let mut dashboard = dashboard();
        dashboard.update(Action::OpenFilterPopover).unwrap();
        for c in "chan".chars() {
            dashboard.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
        dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
        dashboard.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(dashboard.chips.chips().len(), 1);

        dashboard.update(Action::DeleteSelectedChip).unwrap();
        assert!(dashboard.chips.chips().is_empty());
        assert!(dashboard.analysis.driver.state.is_empty());
    }

    #[test]
    fn static_chip_survives_delete() {
        let mut dashboard = dashboard().with_users_store(UserFilterStore::new(
            UserFilterState::new().with_static_segments(["locked".to_string()]),
        ));
        dashboard.update(Action::NextView).unwrap();
        dashboard.update(Action::NextView).unwrap();
        assert_eq!(dashboard.view, DashboardView::Users);
        assert_eq!(dashboard.chips.chips().len(), 1);
        assert!(!dashboard.chips.chips()[0].deletable());

        dashboard.update(Action::DeleteSelectedChip).unwrap();
        assert_eq!(dashboard.chips.chips().len(), 1);
        assert!(dashboard
            .query_preview()
            .contains("\"segmentIds\""));
    }

    #[test]
    fn users_view_routes_keys_to_the_shared_store() {
        let mut dashboard = dashboard();
        dashboard.update(Action::NextView).unwrap();
        dashboard.update(Action::NextView).unwrap();
        dashboard.update(Action::OpenFilterPopover).unwrap();
        assert_eq!(
            dashboard.users_store.borrow().state().stage,
            Some(UserFilterStage::ComputedPropertyType)
        );
        assert!(dashboard.popover_open());
    }
}
