//! UsersFilterPopover: popup dialog for the users view.
//!
//! Unlike the generic popover this one drives the branch-first flow (property
//! / segment / subscription group) and writes through a shared store so the
//! chip row and table react to the same state.

use std::cell::RefCell;
use std::rc::Rc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::action::Action;
use crate::components::dialog_layout::split_dialog_area;
use crate::config::{Config, Mode};
use crate::filter::state::ItemCommand;
use crate::filter::users::{UserFilterStage, UserFilterStore};
use crate::resources::ResourceCache;

/// Branch options offered at the first stage.
const BRANCHES: [(&str, UserFilterStage); 3] = [
    ("User Property", UserFilterStage::UserProperty),
    ("Segment", UserFilterStage::Segment),
    ("Subscription Group", UserFilterStage::SubscriptionGroup),
];

#[derive(Debug, Clone)]
pub struct UsersFilterPopover {
    pub store: Rc<RefCell<UserFilterStore>>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub input: String,
    pub show_instructions: bool,
    pub config: Config,
}

impl UsersFilterPopover {
    pub fn new(store: Rc<RefCell<UserFilterStore>>) -> Self {
        Self {
            store,
            selected: 0,
            scroll_offset: 0,
            input: String::new(),
            show_instructions: true,
            config: Config::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.store.borrow().state().stage.is_some()
    }

    pub fn open(&mut self) {
        self.store.borrow_mut().update(|state| {
            state.with_stage(Some(UserFilterStage::ComputedPropertyType))
        });
        self.reset_cursor();
    }

    fn close(&mut self) {
        self.store.borrow_mut().update(|state| state.with_stage(None));
        self.reset_cursor();
    }

    fn reset_cursor(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
        self.input.clear();
    }

    fn stage(&self) -> Option<UserFilterStage> {
        self.store.borrow().state().stage.clone()
    }

    /// Options for the current stage. Static segments and subscription groups
    /// appear disabled rather than disappearing, so the pinned constraint
    /// stays visible.
    pub fn options(&self, resources: &ResourceCache) -> Vec<ItemCommand> {
        let store = self.store.borrow();
        let state = store.state();
        match &state.stage {
            Some(UserFilterStage::ComputedPropertyType) => BRANCHES
                .iter()
                .map(|(label, _)| ItemCommand::new(*label, *label))
                .collect(),
            Some(UserFilterStage::UserProperty) => resources
                .user_properties
                .iter()
                .map(|property| ItemCommand::new(property.id.clone(), property.name.clone()))
                .collect(),
            Some(UserFilterStage::Segment) => resources
                .segments
                .iter()
                .map(|segment| {
                    let mut item = ItemCommand::new(segment.id.clone(), segment.name.clone());
                    item.disabled = state.static_segments().contains(&segment.id);
                    item
                })
                .collect(),
            Some(UserFilterStage::SubscriptionGroup) => resources
                .subscription_groups
                .iter()
                .map(|group| {
                    let mut item = ItemCommand::new(group.id.clone(), group.name.clone());
                    item.disabled = state.static_subscription_groups().contains(&group.id);
                    item
                })
                .collect(),
            Some(UserFilterStage::UserPropertyValue { .. }) | None => Vec::new(),
        }
    }

    pub fn visible_options(&self, resources: &ResourceCache) -> Vec<ItemCommand> {
        let needle = self.input.to_lowercase();
        self.options(resources)
            .into_iter()
            .filter(|item| needle.is_empty() || item.label.to_lowercase().contains(&needle))
            .collect()
    }

    fn clamp_selection(&mut self, visible: usize) {
        if visible == 0 {
            self.selected = 0;
        } else if self.selected >= visible {
            self.selected = visible - 1;
        }
    }

    fn back(&mut self) -> Option<Action> {
        let stage = self.stage();
        let previous = match stage {
            Some(UserFilterStage::ComputedPropertyType) | None => {
                self.close();
                return Some(Action::DialogClose);
            }
            Some(UserFilterStage::UserPropertyValue { .. }) => UserFilterStage::UserProperty,
            Some(UserFilterStage::UserProperty)
            | Some(UserFilterStage::Segment)
            | Some(UserFilterStage::SubscriptionGroup) => UserFilterStage::ComputedPropertyType,
        };
        self.store
            .borrow_mut()
            .update(|state| state.with_stage(Some(previous.clone())));
        self.reset_cursor();
        None
    }

    fn apply_selection(&mut self, resources: &ResourceCache) -> Option<Action> {
        let stage = self.stage()?;
        if let UserFilterStage::UserPropertyValue { value, .. } = &stage {
            if value.is_empty() {
                return None;
            }
            self.store.borrow_mut().update(|state| state.user_property_added());
            self.reset_cursor();
            return Some(Action::FiltersChanged);
        }
        let visible = self.visible_options(resources);
        let item = visible.get(self.selected)?;
        if item.disabled {
            return None;
        }
        match stage {
            UserFilterStage::ComputedPropertyType => {
                let (_, next) = BRANCHES
                    .iter()
                    .find(|(label, _)| *label == item.id)?
                    .clone();
                self.store
                    .borrow_mut()
                    .update(|state| state.with_stage(Some(next.clone())));
                self.reset_cursor();
                None
            }
            UserFilterStage::UserProperty => {
                let id = item.id.clone();
                self.store.borrow_mut().update(|state| {
                    state.with_stage(Some(UserFilterStage::UserPropertyValue {
                        id: id.clone(),
                        value: String::new(),
                    }))
                });
                self.reset_cursor();
                None
            }
            UserFilterStage::Segment => {
                let id = item.id.clone();
                self.store
                    .borrow_mut()
                    .update(|state| state.segment_added(&id));
                self.reset_cursor();
                Some(Action::FiltersChanged)
            }
            UserFilterStage::SubscriptionGroup => {
                let id = item.id.clone();
                self.store
                    .borrow_mut()
                    .update(|state| state.subscription_group_added(&id));
                self.reset_cursor();
                Some(Action::FiltersChanged)
            }
            UserFilterStage::UserPropertyValue { .. } => None,
        }
    }

    pub fn handle_key_event(
        &mut self,
        key: KeyEvent,
        resources: &ResourceCache,
    ) -> Result<Option<Action>> {
        if let Some(action) = self.config.action_for_key(Mode::FilterPopover, key) {
            match action {
                Action::Escape => return Ok(self.back()),
                Action::Enter => return Ok(self.apply_selection(resources)),
                Action::Up => {
                    self.selected = self.selected.saturating_sub(1);
                    if self.selected < self.scroll_offset {
                        self.scroll_offset = self.selected;
                    }
                    return Ok(None);
                }
                Action::Down => {
                    let visible = self.visible_options(resources).len();
                    if visible > 0 && self.selected + 1 < visible {
                        self.selected += 1;
                    }
                    return Ok(None);
                }
                Action::Backspace => {
                    if matches!(self.stage(), Some(UserFilterStage::UserPropertyValue { .. })) {
                        self.store.borrow_mut().update(|state| {
                            let mut value = match &state.stage {
                                Some(UserFilterStage::UserPropertyValue { value, .. }) => {
                                    value.clone()
                                }
                                _ => String::new(),
                            };
                            value.pop();
                            state.value_changed(value)
                        });
                    } else {
                        self.input.pop();
                        let visible = self.visible_options(resources).len();
                        self.clamp_selection(visible);
                    }
                    return Ok(None);
                }
                Action::ToggleInstructions => {
                    self.show_instructions = !self.show_instructions;
                    return Ok(None);
                }
                _ => {}
            }
        }
        if let KeyCode::Char(c) = key.code {
            if matches!(self.stage(), Some(UserFilterStage::UserPropertyValue { .. })) {
                self.store.borrow_mut().update(|state| {
                    let mut value = match &state.stage {
                        Some(UserFilterStage::UserPropertyValue { value, .. }) => value.clone(),
                        _ => String::new(),
                    };
                    value.push(c);
                    state.value_changed(value)
                });
            } else {
                self.input.push(c);
                let visible = self.visible_options(resources).len();
                self.clamp_selection(visible);
            }
        }
        Ok(None)
    }

    fn title(&self, resources: &ResourceCache) -> String {
        match self.stage() {
            Some(UserFilterStage::ComputedPropertyType) | None => "Add Filter".to_string(),
            Some(UserFilterStage::UserProperty) => "Select User Property".to_string(),
            Some(UserFilterStage::UserPropertyValue { id, .. }) => format!(
                "Enter value for {}",
                ResourceCache::resolve_name(&resources.user_properties, &id)
            ),
            Some(UserFilterStage::Segment) => "Select Segment".to_string(),
            Some(UserFilterStage::SubscriptionGroup) => "Select Subscription Group".to_string(),
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, resources: &ResourceCache) {
        if !self.is_open() {
            return;
        }
        let styles = self.config.styles.get(&Mode::FilterPopover);
        let style_for = |key: &str, fallback: Style| {
            styles
                .and_then(|map| map.get(key))
                .copied()
                .unwrap_or(fallback)
        };
        let border_style = style_for("border", Style::default());
        let selected_style = style_for("selected", Style::default().reversed());
        let disabled_style = style_for("disabled", Style::default().dim());
        let placeholder_style = style_for("placeholder", Style::default().dim());

        let width = area.width.saturating_sub(8).min(60).max(30);
        let height = area.height.saturating_sub(4).min(18).max(8);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(border_style)
            .title(self.title(resources));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let instructions = self.config.actions_to_instructions(&[
            (Mode::FilterPopover, Action::Up),
            (Mode::FilterPopover, Action::Down),
            (Mode::FilterPopover, Action::Enter),
            (Mode::FilterPopover, Action::Escape),
        ]);
        let layout = split_dialog_area(inner, self.show_instructions, Some(&instructions));
        let content = layout.content_area;

        let mut lines: Vec<Line> = Vec::new();
        if let Some(UserFilterStage::UserPropertyValue { value, .. }) = self.stage() {
            lines.push(Line::from(vec![
                Span::raw("> "),
                Span::styled(value, style_for("input", Style::default())),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::raw("> "),
                Span::styled(self.input.clone(), style_for("input", Style::default())),
            ]));
            lines.push(Line::raw(""));
            let visible = self.visible_options(resources);
            if visible.is_empty() {
                lines.push(Line::styled("(no options loaded)", placeholder_style));
            }
            let list_height = content.height.saturating_sub(2) as usize;
            if self.selected >= self.scroll_offset + list_height && list_height > 0 {
                self.scroll_offset = self.selected + 1 - list_height;
            }
            for (index, item) in visible
                .iter()
                .enumerate()
                .skip(self.scroll_offset)
                .take(list_height.max(1))
            {
                let style = if index == self.selected {
                    selected_style
                } else if item.disabled {
                    disabled_style
                } else {
                    Style::default()
                };
                lines.push(Line::styled(item.label.clone(), style));
            }
        }
        frame.render_widget(Paragraph::new(lines), content);

        if let Some(instructions_area) = layout.instructions_area {
            let footer = Paragraph::new(instructions)
                .block(Block::default().borders(Borders::TOP))
                .wrap(ratatui::widgets::Wrap { trim: true });
            frame.render_widget(footer, instructions_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::users::UserFilterState;
    use crate::resources::NamedResource;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    fn popover_config() -> Config {
        json5::from_str::<Config>(include_str!("../../.config/config.json5")).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn resources() -> ResourceCache {
        ResourceCache {
            segments: vec![
                NamedResource::new("locked", "Power Users"),
                NamedResource::new("s1", "Trial Users"),
            ],
            user_properties: vec![NamedResource::new("up1", "plan")],
            subscription_groups: vec![NamedResource::new("g1", "Marketing Emails")],
            ..ResourceCache::default()
        }
    }

    fn popover(state: UserFilterState) -> UsersFilterPopover {
        let store = Rc::new(RefCell::new(UserFilterStore::new(state)));
        let mut popover = UsersFilterPopover::new(store);
        popover.config = popover_config();
        popover
    }

    #[test]
    fn segment_branch_end_to_end() {
        let resources = resources();
        let mut popover = popover(UserFilterState::new());
        popover.open();
        assert_eq!(
            popover.stage(),
            Some(UserFilterStage::ComputedPropertyType)
        );

        // Branch list: User Property, Segment, Subscription Group
        popover.handle_key_event(key(KeyCode::Down), &resources).unwrap();
        popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        assert_eq!(popover.stage(), Some(UserFilterStage::Segment));

        popover.handle_key_event(key(KeyCode::Down), &resources).unwrap();
        let action = popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        assert_eq!(action, Some(Action::FiltersChanged));
        assert!(!popover.is_open());
        assert!(popover.store.borrow().state().segments().contains("s1"));
    }

    #[test]
    fn static_segment_option_is_disabled() {
        let resources = resources();
        let mut popover = popover(
            UserFilterState::new().with_static_segments(["locked".to_string()]),
        );
        popover.open();
        popover.handle_key_event(key(KeyCode::Down), &resources).unwrap();
        popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();

        let options = popover.options(&resources);
        assert!(options[0].disabled);
        assert!(!options[1].disabled);

        // Enter on the disabled entry is refused
        let action = popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        assert_eq!(action, None);
        assert!(popover.store.borrow().state().segments().is_empty());
    }

    #[test]
    fn property_value_flow_accumulates() {
        let resources = resources();
        let mut popover = popover(UserFilterState::new());
        popover.open();
        popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        assert_eq!(popover.stage(), Some(UserFilterStage::UserProperty));
        popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        assert!(matches!(
            popover.stage(),
            Some(UserFilterStage::UserPropertyValue { .. })
        ));

        for c in "pro".chars() {
            popover
                .handle_key_event(key(KeyCode::Char(c)), &resources)
                .unwrap();
        }
        let action = popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        assert_eq!(action, Some(Action::FiltersChanged));
        let store = popover.store.borrow();
        assert!(store.state().user_properties().get("up1").unwrap().contains("pro"));
    }

    #[test]
    fn escape_walks_back_through_the_stages() {
        let resources = resources();
        let mut popover = popover(UserFilterState::new());
        popover.open();
        popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        popover.handle_key_event(key(KeyCode::Enter), &resources).unwrap();
        assert!(matches!(
            popover.stage(),
            Some(UserFilterStage::UserPropertyValue { .. })
        ));

        popover.handle_key_event(key(KeyCode::Esc), &resources).unwrap();
        assert_eq!(popover.stage(), Some(UserFilterStage::UserProperty));
        popover.handle_key_event(key(KeyCode::Esc), &resources).unwrap();
        assert_eq!(
            popover.stage(),
            Some(UserFilterStage::ComputedPropertyType)
        );
        let action = popover.handle_key_event(key(KeyCode::Esc), &resources).unwrap();
        assert_eq!(action, Some(Action::DialogClose));
        assert!(!popover.is_open());
    }
}
