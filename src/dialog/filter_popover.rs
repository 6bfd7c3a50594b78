//! FilterPopover: popup dialog binding a filter-builder state machine to the
//! keyboard. Drives the SelectKey -> SelectItem/SelectValue -> commit flow.

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::action::Action;
use crate::components::dialog_layout::split_dialog_area;
use crate::config::{Config, Mode};
use crate::filter::analysis::AnalysisFilters;
use crate::filter::state::{FilterCommand, FilterKey, FilterState, Stage};
use crate::resources::ResourceCache;

/// Transition surface the popover drives.
///
/// The plain state machine implements this directly; instantiations that wrap
/// it with page-level behavior (like the analysis channel allow-list) supply
/// their own key handling.
pub trait FilterDriver {
    type Key: FilterKey;

    fn filter_state(&self) -> &FilterState<Self::Key>;

    #[must_use]
    fn apply_key(&self, key: Self::Key, resources: &ResourceCache) -> Self;

    #[must_use]
    fn apply_state(&self, state: FilterState<Self::Key>) -> Self;
}

impl<K: FilterKey> FilterDriver for FilterState<K> {
    type Key = K;

    fn filter_state(&self) -> &FilterState<K> {
        self
    }

    fn apply_key(&self, key: K, resources: &ResourceCache) -> Self {
        self.key_selected(key, resources)
    }

    fn apply_state(&self, state: FilterState<K>) -> Self {
        state
    }
}

impl FilterDriver for AnalysisFilters {
    type Key = crate::filter::analysis::AnalysisFilterKey;

    fn filter_state(&self) -> &FilterState<Self::Key> {
        &self.state
    }

    fn apply_key(&self, key: Self::Key, resources: &ResourceCache) -> Self {
        self.key_selected(key, resources)
    }

    fn apply_state(&self, state: FilterState<Self::Key>) -> Self {
        let mut next = self.clone();
        next.state = state;
        next
    }
}

/// Popup dialog for building one filter.
#[derive(Debug, Clone)]
pub struct FilterPopover<D: FilterDriver> {
    pub driver: D,
    pub selected: usize,
    pub scroll_offset: usize,
    pub show_instructions: bool,
    pub config: Config,
}

impl<D: FilterDriver + Clone> FilterPopover<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            selected: 0,
            scroll_offset: 0,
            show_instructions: true,
            config: Config::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.driver.filter_state().open
    }

    pub fn open(&mut self) {
        self.driver = self.driver.apply_state(self.driver.filter_state().opened());
        self.selected = 0;
        self.scroll_offset = 0;
    }

    fn close(&mut self) {
        self.driver = self.driver.apply_state(self.driver.filter_state().closed());
        self.selected = 0;
        self.scroll_offset = 0;
    }

    /// Commands at the current stage matching the autocomplete input.
    pub fn visible_commands(&self) -> Vec<FilterCommand<D::Key>> {
        let state = self.driver.filter_state();
        let needle = state.input_value.to_lowercase();
        state
            .commands()
            .into_iter()
            .filter(|command| {
                needle.is_empty() || command.label().to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn clamp_selection(&mut self, visible: usize) {
        if visible == 0 {
            self.selected = 0;
        } else if self.selected >= visible {
            self.selected = visible - 1;
        }
    }

    /// Handle a key event while the popover is open.
    ///
    /// Emits `DialogClose` on full close and `FiltersChanged` on commit so the
    /// owner can refresh chips and the query preview.
    pub fn handle_key_event(
        &mut self,
        key: KeyEvent,
        resources: &ResourceCache,
    ) -> Result<Option<Action>> {
        let state = self.driver.filter_state().clone();
        if let Some(action) = self.config.action_for_key(Mode::FilterPopover, key) {
            match action {
                Action::Escape => {
                    if matches!(state.stage, Stage::SelectKey) {
                        self.close();
                        return Ok(Some(Action::DialogClose));
                    }
                    // Back out to key selection without touching committed filters
                    self.driver = self
                        .driver
                        .apply_state(state.with_stage(Stage::SelectKey).with_input(""));
                    self.selected = 0;
                    self.scroll_offset = 0;
                    return Ok(None);
                }
                Action::Enter => {
                    if let Stage::SelectValue { value, .. } = &state.stage {
                        if value.is_empty() {
                            return Ok(None);
                        }
                        self.driver = self.driver.apply_state(state.value_committed());
                        self.selected = 0;
                        self.scroll_offset = 0;
                        return Ok(Some(Action::FiltersChanged));
                    }
                    let visible = self.visible_commands();
                    let Some(command) = visible.get(self.selected) else {
                        return Ok(None);
                    };
                    if command.is_disabled() {
                        return Ok(None);
                    }
                    return match command {
                        FilterCommand::SelectKey { key, .. } => {
                            self.driver = self.driver.apply_key(*key, resources);
                            self.selected = 0;
                            self.scroll_offset = 0;
                            Ok(None)
                        }
                        FilterCommand::SelectItem(item) => {
                            self.driver = self
                                .driver
                                .apply_state(state.item_selected(&item.id, &item.label));
                            self.selected = 0;
                            self.scroll_offset = 0;
                            Ok(Some(Action::FiltersChanged))
                        }
                    };
                }
                Action::Up => {
                    self.selected = self.selected.saturating_sub(1);
                    if self.selected < self.scroll_offset {
                        self.scroll_offset = self.selected;
                    }
                    return Ok(None);
                }
                Action::Down => {
                    let visible = self.visible_commands().len();
                    if visible > 0 && self.selected + 1 < visible {
                        self.selected += 1;
                    }
                    return Ok(None);
                }
                Action::Backspace => {
                    let next = match &state.stage {
                        Stage::SelectValue { value, .. } => {
                            let mut value = value.clone();
                            value.pop();
                            state.value_changed(value)
                        }
                        _ => {
                            let mut input = state.input_value.clone();
                            input.pop();
                            state.with_input(input)
                        }
                    };
                    self.driver = self.driver.apply_state(next);
                    let visible = self.visible_commands().len();
                    self.clamp_selection(visible);
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
            let next = match &state.stage {
                Stage::SelectValue { value, .. } => {
                    let mut value = value.clone();
                    value.push(c);
                    state.value_changed(value)
                }
                _ => {
                    let mut input = state.input_value.clone();
                    input.push(c);
                    state.with_input(input)
                }
            };
            self.driver = self.driver.apply_state(next);
            let visible = self.visible_commands().len();
            self.clamp_selection(visible);
        }
        Ok(None)
    }

    fn build_instructions(&self) -> String {
        self.config.actions_to_instructions(&[
            (Mode::FilterPopover, Action::Up),
            (Mode::FilterPopover, Action::Down),
            (Mode::FilterPopover, Action::Enter),
            (Mode::FilterPopover, Action::Escape),
        ])
    }

    fn title(&self) -> String {
        match &self.driver.filter_state().stage {
            Stage::SelectKey => "Add Filter".to_string(),
            Stage::SelectItem { key, .. } => format!("Select {}", key.label()),
            Stage::SelectValue { key, .. } => format!("Enter {}", key.label()),
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
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
            .title(self.title());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let instructions = self.build_instructions();
        let layout = split_dialog_area(inner, self.show_instructions, Some(&instructions));
        let content = layout.content_area;

        let state = self.driver.filter_state();
        let mut lines: Vec<Line> = Vec::new();
        match &state.stage {
            Stage::SelectValue { value, .. } => {
                lines.push(Line::from(vec![
                    Span::raw("> "),
                    Span::styled(value.clone(), style_for("input", Style::default())),
                ]));
            }
            _ => {
                lines.push(Line::from(vec![
                    Span::raw("> "),
                    Span::styled(
                        state.input_value.clone(),
                        style_for("input", Style::default()),
                    ),
                ]));
                lines.push(Line::raw(""));
                let visible = self.visible_commands();
                if visible.is_empty() {
                    lines.push(Line::styled("(no options loaded)", placeholder_style));
                }
                let list_height = content.height.saturating_sub(2) as usize;
                if self.selected >= self.scroll_offset + list_height && list_height > 0 {
                    self.scroll_offset = self.selected + 1 - list_height;
                }
                for (index, command) in visible
                    .iter()
                    .enumerate()
                    .skip(self.scroll_offset)
                    .take(list_height.max(1))
                {
                    let style = if index == self.selected {
                        selected_style
                    } else if command.is_disabled() {
                        disabled_style
                    } else {
                        Style::default()
                    };
                    lines.push(Line::styled(command.label().to_string(), style));
                }
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
