//! Shared component contract and dashboard widgets.
pub mod dashboard;
pub mod dialog_layout;
pub mod filter_chips;

use color_eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::{Rect, Size};
use ratatui::Frame;
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::config::Config;
use crate::tui::Event;

pub use dashboard::{Dashboard, DashboardView};
pub use filter_chips::{FilterChip, FilterChips};

/// Base trait for dialogs and container components.
///
/// Event flow: `handle_events` dispatches terminal events to the key/mouse
/// handlers, which may emit an [`Action`]; the owner feeds actions back in
/// through `update`, which may emit follow-up actions.
pub trait Component {
    fn register_action_handler(&mut self, _tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }
    fn register_config_handler(&mut self, _config: Config) -> Result<()> {
        Ok(())
    }
    fn init(&mut self, _area: Size) -> Result<()> {
        Ok(())
    }
    fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
        let action = match event {
            Some(Event::Key(key_event)) => self.handle_key_event(key_event)?,
            Some(Event::Mouse(mouse_event)) => self.handle_mouse_event(mouse_event)?,
            _ => None,
        };
        Ok(action)
    }
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }
    fn handle_mouse_event(&mut self, _mouse: MouseEvent) -> Result<Option<Action>> {
        Ok(None)
    }
    fn update(&mut self, _action: Action) -> Result<Option<Action>> {
        Ok(None)
    }
    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()>;
}
