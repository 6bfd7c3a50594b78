use crossterm::event::{KeyEvent, MouseEvent};

/// Terminal events delivered to components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Tick,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Paste(String),
}
