use serde::{Deserialize, Serialize};
use strum::Display;

/// High-level actions that can be triggered by UI or components.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    ClearScreen,
    Error(String),
    Help,
    /// Close any active dialog
    DialogClose,
    Escape,
    Enter,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    /// Toggle the instructions footer in dialogs
    ToggleInstructions,
    /// Switch to the next dashboard view (Analysis -> User Events -> Users)
    NextView,
    /// Switch to the previous dashboard view
    PrevView,
    /// Open the "Add Filter" popover for the active view
    OpenFilterPopover,
    /// Delete the chip currently selected in the chip row
    DeleteSelectedChip,
    /// Move chip selection left
    PrevChip,
    /// Move chip selection right
    NextChip,
    /// A popover committed or removed a filter; dependent panes must refresh
    FiltersChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_display_is_nonempty() {
        let actions = [
            Action::Quit,
            Action::OpenFilterPopover,
            Action::FiltersChanged,
            Action::Error("boom".to_string()),
        ];
        for action in actions {
            assert!(!format!("{action}").is_empty());
        }
    }

    #[test]
    fn action_roundtrips_through_json() {
        let action = Action::Resize(80, 24);
        let json = serde_json::to_string(&action).unwrap();
        let decoded: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, decoded);
    }
}
