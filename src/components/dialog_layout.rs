use ratatui::prelude::Rect;

/// Helper for dialog layout with optional instructions area
pub struct DialogLayout {
    pub content_area: Rect,
    pub instructions_area: Option<Rect>,
}

pub fn split_dialog_area(
    area: Rect,
    show_instructions: bool,
    instructions: Option<&str>,
) -> DialogLayout {
    if show_instructions {
        let wrap_width = area.width.saturating_sub(4).max(10) as usize;
        let instructions = instructions.unwrap_or("");
        let wrapped_lines = textwrap::wrap(instructions, wrap_width);
        let instructions_height = (wrapped_lines.len() as u16).max(1) + 2;
        let content_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height.saturating_sub(instructions_height),
        };
        let instructions_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(instructions_height),
            width: area.width,
            height: instructions_height,
        };
        DialogLayout {
            content_area,
            instructions_area: Some(instructions_area),
        }
    } else {
        DialogLayout {
            content_area: area,
            instructions_area: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_reserves_footer_space() {
        let area = Rect::new(0, 0, 60, 20);
        let layout = split_dialog_area(area, true, Some("Esc: Close  Enter: Apply"));
        let footer = layout.instructions_area.unwrap();
        assert_eq!(layout.content_area.height + footer.height, 20);
        assert_eq!(footer.y, layout.content_area.height);
    }

    #[test]
    fn split_without_instructions_uses_full_area() {
        let area = Rect::new(0, 0, 60, 20);
        let layout = split_dialog_area(area, false, None);
        assert_eq!(layout.content_area, area);
        assert!(layout.instructions_area.is_none());
    }
}
