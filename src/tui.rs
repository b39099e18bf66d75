use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const BORDER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const STATUS_STYLE: Style = Style::new().fg(Color::Yellow);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const BUTTON_FOCUSED: Style =
    Style::new().add_modifier(Modifier::BOLD.union(Modifier::UNDERLINED));

pub const BUTTON_IDLE: Style = Style::new().fg(Color::DarkGray);

/// Restore the terminal before the default hook prints a panic.
pub fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));
}

/// Screen title plus the heavy rule under it.
pub fn render_header(frame: &mut Frame, title: &str, header_area: Rect, sep_area: Rect) {
    frame.render_widget(
        Paragraph::new(format!(" {title}")).style(HEADER_STYLE),
        header_area,
    );
    let sep_line = "━".repeat(sep_area.width as usize);
    frame.render_widget(Paragraph::new(sep_line).style(BORDER_STYLE), sep_area);
}

/// A `[ label ]` button, underlined when focused.
pub fn button(label: &str, focused: bool) -> Span<'static> {
    Span::styled(
        format!("[ {label} ]"),
        if focused { BUTTON_FOCUSED } else { BUTTON_IDLE },
    )
}

/// A fixed-size rect centred in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

/// Input line with a block cursor.
pub fn input_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let cursor = if active { "\u{2588}" } else { "" };
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{value}{cursor}"),
            if active {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered(area, 50, 9);
        assert_eq!(r, Rect::new(25, 15, 50, 9));
        let tiny = centered(Rect::new(2, 3, 20, 4), 50, 9);
        assert_eq!(tiny, Rect::new(2, 3, 20, 4));
    }
}
