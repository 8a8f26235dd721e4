//! Field rendering from input descriptors

use formstate::{Binding, FieldError, InputProps};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Text shown under a field for its error
pub fn error_text(error: &FieldError) -> String {
    match error {
        FieldError::Message(_) => error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| "Invalid value".to_string()),
        // Only whole-list errors reach here; item errors render per item
        FieldError::Items(_) => "Some entries are invalid".to_string(),
    }
}

/// Draw one control bound through `props`
pub fn draw_field(frame: &mut Frame, area: Rect, label: &str, props: &InputProps, is_active: bool) {
    let style = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let border_style = match (&props.error, is_active) {
        (Some(_), _) => Style::default().fg(Color::Red),
        (None, true) => Style::default().fg(Color::Cyan),
        (None, false) => Style::default().fg(Color::DarkGray),
    };

    let content = match &props.binding {
        Binding::Checked(checked) => {
            let mark = if *checked { "[x]" } else { "[ ]" };
            Line::from(Span::styled(mark, style))
        }
        Binding::Value(value) => {
            let text = value.display_value();
            let text = if text.is_empty() && !is_active {
                "(empty)".to_string()
            } else {
                text
            };
            let cursor = if is_active { "▌" } else { "" };
            Line::from(vec![
                Span::styled(text, style),
                Span::styled(cursor, Style::default().fg(Color::Cyan)),
            ])
        }
    };

    let mut block = Block::default()
        .title(format!(" {label} "))
        .borders(Borders::ALL)
        .border_style(border_style);
    if let Some(error) = &props.error {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} ", error_text(error)),
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(
        Paragraph::new(content)
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}
