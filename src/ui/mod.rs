//! UI module for rendering the demo form

mod field_renderer;

use crate::app::{App, Control};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const FIELD_HEIGHT: u16 = 3;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let [header, body, status] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    draw_header(frame, header, app);
    draw_controls(frame, body, app);
    draw_status_bar(frame, status, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " Contact form ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if app.form.is_dirty() {
        spans.push(Span::styled("(modified)", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Scalar fields stack vertically; each contact takes one row split in two
fn draw_controls(frame: &mut Frame, area: Rect, app: &App) {
    let mut y = area.y;
    let bottom = area.y + area.height;
    let controls = app.controls();
    let mut column = 0u16;
    let columns = 2u16;

    for (position, control) in controls.iter().enumerate() {
        if y + FIELD_HEIGHT > bottom {
            break;
        }
        let Some(props) = app.props(control) else {
            continue;
        };
        let is_active = position == app.focus;

        let rect = match control {
            Control::Field { .. } => Rect::new(area.x, y, area.width, FIELD_HEIGHT),
            Control::Item { .. } => {
                let width = area.width / columns;
                Rect::new(area.x + column * width, y, width, FIELD_HEIGHT)
            }
        };
        field_renderer::draw_field(frame, rect, &control.label(), &props, is_active);

        match control {
            Control::Field { .. } => y += FIELD_HEIGHT,
            Control::Item { .. } => {
                column += 1;
                if column == columns {
                    column = 0;
                    y += FIELD_HEIGHT;
                }
            }
        }
    }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" rev {} ", app.revisions.get()),
        Style::default().fg(Color::DarkGray),
    )];

    if let Some(message) = &app.status_message {
        spans.push(Span::styled(
            format!("{message} "),
            Style::default().fg(Color::Yellow),
        ));
    }

    spans.push(Span::styled(
        "Tab: next  Enter: submit  ^N: add contact  ^D: remove  ^↑/^↓: move  ^R: reset  Esc: quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::default_seed;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draws_every_control() {
        let app = App::new(default_seed());
        let screen = render(&app);
        assert!(screen.contains("Name"));
        assert!(screen.contains("Newsletter"));
        assert!(screen.contains("Contact 1 Email"));
    }

    #[test]
    fn test_draws_errors_after_submit() {
        let mut app = App::new(default_seed());
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        let screen = render(&app);
        assert!(screen.contains("This field is required"));
        assert!(screen.contains("Enter a valid email address"));
    }
}
