use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::ui::{legend, sentence_line, HORIZONTAL_MARGIN, VERTICAL_MARGIN};

/// Post-game term review: the term under the cursor, what it is and where it was used.
pub(crate) fn render_review(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let Some(entry) = session.review().entry(session.catalog()) else {
        Paragraph::new("no terms completed")
            .alignment(Alignment::Center)
            .render(chunks[0], buf);
        legend("(esc) back").render(chunks[1], buf);
        return;
    };

    let heading = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let label = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(entry.term.to_string(), heading)),
        Line::default(),
        Line::from(Span::styled("description", label)),
        Line::from(entry.description.to_string()),
        Line::default(),
    ];
    if let Some(example) = entry.example {
        lines.push(Line::from(Span::styled("example", label)));
        lines.push(sentence_line(example, None));
        lines.push(Line::from(Span::styled(
            example.translation().to_string(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" review {}/{} ", entry.position, entry.total)),
        )
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    legend("(a) previous / (d) next / (esc) back").render(chunks[1], buf);
}
