pub mod charting;
pub mod effects;
pub mod review;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::catalog::Sentence;
use crate::scoring::Tier;
use crate::session::TypingSession;
use crate::ui::effects::FeedbackEffects;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const SPARK_COLORS: [Color; 6] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::LightYellow,
    Color::Blue,
];

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn legend(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(text, italic())).alignment(Alignment::Center)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.state()).render(self, area, buf);
    }
}

/// Sentence as one line of spans: typed part green, term highlighted, cursor underlined.
///
/// `typed` is the number of characters already entered; pass `None` to show the
/// sentence without typing progress.
pub(crate) fn sentence_line(sentence: &Sentence, typed: Option<usize>) -> Line<'static> {
    let term = sentence.term_char_range();
    let spans = sentence
        .text()
        .chars()
        .enumerate()
        .map(|(idx, c)| {
            let in_term = term.contains(&idx);
            let style = match typed {
                Some(n) if idx < n => bold().fg(Color::Green),
                Some(n) if idx == n => {
                    let base = if in_term { bold().fg(Color::Yellow) } else { bold() };
                    base.add_modifier(Modifier::UNDERLINED)
                }
                _ if in_term => bold().fg(Color::Yellow),
                Some(_) => dim_bold(),
                None => Style::default(),
            };
            Span::styled(c.to_string(), style)
        })
        .collect::<Vec<Span>>();
    Line::from(spans)
}

pub(crate) fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let best = app.best_record();
    let config = app.config();

    let mut lines = vec![
        Line::from(Span::styled("cloudtype", bold().fg(Color::Cyan))),
        Line::from(Span::styled(
            "type cloud service sentences against the clock",
            italic(),
        )),
        Line::default(),
        Line::from(Span::styled(format!("high score: {}", best.high_score), bold())),
    ];
    if let Some(updated) = best.last_updated {
        lines.push(Line::from(Span::styled(
            format!("set {}", updated.format("%Y-%m-%d %H:%M")),
            dim_bold(),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(format!(
        "time {}s | category {} | sound {} | {} sentences",
        config.session_config().time_limit.as_secs(),
        config.category.as_deref().unwrap_or("all"),
        if config.sound { "on" } else { "off" },
        app.catalog().len()
    )));
    lines.push(Line::from(
        Tier::all()
            .map(|t| format!("{t} {}+", t.threshold()))
            .collect::<Vec<_>>()
            .join("  "),
    ));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);
    legend("(space) start / (q)uit").render(chunks[1], buf);
}

pub(crate) fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };

    let text = session.current_sentence_text();
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2 + 2).max(1);
    let prompt_lines = (text.width() as f64 / max_chars_per_line as f64).ceil().max(1.0) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(1), // hud
            Constraint::Length(1), // time gauge
            Constraint::Min(0),
            Constraint::Length(prompt_lines + 2), // sentence block
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    render_hud(session, chunks[0], buf);
    render_time_gauge(session, chunks[1], buf);

    let effects = app.effects();
    let border = if effects.flash_active() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut block = Block::default().borders(Borders::ALL).border_style(border);
    let category = session.sentence().category();
    if !category.is_empty() {
        block = block.title(Span::styled(format!(" {category} "), dim_bold()));
    }

    let typed = session.typed_prefix().chars().count();
    Paragraph::new(sentence_line(session.sentence(), Some(typed)))
        .block(block)
        .alignment(if prompt_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    render_effects(effects, chunks[3], area, buf);
    legend("(esc) menu").render(chunks[5], buf);
}

fn render_hud(session: &TypingSession, area: Rect, buf: &mut Buffer) {
    let hud = Line::from(vec![
        Span::styled(format!("score {}", session.score()), bold().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(
            format!("mistakes {}", session.mistakes()),
            bold().fg(Color::Red),
        ),
        Span::raw("   "),
        Span::styled(format!("{:.0} wpm", session.wpm()), bold()),
        Span::raw("   "),
        Span::styled(
            format!("{:.0}% acc", session.keystroke_accuracy() * 100.0),
            bold(),
        ),
    ]);
    Paragraph::new(hud)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_time_gauge(session: &TypingSession, area: Rect, buf: &mut Buffer) {
    let remaining = session.remaining_secs();
    let limit = session.time_limit().as_secs_f64().max(f64::EPSILON);
    let color = if remaining < 10.0 { Color::Red } else { Color::Magenta };

    Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio((remaining / limit).clamp(0.0, 1.0))
        .label(format!("{remaining:.1}s"))
        .render(area, buf);
}

fn render_effects(effects: &FeedbackEffects, anchor: Rect, area: Rect, buf: &mut Buffer) {
    for popup in effects.popups() {
        let x = anchor.right().saturating_sub(popup.text.width() as u16 + 2);
        let y = anchor.y.saturating_sub(popup.rise());
        let style = if popup.fading() {
            Style::default().fg(Color::Yellow)
        } else {
            bold().fg(Color::Yellow)
        };
        if y >= area.y && x >= area.x && y < area.bottom() && x < area.right() {
            buf.set_string(x, y, &popup.text, style);
        }
    }

    let cx = f64::from(anchor.x) + f64::from(anchor.width) / 2.0;
    let cy = f64::from(anchor.y) + f64::from(anchor.height) / 2.0;
    for spark in effects.sparks() {
        let x = (cx + spark.dx).round();
        let y = (cy + spark.dy).round();
        if x < f64::from(area.left()) || y < f64::from(area.top()) {
            continue;
        }
        let (x, y) = (x as u16, y as u16);
        if x >= area.right() || y >= area.bottom() {
            continue;
        }

        let color = SPARK_COLORS[spark.color_index % SPARK_COLORS.len()];
        let style = if spark.alpha() > 0.6 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if spark.alpha() > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_symbol(&spark.symbol.to_string());
            cell.set_style(style);
        }
    }
}

pub(crate) fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };
    let Some(summary) = session.summary() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // score and tier
            Constraint::Length(1), // record
            Constraint::Length(1), // metrics
            Constraint::Length(1), // next tier hint
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(session.progress(), summary.elapsed.as_secs_f64());
    let tuples: Vec<(f64, f64)> = session.progress().iter().map(|p| p.wpm_xy()).collect();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(overall_duration), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(highest_wpm), bold()),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(format!("score {}", summary.score), bold().fg(Color::Cyan)),
        Span::raw("  ·  "),
        Span::styled(summary.tier.to_string(), bold().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let record = if summary.new_high_score {
        Span::styled(
            format!("new high score! (was {})", summary.previous_high_score),
            bold().fg(Color::Green),
        )
    } else {
        Span::styled(
            format!("high score {}", summary.previous_high_score),
            dim_bold(),
        )
    };
    Paragraph::new(record)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        format!(
            "{:.0} wpm   {:.0} cpm   {:.0}% acc   {} mistakes   {} sentences",
            summary.wpm,
            summary.cpm,
            summary.keystroke_accuracy * 100.0,
            summary.mistakes,
            summary.completed_sentences
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let hint = match Tier::next_threshold(summary.score) {
        Some((tier, missing)) => format!("{missing} more points for {tier}"),
        None => "top tier reached".to_string(),
    };
    Paragraph::new(Span::styled(hint, italic().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let keys = if summary.terms.is_empty() {
        "(space) again / (esc) menu / (q)uit"
    } else {
        "(space) again / (i) review terms / (esc) menu / (q)uit"
    };
    legend(keys).render(chunks[6], buf);
}
