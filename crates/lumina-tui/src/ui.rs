use lumina_core::ConceptCard;
use lumina_schema::{Concept, RequestState};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus, PromptKind};

const ACTIVITY_LINES: usize = 5;

pub fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(10),
            Constraint::Length(ACTIVITY_LINES as u16 + 2),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_form(frame, main_layout[0], app);
    render_cards(frame, main_layout[1], app);
    render_activity(frame, main_layout[2], app);
    render_status(frame, main_layout[3], app);
}

fn label_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn border_style(focused: bool, color: Color) -> Style {
    if focused {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_form(frame: &mut Frame, area: Rect, app: &App) {
    let cursor = |focus: Focus| if app.focus == focus { "_" } else { "" };
    let form = app.studio.form();

    let state_line = match (form.state(), form.error()) {
        (RequestState::InFlight, _) => Line::from(Span::styled(
            "Generating concepts...",
            Style::default().fg(Color::Yellow),
        )),
        (_, Some(error)) => Line::from(Span::styled(error, Style::default().fg(Color::Red))),
        _ => Line::from(Span::styled(
            "Enter to generate",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Business  ", label_style(app.focus == Focus::BusinessName)),
            Span::raw(format!("{}{}", app.business_name, cursor(Focus::BusinessName))),
        ]),
        Line::from(vec![
            Span::styled("Industry  ", label_style(app.focus == Focus::Industry)),
            Span::raw(format!("{}{}", app.industry, cursor(Focus::Industry))),
        ]),
        Line::from(vec![
            Span::styled("Style     ", label_style(app.focus == Focus::Style)),
            Span::raw(format!("◀ {} ▶", app.style_label())),
        ]),
        state_line,
    ];

    let focused = matches!(
        app.focus,
        Focus::BusinessName | Focus::Industry | Focus::Style
    );
    let block = Block::default()
        .title(" Lumina · Brand Brief ")
        .borders(Borders::ALL)
        .border_style(border_style(focused, Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_cards(frame: &mut Frame, area: Rect, app: &App) {
    let concepts = app.studio.concepts();
    if concepts.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No concepts yet. Fill in the brief and press Enter.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(Block::default().title(" Concepts ").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let count = concepts.len() as u32;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(area);

    for (index, (concept, card)) in concepts.iter().zip(app.studio.cards()).enumerate() {
        render_card(
            frame,
            columns[index],
            concept,
            card,
            app.focus == Focus::Card(index),
        );
    }
}

fn render_card(frame: &mut Frame, area: Rect, concept: &Concept, card: &ConceptCard, focused: bool) {
    let heading = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled("Rationale", heading)),
        Line::from(concept.rationale.as_str()),
        Line::from(""),
        Line::from(Span::styled("Visual blueprint", heading)),
        Line::from(Span::styled(
            concept.visual_description.as_str(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled("Palette", heading)),
    ];

    let copied = card.copied_hex();
    for (n, swatch) in concept.palette.iter().enumerate() {
        let mut spans = vec![
            Span::styled("■ ", Style::default().fg(swatch_color(&swatch.hex))),
            Span::raw(format!("[{}] {:<9} {} ", n + 1, swatch.role.as_str(), swatch.name)),
            Span::styled(swatch.hex.as_str(), Style::default().fg(Color::DarkGray)),
        ];
        if copied == Some(swatch.hex.as_str()) {
            spans.push(Span::styled(" copied", Style::default().fg(Color::Green)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(image_line(card));
    if card.refine_state() == RequestState::InFlight {
        lines.push(Line::from(Span::styled(
            "Refining...",
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(error) = card.error() {
        lines.push(Line::from(Span::styled(error, Style::default().fg(Color::Red))));
    }

    let title = if card.is_busy() {
        format!(" {}. {} · working ", card.index() + 1, concept.name)
    } else {
        format!(" {}. {} ", card.index() + 1, concept.name)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(focused, Color::Magenta));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn image_line(card: &ConceptCard) -> Line<'static> {
    let busy = Style::default().fg(Color::Yellow);
    if card.edit_state() == RequestState::InFlight {
        return Line::from(Span::styled("Image: editing...", busy));
    }
    if card.image_state() == RequestState::InFlight {
        return Line::from(Span::styled("Image: generating...", busy));
    }
    match card.image() {
        Some(generated) => Line::from(vec![
            Span::styled("Image: ", Style::default().fg(Color::Green)),
            Span::raw(format!(
                "{} ~{:.1} KB (s save, e edit)",
                generated.image.mime_type,
                generated.image.approx_size() as f64 / 1024.0
            )),
        ]),
        None => Line::from(Span::styled(
            "Image: none (g to generate)",
            Style::default().fg(Color::DarkGray),
        )),
    }
}

fn swatch_color(hex: &str) -> Color {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    match (channel(1..3), channel(3..5), channel(5..7)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

fn render_activity(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .activity
        .iter()
        .rev()
        .take(ACTIVITY_LINES)
        .map(|line| ListItem::new(Line::from(Span::styled(line.as_str(), Style::default().fg(Color::Gray)))))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Activity ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let key = |label: &'static str| {
        Span::styled(
            label,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    };
    let hint = |label: &'static str| Span::styled(label, Style::default().fg(Color::DarkGray));

    let spans = if let Some(prompt) = &app.prompt {
        let label = match prompt.kind {
            PromptKind::EditImage => "edit",
            PromptKind::Refine => "refine",
        };
        vec![
            Span::styled(
                format!(" {label} #{}> ", prompt.index + 1),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!("{}_ ", prompt.buffer)),
            hint("[Enter] send [Esc] cancel"),
        ]
    } else {
        let mut spans = vec![
            key(" [Esc/q]"),
            hint(" quit "),
            key("[Tab]"),
            hint(" focus "),
            key("[←→]"),
            hint(" style/card "),
            key("[g/e/r]"),
            hint(" image/edit/refine "),
            key("[1-9]"),
            hint(" copy hex "),
            key("[s]"),
            hint(" save "),
        ];
        if let Some(notice) = &app.notice {
            spans.push(Span::styled(
                format!("| {notice} "),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans
    };

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
