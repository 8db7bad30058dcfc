//! UI rendering for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use chrono::Utc;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::App;
use crate::config::UiSettings;
use crate::generation::{
    Generation, GenerationStatus, lock_store, progress_bar, prompt_headline, status_glyph,
    time_ago,
};

const PROGRESS_WIDTH: usize = 20;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("enter", "generate");
    map.insert("up/down", "select");
    map.insert("ctrl+x", "cancel selected");
    map.insert("esc", "clear / quit");
    map.insert("ctrl+c", "quit");
    map
});

fn controls_text() -> String {
    let order = ["enter", "up/down", "ctrl+x", "esc", "ctrl+c"];
    order
        .iter()
        .filter_map(|k| CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}")))
        .collect::<Vec<String>>()
        .join(" | ")
}

fn status_style(status: GenerationStatus) -> Style {
    match status {
        GenerationStatus::Generating => Style::default().fg(Color::Yellow),
        GenerationStatus::Completed => Style::default().fg(Color::Green),
        GenerationStatus::Failed => Style::default().fg(Color::Red),
    }
}

/// One list row: glyph, headline, version tag, age, then progress or outcome.
fn generation_row(g: &Generation, now: chrono::DateTime<Utc>) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(format!("{} ", status_glyph(g.status())), status_style(g.status())),
        Span::raw(prompt_headline(g.prompt())),
        Span::raw("  "),
        Span::styled("v1", Style::default().add_modifier(Modifier::DIM)),
        Span::raw("  "),
        Span::styled(
            time_ago(g.timestamp(), now),
            Style::default().add_modifier(Modifier::ITALIC),
        ),
        Span::raw("  "),
    ];

    match g.status() {
        GenerationStatus::Generating => {
            spans.push(Span::raw(progress_bar(g.progress(), PROGRESS_WIDTH)));
        }
        GenerationStatus::Completed => {
            if let Some(url) = g.audio_url() {
                spans.push(Span::styled(url.to_string(), Style::default().fg(Color::Cyan)));
            }
        }
        GenerationStatus::Failed => {
            spans.push(Span::styled(
                g.error().unwrap_or_default().to_string(),
                status_style(GenerationStatus::Failed),
            ));
        }
    }

    ListItem::new(Line::from(spans))
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Prompt input
    let prompt = if app.input.is_empty() {
        Paragraph::new(app.placeholder().to_string()).add_modifier(Modifier::DIM)
    } else {
        Paragraph::new(format!("{}▏", app.input))
    };
    let prompt_title = if app.can_submit() || app.input.is_empty() {
        " prompt "
    } else {
        " prompt (waiting for current generation) "
    };
    let prompt = prompt.block(
        Block::bordered()
            .padding(Padding::horizontal(1))
            .title(prompt_title),
    );
    frame.render_widget(prompt, chunks[1]);

    // Recent generations
    {
        let store = lock_store(app.store());
        let title = if store.is_any_generating() {
            " Recent generations · Generating... "
        } else {
            " Recent generations "
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if store.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from("No generations yet").bold(),
                Line::from("Start creating to see your history").dim(),
            ])
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(empty, chunks[2]);
        } else {
            let now = Utc::now();
            let items: Vec<ListItem> = store
                .list_generations()
                .map(|g| generation_row(g, now))
                .collect();
            let mut state = ListState::default();
            state.select(Some(app.selected.min(store.len() - 1)));
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, chunks[2], &mut state);
        }
    }

    // Footer
    let mut footer_lines = vec![Line::from(controls_text())];
    if let Some(notice) = &app.notice {
        footer_lines.push(Line::from(notice.as_str()).italic());
    }
    let footer = Paragraph::new(footer_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" controls · {} ", app.channel_name()))
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
