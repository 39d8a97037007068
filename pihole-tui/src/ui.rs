//! TUI rendering

use crate::app::{App, Tab};
use pihole_common::{DashboardView, SourceRow, Tile, TileFill, LOADING_TEXT};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header/tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(5), // Status
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    draw_tabs(f, app, chunks[0]);
    match app.current_tab {
        Tab::Dashboard => draw_dashboard(f, app, chunks[1]),
        Tab::Help => draw_help(f, chunks[1]),
    }
    draw_status(f, app, chunks[2]);
    draw_footer(f, chunks[3]);
}

/// Draw tab bar
fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .enumerate()
        .map(|(i, t)| {
            Line::from(vec![
                Span::styled(format!("{}:", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(t.name()),
            ])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Pi-hole Stats"))
        .select(
            Tab::all()
                .iter()
                .position(|&t| t == app.current_tab)
                .unwrap_or(0),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

/// Draw the tiles, client table and summary footer
fn draw_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let (tiles, sources, footer) = match app.view() {
        DashboardView::Loading => {
            let loading = Paragraph::new(LOADING_TEXT)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(loading, area);
            return;
        }
        DashboardView::Ready {
            tiles,
            sources,
            footer,
        } => (tiles, sources, footer),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Tiles
            Constraint::Min(3),    // Top clients
            Constraint::Length(1), // Summary line
        ])
        .split(area);

    let tile_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(chunks[0]);
    for (tile, tile_area) in tiles.iter().zip(tile_areas.iter()) {
        draw_tile(f, tile, *tile_area);
    }

    if !sources.is_empty() {
        draw_sources(f, &sources, chunks[1]);
    }

    let summary = Paragraph::new(footer).style(Style::default().fg(Color::Gray));
    f.render_widget(summary, chunks[2]);
}

/// Draw one stat tile
fn draw_tile(f: &mut Frame, tile: &Tile, area: Rect) {
    let (r, g, b) = tile.kind.accent();
    let accent = Color::Rgb(r, g, b);

    let (block_style, title_style) = match tile.fill {
        TileFill::Background => (
            Style::default().bg(accent).fg(Color::White),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        TileFill::Label => (
            Style::default(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
    };

    let paragraph = Paragraph::new(Line::styled(
        tile.value.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(tile.kind.label(), title_style))
            .style(block_style),
    );

    f.render_widget(paragraph, area);
}

/// Draw top clients table
fn draw_sources(f: &mut Frame, sources: &[SourceRow], area: Rect) {
    let header_cells = ["Client", "Requests"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = sources
        .iter()
        .map(|source| {
            Row::new(vec![
                Cell::from(source.client.clone()),
                Cell::from(source.requests.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Percentage(75), Constraint::Percentage(25)],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Top Clients"));

    f.render_widget(table, area);
}

/// Draw help tab
fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::styled("Navigation", Style::default().add_modifier(Modifier::BOLD)),
        Line::raw("  Tab / Shift+Tab - Switch between tabs"),
        Line::raw("  1-2            - Jump to specific tab"),
        Line::raw(""),
        Line::styled("Display", Style::default().add_modifier(Modifier::BOLD)),
        Line::raw("  h              - Toggle hostname-only client labels"),
        Line::raw("  f              - Toggle full colour tiles"),
        Line::raw(""),
        Line::styled("Global Actions", Style::default().add_modifier(Modifier::BOLD)),
        Line::raw("  q / Ctrl+C     - Quit"),
        Line::raw(""),
        Line::styled("Notes", Style::default().add_modifier(Modifier::BOLD)),
        Line::raw("  Statistics refresh on their own schedule."),
        Line::raw("  After a failed refresh the last known values stay on screen."),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}

/// Draw refresh status and recent messages
fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let last_update = match app.last_update {
        Some(at) => format!("{} ago", format_duration(at.elapsed().as_secs())),
        None => "never".to_string(),
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Pi-hole: "),
            Span::styled(&app.api_url, Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("Last update: "),
            Span::styled(last_update, Style::default().fg(Color::Green)),
            Span::styled(
                format!(" (every {})", format_duration(app.update_interval.as_secs())),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];
    if let Some(ref error) = app.last_error {
        lines.push(Line::styled(
            format!("● {}", error),
            Style::default().fg(Color::Red),
        ));
    }

    let status = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, chunks[0]);

    let items: Vec<ListItem> = app
        .messages
        .iter()
        .rev()
        .take(3)
        .map(|msg| {
            let style = if msg.is_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            ListItem::new(Line::styled(&msg.text, style))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Messages"));
    f.render_widget(list, chunks[1]);
}

/// Draw footer
fn draw_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(
        "Press 'q' to quit | Tab to switch views | 'h' client labels | 'f' tile colours",
    )
    .style(Style::default().fg(Color::DarkGray));

    f.render_widget(footer, area);
}

/// Format duration in human-readable form
fn format_duration(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
