use crate::app::{AlertKind, App, RecapField, Tab};
use crate::config;
use crate::format::{format_percentage, format_price};
use crate::markdown;
use crate::selection::Category;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

pub fn render(f: &mut Frame, app: &App) {
    let alert_height = app.alerts.len().min(3) as u16;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(alert_height),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, layout[0]);
    render_alerts(f, app, layout[1]);
    match app.tab {
        Tab::Recap => render_recap_tab(f, app, layout[2]),
        Tab::Market => render_market_tab(f, app, layout[2]),
    }
    render_footer(f, app, layout[3]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " Market Research Platform ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    for &tab in Tab::all() {
        spans.push(Span::raw(" | "));
        let style = if tab == app.tab {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(tab.title(), style));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_alerts(f: &mut Frame, app: &App, area: Rect) {
    if app.alerts.is_empty() || area.height == 0 {
        return;
    }
    let lines: Vec<Line> = app
        .alerts
        .iter()
        .rev()
        .take(area.height as usize)
        .map(|alert| {
            let (tag, color) = match alert.kind {
                AlertKind::Info => ("info", Color::Cyan),
                AlertKind::Success => ("ok", Color::Green),
                AlertKind::Warning => ("warn", Color::Yellow),
                AlertKind::Error => ("error", Color::Red),
            };
            Line::from(vec![
                Span::styled(format!(" [{}] ", tag), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(alert.message.clone(), Style::default().fg(color)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let hint = match app.tab {
        Tab::Recap => {
            "Tab: switch tab | ↑/↓: field | ←/→: change | Enter: generate | PgUp/PgDn: scroll | ^S save  ^P print  ^Y copy | Esc: quit"
        }
        Tab::Market => {
            "Tab: switch tab | ↑/↓: move | Space: select | r: refresh | Del: dismiss alert | q/Esc: quit"
        }
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(" Controls: ", Style::default().fg(Color::Gray)),
        Span::styled(hint, Style::default().fg(Color::White)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

// ── Recap tab ───────────────────────────────────────────────────────────────

fn render_recap_tab(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(0)])
        .split(area);

    render_recap_form(f, app, chunks[0]);
    render_recap_result(f, app, chunks[1]);
}

fn field_value(app: &App, field: RecapField) -> String {
    match field {
        RecapField::StartDate => app.form.start_date.clone(),
        RecapField::EndDate => app.form.end_date.clone(),
        RecapField::Language => app.form.language().to_string(),
        RecapField::Temperature => app.form.temperature.clone(),
        RecapField::ReportLength => {
            let length: u32 = app
                .form
                .report_length
                .trim()
                .parse()
                .unwrap_or(config::DEFAULT_REPORT_LENGTH);
            format!(
                "{} ({})",
                app.form.report_length,
                config::report_length_description(length)
            )
        }
        RecapField::AnalysisDepth => app.form.analysis_depth().to_string(),
        RecapField::IncludeSectors => checkbox(app.form.include_sectors),
        RecapField::IncludeCompliance => checkbox(app.form.include_compliance),
        RecapField::IncludeOutlook => checkbox(app.form.include_outlook),
        RecapField::IncludeReferences => checkbox(app.form.include_references),
    }
}

fn checkbox(checked: bool) -> String {
    if checked { "[x]".to_string() } else { "[ ]".to_string() }
}

fn render_recap_form(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    for &field in RecapField::all() {
        let focused = field == app.focus;
        let marker = if focused { "> " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{:<26}", marker, field.label()), label_style),
            Span::styled(field_value(app, field), Style::default().fg(Color::White)),
        ]));
    }
    lines.push(Line::default());
    let submit_style = if app.generating {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    };
    lines.push(Line::from(Span::styled(
        if app.generating {
            "  Generating..."
        } else {
            "  [ Enter: Generate Recap ]"
        },
        submit_style,
    )));

    let form = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Recap Settings "));
    f.render_widget(form, area);
}

fn render_recap_result(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Report ");

    if app.generating {
        let loading = Paragraph::new("Generating market recap, this can take a minute...")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(loading, area);
        return;
    }

    if let Some(err) = &app.recap_error {
        let error = Paragraph::new(err.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Report - Error "));
        f.render_widget(error, area);
        return;
    }

    let Some(report) = &app.report else {
        let empty = Paragraph::new("Pick a date range and press Enter to generate a market recap.")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("✔ ", Style::default().fg(Color::Green)),
            Span::styled(
                format!(
                    "{} | {} articles | {} | {} length",
                    report.date_range,
                    report.articles_count,
                    report.language,
                    config::report_length_description(report.report_length)
                ),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::default(),
    ];
    lines.extend(markdown::to_text(&report.markdown));

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.report_scroll, 0))
        .block(block);
    f.render_widget(body, area);
}

// ── Market tab ──────────────────────────────────────────────────────────────

fn render_market_tab(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(0)])
        .split(area);

    render_selection_panel(f, app, chunks[0]);
    render_market_tables(f, app, chunks[1]);
}

fn render_selection_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Assets ");

    let Some(catalog) = &app.catalog else {
        let loading = Paragraph::new("Loading asset catalog...")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(loading, area);
        return;
    };

    let mut lines = Vec::new();
    let mut row = 0usize;
    for &category in Category::all() {
        lines.push(Line::from(Span::styled(
            format!(
                "{} ({}/{})",
                category.title(),
                app.selection.count(category),
                config::MAX_SELECTED_PER_CATEGORY
            ),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for asset in catalog.assets(category) {
            let checked = app.selection.contains(category, &asset.symbol);
            let under_cursor = row == app.cursor;
            let style = if under_cursor {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else if checked {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };
            lines.push(Line::from(Span::styled(
                format!(" {} {:<10} {}", checkbox(checked), asset.symbol, asset.name),
                style,
            )));
            row += 1;
        }
        lines.push(Line::default());
    }

    // keep the cursor row visible
    let visible = area.height.saturating_sub(2) as usize;
    let cursor_line = cursor_line_offset(app, catalog);
    let scroll = cursor_line.saturating_sub(visible.saturating_sub(1)) as u16;

    let panel = Paragraph::new(lines).scroll((scroll, 0)).block(block);
    f.render_widget(panel, area);
}

/// Line offset of the cursor row inside the selection panel, accounting for
/// category headers and spacer lines.
fn cursor_line_offset(app: &App, catalog: &crate::api::AssetCatalog) -> usize {
    let mut row = 0usize;
    let mut line = 0usize;
    for &category in Category::all() {
        line += 1; // header
        for _ in catalog.assets(category) {
            if row == app.cursor {
                return line;
            }
            row += 1;
            line += 1;
        }
        line += 1; // spacer
    }
    line
}

fn render_market_tables(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    if app.refreshing && app.market.is_none() {
        let loading = Paragraph::new("Loading market data...")
            .alignment(Alignment::Center)
            .block(block.title(" Market Data "));
        f.render_widget(loading, area);
        return;
    }

    if let Some(err) = &app.market_error {
        let error = Paragraph::new(err.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Market Data - Error "));
        f.render_widget(error, area);
        return;
    }

    let Some(snapshot) = &app.market else {
        let empty = Paragraph::new("Select assets on the left to load market data.")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block.title(" Market Data "));
        f.render_widget(empty, area);
        return;
    };

    let title = if app.refreshing {
        " Market Data (refreshing...) ".to_string()
    } else if snapshot.last_updated.is_empty() {
        " Market Data ".to_string()
    } else {
        format!(" Market Data (updated {}) ", snapshot.last_updated)
    };
    let outer = block.title(title);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let populated: Vec<Category> = Category::all()
        .iter()
        .copied()
        .filter(|&c| !snapshot.data.quotes(c).is_empty())
        .collect();
    if populated.is_empty() {
        let empty = Paragraph::new("No data returned for the current selection.")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, inner);
        return;
    }

    let constraints: Vec<Constraint> = populated
        .iter()
        .map(|&c| Constraint::Length(snapshot.data.quotes(c).len() as u16 + 2))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, &category) in populated.iter().enumerate() {
        render_quote_table(f, category, snapshot, chunks[i]);
    }
}

fn change_cell(change: Option<f64>) -> Cell<'static> {
    let color = match change {
        Some(c) if c < 0.0 => Color::Red,
        Some(_) => Color::Green,
        None => Color::Gray,
    };
    Cell::from(format_percentage(change)).style(Style::default().fg(color))
}

fn render_quote_table(f: &mut Frame, category: Category, snapshot: &crate::api::MarketSnapshot, area: Rect) {
    let rows: Vec<Row> = snapshot
        .data
        .quotes(category)
        .iter()
        .map(|quote| {
            Row::new(vec![
                Cell::from(quote.symbol.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(quote.name.clone()),
                Cell::from(format_price(quote.current_price)),
                change_cell(quote.weekly_change),
                change_cell(quote.monthly_change),
                Cell::from(quote.link.clone().unwrap_or_default())
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Min(18),
            Constraint::Length(13),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Min(24),
        ],
    )
    .header(
        Row::new(vec!["Symbol", "Name", "Price", "Weekly", "Monthly", "Link"])
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::TOP)
            .title(Span::styled(
                format!(" {} ", category.title()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(table, area);
}
