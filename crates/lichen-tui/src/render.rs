use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use lichen_core::containment::AttributionIdWithCount;
use lichen_core::models::Attributions;

use crate::ui::{layout, theme, App, Focus, PanelState};

pub(crate) fn render(f: &mut Frame, app: &mut App) {
    let bg_block = Block::default().style(Style::default().bg(theme::BG_APP));
    f.render_widget(bg_block, f.area());

    let chunks = Layout::vertical([
        Constraint::Length(layout::HEADER_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(layout::FOOTER_HEIGHT),
        Constraint::Length(layout::STATUSBAR_HEIGHT),
    ])
    .split(f.area());

    render_header(f, app, chunks[0]);

    let columns = Layout::horizontal([
        Constraint::Length(layout::TREE_WIDTH),
        Constraint::Min(0),
    ])
    .split(chunks[1]);
    render_tree(f, app, columns[0]);
    render_panels(f, app, columns[1]);

    render_footer(f, app, chunks[2]);
    render_statusbar(f, app, chunks[3]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let counts = app.store.borrow().manual_attribution_counts();
    let chrome_color = if app.pending_quit {
        theme::ACCENT_ERROR
    } else {
        theme::ACCENT_PRIMARY
    };
    let header = Paragraph::new(format!(
        " lichen — {}   attributions: {} total, {} follow-up, {} pre-selected, {} first-party",
        app.input_file_name(),
        counts.total,
        counts.follow_up,
        counts.pre_selected,
        counts.first_party,
    ))
    .style(Style::default().fg(chrome_color));
    f.render_widget(header, area);
}

fn render_tree(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Tree;
    let items: Vec<ListItem> = app
        .visible_rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let marker = if !row.is_directory {
                "  "
            } else if row.expanded || row.resource_id == "/" {
                "▾ "
            } else {
                "▸ "
            };
            let name = display_name(&row.resource_id);
            let indent = " ".repeat(row.depth * layout::TREE_INDENT);
            let mut style = Style::default().fg(theme::TEXT_PRIMARY);
            if index == app.selected_index {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(vec![Span::styled(
                format!("{}{}{}", indent, marker, name),
                style,
            )]))
        })
        .collect();

    let border_color = if focused {
        theme::ACCENT_PRIMARY
    } else {
        theme::TEXT_MUTED
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Resources "),
    );
    f.render_widget(list, area);
}

fn render_panels(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = Layout::vertical([
        Constraint::Percentage(30),
        Constraint::Percentage(40),
        Constraint::Percentage(30),
    ])
    .split(area);

    let store = app.store.borrow();
    let external_attributions = &store.external.attributions;
    let manual_attributions = &store.manual.attributions;
    let resolved = store.resolved_external_attributions();

    render_attribution_list(
        f,
        rows[0],
        " Signals ",
        &app.direct_external.rows,
        external_attributions,
        |id| resolved.contains(id),
        None,
        false,
    );

    let contained_title = match app.contained_external.state {
        PanelState::AwaitingWorkerReply => {
            format!(" Signals in Folder Content {} ", spinner(app.frame()))
        }
        _ => " Signals in Folder Content ".to_string(),
    };
    render_attribution_list(
        f,
        rows[1],
        &contained_title,
        &app.contained_external.rows,
        external_attributions,
        |_| false,
        Some(app.panel_cursor),
        app.focus == Focus::Signals,
    );

    render_attribution_list(
        f,
        rows[2],
        " Attributions in Folder Content ",
        &app.contained_manual.rows,
        manual_attributions,
        |_| false,
        None,
        false,
    );
}

#[allow(clippy::too_many_arguments)]
fn render_attribution_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[AttributionIdWithCount],
    attributions: &Attributions,
    is_resolved: impl Fn(&str) -> bool,
    cursor: Option<usize>,
    focused: bool,
) {
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let label = attributions
                .get(&row.attribution_id)
                .map(|attribution| attribution.display_label())
                .unwrap_or_else(|| row.attribution_id.clone());
            let follow_up = attributions
                .get(&row.attribution_id)
                .map(|attribution| attribution.follow_up)
                .unwrap_or(false);

            let mut style = Style::default().fg(if is_resolved(&row.attribution_id) {
                theme::RESOLVED
            } else if follow_up {
                theme::FOLLOW_UP
            } else {
                theme::TEXT_PRIMARY
            });
            if cursor == Some(index) && focused {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(vec![Span::styled(
                format!("{:>3}  {}", row.count, label),
                style,
            )]))
        })
        .collect();

    let border_color = if focused {
        theme::ACCENT_PRIMARY
    } else {
        theme::TEXT_MUTED
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    f.render_widget(list, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.pending_quit {
        (
            "⚠ Press Ctrl+C again to quit".to_string(),
            Style::default().fg(theme::ACCENT_ERROR),
        )
    } else {
        let hints = match app.focus {
            Focus::Tree => "↑↓ navigate · ⏎ expand/collapse · Tab signals · s save · q quit",
            Focus::Signals => "↑↓ navigate · r resolve · a add to attributions · Tab tree · q quit",
        };
        (hints.to_string(), Style::default().fg(theme::TEXT_MUTED))
    };
    f.render_widget(Paragraph::new(format!(" {}", text)).style(style), area);
}

fn render_statusbar(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.stats.snapshot();
    let status = app.status().unwrap_or("");
    let line = format!(
        " {}  |  worker: {} queries, {} replies, {} fallbacks",
        status, stats.requests, stats.replies, stats.fallback_computations
    );
    f.render_widget(
        Paragraph::new(line).style(Style::default().fg(theme::TEXT_MUTED)),
        area,
    );
}

fn spinner(frame: u64) -> char {
    const FRAMES: [char; 4] = ['⠋', '⠙', '⠸', '⠴'];
    FRAMES[(frame % FRAMES.len() as u64) as usize]
}

/// Last path segment, keeping the trailing slash of directories.
fn display_name(resource_id: &str) -> &str {
    if resource_id == "/" {
        return "/";
    }
    let trimmed = resource_id.trim_end_matches('/');
    let start = trimmed.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    &resource_id[start..]
}
