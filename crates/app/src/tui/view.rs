use super::model::{row_height, scroll_window, FormField, TuiModel, ViewMode};
use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use tagwatch_core::domain::{RefKind, RepoEntry, RepoStatus, StatusState};

/// Table columns and their fixed widths
pub const COLUMNS: [(&str, usize); 7] = [
    ("STATUS", 18),
    ("REPOSITORY", 30),
    ("BRANCH", 12),
    ("LAST TAG / RELEASE", 22),
    ("UNRELEASED", 14),
    ("NOTES", 24),
    ("CHECKED", 10),
];

const HEADER_HEIGHT: u16 = 9;
const DETAIL_INDENT: &str = "    ";
const PLACEHOLDER: &str = "—";

/// The View component of MVU - responsible for rendering the model
pub struct TuiView;

impl TuiView {
    pub fn render(model: &TuiModel, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT), // Title + overview
                Constraint::Min(4),                // Repository table
                Constraint::Length(1),             // Status line
                Constraint::Length(1),             // Key hints
            ])
            .split(size);

        Self::render_header(model, frame, chunks[0]);
        Self::render_table(model, frame, chunks[1]);
        Self::render_status_bar(model, frame, chunks[2]);
        Self::render_footer(model, frame, chunks[3]);

        if model.mode == ViewMode::AddRepo {
            Self::render_add_modal(model, frame, size);
        }
    }

    fn render_header(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(52), Constraint::Min(0)])
            .split(area);

        let title = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  tagwatch",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "  track unreleased changes",
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled(
                concat!("  v", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let title_panel = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        );
        frame.render_widget(title_panel, halves[0]);

        let overview = Paragraph::new(Self::overview_lines(model)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" overview ")
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(overview, halves[1]);
    }

    fn overview_lines(model: &TuiModel) -> Vec<Line<'static>> {
        let o = model.dashboard.overview();
        let faint = Style::default().fg(Color::DarkGray);
        let mut lines = vec![Line::from("")];

        if o.loading > 0 {
            lines.push(Line::styled(format!("  ⏳  checking {}...", o.loading), faint));
        }
        if o.behind > 0 {
            lines.push(Line::styled(
                format!("  ▲  {}  need deploy", o.behind),
                Style::default().fg(Color::Yellow),
            ));
        }
        if o.clean > 0 {
            lines.push(Line::styled(
                format!("  ✓  {}  up to date", o.clean),
                Style::default().fg(Color::Green),
            ));
        }
        if o.no_release > 0 {
            lines.push(Line::styled(
                format!("  ◈  {}  no release", o.no_release),
                Style::default().fg(Color::Blue),
            ));
        }
        if o.errors > 0 {
            lines.push(Line::styled(
                format!("  ✗  {}  failed", o.errors),
                Style::default().fg(Color::Red),
            ));
        }
        lines.push(Line::styled(format!("  ·  {}  repos", o.total), faint));

        if !model.authenticated {
            lines.push(Line::from(""));
            lines.push(Line::styled("  ⚠  no auth · set GITHUB_TOKEN", faint));
        }
        lines
    }

    fn render_table(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" repositories ")
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let header: String = COLUMNS.iter().map(|(title, w)| fit(title, *w)).collect();
        frame.render_widget(
            Paragraph::new(header).style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            sections[0],
        );

        let dashboard = &model.dashboard;
        if dashboard.entries().is_empty() {
            let empty = Paragraph::new("No repositories tracked. Press 'a' to add one.")
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center);
            frame.render_widget(empty, sections[1]);
            return;
        }

        let data_height = usize::from(sections[1].height).max(1);
        let (start, end) = scroll_window(dashboard, dashboard.cursor(), data_height);

        let mut items = Vec::new();
        let mut used = 0;
        for (index, entry) in dashboard.entries().iter().enumerate().take(end).skip(start) {
            items.push(Self::render_row(model, index, entry, usize::from(inner.width)));
            used += row_height(dashboard, entry);
            if used >= data_height {
                break;
            }
        }

        frame.render_widget(List::new(items), sections[1]);
    }

    fn render_row(model: &TuiModel, index: usize, entry: &RepoEntry, width: usize) -> ListItem<'static> {
        let dashboard = &model.dashboard;
        let key = entry.key();
        let status = dashboard.status(&key);

        let row_style = if index == dashboard.cursor() {
            Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
        } else if index % 2 == 0 {
            Style::default()
        } else {
            Style::default().bg(Color::Black)
        };

        let spans: Vec<Span<'static>> = Self::row_cells(model, entry, status)
            .into_iter()
            .zip(COLUMNS.iter())
            .map(|((text, style), (_, w))| Span::styled(fit(&text, *w), style))
            .collect();

        let mut lines = vec![Line::from(spans)];
        if dashboard.is_expanded(&key) {
            if let Some(status) = status.filter(|s| s.state == StatusState::Behind) {
                lines.extend(Self::detail_lines(status, width));
            }
        }

        ListItem::new(Text::from(lines)).style(row_style)
    }

    fn row_cells(
        model: &TuiModel,
        entry: &RepoEntry,
        status: Option<&RepoStatus>,
    ) -> Vec<(String, Style)> {
        let faint = Style::default().fg(Color::DarkGray);
        let dash = || (PLACEHOLDER.to_string(), faint);
        let loading = model.dashboard.is_loading(&entry.key());

        let status_cell = if loading {
            (
                format!("{} checking", model.spinner()),
                Style::default().fg(Color::Gray),
            )
        } else {
            match status.map(|s| s.state) {
                Some(state) => state_badge(state),
                None => dash(),
            }
        };
        let repo_cell = (
            entry.target.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        );
        let notes_cell = (entry.notes.clone(), Style::default().fg(Color::Gray));

        let Some(s) = status else {
            return vec![status_cell, repo_cell, dash(), dash(), dash(), notes_cell, dash()];
        };

        let branch_cell = if s.default_branch.is_empty() {
            dash()
        } else {
            (s.default_branch.clone(), Style::default().fg(Color::Cyan))
        };

        let tag_cell = match s.ref_kind {
            RefKind::None => dash(),
            RefKind::Release => (
                format!("⬡ {}", s.ref_name),
                Style::default().fg(Color::Magenta),
            ),
            RefKind::Tag => (
                format!("⬢ {}", s.ref_name),
                Style::default().fg(Color::Magenta),
            ),
        };

        let unreleased_cell = match s.state {
            StatusState::Behind => (
                format!("+{} commit(s)", s.commits_ahead),
                Style::default().fg(Color::Yellow),
            ),
            StatusState::Clean => ("0".to_string(), Style::default().fg(Color::Green)),
            StatusState::Error => (s.error_message.clone(), Style::default().fg(Color::Red)),
            _ => dash(),
        };

        let checked_cell = (local_time(s.checked_at, "%H:%M:%S"), faint);

        vec![
            status_cell,
            repo_cell,
            branch_cell,
            tag_cell,
            unreleased_cell,
            notes_cell,
            checked_cell,
        ]
    }

    /// Commit lines under an expanded row
    fn detail_lines(status: &RepoStatus, width: usize) -> Vec<Line<'static>> {
        const DATE_WIDTH: usize = 18;
        const GAP: &str = "   ";
        let prefix = DETAIL_INDENT.len() + DATE_WIDTH + GAP.len() * 2 + 7;
        let max_headline = width.saturating_sub(prefix + 2).max(10);

        let mut lines: Vec<Line<'static>> = status
            .recent_commits
            .iter()
            .map(|c| {
                let date = c
                    .timestamp
                    .map(|t| local_time(t, "%H:%M:%S %d-%b-%y"))
                    .unwrap_or_default();
                Line::from(vec![
                    Span::raw(DETAIL_INDENT),
                    Span::styled(
                        format!("{:<width$}", date, width = DATE_WIDTH),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(GAP),
                    Span::styled(c.short_id.clone(), Style::default().fg(Color::Blue)),
                    Span::raw(GAP),
                    Span::styled(
                        truncate(&c.headline, max_headline),
                        Style::default().fg(Color::Gray),
                    ),
                ])
            })
            .collect();

        let hidden = status.hidden_commits();
        if hidden > 0 {
            lines.push(Line::from(vec![
                Span::raw(DETAIL_INDENT),
                Span::styled(
                    format!("+ {} more commits...", hidden),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]));
        }
        lines
    }

    fn render_status_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let text = model
            .dashboard
            .status_message()
            .map(|m| format!("  {}", m))
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::Gray)),
            area,
        );
    }

    fn render_footer(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let hints: &[(&str, &str)] = match model.mode {
            ViewMode::Dashboard => &[
                ("enter", "expand"),
                ("E/C", "expand/collapse all"),
                ("r", "refresh all"),
                ("a", "add"),
                ("d", "delete"),
                ("o", "browser"),
                ("?", "help"),
                ("q", "quit"),
            ],
            ViewMode::AddRepo => &[
                ("enter", "confirm"),
                ("tab", "next field"),
                ("esc", "cancel"),
            ],
        };

        let mut spans = Vec::new();
        for (key, action) in hints {
            spans.push(Span::styled(
                format!(" {} ", key),
                Style::default().fg(Color::Black).bg(Color::Gray),
            ));
            spans.push(Span::styled(
                format!(" {}  ", action),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(area);
        frame.render_widget(Paragraph::new(Line::from(spans)), halves[0]);
        frame.render_widget(
            Paragraph::new(Local::now().format("%H:%M").to_string())
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Right),
            halves[1],
        );
    }

    fn render_add_modal(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(56, 13, area);
        frame.render_widget(Clear, popup);

        let mut lines = vec![Line::from("")];
        for field in FormField::ALL {
            let focused = model.form.focused == field;
            let value = model.form.value(field);

            let label_style = if focused {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::styled(format!("  {}", field.label()), label_style));

            let input = if value.is_empty() && !focused {
                Span::styled(
                    format!("  {}", field.placeholder()),
                    Style::default().fg(Color::DarkGray),
                )
            } else if focused {
                Span::raw(format!("  {}▏", value))
            } else {
                Span::raw(format!("  {}", value))
            };
            lines.push(Line::from(input));
            lines.push(Line::from(""));
        }

        let modal = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" ➕  Add Repository ")
                .border_style(Style::default().fg(Color::Magenta)),
        );
        frame.render_widget(modal, popup);
    }
}

fn state_badge(state: StatusState) -> (String, Style) {
    match state {
        StatusState::Behind => ("▲ need deploy".to_string(), Style::default().fg(Color::Yellow)),
        StatusState::Clean => ("✓ up to date".to_string(), Style::default().fg(Color::Green)),
        StatusState::NoRelease => ("◈ no release".to_string(), Style::default().fg(Color::Blue)),
        StatusState::Error => ("✗ error".to_string(), Style::default().fg(Color::Red)),
        StatusState::Loading => ("… loading".to_string(), Style::default().fg(Color::Gray)),
    }
}

fn local_time(at: DateTime<Utc>, format: &str) -> String {
    at.with_timezone(&Local).format(format).to_string()
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

/// Render `s` into a column `width` wide, keeping two columns of padding
pub fn fit(s: &str, width: usize) -> String {
    let text = truncate(s, width.saturating_sub(2));
    format!("{:<width$}", text, width = width)
}

/// A `width` x `height` rectangle centred in `r`, clipped to it
fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}
