use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{today, CalendarState, FormField};
use crate::calendar::{CalendarCell, DayCell, ViewMode, WEEKDAY_NAMES};
use crate::config::Palette;
use crate::posts::{Post, PostIndex};

/// Screen area of a drawn post label, used to route mouse clicks.
#[derive(Debug, Clone)]
pub struct PostHit {
    pub area: Rect,
    pub post: Post,
    pub date_key: String,
}

impl PostHit {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.x.saturating_add(self.area.width)
            && row >= self.area.y
            && row < self.area.y.saturating_add(self.area.height)
    }
}

pub fn draw_app(
    frame: &mut Frame,
    state: &CalendarState,
    posts: &PostIndex,
    palette: Palette,
    max_labels: u16,
) -> Vec<PostHit> {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    draw_header(frame, state, palette, vertical[0]);
    draw_weekdays(frame, palette, vertical[1]);
    let hits = draw_grid(frame, state, posts, palette, max_labels, vertical[2]);

    let status = build_status_line(state, posts, palette);
    frame.render_widget(Paragraph::new(status), vertical[3]);

    if state.is_popup_open() {
        render_popup(frame, state, posts, palette);
    }
    hits
}

fn draw_header(frame: &mut Frame, state: &CalendarState, palette: Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(inner);

    let toggle = |label: &'static str, active: bool| {
        if active {
            Span::styled(
                format!("[{label}]"),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            )
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(palette.muted))
        }
    };
    let view = state.view_mode();
    let toggles = Line::from(vec![
        toggle("Week", view == ViewMode::Week),
        Span::raw(" "),
        toggle("Month", view == ViewMode::Month),
    ]);
    frame.render_widget(Paragraph::new(toggles), columns[0]);

    let title = Paragraph::new(Line::from(Span::styled(
        state.header_label(),
        Style::default()
            .fg(palette.text)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, columns[1]);

    let buttons = Paragraph::new(Line::from(Span::styled(
        "◀ Back (p)  Today (t)  Next (n) ▶",
        Style::default().fg(palette.muted),
    )))
    .alignment(Alignment::Right);
    frame.render_widget(buttons, columns[2]);
}

fn draw_weekdays(frame: &mut Frame, palette: Palette, area: Rect) {
    let columns = seven_columns(area);
    for (name, column) in WEEKDAY_NAMES.iter().zip(columns.iter()) {
        let label = truncate_to_width(name, column.width as usize);
        let paragraph = Paragraph::new(Span::styled(
            label,
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, *column);
    }
}

fn draw_grid(
    frame: &mut Frame,
    state: &CalendarState,
    posts: &PostIndex,
    palette: Palette,
    max_labels: u16,
    area: Rect,
) -> Vec<PostHit> {
    let cells = state.cells(posts);
    let rows = cells.len().div_ceil(7).max(1);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);

    let today = today();
    let mut hits = Vec::new();
    for (row_idx, row_area) in row_areas.iter().enumerate() {
        let columns = seven_columns(*row_area);
        for (col_idx, column) in columns.iter().enumerate() {
            match cells.get(row_idx * 7 + col_idx) {
                Some(CalendarCell::Day(day)) => {
                    let ctx = DayContext {
                        is_cursor: day.date == state.cursor(),
                        is_today: day.date == today,
                        selected_post: state.cursor_post(),
                    };
                    hits.extend(draw_day(frame, day, ctx, palette, max_labels, *column));
                }
                Some(CalendarCell::Empty { .. }) | None => {
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(palette.padding));
                    frame.render_widget(block, *column);
                }
            }
        }
    }
    hits
}

#[derive(Debug, Clone, Copy)]
struct DayContext {
    is_cursor: bool,
    is_today: bool,
    selected_post: usize,
}

fn draw_day(
    frame: &mut Frame,
    day: &DayCell,
    ctx: DayContext,
    palette: Palette,
    max_labels: u16,
    area: Rect,
) -> Vec<PostHit> {
    let mut day_style = Style::default().fg(palette.text);
    if ctx.is_today {
        day_style = day_style.fg(palette.today).add_modifier(Modifier::BOLD);
    }
    let border_style = if ctx.is_cursor {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.muted)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!("{}", day.date.day()), day_style));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return Vec::new();
    }

    let layout = label_layout(day.posts.len(), inner.height, max_labels);
    let width = inner.width as usize;
    let mut lines = Vec::with_capacity(layout.shown + 1);
    let mut hits = Vec::with_capacity(layout.shown);
    for (idx, post) in day.posts.iter().take(layout.shown).enumerate() {
        let mut style = Style::default().fg(palette.post);
        if ctx.is_cursor && idx == ctx.selected_post {
            style = style.bg(palette.cursor_bg).add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(Span::styled(
            truncate_to_width(&post.label(), width),
            style,
        )));
        hits.push(PostHit {
            area: Rect {
                x: inner.x,
                y: inner.y + idx as u16,
                width: inner.width,
                height: 1,
            },
            post: post.clone(),
            date_key: day.key.clone(),
        });
    }
    if layout.hidden > 0 {
        lines.push(Line::from(Span::styled(
            truncate_to_width(&format!("+{} more", layout.hidden), width),
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);
    hits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LabelLayout {
    shown: usize,
    hidden: usize,
}

fn label_layout(total: usize, height: u16, max_labels: u16) -> LabelLayout {
    let capacity = usize::from(height.min(max_labels.max(1)));
    if total <= capacity {
        return LabelLayout {
            shown: total,
            hidden: 0,
        };
    }
    // one line is given up for the overflow marker
    let shown = capacity.saturating_sub(1);
    LabelLayout {
        shown,
        hidden: total - shown,
    }
}

fn seven_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, 7); 7])
        .split(area)
}

fn build_status_line(state: &CalendarState, posts: &PostIndex, palette: Palette) -> Text<'static> {
    let mut spans = vec![
        Span::raw(format!("Posts: {} ", posts.len())),
        Span::raw(" | View: "),
        Span::styled(
            state.view_mode().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Cursor: "),
        Span::styled(
            crate::calendar::date_key(state.cursor()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(palette.accent),
        ));
    }

    let keys = Line::from(vec![
        Span::styled(
            "Keys: ",
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "w/m view • p/n back/next • t today • arrows move • Tab post • Enter open • q quit",
            Style::default().fg(palette.padding),
        ),
    ]);

    Text::from(vec![Line::from(spans), keys])
}

fn render_popup(frame: &mut Frame, state: &CalendarState, posts: &PostIndex, palette: Palette) {
    let popup = state.popup();
    let area = centered_rect(60, 45, frame.size());
    frame.render_widget(Clear, area);

    let platform = popup
        .post
        .and_then(|id| posts.get(id))
        .map(|post| post.platform.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let field_line = |value: &str, active: bool| {
        let mut display = value.to_string();
        if active {
            display.push('▌');
            Line::from(Span::styled(
                display,
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::raw(display))
        }
    };

    let label_style = Style::default().fg(palette.muted);
    let lines = vec![
        Line::from(Span::styled(
            "Edit Post",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Platform: {platform} • scheduled {}", popup.original_date_key),
            label_style,
        )),
        Line::from(""),
        Line::from(Span::styled("Title:", label_style)),
        field_line(&popup.form.title, popup.form.field == FormField::Title),
        Line::from(Span::styled("Date:", label_style)),
        field_line(&popup.form.date, popup.form.field == FormField::Date),
        Line::from(""),
        Line::from(Span::styled(
            "Enter Save • Ctrl-d Delete • Esc Close • Tab switch field • ↑/↓ change date",
            Style::default().fg(palette.muted),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Edit Post")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Cuts `text` to at most `width` display columns, marking the cut with `…`.
fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let glyph = UnicodeWidthStr::width(grapheme);
        if used + glyph + 1 > width {
            break;
        }
        out.push_str(grapheme);
        used += glyph;
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
