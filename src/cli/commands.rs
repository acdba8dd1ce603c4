use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use time::Date;

use crate::app::state::today;
use crate::app::App;
use crate::calendar::{self, CalendarCell, ViewMode, WEEKDAY_NAMES};
use crate::config::AppConfig;
use crate::posts::PostIndex;

#[derive(Args, Debug, Clone)]
pub struct GridArgs {
    /// month or week (defaults to `default_view` from the config)
    #[arg(long)]
    pub view: Option<ViewMode>,
    /// Anchor date as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DayArgs {
    /// Day to list, as YYYY-MM-DD
    pub date: String,
}

pub fn run_tui(config: Arc<AppConfig>, posts: PostIndex) -> Result<()> {
    let mut app = App::new(config, posts, today());
    app.run()
}

pub fn print_grid(config: &AppConfig, posts: &PostIndex, args: GridArgs) -> Result<()> {
    let anchor = match args.date.as_deref() {
        Some(raw) => parse_date_arg(raw)?,
        None => today(),
    };
    let view = args.view.unwrap_or(config.default_view);
    let output = render_grid(posts, anchor, view, atty::is(atty::Stream::Stdout));
    println!("{output}");
    Ok(())
}

pub fn print_day(posts: &PostIndex, args: DayArgs) -> Result<()> {
    let date = parse_date_arg(&args.date)?;
    println!("{}", format_day(posts, &calendar::date_key(date)));
    Ok(())
}

fn parse_date_arg(raw: &str) -> Result<Date> {
    calendar::parse_date_key(raw)
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

/// Plain-text grid: header, weekday row, one line per week (`*` marks days
/// with posts), then the posts in the visible range.
fn render_grid(posts: &PostIndex, anchor: Date, view: ViewMode, emphasize_today: bool) -> String {
    let cells = calendar::compute_cells(anchor, view, posts);
    let today = today();
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}", calendar::header_label(anchor));
    let weekdays: String = WEEKDAY_NAMES
        .iter()
        .map(|name| format!("{:>4}", &name[..3]))
        .collect();
    let _ = writeln!(&mut out, "{weekdays}");

    for week in cells.chunks(7) {
        let mut row = String::new();
        for cell in week {
            match cell {
                CalendarCell::Empty { .. } => row.push_str("    "),
                CalendarCell::Day(day) => {
                    let marker = if day.posts.is_empty() { ' ' } else { '*' };
                    let number = format!("{:>3}", day.date.day());
                    if emphasize_today && day.date == today {
                        let _ = write!(&mut row, "\x1b[1m{number}\x1b[0m{marker}");
                    } else {
                        let _ = write!(&mut row, "{number}{marker}");
                    }
                }
            }
        }
        let _ = writeln!(&mut out, "{}", row.trim_end());
    }

    let scheduled: Vec<String> = cells
        .iter()
        .flat_map(|cell| {
            cell.posts()
                .iter()
                .map(move |post| format!("{}  {}", cell.key(), post.label()))
        })
        .collect();
    out.push('\n');
    if scheduled.is_empty() {
        out.push_str("No posts in range.");
    } else {
        out.push_str(&scheduled.join("\n"));
    }
    out
}

fn format_day(posts: &PostIndex, date_key: &str) -> String {
    let labels: Vec<String> = posts.posts_on(date_key).iter().map(|p| p.label()).collect();
    if labels.is_empty() {
        format!("No posts on {date_key}.")
    } else {
        labels.join("\n")
    }
}
