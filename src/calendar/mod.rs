use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::macros::format_description;
use time::{Date, Duration, Month};

use crate::posts::{Post, PostIndex};

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ViewMode {
    #[default]
    Month,
    Week,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: Date,
    pub key: String,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCell {
    Empty { key: String },
    Day(DayCell),
}

impl CalendarCell {
    pub fn key(&self) -> &str {
        match self {
            CalendarCell::Empty { key } => key,
            CalendarCell::Day(day) => &day.key,
        }
    }

    pub fn date(&self) -> Option<Date> {
        match self {
            CalendarCell::Empty { .. } => None,
            CalendarCell::Day(day) => Some(day.date),
        }
    }

    pub fn posts(&self) -> &[Post] {
        match self {
            CalendarCell::Empty { .. } => &[],
            CalendarCell::Day(day) => &day.posts,
        }
    }
}

/// Cells visible for `anchor` in `mode`, each day joined with its posts.
///
/// Month view yields the leading padding for the first week followed by every
/// day of the month; the last row is left open. Week view yields the seven
/// days from the Sunday on or before `anchor`.
pub fn compute_cells(anchor: Date, mode: ViewMode, posts: &PostIndex) -> Vec<CalendarCell> {
    visible_dates(anchor, mode)
        .into_iter()
        .enumerate()
        .map(|(idx, date)| match date {
            None => CalendarCell::Empty {
                key: format!("empty-{idx}"),
            },
            Some(date) => {
                let key = date_key(date);
                let posts = posts.posts_on(&key);
                CalendarCell::Day(DayCell { date, key, posts })
            }
        })
        .collect()
}

/// Grid layout without the post join; `None` marks a padding slot.
pub fn visible_dates(anchor: Date, mode: ViewMode) -> Vec<Option<Date>> {
    match mode {
        ViewMode::Month => {
            let first = anchor.replace_day(1).unwrap_or(anchor);
            let padding = weekday_index(first) as usize;
            let days = days_in_month(anchor.year(), anchor.month());
            let mut slots = Vec::with_capacity(padding + days as usize);
            slots.extend(std::iter::repeat(None).take(padding));
            slots.extend((0..i64::from(days)).map(|offset| first.checked_add(Duration::days(offset))));
            slots
        }
        ViewMode::Week => {
            let start = start_of_week(anchor);
            (0..7)
                .filter_map(|offset| start.checked_add(Duration::days(offset)))
                .map(Some)
                .collect()
        }
    }
}

/// Sunday-based weekday index (Sunday = 0).
pub fn weekday_index(date: Date) -> u8 {
    date.weekday().number_days_from_sunday()
}

pub fn start_of_week(date: Date) -> Date {
    date.checked_sub(Duration::days(i64::from(weekday_index(date))))
        .unwrap_or(date)
}

pub fn days_in_month(year: i32, month: Month) -> u8 {
    time::util::days_in_year_month(year, month)
}

/// Moves `date` by whole months keeping the day of month. A day past the end
/// of the target month rolls forward into the following month, so January 31
/// plus one month lands on March 2 (or March 3 in a common year).
pub fn shift_months(date: Date, months: i32) -> Option<Date> {
    let absolute = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = absolute.div_euclid(12);
    let month = Month::try_from((absolute.rem_euclid(12) + 1) as u8).ok()?;
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    first.checked_add(Duration::days(i64::from(date.day()) - 1))
}

pub fn step(anchor: Date, mode: ViewMode, direction: Direction) -> Date {
    let moved = match (mode, direction) {
        (ViewMode::Week, Direction::Back) => anchor.checked_sub(Duration::weeks(1)),
        (ViewMode::Week, Direction::Next) => anchor.checked_add(Duration::weeks(1)),
        (ViewMode::Month, Direction::Back) => shift_months(anchor, -1),
        (ViewMode::Month, Direction::Next) => shift_months(anchor, 1),
    };
    moved.unwrap_or(anchor)
}

pub fn date_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn parse_date_key(input: &str) -> Option<Date> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn header_label(anchor: Date) -> String {
    format!("{} {}", anchor.month(), anchor.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::{sample_posts, NewPost};
    use assert_matches::assert_matches;
    use time::macros::date;
    use time::Weekday;

    fn dates(cells: &[CalendarCell]) -> Vec<Date> {
        cells.iter().filter_map(CalendarCell::date).collect()
    }

    fn leading_empty(cells: &[CalendarCell]) -> usize {
        cells
            .iter()
            .take_while(|cell| matches!(cell, CalendarCell::Empty { .. }))
            .count()
    }

    #[test]
    fn month_view_pads_to_first_weekday() {
        let index = PostIndex::new();
        // June 2024 starts on a Saturday.
        let cells = compute_cells(date!(2024 - 06 - 19), ViewMode::Month, &index);
        assert_eq!(leading_empty(&cells), 6);
        assert_eq!(cells.len(), 6 + 30);
        let days = dates(&cells);
        assert_eq!(days.first(), Some(&date!(2024 - 06 - 01)));
        assert_eq!(days.last(), Some(&date!(2024 - 06 - 30)));
        assert!(days.windows(2).all(|pair| pair[1] == pair[0].next_day().unwrap()));
    }

    #[test]
    fn month_view_covers_every_month_length() {
        let index = PostIndex::new();
        let cases = [
            (date!(2023 - 02 - 10), 28, 3),
            (date!(2024 - 02 - 10), 29, 4),
            (date!(2024 - 09 - 30), 30, 0),
            (date!(2024 - 12 - 31), 31, 0),
        ];
        for (anchor, days, padding) in cases {
            let cells = compute_cells(anchor, ViewMode::Month, &index);
            assert_eq!(leading_empty(&cells), padding, "padding for {anchor}");
            assert_eq!(dates(&cells).len(), days, "days for {anchor}");
        }
    }

    #[test]
    fn empty_cells_have_stable_keys() {
        let index = PostIndex::new();
        let cells = compute_cells(date!(2024 - 06 - 01), ViewMode::Month, &index);
        assert_eq!(cells[0].key(), "empty-0");
        assert_eq!(cells[5].key(), "empty-5");
        assert_eq!(cells[6].key(), "2024-06-01");
    }

    #[test]
    fn week_view_starts_on_sunday_and_spans_seven_days() {
        let index = PostIndex::new();
        let cells = compute_cells(date!(2024 - 06 - 19), ViewMode::Week, &index);
        let days = dates(&cells);
        assert_eq!(cells.len(), 7);
        assert_eq!(days[0], date!(2024 - 06 - 16));
        assert_eq!(days[0].weekday(), Weekday::Sunday);
        assert_eq!(days[6], date!(2024 - 06 - 22));
    }

    #[test]
    fn week_view_crosses_year_boundary() {
        let index = PostIndex::new();
        let from_new_year = dates(&compute_cells(date!(2025 - 01 - 01), ViewMode::Week, &index));
        assert_eq!(from_new_year[0], date!(2024 - 12 - 29));
        assert_eq!(from_new_year[6], date!(2025 - 01 - 04));

        let from_new_years_eve = dates(&compute_cells(date!(2024 - 12 - 31), ViewMode::Week, &index));
        assert_eq!(from_new_year, from_new_years_eve);
    }

    #[test]
    fn anchor_on_sunday_is_its_own_week_start() {
        assert_eq!(start_of_week(date!(2024 - 06 - 16)), date!(2024 - 06 - 16));
        assert_eq!(start_of_week(date!(2024 - 03 - 02)), date!(2024 - 02 - 25));
    }

    #[test]
    fn cells_carry_posts_for_their_date() {
        let mut index = PostIndex::from_seed(sample_posts());
        index.insert(NewPost::new("2024-06-20", "Thread", "X"));
        let cells = compute_cells(date!(2024 - 06 - 19), ViewMode::Month, &index);
        let june_19 = cells
            .iter()
            .find(|cell| cell.key() == "2024-06-19")
            .expect("cell for june 19");
        assert_matches!(june_19, CalendarCell::Day(day) if day.posts.len() == 2);
        let labels: Vec<String> = june_19.posts().iter().map(Post::label).collect();
        assert_eq!(
            labels,
            vec!["LinkedIn Post 1 (LinkedIn)", "Instagram Post 1 (Instagram)"]
        );
        let total: usize = cells.iter().map(|cell| cell.posts().len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn shift_months_rolls_overflowing_days_forward() {
        assert_eq!(shift_months(date!(2024 - 01 - 31), 1), Some(date!(2024 - 03 - 02)));
        assert_eq!(shift_months(date!(2023 - 01 - 31), 1), Some(date!(2023 - 03 - 03)));
        assert_eq!(shift_months(date!(2024 - 03 - 31), -1), Some(date!(2024 - 03 - 02)));
        assert_eq!(shift_months(date!(2024 - 12 - 15), 1), Some(date!(2025 - 01 - 15)));
        assert_eq!(shift_months(date!(2025 - 01 - 15), -1), Some(date!(2024 - 12 - 15)));
    }

    #[test]
    fn step_moves_by_week_or_month() {
        let anchor = date!(2024 - 12 - 28);
        assert_eq!(step(anchor, ViewMode::Week, Direction::Next), date!(2025 - 01 - 04));
        assert_eq!(step(anchor, ViewMode::Week, Direction::Back), date!(2024 - 12 - 21));
        assert_eq!(step(anchor, ViewMode::Month, Direction::Next), date!(2025 - 01 - 28));
        assert_eq!(step(anchor, ViewMode::Month, Direction::Back), date!(2024 - 11 - 28));
    }

    #[test]
    fn date_keys_round_trip_and_reject_garbage() {
        assert_eq!(date_key(date!(2024 - 06 - 09)), "2024-06-09");
        assert_eq!(parse_date_key("2024-06-09"), Some(date!(2024 - 06 - 09)));
        assert_eq!(parse_date_key("2024-02-30"), None);
        assert_eq!(parse_date_key("tomorrow"), None);
    }

    #[test]
    fn header_uses_month_name_and_year() {
        assert_eq!(header_label(date!(2024 - 09 - 01)), "September 2024");
    }

    #[test]
    fn view_mode_parses_case_insensitively() {
        assert_eq!("week".parse::<ViewMode>().ok(), Some(ViewMode::Week));
        assert_eq!("Month".parse::<ViewMode>().ok(), Some(ViewMode::Month));
        assert_eq!(ViewMode::Week.to_string(), "week");
    }
}
