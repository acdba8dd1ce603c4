use time::{Date, Duration, OffsetDateTime};

use crate::calendar::{self, CalendarCell, Direction, ViewMode};
use crate::posts::{Post, PostId, PostIndex};

const MAX_FIELD_LEN: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Date,
}

/// Values typed into the edit popup. `save` reads these directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditForm {
    pub title: String,
    pub date: String,
    pub field: FormField,
}

impl EditForm {
    fn active_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Date => &mut self.date,
        }
    }
}

/// Edit popup. `original_date_key` is the key of the cell the post was opened
/// from and does not follow edits to `form.date`. It is kept for display and
/// logging only; saves and deletes go through `post`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupState {
    pub visible: bool,
    pub post: Option<PostId>,
    pub original_date_key: String,
    pub form: EditForm,
}

#[derive(Debug, Clone)]
pub struct CalendarState {
    view_mode: ViewMode,
    anchor: Date,
    popup: PopupState,
    cursor: Date,
    cursor_post: usize,
    pub status_message: Option<String>,
}

impl CalendarState {
    pub fn new(anchor: Date, view_mode: ViewMode) -> Self {
        Self {
            view_mode,
            anchor,
            popup: PopupState::default(),
            cursor: anchor,
            cursor_post: 0,
            status_message: None,
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn anchor(&self) -> Date {
        self.anchor
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn is_popup_open(&self) -> bool {
        self.popup.visible
    }

    pub fn cursor(&self) -> Date {
        self.cursor
    }

    pub fn cursor_post(&self) -> usize {
        self.cursor_post
    }

    pub fn header_label(&self) -> String {
        calendar::header_label(self.anchor)
    }

    pub fn cells(&self, posts: &PostIndex) -> Vec<CalendarCell> {
        calendar::compute_cells(self.anchor, self.view_mode, posts)
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode == mode {
            return;
        }
        tracing::debug!(from = %self.view_mode, to = %mode, "switching view");
        self.view_mode = mode;
        if !self.is_visible(self.cursor) {
            self.reset_cursor();
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.anchor = calendar::step(self.anchor, self.view_mode, direction);
        tracing::debug!(?direction, anchor = %self.anchor, "navigated");
        self.reset_cursor();
    }

    pub fn go_today(&mut self) {
        self.go_to(today());
    }

    pub fn go_to(&mut self, date: Date) {
        self.anchor = date;
        self.reset_cursor();
    }

    pub fn click_post(&mut self, post: &Post, date_key: &str) {
        tracing::debug!(post = %post.id, date_key, "opening post");
        self.popup = PopupState {
            visible: true,
            post: Some(post.id),
            original_date_key: date_key.to_owned(),
            form: EditForm {
                title: post.title.clone(),
                date: date_key.to_owned(),
                field: FormField::Title,
            },
        };
    }

    pub fn close_popup(&mut self) {
        self.popup = PopupState::default();
    }

    /// Writes the form back to the open post. Returns `false` without side
    /// effects when no post is open.
    pub fn save(&mut self, posts: &mut PostIndex) -> bool {
        if !self.popup.visible {
            return false;
        }
        let Some(id) = self.popup.post else {
            return false;
        };
        let EditForm { title, date, .. } = &self.popup.form;
        let updated = posts.update_post(id, title, date);
        if updated {
            tracing::info!(post = %id, from = %self.popup.original_date_key, to = %date, "post saved");
        } else {
            tracing::warn!(post = %id, "post vanished before save");
        }
        self.close_popup();
        self.clamp_cursor_post(posts);
        updated
    }

    pub fn delete(&mut self, posts: &mut PostIndex) -> bool {
        let Some(id) = self.popup.post else {
            return false;
        };
        let removed = posts.remove_post(id).is_some();
        if removed {
            tracing::info!(post = %id, "post deleted");
        }
        self.close_popup();
        self.clamp_cursor_post(posts);
        removed
    }

    pub fn push_char(&mut self, ch: char) {
        if !self.popup.visible {
            return;
        }
        let field = self.popup.form.active_mut();
        if field.chars().count() < MAX_FIELD_LEN {
            field.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if self.popup.visible {
            self.popup.form.active_mut().pop();
        }
    }

    pub fn toggle_field(&mut self) {
        self.popup.form.field = match self.popup.form.field {
            FormField::Title => FormField::Date,
            FormField::Date => FormField::Title,
        };
    }

    /// Date-picker stepping: shifts the date field when it holds a valid key.
    pub fn step_form_date(&mut self, days: i64) -> bool {
        if !self.popup.visible {
            return false;
        }
        let Some(current) = calendar::parse_date_key(&self.popup.form.date) else {
            return false;
        };
        let Some(next) = current.checked_add(Duration::days(days)) else {
            return false;
        };
        self.popup.form.date = calendar::date_key(next);
        true
    }

    /// Moves the keyboard cursor; leaving the visible range re-anchors the
    /// view on the new date.
    pub fn move_cursor(&mut self, days: i64) {
        let Some(next) = self.cursor.checked_add(Duration::days(days)) else {
            return;
        };
        if !self.is_visible(next) {
            self.anchor = next;
        }
        self.cursor = next;
        self.cursor_post = 0;
    }

    pub fn cycle_post(&mut self, posts: &PostIndex) {
        let count = posts.posts_on(&calendar::date_key(self.cursor)).len();
        if count > 0 {
            self.cursor_post = (self.cursor_post + 1) % count;
        }
    }

    pub fn selected_post(&self, posts: &PostIndex) -> Option<Post> {
        posts
            .posts_on(&calendar::date_key(self.cursor))
            .into_iter()
            .nth(self.cursor_post)
    }

    pub fn open_selected(&mut self, posts: &PostIndex) -> bool {
        let Some(post) = self.selected_post(posts) else {
            return false;
        };
        let key = calendar::date_key(self.cursor);
        self.click_post(&post, &key);
        true
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    fn is_visible(&self, date: Date) -> bool {
        calendar::visible_dates(self.anchor, self.view_mode).contains(&Some(date))
    }

    fn reset_cursor(&mut self) {
        self.cursor = self.anchor;
        self.cursor_post = 0;
    }

    fn clamp_cursor_post(&mut self, posts: &PostIndex) {
        let count = posts.posts_on(&calendar::date_key(self.cursor)).len();
        if self.cursor_post >= count {
            self.cursor_post = count.saturating_sub(1);
        }
    }
}

pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}
