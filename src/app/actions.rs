use crate::app::state::CalendarState;
use crate::calendar::{Direction, ViewMode};
use crate::posts::{Post, PostIndex};

/// Commands the calendar accepts, independent of how they were triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetView(ViewMode),
    Navigate(Direction),
    Today,
    MoveCursor(i64),
    CyclePost,
    OpenSelected,
    OpenPost { post: Post, date_key: String },
    Save,
    Delete,
    Close,
}

pub struct ActionDispatcher<'a> {
    state: &'a mut CalendarState,
    posts: &'a mut PostIndex,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(state: &'a mut CalendarState, posts: &'a mut PostIndex) -> Self {
        Self { state, posts }
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::SetView(mode) => {
                self.state.set_view_mode(mode);
                self.state
                    .set_status_message(Some(format!("{mode} view")));
            }
            Command::Navigate(direction) => self.state.navigate(direction),
            Command::Today => self.state.go_today(),
            Command::MoveCursor(days) => self.state.move_cursor(days),
            Command::CyclePost => self.state.cycle_post(self.posts),
            Command::OpenSelected => {
                if self.state.open_selected(self.posts) {
                    self.state.set_status_message(Some(
                        "Edit post: Tab switch field • Enter save • Ctrl-d delete • Esc close",
                    ));
                } else {
                    self.state
                        .set_status_message(Some("No post on the selected day"));
                }
            }
            Command::OpenPost { post, date_key } => {
                if self.posts.get(post.id).is_none() {
                    self.state
                        .set_status_message(Some("Post no longer exists"));
                    return;
                }
                self.state.click_post(&post, &date_key);
                self.state.set_status_message(Some(
                    "Edit post: Tab switch field • Enter save • Ctrl-d delete • Esc close",
                ));
            }
            Command::Save => {
                if !self.state.is_popup_open() {
                    return;
                }
                let message = if self.state.save(self.posts) {
                    "Post saved"
                } else {
                    "Post no longer exists"
                };
                self.state.set_status_message(Some(message));
            }
            Command::Delete => {
                if !self.state.is_popup_open() {
                    return;
                }
                let message = if self.state.delete(self.posts) {
                    "Post deleted"
                } else {
                    "Post no longer exists"
                };
                self.state.set_status_message(Some(message));
            }
            Command::Close => {
                self.state.close_popup();
                self.state.set_status_message(None::<String>);
            }
        }
    }
}
