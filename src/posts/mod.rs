use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostId(Uuid);

impl PostId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled post as held by the index. `date` is the `YYYY-MM-DD` key the
/// post is shown under; it is stored verbatim even when it does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub date: String,
    pub title: String,
    pub platform: String,
}

impl Post {
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.platform)
    }
}

/// Seed record: a post before the index has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub date: String,
    pub title: String,
    pub platform: String,
}

impl NewPost {
    pub fn new(date: impl Into<String>, title: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            platform: platform.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKey {
    pub date: String,
    pub title: String,
    pub platform: String,
}

impl MatchKey {
    pub fn new(date: &str, title: &str, platform: &str) -> Self {
        Self {
            date: date.to_owned(),
            title: title.to_owned(),
            platform: platform.to_owned(),
        }
    }

    fn matches(&self, post: &Post) -> bool {
        post.date == self.date && post.title == self.title && post.platform == self.platform
    }
}

/// Owns the post collection. Iteration order is insertion order and survives
/// removals.
#[derive(Debug, Clone, Default)]
pub struct PostIndex {
    posts: IndexMap<PostId, Post>,
}

impl PostIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: impl IntoIterator<Item = NewPost>) -> Self {
        let mut index = Self::new();
        for post in seed {
            index.insert(post);
        }
        index
    }

    pub fn insert(&mut self, post: NewPost) -> PostId {
        let id = PostId::generate();
        let NewPost {
            date,
            title,
            platform,
        } = post;
        self.posts.insert(
            id,
            Post {
                id,
                date,
                title,
                platform,
            },
        );
        id
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn get(&self, id: PostId) -> Option<&Post> {
        self.posts.get(&id)
    }

    pub fn posts_on(&self, date_key: &str) -> Vec<Post> {
        self.posts
            .values()
            .filter(|post| post.date == date_key)
            .cloned()
            .collect()
    }

    /// Rewrites every post whose (date, title, platform) equals `key`.
    /// Returns how many posts changed.
    pub fn update(&mut self, key: &MatchKey, new_title: &str, new_date: &str) -> usize {
        let mut updated = 0;
        for post in self.posts.values_mut() {
            if key.matches(post) {
                post.title = new_title.to_owned();
                post.date = new_date.to_owned();
                updated += 1;
            }
        }
        if updated > 1 {
            tracing::warn!(
                count = updated,
                date = %key.date,
                title = %key.title,
                "match key was shared by several posts; all were updated"
            );
        }
        updated
    }

    pub fn update_post(&mut self, id: PostId, new_title: &str, new_date: &str) -> bool {
        let Some(post) = self.posts.get_mut(&id) else {
            return false;
        };
        post.title = new_title.to_owned();
        post.date = new_date.to_owned();
        true
    }

    pub fn remove(&mut self, post: &Post) -> bool {
        self.remove_post(post.id).is_some()
    }

    pub fn remove_post(&mut self, id: PostId) -> Option<Post> {
        self.posts.shift_remove(&id)
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("reading seed file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing seed file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a JSON array of `{ "date", "title", "platform" }` records.
pub fn load_seed_file(path: &Path) -> Result<Vec<NewPost>, SeedError> {
    let raw = fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let posts: Vec<NewPost> = serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(count = posts.len(), path = %path.display(), "loaded seed posts");
    Ok(posts)
}

pub fn sample_posts() -> Vec<NewPost> {
    vec![
        NewPost::new("2024-06-19", "LinkedIn Post 1", "LinkedIn"),
        NewPost::new("2024-06-19", "Instagram Post 1", "Instagram"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn titles(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.title.as_str()).collect()
    }

    #[test]
    fn posts_on_returns_storage_order_and_is_repeatable() {
        let mut index = PostIndex::from_seed(sample_posts());
        index.insert(NewPost::new("2024-06-20", "Thread", "X"));
        let first = index.posts_on("2024-06-19");
        let second = index.posts_on("2024-06-19");
        assert_eq!(titles(&first), vec!["LinkedIn Post 1", "Instagram Post 1"]);
        assert_eq!(first, second);
        assert!(index.posts_on("2024-06-21").is_empty());
    }

    #[test]
    fn labels_include_platform() {
        let index = PostIndex::from_seed(sample_posts());
        let labels: Vec<String> = index.iter().map(Post::label).collect();
        assert_eq!(
            labels,
            vec!["LinkedIn Post 1 (LinkedIn)", "Instagram Post 1 (Instagram)"]
        );
    }

    #[test]
    fn update_moves_single_match_to_new_date() {
        let mut index = PostIndex::from_seed(sample_posts());
        let key = MatchKey::new("2024-06-19", "LinkedIn Post 1", "LinkedIn");
        assert_eq!(index.update(&key, "Moved", "2024-06-21"), 1);
        assert_eq!(titles(&index.posts_on("2024-06-21")), vec!["Moved"]);
        assert_eq!(
            titles(&index.posts_on("2024-06-19")),
            vec!["Instagram Post 1"]
        );
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn update_rewrites_every_value_equal_post() {
        let mut index = PostIndex::new();
        index.insert(NewPost::new("2024-01-01", "Same", "X"));
        index.insert(NewPost::new("2024-01-01", "Same", "X"));
        index.insert(NewPost::new("2024-01-01", "Same", "Threads"));
        let key = MatchKey::new("2024-01-01", "Same", "X");
        assert_eq!(index.update(&key, "Changed", "2024-01-01"), 2);
        assert_eq!(
            titles(&index.posts_on("2024-01-01")),
            vec!["Changed", "Changed", "Same"]
        );
    }

    #[test]
    fn update_without_match_is_a_no_op() {
        let mut index = PostIndex::from_seed(sample_posts());
        let key = MatchKey::new("2024-06-18", "LinkedIn Post 1", "LinkedIn");
        assert_eq!(index.update(&key, "Nope", "2024-06-01"), 0);
        assert_eq!(index.posts_on("2024-06-19").len(), 2);
    }

    #[test]
    fn remove_drops_post_and_keeps_order() {
        let mut index = PostIndex::from_seed(sample_posts());
        index.insert(NewPost::new("2024-06-19", "Reel", "Instagram"));
        let target = index.posts_on("2024-06-19")[1].clone();
        assert!(index.remove(&target));
        assert_eq!(
            titles(&index.posts_on("2024-06-19")),
            vec!["LinkedIn Post 1", "Reel"]
        );
    }

    #[test]
    fn removing_absent_post_keeps_count() {
        let mut index = PostIndex::from_seed(sample_posts());
        let target = index.posts_on("2024-06-19")[0].clone();
        assert!(index.remove(&target));
        assert_eq!(index.len(), 1);
        assert!(!index.remove(&target));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn update_post_targets_only_the_given_id() {
        let mut index = PostIndex::new();
        let first = index.insert(NewPost::new("2024-01-01", "Same", "X"));
        let second = index.insert(NewPost::new("2024-01-01", "Same", "X"));
        assert!(index.update_post(second, "Only me", "2024-01-02"));
        assert_eq!(index.get(first).map(|p| p.title.as_str()), Some("Same"));
        assert_eq!(titles(&index.posts_on("2024-01-02")), vec!["Only me"]);
        assert!(index.remove_post(second).is_some());
        assert!(!index.update_post(second, "gone", "2024-01-03"));
    }

    #[test]
    fn seed_file_loads_records() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"[{{"date":"2024-07-04","title":"Launch","platform":"Mastodon"}}]"#
        )?;
        let posts = load_seed_file(file.path())?;
        assert_eq!(posts, vec![NewPost::new("2024-07-04", "Launch", "Mastodon")]);
        Ok(())
    }

    #[test]
    fn seed_file_errors_are_typed() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{{ not json")?;
        assert_matches!(load_seed_file(file.path()), Err(SeedError::Parse { .. }));

        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.json");
        assert_matches!(load_seed_file(&missing), Err(SeedError::Io { .. }));
        Ok(())
    }
}
