use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type StoryId = String;

/// One story as confirmed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    story_id: StoryId,
    title: String,
    author: String,
    url: String,
    username: String,
    created_at: DateTime<Utc>,
}

impl Story {
    pub fn new(
        story_id: impl Into<StoryId>,
        title: impl Into<String>,
        author: impl Into<String>,
        url: impl Into<String>,
        username: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            story_id: story_id.into(),
            title: title.into(),
            author: author.into(),
            url: url.into(),
            username: username.into(),
            created_at,
        }
    }

    pub fn story_id(&self) -> &str {
        &self.story_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Username of the poster.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn hostname(&self) -> &str {
        hostname_of(&self.url)
    }
}

/// Strip a leading `http://` or `https://` and cut at the first `/`.
///
/// Never fails: input without scheme or path comes back unchanged.
pub fn hostname_of(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    match rest.find('/') {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// User input for a new story, before the service assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    pub author: String,
    pub url: String,
}

/// Ordered feed of stories, in the order the service returned them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    /// Builds a list, keeping the first occurrence of any repeated id.
    pub fn new(stories: Vec<Story>) -> Self {
        let mut list = Self::default();
        for story in stories {
            list.push_confirmed(story);
        }
        list
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn get(&self, story_id: &str) -> Option<&Story> {
        self.stories.iter().find(|story| story.story_id == story_id)
    }

    pub fn contains(&self, story_id: &str) -> bool {
        self.get(story_id).is_some()
    }

    /// Appends a server-confirmed story. Returns false if the id is already listed.
    pub fn push_confirmed(&mut self, story: Story) -> bool {
        if self.contains(&story.story_id) {
            return false;
        }
        self.stories.push(story);
        true
    }

    pub fn remove(&mut self, story_id: &str) -> Option<Story> {
        let index = self
            .stories
            .iter()
            .position(|story| story.story_id == story_id)?;
        Some(self.stories.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_strips_scheme_and_path() {
        assert_eq!(hostname_of("https://example.com/a/b"), "example.com");
        assert_eq!(hostname_of("http://example.com/"), "example.com");
        assert_eq!(hostname_of("example.com/a"), "example.com");
        assert_eq!(hostname_of("https://example.com"), "example.com");
    }

    #[test]
    fn hostname_is_total_and_verbatim() {
        assert_eq!(hostname_of(""), "");
        assert_eq!(hostname_of("not a url"), "not a url");
        assert_eq!(hostname_of("HTTPS://Example.COM/x"), "HTTPS:");
        assert_eq!(hostname_of("ftp://host/x"), "ftp:");
        assert_eq!(hostname_of("https://Example.COM:8080/x"), "Example.COM:8080");
    }

    #[test]
    fn hostname_is_idempotent() {
        for url in [
            "https://example.com/a/b",
            "example.com/a",
            "https://https://nested/x",
            "http://",
            "plain",
        ] {
            let once = hostname_of(url);
            assert_eq!(hostname_of(once), once, "input {url:?}");
        }
    }
}
