use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{Story, StoryId};

/// Opaque bearer credential. Never empty.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Returns `None` for an empty (or all-whitespace) credential.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// The user record as the service sends it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub favorites: Vec<Story>,
    #[serde(default, rename = "stories")]
    pub own_stories: Vec<Story>,
}

/// Immutable snapshot of the authenticated user.
///
/// Every change produces a new snapshot with a higher `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    name: String,
    created_at: DateTime<Utc>,
    favorites: Vec<Story>,
    own_stories: Vec<Story>,
    token: Token,
    generation: u64,
}

impl Session {
    pub fn from_profile(profile: UserProfile, token: Token, generation: u64) -> Self {
        Self {
            username: profile.username,
            name: profile.name,
            created_at: profile.created_at,
            favorites: dedupe(profile.favorites),
            own_stories: dedupe(profile.own_stories),
            token,
            generation,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn favorites(&self) -> &[Story] {
        &self.favorites
    }

    pub fn own_stories(&self) -> &[Story] {
        &self.own_stories
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.favorites.iter().any(|story| story.story_id() == story_id)
    }

    /// Position within `favorites`; `None` when the story is not a favorite.
    pub fn favorite_index(&self, story_id: &str) -> Option<usize> {
        self.favorites
            .iter()
            .position(|story| story.story_id() == story_id)
    }

    pub fn owns_story(&self, story_id: &str) -> bool {
        self.own_story_index(story_id).is_some()
    }

    pub(crate) fn own_story_index(&self, story_id: &str) -> Option<usize> {
        self.own_stories
            .iter()
            .position(|story| story.story_id() == story_id)
    }

    pub(crate) fn with_favorite_at(&self, index: usize, story: Story, generation: u64) -> Self {
        let mut next = self.successor(generation);
        if !next.is_favorite(story.story_id()) {
            let index = index.min(next.favorites.len());
            next.favorites.insert(index, story);
        }
        next
    }

    pub(crate) fn without_favorite(&self, story_id: &str, generation: u64) -> Self {
        let mut next = self.successor(generation);
        next.favorites.retain(|story| story.story_id() != story_id);
        next
    }

    pub(crate) fn with_own_story_at(&self, index: usize, story: Story, generation: u64) -> Self {
        let mut next = self.successor(generation);
        if !next.owns_story(story.story_id()) {
            let index = index.min(next.own_stories.len());
            next.own_stories.insert(index, story);
        }
        next
    }

    pub(crate) fn without_story(&self, story_id: &StoryId, generation: u64) -> Self {
        let mut next = self.without_favorite(story_id, generation);
        next.own_stories.retain(|story| story.story_id() != story_id);
        next
    }

    fn successor(&self, generation: u64) -> Self {
        Self {
            generation,
            ..self.clone()
        }
    }
}

fn dedupe(stories: Vec<Story>) -> Vec<Story> {
    let mut unique: Vec<Story> = Vec::with_capacity(stories.len());
    for story in stories {
        if !unique.iter().any(|seen| seen.story_id() == story.story_id()) {
            unique.push(story);
        }
    }
    unique
}
