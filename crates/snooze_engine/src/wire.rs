//! JSON envelopes exchanged with the story service.
use serde::{Deserialize, Serialize};
use snooze_core::{Story, StoryDraft, UserProfile};

#[derive(Debug, Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub user: Credentials<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateStoryRequest<'a> {
    pub token: &'a str,
    pub story: &'a StoryDraft,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenBody<'a> {
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoriesEnvelope {
    pub stories: Vec<Story>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryEnvelope {
    pub story: Story,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthEnvelope {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
