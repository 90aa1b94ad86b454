#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, Once};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use snooze_core::{ClientError, Story, StoryDraft, Token, TransportFailure, UserProfile};
use snooze_engine::{AuthGrant, RemoteClient};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(snooze_logging::initialize_for_tests);
}

pub fn story(id: &str, username: &str) -> Story {
    Story::new(
        id,
        format!("title {id}"),
        "author",
        format!("https://{id}.example.com/post"),
        username,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

struct Account {
    password: String,
    name: String,
    favorites: Vec<String>,
}

#[derive(Default)]
struct Data {
    stories: Vec<Story>,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    next_id: u64,
}

impl Data {
    fn profile(&self, username: &str) -> Option<UserProfile> {
        let account = self.accounts.get(username)?;
        let favorites = account
            .favorites
            .iter()
            .filter_map(|id| self.stories.iter().find(|s| s.story_id() == id).cloned())
            .collect();
        let own_stories = self
            .stories
            .iter()
            .filter(|s| s.username() == username)
            .cloned()
            .collect();
        Some(UserProfile {
            username: username.to_string(),
            name: account.name.clone(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            favorites,
            own_stories,
        })
    }

    fn user_for(&self, token: &Token) -> Result<String, ClientError> {
        self.tokens
            .get(token.as_str())
            .cloned()
            .ok_or_else(|| ClientError::auth("invalid token"))
    }
}

/// In-memory stand-in for the story service with scriptable latency and faults.
#[derive(Default)]
pub struct FakeService {
    data: Mutex<Data>,
    profile_delays: Mutex<VecDeque<Duration>>,
    favorite_delay: Mutex<Option<Duration>>,
    favorite_failures: Mutex<VecDeque<ClientError>>,
    profile_failures: Mutex<VecDeque<ClientError>>,
    login_failures: Mutex<VecDeque<ClientError>>,
    calls: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_story(&self, story: Story) {
        self.data.lock().unwrap().stories.push(story);
    }

    /// Delays for successive profile fetches; the answer is computed before waiting.
    pub fn delay_profiles(&self, delays: impl IntoIterator<Item = Duration>) {
        self.profile_delays.lock().unwrap().extend(delays);
    }

    pub fn delay_favorites(&self, delay: Duration) {
        *self.favorite_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_next_favorite(&self, err: ClientError) {
        self.favorite_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_profile(&self, err: ClientError) {
        self.profile_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_login(&self, err: ClientError) {
        self.login_failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn server_favorites(&self, username: &str) -> Vec<String> {
        self.data.lock().unwrap().accounts[username].favorites.clone()
    }

    pub fn story_ids(&self) -> Vec<String> {
        self.data
            .lock()
            .unwrap()
            .stories
            .iter()
            .map(|s| s.story_id().to_string())
            .collect()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn grant(&self, data: &mut Data, username: &str) -> Result<AuthGrant, ClientError> {
        let raw = format!("token-{username}-{}", data.tokens.len() + 1);
        data.tokens.insert(raw.clone(), username.to_string());
        Ok(AuthGrant {
            token: Token::new(raw).unwrap(),
            profile: data.profile(username).unwrap(),
        })
    }

    async fn toggle(&self, token: &Token, story_id: &str, add: bool) -> Result<(), ClientError> {
        let delay = *self.favorite_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.favorite_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut data = self.data.lock().unwrap();
        let username = data.user_for(token)?;
        let favorites = &mut data.accounts.get_mut(&username).unwrap().favorites;
        favorites.retain(|id| id != story_id);
        if add {
            favorites.push(story_id.to_string());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteClient for FakeService {
    async fn list_stories(&self) -> Result<Vec<Story>, ClientError> {
        self.record("GET /stories");
        Ok(self.data.lock().unwrap().stories.clone())
    }

    async fn create_story(&self, token: &Token, draft: &StoryDraft) -> Result<Story, ClientError> {
        self.record("POST /stories");
        if draft.title.is_empty() {
            return Err(ClientError::validation("title required"));
        }
        let mut data = self.data.lock().unwrap();
        let username = data.user_for(token)?;
        data.next_id += 1;
        let story = Story::new(
            format!("story-{}", data.next_id),
            draft.title.clone(),
            draft.author.clone(),
            draft.url.clone(),
            username,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        );
        data.stories.insert(0, story.clone());
        Ok(story)
    }

    async fn delete_story(&self, token: &Token, story_id: &str) -> Result<(), ClientError> {
        self.record(format!("DELETE /stories/{story_id}"));
        let mut data = self.data.lock().unwrap();
        let username = data.user_for(token)?;
        let owner = data
            .stories
            .iter()
            .find(|s| s.story_id() == story_id)
            .map(|s| s.username().to_string())
            .ok_or_else(|| ClientError::validation("no such story"))?;
        if owner != username {
            return Err(ClientError::authorization("not your story"));
        }
        data.stories.retain(|s| s.story_id() != story_id);
        for account in data.accounts.values_mut() {
            account.favorites.retain(|id| id != story_id);
        }
        Ok(())
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthGrant, ClientError> {
        self.record("POST /signup");
        let mut data = self.data.lock().unwrap();
        if data.accounts.contains_key(username) {
            return Err(ClientError::validation("username taken"));
        }
        data.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                name: name.to_string(),
                favorites: Vec::new(),
            },
        );
        self.grant(&mut data, username)
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthGrant, ClientError> {
        self.record("POST /login");
        if let Some(err) = self.login_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut data = self.data.lock().unwrap();
        match data.accounts.get(username) {
            Some(account) if account.password == password => self.grant(&mut data, username),
            _ => Err(ClientError::auth("invalid credentials")),
        }
    }

    async fn get_user(&self, username: &str, token: &Token) -> Result<UserProfile, ClientError> {
        self.record(format!("GET /users/{username}"));
        if let Some(err) = self.profile_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let profile = {
            let data = self.data.lock().unwrap();
            if data.user_for(token)? != username {
                return Err(ClientError::auth("token does not match user"));
            }
            data.profile(username)
                .ok_or_else(|| ClientError::validation("no such user"))?
        };
        let delay = self.profile_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(profile)
    }

    async fn add_favorite(
        &self,
        username: &str,
        story_id: &str,
        token: &Token,
    ) -> Result<(), ClientError> {
        self.record(format!("POST /users/{username}/favorites/{story_id}"));
        self.toggle(token, story_id, true).await
    }

    async fn remove_favorite(
        &self,
        username: &str,
        story_id: &str,
        token: &Token,
    ) -> Result<(), ClientError> {
        self.record(format!("DELETE /users/{username}/favorites/{story_id}"));
        self.toggle(token, story_id, false).await
    }
}

pub fn unreachable_error() -> ClientError {
    ClientError::transport(TransportFailure::Network, "connection refused")
}
