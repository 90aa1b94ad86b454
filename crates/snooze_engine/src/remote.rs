use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snooze_core::{ClientError, Story, StoryDraft, Token, TransportFailure, UserProfile};
use snooze_logging::{snooze_debug, snooze_trace, snooze_warn};

use crate::wire::{
    AuthEnvelope, AuthRequest, CreateStoryRequest, Credentials, ErrorEnvelope, StoriesEnvelope,
    StoryEnvelope, TokenBody, UserEnvelope,
};

pub const DEFAULT_BASE_URL: &str = "https://hack-or-snooze-v3.herokuapp.com";

/// Statuses the service uses for an unknown user or a wrong password on login.
const LOGIN_REJECTIONS: &[u16] = &[400, 404];
/// A stored username that no longer exists is a dead credential.
const PROFILE_REJECTIONS: &[u16] = &[404];

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Token plus profile returned by signup and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: Token,
    pub profile: UserProfile,
}

/// The story service's REST surface.
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_stories(&self) -> Result<Vec<Story>, ClientError>;

    async fn create_story(&self, token: &Token, draft: &StoryDraft) -> Result<Story, ClientError>;

    async fn delete_story(&self, token: &Token, story_id: &str) -> Result<(), ClientError>;

    async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthGrant, ClientError>;

    async fn login(&self, username: &str, password: &str) -> Result<AuthGrant, ClientError>;

    async fn get_user(&self, username: &str, token: &Token) -> Result<UserProfile, ClientError>;

    async fn add_favorite(
        &self,
        username: &str,
        story_id: &str,
        token: &Token,
    ) -> Result<(), ClientError>;

    async fn remove_favorite(
        &self,
        username: &str,
        story_id: &str,
        token: &Token,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestRemoteClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestRemoteClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::validation(format!("invalid base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::validation(format!(
                "base url {base_url} cannot carry paths"
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self { base_url, client })
    }

    /// `segments` are percent-encoded individually, so ids cannot escape their slot.
    fn endpoint(&self, segments: &[&str], token: Option<&Token>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token.as_str());
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        snooze_debug!("{} {}", method, url.path());
        self.client.request(method, url)
    }

    fn with_json<T: Serialize>(
        builder: RequestBuilder,
        body: &T,
    ) -> Result<RequestBuilder, ClientError> {
        let payload = serde_json::to_vec(body).map_err(|err| {
            ClientError::validation(format!("could not encode request body: {err}"))
        })?;
        Ok(builder
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(payload))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Bytes, ClientError> {
        self.send_rejecting(builder, &[]).await
    }

    /// Like `send`, but `rejections` are reported as `Auth` on top of 401.
    async fn send_rejecting(
        &self,
        builder: RequestBuilder,
        rejections: &[u16],
    ) -> Result<Bytes, ClientError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        snooze_trace!("Response {} with {} bytes", status.as_u16(), body.len());
        if status.is_success() {
            return Ok(body);
        }

        let message = service_message(&body).unwrap_or_else(|| status.to_string());
        snooze_warn!("Request failed with status {}: {}", status.as_u16(), message);
        Err(match status.as_u16() {
            401 => ClientError::auth(message),
            code if rejections.contains(&code) => ClientError::auth(message),
            403 => ClientError::authorization(message),
            400..=499 => ClientError::validation(message),
            code => ClientError::transport(TransportFailure::HttpStatus(code), message),
        })
    }

    async fn authenticate<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        rejections: &[u16],
    ) -> Result<AuthGrant, ClientError> {
        let builder = Self::with_json(self.request(Method::POST, self.endpoint(&[path], None)), body)?;
        let envelope: AuthEnvelope = decode(&self.send_rejecting(builder, rejections).await?)?;
        let token = Token::new(envelope.token)
            .ok_or_else(|| ClientError::auth("service issued an empty token"))?;
        Ok(AuthGrant {
            token,
            profile: envelope.user,
        })
    }

    async fn favorite(
        &self,
        method: Method,
        username: &str,
        story_id: &str,
        token: &Token,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["users", username, "favorites", story_id], Some(token));
        self.send(self.request(method, url)).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl RemoteClient for ReqwestRemoteClient {
    async fn list_stories(&self) -> Result<Vec<Story>, ClientError> {
        let body = self
            .send(self.request(Method::GET, self.endpoint(&["stories"], None)))
            .await?;
        let envelope: StoriesEnvelope = decode(&body)?;
        Ok(envelope.stories)
    }

    async fn create_story(&self, token: &Token, draft: &StoryDraft) -> Result<Story, ClientError> {
        let request = CreateStoryRequest {
            token: token.as_str(),
            story: draft,
        };
        let builder = Self::with_json(
            self.request(Method::POST, self.endpoint(&["stories"], None)),
            &request,
        )?;
        let envelope: StoryEnvelope = decode(&self.send(builder).await?)?;
        Ok(envelope.story)
    }

    async fn delete_story(&self, token: &Token, story_id: &str) -> Result<(), ClientError> {
        let builder = Self::with_json(
            self.request(Method::DELETE, self.endpoint(&["stories", story_id], None)),
            &TokenBody {
                token: token.as_str(),
            },
        )?;
        self.send(builder).await.map(|_| ())
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthGrant, ClientError> {
        let request = AuthRequest {
            user: Credentials {
                username,
                password,
                name: Some(name),
            },
        };
        self.authenticate("signup", &request, &[]).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthGrant, ClientError> {
        let request = AuthRequest {
            user: Credentials {
                username,
                password,
                name: None,
            },
        };
        self.authenticate("login", &request, LOGIN_REJECTIONS).await
    }

    async fn get_user(&self, username: &str, token: &Token) -> Result<UserProfile, ClientError> {
        let url = self.endpoint(&["users", username], Some(token));
        let body = self
            .send_rejecting(self.request(Method::GET, url), PROFILE_REJECTIONS)
            .await?;
        let envelope: UserEnvelope = decode(&body)?;
        Ok(envelope.user)
    }

    async fn add_favorite(
        &self,
        username: &str,
        story_id: &str,
        token: &Token,
    ) -> Result<(), ClientError> {
        self.favorite(Method::POST, username, story_id, token).await
    }

    async fn remove_favorite(
        &self,
        username: &str,
        story_id: &str,
        token: &Token,
    ) -> Result<(), ClientError> {
        self.favorite(Method::DELETE, username, story_id, token).await
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body)
        .map_err(|err| ClientError::transport(TransportFailure::MalformedResponse, err.to_string()))
}

fn service_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::transport(TransportFailure::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::transport(TransportFailure::MalformedResponse, err.to_string());
    }
    ClientError::transport(TransportFailure::Network, err.to_string())
}
