use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use snooze_core::{
    update, ClientError, Effect, FavoriteAction, Msg, Session, SessionState, Story, StoryDraft,
    StoryList, Token, TransportFailure,
};
use snooze_logging::{snooze_debug, snooze_info, snooze_warn};
use tokio_util::sync::CancellationToken;

use crate::remote::{AuthGrant, ClientSettings, RemoteClient, ReqwestRemoteClient};

/// The single live session owned by the presentation layer.
///
/// All snapshot replacement goes through the pure [`update`] function; the
/// state lock is never held across an `.await`.
pub struct SessionHandle {
    remote: Arc<dyn RemoteClient>,
    state: Mutex<SessionState>,
    cancel: Mutex<CancellationToken>,
}

/// What the remote service answered while draining an effect chain.
#[derive(Debug, Default)]
struct DriveReport {
    mutation: Option<Result<(), ClientError>>,
    created: Option<Result<Story, ClientError>>,
    refresh: Option<Result<(), ClientError>>,
}

impl DriveReport {
    fn record(&mut self, msg: &Msg) {
        match msg {
            Msg::MutationDone { result, .. } => self.mutation = Some(result.clone()),
            Msg::StoryCreated { result, .. } => self.created = Some(result.clone()),
            Msg::ProfileFetched { result, .. } => {
                self.refresh = Some(result.as_ref().map(|_| ()).map_err(Clone::clone));
            }
            _ => {}
        }
    }
}

impl SessionHandle {
    pub fn new(remote: Arc<dyn RemoteClient>) -> Self {
        Self {
            remote,
            state: Mutex::new(SessionState::new()),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn from_settings(settings: ClientSettings) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(ReqwestRemoteClient::new(settings)?)))
    }

    pub fn remote(&self) -> &dyn RemoteClient {
        self.remote.as_ref()
    }

    /// Current snapshot, `None` when logged out.
    pub fn current(&self) -> Option<Session> {
        self.lock_state().session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_state().is_authenticated()
    }

    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.lock_state()
            .session()
            .is_some_and(|session| session.is_favorite(story_id))
    }

    /// Whether the snapshot changed since the presentation layer last asked.
    pub fn consume_dirty(&self) -> bool {
        self.lock_state().consume_dirty()
    }

    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, ClientError> {
        let grant = self
            .guarded(self.remote.signup(username, password, name))
            .await?;
        snooze_info!("Signed up as {}", grant.profile.username);
        self.install(grant)
    }

    /// Rejected credentials come back as `ErrorKind::Auth`, network trouble as
    /// `ErrorKind::Transport`.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        match self.guarded(self.remote.login(username, password)).await {
            Ok(grant) => {
                snooze_info!("Logged in as {}", grant.profile.username);
                self.install(grant)
            }
            Err(err) => {
                snooze_warn!("Login for {} failed: {}", username, err);
                Err(err)
            }
        }
    }

    /// Resume a session from a stored token without a password.
    pub async fn restore_from_credentials(
        &self,
        token: &str,
        username: &str,
    ) -> Result<Session, ClientError> {
        let token = Token::new(token).ok_or_else(|| ClientError::auth("stored token is empty"))?;
        let profile = self
            .guarded(self.remote.get_user(username, &token))
            .await?;
        snooze_info!("Restored session for {}", profile.username);
        self.install(AuthGrant { token, profile })
    }

    pub fn logout(&self) {
        self.cancel_pending();
        self.dispatch(Msg::LoggedOut);
        snooze_info!("Logged out");
    }

    /// Re-fetch the profile. On failure the previous snapshot stays current,
    /// unless the token was rejected, which ends the session.
    pub async fn refresh(&self) -> Result<Session, ClientError> {
        let effects = self.begin(Msg::RefreshRequested, require_session)?;
        let report = self.drive(effects).await;
        if let Some(Err(err)) = report.refresh {
            snooze_warn!("Refresh failed: {}", err);
            return Err(err);
        }
        self.current().ok_or_else(ClientError::not_logged_in)
    }

    /// Flip the favorite flag of `story`, decided from the current snapshot.
    pub async fn toggle_favorite(&self, story: &Story) -> Result<Session, ClientError> {
        let effects = self.begin(
            Msg::FavoriteToggled {
                story: story.clone(),
            },
            require_session,
        )?;
        let report = self.drive(effects).await;
        if let Some(Err(err)) = report.mutation {
            snooze_warn!(
                "Favorite toggle for {} failed, rolled back: {}",
                story.story_id(),
                err
            );
            return Err(err);
        }
        self.settled(report.refresh)
    }

    /// Toggle by id. The story is taken from the session's favorites, or from
    /// `feed` when it is not a favorite yet.
    pub async fn toggle_favorite_by_id(
        &self,
        story_id: &str,
        feed: &StoryList,
    ) -> Result<Session, ClientError> {
        let known = self
            .current()
            .ok_or_else(ClientError::not_logged_in)?
            .favorites()
            .iter()
            .find(|story| story.story_id() == story_id)
            .cloned();
        let story = known
            .or_else(|| feed.get(story_id).cloned())
            .ok_or_else(|| ClientError::validation(format!("no story with id {story_id}")))?;
        self.toggle_favorite(&story).await
    }

    /// Abort every request currently awaiting the service.
    pub fn cancel_pending(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        cancel.cancel();
        *cancel = CancellationToken::new();
    }

    pub(crate) async fn create_story(&self, draft: StoryDraft) -> Result<Story, ClientError> {
        let effects = self.begin(Msg::StorySubmitted { draft }, require_session)?;
        let report = self.drive(effects).await;
        let story = report.created.ok_or_else(ClientError::not_logged_in)??;
        if let Some(Err(err)) = report.refresh {
            snooze_warn!("Story {} created but refresh failed: {}", story.story_id(), err);
        }
        Ok(story)
    }

    pub(crate) async fn delete_own_story(&self, story_id: &str) -> Result<(), ClientError> {
        let effects = self.begin(
            Msg::StoryDeleteRequested {
                story_id: story_id.to_string(),
            },
            |session| match session {
                None => Err(ClientError::not_logged_in()),
                Some(session) if !session.owns_story(story_id) => {
                    Err(ClientError::authorization(format!(
                        "story {story_id} does not belong to {}",
                        session.username()
                    )))
                }
                Some(_) => Ok(()),
            },
        )?;
        let report = self.drive(effects).await;
        report.mutation.ok_or_else(ClientError::not_logged_in)??;
        if let Some(Err(err)) = report.refresh {
            snooze_warn!("Story {} deleted but refresh failed: {}", story_id, err);
        }
        Ok(())
    }

    fn install(&self, grant: AuthGrant) -> Result<Session, ClientError> {
        let AuthGrant { token, profile } = grant;
        let mut guard = self.lock_state();
        let state = std::mem::take(&mut *guard);
        let (state, _effects) = update(state, Msg::SignedIn { profile, token });
        *guard = state;
        guard.session().cloned().ok_or_else(ClientError::not_logged_in)
    }

    /// Runs `check` and `msg` under one lock so the guard sees the snapshot the
    /// message is applied to.
    fn begin(
        &self,
        msg: Msg,
        check: impl FnOnce(Option<&Session>) -> Result<(), ClientError>,
    ) -> Result<Vec<Effect>, ClientError> {
        let mut guard = self.lock_state();
        check(guard.session())?;
        let state = std::mem::take(&mut *guard);
        let (state, effects) = update(state, msg);
        *guard = state;
        Ok(effects)
    }

    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.lock_state();
        let state = std::mem::take(&mut *guard);
        let (state, effects) = update(state, msg);
        *guard = state;
        effects
    }

    async fn drive(&self, effects: Vec<Effect>) -> DriveReport {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut report = DriveReport::default();
        while let Some(effect) = queue.pop_front() {
            let msg = self.execute(effect).await;
            report.record(&msg);
            queue.extend(self.dispatch(msg));
        }
        if let Some(outcome) = self.lock_state().last_refresh() {
            snooze_debug!("Last refresh outcome: {:?}", outcome);
        }
        report
    }

    async fn execute(&self, effect: Effect) -> Msg {
        match effect {
            Effect::SendFavorite {
                ticket,
                username,
                story_id,
                action,
                token,
            } => {
                snooze_debug!("Favorite {:?} story={} ticket={}", action, story_id, ticket);
                let result = match action {
                    FavoriteAction::Add => {
                        self.guarded(self.remote.add_favorite(&username, &story_id, &token))
                            .await
                    }
                    FavoriteAction::Remove => {
                        self.guarded(self.remote.remove_favorite(&username, &story_id, &token))
                            .await
                    }
                };
                Msg::MutationDone { ticket, result }
            }
            Effect::CreateStory {
                ticket,
                draft,
                token,
            } => {
                snooze_debug!("Create story ticket={}", ticket);
                let result = self.guarded(self.remote.create_story(&token, &draft)).await;
                Msg::StoryCreated { ticket, result }
            }
            Effect::DeleteStory {
                ticket,
                story_id,
                token,
            } => {
                snooze_debug!("Delete story={} ticket={}", story_id, ticket);
                let result = self.guarded(self.remote.delete_story(&token, &story_id)).await;
                Msg::MutationDone { ticket, result }
            }
            Effect::FetchProfile {
                ticket,
                username,
                token,
            } => {
                snooze_debug!("Refresh profile ticket={}", ticket);
                let result = self.guarded(self.remote.get_user(&username, &token)).await;
                Msg::ProfileFetched { ticket, result }
            }
        }
    }

    async fn guarded<T, F>(&self, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        tokio::select! {
            _ = cancel.cancelled() => Err(ClientError::transport(
                TransportFailure::Cancelled,
                "request cancelled",
            )),
            result = request => result,
        }
    }

    /// Result of a mutation that reached the service: the snapshot stands even
    /// if the follow-up refresh failed, unless that failure ended the session.
    fn settled(&self, refresh: Option<Result<(), ClientError>>) -> Result<Session, ClientError> {
        match (self.current(), refresh) {
            (Some(session), Some(Err(err))) => {
                snooze_warn!(
                    "Refresh after mutation failed, keeping generation {}: {}",
                    session.generation(),
                    err
                );
                Ok(session)
            }
            (Some(session), _) => Ok(session),
            (None, Some(Err(err))) => Err(err),
            (None, _) => Err(ClientError::not_logged_in()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn require_session(session: Option<&Session>) -> Result<(), ClientError> {
    session.map(|_| ()).ok_or_else(ClientError::not_logged_in)
}
