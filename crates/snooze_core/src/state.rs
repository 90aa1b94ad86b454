use std::collections::BTreeMap;

use crate::{
    ClientError, Effect, FavoriteAction, Session, Story, StoryDraft, StoryId, Token, UserProfile,
};

/// Sequence number handed out for every issued request and every new snapshot.
pub type Ticket = u64;

/// What happened to the most recent profile fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Became the current snapshot.
    Applied,
    /// Issued before a mutation settled (or was superseded); dropped.
    Stale,
    /// Request failed; the previous snapshot stays current.
    Failed,
    /// Token rejected; the state is anonymous now.
    SessionEnded,
    /// Addressed to a session that no longer exists.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Favorite {
        story: Story,
        action: FavoriteAction,
        index: usize,
    },
    Create,
    Delete {
        story_id: StoryId,
    },
}

/// Client-side session state: the current snapshot plus the bookkeeping that
/// decides which server answers may replace it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    session: Option<Session>,
    seq: Ticket,
    signed_in_at: Ticket,
    in_flight: BTreeMap<Ticket, Pending>,
    last_completion: Ticket,
    last_refresh_applied: Ticket,
    last_refresh: Option<RefreshOutcome>,
    dirty: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Number of favorite/create/delete requests awaiting an answer.
    pub fn pending_mutations(&self) -> usize {
        self.in_flight.len()
    }

    pub fn last_refresh(&self) -> Option<RefreshOutcome> {
        self.last_refresh
    }

    /// Returns whether the snapshot changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn sign_in(&mut self, profile: UserProfile, token: Token) {
        let generation = self.next_seq();
        self.session = Some(Session::from_profile(profile, token, generation));
        self.reset_sync(generation);
    }

    pub(crate) fn sign_out(&mut self) {
        let generation = self.next_seq();
        self.session = None;
        self.reset_sync(generation);
    }

    pub(crate) fn begin_favorite_toggle(&mut self, story: Story) -> Option<Effect> {
        let story_id = story.story_id().to_owned();
        let (action, index, username, token) = {
            let session = self.session.as_ref()?;
            let (action, index) = match session.favorite_index(&story_id) {
                Some(index) => (FavoriteAction::Remove, index),
                None => (FavoriteAction::Add, session.favorites().len()),
            };
            (
                action,
                index,
                session.username().to_owned(),
                session.token().clone(),
            )
        };

        let ticket = self.next_seq();
        let patched = self.session.as_ref().map(|session| match action {
            FavoriteAction::Add => session.with_favorite_at(index, story.clone(), ticket),
            FavoriteAction::Remove => session.without_favorite(&story_id, ticket),
        })?;
        self.replace(patched);
        self.in_flight.insert(
            ticket,
            Pending::Favorite {
                story,
                action,
                index,
            },
        );

        Some(Effect::SendFavorite {
            ticket,
            username,
            story_id,
            action,
            token,
        })
    }

    pub(crate) fn begin_create(&mut self, draft: StoryDraft) -> Option<Effect> {
        let token = self.session.as_ref()?.token().clone();
        let ticket = self.next_seq();
        self.in_flight.insert(ticket, Pending::Create);
        Some(Effect::CreateStory {
            ticket,
            draft,
            token,
        })
    }

    /// Only the owner's own stories produce a delete request.
    pub(crate) fn begin_delete(&mut self, story_id: StoryId) -> Option<Effect> {
        let session = self.session.as_ref()?;
        if !session.owns_story(&story_id) {
            return None;
        }
        let token = session.token().clone();
        let ticket = self.next_seq();
        self.in_flight.insert(
            ticket,
            Pending::Delete {
                story_id: story_id.clone(),
            },
        );
        Some(Effect::DeleteStory {
            ticket,
            story_id,
            token,
        })
    }

    pub(crate) fn issue_refresh(&mut self) -> Option<Effect> {
        let session = self.session.as_ref()?;
        let username = session.username().to_owned();
        let token = session.token().clone();
        let ticket = self.next_seq();
        Some(Effect::FetchProfile {
            ticket,
            username,
            token,
        })
    }

    pub(crate) fn finish_mutation(
        &mut self,
        ticket: Ticket,
        result: Result<(), ClientError>,
    ) -> Option<Effect> {
        let pending = self.settle(ticket)?;
        match result {
            Ok(()) => {
                if let Pending::Delete { story_id } = &pending {
                    let generation = self.next_seq();
                    if let Some(next) = self
                        .session
                        .as_ref()
                        .map(|session| session.without_story(story_id, generation))
                    {
                        self.replace(next);
                    }
                }
                self.issue_refresh()
            }
            Err(_) => {
                self.roll_back(pending);
                None
            }
        }
    }

    pub(crate) fn finish_create(
        &mut self,
        ticket: Ticket,
        result: Result<Story, ClientError>,
    ) -> Option<Effect> {
        self.settle(ticket)?;
        let story = result.ok()?;
        let generation = self.next_seq();
        let next = self.session.as_ref().map(|session| {
            let end = session.own_stories().len();
            session.with_own_story_at(end, story, generation)
        })?;
        self.replace(next);
        self.issue_refresh()
    }

    pub(crate) fn apply_profile(&mut self, ticket: Ticket, result: Result<UserProfile, ClientError>) {
        let outcome = self.reconcile(ticket, result);
        self.last_refresh = Some(outcome);
    }

    fn reconcile(
        &mut self,
        ticket: Ticket,
        result: Result<UserProfile, ClientError>,
    ) -> RefreshOutcome {
        if !self.is_live(ticket) {
            return RefreshOutcome::Ignored;
        }
        let profile = match result {
            Ok(profile) => profile,
            Err(err) if err.is_auth() => {
                self.sign_out();
                return RefreshOutcome::SessionEnded;
            }
            Err(_) => return RefreshOutcome::Failed,
        };

        // Only a fetch issued after every mutation settled reflects them all.
        let superseded = ticket <= self.last_completion || ticket <= self.last_refresh_applied;
        if !self.in_flight.is_empty() || superseded {
            return RefreshOutcome::Stale;
        }

        let Some(token) = self.session.as_ref().map(|session| session.token().clone()) else {
            return RefreshOutcome::Ignored;
        };
        let generation = self.next_seq();
        self.replace(Session::from_profile(profile, token, generation));
        self.last_refresh_applied = ticket;
        RefreshOutcome::Applied
    }

    /// Removes a settled request from the in-flight set and stamps its completion.
    fn settle(&mut self, ticket: Ticket) -> Option<Pending> {
        if !self.is_live(ticket) {
            return None;
        }
        let pending = self.in_flight.remove(&ticket)?;
        self.last_completion = self.next_seq();
        Some(pending)
    }

    fn roll_back(&mut self, pending: Pending) {
        let Pending::Favorite {
            story,
            action,
            index,
        } = pending
        else {
            return;
        };
        let generation = self.next_seq();
        let next = self.session.as_ref().map(|session| match action {
            FavoriteAction::Add => session.without_favorite(story.story_id(), generation),
            FavoriteAction::Remove => session.with_favorite_at(index, story, generation),
        });
        if let Some(next) = next {
            self.replace(next);
        }
    }

    fn is_live(&self, ticket: Ticket) -> bool {
        self.session.is_some() && ticket > self.signed_in_at
    }

    fn replace(&mut self, session: Session) {
        self.session = Some(session);
        self.dirty = true;
    }

    fn reset_sync(&mut self, mark: Ticket) {
        self.signed_in_at = mark;
        self.in_flight.clear();
        self.last_completion = mark;
        self.last_refresh_applied = mark;
        self.last_refresh = None;
        self.dirty = true;
    }

    fn next_seq(&mut self) -> Ticket {
        self.seq += 1;
        self.seq
    }
}
