use crate::{ClientError, Story, StoryDraft, StoryId, Ticket, Token, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Signup, login or credential restore succeeded.
    SignedIn { profile: UserProfile, token: Token },
    /// User logged out.
    LoggedOut,
    /// User clicked the star on a story.
    FavoriteToggled { story: Story },
    /// User submitted the new-story form.
    StorySubmitted { draft: StoryDraft },
    /// User asked to delete one of their stories.
    StoryDeleteRequested { story_id: StoryId },
    /// Explicit re-sync with the service.
    RefreshRequested,
    /// Service answered a favorite or delete request.
    MutationDone {
        ticket: Ticket,
        result: Result<(), ClientError>,
    },
    /// Service answered a create-story request.
    StoryCreated {
        ticket: Ticket,
        result: Result<Story, ClientError>,
    },
    /// Service answered a profile fetch.
    ProfileFetched {
        ticket: Ticket,
        result: Result<UserProfile, ClientError>,
    },
    NoOp,
}
