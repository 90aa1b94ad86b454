use crate::{StoryDraft, StoryId, Ticket, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Add,
    Remove,
}

/// Remote work requested by [`crate::update`]. Each carries the ticket its
/// completion message must echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SendFavorite {
        ticket: Ticket,
        username: String,
        story_id: StoryId,
        action: FavoriteAction,
        token: Token,
    },
    CreateStory {
        ticket: Ticket,
        draft: StoryDraft,
        token: Token,
    },
    DeleteStory {
        ticket: Ticket,
        story_id: StoryId,
        token: Token,
    },
    FetchProfile {
        ticket: Ticket,
        username: String,
        token: Token,
    },
}

impl Effect {
    pub fn ticket(&self) -> Ticket {
        match self {
            Effect::SendFavorite { ticket, .. }
            | Effect::CreateStory { ticket, .. }
            | Effect::DeleteStory { ticket, .. }
            | Effect::FetchProfile { ticket, .. } => *ticket,
        }
    }
}
