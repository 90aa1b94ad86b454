use crate::{Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effect = match msg {
        Msg::SignedIn { profile, token } => {
            state.sign_in(profile, token);
            None
        }
        Msg::LoggedOut => {
            state.sign_out();
            None
        }
        Msg::FavoriteToggled { story } => state.begin_favorite_toggle(story),
        Msg::StorySubmitted { draft } => state.begin_create(draft),
        Msg::StoryDeleteRequested { story_id } => state.begin_delete(story_id),
        Msg::RefreshRequested => state.issue_refresh(),
        Msg::MutationDone { ticket, result } => state.finish_mutation(ticket, result),
        Msg::StoryCreated { ticket, result } => state.finish_create(ticket, result),
        Msg::ProfileFetched { ticket, result } => {
            state.apply_profile(ticket, result);
            None
        }
        Msg::NoOp => None,
    };

    (state, effect.into_iter().collect())
}
