//! Snooze core: story/session domain and the pure session state machine.
mod effect;
mod error;
mod msg;
mod session;
mod state;
mod story;
mod update;

pub use effect::{Effect, FavoriteAction};
pub use error::{ClientError, ErrorKind, TransportFailure};
pub use msg::Msg;
pub use session::{Session, Token, UserProfile};
pub use state::{RefreshOutcome, SessionState, Ticket};
pub use story::{hostname_of, Story, StoryDraft, StoryId, StoryList};
pub use update::update;
