//! Snooze engine: talks to the story service and keeps the session in step.
mod handle;
mod remote;
mod stories;
mod wire;

pub use handle::SessionHandle;
pub use remote::{
    AuthGrant, ClientSettings, RemoteClient, ReqwestRemoteClient, DEFAULT_BASE_URL,
};
pub use stories::{add_story, delete_story, fetch_all};
