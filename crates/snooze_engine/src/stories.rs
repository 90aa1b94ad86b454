//! Feed operations: the shared story list kept in step with the service.
use snooze_core::{ClientError, Story, StoryDraft, StoryList};
use snooze_logging::{snooze_info, snooze_warn};

use crate::{RemoteClient, SessionHandle};

/// Fetch the whole feed. No credential needed; never returns a partial list.
pub async fn fetch_all(remote: &dyn RemoteClient) -> Result<StoryList, ClientError> {
    match remote.list_stories().await {
        Ok(stories) => {
            snooze_info!("Fetched {} stories", stories.len());
            Ok(StoryList::new(stories))
        }
        Err(err) => {
            snooze_warn!("Fetching stories failed: {}", err);
            Err(err)
        }
    }
}

/// Post `draft` as the session's user and append the confirmed story to `list`.
///
/// The session records the story among its own and re-syncs with the service.
pub async fn add_story(
    list: &mut StoryList,
    session: &SessionHandle,
    draft: StoryDraft,
) -> Result<Story, ClientError> {
    let story = session.create_story(draft).await?;
    if !list.push_confirmed(story.clone()) {
        snooze_warn!("Story {} already listed", story.story_id());
    }
    snooze_info!("Posted story {} ({})", story.story_id(), story.hostname());
    Ok(story)
}

/// Delete one of the session user's own stories.
///
/// Stories the session does not own are refused locally with
/// `ErrorKind::Authorization` and nothing is sent. The list only changes once
/// the service confirms.
pub async fn delete_story(
    list: &mut StoryList,
    session: &SessionHandle,
    story_id: &str,
) -> Result<(), ClientError> {
    session.delete_own_story(story_id).await?;
    list.remove(story_id);
    snooze_info!("Deleted story {}", story_id);
    Ok(())
}
