use std::path::Path;

use anyhow::{Context, Result};
use snooze_core::{ClientError, Session, Story, StoryDraft};
use snooze_engine::{add_story, delete_story, fetch_all, SessionHandle};
use snooze_logging::{snooze_error, snooze_warn};

use crate::credentials::{self, StoredCredentials};
use crate::Command;

pub(crate) async fn run(handle: &SessionHandle, state_dir: &Path, command: Command) -> Result<()> {
    match command {
        Command::Stories => {
            let session = restore(handle, state_dir).await.unwrap_or_else(|err| {
                snooze_warn!("Listing anonymously, session restore failed: {}", err);
                None
            });
            let feed = fetch_all(handle.remote()).await?;
            print_stories(feed.stories(), session.as_ref());
        }
        Command::Signup {
            username,
            password,
            name,
        } => {
            let session = handle.signup(&username, &password, &name).await?;
            remember(state_dir, &session)?;
            println!("Signed up as {} ({})", session.username(), session.name());
        }
        Command::Login { username, password } => {
            let session = handle.login(&username, &password).await?;
            remember(state_dir, &session)?;
            println!("Logged in as {} ({})", session.username(), session.name());
        }
        Command::Logout => {
            handle.logout();
            credentials::clear(state_dir)?;
            println!("Logged out");
        }
        Command::Profile => {
            let session = require_session(handle, state_dir).await?;
            println!("Name:     {}", session.name());
            println!("Username: {}", session.username());
            println!(
                "Created:  {}",
                session.created_at().format("%Y-%m-%d %H:%M UTC")
            );
        }
        Command::Favorites => {
            let session = require_session(handle, state_dir).await?;
            print_stories(session.favorites(), Some(&session));
        }
        Command::Mine => {
            let session = require_session(handle, state_dir).await?;
            print_stories(session.own_stories(), Some(&session));
        }
        Command::Post { title, author, url } => {
            require_session(handle, state_dir).await?;
            let mut feed = fetch_all(handle.remote()).await?;
            let story = add_story(&mut feed, handle, StoryDraft { title, author, url }).await?;
            println!("Posted {} [{}]", story.title(), story.story_id());
        }
        Command::Favorite { story_id } => {
            require_session(handle, state_dir).await?;
            let feed = fetch_all(handle.remote()).await?;
            let session = handle.toggle_favorite_by_id(&story_id, &feed).await?;
            if session.is_favorite(&story_id) {
                println!("Added {story_id} to favorites");
            } else {
                println!("Removed {story_id} from favorites");
            }
        }
        Command::Delete { story_id } => {
            require_session(handle, state_dir).await?;
            let mut feed = fetch_all(handle.remote()).await?;
            delete_story(&mut feed, handle, &story_id).await?;
            println!("Deleted {story_id}");
        }
    }
    Ok(())
}

/// Resume from the stored token. A rejected token is forgotten so the next run
/// starts clean; an unreachable service is reported.
async fn restore(handle: &SessionHandle, state_dir: &Path) -> Result<Option<Session>, ClientError> {
    let Some(stored) = credentials::load(state_dir) else {
        return Ok(None);
    };
    match handle
        .restore_from_credentials(&stored.token, &stored.username)
        .await
    {
        Ok(session) => Ok(Some(session)),
        Err(err) if err.is_auth() => {
            snooze_warn!("Stored token for {} rejected: {}", stored.username, err);
            if let Err(err) = credentials::clear(state_dir) {
                snooze_warn!("{:#}", err);
            }
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

async fn require_session(handle: &SessionHandle, state_dir: &Path) -> Result<Session> {
    restore(handle, state_dir)
        .await?
        .context("not logged in; run `snooze login <username> <password>` first")
}

fn remember(state_dir: &Path, session: &Session) -> Result<()> {
    let stored = StoredCredentials {
        username: session.username().to_string(),
        token: session.token().as_str().to_string(),
    };
    if let Err(err) = credentials::save(state_dir, &stored) {
        snooze_error!("Credentials for {} not stored: {:#}", stored.username, err);
        return Err(err);
    }
    Ok(())
}

fn print_stories(stories: &[Story], session: Option<&Session>) {
    if stories.is_empty() {
        println!("No stories yet.");
        return;
    }
    for story in stories {
        let favorite = session.is_some_and(|session| session.is_favorite(story.story_id()));
        println!("{}", story_line(story, favorite));
    }
}

fn story_line(story: &Story, favorite: bool) -> String {
    format!(
        "{} {} ({}) by {} | posted by {} [{}]",
        if favorite { "*" } else { " " },
        story.title(),
        story.hostname(),
        story.author(),
        story.username(),
        story.story_id()
    )
}
