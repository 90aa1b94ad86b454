use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snooze_logging::{snooze_info, snooze_warn};
use tempfile::NamedTempFile;

const CREDENTIALS_FILENAME: &str = ".snooze_credentials.ron";

/// What survives between runs: enough to resume a session without a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredCredentials {
    pub username: String,
    pub token: String,
}

/// A missing or unreadable file means "not logged in".
pub(crate) fn load(state_dir: &Path) -> Option<StoredCredentials> {
    let path = state_dir.join(CREDENTIALS_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            snooze_warn!("Failed to read credentials from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<StoredCredentials>(&content) {
        Ok(stored) if !stored.token.trim().is_empty() => Some(stored),
        Ok(_) => {
            snooze_warn!("Ignoring credentials with an empty token in {:?}", path);
            None
        }
        Err(err) => {
            snooze_warn!("Failed to parse credentials from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save(state_dir: &Path, stored: &StoredCredentials) -> Result<PathBuf> {
    let content = ron::ser::to_string_pretty(stored, ron::ser::PrettyConfig::new())
        .context("could not serialize credentials")?;
    let target = write_atomic(state_dir, CREDENTIALS_FILENAME, &content)
        .with_context(|| format!("could not store credentials in {}", state_dir.display()))?;
    snooze_info!("Stored credentials for {} in {:?}", stored.username, target);
    Ok(target)
}

pub(crate) fn clear(state_dir: &Path) -> Result<()> {
    let path = state_dir.join(CREDENTIALS_FILENAME);
    match fs::remove_file(&path) {
        Ok(()) => {
            snooze_info!("Removed credentials at {:?}", path);
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("could not remove {}", path.display())),
    }
}

/// Temp file in the target directory, then rename over `filename`.
/// Temp files are created owner-only, so the token never lands world-readable.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|err| err.error)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> StoredCredentials {
        StoredCredentials {
            username: "alice".to_string(),
            token: "tok-123".to_string(),
        }
    }

    #[test]
    fn missing_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load(dir.path()), None);
    }

    #[test]
    fn saved_credentials_load_back_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), &alice()).unwrap();
        assert_eq!(load(dir.path()), Some(alice()));

        let bob = StoredCredentials {
            username: "bob".to_string(),
            token: "tok-456".to_string(),
        };
        save(dir.path(), &bob).unwrap();
        assert_eq!(load(dir.path()), Some(bob));
    }

    #[test]
    fn save_creates_missing_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("state");
        let path = save(&nested, &alice()).unwrap();
        assert!(path.ends_with(CREDENTIALS_FILENAME));
        assert_eq!(load(&nested), Some(alice()));
    }

    #[test]
    fn corrupt_or_empty_token_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CREDENTIALS_FILENAME), "not ron at all {").unwrap();
        assert_eq!(load(dir.path()), None);

        fs::write(
            dir.path().join(CREDENTIALS_FILENAME),
            "(username: \"alice\", token: \"  \")",
        )
        .unwrap();
        assert_eq!(load(dir.path()), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), &alice()).unwrap();
        clear(dir.path()).unwrap();
        clear(dir.path()).unwrap();
        assert_eq!(load(dir.path()), None);
    }
}
