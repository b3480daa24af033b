//! Auth session shared by the API client and the login/register forms.
//!
//! The token is held behind one lock and mirrored to a file so a later run
//! starts signed in. Every read and write of the token goes through
//! [`Session`]; nothing else touches the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Cheaply clonable handle to the current auth token
#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
    store: Option<PathBuf>,
}

impl Session {
    /// Session that is never persisted
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a session backed by `path`, reading any token saved earlier.
    /// A missing or unreadable file means signed out.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let token = read_token(&path);
        if token.is_some() {
            tracing::debug!(path = %path.display(), "restored saved session");
        }
        Self {
            token: Arc::new(RwLock::new(token)),
            store: Some(path),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Store a freshly issued token. The in-memory token is updated even
    /// when writing the file fails; the error is returned for logging.
    pub fn sign_in(&self, token: impl Into<String>) -> io::Result<()> {
        let token = token.into();
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        match &self.store {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, token)
            }
            None => Ok(()),
        }
    }

    pub fn sign_out(&self) -> io::Result<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;

        match &self.store {
            Some(path) => match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }
}

fn read_token(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token");

        let session = Session::open(&path);
        assert!(!session.is_authenticated());
        session.sign_in("abc123").unwrap();

        let reopened = Session::open(&path);
        assert_eq!(reopened.token().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_sign_out_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let session = Session::open(&path);
        session.sign_in("abc123").unwrap();
        session.sign_out().unwrap();

        assert!(session.token().is_none());
        assert!(!path.exists());
        // Signing out twice is fine
        session.sign_out().unwrap();
    }

    #[test]
    fn test_clones_share_token() {
        let session = Session::in_memory();
        let other = session.clone();
        session.sign_in("t").unwrap();
        assert_eq!(other.token().as_deref(), Some("t"));
    }

    #[test]
    fn test_blank_file_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "  \n").unwrap();
        assert!(!Session::open(&path).is_authenticated());
    }
}
