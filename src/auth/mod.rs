//! Local sign-in: a single profile whose session lives in `session.json`.

use anyhow::{Context, Result};
use fs_err as fs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub display_name: String,
    pub email: String,
}

impl User {
    /// uid is derived from the email so history survives sign-out.
    pub fn from_profile(display_name: &str, email: &str) -> Self {
        let uid = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{}", email.trim().to_lowercase()).as_bytes());
        Self { uid: uid.to_string(), display_name: display_name.to_string(), email: email.to_string() }
    }
}

type Listener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

#[derive(Default)]
struct Shared {
    user: Option<User>,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

pub struct LocalAuth {
    session_path: PathBuf,
    profile_name: String,
    profile_email: String,
    shared: Arc<Mutex<Shared>>,
}

/// Keeps a listener registered until dropped.
pub struct Subscription {
    id: u64,
    shared: Weak<Mutex<Shared>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl LocalAuth {
    pub fn new(session_path: PathBuf, profile_name: &str, profile_email: &str) -> Self {
        let user = match fs::read_to_string(&session_path) {
            Ok(text) => match serde_json::from_str::<User>(&text) {
                Ok(u) => Some(u),
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable session file");
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            session_path,
            profile_name: profile_name.to_string(),
            profile_email: profile_email.to_string(),
            shared: Arc::new(Mutex::new(Shared { user, ..Default::default() })),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.shared.lock().user.clone()
    }

    pub fn sign_in(&self) -> Result<User> {
        if let Some(user) = self.current_user() {
            return Ok(user);
        }
        let user = User::from_profile(&self.profile_name, &self.profile_email);
        if let Some(dir) = self.session_path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.session_path, serde_json::to_string_pretty(&user)?)
            .context("writing session")?;
        info!(email = %user.email, "signed in");
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<()> {
        if self.session_path.exists() {
            fs::remove_file(&self.session_path)?;
        }
        info!("signed out");
        self.set_user(None);
        Ok(())
    }

    /// `callback` runs now with the current state and again on every change.
    pub fn subscribe(&self, callback: impl Fn(Option<&User>) + Send + Sync + 'static) -> Subscription {
        let listener: Listener = Arc::new(callback);
        let (id, user) = {
            let mut shared = self.shared.lock();
            let id = shared.next_id;
            shared.next_id += 1;
            shared.listeners.push((id, listener.clone()));
            (id, shared.user.clone())
        };
        listener(user.as_ref());
        Subscription { id, shared: Arc::downgrade(&self.shared) }
    }

    fn set_user(&self, user: Option<User>) {
        // Listeners run outside the lock so they may call back into auth.
        let listeners: Vec<Listener> = {
            let mut shared = self.shared.lock();
            shared.user = user.clone();
            shared.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for l in listeners {
            l(user.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(dir: &tempfile::TempDir) -> LocalAuth {
        LocalAuth::new(dir.path().join("session.json"), "Dev", "dev@example.com")
    }

    #[test]
    fn session_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let user = auth(&dir).sign_in().unwrap();
        assert_eq!(auth(&dir).current_user(), Some(user));

        auth(&dir).sign_out().unwrap();
        assert_eq!(auth(&dir).current_user(), None);
    }

    #[test]
    fn uid_is_stable_for_the_same_email() {
        let a = User::from_profile("A", "Dev@Example.com");
        let b = User::from_profile("B", "dev@example.com ");
        assert_eq!(a.uid, b.uid);
        assert_ne!(a.uid, User::from_profile("A", "other@example.com").uid);
    }

    #[test]
    fn subscribers_see_changes_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let auth = auth(&dir);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = auth.subscribe(move |u| sink.lock().push(u.map(|u| u.email.clone())));

        auth.sign_in().unwrap();
        auth.sign_out().unwrap();
        sub.unsubscribe();
        auth.sign_in().unwrap();

        assert_eq!(*seen.lock(), vec![None, Some("dev@example.com".to_string()), None]);
    }

    #[test]
    fn corrupt_session_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session.json"), "{not json").unwrap();
        assert_eq!(auth(&dir).current_user(), None);
    }
}
