use std::sync::Arc;
use storyfeed_common::model::{auth::BearerToken, user::User};
use tokio::sync::watch;
use tracing::info;

/// The signed in user together with the bearer token the backend issued.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Session {
    user: User,
    token: BearerToken,
}

impl Session {
    #[must_use]
    pub fn new(user: User, token: BearerToken) -> Self {
        Self { user, token }
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn token(&self) -> &BearerToken {
        &self.token
    }
}

/// Holds the current session for everything that needs to act as the user.
///
/// Clones share the same session. Sign in populates it, sign out clears it,
/// and anyone holding a receiver from [`SessionStore::subscribe`] sees both.
#[derive(Clone, Debug)]
pub struct SessionStore {
    current: Arc<watch::Sender<Option<Arc<Session>>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Arc::new(watch::Sender::new(None)),
        }
    }

    pub fn sign_in(&self, session: Session) {
        info!(user = %session.user.id, "Signed in");
        self.current.send_replace(Some(Arc::new(session)));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.current.send_replace(None) {
            info!(user = %previous.user.id, "Signed out");
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.current
            .borrow()
            .as_ref()
            .map(|session| session.user.clone())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Session>>> {
        self.current.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
