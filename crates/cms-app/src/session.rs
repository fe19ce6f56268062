// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::model::Role;

/// Credentials returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub user_id: UserId,
}

/// Where the signed-in session lives between requests and restarts.
pub trait SessionStore {
    fn current(&self) -> Option<&Session>;
    fn save(&mut self, session: Session) -> Result<()>;
    fn clear(&mut self) -> Result<()>;

    fn token(&self) -> Option<&str> {
        self.current().map(|session| session.token.as_str())
    }

    fn role(&self) -> Option<Role> {
        self.current().map(|session| session.role)
    }

    fn user_id(&self) -> Option<UserId> {
        self.current().map(|session| session.user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySessionStore {
    session: Option<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn save(&mut self, session: Session) -> Result<()> {
        self.session = Some(session);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySessionStore, Session, SessionStore};
    use crate::{Role, UserId};

    #[test]
    fn memory_store_saves_and_clears() {
        let mut store = MemorySessionStore::new();
        assert_eq!(store.token(), None);

        store
            .save(Session {
                token: "abc".to_owned(),
                role: Role::SubAdmin,
                user_id: UserId::new(17),
            })
            .expect("save session");
        assert_eq!(store.token(), Some("abc"));
        assert_eq!(store.role(), Some(Role::SubAdmin));
        assert_eq!(store.user_id(), Some(UserId::new(17)));

        store.clear().expect("clear session");
        assert!(store.current().is_none());
    }

    #[test]
    fn session_serializes_backend_role_names() {
        let session = Session {
            token: "t".to_owned(),
            role: Role::SubAdmin,
            user_id: UserId::new(2),
        };
        let json = serde_json::to_string(&session).expect("serialize session");
        assert!(json.contains("\"subadmin\""));
        let back: Session = serde_json::from_str(&json).expect("deserialize session");
        assert_eq!(back, session);
    }
}
