use std::fmt::Debug;

use box_office_common::Secret;
use chrono::Duration;
use log::*;

use super::errors::SessionError;
use crate::{
    db_types::{MemberId, Privilege, Privileges, Session},
    helpers::{SharedClock, TokenGenerator},
    traits::SessionProvider,
};

pub const SESSION_LIFETIME_HOURS: i64 = 3;

/// `SessionApi` issues bearer sessions and resolves them on every request.
pub struct SessionApi<B> {
    db: B,
    clock: SharedClock,
    tokens: TokenGenerator,
}

impl<B> Debug for SessionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionApi")
    }
}

impl<B> SessionApi<B> {
    pub fn new(db: B, clock: SharedClock) -> Self {
        Self { db, clock, tokens: TokenGenerator::new() }
    }

    pub fn with_token_generator(mut self, tokens: TokenGenerator) -> Self {
        self.tokens = tokens;
        self
    }
}

impl<B> SessionApi<B>
where B: SessionProvider
{
    /// Resolves a bearer token. Unknown and expired tokens give `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let session = self.db.fetch_session(token, self.clock.now()).await?;
        if session.is_none() {
            trace!("🪛️ Unknown or expired session token");
        }
        Ok(session)
    }

    /// Opens a new session for `username`. Only setup staff may hand out sessions.
    pub async fn open_session(
        &self,
        username: &str,
        member: Option<MemberId>,
        privileges: Privileges,
        caller: Option<&Session>,
    ) -> Result<Session, SessionError> {
        if !caller.is_some_and(|s| s.has(Privilege::Setup)) {
            return Err(SessionError::Forbidden);
        }
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::Invalid("a username is required".into()));
        }
        let session = Session {
            token: Secret::new(self.tokens.next_secret()),
            username: username.to_string(),
            expires: self.clock.now() + Duration::hours(SESSION_LIFETIME_HOURS),
            member,
            privileges,
        };
        self.db.insert_session(&session).await?;
        info!("🪛️ Session opened for {username} with {:?}", privileges.iter().collect::<Vec<_>>());
        Ok(session)
    }
}
