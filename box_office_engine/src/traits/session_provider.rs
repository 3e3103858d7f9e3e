use chrono::{DateTime, Utc};

use super::StoreError;
use crate::db_types::Session;

#[allow(async_fn_in_trait)]
pub trait SessionProvider {
    /// Looks up an unexpired session by its bearer token. Expired sessions are purged before the lookup.
    async fn fetch_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError>;

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Removes every session that expired before `now` and returns how many were removed.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
