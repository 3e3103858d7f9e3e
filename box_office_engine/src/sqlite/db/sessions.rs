use box_office_common::Secret;
use chrono::{DateTime, Utc};
use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{MemberId, Privileges, Session},
    helpers::hash_session_token,
    traits::StoreError,
};

#[derive(Debug, FromRow)]
struct SessionRow {
    username: String,
    expires: DateTime<Utc>,
    member: Option<i64>,
    privileges: i64,
}

pub async fn insert_session(session: &Session, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO sessions (token_hash, username, expires, member, privileges) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(hash_session_token(session.token.reveal()))
    .bind(&session.username)
    .bind(session.expires)
    .bind(session.member.map(|m| m.0))
    .bind(i64::from(session.privileges.bits()))
    .execute(conn)
    .await?;
    debug!("🗃️ Session opened for {} until {}", session.username, session.expires);
    Ok(())
}

/// Fetches the session for a bearer token. The token itself is never stored, so it is copied into the result.
pub async fn fetch_session(
    token: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Session>, StoreError> {
    let row: Option<SessionRow> = sqlx::query_as("SELECT * FROM sessions WHERE token_hash = $1 AND expires > $2")
        .bind(hash_session_token(token))
        .bind(now)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|r| Session {
        token: Secret::new(token.to_string()),
        username: r.username,
        expires: r.expires,
        member: r.member.map(MemberId),
        privileges: Privileges::from_bits(u8::try_from(r.privileges).unwrap_or_default()),
    }))
}

pub async fn purge_expired_sessions(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires <= $1").bind(now).execute(conn).await?;
    let count = result.rows_affected();
    if count > 0 {
        trace!("🗃️ {count} expired session(s) purged");
    }
    Ok(count)
}
