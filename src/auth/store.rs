use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// User role. Checked exhaustively at the authorization boundary instead of
/// comparing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

/// User record as stored. Deliberately not `Serialize`: the hashed password
/// must never cross the storage boundary into a response body.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub email: String,
    pub email_verified: bool,
    /// Nullable: a user may exist without a local password, e.g. pending
    /// external verification.
    pub hashed_password: Option<String>,
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields the caller supplies when registering a user. Role defaults to
/// `USER` and the email-verified flag to false.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub email: String,
    pub hashed_password: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// Persistence seam for users and sessions. The session manager and the
/// handlers talk to this trait only, so tests run against [`MemStore`].
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Deletes the user and, by cascade, every session they own.
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;

    async fn insert_session(&self, session: SessionRecord) -> Result<(), StoreError>;
    /// Point lookup joined with the owning user, so validation needs a single
    /// round trip.
    async fn session_with_user(
        &self,
        id: &str,
    ) -> Result<Option<(SessionRecord, User)>, StoreError>;
    async fn set_session_expiry(
        &self,
        id: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;
    async fn delete_session(&self, id: &str) -> Result<(), StoreError>;
    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Production store backed by Postgres.
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct SessionUserRow {
    id: String,
    user_id: String,
    created_at: OffsetDateTime,
    expires_at: OffsetDateTime,
    u_id: String,
    u_name: String,
    u_given_name: Option<String>,
    u_surname: Option<String>,
    u_email: String,
    u_email_verified: bool,
    u_hashed_password: Option<String>,
    u_role: Role,
    u_created_at: OffsetDateTime,
    u_updated_at: OffsetDateTime,
}

#[async_trait]
impl AuthStore for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, given_name, surname, email, hashed_password)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, given_name, surname, email, email_verified,
                      hashed_password, role, created_at, updated_at
            "#,
        )
        .bind(&new.id)
        .bind(&new.name)
        .bind(&new.given_name)
        .bind(&new.surname)
        .bind(&new.email)
        .bind(&new.hashed_password)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, given_name, surname, email, email_verified,
                   hashed_password, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn session_with_user(
        &self,
        id: &str,
    ) -> Result<Option<(SessionRecord, User)>, StoreError> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT s.id, s.user_id, s.created_at, s.expires_at,
                   u.id AS u_id, u.name AS u_name, u.given_name AS u_given_name,
                   u.surname AS u_surname, u.email AS u_email,
                   u.email_verified AS u_email_verified,
                   u.hashed_password AS u_hashed_password, u.role AS u_role,
                   u.created_at AS u_created_at, u.updated_at AS u_updated_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| {
            (
                SessionRecord {
                    id: r.id,
                    user_id: r.user_id,
                    created_at: r.created_at,
                    expires_at: r.expires_at,
                },
                User {
                    id: r.u_id,
                    name: r.u_name,
                    given_name: r.u_given_name,
                    surname: r.u_surname,
                    email: r.u_email,
                    email_verified: r.u_email_verified,
                    hashed_password: r.u_hashed_password,
                    role: r.u_role,
                    created_at: r.u_created_at,
                    updated_at: r.u_updated_at,
                },
            )
        }))
    }

    async fn set_session_expiry(
        &self,
        id: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1")
            .bind(id)
            .bind(expires_at)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// In-memory store used by `AppState::fake()` and the test suites. Follows
/// the same contract as [`PgStore`], including the user-delete cascade.
#[derive(Default)]
pub struct MemStore {
    users: Mutex<HashMap<String, User>>,
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed user, bypassing `NewUser` defaults. Lets tests
    /// seed admins and users with unusual states.
    pub fn put_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }
}

#[async_trait]
impl AuthStore for MemStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: new.id,
            name: new.name,
            given_name: new.given_name,
            surname: new.surname,
            email: new.email,
            email_verified: false,
            hashed_password: new.hashed_password,
            role: Role::User,
            created_at: now,
            updated_at: now,
        };
        self.users
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.users.lock().unwrap().remove(id);
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| s.user_id != id);
        Ok(())
    }

    async fn insert_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn session_with_user(
        &self,
        id: &str,
    ) -> Result<Option<(SessionRecord, User)>, StoreError> {
        let session = match self.sessions.lock().unwrap().get(id).cloned() {
            Some(s) => s,
            None => return Ok(None),
        };
        let user = self.users.lock().unwrap().get(&session.user_id).cloned();
        Ok(user.map(|u| (session, u)))
    }

    async fn set_session_expiry(
        &self,
        id: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(id) {
            s.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| s.user_id != user_id);
        Ok(())
    }
}
