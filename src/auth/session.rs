use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::store::{AuthStore, SessionRecord, StoreError, User};
use crate::ids::generate_session_id;

/// How long a session lives from creation or rotation.
pub const SESSION_LIFETIME: Duration = Duration::days(30);

/// Validation rotates the session once less than this much lifetime remains
/// (half the full lifetime). Expiry is extended only on this path, never on
/// every read, to bound write amplification.
pub const RENEWAL_THRESHOLD: Duration = Duration::days(15);

/// A validated session. `fresh` is set when this validation extended the
/// expiry, signalling the caller to re-issue the cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub fresh: bool,
}

impl From<SessionRecord> for Session {
    fn from(r: SessionRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            created_at: r.created_at,
            expires_at: r.expires_at,
            fresh: false,
        }
    }
}

/// Session lifecycle over an [`AuthStore`]. Stateless between calls; all
/// coordination between concurrent requests goes through the store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AuthStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    /// Issue a new session for the user. On store failure the session must
    /// not be treated as valid.
    pub async fn create_session(&self, user_id: &str) -> Result<Session, StoreError> {
        let now = OffsetDateTime::now_utc();
        let record = SessionRecord {
            id: generate_session_id(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + SESSION_LIFETIME,
        };
        self.store.insert_session(record.clone()).await?;
        debug!(user_id = %user_id, "session created");
        Ok(record.into())
    }

    /// Look up a session and its owning user. Absence is a normal outcome
    /// (logged-out or forged cookie), not an error. An expired row is
    /// deleted on the spot (lazy expiry). A session past the renewal
    /// threshold gets its expiry extended in place and comes back `fresh`.
    ///
    /// Two requests racing the same near-expiry session may both extend it;
    /// the extension is idempotent (set expiry to now + lifetime), so the
    /// race is accepted rather than locked.
    pub async fn validate_session(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, User)>, StoreError> {
        let Some((record, user)) = self.store.session_with_user(session_id).await? else {
            return Ok(None);
        };

        let now = OffsetDateTime::now_utc();
        if now >= record.expires_at {
            self.store.delete_session(&record.id).await?;
            debug!(session_id = %record.id, "expired session deleted");
            return Ok(None);
        }

        let mut session = Session::from(record);
        if session.expires_at - now < RENEWAL_THRESHOLD {
            let expires_at = now + SESSION_LIFETIME;
            self.store.set_session_expiry(&session.id, expires_at).await?;
            session.expires_at = expires_at;
            session.fresh = true;
            debug!(session_id = %session.id, "session rotated");
        }

        Ok(Some((session, user)))
    }

    /// Delete a session. Idempotent: deleting an id that does not exist is
    /// not an error.
    pub async fn invalidate_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.store.delete_session(session_id).await
    }

    /// Delete every session owned by the user ("log out everywhere").
    pub async fn invalidate_all_sessions_for_user(
        &self,
        user_id: &str,
    ) -> Result<(), StoreError> {
        self.store.delete_sessions_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{MemStore, NewUser};

    fn manager() -> (Arc<MemStore>, SessionManager) {
        let store = Arc::new(MemStore::new());
        let manager = SessionManager::new(store.clone());
        (store, manager)
    }

    async fn seed_user(store: &MemStore, id: &str) -> User {
        store
            .create_user(NewUser {
                id: id.to_string(),
                name: "Mutesi".into(),
                given_name: None,
                surname: None,
                email: format!("{id}@example.com"),
                hashed_password: Some("digest".into()),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn created_session_is_immediately_valid() {
        let (store, manager) = manager();
        let user = seed_user(&store, "usr_aaaaaaaaaaaa").await;

        let session = manager.create_session(&user.id).await.unwrap();
        assert!(!session.fresh);
        assert!(session.expires_at > OffsetDateTime::now_utc());

        let (validated, owner) = manager
            .validate_session(&session.id)
            .await
            .unwrap()
            .expect("session should resolve");
        assert_eq!(validated.id, session.id);
        assert_eq!(owner.id, user.id);
    }

    #[tokio::test]
    async fn unknown_session_resolves_to_none() {
        let (_, manager) = manager();
        assert!(manager.validate_session("ses_forged").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_lazily_deleted() {
        let (store, manager) = manager();
        let user = seed_user(&store, "usr_bbbbbbbbbbbb").await;
        let now = OffsetDateTime::now_utc();
        store
            .insert_session(SessionRecord {
                id: "stale".into(),
                user_id: user.id.clone(),
                created_at: now - Duration::days(31),
                expires_at: now - Duration::days(1),
            })
            .await
            .unwrap();

        assert!(manager.validate_session("stale").await.unwrap().is_none());
        // The row is gone from the store, not just hidden.
        assert!(store.session_with_user("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn near_expiry_session_is_rotated() {
        let (store, manager) = manager();
        let user = seed_user(&store, "usr_cccccccccccc").await;
        let now = OffsetDateTime::now_utc();
        let old_expiry = now + Duration::days(5);
        store
            .insert_session(SessionRecord {
                id: "nearly".into(),
                user_id: user.id.clone(),
                created_at: now - Duration::days(25),
                expires_at: old_expiry,
            })
            .await
            .unwrap();

        let (session, _) = manager
            .validate_session("nearly")
            .await
            .unwrap()
            .expect("still valid");
        assert!(session.fresh);
        assert!(session.expires_at > old_expiry);
        // Same id, extended in place.
        assert_eq!(session.id, "nearly");
    }

    #[tokio::test]
    async fn healthy_session_is_not_rotated() {
        let (store, manager) = manager();
        let user = seed_user(&store, "usr_dddddddddddd").await;
        let session = manager.create_session(&user.id).await.unwrap();

        let (validated, _) = manager
            .validate_session(&session.id)
            .await
            .unwrap()
            .expect("still valid");
        assert!(!validated.fresh);
        assert_eq!(validated.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let (store, manager) = manager();
        let user = seed_user(&store, "usr_eeeeeeeeeeee").await;
        let session = manager.create_session(&user.id).await.unwrap();

        manager.invalidate_session(&session.id).await.unwrap();
        // Deleting again is not an error.
        manager.invalidate_session(&session.id).await.unwrap();
        assert!(manager
            .validate_session(&session.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn invalidate_all_kills_every_session_of_the_user() {
        let (store, manager) = manager();
        let user = seed_user(&store, "usr_ffffffffffff").await;
        let a = manager.create_session(&user.id).await.unwrap();
        let b = manager.create_session(&user.id).await.unwrap();

        manager.invalidate_all_sessions_for_user(&user.id).await.unwrap();
        assert!(manager.validate_session(&a.id).await.unwrap().is_none());
        assert!(manager.validate_session(&b.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_the_user_cascades_to_sessions() {
        let (store, manager) = manager();
        let user = seed_user(&store, "usr_gggggggggggg").await;
        let session = manager.create_session(&user.id).await.unwrap();

        store.delete_user(&user.id).await.unwrap();
        assert!(manager
            .validate_session(&session.id)
            .await
            .unwrap()
            .is_none());
    }
}
