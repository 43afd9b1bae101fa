use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use time::OffsetDateTime;
use tower_cookies::{cookie::SameSite, Cookie, Cookies, Key};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sid";

/// How long a login lasts before the user has to sign in again.
pub const SESSION_VALID_DAYS: i64 = 30;

pub fn default_session_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(SESSION_VALID_DAYS)
}

/// Server-side session persistence. Lookups must return the user only for
/// sessions that have not expired yet.
#[async_trait]
pub trait SessionStore {
    type UserId: Send;
    type Error: Send;

    async fn create_session(
        &self,
        user: Self::UserId,
        expires: DateTime<Utc>,
    ) -> Result<Uuid, Self::Error>;
    async fn lookup_session(&self, session_id: Uuid) -> Result<Option<Self::UserId>, Self::Error>;
    async fn delete_session(&self, session_id: Uuid) -> Result<(), Self::Error>;
}

/// Reads and writes the signed session cookie.
pub struct SessionCookieManager {
    key: Key,
    secure: bool,
}

impl SessionCookieManager {
    /// The signing key is stretched from the configured secret, so the
    /// secret itself can be any length.
    pub fn new(secret: &str, secure: bool) -> Self {
        let key_material = blake3::derive_key("session cookie signing v1", secret.as_bytes());
        Self {
            key: Key::derive_from(&key_material),
            secure,
        }
    }

    pub fn session_id(&self, cookies: &Cookies) -> Option<Uuid> {
        cookies
            .signed(&self.key)
            .get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    }

    pub fn set_session(&self, cookies: &Cookies, session_id: Uuid, expires: DateTime<Utc>) {
        let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.secure);
        if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires.timestamp()) {
            cookie.set_expires(expires);
        }

        cookies.signed(&self.key).add(cookie);
    }

    pub fn clear_session(&self, cookies: &Cookies) {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        cookie.set_path("/");
        cookies.signed(&self.key).remove(cookie);
    }
}

/// Creates a session for a freshly authenticated user and sets the cookie.
pub async fn start_session<S: SessionStore>(
    store: &S,
    manager: &SessionCookieManager,
    cookies: &Cookies,
    user: S::UserId,
) -> Result<Uuid, S::Error> {
    let expires = default_session_expiry(Utc::now());
    let session_id = store.create_session(user, expires).await?;
    manager.set_session(cookies, session_id, expires);

    tracing::event!(tracing::Level::INFO, %session_id, "started session");
    Ok(session_id)
}

/// Deletes the server-side session, if any, and clears the cookie either way.
pub async fn end_session<S: SessionStore>(
    store: &S,
    manager: &SessionCookieManager,
    cookies: &Cookies,
) -> Result<(), S::Error> {
    if let Some(session_id) = manager.session_id(cookies) {
        store.delete_session(session_id).await?;
    }

    manager.clear_session(cookies);
    Ok(())
}

pub async fn current_user<S: SessionStore>(
    store: &S,
    manager: &SessionCookieManager,
    cookies: &Cookies,
) -> Result<Option<S::UserId>, S::Error> {
    match manager.session_id(cookies) {
        Some(session_id) => store.lookup_session(session_id).await,
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        sessions: Mutex<HashMap<Uuid, (u64, DateTime<Utc>)>>,
    }

    #[async_trait]
    impl SessionStore for MemoryStore {
        type UserId = u64;
        type Error = Infallible;

        async fn create_session(
            &self,
            user: Self::UserId,
            expires: DateTime<Utc>,
        ) -> Result<Uuid, Self::Error> {
            let session_id = Uuid::new_v4();
            self.sessions
                .lock()
                .unwrap()
                .insert(session_id, (user, expires));
            Ok(session_id)
        }

        async fn lookup_session(
            &self,
            session_id: Uuid,
        ) -> Result<Option<Self::UserId>, Self::Error> {
            let sessions = self.sessions.lock().unwrap();
            Ok(sessions
                .get(&session_id)
                .filter(|(_, expires)| *expires > Utc::now())
                .map(|(user, _)| *user))
        }

        async fn delete_session(&self, session_id: Uuid) -> Result<(), Self::Error> {
            self.sessions.lock().unwrap().remove(&session_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_lookup_delete() {
        let store = MemoryStore::default();
        let session_id = store
            .create_session(7, default_session_expiry(Utc::now()))
            .await
            .unwrap();

        assert_matches!(store.lookup_session(session_id).await, Ok(Some(7)));

        store.delete_session(session_id).await.unwrap();
        assert_matches!(store.lookup_session(session_id).await, Ok(None));
    }

    #[tokio::test]
    async fn expired_session_is_not_returned() {
        let store = MemoryStore::default();
        let session_id = store
            .create_session(7, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert_matches!(store.lookup_session(session_id).await, Ok(None));
    }

    #[test]
    fn expiry_is_a_month_out() {
        let now = Utc::now();
        assert_eq!(
            default_session_expiry(now) - now,
            Duration::days(SESSION_VALID_DAYS)
        );
    }
}
