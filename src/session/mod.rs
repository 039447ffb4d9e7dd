pub mod claims;
pub mod store;

use std::sync::{Arc, RwLock};

use log::{info, warn};

pub use claims::SessionClaims;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    claims: Option<SessionClaims>,
}

/// The signed-in user, shared by the api client and the controllers.
///
/// The token store is read once when the session is created. Later reads go
/// through memory until `refresh`, `login` or `invalidate` is called.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    current: Arc<RwLock<Option<Credentials>>>,
}

impl Session {
    pub fn load(store: Arc<dyn TokenStore>) -> Result<Self> {
        let session = Self {
            store,
            current: Arc::new(RwLock::new(None)),
        };
        session.refresh()?;
        Ok(session)
    }

    /// Session without any persisted token.
    pub fn anonymous() -> Self {
        Self {
            store: Arc::new(MemoryTokenStore::default()),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Session backed by memory only, holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let claims = SessionClaims::parse(&token);
        Self {
            store: Arc::new(MemoryTokenStore::new(Some(token.clone()))),
            current: Arc::new(RwLock::new(Some(Credentials { token, claims }))),
        }
    }

    /// Re-read the token store.
    pub fn refresh(&self) -> Result<()> {
        let credentials = self.store.load()?.map(|token| {
            let claims = SessionClaims::parse(&token);
            if claims.is_none() {
                warn!("Stored token could not be decoded, treating session as signed out");
            }
            Credentials { token, claims }
        });
        *self.write() = credentials;
        Ok(())
    }

    /// Persist a new token and make it current.
    pub fn login(&self, token: &str) -> Result<SessionClaims> {
        let Some(claims) = SessionClaims::parse(token) else {
            return Err(Error::field("token", "token does not carry a user id"));
        };
        self.store.save(token)?;
        info!("Signed in as {}", claims.user_id);
        *self.write() = Some(Credentials {
            token: token.trim().to_string(),
            claims: Some(claims.clone()),
        });
        Ok(claims)
    }

    /// Forget the token, both in memory and on disk.
    pub fn invalidate(&self) -> Result<()> {
        self.store.clear()?;
        *self.write() = None;
        Ok(())
    }

    /// Raw bearer token, attached to outgoing requests whenever present.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.token.clone())
    }

    pub fn claims(&self) -> Option<SessionClaims> {
        self.read().as_ref().and_then(|c| c.claims.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.claims().map(|c| c.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.claims().is_some()
    }

    /// The user id, or `Error::Unauthenticated` when there is no usable token.
    pub fn require_user(&self) -> Result<String> {
        self.user_id().ok_or(Error::Unauthenticated)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Credentials>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::token_for;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_store_once_until_refresh() {
        let store = Arc::new(MemoryTokenStore::new(Some(token_for(r#"{"uid":"alice"}"#))));
        let session = Session::load(store.clone()).unwrap();
        assert_eq!(session.user_id().as_deref(), Some("alice"));

        store.save(&token_for(r#"{"uid":"bob"}"#)).unwrap();
        assert_eq!(session.user_id().as_deref(), Some("alice"));

        session.refresh().unwrap();
        assert_eq!(session.user_id().as_deref(), Some("bob"));
    }

    #[test]
    fn malformed_token_is_signed_out_but_still_sent() {
        let session = Session::with_token("garbage");
        assert!(!session.is_authenticated());
        assert!(matches!(session.require_user(), Err(Error::Unauthenticated)));
        assert_eq!(session.token().as_deref(), Some("garbage"));
    }

    #[test]
    fn login_rejects_tokens_without_user() {
        let session = Session::anonymous();
        let err = session.login(&token_for("{}")).unwrap_err();
        assert!(matches!(err, Error::Validation(ref f) if f.contains("token")));
        assert_eq!(session.token(), None);
    }

    #[test]
    fn invalidate_clears_memory_and_store() {
        let store = Arc::new(MemoryTokenStore::default());
        let session = Session::load(store.clone()).unwrap();
        session.login(&token_for(r#"{"sub":"carol"}"#)).unwrap();
        assert!(store.load().unwrap().is_some());

        session.invalidate().unwrap();
        assert_eq!(session.user_id(), None);
        assert_eq!(store.load().unwrap(), None);
    }
}
