//! Authentication state
//!
//! A [`Session`] keeps the bearer token in a [`CredentialStore`]. A missing
//! or rejected token clears the store and reports
//! [`ClientError::NotAuthenticated`]; the caller must sign in again.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Where the bearer token lives between requests
pub trait CredentialStore: Send + Sync {
    /// Stored token, if any
    fn load(&self) -> Option<String>;

    /// Replace the stored token
    fn save(&self, token: &str);

    /// Forget the stored token
    fn clear(&self);
}

/// Process-local credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding a token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn save(&self, token: &str) {
        *self.token.lock() = Some(token.to_string());
    }

    fn clear(&self) {
        self.token.lock().take();
    }
}

/// Anything that can check a bearer token
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// `Ok(false)` if the token was rejected
    async fn validate_token(&self, token: &str) -> ClientResult<bool>;
}

/// Authenticated session over a credential store
#[derive(Debug)]
pub struct Session<S: CredentialStore> {
    store: S,
}

impl<S: CredentialStore> Session<S> {
    /// Create session over a store
    #[inline]
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current token without validation
    #[inline]
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.load().filter(|t| !t.trim().is_empty())
    }

    /// Store a token issued by the auth backend
    pub fn sign_in(&self, token: &str) -> ClientResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::NotAuthenticated);
        }
        self.store.save(token);
        tracing::debug!("signed in");
        Ok(())
    }

    /// Forget the token
    pub fn sign_out(&self) {
        self.store.clear();
    }

    /// Return a token the backend accepts
    ///
    /// Clears the store when the token is missing or rejected.
    pub async fn ensure_authenticated<V>(&self, validator: &V) -> ClientResult<String>
    where
        V: TokenValidator + ?Sized,
    {
        let Some(token) = self.token() else {
            self.store.clear();
            return Err(ClientError::NotAuthenticated);
        };

        match validator.validate_token(&token).await {
            Ok(true) => Ok(token),
            Ok(false) => {
                tracing::warn!("stored token rejected, clearing credentials");
                self.store.clear();
                Err(ClientError::NotAuthenticated)
            }
            Err(e) => Err(self.check_error(e)),
        }
    }

    /// Pass a result through, clearing credentials on auth failures
    pub fn check<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        result.map_err(|e| self.check_error(e))
    }

    fn check_error(&self, error: ClientError) -> ClientError {
        if error.requires_reauth() {
            tracing::warn!(error = %error, "authentication lost, clearing credentials");
            self.store.clear();
            ClientError::NotAuthenticated
        } else {
            error
        }
    }
}
