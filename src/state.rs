//! Application state traits for dependency injection
//!
//! Handlers and middleware are generic over `HasIdentity`, so the same code
//! runs against the production `AppState` and the in-memory test state.

use crate::config::Config;
use crate::form::Locale;
use crate::repository::{AccessTokenRepository, UserRepository};
use crate::service::IdentityResolver;
use crate::session::SessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the persistent store has been initialised
///
/// Until it is marked ready every request resolves to anonymous.
#[derive(Debug, Clone)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    /// A handle that starts out not ready
    pub fn pending() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// A handle that is ready from the start
    pub fn ready() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// State providing everything request authentication needs
pub trait HasIdentity: Clone + Send + Sync + 'static {
    /// The user repository type
    type UserRepo: UserRepository + 'static;
    /// The access token repository type
    type TokenRepo: AccessTokenRepository + 'static;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the identity resolver
    fn identity_resolver(&self) -> &IdentityResolver<Self::UserRepo, Self::TokenRepo>;

    /// Get the user repository
    fn user_repo(&self) -> &Self::UserRepo;

    /// Get the access token repository
    fn token_repo(&self) -> &Self::TokenRepo;

    /// Get the session backend
    fn session_store(&self) -> Arc<dyn SessionStore>;

    /// Get the message catalog used for form errors
    fn locale(&self) -> &dyn Locale;

    /// Get the store readiness handle
    fn readiness(&self) -> &Readiness;
}
