//! Asynchronous abstraction for resolving the current user.
//!
//! Authentication lives outside the runtime. Callers plug in an
//! [`IdentityProvider`] and the handle asks it once per persistence request.
use async_trait::async_trait;

use crate::repository::UserId;

/// Source of the authenticated user, if any.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user_id(&self) -> Option<UserId>;
}

/// Always reports the same user. Useful for the CLI and tests.
#[derive(Clone, Debug)]
pub struct StaticIdentity(UserId);

impl StaticIdentity {
    pub fn new(user: impl Into<String>) -> Self {
        Self(UserId::new(user))
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user_id(&self) -> Option<UserId> {
        Some(self.0.clone())
    }
}

/// No one is signed in; every persistence call fails with `Unauthenticated`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Anonymous;

#[async_trait]
impl IdentityProvider for Anonymous {
    async fn current_user_id(&self) -> Option<UserId> {
        None
    }
}
