//! Identity accounts behind the employee lifecycle.
//!
//! The lifecycle only talks to [`IdentityProvider`]; the SQLite-backed
//! implementation lives in [`sqlite`]. Invitations leave the process through
//! a [`Notifier`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::identity::{Identity, UserType};

pub mod sqlite;

pub use sqlite::{
    accept_invite, authenticate, create_active_identity, get_identity, insert_active_identity, SqliteIdentityProvider,
};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>>;

    /// Provisions an unverified account with the default `user` claim. It
    /// must accept its invitation before it can log in.
    async fn create_invited(&self, email: &str, display_name: &str) -> AppResult<Identity>;

    async fn set_claim(&self, identity_id: Uuid, claim: UserType) -> AppResult<()>;

    async fn delete(&self, identity_id: Uuid) -> AppResult<()>;

    async fn send_invite(&self, identity: &Identity) -> AppResult<()>;
}

/// An outgoing invitation.
#[derive(Debug, Clone)]
pub struct Invitation {
    pub email: String,
    pub display_name: String,
    pub link: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_invite(&self, invitation: &Invitation) -> AppResult<()>;
}

/// Development notifier. Writes the invitation to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_invite(&self, invitation: &Invitation) -> AppResult<()> {
        tracing::info!(
            to = %invitation.email,
            "--- INVITE (log) ---\nTo: {} <{}>\n\nAccept your invitation: {}\n--- END INVITE ---",
            invitation.display_name,
            invitation.email,
            invitation.link
        );
        Ok(())
    }
}
