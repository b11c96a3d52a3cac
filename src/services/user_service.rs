//! Domain service for user records.
//!
//! Uniqueness of usernames and emails is enforced here with a lookup before
//! the write, not by the database. Two concurrent creates can both pass the
//! lookup.

use thiserror::Error;

use crate::models::{NewUser, User, UserPatch};

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(i64),

    #[error("email already exists")]
    EmailExists,

    #[error("Database error: {0}")]
    Storage(String),
}

impl UserError {
    /// Stable label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::EmailExists => "email_exists",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Domain service trait for user management.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Lists every stored user, ordered by id.
    async fn list_all(&self) -> Result<Vec<User>, UserError>;

    /// Fetches a single user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if no row has this id.
    async fn get(&self, id: i64) -> Result<User, UserError>;

    /// Stores a new user and returns it with the assigned id.
    ///
    /// Does not check the username; callers do that with
    /// [`UserService::username_exists`] first.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::EmailExists`] if another user has this email.
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Overwrites every mutable field of an existing user. Email is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] without writing if the id is unknown.
    async fn update(&self, id: i64, patch: UserPatch) -> Result<(), UserError>;

    /// Deletes a user. Deleting an unknown id succeeds.
    async fn delete(&self, id: i64) -> Result<(), UserError>;

    /// Exact-match username lookup. A missing row is `Ok(false)`.
    async fn username_exists(&self, username: &str) -> Result<bool, UserError>;

    /// Up to three free usernames derived from a first and last name.
    async fn suggest_usernames(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<String>, UserError>;
}
