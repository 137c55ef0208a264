//! Errors raised by the league engine and their GraphQL rendering.
//!
//! Validation and domain variants reach clients verbatim with a stable `code`
//! extension so callers can branch on them. Database failures are logged
//! server-side and replaced by a generic message.

use async_graphql::ErrorExtensions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("League number must be between 1 and 15, got {0}")]
    OutOfRange(i32),

    #[error("Missing required parameter: {0}")]
    MissingParams(&'static str),

    #[error("Points delta must be a finite number")]
    NonNumericDelta,

    #[error("User not found")]
    UserNotFound,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Group is full")]
    GroupFull,

    #[error("No active season")]
    NoActiveSeason,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal database error")]
    Db(#[from] sqlx::Error),
}

impl LeagueError {
    pub fn code(&self) -> &'static str {
        match self {
            LeagueError::OutOfRange(_) => "OUT_OF_RANGE",
            LeagueError::MissingParams(_) => "MISSING_PARAMS",
            LeagueError::NonNumericDelta => "NON_NUMERIC_DELTA",
            LeagueError::UserNotFound => "USER_NOT_FOUND",
            LeagueError::NotFound(_) => "NOT_FOUND",
            LeagueError::GroupFull => "GROUP_FULL",
            LeagueError::NoActiveSeason => "NO_ACTIVE_SEASON",
            LeagueError::Unauthorized(_) => "UNAUTHORIZED",
            LeagueError::Db(_) => "INTERNAL",
        }
    }

    /// Lost a capacity race; a fresh allocation attempt will usually succeed.
    pub fn is_group_full(&self) -> bool {
        matches!(self, LeagueError::GroupFull)
    }
}

impl ErrorExtensions for LeagueError {
    fn extend(&self) -> async_graphql::Error {
        if let LeagueError::Db(e) = self {
            tracing::error!("Database error: {e}");
        }
        let code = self.code();
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, ext| ext.set("code", code.to_string()))
    }
}

/// Convert a league result into a GraphQL result, keeping the error code.
///
/// Usage: `service::submit_points(...).await.into_gql()?`
pub trait LeagueResultExt<T> {
    fn into_gql(self) -> async_graphql::Result<T>;
}

impl<T> LeagueResultExt<T> for Result<T, LeagueError> {
    fn into_gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

/// Reject an absent argument, naming it in the error.
pub fn require_param<T>(value: Option<T>, name: &'static str) -> Result<T, LeagueError> {
    value.ok_or(LeagueError::MissingParams(name))
}
