//! Transaction-scoped repositories for talents and their experiences.
//!
//! # Responsibility
//! - Turn entity operations into builder queries run on a borrowed handle.
//! - Map rows back to entities and failures to distinguishable kinds.
//!
//! # Invariants
//! - Repositories never begin, commit or roll back the handle they borrow.
//! - Failures are returned unchanged; no retry or local recovery.
//! - Single-row lookups report `NotFound`, never a default-valued record.

use crate::db::DbError;
use crate::model::{RowId, ValidationError};
use crate::query::QueryError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod experience_repo;
pub mod talent_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Flat failure category callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    MalformedQuery,
    StoreRead,
    StoreWrite,
    NotFound,
    Cancelled,
    Db,
}

/// Repository error for talent/experience operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    MalformedQuery(QueryError),
    /// Fetch or row-mapping failure.
    Read(StoreError),
    /// Insert/update/delete failure, including a missing generated id.
    Write(StoreError),
    NotFound {
        entity: &'static str,
        id: RowId,
    },
    Cancelled,
    Db(DbError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::MalformedQuery(_) => ErrorKind::MalformedQuery,
            Self::Read(_) => ErrorKind::StoreRead,
            Self::Write(_) => ErrorKind::StoreWrite,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Db(_) => ErrorKind::Db,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MalformedQuery(err) => write!(f, "{err}"),
            Self::Read(err) => write!(f, "store read failed: {err}"),
            Self::Write(err) => write!(f, "store write failed: {err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::MalformedQuery(err) => Some(err),
            Self::Read(err) | Self::Write(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Cancelled => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        Self::MalformedQuery(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn read_failure(err: StoreError) -> RepoError {
    match err {
        StoreError::Cancelled => RepoError::Cancelled,
        other => RepoError::Read(other),
    }
}

pub(crate) fn write_failure(err: StoreError) -> RepoError {
    match err {
        StoreError::Cancelled => RepoError::Cancelled,
        other => RepoError::Write(other),
    }
}

/// Like [`read_failure`], but turns the store's no-rows signal into `NotFound`.
pub(crate) fn lookup_failure(entity: &'static str, id: RowId, err: StoreError) -> RepoError {
    match err {
        StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows) => {
            RepoError::NotFound { entity, id }
        }
        other => read_failure(other),
    }
}
