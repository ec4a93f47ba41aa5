//! Transaction handle capability and per-call query context.
//!
//! # Responsibility
//! - Define what repositories need from an open store handle: execute,
//!   insert with generated id, query one row, query many rows.
//! - Honor caller cancellation and deadlines while a statement runs.
//!
//! # Invariants
//! - Handles are borrowed; nothing here begins, commits or rolls back.
//! - A statement interrupted by its context surfaces as `StoreError::Cancelled`,
//!   never as a generic SQLite failure.
//! - The interrupt hook is removed once the statement returns. SQLite keeps one
//!   progress handler per connection, so a handler the caller installed is
//!   replaced by the first store call and not restored.

use crate::model::RowId;
use crate::query::BuiltQuery;
use log::warn;
use rusqlite::{params_from_iter, Connection, ErrorCode, Row, Savepoint, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Number of SQLite VM instructions between cancellation checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a [`StoreHandle`].
#[derive(Debug)]
pub enum StoreError {
    /// The call's context was cancelled or its deadline passed.
    Cancelled,
    Sqlite(rusqlite::Error),
    /// An insert succeeded but the store returned no generated id.
    MissingGeneratedId,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "store call cancelled"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingGeneratedId => write!(f, "store did not return a generated id"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Cancelled | Self::MissingGeneratedId => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if is_interrupt(&value) {
            Self::Cancelled
        } else {
            Self::Sqlite(value)
        }
    }
}

/// Cancellation and deadline scope for one or more store calls.
///
/// Cloning shares the underlying token, so cancelling any clone cancels all.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// Context that never fires unless its token is cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context bound to an externally owned token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Adds an absolute deadline; the earlier of two deadlines wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Adds a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns whether the token was cancelled or the deadline has passed.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Maps one result row into a typed record, reading columns by position.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Capability of an already-open, caller-owned store handle.
///
/// All calls on one handle must be sequenced by the caller.
///
/// The SQLite implementations own the connection's progress handler while
/// a call runs and leave it cleared afterwards. Callers that rely on their
/// own progress handler must reinstall it after each call.
pub trait StoreHandle {
    /// Executes a statement and returns the number of affected rows.
    fn execute(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<usize>;

    /// Executes an insert and returns the store-generated row id.
    fn insert(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<RowId>;

    /// Returns the first row, or `rusqlite::Error::QueryReturnedNoRows`
    /// wrapped in `StoreError::Sqlite` when there is none.
    fn query_one<T: FromRow>(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<T>;

    /// Returns every row in store order.
    fn query_many<T: FromRow>(&self, ctx: &QueryContext, query: &BuiltQuery)
        -> StoreResult<Vec<T>>;
}

impl StoreHandle for Connection {
    fn execute(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<usize> {
        guarded(self, ctx, |conn| {
            conn.execute(&query.sql, params_from_iter(query.args.iter()))
        })
    }

    fn insert(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<RowId> {
        let (changed, id) = guarded(self, ctx, |conn| {
            let changed = conn.execute(&query.sql, params_from_iter(query.args.iter()))?;
            Ok((changed, conn.last_insert_rowid()))
        })?;

        if changed == 0 || id == 0 {
            return Err(StoreError::MissingGeneratedId);
        }
        Ok(id)
    }

    fn query_one<T: FromRow>(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<T> {
        guarded(self, ctx, |conn| {
            let mut stmt = conn.prepare(&query.sql)?;
            stmt.query_row(params_from_iter(query.args.iter()), T::from_row)
        })
    }

    fn query_many<T: FromRow>(
        &self,
        ctx: &QueryContext,
        query: &BuiltQuery,
    ) -> StoreResult<Vec<T>> {
        guarded(self, ctx, |conn| {
            let mut stmt = conn.prepare(&query.sql)?;
            let mut rows = stmt.query(params_from_iter(query.args.iter()))?;
            let mut items = Vec::new();
            while let Some(row) = rows.next()? {
                items.push(T::from_row(row)?);
            }
            Ok(items)
        })
    }
}

macro_rules! delegate_to_connection {
    ($handle:ty) => {
        impl StoreHandle for $handle {
            fn execute(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<usize> {
                StoreHandle::execute(&**self, ctx, query)
            }

            fn insert(&self, ctx: &QueryContext, query: &BuiltQuery) -> StoreResult<RowId> {
                StoreHandle::insert(&**self, ctx, query)
            }

            fn query_one<T: FromRow>(
                &self,
                ctx: &QueryContext,
                query: &BuiltQuery,
            ) -> StoreResult<T> {
                StoreHandle::query_one(&**self, ctx, query)
            }

            fn query_many<T: FromRow>(
                &self,
                ctx: &QueryContext,
                query: &BuiltQuery,
            ) -> StoreResult<Vec<T>> {
                StoreHandle::query_many(&**self, ctx, query)
            }
        }
    };
}

delegate_to_connection!(Transaction<'_>);
delegate_to_connection!(Savepoint<'_>);

fn guarded<T>(
    conn: &Connection,
    ctx: &QueryContext,
    run: impl FnOnce(&Connection) -> rusqlite::Result<T>,
) -> StoreResult<T> {
    if ctx.is_done() {
        warn!("event=store_call module=store status=cancelled stage=before_execute");
        return Err(StoreError::Cancelled);
    }

    let watch = AssertUnwindSafe(ctx.clone());
    conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || watch.is_done()));
    let result = run(conn);
    clear_progress_handler(conn);

    result.map_err(|err| {
        let err = StoreError::from(err);
        if matches!(err, StoreError::Cancelled) {
            warn!("event=store_call module=store status=cancelled stage=execute");
        }
        err
    })
}

fn clear_progress_handler(conn: &Connection) {
    conn.progress_handler(0, None::<fn() -> bool>);
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::OperationInterrupted
    )
}
