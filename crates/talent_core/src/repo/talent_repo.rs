//! Talent repository contract and handle-backed implementation.
//!
//! # Responsibility
//! - Insert talents and look them up by id on a caller-owned handle.
//!
//! # Invariants
//! - `create` validates before writing and reports the generated id.
//! - `find_talent` never returns a default-valued talent for a missing id.

use super::{lookup_failure, write_failure, RepoResult};
use crate::events::{EventSink, LogSink, RepoEvent};
use crate::model::talent::Talent;
use crate::model::RowId;
use crate::query::Query;
use crate::store::{FromRow, QueryContext, StoreHandle};
use rusqlite::types::Value;
use rusqlite::Row;

const TALENT_TABLE: &str = "talent";
const TALENT_COLUMNS: [&str; 2] = ["id", "name"];

/// Repository interface for talent operations.
pub trait TalentRepository {
    /// Inserts `talent.name` and returns the store-generated id.
    fn create(&self, ctx: &QueryContext, talent: &Talent) -> RepoResult<RowId>;
    /// Loads one talent by primary key.
    fn find_talent(&self, ctx: &QueryContext, id: RowId) -> RepoResult<Talent>;
}

/// Talent repository bound to one borrowed store handle.
pub struct SqlTalentRepository<'tx, H, S = LogSink> {
    handle: &'tx H,
    sink: S,
}

impl<'tx, H: StoreHandle> SqlTalentRepository<'tx, H, LogSink> {
    /// Binds a repository to `handle`, logging events through `log`.
    pub fn new(handle: &'tx H) -> Self {
        Self::with_sink(handle, LogSink)
    }
}

impl<'tx, H: StoreHandle, S: EventSink> SqlTalentRepository<'tx, H, S> {
    pub fn with_sink(handle: &'tx H, sink: S) -> Self {
        Self { handle, sink }
    }
}

impl<H: StoreHandle, S: EventSink> TalentRepository for SqlTalentRepository<'_, H, S> {
    fn create(&self, ctx: &QueryContext, talent: &Talent) -> RepoResult<RowId> {
        talent.validate()?;

        let query = Query::insert(TALENT_TABLE)
            .value("name", Value::Text(talent.name.clone()))
            .build()?;
        let id = self.handle.insert(ctx, &query).map_err(write_failure)?;

        self.sink.record(&RepoEvent::TalentCreated {
            id,
            name: talent.name.clone(),
        });
        Ok(id)
    }

    fn find_talent(&self, ctx: &QueryContext, id: RowId) -> RepoResult<Talent> {
        let query = Query::select(TALENT_TABLE, TALENT_COLUMNS)
            .filter("id", id)
            .build()?;
        self.handle
            .query_one(ctx, &query)
            .map_err(|err| lookup_failure("talent", id, err))
    }
}

impl FromRow for Talent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}
