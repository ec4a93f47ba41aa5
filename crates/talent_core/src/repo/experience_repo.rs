//! Experience repository contract and handle-backed implementation.
//!
//! # Responsibility
//! - Create, read, update and owner-scoped delete of `experience` rows.
//!
//! # Invariants
//! - Rows are always mapped from `(id, company, talent_id)` in that order.
//! - `update` touches `company` only and tolerates zero matched rows.
//! - `delete` is keyed by owning talent and removes every matching row.

use super::{lookup_failure, read_failure, write_failure, RepoResult};
use crate::events::{EventSink, LogSink, RepoEvent};
use crate::model::experience::Experience;
use crate::model::RowId;
use crate::query::Query;
use crate::store::{FromRow, QueryContext, StoreHandle};
use log::debug;
use rusqlite::types::Value;
use rusqlite::Row;

const EXPERIENCE_TABLE: &str = "experience";
const EXPERIENCE_COLUMNS: [&str; 3] = ["id", "company", "talent_id"];

/// Repository interface for experience operations.
pub trait ExperienceRepository {
    /// Inserts `company` and `talent_id` and returns the generated id.
    fn create(&self, ctx: &QueryContext, experience: &Experience) -> RepoResult<RowId>;
    /// Lists every experience owned by `talent_id`; empty when there are none.
    fn find_talent_experiences(
        &self,
        ctx: &QueryContext,
        talent_id: RowId,
    ) -> RepoResult<Vec<Experience>>;
    /// Loads one experience by primary key.
    fn find_experience(&self, ctx: &QueryContext, id: RowId) -> RepoResult<Experience>;
    /// Rewrites `company` of the row with `experience.id`.
    fn update(&self, ctx: &QueryContext, experience: &Experience) -> RepoResult<()>;
    /// Removes all experiences owned by `talent_id` and returns how many went.
    fn delete(&self, ctx: &QueryContext, talent_id: RowId) -> RepoResult<usize>;
}

/// Experience repository bound to one borrowed store handle.
pub struct SqlExperienceRepository<'tx, H, S = LogSink> {
    handle: &'tx H,
    sink: S,
}

impl<'tx, H: StoreHandle> SqlExperienceRepository<'tx, H, LogSink> {
    /// Binds a repository to `handle`, logging events through `log`.
    pub fn new(handle: &'tx H) -> Self {
        Self::with_sink(handle, LogSink)
    }
}

impl<'tx, H: StoreHandle, S: EventSink> SqlExperienceRepository<'tx, H, S> {
    pub fn with_sink(handle: &'tx H, sink: S) -> Self {
        Self { handle, sink }
    }
}

impl<H: StoreHandle, S: EventSink> ExperienceRepository
    for SqlExperienceRepository<'_, H, S>
{
    fn create(&self, ctx: &QueryContext, experience: &Experience) -> RepoResult<RowId> {
        experience.validate()?;

        let query = Query::insert(EXPERIENCE_TABLE)
            .value("company", Value::Text(experience.company.clone()))
            .value("talent_id", experience.talent_id)
            .build()?;
        let id = self.handle.insert(ctx, &query).map_err(write_failure)?;

        self.sink.record(&RepoEvent::ExperienceCreated {
            id,
            talent_id: experience.talent_id,
            company: experience.company.clone(),
        });
        Ok(id)
    }

    fn find_talent_experiences(
        &self,
        ctx: &QueryContext,
        talent_id: RowId,
    ) -> RepoResult<Vec<Experience>> {
        let query = Query::select(EXPERIENCE_TABLE, EXPERIENCE_COLUMNS)
            .filter("talent_id", talent_id)
            .build()?;
        self.handle.query_many(ctx, &query).map_err(read_failure)
    }

    fn find_experience(&self, ctx: &QueryContext, id: RowId) -> RepoResult<Experience> {
        let query = Query::select(EXPERIENCE_TABLE, EXPERIENCE_COLUMNS)
            .filter("id", id)
            .build()?;
        self.handle
            .query_one(ctx, &query)
            .map_err(|err| lookup_failure("experience", id, err))
    }

    fn update(&self, ctx: &QueryContext, experience: &Experience) -> RepoResult<()> {
        experience.validate()?;

        let query = Query::update(EXPERIENCE_TABLE)
            .set("company", Value::Text(experience.company.clone()))
            .filter("id", experience.id)
            .build()?;
        let changed = self.handle.execute(ctx, &query).map_err(write_failure)?;

        // Zero matched rows is still a success for callers.
        if changed == 0 {
            debug!(
                "event=experience_update module=repo status=noop experience_id={}",
                experience.id
            );
        }
        Ok(())
    }

    fn delete(&self, ctx: &QueryContext, talent_id: RowId) -> RepoResult<usize> {
        let query = Query::delete(EXPERIENCE_TABLE)
            .filter("talent_id", talent_id)
            .build()?;
        let removed = self.handle.execute(ctx, &query).map_err(write_failure)?;

        debug!(
            "event=experience_delete module=repo status=ok talent_id={} removed={}",
            talent_id, removed
        );
        Ok(removed)
    }
}

impl FromRow for Experience {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            company: row.get(1)?,
            talent_id: row.get(2)?,
        })
    }
}
