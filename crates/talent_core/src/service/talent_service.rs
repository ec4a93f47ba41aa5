//! Talent use-case service and unit-of-work runner.
//!
//! # Responsibility
//! - Run repository work inside one immediate SQLite transaction.
//! - Provide multi-step use cases (register, profile, replace history).
//!
//! # Invariants
//! - Work that returns `Ok` is committed; work that returns `Err` is rolled back.
//! - Repositories handed to work borrow the transaction and never outlive it.

use crate::events::{EventSink, LogSink};
use crate::model::experience::Experience;
use crate::model::talent::Talent;
use crate::model::RowId;
use crate::repo::experience_repo::{ExperienceRepository, SqlExperienceRepository};
use crate::repo::talent_repo::{SqlTalentRepository, TalentRepository};
use crate::repo::{RepoError, RepoResult};
use crate::store::QueryContext;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Repositories bound to one open transaction.
pub struct Repositories<'tx, 'conn, S> {
    pub talents: SqlTalentRepository<'tx, Transaction<'conn>, &'tx S>,
    pub experiences: SqlExperienceRepository<'tx, Transaction<'conn>, &'tx S>,
}

/// A talent together with its experiences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentProfile {
    pub talent: Talent,
    pub experiences: Vec<Experience>,
}

/// Transaction manager for talent/experience use cases.
pub struct TalentService<'conn, S = LogSink> {
    conn: &'conn mut Connection,
    sink: S,
}

impl<'conn> TalentService<'conn, LogSink> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self::with_sink(conn, LogSink)
    }
}

impl<'conn, S: EventSink> TalentService<'conn, S> {
    pub fn with_sink(conn: &'conn mut Connection, sink: S) -> Self {
        Self { conn, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs `work` in a new transaction and commits when it succeeds.
    ///
    /// # Errors
    /// - `RepoError::Cancelled` when `ctx` is already done.
    /// - `RepoError::Db` when the transaction cannot begin or commit.
    /// - Whatever `work` returns; the transaction is rolled back first.
    pub fn run<T>(
        &mut self,
        ctx: &QueryContext,
        work: impl FnOnce(&Repositories<'_, '_, S>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        if ctx.is_done() {
            return Err(RepoError::Cancelled);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = {
            let repos = Repositories {
                talents: SqlTalentRepository::with_sink(&tx, &self.sink),
                experiences: SqlExperienceRepository::with_sink(&tx, &self.sink),
            };
            work(&repos)
        };

        match result {
            Ok(value) => {
                tx.commit()?;
                info!("event=unit_of_work module=service status=committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=unit_of_work module=service status=rollback_failed error={}",
                        rollback_err
                    );
                }
                warn!(
                    "event=unit_of_work module=service status=rolled_back kind={:?}",
                    err.kind()
                );
                Err(err)
            }
        }
    }

    /// Creates a talent and one experience per company atomically.
    pub fn register_talent(
        &mut self,
        ctx: &QueryContext,
        name: &str,
        companies: &[&str],
    ) -> RepoResult<RowId> {
        self.run(ctx, |repos| {
            let talent_id = repos.talents.create(ctx, &Talent::new(name))?;
            for company in companies {
                repos
                    .experiences
                    .create(ctx, &Experience::new(*company, talent_id))?;
            }
            Ok(talent_id)
        })
    }

    /// Loads a talent with all of its experiences.
    pub fn profile(&mut self, ctx: &QueryContext, talent_id: RowId) -> RepoResult<TalentProfile> {
        self.run(ctx, |repos| {
            let talent = repos.talents.find_talent(ctx, talent_id)?;
            let experiences = repos.experiences.find_talent_experiences(ctx, talent_id)?;
            Ok(TalentProfile {
                talent,
                experiences,
            })
        })
    }

    /// Replaces a talent's whole experience history in one transaction.
    ///
    /// Returns the ids of the newly created experiences.
    pub fn replace_experiences(
        &mut self,
        ctx: &QueryContext,
        talent_id: RowId,
        companies: &[&str],
    ) -> RepoResult<Vec<RowId>> {
        self.run(ctx, |repos| {
            repos.talents.find_talent(ctx, talent_id)?;
            repos.experiences.delete(ctx, talent_id)?;
            companies
                .iter()
                .map(|company| {
                    repos
                        .experiences
                        .create(ctx, &Experience::new(*company, talent_id))
                })
                .collect::<RepoResult<Vec<RowId>>>()
        })
    }
}
