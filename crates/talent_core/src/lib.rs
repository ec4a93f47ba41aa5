//! Transaction-scoped data access for talents and their work experience.
//!
//! Callers own the SQLite transaction; repositories borrow it, build their
//! statements with [`query::Query`] and map rows back to entities.

pub mod config;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{open_store, StoreConfig};
pub use events::{EventSink, LogSink, MemorySink, RepoEvent};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::experience::Experience;
pub use model::talent::Talent;
pub use model::{RowId, ValidationError};
pub use query::{BuiltQuery, Query, QueryError};
pub use repo::experience_repo::{ExperienceRepository, SqlExperienceRepository};
pub use repo::talent_repo::{SqlTalentRepository, TalentRepository};
pub use repo::{ErrorKind, RepoError, RepoResult};
pub use service::talent_service::{Repositories, TalentProfile, TalentService};
pub use store::{FromRow, QueryContext, StoreError, StoreHandle};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
