//! Observability sink injected into repositories.
//!
//! # Responsibility
//! - Carry success records for create operations out of the repository layer.
//! - Offer a `log`-backed default and an in-memory sink for tests.
//!
//! # Invariants
//! - Recording an event never fails and never affects the operation result.

use crate::model::RowId;
use log::info;
use std::sync::Mutex;

/// Success record emitted by a repository write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoEvent {
    TalentCreated {
        id: RowId,
        name: String,
    },
    ExperienceCreated {
        id: RowId,
        talent_id: RowId,
        company: String,
    },
}

/// Receiver of repository events.
pub trait EventSink {
    fn record(&self, event: &RepoEvent);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn record(&self, event: &RepoEvent) {
        (**self).record(event);
    }
}

/// Writes events through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &RepoEvent) {
        info!("{}", log_line(event));
    }
}

fn log_line(event: &RepoEvent) -> String {
    match event {
        RepoEvent::TalentCreated { id, name } => format!(
            "event=talent_create module=repo status=ok talent_id={id} name={name:?}"
        ),
        RepoEvent::ExperienceCreated {
            id,
            talent_id,
            company,
        } => format!(
            "event=experience_create module=repo status=ok experience_id={id} talent_id={talent_id} company={company:?}"
        ),
    }
}

/// Keeps every recorded event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RepoEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far, oldest first.
    pub fn events(&self) -> Vec<RepoEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &RepoEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}
