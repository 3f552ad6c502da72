//! Append-only audit trails (`passwordLogs`, `updateHistory`).
//!
//! Each append rewrites the whole log. Logs are never rotated or trimmed.

use super::backend::KeyValueBackend;
use super::error::StoreResult;
use super::models::{PasswordLog, UpdateHistoryEntry};
use super::repository::{Record, Repository};
use super::newest_first;

/// Where new entries land in the stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

pub trait AuditEntry: Record {
    fn user_id(&self) -> &str;
    fn timestamp(&self) -> &str;
}

impl AuditEntry for PasswordLog {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl AuditEntry for UpdateHistoryEntry {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

pub fn append<T: AuditEntry>(
    backend: &dyn KeyValueBackend,
    entry: T,
    placement: Placement,
) -> StoreResult<()> {
    append_many(backend, vec![entry], placement)
}

pub fn append_many<T: AuditEntry>(
    backend: &dyn KeyValueBackend,
    entries: Vec<T>,
    placement: Placement,
) -> StoreResult<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let repo = Repository::<T>::new(backend);
    let existing = repo.all()?;
    let combined = match placement {
        Placement::Front => entries.into_iter().chain(existing).collect::<Vec<_>>(),
        Placement::Back => existing.into_iter().chain(entries).collect::<Vec<_>>(),
    };
    repo.save_all(&combined)
}

/// Log entries, newest first, optionally for one user and capped at `limit`.
pub fn recent<T: AuditEntry>(
    backend: &dyn KeyValueBackend,
    user_id: Option<&str>,
    limit: Option<usize>,
) -> StoreResult<Vec<T>> {
    let mut entries: Vec<T> = Repository::<T>::new(backend)
        .all()?
        .into_iter()
        .filter(|e| user_id.map_or(true, |uid| e.user_id() == uid))
        .collect();
    entries.sort_by(|a, b| newest_first(a.timestamp(), b.timestamp()));
    if let Some(n) = limit {
        entries.truncate(n);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backend::MemoryBackend;

    fn log(id: &str, user: &str, ts: &str) -> PasswordLog {
        PasswordLog {
            id: id.into(),
            user_id: user.into(),
            user_name: "Some One".into(),
            action: "Password Changed".into(),
            timestamp: ts.into(),
            changed_by: "self".into(),
            extra: Default::default(),
        }
    }

    #[test]
    fn front_and_back_placement() {
        let backend = MemoryBackend::new();
        append(&backend, log("PWD001", "STU001", "2024-01-01T00:00:00.000Z"), Placement::Back)
            .expect("append");
        append(&backend, log("PWD002", "STU001", "2024-01-02T00:00:00.000Z"), Placement::Front)
            .expect("append");
        append(&backend, log("PWD003", "STU002", "2024-01-03T00:00:00.000Z"), Placement::Back)
            .expect("append");
        let stored: Vec<PasswordLog> = Repository::new(&backend).all().expect("all");
        let ids: Vec<&str> = stored.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["PWD002", "PWD001", "PWD003"]);
    }

    #[test]
    fn recent_is_newest_first_and_filtered() {
        let backend = MemoryBackend::new();
        append_many(
            &backend,
            vec![
                log("PWD001", "STU001", "2024-01-01T00:00:00.000Z"),
                log("PWD002", "STU002", "2024-01-05T00:00:00.000Z"),
                log("PWD003", "STU001", "2024-01-03T00:00:00.000Z"),
            ],
            Placement::Back,
        )
        .expect("append");

        let all: Vec<PasswordLog> = recent(&backend, None, None).expect("recent");
        let ids: Vec<&str> = all.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["PWD002", "PWD003", "PWD001"]);

        let mine: Vec<PasswordLog> = recent(&backend, Some("STU001"), Some(1)).expect("recent");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "PWD003");
    }

    #[test]
    fn empty_batch_does_not_touch_the_log() {
        let backend = MemoryBackend::new();
        append_many::<PasswordLog>(&backend, vec![], Placement::Front).expect("append");
        assert_eq!(backend.raw("passwordLogs"), None);
    }
}
