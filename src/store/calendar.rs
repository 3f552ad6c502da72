//! Calendar events. Only the creator may change or delete an event.

use super::accounts::actor;
use super::backend::KeyValueBackend;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{CalendarEvent, EventType, NotificationKind, User};
use super::notifications::{self, Notice};
use super::now_ts;
use super::repository::{CalendarRepository, UserRepository};
use super::resolve::resolve;
use chrono::{NaiveDate, NaiveTime};
use log::info;
use serde::Deserialize;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

fn parse_date(raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| StoreError::validation(format!("date must be YYYY-MM-DD: {:?}", raw)))
}

fn parse_time(field: &str, raw: &str) -> StoreResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|_| StoreError::validation(format!("{} must be HH:MM: {:?}", field, raw)))
}

fn check_schedule(ev: &CalendarEvent) -> StoreResult<()> {
    if ev.title.trim().is_empty() {
        return Err(StoreError::validation("title is required"));
    }
    parse_date(&ev.date)?;
    let start = parse_time("startTime", &ev.start_time)?;
    let end = parse_time("endTime", &ev.end_time)?;
    if end < start {
        return Err(StoreError::validation("endTime is before startTime"));
    }
    Ok(())
}

fn involves(ev: &CalendarEvent, user_id: &str) -> bool {
    ev.created_by == user_id || ev.participants.iter().any(|p| p == user_id)
}

/// Events the user created or was invited to, in date and start-time order.
pub fn events_for(backend: &dyn KeyValueBackend, user_id: &str) -> StoreResult<Vec<CalendarEvent>> {
    let mut events: Vec<CalendarEvent> = CalendarRepository::new(backend)
        .all()?
        .into_iter()
        .filter(|e| involves(e, user_id))
        .collect();
    events.sort_by(|a, b| (&a.date, &a.start_time).cmp(&(&b.date, &b.start_time)));
    Ok(events)
}

pub fn list(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<Vec<CalendarEvent>> {
    let who = actor(backend, actor_id)?;
    events_for(backend, &who.id)
}

pub fn on_date(backend: &dyn KeyValueBackend, actor_id: &str, date: &str) -> StoreResult<Vec<CalendarEvent>> {
    parse_date(date)?;
    Ok(list(backend, actor_id)?
        .into_iter()
        .filter(|e| e.date == date)
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: EventType,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

fn default_kind() -> EventType {
    EventType::Event
}

/// Participant ids, deduplicated, without the creator, each resolving to a user.
fn invitees(creator: &User, requested: &[String], users: &[User]) -> StoreResult<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for id in requested {
        if id == &creator.id || out.contains(id) {
            continue;
        }
        resolve(id, users)?;
        out.push(id.clone());
    }
    Ok(out)
}

/// Creates the event and notifies every participant.
pub fn create(backend: &dyn KeyValueBackend, actor_id: &str, draft: &EventDraft) -> StoreResult<CalendarEvent> {
    let users = UserRepository::new(backend).all()?;
    let creator = resolve(actor_id, &users)?;
    let ts = now_ts();
    let repo = CalendarRepository::new(backend);
    let mut all = repo.all()?;
    let event = CalendarEvent {
        id: ids::next_id("EVT", all.iter().map(|e| e.id.as_str())),
        title: draft.title.clone(),
        description: draft.description.clone(),
        date: draft.date.clone(),
        start_time: draft.start_time.clone(),
        end_time: draft.end_time.clone(),
        kind: draft.kind,
        created_by: creator.id.clone(),
        participants: invitees(creator, &draft.participants, &users)?,
        location: draft.location.clone().filter(|l| !l.is_empty()),
        created_at: ts.clone(),
        last_modified: Some(ts),
        extra: Default::default(),
    };
    check_schedule(&event)?;
    all.push(event.clone());
    repo.save_all(&all)?;

    let notices = event
        .participants
        .iter()
        .map(|p| Notice {
            user_id: p.clone(),
            kind: NotificationKind::Calendar,
            title: format!("New Event: {}", event.title),
            message: format!(
                "{} has created a new event for {}",
                creator.full_name(),
                event.date
            ),
        })
        .collect();
    notifications::push_many(backend, notices)?;
    info!("{} created event {}", creator.id, event.id);
    Ok(event)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<EventType>,
    pub participants: Option<Vec<String>>,
    pub location: Option<String>,
}

/// Owner-only field edit. Stamps `lastModified`.
pub fn update(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    event_id: &str,
    patch: &EventPatch,
) -> StoreResult<CalendarEvent> {
    let users = UserRepository::new(backend).all()?;
    let owner = resolve(actor_id, &users)?;
    CalendarRepository::new(backend).update(event_id, |ev| {
        if ev.created_by != owner.id {
            return Err(StoreError::forbidden("only the creator may edit this event"));
        }
        if let Some(v) = &patch.title {
            ev.title = v.clone();
        }
        if let Some(v) = &patch.description {
            ev.description = v.clone();
        }
        if let Some(v) = &patch.date {
            ev.date = v.clone();
        }
        if let Some(v) = &patch.start_time {
            ev.start_time = v.clone();
        }
        if let Some(v) = &patch.end_time {
            ev.end_time = v.clone();
        }
        if let Some(v) = patch.kind {
            ev.kind = v;
        }
        if let Some(v) = &patch.participants {
            ev.participants = invitees(owner, v, &users)?;
        }
        if let Some(v) = &patch.location {
            ev.location = Some(v.clone()).filter(|l| !l.is_empty());
        }
        check_schedule(ev)?;
        ev.last_modified = Some(now_ts());
        Ok(())
    })
}

/// Owner-only delete of exactly one event.
pub fn delete(backend: &dyn KeyValueBackend, actor_id: &str, event_id: &str) -> StoreResult<()> {
    let who = actor(backend, actor_id)?;
    let repo = CalendarRepository::new(backend);
    let ev = repo.get(event_id)?;
    if ev.created_by != who.id {
        return Err(StoreError::forbidden("only the creator may delete this event"));
    }
    repo.remove(event_id)?;
    info!("{} deleted event {}", who.id, event_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::tests::seed_user;
    use crate::store::backend::MemoryBackend;
    use crate::store::models::{Notification, Role};
    use crate::store::repository::NotificationRepository;

    fn draft(title: &str, date: &str, participants: &[&str]) -> EventDraft {
        EventDraft {
            title: title.into(),
            description: String::new(),
            date: date.into(),
            start_time: "09:00".into(),
            end_time: "10:30".into(),
            kind: EventType::Meeting,
            participants: participants.iter().map(|p| p.to_string()).collect(),
            location: None,
        }
    }

    fn people(backend: &MemoryBackend) {
        seed_user(backend, "FAC001", Role::Faculty, "John", "Smith");
        seed_user(backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(backend, "STU002", Role::Student, "John", "Doe");
    }

    #[test]
    fn create_notifies_participants() {
        let backend = MemoryBackend::new();
        people(&backend);
        let ev = create(&backend, "FAC001", &draft("Review", "2024-03-01", &["STU001", "STU001", "FAC001"]))
            .expect("create");
        assert_eq!(ev.id, "EVT001");
        assert_eq!(ev.participants, vec!["STU001"]);
        assert!(ev.last_modified.is_some());

        let notes: Vec<Notification> = NotificationRepository::new(&backend).all().expect("notes");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "New Event: Review");
        assert_eq!(notes[0].message, "John Smith has created a new event for 2024-03-01");
    }

    #[test]
    fn create_validates_required_fields() {
        let backend = MemoryBackend::new();
        people(&backend);
        let mut bad = draft("", "2024-03-01", &[]);
        assert!(matches!(create(&backend, "FAC001", &bad), Err(StoreError::Validation(_))));
        bad.title = "Ok".into();
        bad.date = "03/01/2024".into();
        assert!(matches!(create(&backend, "FAC001", &bad), Err(StoreError::Validation(_))));
        let ghost = draft("Ok", "2024-03-01", &["STU404"]);
        assert!(matches!(
            create(&backend, "FAC001", &ghost),
            Err(StoreError::ReferenceNotFound { .. })
        ));
        assert_eq!(backend.raw("calendarEvents"), None);
    }

    #[test]
    fn visibility_and_date_filter() {
        let backend = MemoryBackend::new();
        people(&backend);
        create(&backend, "FAC001", &draft("A", "2024-03-02", &["STU001"])).expect("a");
        create(&backend, "FAC001", &draft("B", "2024-03-01", &[])).expect("b");
        create(&backend, "STU002", &draft("C", "2024-03-01", &[])).expect("c");

        let titles = |who: &str| -> Vec<String> {
            list(&backend, who).expect("list").into_iter().map(|e| e.title).collect()
        };
        assert_eq!(titles("FAC001"), vec!["B", "A"]);
        assert_eq!(titles("STU001"), vec!["A"]);
        assert_eq!(titles("STU002"), vec!["C"]);
        assert_eq!(on_date(&backend, "FAC001", "2024-03-01").expect("day").len(), 1);
    }

    #[test]
    fn non_owner_cannot_edit_or_delete() {
        let backend = MemoryBackend::new();
        people(&backend);
        let ev = create(&backend, "FAC001", &draft("Exam", "2024-03-01", &["STU001"])).expect("create");
        create(&backend, "FAC001", &draft("Other", "2024-03-05", &[])).expect("create");

        let patch = EventPatch {
            title: Some("Hijacked".into()),
            ..Default::default()
        };
        assert!(matches!(update(&backend, "STU001", &ev.id, &patch), Err(StoreError::Forbidden(_))));
        assert!(matches!(delete(&backend, "STU001", &ev.id), Err(StoreError::Forbidden(_))));
        assert_eq!(CalendarRepository::new(&backend).all().expect("all").len(), 2);

        let edited = update(&backend, "FAC001", &ev.id, &patch).expect("owner edit");
        assert_eq!(edited.title, "Hijacked");

        delete(&backend, "FAC001", &ev.id).expect("owner delete");
        let left = CalendarRepository::new(&backend).all().expect("all");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "Other");
    }

    #[test]
    fn edit_rejects_inverted_times() {
        let backend = MemoryBackend::new();
        people(&backend);
        let ev = create(&backend, "FAC001", &draft("Exam", "2024-03-01", &[])).expect("create");
        let patch = EventPatch {
            end_time: Some("08:00".into()),
            ..Default::default()
        };
        assert!(matches!(update(&backend, "FAC001", &ev.id, &patch), Err(StoreError::Validation(_))));
        let stored = CalendarRepository::new(&backend).get(&ev.id).expect("get");
        assert_eq!(stored.end_time, "10:30");
    }
}
