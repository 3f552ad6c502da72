//! Per-user notifications raised by messaging and the calendar.

use super::accounts::actor;
use super::backend::KeyValueBackend;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{Notification, NotificationKind};
use super::newest_first;
use super::now_ts;
use super::repository::NotificationRepository;

/// A notification waiting to be stored for `user_id`.
pub struct Notice {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn into_notification(self, id: String, timestamp: String) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            timestamp,
            read: false,
            extra: Default::default(),
        }
    }
}

pub fn push(backend: &dyn KeyValueBackend, notice: Notice) -> StoreResult<Notification> {
    let repo = NotificationRepository::new(backend);
    let mut all = repo.all()?;
    let id = ids::next_id("NOT", all.iter().map(|n| n.id.as_str()));
    let created = notice.into_notification(id, now_ts());
    all.push(created.clone());
    repo.save_all(&all)?;
    Ok(created)
}

/// Stores one notification per notice, with consecutive ids.
pub fn push_many(backend: &dyn KeyValueBackend, notices: Vec<Notice>) -> StoreResult<Vec<Notification>> {
    if notices.is_empty() {
        return Ok(Vec::new());
    }
    let repo = NotificationRepository::new(backend);
    let mut all = repo.all()?;
    let new_ids = ids::next_ids("NOT", all.iter().map(|n| n.id.as_str()), notices.len());
    let ts = now_ts();
    let created: Vec<Notification> = notices
        .into_iter()
        .zip(new_ids)
        .map(|(n, id)| n.into_notification(id, ts.clone()))
        .collect();
    all.extend(created.iter().cloned());
    repo.save_all(&all)?;
    Ok(created)
}

/// The actor's notifications, newest first.
pub fn list(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    unread_only: bool,
    limit: Option<usize>,
) -> StoreResult<Vec<Notification>> {
    let who = actor(backend, actor_id)?;
    let mut mine: Vec<Notification> = NotificationRepository::new(backend)
        .all()?
        .into_iter()
        .filter(|n| n.user_id == who.id && (!unread_only || !n.read))
        .collect();
    mine.sort_by(|a, b| newest_first(&a.timestamp, &b.timestamp));
    if let Some(n) = limit {
        mine.truncate(n);
    }
    Ok(mine)
}

pub fn mark_read(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    notification_id: &str,
) -> StoreResult<Notification> {
    let who = actor(backend, actor_id)?;
    NotificationRepository::new(backend).update(notification_id, |n| {
        if n.user_id != who.id {
            return Err(StoreError::forbidden("not your notification"));
        }
        n.read = true;
        Ok(())
    })
}
