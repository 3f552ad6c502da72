//! Typed repositories over single collections.

use super::backend::KeyValueBackend;
use super::collection;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::keys::Collection;
use super::models::{
    AcademicYear, CalendarEvent, ClassEnrollment, Course, Department, FacultyDetail, Lesson,
    Message, Notification, PasswordLog, StudentDetail, TimeSettings, UpdateHistoryEntry, User,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// A record stored in exactly one collection and addressed by a string id.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;
    const ENTITY: &'static str;

    fn id(&self) -> &str;
}

macro_rules! record {
    ($ty:ty, $collection:expr, $entity:literal, $field:ident) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.$field
            }
        }
    };
}

record!(User, Collection::Users, "user", id);
record!(StudentDetail, Collection::Students, "student", id);
record!(FacultyDetail, Collection::Faculty, "faculty", id);
record!(Message, Collection::Messages, "message", id);
record!(CalendarEvent, Collection::CalendarEvents, "calendar event", id);
record!(Lesson, Collection::Lessons, "lesson", id);
record!(Notification, Collection::Notifications, "notification", id);
record!(Department, Collection::Departments, "department", id);
record!(Course, Collection::Courses, "course", id);
record!(ClassEnrollment, Collection::ClassEnrollments, "class", id);
record!(PasswordLog, Collection::PasswordLogs, "password log", id);
record!(TimeSettings, Collection::UserTimeSettings, "time settings", user_id);
record!(UpdateHistoryEntry, Collection::UpdateHistory, "update history entry", id);
record!(AcademicYear, Collection::AcademicYears, "academic year", id);

pub struct Repository<'a, T> {
    backend: &'a dyn KeyValueBackend,
    _record: PhantomData<T>,
}

pub type UserRepository<'a> = Repository<'a, User>;
pub type StudentDetailRepository<'a> = Repository<'a, StudentDetail>;
pub type FacultyDetailRepository<'a> = Repository<'a, FacultyDetail>;
pub type MessageRepository<'a> = Repository<'a, Message>;
pub type CalendarRepository<'a> = Repository<'a, CalendarEvent>;
pub type LessonRepository<'a> = Repository<'a, Lesson>;
pub type NotificationRepository<'a> = Repository<'a, Notification>;
pub type EnrollmentRepository<'a> = Repository<'a, ClassEnrollment>;
pub type TimeSettingsRepository<'a> = Repository<'a, TimeSettings>;

impl<'a, T: Record> Repository<'a, T> {
    pub fn new(backend: &'a dyn KeyValueBackend) -> Self {
        Self {
            backend,
            _record: PhantomData,
        }
    }

    pub fn all(&self) -> StoreResult<Vec<T>> {
        collection::load(self.backend, T::COLLECTION)
    }

    pub fn save_all(&self, items: &[T]) -> StoreResult<()> {
        collection::save(self.backend, T::COLLECTION, items)
    }

    pub fn find(&self, id: &str) -> StoreResult<Option<T>> {
        Ok(self.all()?.into_iter().find(|r| r.id() == id))
    }

    pub fn get(&self, id: &str) -> StoreResult<T> {
        self.find(id)?
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))
    }

    /// Appends a record; its id must be new to the collection.
    pub fn insert(&self, item: T) -> StoreResult<T> {
        let mut items = self.all()?;
        if items.iter().any(|r| r.id() == item.id()) {
            return Err(StoreError::Conflict(format!(
                "{} already exists: {}",
                T::ENTITY,
                item.id()
            )));
        }
        items.push(item.clone());
        self.save_all(&items)?;
        Ok(item)
    }

    /// Replaces the record with the same id, or appends it.
    pub fn upsert(&self, item: T) -> StoreResult<T> {
        let mut items = self.all()?;
        match items.iter_mut().find(|r| r.id() == item.id()) {
            Some(slot) => *slot = item.clone(),
            None => items.push(item.clone()),
        }
        self.save_all(&items)?;
        Ok(item)
    }

    /// Mutates the record matching `id` in place and writes the collection back.
    pub fn update<F>(&self, id: &str, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut T) -> StoreResult<()>,
    {
        let mut items = self.all()?;
        let slot = items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))?;
        f(slot)?;
        let updated = slot.clone();
        self.save_all(&items)?;
        Ok(updated)
    }

    /// Removes the single record matching `id`. Returns whether one was removed.
    pub fn remove(&self, id: &str) -> StoreResult<bool> {
        let mut items = self.all()?;
        let Some(pos) = items.iter().position(|r| r.id() == id) else {
            return Ok(false);
        };
        items.remove(pos);
        self.save_all(&items)?;
        Ok(true)
    }

    pub fn next_id(&self, prefix: &str) -> StoreResult<String> {
        let items = self.all()?;
        Ok(ids::next_id(prefix, items.iter().map(|r| r.id())))
    }
}
