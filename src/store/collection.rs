//! Collection accessor: whole-collection load and save over a key-value backend.
//!
//! Every write serializes the full collection and replaces the key. Writes to
//! different collections in one logical operation are not coordinated.

use super::backend::KeyValueBackend;
use super::error::{StoreError, StoreResult};
use super::keys::{Collection, CURRENT_USER_KEY};
use super::models::{
    AcademicYear, CalendarEvent, ClassEnrollment, Course, Department, FacultyDetail, Lesson,
    Message, Notification, PasswordLog, StudentDetail, TimeSettings, UpdateHistoryEntry, User,
};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Loads a collection, failing soft: corrupt content is reset to `[]`.
pub fn load<T: DeserializeOwned>(
    backend: &dyn KeyValueBackend,
    collection: Collection,
) -> StoreResult<Vec<T>> {
    match load_strict(backend, collection) {
        Err(StoreError::CorruptStore { key, reason }) => {
            warn!("resetting corrupt collection {}: {}", key, reason);
            backend.set(collection.key(), "[]")?;
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Loads a collection, reporting corrupt content as `CorruptStore`.
pub fn load_strict<T: DeserializeOwned>(
    backend: &dyn KeyValueBackend,
    collection: Collection,
) -> StoreResult<Vec<T>> {
    let Some(raw) = backend.get(collection.key())? else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&raw).map_err(|e| StoreError::CorruptStore {
        key: collection.key().to_string(),
        reason: e.to_string(),
    })
}

pub fn save<T: Serialize>(
    backend: &dyn KeyValueBackend,
    collection: Collection,
    items: &[T],
) -> StoreResult<()> {
    let raw = serde_json::to_string(items)?;
    backend.set(collection.key(), &raw)?;
    debug!("saved {} ({} records)", collection.key(), items.len());
    Ok(())
}

/// Reads the session object. A corrupt session is dropped rather than reported.
pub fn load_session<T: DeserializeOwned>(backend: &dyn KeyValueBackend) -> StoreResult<Option<T>> {
    let Some(raw) = backend.get(CURRENT_USER_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!("dropping corrupt {}: {}", CURRENT_USER_KEY, e);
            backend.remove(CURRENT_USER_KEY)?;
            Ok(None)
        }
    }
}

pub fn save_session<T: Serialize>(backend: &dyn KeyValueBackend, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value)?;
    backend.set(CURRENT_USER_KEY, &raw)
}

pub fn clear_session(backend: &dyn KeyValueBackend) -> StoreResult<bool> {
    backend.remove(CURRENT_USER_KEY)
}

enum KnownKey {
    Collection(Collection),
    Session,
}

fn known_key(key: &str) -> StoreResult<KnownKey> {
    if key == CURRENT_USER_KEY {
        return Ok(KnownKey::Session);
    }
    Collection::parse(key)
        .map(KnownKey::Collection)
        .ok_or_else(|| StoreError::validation(format!("unknown storage key: {}", key)))
}

/// Untyped read of a known key. Collections fail soft unless `strict`.
pub fn read_raw(backend: &dyn KeyValueBackend, key: &str, strict: bool) -> StoreResult<Value> {
    match known_key(key)? {
        KnownKey::Session => Ok(load_session::<Value>(backend)?.unwrap_or(Value::Null)),
        KnownKey::Collection(c) if strict => Ok(Value::Array(load_strict(backend, c)?)),
        KnownKey::Collection(c) => Ok(Value::Array(load(backend, c)?)),
    }
}

fn check_record<T: DeserializeOwned>(key: &str, index: Option<usize>, item: &Value) -> StoreResult<()> {
    <T as serde::Deserialize>::deserialize(item).map(|_| ()).map_err(|e| {
        let at = index.map(|i| format!("[{}]", i)).unwrap_or_default();
        StoreError::validation(format!("{}{}: {}", key, at, e))
    })
}

fn check_records<T: DeserializeOwned>(key: &str, items: &[Value]) -> StoreResult<()> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(i, item)| check_record::<T>(key, Some(i), item))
}

/// Every record must parse as the collection's type, or nothing is written.
fn check_collection(collection: Collection, items: &[Value]) -> StoreResult<()> {
    let key = collection.key();
    match collection {
        Collection::Users => check_records::<User>(key, items),
        Collection::Students => check_records::<StudentDetail>(key, items),
        Collection::Faculty => check_records::<FacultyDetail>(key, items),
        Collection::Messages => check_records::<Message>(key, items),
        Collection::CalendarEvents => check_records::<CalendarEvent>(key, items),
        Collection::Lessons => check_records::<Lesson>(key, items),
        Collection::Notifications => check_records::<Notification>(key, items),
        Collection::Departments => check_records::<Department>(key, items),
        Collection::Courses => check_records::<Course>(key, items),
        Collection::ClassEnrollments => check_records::<ClassEnrollment>(key, items),
        Collection::PasswordLogs => check_records::<PasswordLog>(key, items),
        Collection::UserTimeSettings => check_records::<TimeSettings>(key, items),
        Collection::UpdateHistory => check_records::<UpdateHistoryEntry>(key, items),
        Collection::AcademicYears => check_records::<AcademicYear>(key, items),
    }
}

/// Untyped write of a known key: collections take an array of well-formed
/// records, the session a user object.
pub fn write_raw(backend: &dyn KeyValueBackend, key: &str, value: &Value) -> StoreResult<()> {
    match (known_key(key)?, value) {
        (KnownKey::Collection(c), Value::Array(items)) => {
            check_collection(c, items)?;
            save(backend, c, items)
        }
        (KnownKey::Session, Value::Object(_)) => {
            check_record::<User>(key, None, value)?;
            save_session(backend, value)
        }
        (KnownKey::Collection(_), _) => Err(StoreError::validation(format!("{} must be an array", key))),
        (KnownKey::Session, _) => Err(StoreError::validation(format!("{} must be an object", key))),
    }
}

pub fn remove_raw(backend: &dyn KeyValueBackend, key: &str) -> StoreResult<bool> {
    known_key(key)?;
    backend.remove(key)
}
