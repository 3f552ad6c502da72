//! Per-user working hours and availability, with an update history.

use super::accounts::{actor, refresh_session};
use super::audit::{self, Placement};
use super::backend::KeyValueBackend;
use super::error::{StoreError, StoreResult};
use super::models::{Availability, TimeRange, TimeSettings, UpdateHistoryEntry, User};
use super::now_ts;
use super::policy::{self, DAYS_OF_WEEK, HISTORY_LIMIT, TIMEZONES};
use super::repository::{Repository, TimeSettingsRepository, UserRepository};
use chrono::NaiveTime;
use log::info;
use serde::Deserialize;

pub fn defaults_for(user: &User) -> TimeSettings {
    let (start, end) = policy::default_working_hours(user.role);
    let (break_start, break_end) = policy::DEFAULT_BREAK;
    TimeSettings {
        user_id: user.id.clone(),
        timezone: policy::DEFAULT_TIMEZONE.to_string(),
        working_hours: TimeRange {
            start: start.to_string(),
            end: end.to_string(),
            extra: Default::default(),
        },
        working_days: DAYS_OF_WEEK[..5].iter().map(|d| d.to_string()).collect(),
        break_time: TimeRange {
            start: break_start.to_string(),
            end: break_end.to_string(),
            extra: Default::default(),
        },
        availability_status: Availability::Available,
        automatic_updates: true,
        last_modified: now_ts(),
        extra: Default::default(),
    }
}

/// The actor's settings. Role defaults are stored the first time they are read.
pub fn get(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<TimeSettings> {
    let user = actor(backend, actor_id)?;
    let repo = TimeSettingsRepository::new(backend);
    if let Some(existing) = repo.find(&user.id)? {
        return Ok(existing);
    }
    let created = repo.insert(defaults_for(&user))?;
    info!("created default time settings for {}", user.id);
    Ok(created)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSettingsPatch {
    pub timezone: Option<String>,
    pub working_hours: Option<TimeRange>,
    pub working_days: Option<Vec<String>>,
    pub break_time: Option<TimeRange>,
    pub availability_status: Option<Availability>,
    pub automatic_updates: Option<bool>,
}

impl TimeSettingsPatch {
    fn changed_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.timezone.is_some() {
            out.push("timezone");
        }
        if self.working_hours.is_some() {
            out.push("workingHours");
        }
        if self.working_days.is_some() {
            out.push("workingDays");
        }
        if self.break_time.is_some() {
            out.push("breakTime");
        }
        if self.availability_status.is_some() {
            out.push("availabilityStatus");
        }
        if self.automatic_updates.is_some() {
            out.push("automaticUpdates");
        }
        out
    }

    fn validate(&self) -> StoreResult<()> {
        if let Some(tz) = &self.timezone {
            if !TIMEZONES.contains(&tz.as_str()) {
                return Err(StoreError::validation(format!("unsupported timezone: {}", tz)));
            }
        }
        if let Some(range) = &self.working_hours {
            check_range("workingHours", range)?;
        }
        if let Some(range) = &self.break_time {
            check_range("breakTime", range)?;
        }
        if let Some(days) = &self.working_days {
            if let Some(bad) = days.iter().find(|d| !DAYS_OF_WEEK.contains(&d.as_str())) {
                return Err(StoreError::validation(format!("unknown day: {}", bad)));
            }
        }
        Ok(())
    }
}

fn check_range(field: &str, range: &TimeRange) -> StoreResult<()> {
    let parse = |raw: &str| {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .map_err(|_| StoreError::validation(format!("{} times must be HH:MM", field)))
    };
    if parse(&range.end)? <= parse(&range.start)? {
        return Err(StoreError::validation(format!("{} must end after it starts", field)));
    }
    Ok(())
}

/// Applies the patch, logs an update-history entry and stamps the user's `lastUpdated`.
pub fn update(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    patch: &TimeSettingsPatch,
) -> StoreResult<TimeSettings> {
    let fields = patch.changed_fields();
    if fields.is_empty() {
        return Err(StoreError::validation("nothing to update"));
    }
    patch.validate()?;
    let mut settings = get(backend, actor_id)?;
    if let Some(v) = &patch.timezone {
        settings.timezone = v.clone();
    }
    if let Some(v) = &patch.working_hours {
        settings.working_hours = v.clone();
    }
    if let Some(v) = &patch.working_days {
        settings.working_days = DAYS_OF_WEEK
            .iter()
            .filter(|d| v.iter().any(|x| x.as_str() == **d))
            .map(|d| d.to_string())
            .collect();
    }
    if let Some(v) = &patch.break_time {
        settings.break_time = v.clone();
    }
    if let Some(v) = patch.availability_status {
        settings.availability_status = v;
    }
    if let Some(v) = patch.automatic_updates {
        settings.automatic_updates = v;
    }
    let ts = now_ts();
    settings.last_modified = ts.clone();
    let settings = TimeSettingsRepository::new(backend).upsert(settings)?;

    let user = UserRepository::new(backend).update(actor_id, |u| {
        u.last_updated = Some(ts.clone());
        Ok(())
    })?;
    refresh_session(backend, &user)?;

    let details = match fields.as_slice() {
        [one] => format!("Updated {}", one),
        _ => "Updated multiple fields".to_string(),
    };
    let entry = UpdateHistoryEntry {
        id: Repository::<UpdateHistoryEntry>::new(backend).next_id("UPD")?,
        user_id: user.id.clone(),
        user_name: user.full_name(),
        action: policy::ACTION_TIME_SETTINGS_UPDATED.to_string(),
        details,
        timestamp: ts,
        extra: Default::default(),
    };
    audit::append(backend, entry, Placement::Back)?;
    info!("{} updated time settings ({})", user.id, fields.join(", "));
    Ok(settings)
}

/// The actor's latest update-history entries, newest first.
pub fn history(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<Vec<UpdateHistoryEntry>> {
    let user = actor(backend, actor_id)?;
    audit::recent(backend, Some(&user.id), Some(HISTORY_LIMIT))
}
