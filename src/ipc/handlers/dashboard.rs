use crate::ipc::helpers::{acting, Empty};
use crate::ipc::types::{AppState, Request};
use crate::store::dashboard;
use crate::store::StoreError;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub(crate) struct DayParams {
    #[serde(default)]
    today: Option<String>,
}

impl DayParams {
    /// The caller's `today` (YYYY-MM-DD), or the local date.
    pub(crate) fn day(&self) -> Result<NaiveDate, StoreError> {
        match self.today.as_deref() {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| StoreError::validation(format!("today must be YYYY-MM-DD: {:?}", raw))),
            None => Ok(Local::now().date_naive()),
        }
    }
}

fn handle_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        Ok(serde_json::to_value(dashboard::school_stats(backend, actor_id)?)?)
    })
}

fn handle_user_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: DayParams| {
        Ok(serde_json::to_value(dashboard::user_stats(backend, actor_id, p.day()?)?)?)
    })
}

fn handle_recent_activity(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        Ok(json!({ "activities": dashboard::recent_activity(backend, actor_id)? }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.stats" => Some(handle_stats(state, req)),
        "dashboard.userStats" => Some(handle_user_stats(state, req)),
        "dashboard.recentActivity" => Some(handle_recent_activity(state, req)),
        _ => None,
    }
}
