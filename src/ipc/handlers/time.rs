use crate::ipc::helpers::{acting, Empty};
use crate::ipc::types::{AppState, Request};
use crate::store::time_settings::{self, TimeSettingsPatch};
use serde_json::json;

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        Ok(json!({ "settings": time_settings::get(backend, actor_id)? }))
    })
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, patch: TimeSettingsPatch| {
        Ok(json!({ "settings": time_settings::update(backend, actor_id, &patch)? }))
    })
}

fn handle_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        Ok(json!({ "history": time_settings::history(backend, actor_id)? }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "time.get" => Some(handle_get(state, req)),
        "time.update" => Some(handle_update(state, req)),
        "time.history" => Some(handle_history(state, req)),
        _ => None,
    }
}
