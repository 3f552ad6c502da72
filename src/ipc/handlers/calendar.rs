use crate::ipc::helpers::{acting, Empty};
use crate::ipc::types::{AppState, Request};
use crate::store::calendar::{self, EventDraft, EventPatch};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct DateParams {
    date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    event_id: String,
    #[serde(flatten)]
    patch: EventPatch,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventIdParams {
    event_id: String,
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        Ok(json!({ "events": calendar::list(backend, actor_id)? }))
    })
}

fn handle_on_date(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: DateParams| {
        Ok(json!({ "date": p.date, "events": calendar::on_date(backend, actor_id, &p.date)? }))
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, draft: EventDraft| {
        Ok(json!({ "event": calendar::create(backend, actor_id, &draft)? }))
    })
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: UpdateParams| {
        Ok(json!({ "event": calendar::update(backend, actor_id, &p.event_id, &p.patch)? }))
    })
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: EventIdParams| {
        calendar::delete(backend, actor_id, &p.event_id)?;
        Ok(json!({ "deleted": p.event_id }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.list" => Some(handle_list(state, req)),
        "calendar.onDate" => Some(handle_on_date(state, req)),
        "calendar.create" => Some(handle_create(state, req)),
        "calendar.update" => Some(handle_update(state, req)),
        "calendar.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
