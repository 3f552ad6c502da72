use crate::ipc::helpers::acting;
use crate::ipc::types::{AppState, Request};
use crate::store::notifications;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default)]
    unread_only: bool,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationIdParams {
    notification_id: String,
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ListParams| {
        let items = notifications::list(backend, actor_id, p.unread_only, p.limit)?;
        Ok(json!({ "notifications": items }))
    })
}

fn handle_mark_read(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: NotificationIdParams| {
        let n = notifications::mark_read(backend, actor_id, &p.notification_id)?;
        Ok(json!({ "notification": n }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notifications.list" => Some(handle_list(state, req)),
        "notifications.markRead" => Some(handle_mark_read(state, req)),
        _ => None,
    }
}
