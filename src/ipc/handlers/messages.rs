use crate::ipc::helpers::{acting, Empty};
use crate::ipc::types::{AppState, Request};
use crate::store::messaging::{self, Compose, Folder};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    folder: Folder,
    #[serde(default)]
    search: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageIdParams {
    message_id: String,
}

fn handle_recipients(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        let users: Vec<serde_json::Value> = messaging::recipients(backend, actor_id)?
            .iter()
            .map(|u| {
                json!({
                    "id": u.id,
                    "name": u.full_name(),
                    "email": u.email,
                    "role": u.role,
                })
            })
            .collect();
        Ok(json!({ "recipients": users }))
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ListParams| {
        let messages = messaging::list(backend, actor_id, p.folder, p.search.as_deref())?;
        Ok(json!({ "messages": messages }))
    })
}

fn handle_send(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, draft: Compose| {
        Ok(json!({ "message": messaging::send(backend, actor_id, &draft)? }))
    })
}

fn handle_mark_read(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: MessageIdParams| {
        Ok(json!({ "message": messaging::mark_read(backend, actor_id, &p.message_id)? }))
    })
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: MessageIdParams| {
        messaging::delete(backend, actor_id, &p.message_id)?;
        Ok(json!({ "deleted": p.message_id }))
    })
}

fn handle_reply_draft(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: MessageIdParams| {
        Ok(json!({ "draft": messaging::reply_to(backend, actor_id, &p.message_id)? }))
    })
}

fn handle_unread_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        let who = crate::store::accounts::actor(backend, actor_id)?;
        Ok(json!({ "unread": messaging::unread_count(backend, &who.id)? }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "messages.recipients" => Some(handle_recipients(state, req)),
        "messages.list" => Some(handle_list(state, req)),
        "messages.send" => Some(handle_send(state, req)),
        "messages.markRead" => Some(handle_mark_read(state, req)),
        "messages.delete" => Some(handle_delete(state, req)),
        "messages.replyDraft" => Some(handle_reply_draft(state, req)),
        "messages.unreadCount" => Some(handle_unread_count(state, req)),
        _ => None,
    }
}
