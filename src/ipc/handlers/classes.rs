use crate::ipc::helpers::acting;
use crate::ipc::types::{AppState, Request};
use crate::store::classes::{self, ClassDraft};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    search: Option<String>,
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: SearchParams| {
        Ok(json!({ "classes": classes::list(backend, actor_id, p.search.as_deref())? }))
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, draft: ClassDraft| {
        Ok(json!({ "class": classes::create(backend, actor_id, &draft)? }))
    })
}

fn handle_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: SearchParams| {
        let visible = classes::list(backend, actor_id, p.search.as_deref())?;
        Ok(serde_json::to_value(classes::stats(&visible))?)
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_list(state, req)),
        "classes.create" => Some(handle_create(state, req)),
        "classes.stats" => Some(handle_stats(state, req)),
        _ => None,
    }
}
