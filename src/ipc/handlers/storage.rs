use crate::ipc::helpers::{parse_params, with_store};
use crate::ipc::types::{AppState, Request};
use crate::store::collection;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct KeyParams {
    key: String,
    #[serde(default)]
    strict: bool,
}

#[derive(Deserialize)]
struct SetParams {
    key: String,
    value: serde_json::Value,
}

fn handle_keys(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |backend| Ok(json!({ "keys": backend.keys()? })))
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p: KeyParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    with_store(state, req, |backend| {
        let value = collection::read_raw(backend, &p.key, p.strict)?;
        Ok(json!({ "key": p.key, "value": value }))
    })
}

fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p: SetParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    with_store(state, req, |backend| {
        collection::write_raw(backend, &p.key, &p.value)?;
        Ok(json!({ "key": p.key }))
    })
}

fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p: KeyParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    with_store(state, req, |backend| {
        let removed = collection::remove_raw(backend, &p.key)?;
        Ok(json!({ "key": p.key, "removed": removed }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "storage.keys" => Some(handle_keys(state, req)),
        "storage.get" => Some(handle_get(state, req)),
        "storage.set" => Some(handle_set(state, req)),
        "storage.remove" => Some(handle_remove(state, req)),
        _ => None,
    }
}
