use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::{KeyValueBackend, SqliteBackend, StoreResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Params of a request made on behalf of a user, plus the method's own fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acting<T> {
    pub actor_id: String,
    #[serde(flatten)]
    pub body: T,
}

/// No fields beyond `actorId`.
#[derive(Debug, Deserialize)]
pub struct Empty {}

pub fn parse_params<T: DeserializeOwned>(req: &Request) -> Result<T, serde_json::Value> {
    let params = if req.params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        req.params.clone()
    };
    serde_json::from_value(params).map_err(|e| err(&req.id, "bad_params", e.to_string(), None))
}

/// Runs `f` against the selected workspace's store and wraps the outcome.
pub fn with_store<F>(state: &AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&dyn KeyValueBackend) -> StoreResult<serde_json::Value>,
{
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let backend = SqliteBackend::new(conn);
    match f(&backend) {
        Ok(result) => ok(&req.id, result),
        Err(e) => store_err(&req.id, &e),
    }
}

/// `parse_params` then `with_store`.
pub fn acting<T, F>(state: &AppState, req: &Request, f: F) -> serde_json::Value
where
    T: DeserializeOwned,
    F: FnOnce(&dyn KeyValueBackend, &str, T) -> StoreResult<serde_json::Value>,
{
    let p: Acting<T> = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    with_store(state, req, |backend| f(backend, &p.actor_id, p.body))
}
