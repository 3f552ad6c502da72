use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use log::debug;

type Handler = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const HANDLERS: &[Handler] = &[
    handlers::core::try_handle,
    handlers::storage::try_handle,
    handlers::accounts::try_handle,
    handlers::directory::try_handle,
    handlers::messages::try_handle,
    handlers::calendar::try_handle,
    handlers::lessons::try_handle,
    handlers::classes::try_handle,
    handlers::time::try_handle,
    handlers::catalog::try_handle,
    handlers::notifications::try_handle,
    handlers::dashboard::try_handle,
    handlers::reports::try_handle,
    handlers::backup::try_handle,
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    debug!("request {} {}", req.id, req.method);
    for handler in HANDLERS {
        if let Some(resp) = handler(state, &req) {
            return resp;
        }
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
