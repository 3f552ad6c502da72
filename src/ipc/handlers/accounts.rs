use crate::ipc::helpers::{acting, parse_params, with_store, Empty};
use crate::ipc::types::{AppState, Request};
use crate::store::accounts::{self, NewAccount, ProfileUpdate, UserFilter};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct LoginParams {
    identifier: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdParams {
    user_id: String,
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p: LoginParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    with_store(state, req, |backend| {
        let user = accounts::login(backend, &p.identifier, &p.password)?;
        Ok(json!({ "user": user }))
    })
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |backend| {
        Ok(json!({ "loggedOut": accounts::logout(backend)? }))
    })
}

fn handle_session_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |backend| {
        Ok(json!({ "user": accounts::current_session(backend)? }))
    })
}

fn handle_signup(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p: NewAccount = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    with_store(state, req, |backend| {
        let user = accounts::signup(backend, &p, &mut rand::thread_rng())?;
        Ok(json!({ "user": user }))
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: NewAccount| {
        let user = accounts::create_account(backend, actor_id, &p, &mut rand::thread_rng())?;
        Ok(json!({ "user": user }))
    })
}

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, filter: UserFilter| {
        Ok(json!({ "users": accounts::list_users(backend, actor_id, &filter)? }))
    })
}

fn handle_users_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: UserIdParams| {
        Ok(json!({ "user": accounts::get_user(backend, actor_id, &p.user_id)? }))
    })
}

fn handle_profile_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, patch: ProfileUpdate| {
        Ok(json!({ "user": accounts::update_profile(backend, actor_id, &patch)? }))
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordParams {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdsParams {
    user_ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogsParams {
    #[serde(default)]
    user_id: Option<String>,
}

fn handle_password_change(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ChangePasswordParams| {
        let user = accounts::change_password(
            backend,
            actor_id,
            &p.current_password,
            &p.new_password,
            &p.confirm_password,
        )?;
        Ok(json!({ "userId": user.id }))
    })
}

fn handle_password_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: UserIdParams| {
        let user = accounts::reset_password(backend, actor_id, &p.user_id)?;
        Ok(json!({ "userId": user.id, "password": user.password }))
    })
}

fn handle_password_reset_selected(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: UserIdsParams| {
        Ok(serde_json::to_value(accounts::reset_selected(backend, actor_id, &p.user_ids)?)?)
    })
}

fn handle_password_reset_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, _: Empty| {
        Ok(json!({ "reset": accounts::reset_all(backend, actor_id)? }))
    })
}

fn handle_password_logs(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: LogsParams| {
        let logs = accounts::password_logs(backend, actor_id, p.user_id.as_deref())?;
        Ok(json!({ "logs": logs }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "session.current" => Some(handle_session_current(state, req)),
        "accounts.signup" => Some(handle_signup(state, req)),
        "accounts.create" => Some(handle_create(state, req)),
        "users.list" => Some(handle_users_list(state, req)),
        "users.get" => Some(handle_users_get(state, req)),
        "profile.update" => Some(handle_profile_update(state, req)),
        "passwords.change" => Some(handle_password_change(state, req)),
        "passwords.reset" => Some(handle_password_reset(state, req)),
        "passwords.resetSelected" => Some(handle_password_reset_selected(state, req)),
        "passwords.resetAll" => Some(handle_password_reset_all(state, req)),
        "passwords.logs" => Some(handle_password_logs(state, req)),
        _ => None,
    }
}
