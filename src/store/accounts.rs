//! Users, the login session, profiles and password administration.

use super::audit::{self, Placement};
use super::backend::KeyValueBackend;
use super::collection;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{PasswordLog, Role, User};
use super::now_ts;
use super::policy::{self, MIN_NAME_LEN, MIN_PASSWORD_LEN};
use super::repository::{Repository, UserRepository};
use super::contains_ci;
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Loads the acting user. Every operation performed "as" someone starts here.
pub fn actor(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<User> {
    UserRepository::new(backend).get(actor_id)
}

pub fn require_role(user: &User, allowed: &[Role], action: &str) -> StoreResult<()> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    Err(StoreError::forbidden(format!(
        "{} may not {}",
        user.role.as_str(),
        action
    )))
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    // at least one dot with something on both sides of it
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot + 1 < domain.len() && !domain.starts_with('.'),
        None => false,
    }
}

fn check_name(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().chars().count() < MIN_NAME_LEN {
        return Err(StoreError::validation(format!(
            "{} must be at least {} characters",
            field, MIN_NAME_LEN
        )));
    }
    Ok(())
}

fn check_email(value: &str) -> StoreResult<()> {
    if !is_valid_email(value) {
        return Err(StoreError::validation(format!("invalid email: {}", value)));
    }
    Ok(())
}

/// Emails identify logins, so no two users may share one. `owner` is the
/// record being edited, which may keep its own address.
pub(crate) fn ensure_email_free(users: &[User], email: &str, owner: Option<&str>) -> StoreResult<()> {
    if users
        .iter()
        .any(|u| u.email == email && Some(u.id.as_str()) != owner)
    {
        return Err(StoreError::Conflict(format!("email already exists: {}", email)));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl NewAccount {
    pub fn validate(&self) -> StoreResult<()> {
        check_name("firstName", &self.first_name)?;
        check_name("lastName", &self.last_name)?;
        check_email(&self.email)?;
        if self.role == Role::Admin {
            return Err(StoreError::validation("role must be faculty or student"));
        }
        Ok(())
    }
}

/// Self-service registration. The email must not already be taken.
pub fn signup<R: Rng + ?Sized>(
    backend: &dyn KeyValueBackend,
    input: &NewAccount,
    rng: &mut R,
) -> StoreResult<User> {
    let user = insert_account(backend, input, rng)?;
    info!("signup {} ({})", user.id, user.role.as_str());
    Ok(user)
}

/// Admin-created account with generated credentials.
pub fn create_account<R: Rng + ?Sized>(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    input: &NewAccount,
    rng: &mut R,
) -> StoreResult<User> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "create accounts")?;
    let user = insert_account(backend, input, rng)?;
    info!("{} created account {}", admin.id, user.id);
    Ok(user)
}

fn insert_account<R: Rng + ?Sized>(
    backend: &dyn KeyValueBackend,
    input: &NewAccount,
    rng: &mut R,
) -> StoreResult<User> {
    input.validate()?;
    let repo = UserRepository::new(backend);
    let mut users = repo.all()?;
    ensure_email_free(&users, &input.email, None)?;
    let user = User {
        id: ids::next_id(input.role.id_prefix(), users.iter().map(|u| u.id.as_str())),
        username: ids::generate_username(&input.first_name, &input.last_name, rng),
        email: input.email.clone(),
        password: ids::generate_password(&input.first_name),
        role: input.role,
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        created_at: now_ts(),
        last_updated: None,
        profile_photo: None,
        bio: None,
        phone: None,
        location: None,
        extra: Default::default(),
    };
    users.push(user.clone());
    repo.save_all(&users)?;
    Ok(user)
}

/// Matches `identifier` against username or email. Success becomes the session.
pub fn login(backend: &dyn KeyValueBackend, identifier: &str, password: &str) -> StoreResult<User> {
    let user = UserRepository::new(backend)
        .all()?
        .into_iter()
        .find(|u| (u.username == identifier || u.email == identifier) && u.password == password)
        .ok_or(StoreError::InvalidCredentials)?;
    collection::save_session(backend, &user)?;
    info!("login {}", user.id);
    Ok(user)
}

pub fn logout(backend: &dyn KeyValueBackend) -> StoreResult<bool> {
    collection::clear_session(backend)
}

/// Restores the saved session, stamping `lastUpdated` on it and on the user record.
pub fn current_session(backend: &dyn KeyValueBackend) -> StoreResult<Option<User>> {
    let Some(mut user) = collection::load_session::<User>(backend)? else {
        return Ok(None);
    };
    let ts = now_ts();
    user.last_updated = Some(ts.clone());
    collection::save_session(backend, &user)?;

    let repo = UserRepository::new(backend);
    let mut users = repo.all()?;
    if let Some(stored) = users.iter_mut().find(|u| u.id == user.id) {
        stored.last_updated = Some(ts);
        repo.save_all(&users)?;
    } else {
        warn!("session user {} no longer exists", user.id);
    }
    Ok(Some(user))
}

/// Keeps the session copy in step with the user record it mirrors.
pub fn refresh_session(backend: &dyn KeyValueBackend, user: &User) -> StoreResult<()> {
    if let Some(session) = collection::load_session::<User>(backend)? {
        if session.id == user.id {
            collection::save_session(backend, user)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Admin user table: search over names, email and id, optional role filter.
pub fn list_users(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    filter: &UserFilter,
) -> StoreResult<Vec<User>> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "list users")?;
    let search = filter.search.as_deref().unwrap_or("");
    Ok(UserRepository::new(backend)
        .all()?
        .into_iter()
        .filter(|u| {
            search.is_empty()
                || contains_ci(&u.first_name, search)
                || contains_ci(&u.last_name, search)
                || contains_ci(&u.email, search)
                || contains_ci(&u.id, search)
        })
        .filter(|u| filter.role.map_or(true, |r| u.role == r))
        .collect())
}

pub fn get_user(backend: &dyn KeyValueBackend, actor_id: &str, user_id: &str) -> StoreResult<User> {
    let who = actor(backend, actor_id)?;
    if who.id != user_id {
        require_role(&who, &[Role::Admin], "view other users")?;
    }
    UserRepository::new(backend).get(user_id)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub profile_photo: Option<String>,
}

pub fn update_profile(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    patch: &ProfileUpdate,
) -> StoreResult<User> {
    if let Some(v) = &patch.first_name {
        check_name("firstName", v)?;
    }
    if let Some(v) = &patch.last_name {
        check_name("lastName", v)?;
    }
    let repo = UserRepository::new(backend);
    if let Some(v) = &patch.email {
        check_email(v)?;
        ensure_email_free(&repo.all()?, v, Some(actor_id))?;
    }
    let user = repo.update(actor_id, |u| {
        if let Some(v) = &patch.first_name {
            u.first_name = v.clone();
        }
        if let Some(v) = &patch.last_name {
            u.last_name = v.clone();
        }
        if let Some(v) = &patch.email {
            u.email = v.clone();
        }
        if patch.bio.is_some() {
            u.bio = patch.bio.clone();
        }
        if patch.phone.is_some() {
            u.phone = patch.phone.clone();
        }
        if patch.location.is_some() {
            u.location = patch.location.clone();
        }
        if patch.profile_photo.is_some() {
            u.profile_photo = patch.profile_photo.clone();
        }
        u.last_updated = Some(now_ts());
        Ok(())
    })?;
    refresh_session(backend, &user)?;
    Ok(user)
}

/// Self-service password change, logged with `changedBy = "self"`.
pub fn change_password(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    current: &str,
    new: &str,
    confirm: &str,
) -> StoreResult<User> {
    if current.is_empty() || new.is_empty() || confirm.is_empty() {
        return Err(StoreError::validation("all password fields are required"));
    }
    if new != confirm {
        return Err(StoreError::validation("new passwords do not match"));
    }
    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(StoreError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let user = UserRepository::new(backend).update(actor_id, |u| {
        if u.password != current {
            return Err(StoreError::validation("current password is incorrect"));
        }
        u.password = new.to_string();
        u.last_updated = Some(now_ts());
        Ok(())
    })?;
    let log = PasswordLog {
        id: Repository::<PasswordLog>::new(backend).next_id("PWD")?,
        user_id: user.id.clone(),
        user_name: user.full_name(),
        action: policy::ACTION_PASSWORD_CHANGED.to_string(),
        timestamp: now_ts(),
        changed_by: policy::CHANGED_BY_SELF.to_string(),
        extra: Default::default(),
    };
    audit::append(backend, log, Placement::Back)?;
    refresh_session(backend, &user)?;
    info!("{} changed own password", user.id);
    Ok(user)
}

fn admin_label(admin: &User) -> String {
    format!("{} (Admin)", admin.full_name())
}

/// Resets one user to their role's default password.
pub fn reset_password(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    user_id: &str,
) -> StoreResult<User> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "reset passwords")?;
    let user = UserRepository::new(backend).update(user_id, |u| {
        u.password = policy::default_password(u.role).to_string();
        u.last_updated = Some(now_ts());
        Ok(())
    })?;
    let log = PasswordLog {
        id: Repository::<PasswordLog>::new(backend).next_id("PWD")?,
        user_id: user.id.clone(),
        user_name: user.full_name(),
        action: policy::ACTION_PASSWORD_RESET.to_string(),
        timestamp: now_ts(),
        changed_by: admin_label(&admin),
        extra: Default::default(),
    };
    audit::append(backend, log, Placement::Front)?;
    refresh_session(backend, &user)?;
    info!("{} reset password of {}", admin.id, user.id);
    Ok(user)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub reset: Vec<String>,
    pub missing: Vec<String>,
}

/// Resets the given users. Unknown ids are skipped and reported.
pub fn reset_selected(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    user_ids: &[String],
) -> StoreResult<ResetReport> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "reset passwords")?;
    let mut wanted: Vec<&String> = Vec::new();
    for id in user_ids {
        if !wanted.contains(&id) {
            wanted.push(id);
        }
    }
    let reset = reset_matching(
        backend,
        &admin,
        policy::ACTION_PASSWORD_RESET_SELECTED,
        |u| wanted.iter().any(|id| **id == u.id),
    )?;
    let missing: Vec<String> = wanted
        .into_iter()
        .filter(|id| !reset.contains(*id))
        .cloned()
        .collect();
    for id in &missing {
        warn!("password reset skipped unknown user {}", id);
    }
    Ok(ResetReport { reset, missing })
}

/// Resets every user in the store.
pub fn reset_all(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<Vec<String>> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "reset passwords")?;
    let reset = reset_matching(backend, &admin, policy::ACTION_PASSWORD_RESET, |_| true)?;
    info!("{} reset all {} passwords", admin.id, reset.len());
    Ok(reset)
}

fn reset_matching<F>(
    backend: &dyn KeyValueBackend,
    admin: &User,
    action: &str,
    select: F,
) -> StoreResult<Vec<String>>
where
    F: Fn(&User) -> bool,
{
    let repo = UserRepository::new(backend);
    let mut users = repo.all()?;
    let mut touched = Vec::new();
    let ts = now_ts();
    for u in users.iter_mut().filter(|u| select(u)) {
        u.password = policy::default_password(u.role).to_string();
        u.last_updated = Some(ts.clone());
        touched.push(u.clone());
    }
    if touched.is_empty() {
        return Ok(Vec::new());
    }
    repo.save_all(&users)?;

    let logs_repo = Repository::<PasswordLog>::new(backend);
    let existing = logs_repo.all()?;
    let log_ids = ids::next_ids("PWD", existing.iter().map(|l| l.id.as_str()), touched.len());
    let entries = touched
        .iter()
        .zip(log_ids)
        .map(|(u, id)| PasswordLog {
            id,
            user_id: u.id.clone(),
            user_name: u.full_name(),
            action: action.to_string(),
            timestamp: ts.clone(),
            changed_by: admin_label(admin),
            extra: Default::default(),
        })
        .collect();
    audit::append_many(backend, entries, Placement::Front)?;
    for u in &touched {
        refresh_session(backend, u)?;
    }
    Ok(touched.into_iter().map(|u| u.id).collect())
}

/// Password audit trail, newest first. Non-admins only see their own entries.
pub fn password_logs(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    user_id: Option<&str>,
) -> StoreResult<Vec<PasswordLog>> {
    let who = actor(backend, actor_id)?;
    let scope = match (who.role, user_id) {
        (Role::Admin, scope) => scope,
        (_, Some(other)) if other != who.id => {
            return Err(StoreError::forbidden("may only view own password history"));
        }
        _ => Some(who.id.as_str()),
    };
    audit::recent(backend, scope, None)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::backend::MemoryBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub(crate) fn seed_user(backend: &dyn KeyValueBackend, id: &str, role: Role, first: &str, last: &str) -> User {
        let user = User {
            id: id.into(),
            username: format!("{}{}", &first[..1], last),
            email: format!("{}.{}@academy.edu", first.to_lowercase(), last.to_lowercase()),
            password: "Original1!".into(),
            role,
            first_name: first.into(),
            last_name: last.into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
            last_updated: None,
            profile_photo: None,
            bio: None,
            phone: None,
            location: None,
            extra: Default::default(),
        };
        UserRepository::new(backend).insert(user.clone()).expect("seed user");
        user
    }

    fn account(first: &str, last: &str, email: &str, role: Role) -> NewAccount {
        NewAccount {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            role,
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@school.edu"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@b@c.co"));
        assert!(!is_valid_email("a@b."));
    }

    #[test]
    fn created_students_get_sequential_ids_and_credentials() {
        let backend = MemoryBackend::new();
        let mut rng = StdRng::seed_from_u64(7);
        let emily = signup(
            &backend,
            &account("Emily", "Jones", "emily@academy.edu", Role::Student),
            &mut rng,
        )
        .expect("emily");
        assert_eq!(emily.id, "STU001");
        assert_eq!(emily.password, "Emily123!");
        let digits = emily.username.strip_prefix("EJones").expect("username prefix");
        assert!((1..=3).contains(&digits.len()));

        let john = signup(
            &backend,
            &account("John", "Doe", "john@academy.edu", Role::Student),
            &mut rng,
        )
        .expect("john");
        assert_eq!(john.id, "STU002");
    }

    #[test]
    fn signup_rejects_bad_input_and_duplicate_email() {
        let backend = MemoryBackend::new();
        let mut rng = StdRng::seed_from_u64(1);
        let short = signup(&backend, &account("E", "Jones", "e@a.co", Role::Student), &mut rng);
        assert!(matches!(short, Err(StoreError::Validation(_))));
        let admin = signup(&backend, &account("Eve", "Root", "e@a.co", Role::Admin), &mut rng);
        assert!(matches!(admin, Err(StoreError::Validation(_))));

        signup(&backend, &account("Eve", "Jones", "e@a.co", Role::Faculty), &mut rng).expect("first");
        let dup = signup(&backend, &account("Eva", "Smith", "e@a.co", Role::Student), &mut rng);
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
        assert_eq!(UserRepository::new(&backend).all().expect("all").len(), 1);
    }

    #[test]
    fn login_accepts_username_or_email() {
        let backend = MemoryBackend::new();
        let u = seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        assert_eq!(login(&backend, &u.username, "Original1!").expect("by username").id, "STU001");
        assert_eq!(login(&backend, &u.email, "Original1!").expect("by email").id, "STU001");
        assert!(matches!(
            login(&backend, &u.username, "wrong"),
            Err(StoreError::InvalidCredentials)
        ));

        let session = current_session(&backend).expect("session").expect("some");
        assert_eq!(session.id, "STU001");
        assert!(session.last_updated.is_some());
        assert!(logout(&backend).expect("logout"));
        assert!(current_session(&backend).expect("session").is_none());
    }

    #[test]
    fn change_password_rules() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        let mismatch = change_password(&backend, "STU001", "Original1!", "NewPass99", "NewPass98");
        assert!(matches!(mismatch, Err(StoreError::Validation(_))));
        let short = change_password(&backend, "STU001", "Original1!", "short", "short");
        assert!(matches!(short, Err(StoreError::Validation(_))));
        let wrong = change_password(&backend, "STU001", "nope", "NewPass99", "NewPass99");
        assert!(matches!(wrong, Err(StoreError::Validation(_))));
        assert_eq!(backend.raw("passwordLogs"), None);

        let u = change_password(&backend, "STU001", "Original1!", "NewPass99", "NewPass99")
            .expect("change");
        assert_eq!(u.password, "NewPass99");
        let logs = password_logs(&backend, "STU001", None).expect("logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "Password Changed");
        assert_eq!(logs[0].changed_by, "self");
    }

    #[test]
    fn faculty_reset_restores_role_default_and_logs() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "FAC001", Role::Faculty, "John", "Smith");
        let u = reset_password(&backend, "ADM001", "FAC001").expect("reset");
        assert_eq!(u.password, "Faculty123!");
        assert!(u.last_updated.is_some());
        let stored = UserRepository::new(&backend).get("FAC001").expect("stored");
        assert_eq!(stored.last_updated, u.last_updated);

        let logs: Vec<PasswordLog> = Repository::new(&backend).all().expect("logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "Password Reset to Default");
        assert_eq!(logs[0].user_id, "FAC001");
        assert_eq!(logs[0].changed_by, "Ada Admin (Admin)");
    }

    #[test]
    fn only_admins_reset() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "FAC001", Role::Faculty, "John", "Smith");
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        let res = reset_password(&backend, "FAC001", "STU001");
        assert!(matches!(res, Err(StoreError::Forbidden(_))));
        assert!(matches!(
            reset_password(&backend, "ADM404", "STU001"),
            Err(StoreError::ReferenceNotFound { .. })
        ));
    }

    #[test]
    fn selected_reset_reports_unknown_ids() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(&backend, "STU002", Role::Student, "John", "Doe");
        let report = reset_selected(
            &backend,
            "ADM001",
            &["STU002".to_string(), "STU404".to_string(), "STU002".to_string()],
        )
        .expect("reset");
        assert_eq!(report.reset, vec!["STU002"]);
        assert_eq!(report.missing, vec!["STU404"]);

        let users = UserRepository::new(&backend).all().expect("users");
        assert_eq!(users[1].password, "Original1!");
        assert!(users[1].last_updated.is_none());
        assert_eq!(users[2].password, "Student123!");
        assert!(users[2].last_updated.is_some());
        let logs: Vec<PasswordLog> = Repository::new(&backend).all().expect("logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "Password Reset to Default (Selected)");
    }

    #[test]
    fn reset_all_logs_every_user() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "FAC001", Role::Faculty, "John", "Smith");
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        let reset = reset_all(&backend, "ADM001").expect("reset all");
        assert_eq!(reset.len(), 3);
        let users = UserRepository::new(&backend).all().expect("users");
        let pw: Vec<&str> = users.iter().map(|u| u.password.as_str()).collect();
        assert_eq!(pw, vec!["Admin123!", "Faculty123!", "Student123!"]);
        assert!(users.iter().all(|u| u.last_updated.is_some()));
        let logs: Vec<PasswordLog> = Repository::new(&backend).all().expect("logs");
        let ids: Vec<&str> = logs.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["PWD001", "PWD002", "PWD003"]);
    }

    #[test]
    fn profile_update_validates_and_stamps() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        let bad = update_profile(
            &backend,
            "STU001",
            &ProfileUpdate {
                email: Some("nope".into()),
                ..Default::default()
            },
        );
        assert!(matches!(bad, Err(StoreError::Validation(_))));
        let u = update_profile(
            &backend,
            "STU001",
            &ProfileUpdate {
                bio: Some("Likes chemistry".into()),
                ..Default::default()
            },
        )
        .expect("update");
        assert_eq!(u.bio.as_deref(), Some("Likes chemistry"));
        assert!(u.last_updated.is_some());
    }

    #[test]
    fn profile_email_must_stay_unique() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(&backend, "STU002", Role::Student, "John", "Doe");
        let taken = update_profile(
            &backend,
            "STU002",
            &ProfileUpdate {
                email: Some("emily.jones@academy.edu".into()),
                ..Default::default()
            },
        );
        assert!(matches!(taken, Err(StoreError::Conflict(_))));
        assert_eq!(
            UserRepository::new(&backend).get("STU002").expect("john").email,
            "john.doe@academy.edu"
        );

        let own = update_profile(
            &backend,
            "STU001",
            &ProfileUpdate {
                email: Some("emily.jones@academy.edu".into()),
                ..Default::default()
            },
        )
        .expect("own email");
        assert_eq!(own.email, "emily.jones@academy.edu");
    }

    #[test]
    fn session_read_keeps_unknown_user_keys() {
        let backend = MemoryBackend::new();
        let mut emily = seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        emily.extra.insert("course".into(), serde_json::json!("BSCS"));
        emily.extra.insert("year".into(), serde_json::json!("2024"));
        UserRepository::new(&backend).upsert(emily).expect("upsert");

        login(&backend, "EJones", "Original1!").expect("login");
        current_session(&backend).expect("session").expect("some");
        let stored = UserRepository::new(&backend).get("STU001").expect("stored");
        assert_eq!(stored.extra.get("course"), Some(&serde_json::json!("BSCS")));
        assert_eq!(stored.extra.get("year"), Some(&serde_json::json!("2024")));
        assert!(stored.last_updated.is_some());
    }
}
