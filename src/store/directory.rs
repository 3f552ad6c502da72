//! Student and faculty directories: user records merged with their detail records.

use super::accounts::{actor, ensure_email_free, is_valid_email, require_role};
use super::backend::KeyValueBackend;
use super::contains_ci;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{FacultyDetail, RecordStatus, Role, StudentDetail, User};
use super::now_ts;
use super::policy::MIN_NAME_LEN;
use super::repository::{FacultyDetailRepository, StudentDetailRepository, UserRepository};
use super::resolve::{
    faculty_view, find_ref, merge_faculty, merge_students, student_view, FacultyView, StudentView,
};
use log::info;
use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    /// Archived records are hidden unless asked for.
    #[serde(default)]
    pub include_archived: bool,
}

impl DirectoryFilter {
    fn admits(&self, status: RecordStatus, id: &str, first: &str, last: &str, email: &str) -> bool {
        if !self.include_archived && status != RecordStatus::Active {
            return false;
        }
        match self.search.as_deref() {
            Some(q) if !q.is_empty() => {
                contains_ci(first, q) || contains_ci(last, q) || contains_ci(id, q) || contains_ci(email, q)
            }
            _ => true,
        }
    }
}

fn matches_opt(filter: &Option<String>, value: &str) -> bool {
    filter.as_deref().map_or(true, |f| f.is_empty() || f == value)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentForm {
    /// Present when editing an existing student.
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub enrollment_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyForm {
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub hire_date: Option<String>,
}

fn check_identity(first: &str, last: &str, email: &str) -> StoreResult<()> {
    if first.trim().chars().count() < MIN_NAME_LEN || last.trim().chars().count() < MIN_NAME_LEN {
        return Err(StoreError::validation(format!(
            "names must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    if !is_valid_email(email) {
        return Err(StoreError::validation(format!("invalid email: {}", email)));
    }
    Ok(())
}

/// Creates the user behind a new directory entry, or syncs names and email
/// onto the existing one. Returns the user id.
fn sync_user<R: Rng + ?Sized>(
    backend: &dyn KeyValueBackend,
    role: Role,
    id: Option<&str>,
    first: &str,
    last: &str,
    email: &str,
    rng: &mut R,
) -> StoreResult<User> {
    let repo = UserRepository::new(backend);
    let mut users = repo.all()?;
    ensure_email_free(&users, email, id)?;
    match id {
        Some(id) => repo.update(id, |u| {
            if u.role != role {
                return Err(StoreError::validation(format!(
                    "{} is not a {}",
                    u.id,
                    role.as_str()
                )));
            }
            u.first_name = first.to_string();
            u.last_name = last.to_string();
            u.email = email.to_string();
            Ok(())
        }),
        None => {
            let user = User {
                id: ids::next_id(role.id_prefix(), users.iter().map(|u| u.id.as_str())),
                username: ids::generate_username(first, last, rng),
                email: email.to_string(),
                password: ids::generate_password(first),
                role,
                first_name: first.to_string(),
                last_name: last.to_string(),
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
    }
}

pub fn list_students(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    filter: &DirectoryFilter,
) -> StoreResult<Vec<StudentView>> {
    let who = actor(backend, actor_id)?;
    require_role(&who, &[Role::Admin, Role::Faculty], "browse students")?;
    let users = UserRepository::new(backend).all()?;
    let details = StudentDetailRepository::new(backend).all()?;
    Ok(merge_students(&users, &details)
        .into_iter()
        .filter(|s| filter.admits(s.status, &s.id, &s.first_name, &s.last_name, &s.email))
        .filter(|s| matches_opt(&filter.course, &s.course))
        .filter(|s| matches_opt(&filter.department, &s.department))
        .collect())
}

pub fn save_student<R: Rng + ?Sized>(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    form: &StudentForm,
    rng: &mut R,
) -> StoreResult<StudentView> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "edit students")?;
    check_identity(&form.first_name, &form.last_name, &form.email)?;

    let user = sync_user(
        backend,
        Role::Student,
        form.id.as_deref(),
        &form.first_name,
        &form.last_name,
        &form.email,
        rng,
    )?;
    let repo = StudentDetailRepository::new(backend);
    let existing = repo.find(&user.id)?;
    let base = existing.unwrap_or_else(|| StudentDetail {
        id: user.id.clone(),
        status: Some(RecordStatus::Active),
        ..Default::default()
    });
    let detail = StudentDetail {
        course: form.course.clone().or(base.course),
        department: form.department.clone().or(base.department),
        year: form.year.clone().or(base.year),
        phone: form.phone.clone().or(base.phone),
        enrollment_date: form.enrollment_date.clone().or(base.enrollment_date),
        ..base
    };
    let detail = repo.upsert(detail)?;
    info!("{} saved student {}", admin.id, user.id);
    Ok(student_view(&user, Some(&detail)))
}

/// Marks the detail record archived. Nothing is purged.
pub fn archive_student(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    student_id: &str,
) -> StoreResult<StudentView> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "archive students")?;
    let users = UserRepository::new(backend).all()?;
    let user = find_ref(student_id, &users)
        .filter(|u| u.role == Role::Student)
        .ok_or_else(|| StoreError::not_found("student", student_id))?;
    let repo = StudentDetailRepository::new(backend);
    let mut detail = repo.find(student_id)?.unwrap_or_else(|| StudentDetail {
        id: student_id.to_string(),
        ..Default::default()
    });
    detail.status = Some(RecordStatus::Archived);
    let detail = repo.upsert(detail)?;
    info!("{} archived student {}", admin.id, student_id);
    Ok(student_view(user, Some(&detail)))
}

pub fn list_faculty(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    filter: &DirectoryFilter,
) -> StoreResult<Vec<FacultyView>> {
    let who = actor(backend, actor_id)?;
    require_role(&who, &[Role::Admin], "browse faculty")?;
    let users = UserRepository::new(backend).all()?;
    let details = FacultyDetailRepository::new(backend).all()?;
    Ok(merge_faculty(&users, &details)
        .into_iter()
        .filter(|f| filter.admits(f.status, &f.id, &f.first_name, &f.last_name, &f.email))
        .filter(|f| matches_opt(&filter.department, &f.department))
        .collect())
}

pub fn save_faculty<R: Rng + ?Sized>(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    form: &FacultyForm,
    rng: &mut R,
) -> StoreResult<FacultyView> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "edit faculty")?;
    check_identity(&form.first_name, &form.last_name, &form.email)?;

    let user = sync_user(
        backend,
        Role::Faculty,
        form.id.as_deref(),
        &form.first_name,
        &form.last_name,
        &form.email,
        rng,
    )?;
    let repo = FacultyDetailRepository::new(backend);
    let base = repo.find(&user.id)?.unwrap_or_else(|| FacultyDetail {
        id: user.id.clone(),
        status: Some(RecordStatus::Active),
        ..Default::default()
    });
    let detail = FacultyDetail {
        department: form.department.clone().or(base.department),
        position: form.position.clone().or(base.position),
        phone: form.phone.clone().or(base.phone),
        hire_date: form.hire_date.clone().or(base.hire_date),
        ..base
    };
    let detail = repo.upsert(detail)?;
    info!("{} saved faculty {}", admin.id, user.id);
    Ok(faculty_view(&user, Some(&detail)))
}

pub fn archive_faculty(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    faculty_id: &str,
) -> StoreResult<FacultyView> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], "archive faculty")?;
    let users = UserRepository::new(backend).all()?;
    let user = find_ref(faculty_id, &users)
        .filter(|u| u.role == Role::Faculty)
        .ok_or_else(|| StoreError::not_found("faculty", faculty_id))?;
    let repo = FacultyDetailRepository::new(backend);
    let mut detail = repo.find(faculty_id)?.unwrap_or_else(|| FacultyDetail {
        id: faculty_id.to_string(),
        ..Default::default()
    });
    detail.status = Some(RecordStatus::Archived);
    let detail = repo.upsert(detail)?;
    info!("{} archived faculty {}", admin.id, faculty_id);
    Ok(faculty_view(user, Some(&detail)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::tests::seed_user;
    use crate::store::backend::MemoryBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn student_form(first: &str, last: &str, email: &str) -> StudentForm {
        StudentForm {
            id: None,
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            course: Some("BS Nursing".into()),
            department: Some("Health Sciences".into()),
            year: None,
            phone: None,
            enrollment_date: None,
        }
    }

    #[test]
    fn new_student_creates_user_and_detail() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        let mut rng = StdRng::seed_from_u64(3);
        let view = save_student(
            &backend,
            "ADM001",
            &student_form("Emily", "Jones", "emily@academy.edu"),
            &mut rng,
        )
        .expect("save");
        assert_eq!(view.id, "STU001");
        assert_eq!(view.course, "BS Nursing");
        assert_eq!(view.year, "2024");

        let user = UserRepository::new(&backend).get("STU001").expect("user");
        assert_eq!(user.password, "Emily123!");
        assert!(StudentDetailRepository::new(&backend).find("STU001").expect("find").is_some());
    }

    #[test]
    fn editing_syncs_user_names() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        let mut rng = StdRng::seed_from_u64(3);
        let mut form = student_form("Emily", "Jones-Park", "ejp@academy.edu");
        form.id = Some("STU001".into());
        save_student(&backend, "ADM001", &form, &mut rng).expect("save");
        let user = UserRepository::new(&backend).get("STU001").expect("user");
        assert_eq!(user.last_name, "Jones-Park");
        assert_eq!(user.email, "ejp@academy.edu");
        assert_eq!(user.password, "Original1!");
    }

    #[test]
    fn saving_with_a_taken_email_is_a_conflict() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(&backend, "FAC001", Role::Faculty, "John", "Smith");
        let mut rng = StdRng::seed_from_u64(3);

        let fresh = save_student(
            &backend,
            "ADM001",
            &student_form("Emma", "Stone", "emily.jones@academy.edu"),
            &mut rng,
        );
        assert!(matches!(fresh, Err(StoreError::Conflict(_))));
        assert_eq!(UserRepository::new(&backend).all().expect("users").len(), 3);
        assert_eq!(backend.raw("students"), None);

        let mut edit = student_form("Emily", "Jones", "john.smith@academy.edu");
        edit.id = Some("STU001".into());
        let moved = save_student(&backend, "ADM001", &edit, &mut rng);
        assert!(matches!(moved, Err(StoreError::Conflict(_))));
        let emily = UserRepository::new(&backend).get("STU001").expect("emily");
        assert_eq!(emily.email, "emily.jones@academy.edu");

        edit.email = "emily.jones@academy.edu".into();
        save_student(&backend, "ADM001", &edit, &mut rng).expect("keeps own email");
    }

    #[test]
    fn archived_students_leave_active_view_but_stay_stored() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(&backend, "STU002", Role::Student, "John", "Doe");

        let all = list_students(&backend, "ADM001", &DirectoryFilter::default()).expect("list");
        assert_eq!(all.len(), 2);

        archive_student(&backend, "ADM001", "STU001").expect("archive");
        let active = list_students(&backend, "ADM001", &DirectoryFilter::default()).expect("list");
        let ids: Vec<&str> = active.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["STU002"]);

        let raw = StudentDetailRepository::new(&backend).get("STU001").expect("raw detail");
        assert_eq!(raw.status, Some(RecordStatus::Archived));
        assert!(UserRepository::new(&backend).find("STU001").expect("user").is_some());

        let everything = list_students(
            &backend,
            "ADM001",
            &DirectoryFilter {
                include_archived: true,
                ..Default::default()
            },
        )
        .expect("list");
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn search_and_department_filters() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "FAC001", Role::Faculty, "John", "Smith");
        seed_user(&backend, "FAC002", Role::Faculty, "Mary", "Major");
        FacultyDetailRepository::new(&backend)
            .upsert(FacultyDetail {
                id: "FAC002".into(),
                department: Some("Mathematics".into()),
                ..Default::default()
            })
            .expect("detail");

        let by_dept = list_faculty(
            &backend,
            "ADM001",
            &DirectoryFilter {
                department: Some("Mathematics".into()),
                ..Default::default()
            },
        )
        .expect("list");
        assert_eq!(by_dept.len(), 1);
        assert_eq!(by_dept[0].id, "FAC002");

        let by_name = list_faculty(
            &backend,
            "ADM001",
            &DirectoryFilter {
                search: Some("smi".into()),
                ..Default::default()
            },
        )
        .expect("list");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].department, "Engineering");
    }

    #[test]
    fn archiving_wrong_role_is_not_found() {
        let backend = MemoryBackend::new();
        seed_user(&backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(&backend, "FAC001", Role::Faculty, "John", "Smith");
        let res = archive_student(&backend, "ADM001", "FAC001");
        assert!(matches!(res, Err(StoreError::ReferenceNotFound { .. })));
        assert_eq!(backend.raw("students"), None);
    }
}
