//! Courses, departments and academic years. Anyone may read; admins edit.

use super::accounts::{actor, require_role};
use super::backend::KeyValueBackend;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{AcademicYear, Course, Department, RecordStatus, Role};
use super::policy::{DEFAULT_COURSE_CREDITS, DEFAULT_DEPARTMENT_ESTABLISHED};
use super::repository::{Record, Repository};
use log::info;
use rand::Rng;
use serde::Deserialize;

/// Records whose visibility is gated by a status field.
pub trait Archivable: Record {
    fn status(&self) -> RecordStatus;
    fn set_status(&mut self, status: RecordStatus);
}

macro_rules! archivable {
    ($ty:ty) => {
        impl Archivable for $ty {
            fn status(&self) -> RecordStatus {
                self.status
            }

            fn set_status(&mut self, status: RecordStatus) {
                self.status = status;
            }
        }
    };
}

archivable!(Course);
archivable!(Department);
archivable!(AcademicYear);

fn admin_only(backend: &dyn KeyValueBackend, actor_id: &str, action: &str) -> StoreResult<String> {
    let admin = actor(backend, actor_id)?;
    require_role(&admin, &[Role::Admin], action)?;
    Ok(admin.id)
}

fn list_visible<T: Archivable>(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    include_archived: bool,
) -> StoreResult<Vec<T>> {
    actor(backend, actor_id)?;
    Ok(Repository::<T>::new(backend)
        .all()?
        .into_iter()
        .filter(|r| include_archived || r.status() == RecordStatus::Active)
        .collect())
}

/// Archives a catalog record in place. It stays in the collection.
pub fn archive<T: Archivable>(backend: &dyn KeyValueBackend, actor_id: &str, id: &str) -> StoreResult<T> {
    let admin = admin_only(backend, actor_id, "edit system settings")?;
    let archived = Repository::<T>::new(backend).update(id, |r| {
        r.set_status(RecordStatus::Archived);
        Ok(())
    })?;
    info!("{} archived {} {}", admin, T::ENTITY, id);
    Ok(archived)
}

fn course_with_defaults(mut c: Course) -> Course {
    if c.credits == 0 {
        c.credits = DEFAULT_COURSE_CREDITS;
    }
    if c.description.is_empty() {
        c.description = format!("{} course description", c.name);
    }
    c
}

fn department_with_defaults(mut d: Department) -> Department {
    if d.description.is_empty() {
        d.description = format!("{} department", d.name);
    }
    if d.established.is_empty() {
        d.established = DEFAULT_DEPARTMENT_ESTABLISHED.to_string();
    }
    d
}

pub fn list_courses(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    include_archived: bool,
) -> StoreResult<Vec<Course>> {
    Ok(list_visible::<Course>(backend, actor_id, include_archived)?
        .into_iter()
        .map(course_with_defaults)
        .collect())
}

pub fn list_departments(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    include_archived: bool,
) -> StoreResult<Vec<Department>> {
    Ok(list_visible::<Department>(backend, actor_id, include_archived)?
        .into_iter()
        .map(department_with_defaults)
        .collect())
}

pub fn list_academic_years(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    include_archived: bool,
) -> StoreResult<Vec<AcademicYear>> {
    list_visible(backend, actor_id, include_archived)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseForm {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub description: String,
}

/// Generated course code: first three letters of the name plus a number.
fn course_code<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    let stem: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    format!("{}{}", stem, rng.gen_range(0..1000))
}

pub fn save_course<R: Rng + ?Sized>(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    form: &CourseForm,
    rng: &mut R,
) -> StoreResult<Course> {
    let admin = admin_only(backend, actor_id, "edit system settings")?;
    if form.name.trim().is_empty() || form.department.trim().is_empty() {
        return Err(StoreError::validation("name and department are required"));
    }
    let repo = Repository::<Course>::new(backend);
    let saved = match &form.id {
        Some(id) => repo.update(id, |c| {
            c.name = form.name.clone();
            c.department = form.department.clone();
            if !form.code.is_empty() {
                c.code = form.code.clone();
            }
            if let Some(credits) = form.credits {
                c.credits = credits;
            }
            c.description = form.description.clone();
            Ok(())
        })?,
        None => {
            let course = Course {
                id: repo.next_id("CS")?,
                name: form.name.clone(),
                department: form.department.clone(),
                code: if form.code.is_empty() {
                    course_code(&form.name, rng)
                } else {
                    form.code.clone()
                },
                credits: form.credits.unwrap_or(DEFAULT_COURSE_CREDITS),
                description: form.description.clone(),
                status: RecordStatus::Active,
                students: None,
                extra: Default::default(),
            };
            repo.insert(course)?
        }
    };
    info!("{} saved course {}", admin, saved.id);
    Ok(course_with_defaults(saved))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentForm {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub established: String,
}

pub fn save_department(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    form: &DepartmentForm,
) -> StoreResult<Department> {
    let admin = admin_only(backend, actor_id, "edit system settings")?;
    if form.name.trim().is_empty() {
        return Err(StoreError::validation("name is required"));
    }
    let repo = Repository::<Department>::new(backend);
    let saved = match &form.id {
        Some(id) => repo.update(id, |d| {
            d.name = form.name.clone();
            d.head = form.head.clone();
            d.description = form.description.clone();
            if !form.established.is_empty() {
                d.established = form.established.clone();
            }
            Ok(())
        })?,
        None => repo.insert(Department {
            id: repo.next_id("DEP")?,
            name: form.name.clone(),
            head: form.head.clone(),
            description: form.description.clone(),
            established: form.established.clone(),
            status: RecordStatus::Active,
            faculty: None,
            extra: Default::default(),
        })?,
    };
    info!("{} saved department {}", admin, saved.id);
    Ok(department_with_defaults(saved))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYearForm {
    #[serde(default)]
    pub id: Option<String>,
    pub year: String,
    pub start_date: String,
    pub end_date: String,
    pub semester: String,
}

pub fn save_academic_year(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    form: &AcademicYearForm,
) -> StoreResult<AcademicYear> {
    let admin = admin_only(backend, actor_id, "edit system settings")?;
    if form.year.trim().is_empty() || form.semester.trim().is_empty() {
        return Err(StoreError::validation("year and semester are required"));
    }
    if !form.start_date.is_empty() && !form.end_date.is_empty() && form.end_date < form.start_date {
        return Err(StoreError::validation("endDate is before startDate"));
    }
    let repo = Repository::<AcademicYear>::new(backend);
    let saved = match &form.id {
        Some(id) => repo.update(id, |y| {
            y.year = form.year.clone();
            y.start_date = form.start_date.clone();
            y.end_date = form.end_date.clone();
            y.semester = form.semester.clone();
            Ok(())
        })?,
        None => {
            let existing = repo.all()?;
            repo.insert(AcademicYear {
                id: ids::next_academic_year_id(existing.iter().map(|y| y.id.as_str())),
                year: form.year.clone(),
                start_date: form.start_date.clone(),
                end_date: form.end_date.clone(),
                semester: form.semester.clone(),
                status: RecordStatus::Active,
                extra: Default::default(),
            })?
        }
    };
    info!("{} saved academic year {}", admin, saved.id);
    Ok(saved)
}
