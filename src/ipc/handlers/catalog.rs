use crate::ipc::helpers::acting;
use crate::ipc::types::{AppState, Request};
use crate::store::catalog::{self, AcademicYearForm, CourseForm, DepartmentForm};
use crate::store::models::{AcademicYear, Course, Department};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default)]
    include_archived: bool,
}

#[derive(Deserialize)]
struct IdParams {
    id: String,
}

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ListParams| {
        Ok(json!({ "courses": catalog::list_courses(backend, actor_id, p.include_archived)? }))
    })
}

fn handle_courses_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, form: CourseForm| {
        let course = catalog::save_course(backend, actor_id, &form, &mut rand::thread_rng())?;
        Ok(json!({ "course": course }))
    })
}

fn handle_courses_archive(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: IdParams| {
        Ok(json!({ "course": catalog::archive::<Course>(backend, actor_id, &p.id)? }))
    })
}

fn handle_departments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ListParams| {
        let departments = catalog::list_departments(backend, actor_id, p.include_archived)?;
        Ok(json!({ "departments": departments }))
    })
}

fn handle_departments_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, form: DepartmentForm| {
        Ok(json!({ "department": catalog::save_department(backend, actor_id, &form)? }))
    })
}

fn handle_departments_archive(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: IdParams| {
        Ok(json!({ "department": catalog::archive::<Department>(backend, actor_id, &p.id)? }))
    })
}

fn handle_years_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ListParams| {
        let years = catalog::list_academic_years(backend, actor_id, p.include_archived)?;
        Ok(json!({ "academicYears": years }))
    })
}

fn handle_years_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, form: AcademicYearForm| {
        Ok(json!({ "academicYear": catalog::save_academic_year(backend, actor_id, &form)? }))
    })
}

fn handle_years_archive(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: IdParams| {
        Ok(json!({ "academicYear": catalog::archive::<AcademicYear>(backend, actor_id, &p.id)? }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.save" => Some(handle_courses_save(state, req)),
        "courses.archive" => Some(handle_courses_archive(state, req)),
        "departments.list" => Some(handle_departments_list(state, req)),
        "departments.save" => Some(handle_departments_save(state, req)),
        "departments.archive" => Some(handle_departments_archive(state, req)),
        "academicYears.list" => Some(handle_years_list(state, req)),
        "academicYears.save" => Some(handle_years_save(state, req)),
        "academicYears.archive" => Some(handle_years_archive(state, req)),
        _ => None,
    }
}
