use crate::ipc::helpers::acting;
use crate::ipc::types::{AppState, Request};
use crate::store::directory::{self, DirectoryFilter, FacultyForm, StudentForm};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct IdParams {
    id: String,
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, filter: DirectoryFilter| {
        Ok(json!({ "students": directory::list_students(backend, actor_id, &filter)? }))
    })
}

fn handle_students_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, form: StudentForm| {
        let student = directory::save_student(backend, actor_id, &form, &mut rand::thread_rng())?;
        Ok(json!({ "student": student }))
    })
}

fn handle_students_archive(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: IdParams| {
        Ok(json!({ "student": directory::archive_student(backend, actor_id, &p.id)? }))
    })
}

fn handle_faculty_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, filter: DirectoryFilter| {
        Ok(json!({ "faculty": directory::list_faculty(backend, actor_id, &filter)? }))
    })
}

fn handle_faculty_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, form: FacultyForm| {
        let member = directory::save_faculty(backend, actor_id, &form, &mut rand::thread_rng())?;
        Ok(json!({ "faculty": member }))
    })
}

fn handle_faculty_archive(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: IdParams| {
        Ok(json!({ "faculty": directory::archive_faculty(backend, actor_id, &p.id)? }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.save" => Some(handle_students_save(state, req)),
        "students.archive" => Some(handle_students_archive(state, req)),
        "faculty.list" => Some(handle_faculty_list(state, req)),
        "faculty.save" => Some(handle_faculty_save(state, req)),
        "faculty.archive" => Some(handle_faculty_archive(state, req)),
        _ => None,
    }
}
