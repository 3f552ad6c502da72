use crate::ipc::helpers::acting;
use crate::ipc::types::{AppState, Request};
use crate::store::lessons::{self, AssignmentDraft, Grade, LessonDraft, LessonScope};
use crate::store::models::LessonStatus;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    scope: LessonScope,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonIdParams {
    lesson_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusParams {
    lesson_id: String,
    status: LessonStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentParams {
    lesson_id: String,
    #[serde(flatten)]
    draft: AssignmentDraft,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitParams {
    lesson_id: String,
    assignment_id: String,
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GradeParams {
    lesson_id: String,
    assignment_id: String,
    submission_id: String,
    #[serde(flatten)]
    grade: Grade,
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ListParams| {
        Ok(json!({ "lessons": lessons::list(backend, actor_id, p.scope)? }))
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, draft: LessonDraft| {
        Ok(json!({ "lesson": lessons::create(backend, actor_id, &draft)? }))
    })
}

fn handle_set_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: StatusParams| {
        Ok(json!({ "lesson": lessons::set_status(backend, actor_id, &p.lesson_id, p.status)? }))
    })
}

fn handle_enroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: LessonIdParams| {
        Ok(json!({ "lesson": lessons::enroll(backend, actor_id, &p.lesson_id)? }))
    })
}

fn handle_create_assignment(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: AssignmentParams| {
        let assignment = lessons::create_assignment(backend, actor_id, &p.lesson_id, &p.draft)?;
        Ok(json!({ "assignment": assignment }))
    })
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: SubmitParams| {
        let submission =
            lessons::submit(backend, actor_id, &p.lesson_id, &p.assignment_id, &p.content)?;
        Ok(json!({ "submission": submission }))
    })
}

fn handle_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: GradeParams| {
        let submission = lessons::grade_submission(
            backend,
            actor_id,
            &p.lesson_id,
            &p.assignment_id,
            &p.submission_id,
            &p.grade,
        )?;
        Ok(json!({ "submission": submission }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "lessons.list" => Some(handle_list(state, req)),
        "lessons.create" => Some(handle_create(state, req)),
        "lessons.setStatus" => Some(handle_set_status(state, req)),
        "lessons.enroll" => Some(handle_enroll(state, req)),
        "lessons.createAssignment" => Some(handle_create_assignment(state, req)),
        "lessons.submit" => Some(handle_submit(state, req)),
        "lessons.gradeSubmission" => Some(handle_grade(state, req)),
        _ => None,
    }
}
