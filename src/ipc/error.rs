use crate::store::StoreError;
use log::warn;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Error envelope for a failed store operation.
pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    let details = match e {
        StoreError::CorruptStore { key, .. } => Some(json!({ "key": key })),
        StoreError::ReferenceNotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
        StoreError::DuplicateSubmission {
            assignment_id,
            student_id,
        } => Some(json!({ "assignmentId": assignment_id, "studentId": student_id })),
        StoreError::Storage(_) | StoreError::Serialization(_) => {
            warn!("request {} failed: {}", id, e);
            None
        }
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}
