use super::dashboard::DayParams;
use crate::ipc::helpers::acting;
use crate::ipc::types::{AppState, Request};
use crate::store::reports::{self, ReportFilter, ReportKind};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExportParams {
    kind: ReportKind,
    #[serde(flatten)]
    filter: ReportFilter,
    #[serde(flatten)]
    day: DayParams,
}

fn handle_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, filter: ReportFilter| {
        Ok(serde_json::to_value(reports::students(backend, actor_id, &filter)?)?)
    })
}

fn handle_faculty(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, filter: ReportFilter| {
        Ok(serde_json::to_value(reports::faculty(backend, actor_id, &filter)?)?)
    })
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    acting(state, req, |backend, actor_id, p: ExportParams| {
        let export = reports::export_csv(backend, actor_id, p.kind, &p.filter, p.day.day()?)?;
        Ok(serde_json::to_value(export)?)
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.students" => Some(handle_students(state, req)),
        "reports.faculty" => Some(handle_faculty(state, req)),
        "reports.exportCsv" => Some(handle_export_csv(state, req)),
        _ => None,
    }
}
