//! Admin reports over active students and faculty, with CSV export.

use super::accounts::{actor, require_role};
use super::backend::KeyValueBackend;
use super::error::StoreResult;
use super::models::{RecordStatus, Role};
use super::repository::{FacultyDetailRepository, StudentDetailRepository, UserRepository};
use super::resolve::{merge_faculty, merge_students};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Students,
    Faculty,
}

impl ReportKind {
    fn as_str(self) -> &'static str {
        match self {
            ReportKind::Students => "students",
            ReportKind::Faculty => "faculty",
        }
    }

    fn columns(self) -> &'static [&'static str] {
        match self {
            ReportKind::Students => &["id", "name", "email", "course", "department", "year", "enrollmentDate"],
            ReportKind::Faculty => &["id", "name", "email", "department", "position", "hireDate", "phone"],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    pub course: Option<String>,
    pub department: Option<String>,
}

fn wanted(value: &str, filter: &Option<String>) -> bool {
    match filter.as_deref() {
        None | Some("") | Some("all") => true,
        Some(f) => f == value,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub course: String,
    pub department: String,
    pub year: String,
    pub enrollment_date: String,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub hire_date: String,
    pub phone: String,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<R> {
    pub total: usize,
    /// Counts by course for students, by position for faculty.
    pub by_category: BTreeMap<String, usize>,
    pub by_department: BTreeMap<String, usize>,
    pub rows: Vec<R>,
}

fn tally<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for v in values {
        *out.entry(v.to_string()).or_insert(0) += 1;
    }
    out
}

fn student_rows(backend: &dyn KeyValueBackend, filter: &ReportFilter) -> StoreResult<Vec<StudentRow>> {
    let users = UserRepository::new(backend).all()?;
    let details = StudentDetailRepository::new(backend).all()?;
    Ok(merge_students(&users, &details)
        .into_iter()
        .filter(|s| s.status == RecordStatus::Active)
        .filter(|s| wanted(&s.course, &filter.course) && wanted(&s.department, &filter.department))
        .map(|s| StudentRow {
            name: format!("{} {}", s.first_name, s.last_name),
            id: s.id,
            email: s.email,
            course: s.course,
            department: s.department,
            year: s.year,
            enrollment_date: s.enrollment_date,
            status: s.status,
        })
        .collect())
}

fn faculty_rows(backend: &dyn KeyValueBackend, filter: &ReportFilter) -> StoreResult<Vec<FacultyRow>> {
    let users = UserRepository::new(backend).all()?;
    let details = FacultyDetailRepository::new(backend).all()?;
    Ok(merge_faculty(&users, &details)
        .into_iter()
        .filter(|f| f.status == RecordStatus::Active)
        .filter(|f| wanted(&f.department, &filter.department))
        .map(|f| FacultyRow {
            name: format!("{} {}", f.first_name, f.last_name),
            id: f.id,
            email: f.email,
            department: f.department,
            position: f.position,
            hire_date: f.hire_date,
            phone: f.phone,
            status: f.status,
        })
        .collect())
}

pub fn students(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    filter: &ReportFilter,
) -> StoreResult<Report<StudentRow>> {
    let who = actor(backend, actor_id)?;
    require_role(&who, &[Role::Admin], "view reports")?;
    let rows = student_rows(backend, filter)?;
    Ok(Report {
        total: rows.len(),
        by_category: tally(rows.iter().map(|r| r.course.as_str())),
        by_department: tally(rows.iter().map(|r| r.department.as_str())),
        rows,
    })
}

pub fn faculty(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    filter: &ReportFilter,
) -> StoreResult<Report<FacultyRow>> {
    let who = actor(backend, actor_id)?;
    require_role(&who, &[Role::Admin], "view reports")?;
    let rows = faculty_rows(backend, filter)?;
    Ok(Report {
        total: rows.len(),
        by_category: tally(rows.iter().map(|r| r.position.as_str())),
        by_department: tally(rows.iter().map(|r| r.department.as_str())),
        rows,
    })
}

/// Quotes a cell when it holds a comma, quote or line break.
pub fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells.into_iter().map(csv_cell).collect::<Vec<_>>().join(",")
}

/// Header plus one line per row, `\n` separated. No rows gives an empty document.
pub fn to_csv(kind: ReportKind, rows: &[Vec<&str>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let mut lines = vec![csv_line(kind.columns().iter().copied())];
    lines.extend(rows.iter().map(|r| csv_line(r.iter().copied())));
    lines.join("\n")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
    pub filename: String,
    pub rows: usize,
    pub content: String,
}

pub fn export_csv(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    kind: ReportKind,
    filter: &ReportFilter,
    today: NaiveDate,
) -> StoreResult<CsvExport> {
    let (rows, content) = match kind {
        ReportKind::Students => {
            let report = students(backend, actor_id, filter)?;
            let cells: Vec<Vec<&str>> = report
                .rows
                .iter()
                .map(|r| {
                    vec![
                        r.id.as_str(),
                        r.name.as_str(),
                        r.email.as_str(),
                        r.course.as_str(),
                        r.department.as_str(),
                        r.year.as_str(),
                        r.enrollment_date.as_str(),
                    ]
                })
                .collect();
            (report.total, to_csv(kind, &cells))
        }
        ReportKind::Faculty => {
            let report = faculty(backend, actor_id, filter)?;
            let cells: Vec<Vec<&str>> = report
                .rows
                .iter()
                .map(|r| {
                    vec![
                        r.id.as_str(),
                        r.name.as_str(),
                        r.email.as_str(),
                        r.department.as_str(),
                        r.position.as_str(),
                        r.hire_date.as_str(),
                        r.phone.as_str(),
                    ]
                })
                .collect();
            (report.total, to_csv(kind, &cells))
        }
    };
    Ok(CsvExport {
        filename: format!("{}_report_{}.csv", kind.as_str(), today.format("%Y-%m-%d")),
        rows,
        content,
    })
}
