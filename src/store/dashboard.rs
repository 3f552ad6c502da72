//! Dashboard aggregates. Read-only.

use super::accounts::actor;
use super::backend::KeyValueBackend;
use super::calendar;
use super::error::StoreResult;
use super::messaging;
use super::models::{CalendarEvent, Notification, Role};
use super::newest_first;
use super::notifications;
use super::policy::RECENT_NOTIFICATIONS;
use super::repository::{
    EnrollmentRepository, FacultyDetailRepository, LessonRepository, MessageRepository, Repository,
    StudentDetailRepository, UserRepository,
};
use super::lessons::pending_submissions;
use super::models::{Course, Department};
use super::resolve::find_ref;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

const COURSE_CHART_LIMIT: usize = 10;
const COURSE_NAME_WIDTH: usize = 30;
const DEPARTMENT_LABEL_WIDTH: usize = 20;
const RECENT_ACTIVITY_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollment {
    pub name: String,
    pub full_name: String,
    pub students: u32,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentShare {
    pub name: String,
    pub short_name: String,
    pub faculty: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolStats {
    pub total_students: usize,
    pub total_faculty: usize,
    pub total_courses: usize,
    pub course_enrollments: Vec<CourseEnrollment>,
    pub faculty_by_department: Vec<DepartmentShare>,
}

fn truncate(name: &str, width: usize, keep: usize) -> String {
    if name.chars().count() > width {
        format!("{}...", name.chars().take(keep).collect::<String>())
    } else {
        name.to_string()
    }
}

fn short_department(name: &str) -> String {
    let head = name.split('/').next().unwrap_or(name).trim();
    truncate(head, DEPARTMENT_LABEL_WIDTH, DEPARTMENT_LABEL_WIDTH - 2)
}

pub fn school_stats(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<SchoolStats> {
    actor(backend, actor_id)?;
    let users = UserRepository::new(backend).all()?;
    let courses = Repository::<Course>::new(backend).all()?;
    let departments = Repository::<Department>::new(backend).all()?;

    let mut course_enrollments: Vec<CourseEnrollment> = courses
        .iter()
        .take(COURSE_CHART_LIMIT)
        .map(|c| CourseEnrollment {
            name: truncate(&c.name, COURSE_NAME_WIDTH, COURSE_NAME_WIDTH),
            full_name: c.name.clone(),
            students: c.students.unwrap_or(0),
            department: c.department.clone(),
        })
        .collect();
    course_enrollments.sort_by(|a, b| b.students.cmp(&a.students));

    let total_dept_faculty: u32 = departments.iter().map(|d| d.faculty.unwrap_or(0)).sum();
    let faculty_by_department = departments
        .iter()
        .map(|d| {
            let faculty = d.faculty.unwrap_or(0);
            let percentage = if total_dept_faculty == 0 {
                0
            } else {
                (f64::from(faculty) * 100.0 / f64::from(total_dept_faculty)).round() as u32
            };
            DepartmentShare {
                name: d.name.clone(),
                short_name: short_department(&d.name),
                faculty,
                percentage,
            }
        })
        .collect();

    Ok(SchoolStats {
        total_students: users.iter().filter(|u| u.role == Role::Student).count(),
        total_faculty: users.iter().filter(|u| u.role == Role::Faculty).count(),
        total_courses: courses.len(),
        course_enrollments,
        faculty_by_department,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub unread_messages: usize,
    pub upcoming_classes: usize,
    pub pending_assignments: usize,
    pub total_classes: usize,
    pub upcoming_events: Vec<CalendarEvent>,
    pub notifications: Vec<Notification>,
}

fn date_of(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

/// Per-user counters. `today` anchors the "today and tomorrow" window and due dates.
pub fn user_stats(backend: &dyn KeyValueBackend, actor_id: &str, today: NaiveDate) -> StoreResult<UserStats> {
    let who = actor(backend, actor_id)?;
    let tomorrow = today + Duration::days(1);
    let upcoming_events: Vec<CalendarEvent> = calendar::events_for(backend, &who.id)?
        .into_iter()
        .filter(|e| date_of(&e.date).map_or(false, |d| d >= today && d <= tomorrow))
        .collect();

    let enrollments = EnrollmentRepository::new(backend).all()?;
    let lessons = LessonRepository::new(backend).all()?;
    let (total_classes, pending_assignments) = match who.role {
        Role::Faculty => (
            enrollments.iter().filter(|e| e.instructor.id == who.id).count(),
            pending_submissions(&lessons, &who.id),
        ),
        Role::Student => (
            enrollments
                .iter()
                .filter(|e| e.students.iter().any(|s| s.id == who.id))
                .count(),
            lessons
                .iter()
                .filter(|l| l.enrolled_students.contains(&who.id))
                .flat_map(|l| l.assignments.iter())
                .filter(|a| !a.submissions.iter().any(|s| s.student_id == who.id))
                .filter(|a| date_of(&a.due_date).map_or(false, |d| d > today))
                .count(),
        ),
        Role::Admin => (0, 0),
    };

    Ok(UserStats {
        unread_messages: messaging::unread_count(backend, &who.id)?,
        upcoming_classes: upcoming_events.len(),
        pending_assignments,
        total_classes,
        upcoming_events,
        notifications: notifications::list(backend, &who.id, false, Some(RECENT_NOTIFICATIONS))?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    User,
    Message,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: String,
}

/// Latest registrations and messages, newest first.
pub fn recent_activity(backend: &dyn KeyValueBackend, actor_id: &str) -> StoreResult<Vec<Activity>> {
    actor(backend, actor_id)?;
    let mut users = UserRepository::new(backend).all()?;
    users.sort_by(|a, b| newest_first(&a.created_at, &b.created_at));
    let students = StudentDetailRepository::new(backend).all()?;
    let faculty = FacultyDetailRepository::new(backend).all()?;

    let mut out: Vec<Activity> = Vec::new();
    for u in users.iter().take(2) {
        let (title, joined) = match u.role {
            Role::Student => (
                "New student enrolled",
                find_ref(&u.id, &students).and_then(|d| d.course.clone()),
            ),
            Role::Faculty => (
                "Faculty member added",
                find_ref(&u.id, &faculty).and_then(|d| d.department.clone()),
            ),
            Role::Admin => continue,
        };
        out.push(Activity {
            id: format!("activity_{}", u.id),
            kind: ActivityKind::User,
            title: title.to_string(),
            description: format!(
                "{} joined {}",
                u.full_name(),
                joined.as_deref().unwrap_or("the academy")
            ),
            timestamp: u.created_at.clone(),
        });
    }

    let mut messages = MessageRepository::new(backend).all()?;
    messages.sort_by(|a, b| newest_first(&a.timestamp, &b.timestamp));
    out.extend(messages.iter().take(2).map(|m| Activity {
        id: format!("activity_msg_{}", m.id),
        kind: ActivityKind::Message,
        title: "New message sent".to_string(),
        description: format!("{} sent: \"{}\"", m.sender_name, m.subject),
        timestamp: m.timestamp.clone(),
    }));

    out.sort_by(|a, b| newest_first(&a.timestamp, &b.timestamp));
    out.truncate(RECENT_ACTIVITY_LIMIT);
    Ok(out)
}
