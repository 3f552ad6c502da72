//! Cross-reference resolution between collections.
//!
//! Missing references degrade to placeholders instead of failing, except where
//! a caller explicitly needs the target to exist (`resolve`).

use super::error::{StoreError, StoreResult};
use super::models::{
    ClassEnrollment, EnrollmentMember, FacultyDetail, Lesson, RecordStatus, Role, StudentDetail,
    User,
};
use super::policy;
use super::repository::Record;
use log::warn;
use serde::Serialize;
use std::collections::HashMap;

pub fn find_ref<'a, T: Record>(id: &str, items: &'a [T]) -> Option<&'a T> {
    items.iter().find(|r| r.id() == id)
}

/// Strict lookup: an unresolved reference is an error (and a warning in the log).
pub fn resolve<'a, T: Record>(id: &str, items: &'a [T]) -> StoreResult<&'a T> {
    find_ref(id, items).ok_or_else(|| {
        warn!("unresolved {} reference: {}", T::ENTITY, id);
        StoreError::not_found(T::ENTITY, id)
    })
}

/// Student user merged with its detail record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub course: String,
    pub department: String,
    pub year: String,
    pub phone: String,
    pub enrollment_date: String,
    pub status: RecordStatus,
}

/// Faculty user merged with its detail record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub phone: String,
    pub hire_date: String,
    pub status: RecordStatus,
}

fn or_default(v: &Option<String>, fallback: &str) -> String {
    v.as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub fn student_view(user: &User, detail: Option<&StudentDetail>) -> StudentView {
    let empty = StudentDetail::default();
    let d = detail.unwrap_or(&empty);
    StudentView {
        id: user.id.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        course: or_default(&d.course, policy::STUDENT_DEFAULT_COURSE),
        department: or_default(&d.department, policy::STUDENT_DEFAULT_DEPARTMENT),
        year: or_default(&d.year, policy::STUDENT_DEFAULT_YEAR),
        phone: or_default(&d.phone, policy::PLACEHOLDER_PHONE),
        enrollment_date: or_default(&d.enrollment_date, policy::STUDENT_DEFAULT_ENROLLMENT_DATE),
        status: d.status.unwrap_or_default(),
    }
}

pub fn faculty_view(user: &User, detail: Option<&FacultyDetail>) -> FacultyView {
    let empty = FacultyDetail::default();
    let d = detail.unwrap_or(&empty);
    FacultyView {
        id: user.id.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        department: or_default(&d.department, policy::FACULTY_DEFAULT_DEPARTMENT),
        position: or_default(&d.position, policy::FACULTY_DEFAULT_POSITION),
        phone: or_default(&d.phone, policy::PLACEHOLDER_PHONE),
        hire_date: or_default(&d.hire_date, policy::FACULTY_DEFAULT_HIRE_DATE),
        status: d.status.unwrap_or_default(),
    }
}

/// Every student user with its detail record; orphaned details are ignored.
pub fn merge_students(users: &[User], details: &[StudentDetail]) -> Vec<StudentView> {
    users
        .iter()
        .filter(|u| u.role == Role::Student)
        .map(|u| student_view(u, find_ref(&u.id, details)))
        .collect()
}

pub fn merge_faculty(users: &[User], details: &[FacultyDetail]) -> Vec<FacultyView> {
    users
        .iter()
        .filter(|u| u.role == Role::Faculty)
        .map(|u| faculty_view(u, find_ref(&u.id, details)))
        .collect()
}

/// Current display name of a lesson's instructor, falling back to the stored copy.
pub fn instructor_name(lesson: &Lesson, users: &[User]) -> String {
    match find_ref(&lesson.instructor_id, users) {
        Some(u) => u.full_name(),
        None if !lesson.instructor_name.is_empty() => lesson.instructor_name.clone(),
        None => "Unknown Instructor".to_string(),
    }
}

fn refresh_member(member: &EnrollmentMember, by_id: &HashMap<&str, &User>) -> EnrollmentMember {
    match by_id.get(member.id.as_str()) {
        Some(u) => EnrollmentMember {
            id: member.id.clone(),
            name: u.full_name(),
            email: u.email.clone(),
            extra: Default::default(),
        },
        None => member.clone(),
    }
}

/// Overlays live user names and emails onto a roster snapshot. Members whose
/// user no longer exists keep their snapshot values.
pub fn resolve_enrollment(enrollment: &ClassEnrollment, users: &[User]) -> ClassEnrollment {
    let by_id: HashMap<&str, &User> = users.iter().map(|u| (u.id.as_str(), u)).collect();
    ClassEnrollment {
        instructor: refresh_member(&enrollment.instructor, &by_id),
        students: enrollment
            .students
            .iter()
            .map(|s| refresh_member(s, &by_id))
            .collect(),
        ..enrollment.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::LessonStatus;

    fn user(id: &str, role: Role, first: &str, last: &str) -> User {
        User {
            id: id.into(),
            username: format!("{first}{last}"),
            email: format!("{}@academy.edu", first.to_lowercase()),
            password: "pw".into(),
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
        }
    }

    #[test]
    fn missing_detail_gets_placeholders() {
        let users = vec![user("FAC001", Role::Faculty, "John", "Smith")];
        let merged = merge_faculty(&users, &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].department, "Engineering");
        assert_eq!(merged[0].position, "Assistant Professor");
        assert_eq!(merged[0].status, RecordStatus::Active);
    }

    #[test]
    fn detail_overrides_defaults_and_orphans_are_ignored() {
        let users = vec![
            user("STU001", Role::Student, "Emily", "Jones"),
            user("FAC001", Role::Faculty, "John", "Smith"),
        ];
        let details = vec![
            StudentDetail {
                id: "STU001".into(),
                course: Some("BS Nursing".into()),
                status: Some(RecordStatus::Archived),
                ..Default::default()
            },
            StudentDetail {
                id: "STU999".into(),
                ..Default::default()
            },
        ];
        let merged = merge_students(&users, &details);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].course, "BS Nursing");
        assert_eq!(merged[0].year, "2024");
        assert_eq!(merged[0].status, RecordStatus::Archived);
    }

    #[test]
    fn strict_resolve_reports_entity() {
        let users = vec![user("STU001", Role::Student, "Emily", "Jones")];
        assert!(resolve("STU001", &users).is_ok());
        let err = resolve("STU002", &users).expect_err("missing");
        assert!(matches!(err, StoreError::ReferenceNotFound { entity: "user", .. }));
    }

    #[test]
    fn roster_snapshot_refreshes_from_live_users() {
        let users = vec![
            user("FAC001", Role::Faculty, "Jonathan", "Smith"),
            user("STU001", Role::Student, "Emily", "Jones-Park"),
        ];
        let snapshot = ClassEnrollment {
            id: "ENR001".into(),
            class_name: "CS101-A".into(),
            course: "Intro to CS".into(),
            department: "Computing".into(),
            instructor: EnrollmentMember {
                id: "FAC001".into(),
                name: "John Smith".into(),
                email: "old@academy.edu".into(),
                extra: Default::default(),
            },
            students: vec![
                EnrollmentMember {
                    id: "STU001".into(),
                    name: "Emily Jones".into(),
                    email: "old@academy.edu".into(),
                    extra: Default::default(),
                },
                EnrollmentMember {
                    id: "STU404".into(),
                    name: "Gone Student".into(),
                    email: "gone@academy.edu".into(),
                    extra: Default::default(),
                },
            ],
            schedule: "MWF 9:00".into(),
            location: "Room 1".into(),
            semester: "Fall 2024".into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
            extra: Default::default(),
        };
        let live = resolve_enrollment(&snapshot, &users);
        assert_eq!(live.instructor.name, "Jonathan Smith");
        assert_eq!(live.students[0].name, "Emily Jones-Park");
        assert_eq!(live.students[0].email, "emily@academy.edu");
        assert_eq!(live.students[1].name, "Gone Student");
        assert_eq!(live.class_name, "CS101-A");
    }

    #[test]
    fn instructor_name_prefers_live_user() {
        let users = vec![user("FAC001", Role::Faculty, "Jane", "Doe")];
        let mut lesson = Lesson {
            id: "LES001".into(),
            title: "Algebra".into(),
            description: String::new(),
            instructor_id: "FAC001".into(),
            instructor_name: "Old Name".into(),
            course: String::new(),
            department: String::new(),
            schedule: String::new(),
            duration: 60,
            location: String::new(),
            status: LessonStatus::Scheduled,
            materials: vec![],
            assignments: vec![],
            enrolled_students: vec![],
            extra: Default::default(),
        };
        assert_eq!(instructor_name(&lesson, &users), "Jane Doe");
        lesson.instructor_id = "FAC404".into();
        assert_eq!(instructor_name(&lesson, &users), "Old Name");
    }
}
