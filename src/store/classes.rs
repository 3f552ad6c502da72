//! Class rosters. Stored as snapshots, served with live member names.

use super::accounts::require_role;
use super::backend::KeyValueBackend;
use super::contains_ci;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{ClassEnrollment, EnrollmentMember, Role, User};
use super::now_ts;
use super::repository::{EnrollmentRepository, UserRepository};
use super::resolve::{resolve, resolve_enrollment};
use log::info;
use serde::{Deserialize, Serialize};

fn visible_to(enrollment: &ClassEnrollment, who: &User) -> bool {
    match who.role {
        Role::Admin => true,
        Role::Faculty => enrollment.instructor.id == who.id,
        Role::Student => enrollment.students.iter().any(|s| s.id == who.id),
    }
}

fn matches_search(enrollment: &ClassEnrollment, search: Option<&str>) -> bool {
    match search {
        Some(q) if !q.is_empty() => {
            contains_ci(&enrollment.class_name, q)
                || contains_ci(&enrollment.course, q)
                || contains_ci(&enrollment.instructor.name, q)
        }
        _ => true,
    }
}

/// Classes the actor teaches (faculty) or attends (student); admins see all.
pub fn list(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    search: Option<&str>,
) -> StoreResult<Vec<ClassEnrollment>> {
    let users = UserRepository::new(backend).all()?;
    let who = resolve(actor_id, &users)?;
    Ok(EnrollmentRepository::new(backend)
        .all()?
        .iter()
        .filter(|e| visible_to(e, who))
        .map(|e| resolve_enrollment(e, &users))
        .filter(|e| matches_search(e, search))
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStats {
    pub total_classes: usize,
    pub total_students: usize,
    pub avg_students_per_class: u64,
}

pub fn stats(classes: &[ClassEnrollment]) -> ClassStats {
    let total_classes = classes.len();
    let total_students: usize = classes.iter().map(|c| c.students.len()).sum();
    let avg_students_per_class = if total_classes == 0 {
        0
    } else {
        (total_students as f64 / total_classes as f64).round() as u64
    };
    ClassStats {
        total_classes,
        total_students,
        avg_students_per_class,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDraft {
    pub class_name: String,
    pub course: String,
    #[serde(default)]
    pub department: String,
    pub instructor_id: String,
    #[serde(default)]
    pub student_ids: Vec<String>,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub semester: String,
}

fn member(user: &User) -> EnrollmentMember {
    EnrollmentMember {
        id: user.id.clone(),
        name: user.full_name(),
        email: user.email.clone(),
        extra: Default::default(),
    }
}

/// Admin-only: snapshots the instructor and students into a new roster.
pub fn create(backend: &dyn KeyValueBackend, actor_id: &str, draft: &ClassDraft) -> StoreResult<ClassEnrollment> {
    let users = UserRepository::new(backend).all()?;
    let admin = resolve(actor_id, &users)?;
    require_role(admin, &[Role::Admin], "create classes")?;
    if draft.class_name.trim().is_empty() || draft.course.trim().is_empty() {
        return Err(StoreError::validation("className and course are required"));
    }
    let instructor = resolve(&draft.instructor_id, &users)?;
    if instructor.role != Role::Faculty {
        return Err(StoreError::validation(format!("{} is not faculty", instructor.id)));
    }
    let mut students: Vec<EnrollmentMember> = Vec::new();
    for id in &draft.student_ids {
        if students.iter().any(|s| &s.id == id) {
            continue;
        }
        let s = resolve(id, &users)?;
        if s.role != Role::Student {
            return Err(StoreError::validation(format!("{} is not a student", s.id)));
        }
        students.push(member(s));
    }

    let repo = EnrollmentRepository::new(backend);
    let mut all = repo.all()?;
    let enrollment = ClassEnrollment {
        id: ids::next_id("ENR", all.iter().map(|e| e.id.as_str())),
        class_name: draft.class_name.clone(),
        course: draft.course.clone(),
        department: draft.department.clone(),
        instructor: member(instructor),
        students,
        schedule: draft.schedule.clone(),
        location: draft.location.clone(),
        semester: draft.semester.clone(),
        created_at: now_ts(),
        extra: Default::default(),
    };
    all.push(enrollment.clone());
    repo.save_all(&all)?;
    info!("{} created class {}", admin.id, enrollment.id);
    Ok(enrollment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::tests::seed_user;
    use crate::store::backend::MemoryBackend;

    fn draft(name: &str, instructor: &str, students: &[&str]) -> ClassDraft {
        ClassDraft {
            class_name: name.into(),
            course: "Intro to CS".into(),
            department: "Computing".into(),
            instructor_id: instructor.into(),
            student_ids: students.iter().map(|s| s.to_string()).collect(),
            schedule: "MWF 9:00".into(),
            location: "Room 1".into(),
            semester: "Fall 2024".into(),
        }
    }

    fn school(backend: &MemoryBackend) {
        seed_user(backend, "ADM001", Role::Admin, "Ada", "Admin");
        seed_user(backend, "FAC001", Role::Faculty, "John", "Smith");
        seed_user(backend, "FAC002", Role::Faculty, "Mary", "Major");
        seed_user(backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(backend, "STU002", Role::Student, "John", "Doe");
    }

    #[test]
    fn create_snapshots_members() {
        let backend = MemoryBackend::new();
        school(&backend);
        let class = create(&backend, "ADM001", &draft("CS101-A", "FAC001", &["STU001", "STU002", "STU001"]))
            .expect("create");
        assert_eq!(class.id, "ENR001");
        assert_eq!(class.instructor.name, "John Smith");
        assert_eq!(class.students.len(), 2);

        let bad = create(&backend, "ADM001", &draft("X", "STU001", &[]));
        assert!(matches!(bad, Err(StoreError::Validation(_))));
        let denied = create(&backend, "FAC001", &draft("X", "FAC001", &[]));
        assert!(matches!(denied, Err(StoreError::Forbidden(_))));
    }

    #[test]
    fn visibility_by_role_and_search() {
        let backend = MemoryBackend::new();
        school(&backend);
        create(&backend, "ADM001", &draft("CS101-A", "FAC001", &["STU001", "STU002"])).expect("a");
        create(&backend, "ADM001", &draft("MATH200", "FAC002", &["STU002"])).expect("b");

        let names = |who: &str, q: Option<&str>| -> Vec<String> {
            list(&backend, who, q).expect("list").into_iter().map(|c| c.class_name).collect()
        };
        assert_eq!(names("FAC001", None), vec!["CS101-A"]);
        assert_eq!(names("STU001", None), vec!["CS101-A"]);
        assert_eq!(names("STU002", None).len(), 2);
        assert_eq!(names("ADM001", None).len(), 2);
        assert_eq!(names("STU002", Some("mary")), vec!["MATH200"]);
    }

    #[test]
    fn renamed_user_shows_up_in_roster() {
        let backend = MemoryBackend::new();
        school(&backend);
        create(&backend, "ADM001", &draft("CS101-A", "FAC001", &["STU001"])).expect("create");
        UserRepository::new(&backend)
            .update("STU001", |u| {
                u.last_name = "Jones-Park".into();
                Ok(())
            })
            .expect("rename");
        let classes = list(&backend, "FAC001", None).expect("list");
        assert_eq!(classes[0].students[0].name, "Emily Jones-Park");
    }

    #[test]
    fn stats_round_the_average() {
        let backend = MemoryBackend::new();
        school(&backend);
        create(&backend, "ADM001", &draft("A", "FAC001", &["STU001", "STU002"])).expect("a");
        create(&backend, "ADM001", &draft("B", "FAC001", &["STU001"])).expect("b");
        let classes = list(&backend, "FAC001", None).expect("list");
        let s = stats(&classes);
        assert_eq!(s.total_classes, 2);
        assert_eq!(s.total_students, 3);
        assert_eq!(s.avg_students_per_class, 2);
        assert_eq!(stats(&[]).avg_students_per_class, 0);
    }
}
