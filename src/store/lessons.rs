//! Lessons with their assignments and submissions.
//!
//! Submission lifecycle: a student submits once per assignment; the lesson's
//! instructor may then grade it, and re-grading overwrites the grade.

use super::accounts::{actor, require_role};
use super::backend::KeyValueBackend;
use super::error::{StoreError, StoreResult};
use super::ids;
use super::models::{Assignment, Lesson, LessonStatus, Role, Submission, User};
use super::now_ts;
use super::policy::{DEFAULT_ASSIGNMENT_POINTS, DEFAULT_LESSON_DURATION};
use super::repository::{LessonRepository, UserRepository};
use super::resolve::instructor_name;
use log::info;
use serde::Deserialize;

/// Splits a one-per-line materials field, dropping blank lines.
pub fn split_materials(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn with_live_instructor(mut lesson: Lesson, users: &[User]) -> Lesson {
    lesson.instructor_name = instructor_name(&lesson, users);
    lesson
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonScope {
    /// Faculty: own lessons. Students: enrolled lessons. Admin: everything.
    #[default]
    Mine,
    /// Lessons still open for enrollment that the actor is not in.
    Available,
}

pub fn list(backend: &dyn KeyValueBackend, actor_id: &str, scope: LessonScope) -> StoreResult<Vec<Lesson>> {
    let users = UserRepository::new(backend).all()?;
    let who = super::resolve::resolve(actor_id, &users)?;
    let lessons = LessonRepository::new(backend).all()?;
    let visible = lessons.into_iter().filter(|l| match (scope, who.role) {
        (LessonScope::Mine, Role::Admin) => true,
        (LessonScope::Mine, Role::Faculty) => l.instructor_id == who.id,
        (LessonScope::Mine, Role::Student) => l.enrolled_students.contains(&who.id),
        (LessonScope::Available, _) => {
            matches!(l.status, LessonStatus::Scheduled | LessonStatus::InProgress)
                && !l.enrolled_students.contains(&who.id)
        }
    });
    Ok(visible.map(|l| with_live_instructor(l, &users)).collect())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub location: String,
    /// One material per line.
    #[serde(default)]
    pub materials: String,
}

pub fn create(backend: &dyn KeyValueBackend, actor_id: &str, draft: &LessonDraft) -> StoreResult<Lesson> {
    let instructor = actor(backend, actor_id)?;
    require_role(&instructor, &[Role::Faculty], "create lessons")?;
    if draft.title.trim().is_empty() {
        return Err(StoreError::validation("title is required"));
    }
    let duration = draft.duration.unwrap_or(DEFAULT_LESSON_DURATION);
    if duration == 0 {
        return Err(StoreError::validation("duration must be positive"));
    }
    let repo = LessonRepository::new(backend);
    let mut all = repo.all()?;
    let lesson = Lesson {
        id: ids::next_id("LES", all.iter().map(|l| l.id.as_str())),
        title: draft.title.clone(),
        description: draft.description.clone(),
        instructor_id: instructor.id.clone(),
        instructor_name: instructor.full_name(),
        course: draft.course.clone(),
        department: draft.department.clone(),
        schedule: draft.schedule.clone(),
        duration,
        location: draft.location.clone(),
        status: LessonStatus::Scheduled,
        materials: split_materials(&draft.materials),
        assignments: Vec::new(),
        enrolled_students: Vec::new(),
        extra: Default::default(),
    };
    all.push(lesson.clone());
    repo.save_all(&all)?;
    info!("{} created lesson {}", instructor.id, lesson.id);
    Ok(lesson)
}

fn require_instructor(who: &User, lesson: &Lesson) -> StoreResult<()> {
    if who.role == Role::Admin || lesson.instructor_id == who.id {
        return Ok(());
    }
    Err(StoreError::forbidden(format!(
        "{} is not the instructor of {}",
        who.id, lesson.id
    )))
}

pub fn set_status(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    lesson_id: &str,
    status: LessonStatus,
) -> StoreResult<Lesson> {
    let who = actor(backend, actor_id)?;
    LessonRepository::new(backend).update(lesson_id, |l| {
        require_instructor(&who, l)?;
        l.status = status;
        Ok(())
    })
}

/// Adds the acting student to the lesson roster.
pub fn enroll(backend: &dyn KeyValueBackend, actor_id: &str, lesson_id: &str) -> StoreResult<Lesson> {
    let student = actor(backend, actor_id)?;
    require_role(&student, &[Role::Student], "enroll in lessons")?;
    LessonRepository::new(backend).update(lesson_id, |l| {
        if l.enrolled_students.contains(&student.id) {
            return Err(StoreError::Conflict(format!(
                "{} is already enrolled in {}",
                student.id, l.id
            )));
        }
        if matches!(l.status, LessonStatus::Cancelled | LessonStatus::Completed) {
            return Err(StoreError::validation(format!("lesson {} is closed", l.id)));
        }
        l.enrolled_students.push(student.id.clone());
        Ok(())
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: String,
    #[serde(default)]
    pub points: Option<u32>,
}

fn all_assignment_ids(lessons: &[Lesson]) -> impl Iterator<Item = &str> {
    lessons
        .iter()
        .flat_map(|l| l.assignments.iter())
        .map(|a| a.id.as_str())
}

fn all_submission_ids(lessons: &[Lesson]) -> impl Iterator<Item = &str> {
    lessons
        .iter()
        .flat_map(|l| l.assignments.iter())
        .flat_map(|a| a.submissions.iter())
        .map(|s| s.id.as_str())
}

fn find_lesson<'a>(lessons: &'a mut [Lesson], lesson_id: &str) -> StoreResult<&'a mut Lesson> {
    lessons
        .iter_mut()
        .find(|l| l.id == lesson_id)
        .ok_or_else(|| StoreError::not_found("lesson", lesson_id))
}

fn find_assignment<'a>(lesson: &'a mut Lesson, assignment_id: &str) -> StoreResult<&'a mut Assignment> {
    lesson
        .assignments
        .iter_mut()
        .find(|a| a.id == assignment_id)
        .ok_or_else(|| StoreError::not_found("assignment", assignment_id))
}

pub fn create_assignment(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    lesson_id: &str,
    draft: &AssignmentDraft,
) -> StoreResult<Assignment> {
    let who = actor(backend, actor_id)?;
    require_role(&who, &[Role::Faculty], "create assignments")?;
    if draft.title.trim().is_empty() || draft.due_date.trim().is_empty() {
        return Err(StoreError::validation("title and dueDate are required"));
    }
    let repo = LessonRepository::new(backend);
    let mut lessons = repo.all()?;
    let id = ids::next_id("ASG", all_assignment_ids(&lessons));
    let lesson = find_lesson(&mut lessons, lesson_id)?;
    require_instructor(&who, lesson)?;
    let assignment = Assignment {
        id,
        title: draft.title.clone(),
        description: draft.description.clone(),
        due_date: draft.due_date.clone(),
        points: draft.points.unwrap_or(DEFAULT_ASSIGNMENT_POINTS),
        submissions: Vec::new(),
        extra: Default::default(),
    };
    lesson.assignments.push(assignment.clone());
    repo.save_all(&lessons)?;
    info!("{} added {} to {}", who.id, assignment.id, lesson_id);
    Ok(assignment)
}

/// One-shot submission by an enrolled student.
pub fn submit(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    lesson_id: &str,
    assignment_id: &str,
    content: &str,
) -> StoreResult<Submission> {
    let student = actor(backend, actor_id)?;
    require_role(&student, &[Role::Student], "submit assignments")?;
    if content.trim().is_empty() {
        return Err(StoreError::validation("submission content is required"));
    }
    let repo = LessonRepository::new(backend);
    let mut lessons = repo.all()?;
    let id = ids::next_id("SUB", all_submission_ids(&lessons));
    let lesson = find_lesson(&mut lessons, lesson_id)?;
    if !lesson.enrolled_students.contains(&student.id) {
        return Err(StoreError::forbidden(format!(
            "{} is not enrolled in {}",
            student.id, lesson_id
        )));
    }
    let assignment = find_assignment(lesson, assignment_id)?;
    if assignment.submissions.iter().any(|s| s.student_id == student.id) {
        return Err(StoreError::DuplicateSubmission {
            assignment_id: assignment_id.to_string(),
            student_id: student.id.clone(),
        });
    }
    let submission = Submission {
        id,
        student_id: student.id.clone(),
        student_name: student.full_name(),
        content: content.to_string(),
        submitted_at: now_ts(),
        grade: None,
        feedback: None,
        extra: Default::default(),
    };
    assignment.submissions.push(submission.clone());
    repo.save_all(&lessons)?;
    info!("{} submitted {}", student.id, assignment_id);
    Ok(submission)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub grade: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

pub fn grade_submission(
    backend: &dyn KeyValueBackend,
    actor_id: &str,
    lesson_id: &str,
    assignment_id: &str,
    submission_id: &str,
    grade: &Grade,
) -> StoreResult<Submission> {
    let who = actor(backend, actor_id)?;
    require_role(&who, &[Role::Faculty], "grade submissions")?;
    let repo = LessonRepository::new(backend);
    let mut lessons = repo.all()?;
    let lesson = find_lesson(&mut lessons, lesson_id)?;
    require_instructor(&who, lesson)?;
    let assignment = find_assignment(lesson, assignment_id)?;
    let points = f64::from(assignment.points);
    if !grade.grade.is_finite() || grade.grade < 0.0 || grade.grade > points {
        return Err(StoreError::validation(format!(
            "grade must be between 0 and {}",
            assignment.points
        )));
    }
    let submission = assignment
        .submissions
        .iter_mut()
        .find(|s| s.id == submission_id)
        .ok_or_else(|| StoreError::not_found("submission", submission_id))?;
    submission.grade = Some(grade.grade);
    submission.feedback = grade.feedback.clone();
    let graded = submission.clone();
    repo.save_all(&lessons)?;
    info!("{} graded {}", who.id, submission_id);
    Ok(graded)
}

/// Ungraded submissions across the lessons an instructor teaches.
pub fn pending_submissions(lessons: &[Lesson], instructor_id: &str) -> usize {
    lessons
        .iter()
        .filter(|l| l.instructor_id == instructor_id)
        .flat_map(|l| l.assignments.iter())
        .flat_map(|a| a.submissions.iter())
        .filter(|s| !s.is_graded())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::tests::seed_user;
    use crate::store::backend::MemoryBackend;

    fn lesson_draft(title: &str) -> LessonDraft {
        LessonDraft {
            title: title.into(),
            description: String::new(),
            course: "BSCS".into(),
            department: "Computing".into(),
            schedule: "MWF 9:00".into(),
            duration: None,
            location: "Room 101".into(),
            materials: "Slides\n\n  \nReading list\n".into(),
        }
    }

    fn assignment_draft() -> AssignmentDraft {
        AssignmentDraft {
            title: "Essay".into(),
            description: String::new(),
            due_date: "2024-03-01".into(),
            points: None,
        }
    }

    fn classroom(backend: &MemoryBackend) -> (Lesson, Assignment) {
        seed_user(backend, "FAC001", Role::Faculty, "John", "Smith");
        seed_user(backend, "FAC002", Role::Faculty, "Mary", "Major");
        seed_user(backend, "STU001", Role::Student, "Emily", "Jones");
        seed_user(backend, "STU002", Role::Student, "John", "Doe");
        let lesson = create(backend, "FAC001", &lesson_draft("Algorithms")).expect("lesson");
        let asg = create_assignment(backend, "FAC001", &lesson.id, &assignment_draft()).expect("asg");
        enroll(backend, "STU001", &lesson.id).expect("enroll");
        (lesson, asg)
    }

    #[test]
    fn faculty_only_creation_with_defaults() {
        let backend = MemoryBackend::new();
        let (lesson, asg) = classroom(&backend);
        assert_eq!(lesson.id, "LES001");
        assert_eq!(lesson.status, LessonStatus::Scheduled);
        assert_eq!(lesson.duration, 60);
        assert_eq!(lesson.materials, vec!["Slides", "Reading list"]);
        assert_eq!(asg.id, "ASG001");
        assert_eq!(asg.points, 100);

        let denied = create(&backend, "STU001", &lesson_draft("Nope"));
        assert!(matches!(denied, Err(StoreError::Forbidden(_))));
        let other = create_assignment(&backend, "FAC002", &lesson.id, &assignment_draft());
        assert!(matches!(other, Err(StoreError::Forbidden(_))));
    }

    #[test]
    fn second_submission_is_rejected() {
        let backend = MemoryBackend::new();
        let (lesson, asg) = classroom(&backend);
        let first = submit(&backend, "STU001", &lesson.id, &asg.id, "My essay").expect("submit");
        assert_eq!(first.id, "SUB001");

        let again = submit(&backend, "STU001", &lesson.id, &asg.id, "Second try");
        assert!(matches!(again, Err(StoreError::DuplicateSubmission { .. })));
        let stored = LessonRepository::new(&backend).get(&lesson.id).expect("lesson");
        assert_eq!(stored.assignments[0].submissions.len(), 1);
        assert_eq!(stored.assignments[0].submissions[0].content, "My essay");
    }

    #[test]
    fn submission_requires_enrolled_student() {
        let backend = MemoryBackend::new();
        let (lesson, asg) = classroom(&backend);
        let outsider = submit(&backend, "STU002", &lesson.id, &asg.id, "hi");
        assert!(matches!(outsider, Err(StoreError::Forbidden(_))));
        let teacher = submit(&backend, "FAC001", &lesson.id, &asg.id, "hi");
        assert!(matches!(teacher, Err(StoreError::Forbidden(_))));
        let missing = submit(&backend, "STU001", &lesson.id, "ASG404", "hi");
        assert!(matches!(missing, Err(StoreError::ReferenceNotFound { .. })));
    }

    #[test]
    fn grading_bounds_and_regrade() {
        let backend = MemoryBackend::new();
        let (lesson, asg) = classroom(&backend);
        let sub = submit(&backend, "STU001", &lesson.id, &asg.id, "My essay").expect("submit");
        let lessons = LessonRepository::new(&backend).all().expect("all");
        assert_eq!(pending_submissions(&lessons, "FAC001"), 1);

        let too_high = Grade {
            grade: 101.0,
            feedback: None,
        };
        assert!(matches!(
            grade_submission(&backend, "FAC001", &lesson.id, &asg.id, &sub.id, &too_high),
            Err(StoreError::Validation(_))
        ));
        let graded = grade_submission(
            &backend,
            "FAC001",
            &lesson.id,
            &asg.id,
            &sub.id,
            &Grade {
                grade: 88.0,
                feedback: Some("Good".into()),
            },
        )
        .expect("grade");
        assert_eq!(graded.grade, Some(88.0));
        let regraded = grade_submission(
            &backend,
            "FAC001",
            &lesson.id,
            &asg.id,
            &sub.id,
            &Grade {
                grade: 92.5,
                feedback: None,
            },
        )
        .expect("regrade");
        assert_eq!(regraded.grade, Some(92.5));
        assert_eq!(regraded.feedback, None);

        let lessons = LessonRepository::new(&backend).all().expect("all");
        assert_eq!(pending_submissions(&lessons, "FAC001"), 0);
    }

    #[test]
    fn listing_by_role_and_duplicate_enrollment() {
        let backend = MemoryBackend::new();
        let (lesson, _) = classroom(&backend);
        create(&backend, "FAC002", &lesson_draft("Databases")).expect("lesson");

        let titles = |who: &str, scope: LessonScope| -> Vec<String> {
            list(&backend, who, scope).expect("list").into_iter().map(|l| l.title).collect()
        };
        assert_eq!(titles("FAC001", LessonScope::Mine), vec!["Algorithms"]);
        assert_eq!(titles("STU001", LessonScope::Mine), vec!["Algorithms"]);
        assert_eq!(titles("STU001", LessonScope::Available), vec!["Databases"]);
        assert!(titles("STU002", LessonScope::Mine).is_empty());

        let again = enroll(&backend, "STU001", &lesson.id);
        assert!(matches!(again, Err(StoreError::Conflict(_))));

        set_status(&backend, "FAC001", &lesson.id, LessonStatus::Cancelled).expect("cancel");
        let closed = enroll(&backend, "STU002", &lesson.id);
        assert!(matches!(closed, Err(StoreError::Validation(_))));
    }
}
