//! Store-wide defaults and limits.

use super::models::Role;

pub const ID_PAD_WIDTH: usize = 3;
pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Notifications shown per user on the dashboard.
pub const RECENT_NOTIFICATIONS: usize = 5;
/// Update-history entries returned per user.
pub const HISTORY_LIMIT: usize = 10;

pub const ACTION_PASSWORD_RESET: &str = "Password Reset to Default";
pub const ACTION_PASSWORD_RESET_SELECTED: &str = "Password Reset to Default (Selected)";
pub const ACTION_PASSWORD_CHANGED: &str = "Password Changed";
pub const ACTION_TIME_SETTINGS_UPDATED: &str = "Time Settings Updated";
pub const CHANGED_BY_SELF: &str = "self";

pub fn default_password(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin123!",
        Role::Faculty => "Faculty123!",
        Role::Student => "Student123!",
    }
}

pub const PLACEHOLDER_PHONE: &str = "+1 (555) 123-4567";

pub const STUDENT_DEFAULT_COURSE: &str = "Bachelor of Science in Computer Science (BSCS)";
pub const STUDENT_DEFAULT_DEPARTMENT: &str = "Information Technology / Computer Studies";
pub const STUDENT_DEFAULT_YEAR: &str = "2024";
pub const STUDENT_DEFAULT_ENROLLMENT_DATE: &str = "2024-01-01";

pub const FACULTY_DEFAULT_DEPARTMENT: &str = "Engineering";
pub const FACULTY_DEFAULT_POSITION: &str = "Assistant Professor";
pub const FACULTY_DEFAULT_HIRE_DATE: &str = "2024-01-01";

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_BREAK: (&str, &str) = ("12:00", "13:00");

pub const TIMEZONES: [&str; 12] = [
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Manila",
    "Asia/Kolkata",
    "Australia/Sydney",
];

pub const DAYS_OF_WEEK: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Students keep school hours, everyone else office hours.
pub fn default_working_hours(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::Student => ("08:00", "18:00"),
        Role::Admin | Role::Faculty => ("09:00", "17:00"),
    }
}

pub const DEFAULT_LESSON_DURATION: u32 = 60;
pub const DEFAULT_ASSIGNMENT_POINTS: u32 = 100;
pub const DEFAULT_COURSE_CREDITS: u32 = 3;
pub const DEFAULT_DEPARTMENT_ESTABLISHED: &str = "2020-01-01";
/// Academic year ids count up from the year after this one.
pub const ACADEMIC_YEAR_BASE: u32 = 2023;
