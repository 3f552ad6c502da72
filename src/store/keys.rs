/// Key of the single session object (not an array).
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Named collections held in the key-value store. Each key holds one JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Students,
    Faculty,
    Messages,
    CalendarEvents,
    Lessons,
    Notifications,
    Departments,
    Courses,
    ClassEnrollments,
    PasswordLogs,
    UserTimeSettings,
    UpdateHistory,
    AcademicYears,
}

impl Collection {
    pub const ALL: [Collection; 14] = [
        Collection::Users,
        Collection::Students,
        Collection::Faculty,
        Collection::Messages,
        Collection::CalendarEvents,
        Collection::Lessons,
        Collection::Notifications,
        Collection::Departments,
        Collection::Courses,
        Collection::ClassEnrollments,
        Collection::PasswordLogs,
        Collection::UserTimeSettings,
        Collection::UpdateHistory,
        Collection::AcademicYears,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Students => "students",
            Collection::Faculty => "faculty",
            Collection::Messages => "messages",
            Collection::CalendarEvents => "calendarEvents",
            Collection::Lessons => "lessons",
            Collection::Notifications => "notifications",
            Collection::Departments => "departments",
            Collection::Courses => "courses",
            Collection::ClassEnrollments => "classEnrollments",
            Collection::PasswordLogs => "passwordLogs",
            Collection::UserTimeSettings => "userTimeSettings",
            Collection::UpdateHistory => "updateHistory",
            Collection::AcademicYears => "academicYears",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_parse() {
        for c in Collection::ALL {
            assert_eq!(Collection::parse(c.key()), Some(c));
        }
        assert_eq!(Collection::parse(CURRENT_USER_KEY), None);
        assert_eq!(Collection::parse("xenjonUsers"), None);
    }
}
