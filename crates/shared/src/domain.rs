use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(CourseId);

/// Identifies one authenticated browser/app session of a user. A user with
/// two open tabs holds two distinct session ids; roster-change broadcasts
/// carry the originating session so receivers can tell self-echo apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// The current user's relationship to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    None,
    Student,
    Instructor,
}

/// Role requested when joining a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentRole {
    Student,
    InstructorOrTutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: CourseId,
    /// Uppercase subject code, e.g. "COMP".
    pub subject: String,
    /// Course number as a string; may contain letters ("426H").
    pub number: String,
    pub title: String,
    pub membership: Membership,
}

impl Course {
    /// Normalized "SUBJECT NUMBER" code, unique within the directory.
    pub fn code(&self) -> String {
        format!("{} {}", self.subject, self.number)
    }
}
