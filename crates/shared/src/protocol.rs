use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Course, CourseId, EnrollmentRole, SessionId, UserId},
    error::ApiError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinCourseRequest {
    pub user_id: UserId,
    /// Normalized "SUBJECT NUMBER" course code.
    pub code: String,
    pub role: EnrollmentRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCourseResponse {
    pub course_id: CourseId,
    pub already_joined: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpProfile {
    pub name: String,
    pub handle: String,
    /// Major catalog slug, e.g. "computer-science".
    pub major: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpHttpRequest {
    pub email: String,
    pub password: String,
    pub profile: SignUpProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: UserId,
    pub access_token: String,
}

/// Body posted to the realtime broadcast endpoint when a session changes
/// its enrollment set. Delivery is at-least-once; receivers treat
/// duplicates as redundant refresh triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterChangeBroadcast {
    pub user_id: UserId,
    pub origin_session: SessionId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A session of `user_id` changed that user's enrollment set.
    CourseRosterChanged {
        user_id: UserId,
        origin_session: SessionId,
    },
    CourseUpdated {
        course: Course,
    },
    Error(ApiError),
}
