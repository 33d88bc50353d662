use shared::domain::EnrollmentRole;
use thiserror::Error;

/// What the join dialog submits: raw subject and number plus the requested
/// role. Discarded as soon as the join resolves; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRequest {
    pub subject: String,
    pub number: String,
    pub role: EnrollmentRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("course number must not be empty")]
    EmptyNumber,
}

impl EnrollmentRequest {
    pub fn new(
        subject: impl Into<String>,
        number: impl Into<String>,
        role: EnrollmentRole,
    ) -> Self {
        Self {
            subject: subject.into(),
            number: number.into(),
            role,
        }
    }

    /// Checked by the presentation shell before the join button is enabled.
    /// The coordinator itself does not re-validate; a malformed code that
    /// slips through surfaces as a directory error instead.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        if self.number.trim().is_empty() {
            return Err(ValidationError::EmptyNumber);
        }
        Ok(())
    }

    pub fn normalized_code(&self) -> String {
        normalize_course_code(&self.subject, &self.number)
    }
}

/// Builds the canonical "SUBJECT NUMBER" code. Deterministic and
/// idempotent: feeding the output's components back in yields the same
/// code.
pub fn normalize_course_code(subject: &str, number: &str) -> String {
    format!("{} {}", subject.trim().to_uppercase(), number.trim())
}
