//! Field validation for student payloads.
//!
//! A single [`Validator`] is built at startup and shared by every handler
//! through [`AppState`](crate::api::AppState); the email pattern is compiled
//! exactly once.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::student::StudentFields;

/// WHATWG "valid email address" production.
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"));

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Violation {
    Required,
    InvalidEmail,
    NotPositive,
}

/// One field that failed validation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub violation: Violation,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violation {
            Violation::Required     => write!(f, "field {} is a required field", self.field),
            Violation::InvalidEmail => write!(f, "field {} is not a valid email address", self.field),
            Violation::NotPositive  => write!(f, "field {} must be a positive integer", self.field),
        }
    }
}

/// Every failing field of a payload, in declaration order.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{}", join(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

#[derive(Clone, Debug)]
pub struct Validator {
    email: &'static Regex,
}

impl Validator {
    pub fn new() -> Self {
        Self { email: &EMAIL }
    }

    pub fn is_email(&self, s: &str) -> bool {
        self.email.is_match(s)
    }

    /// Checks name, email and age, collecting every violation.
    pub fn validate(&self, student: &impl StudentFields) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if student.name().trim().is_empty() {
            errors.push(FieldError { field: "name", violation: Violation::Required });
        }

        let email = student.email();
        if email.is_empty() {
            errors.push(FieldError { field: "email", violation: Violation::Required });
        } else if !self.is_email(email) {
            errors.push(FieldError { field: "email", violation: Violation::InvalidEmail });
        }

        match student.age() {
            0          => errors.push(FieldError { field: "age", violation: Violation::Required }),
            a if a < 0 => errors.push(FieldError { field: "age", violation: Violation::NotPositive }),
            _          => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(ValidationErrors(errors)) }
    }
}

impl Default for Validator {
    fn default() -> Self { Self::new() }
}
