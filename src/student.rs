//! The student record and the request payloads that produce it.

use serde::{Deserialize, Serialize};

/// A persisted student.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i64,
}

/// Body of `POST /api/students`.
///
/// Missing fields decode to their zero value so validation can report all of
/// them at once. Unknown fields, including a client-supplied `id`, are ignored.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub age: i64,
}

/// Body of `PUT /api/students/{id}`.
///
/// Strict: unknown fields are rejected. `id` may restate the path id; `0`
/// means absent.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StudentUpdate {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl StudentUpdate {
    /// The full record to store under `id`.
    pub fn into_student(self, id: i64) -> Student {
        Student { id, name: self.name, email: self.email, age: self.age }
    }
}

/// Field access shared by the payloads, so one validator covers both.
pub trait StudentFields {
    fn name(&self) -> &str;
    fn email(&self) -> &str;
    fn age(&self) -> i64;
}

impl StudentFields for NewStudent {
    fn name(&self) -> &str { &self.name }
    fn email(&self) -> &str { &self.email }
    fn age(&self) -> i64 { self.age }
}

impl StudentFields for Student {
    fn name(&self) -> &str { &self.name }
    fn email(&self) -> &str { &self.email }
    fn age(&self) -> i64 { self.age }
}
