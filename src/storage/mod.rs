//! Persistence port.
//!
//! Handlers only see [`Storage`]. Production wires in [`SqliteStore`]; tests
//! use [`MemoryStore`]. Methods are synchronous: the handlers move each call
//! onto tokio's blocking pool.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::student::Student;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no student with id {0}")]
    NotFound(i64),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store is closed")]
    Closed,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The storage contract consumed by the HTTP handlers.
///
/// Every write is a single statement: it either fully applies or leaves the
/// store untouched.
pub trait Storage: Send + Sync {
    /// Inserts a new record and returns the id the store assigned.
    fn create_student(&self, name: &str, email: &str, age: i64) -> Result<i64, StorageError>;

    fn get_student_by_id(&self, id: i64) -> Result<Student, StorageError>;

    /// All records in ascending id order. An empty store is `Ok(vec![])`.
    fn get_students(&self) -> Result<Vec<Student>, StorageError>;

    /// Overwrites every field of the record with `student.id`.
    fn update_student(&self, student: &Student) -> Result<Student, StorageError>;

    fn delete_student(&self, id: i64) -> Result<(), StorageError>;

    /// Cheap round trip used by the readiness check.
    fn ping(&self) -> Result<(), StorageError>;
}
