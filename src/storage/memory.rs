//! In-memory [`Storage`] for tests and local experiments.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{Storage, StorageError};
use crate::student::Student;

/// Mirrors the SQLite store's observable behavior: ids start at 1, grow
/// monotonically and are never reused.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, Student>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store mutex poisoned".to_owned()))
    }
}

impl Storage for MemoryStore {
    fn create_student(&self, name: &str, email: &str, age: i64) -> Result<i64, StorageError> {
        let mut inner = self.lock()?;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.rows.insert(id, Student { id, name: name.to_owned(), email: email.to_owned(), age });
        Ok(id)
    }

    fn get_student_by_id(&self, id: i64) -> Result<Student, StorageError> {
        self.lock()?.rows.get(&id).cloned().ok_or(StorageError::NotFound(id))
    }

    fn get_students(&self) -> Result<Vec<Student>, StorageError> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    fn update_student(&self, student: &Student) -> Result<Student, StorageError> {
        let mut inner = self.lock()?;
        let row = inner.rows.get_mut(&student.id).ok_or(StorageError::NotFound(student.id))?;
        *row = student.clone();
        Ok(student.clone())
    }

    fn delete_student(&self, id: i64) -> Result<(), StorageError> {
        self.lock()?.rows.remove(&id).map(drop).ok_or(StorageError::NotFound(id))
    }

    fn ping(&self) -> Result<(), StorageError> {
        self.lock().map(drop)
    }
}
