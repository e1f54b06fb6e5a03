//! SQLite-backed [`Storage`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::{Storage, StorageError};
use crate::student::Student;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    email TEXT,
    age INTEGER
)";

/// One connection, opened at startup and shared by every request.
///
/// The mutex serializes access to the connection; conflicting writes are
/// resolved by SQLite itself (last write wins).
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path` and ensures the
    /// `students` table exists. Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "sqlite store opened");
        Ok(store)
    }

    /// A private, throwaway database. Each call gets its own.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self { conn: Mutex::new(Some(conn)) })
    }

    /// Closes the connection. Later calls fail with [`StorageError::Closed`].
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<(), StorageError> {
        let Some(conn) = self.lock()?.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
        info!("sqlite store closed");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("connection mutex poisoned".to_owned()))
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;
        f(conn)
    }
}

fn row_to_student(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        age: row.get(3)?,
    })
}

impl Storage for SqliteStore {
    fn create_student(&self, name: &str, email: &str, age: i64) -> Result<i64, StorageError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare_cached("INSERT INTO students (name, email, age) VALUES (?1, ?2, ?3)")?;
            let id = stmt.insert(params![name, email, age])?;
            debug!(id, "student inserted");
            Ok(id)
        })
    }

    fn get_student_by_id(&self, id: i64) -> Result<Student, StorageError> {
        self.with_conn(|conn| {
            conn.prepare_cached("SELECT id, name, email, age FROM students WHERE id = ?1")?
                .query_row(params![id], row_to_student)
                .optional()?
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn get_students(&self) -> Result<Vec<Student>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT id, name, email, age FROM students ORDER BY id")?;
            let rows = stmt.query_map([], row_to_student)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    fn update_student(&self, student: &Student) -> Result<Student, StorageError> {
        self.with_conn(|conn| {
            let changed = conn
                .prepare_cached("UPDATE students SET name = ?1, email = ?2, age = ?3 WHERE id = ?4")?
                .execute(params![student.name, student.email, student.age, student.id])?;
            if changed == 0 {
                return Err(StorageError::NotFound(student.id));
            }
            Ok(student.clone())
        })
    }

    fn delete_student(&self, id: i64) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            let changed = conn
                .prepare_cached("DELETE FROM students WHERE id = ?1")?
                .execute(params![id])?;
            if changed == 0 {
                return Err(StorageError::NotFound(id));
            }
            Ok(())
        })
    }

    fn ping(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
    }
}
