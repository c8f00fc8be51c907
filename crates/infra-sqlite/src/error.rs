// sqlx::Error -> DatastoreError

use tabula_core::port::{DatastoreCode, DatastoreError};

/// Classify a driver error by SQLite result code.
///
/// Only the code is attached here; the repository adds the offending
/// value or relation once it knows what was being written.
pub fn map_sqlx_error(err: sqlx::Error) -> DatastoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            // SQLite error codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                // SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
                Some("2067") | Some("1555") => {
                    DatastoreError::coded(DatastoreCode::UniqueViolation, None, message)
                }
                // SQLITE_CONSTRAINT_FOREIGNKEY
                Some("787") => {
                    DatastoreError::coded(DatastoreCode::ForeignKeyViolation, None, message)
                }
                _ => DatastoreError::raw(message),
            }
        }
        sqlx::Error::ColumnNotFound(column) => DatastoreError::raw(format!("no such column: {column}")),
        _ => DatastoreError::raw(err.to_string()),
    }
}
