//! Classifications are free labels such as "Fixed" or "Variable" that cut
//! across categories.

use rusqlite::{Connection, Row};
use serde::Deserialize;

use crate::{
    Error,
    control::ControlId,
    database_id::{DatabaseId, RowsAffected},
    is_unique_violation,
};

pub type ClassificationId = DatabaseId;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub id: ClassificationId,
    pub control_id: ControlId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClassification {
    pub name: String,
}

pub fn create_classification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS classification (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE (control_id, name)
        )",
        (),
    )?;

    Ok(())
}

fn map_classification_row(row: &Row) -> Result<Classification, rusqlite::Error> {
    Ok(Classification {
        id: row.get(0)?,
        control_id: row.get(1)?,
        name: row.get(2)?,
    })
}

/// Create a classification in the control `control_id`.
///
/// # Errors
/// Returns [Error::EmptyName] for a blank name or [Error::DuplicateName] if
/// the name is taken.
pub fn create_classification(
    control_id: ControlId,
    name: &str,
    connection: &Connection,
) -> Result<Classification, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .prepare(
            "INSERT INTO classification (control_id, name) VALUES (?1, ?2)
            RETURNING id, control_id, name",
        )?
        .query_row((control_id, name), map_classification_row)
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateName(name.to_owned())
            } else {
                error.into()
            }
        })
}

pub fn get_classifications(
    control_id: ControlId,
    connection: &Connection,
) -> Result<Vec<Classification>, Error> {
    connection
        .prepare(
            "SELECT id, control_id, name FROM classification WHERE control_id = ?1
            ORDER BY name COLLATE NOCASE",
        )?
        .query_map((control_id,), map_classification_row)?
        .map(|classification| classification.map_err(Error::from))
        .collect()
}

/// Check that `classification_id` is a classification of the control.
///
/// # Errors
/// Returns [Error::InvalidClassification] if it is not.
pub fn check_classification(
    control_id: ControlId,
    classification_id: ClassificationId,
    connection: &Connection,
) -> Result<Classification, Error> {
    connection
        .prepare("SELECT id, control_id, name FROM classification WHERE id = ?1 AND control_id = ?2")?
        .query_row((classification_id, control_id), map_classification_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidClassification,
            error => error.into(),
        })
}

/// Delete a classification, clearing it from the transactions that use it.
pub fn delete_classification(
    control_id: ControlId,
    classification_id: ClassificationId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected: RowsAffected = connection.execute(
        "DELETE FROM classification WHERE id = ?1 AND control_id = ?2",
        (classification_id, control_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
