//! Categories group transactions by what the money was spent on or came from.

use rusqlite::{Connection, Row};
use serde::Deserialize;

use crate::{
    Error,
    control::ControlId,
    database_id::{DatabaseId, RowsAffected},
    is_unique_violation,
    transaction::TransactionKind,
};

pub type CategoryId = DatabaseId;

/// Whether a category is meant for expenses or incomes.
pub type CategoryKind = TransactionKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub control_id: ControlId,
    pub name: String,
    pub kind: CategoryKind,
}

/// The form data for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            UNIQUE (control_id, name)
        )",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        control_id: row.get(1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
    })
}

/// Create a category in the control `control_id`.
///
/// # Errors
/// Returns [Error::EmptyName] for a blank name or [Error::DuplicateName] if
/// the control already has a category called `name`.
pub fn create_category(
    control_id: ControlId,
    name: &str,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    connection
        .prepare(
            "INSERT INTO category (control_id, name, kind) VALUES (?1, ?2, ?3)
            RETURNING id, control_id, name, kind",
        )?
        .query_row((control_id, name, kind), map_category_row)
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateName(name.to_owned())
            } else {
                error.into()
            }
        })
}

/// The categories of a control, expense categories first.
pub fn get_categories(
    control_id: ControlId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, control_id, name, kind FROM category WHERE control_id = ?1
            ORDER BY kind, name COLLATE NOCASE",
        )?
        .query_map((control_id,), map_category_row)?
        .map(|category| category.map_err(Error::from))
        .collect()
}

/// Check that `category_id` is a category of the control.
///
/// # Errors
/// Returns [Error::InvalidCategory] if it is not.
pub fn check_category(
    control_id: ControlId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, control_id, name, kind FROM category WHERE id = ?1 AND control_id = ?2")?
        .query_row((category_id, control_id), map_category_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidCategory,
            error => error.into(),
        })
}

/// Delete a category. Transactions and provisioned transactions in the
/// category become uncategorised.
pub fn delete_category(
    control_id: ControlId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected: RowsAffected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND control_id = ?2",
        (category_id, control_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
