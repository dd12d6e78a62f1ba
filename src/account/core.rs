use rusqlite::{Connection, Row};
use serde::Deserialize;

use crate::{
    Error,
    control::ControlId,
    database_id::{DatabaseId, RowsAffected},
    is_unique_violation,
    money::round_to_cents,
};

pub type AccountId = DatabaseId;

/// A bank account that belongs to a financial control.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The financial control the account belongs to.
    pub control_id: ControlId,
    /// The name of the account, unique within the control.
    pub name: String,
    /// The balance of the account before any transaction recorded in the app.
    pub opening_balance: f64,
}

/// The data needed to create or edit an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub opening_balance: f64,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            opening_balance REAL NOT NULL,
            UNIQUE (control_id, name)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let control_id = row.get(1)?;
    let name = row.get(2)?;
    let opening_balance = row.get(3)?;

    Ok(Account {
        id,
        control_id,
        name,
        opening_balance,
    })
}

fn validate(account: &NewAccount) -> Result<(String, f64), Error> {
    let name = account.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    if !account.opening_balance.is_finite() {
        return Err(Error::InvalidAmount(account.opening_balance));
    }

    Ok((name.to_owned(), round_to_cents(account.opening_balance)))
}

/// Create an account in the financial control `control_id`.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::DuplicateAccountName] if the control already has an account with the name,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    control_id: ControlId,
    account: &NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let (name, opening_balance) = validate(account)?;

    connection
        .prepare(
            "INSERT INTO account (control_id, name, opening_balance) VALUES (?1, ?2, ?3)
            RETURNING id, control_id, name, opening_balance",
        )?
        .query_row((control_id, &name, opening_balance), map_row_to_account)
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateAccountName(name.clone())
            } else {
                error.into()
            }
        })
}

/// Get an account, scoped to the financial control so that IDs from other
/// controls are treated as missing.
pub fn get_account(
    control_id: ControlId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, control_id, name, opening_balance FROM account
            WHERE id = ?1 AND control_id = ?2",
        )?
        .query_row((account_id, control_id), map_row_to_account)
        .map_err(Error::from)
}

/// Like [get_account], but reports a missing account as [Error::InvalidAccount].
///
/// Use this when checking an account chosen in a form.
pub fn check_account(
    control_id: ControlId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    get_account(control_id, account_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidAccount,
        error => error,
    })
}

/// All accounts of a financial control ordered by name.
pub fn get_accounts(control_id: ControlId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, control_id, name, opening_balance FROM account
            WHERE control_id = ?1
            ORDER BY name COLLATE NOCASE ASC",
        )?
        .query_map((control_id,), map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

pub fn update_account(
    control_id: ControlId,
    account_id: AccountId,
    account: &NewAccount,
    connection: &Connection,
) -> Result<(), Error> {
    let (name, opening_balance) = validate(account)?;

    let rows_affected: RowsAffected = connection
        .execute(
            "UPDATE account SET name = ?1, opening_balance = ?2 WHERE id = ?3 AND control_id = ?4",
            (&name, opening_balance, account_id, control_id),
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateAccountName(name.clone())
            } else {
                error.into()
            }
        })?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete an account that nothing refers to anymore.
///
/// # Errors
/// Returns [Error::AccountInUse] while transactions, provisioned transactions,
/// transfers, savings boxes, invoice payments or cards refer to the account.
pub fn delete_account(
    control_id: ControlId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    get_account(control_id, account_id, connection)?;

    let references: i64 = connection.query_row(
        "SELECT
            (SELECT COUNT(*) FROM \"transaction\" WHERE account_id = ?1)
            + (SELECT COUNT(*) FROM provisioned WHERE account_id = ?1)
            + (SELECT COUNT(*) FROM transfer WHERE from_account_id = ?1 OR to_account_id = ?1)
            + (SELECT COUNT(*) FROM savings_box WHERE account_id = ?1)
            + (SELECT COUNT(*) FROM invoice WHERE paid_from_account_id = ?1)
            + (SELECT COUNT(*) FROM card WHERE payment_account_id = ?1)",
        (account_id,),
        |row| row.get(0),
    )?;

    if references > 0 {
        return Err(Error::AccountInUse);
    }

    connection.execute(
        "DELETE FROM account WHERE id = ?1 AND control_id = ?2",
        (account_id, control_id),
    )?;

    Ok(())
}
