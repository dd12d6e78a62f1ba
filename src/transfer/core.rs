use rusqlite::{Connection, Row};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, check_account},
    control::ControlId,
    database_id::{DatabaseId, RowsAffected},
    money::validate_amount,
    month::YearMonth,
};

pub type TransferId = DatabaseId;

/// Money moved from one account of a control to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub id: TransferId,
    pub control_id: ControlId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: f64,
    pub date: Date,
    pub description: String,
}

/// The data needed to create a transfer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransfer {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: f64,
    pub date: Date,
    #[serde(default)]
    pub description: String,
}

pub fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transfer (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            from_account_id INTEGER NOT NULL REFERENCES account(id),
            to_account_id INTEGER NOT NULL REFERENCES account(id),
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            CHECK (from_account_id <> to_account_id)
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transfer_control_date ON transfer(control_id, date)",
        (),
    )?;

    Ok(())
}

const SELECT_TRANSFER: &str = "SELECT id, control_id, from_account_id, to_account_id, amount, \
    date, description FROM transfer";

fn map_transfer_row(row: &Row) -> Result<Transfer, rusqlite::Error> {
    Ok(Transfer {
        id: row.get(0)?,
        control_id: row.get(1)?,
        from_account_id: row.get(2)?,
        to_account_id: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        description: row.get(6)?,
    })
}

/// Move `transfer.amount` from one account of the control to another.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::SameAccountTransfer] if both accounts are the same,
/// - [Error::InvalidAccount] if either account is not in the control.
pub fn create_transfer(
    control_id: ControlId,
    transfer: &NewTransfer,
    connection: &Connection,
) -> Result<Transfer, Error> {
    let amount = validate_amount(transfer.amount)?;

    if transfer.from_account_id == transfer.to_account_id {
        return Err(Error::SameAccountTransfer);
    }

    check_account(control_id, transfer.from_account_id, connection)?;
    check_account(control_id, transfer.to_account_id, connection)?;

    connection
        .prepare(
            "INSERT INTO transfer
                (control_id, from_account_id, to_account_id, amount, date, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, control_id, from_account_id, to_account_id, amount, date, description",
        )?
        .query_row(
            (
                control_id,
                transfer.from_account_id,
                transfer.to_account_id,
                amount,
                transfer.date,
                transfer.description.trim(),
            ),
            map_transfer_row,
        )
        .map_err(Error::from)
}

/// The transfers of a control dated in `month`, oldest first.
pub fn get_transfers_for_month(
    control_id: ControlId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<Transfer>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSFER} WHERE control_id = ?1 AND date BETWEEN ?2 AND ?3
            ORDER BY date, id"
        ))?
        .query_map(
            (control_id, month.first_day(), month.last_day()),
            map_transfer_row,
        )?
        .map(|transfer| transfer.map_err(Error::from))
        .collect()
}

pub fn delete_transfer(
    control_id: ControlId,
    transfer_id: TransferId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected: RowsAffected = connection.execute(
        "DELETE FROM transfer WHERE id = ?1 AND control_id = ?2",
        (transfer_id, control_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        account::{NewAccount, create_account},
        test_utils::{get_test_connection, insert_test_account, insert_test_control},
    };

    use super::{NewTransfer, create_transfer, delete_transfer, get_transfers_for_month};

    fn new_transfer(from: i64, to: i64, amount: f64) -> NewTransfer {
        NewTransfer {
            from_account_id: from,
            to_account_id: to,
            amount,
            date: date!(2025 - 05 - 14),
            description: " Savings ".to_owned(),
        }
    }

    #[test]
    fn creates_transfer() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let from = insert_test_account(control.id, &connection);
        let to = insert_test_account(control.id, &connection);

        let transfer = create_transfer(
            control.id,
            &new_transfer(from.id, to.id, 99.999),
            &connection,
        )
        .unwrap();

        assert_eq!(transfer.amount, 100.0);
        assert_eq!(transfer.description, "Savings");
        assert_eq!(
            get_transfers_for_month(control.id, "2025-05".parse().unwrap(), &connection),
            Ok(vec![transfer])
        );
        assert_eq!(
            get_transfers_for_month(control.id, "2025-06".parse().unwrap(), &connection),
            Ok(vec![])
        );
    }

    #[test]
    fn rejects_same_account() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);

        let result = create_transfer(
            control.id,
            &new_transfer(account.id, account.id, 10.0),
            &connection,
        );

        assert_eq!(result, Err(Error::SameAccountTransfer));
    }

    #[test]
    fn rejects_non_positive_amount() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let from = insert_test_account(control.id, &connection);
        let to = insert_test_account(control.id, &connection);

        let result = create_transfer(control.id, &new_transfer(from.id, to.id, 0.0), &connection);

        assert_eq!(result, Err(Error::InvalidAmount(0.0)));
    }

    #[test]
    fn rejects_account_of_other_control() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let (_, other) = insert_test_control(&connection);
        let from = insert_test_account(control.id, &connection);
        let foreign = create_account(
            other.id,
            &NewAccount {
                name: "Elsewhere".to_owned(),
                opening_balance: 0.0,
            },
            &connection,
        )
        .unwrap();

        let result = create_transfer(
            control.id,
            &new_transfer(from.id, foreign.id, 10.0),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidAccount));
    }

    #[test]
    fn deletes_transfer() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let from = insert_test_account(control.id, &connection);
        let to = insert_test_account(control.id, &connection);
        let transfer = create_transfer(
            control.id,
            &new_transfer(from.id, to.id, 10.0),
            &connection,
        )
        .unwrap();

        assert_eq!(delete_transfer(control.id, transfer.id, &connection), Ok(()));
        assert_eq!(
            delete_transfer(control.id, transfer.id, &connection),
            Err(Error::NotFound)
        );
    }
}
