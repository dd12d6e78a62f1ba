//! Savings boxes set aside part of an account's balance for a goal.
//!
//! The money stays in the account: a box is a ledger of signed movements,
//! deposits are positive and withdrawals negative, and its balance is their
//! sum. Money in boxes is not available for other deposits.

use rusqlite::{Connection, Row};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, available_balance, check_account},
    control::ControlId,
    database_id::{DatabaseId, RowsAffected},
    is_unique_violation,
    money::{round_to_cents, validate_amount},
};

pub type SavingsBoxId = DatabaseId;
pub type BoxMovementId = DatabaseId;

#[derive(Debug, Clone, PartialEq)]
pub struct SavingsBox {
    pub id: SavingsBoxId,
    pub control_id: ControlId,
    pub account_id: AccountId,
    pub name: String,
    pub goal: Option<f64>,
}

/// A savings box with the money it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsBoxSummary {
    pub savings_box: SavingsBox,
    pub balance: f64,
}

impl SavingsBoxSummary {
    /// The fraction of the goal reached, capped at 1.
    pub fn progress(&self) -> Option<f64> {
        self.savings_box
            .goal
            .filter(|goal| *goal > 0.0)
            .map(|goal| (self.balance / goal).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxMovement {
    pub id: BoxMovementId,
    pub box_id: SavingsBoxId,
    /// Positive for deposits, negative for withdrawals.
    pub amount: f64,
    pub date: Date,
    pub description: String,
}

/// The data needed to create a savings box.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSavingsBox {
    pub account_id: AccountId,
    pub name: String,
    #[serde(default)]
    pub goal: Option<f64>,
}

pub fn create_savings_box_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_box (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            account_id INTEGER NOT NULL REFERENCES account(id),
            name TEXT NOT NULL,
            goal REAL,
            UNIQUE (control_id, name)
        )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS box_movement (
            id INTEGER PRIMARY KEY,
            box_id INTEGER NOT NULL REFERENCES savings_box(id) ON DELETE CASCADE,
            amount REAL NOT NULL CHECK (amount <> 0),
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_box_movement_box ON box_movement(box_id)",
        (),
    )?;

    Ok(())
}

fn map_savings_box_row(row: &Row) -> Result<SavingsBox, rusqlite::Error> {
    Ok(SavingsBox {
        id: row.get(0)?,
        control_id: row.get(1)?,
        account_id: row.get(2)?,
        name: row.get(3)?,
        goal: row.get(4)?,
    })
}

fn map_movement_row(row: &Row) -> Result<BoxMovement, rusqlite::Error> {
    Ok(BoxMovement {
        id: row.get(0)?,
        box_id: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
        description: row.get(4)?,
    })
}

/// Create a savings box for an account of the control.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::InvalidAmount] if a goal is given that is not positive,
/// - [Error::InvalidAccount] if the account is not in the control,
/// - [Error::DuplicateName] if the control already has a box with the name.
pub fn create_savings_box(
    control_id: ControlId,
    savings_box: &NewSavingsBox,
    connection: &Connection,
) -> Result<SavingsBox, Error> {
    let name = savings_box.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let goal = savings_box.goal.map(validate_amount).transpose()?;
    check_account(control_id, savings_box.account_id, connection)?;

    connection
        .prepare(
            "INSERT INTO savings_box (control_id, account_id, name, goal) VALUES (?1, ?2, ?3, ?4)
            RETURNING id, control_id, account_id, name, goal",
        )?
        .query_row(
            (control_id, savings_box.account_id, name, goal),
            map_savings_box_row,
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateName(name.to_owned())
            } else {
                error.into()
            }
        })
}

pub fn get_savings_box(
    control_id: ControlId,
    box_id: SavingsBoxId,
    connection: &Connection,
) -> Result<SavingsBox, Error> {
    connection
        .prepare(
            "SELECT id, control_id, account_id, name, goal FROM savings_box
            WHERE id = ?1 AND control_id = ?2",
        )?
        .query_row((box_id, control_id), map_savings_box_row)
        .map_err(Error::from)
}

/// The money held in a savings box.
pub fn box_balance(box_id: SavingsBoxId, connection: &Connection) -> Result<f64, Error> {
    let balance: f64 = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM box_movement WHERE box_id = ?1",
        (box_id,),
        |row| row.get(0),
    )?;

    Ok(round_to_cents(balance))
}

/// The savings boxes of a control with their balances, ordered by name.
pub fn get_savings_boxes(
    control_id: ControlId,
    connection: &Connection,
) -> Result<Vec<SavingsBoxSummary>, Error> {
    connection
        .prepare(
            "SELECT savings_box.id, savings_box.control_id, savings_box.account_id,
                savings_box.name, savings_box.goal, COALESCE(SUM(box_movement.amount), 0)
            FROM savings_box
            LEFT JOIN box_movement ON box_movement.box_id = savings_box.id
            WHERE savings_box.control_id = ?1
            GROUP BY savings_box.id
            ORDER BY savings_box.name COLLATE NOCASE",
        )?
        .query_map((control_id,), |row| {
            let balance: f64 = row.get(5)?;

            Ok(SavingsBoxSummary {
                savings_box: map_savings_box_row(row)?,
                balance: round_to_cents(balance),
            })
        })?
        .map(|summary| summary.map_err(Error::from))
        .collect()
}

/// The movements of a savings box, newest first.
pub fn get_box_movements(
    box_id: SavingsBoxId,
    connection: &Connection,
) -> Result<Vec<BoxMovement>, Error> {
    connection
        .prepare(
            "SELECT id, box_id, amount, date, description FROM box_movement
            WHERE box_id = ?1 ORDER BY date DESC, id DESC",
        )?
        .query_map((box_id,), map_movement_row)?
        .map(|movement| movement.map_err(Error::from))
        .collect()
}

fn insert_movement(
    box_id: SavingsBoxId,
    amount: f64,
    date: Date,
    description: &str,
    connection: &Connection,
) -> Result<BoxMovement, Error> {
    connection
        .prepare(
            "INSERT INTO box_movement (box_id, amount, date, description) VALUES (?1, ?2, ?3, ?4)
            RETURNING id, box_id, amount, date, description",
        )?
        .query_row(
            (box_id, amount, date, description.trim()),
            map_movement_row,
        )
        .map_err(Error::from)
}

/// Put `amount` of the account's available balance into a savings box.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::NotFound] if the box is not in the control,
/// - [Error::InsufficientFunds] if the account does not have `amount` available.
pub fn deposit(
    control_id: ControlId,
    box_id: SavingsBoxId,
    amount: f64,
    date: Date,
    description: &str,
    connection: &Connection,
) -> Result<BoxMovement, Error> {
    let amount = validate_amount(amount)?;
    let savings_box = get_savings_box(control_id, box_id, connection)?;
    let available = available_balance(savings_box.account_id, connection)?;

    if amount > available {
        return Err(Error::InsufficientFunds(available));
    }

    insert_movement(box_id, amount, date, description, connection)
}

/// Take `amount` out of a savings box, making it available in the account again.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::NotFound] if the box is not in the control,
/// - [Error::InsufficientBoxBalance] if the box holds less than `amount`.
pub fn withdraw(
    control_id: ControlId,
    box_id: SavingsBoxId,
    amount: f64,
    date: Date,
    description: &str,
    connection: &Connection,
) -> Result<BoxMovement, Error> {
    let amount = validate_amount(amount)?;
    get_savings_box(control_id, box_id, connection)?;
    let balance = box_balance(box_id, connection)?;

    if amount > balance {
        return Err(Error::InsufficientBoxBalance(balance));
    }

    insert_movement(box_id, -amount, date, description, connection)
}

/// Delete an empty savings box together with its movements.
///
/// # Errors
/// Returns [Error::BoxNotEmpty] while the box holds money.
pub fn delete_savings_box(
    control_id: ControlId,
    box_id: SavingsBoxId,
    connection: &Connection,
) -> Result<(), Error> {
    get_savings_box(control_id, box_id, connection)?;

    if box_balance(box_id, connection)? != 0.0 {
        return Err(Error::BoxNotEmpty);
    }

    let rows_affected: RowsAffected = connection.execute(
        "DELETE FROM savings_box WHERE id = ?1 AND control_id = ?2",
        (box_id, control_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, NewAccount, create_account},
        control::ControlId,
        test_utils::{get_test_connection, insert_test_control},
    };

    use super::{
        NewSavingsBox, SavingsBox, box_balance, create_savings_box, delete_savings_box, deposit,
        get_box_movements, get_savings_boxes, withdraw,
    };

    struct Fixture {
        connection: Connection,
        control_id: ControlId,
        account: Account,
        savings_box: SavingsBox,
    }

    fn setup() -> Fixture {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = create_account(
            control.id,
            &NewAccount {
                name: "Checking".to_owned(),
                opening_balance: 500.0,
            },
            &connection,
        )
        .unwrap();
        let savings_box = create_savings_box(
            control.id,
            &NewSavingsBox {
                account_id: account.id,
                name: "Emergency".to_owned(),
                goal: Some(1000.0),
            },
            &connection,
        )
        .unwrap();

        Fixture {
            connection,
            control_id: control.id,
            account,
            savings_box,
        }
    }

    #[test]
    fn deposit_and_withdraw_change_balance() {
        let fixture = setup();
        let connection = &fixture.connection;
        let box_id = fixture.savings_box.id;

        deposit(
            fixture.control_id,
            box_id,
            200.0,
            date!(2025 - 01 - 05),
            "Bonus",
            connection,
        )
        .unwrap();
        let withdrawal = withdraw(
            fixture.control_id,
            box_id,
            50.0,
            date!(2025 - 01 - 20),
            "",
            connection,
        )
        .unwrap();

        assert_eq!(withdrawal.amount, -50.0);
        assert_eq!(box_balance(box_id, connection), Ok(150.0));
        let movements = get_box_movements(box_id, connection).unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0], withdrawal);

        let summaries = get_savings_boxes(fixture.control_id, connection).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].balance, 150.0);
        assert_eq!(summaries[0].progress(), Some(0.15));
    }

    #[test]
    fn deposit_cannot_exceed_available_balance() {
        let fixture = setup();
        let connection = &fixture.connection;
        let box_id = fixture.savings_box.id;
        deposit(fixture.control_id, box_id, 400.0, date!(2025 - 01 - 05), "", connection)
            .unwrap();

        let result = deposit(
            fixture.control_id,
            box_id,
            100.01,
            date!(2025 - 01 - 06),
            "",
            connection,
        );

        assert_eq!(result, Err(Error::InsufficientFunds(100.0)));
    }

    #[test]
    fn withdraw_cannot_exceed_box_balance() {
        let fixture = setup();
        let connection = &fixture.connection;
        let box_id = fixture.savings_box.id;
        deposit(fixture.control_id, box_id, 30.0, date!(2025 - 01 - 05), "", connection).unwrap();

        let result = withdraw(
            fixture.control_id,
            box_id,
            30.5,
            date!(2025 - 01 - 06),
            "",
            connection,
        );

        assert_eq!(result, Err(Error::InsufficientBoxBalance(30.0)));
    }

    #[test]
    fn only_empty_boxes_can_be_deleted() {
        let fixture = setup();
        let connection = &fixture.connection;
        let box_id = fixture.savings_box.id;
        deposit(fixture.control_id, box_id, 30.0, date!(2025 - 01 - 05), "", connection).unwrap();

        assert_eq!(
            delete_savings_box(fixture.control_id, box_id, connection),
            Err(Error::BoxNotEmpty)
        );

        withdraw(fixture.control_id, box_id, 30.0, date!(2025 - 01 - 06), "", connection).unwrap();

        assert_eq!(delete_savings_box(fixture.control_id, box_id, connection), Ok(()));
        assert!(get_savings_boxes(fixture.control_id, connection).unwrap().is_empty());
    }

    #[test]
    fn rejects_duplicate_and_blank_names() {
        let fixture = setup();
        let new_box = |name: &str| NewSavingsBox {
            account_id: fixture.account.id,
            name: name.to_owned(),
            goal: None,
        };

        assert_eq!(
            create_savings_box(fixture.control_id, &new_box("Emergency"), &fixture.connection),
            Err(Error::DuplicateName("Emergency".to_owned()))
        );
        assert_eq!(
            create_savings_box(fixture.control_id, &new_box("  "), &fixture.connection),
            Err(Error::EmptyName)
        );
    }

    #[test]
    fn box_without_goal_has_no_progress() {
        let fixture = setup();
        let savings_box = create_savings_box(
            fixture.control_id,
            &NewSavingsBox {
                account_id: fixture.account.id,
                name: "Misc".to_owned(),
                goal: None,
            },
            &fixture.connection,
        )
        .unwrap();

        let summaries = get_savings_boxes(fixture.control_id, &fixture.connection).unwrap();
        let summary = summaries
            .iter()
            .find(|summary| summary.savings_box.id == savings_box.id)
            .unwrap();

        assert_eq!(summary.progress(), None);
    }
}
