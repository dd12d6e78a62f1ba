//! Credit cards and the billing cycle that decides which invoice a purchase
//! lands in.

use rusqlite::{Connection, Row};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{AccountId, check_account},
    control::ControlId,
    database_id::{DatabaseId, RowsAffected},
    is_unique_violation,
    money::round_to_cents,
    month::YearMonth,
};

pub type CardId = DatabaseId;

/// A credit card whose purchases are collected into monthly invoices.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub control_id: ControlId,
    pub name: String,
    /// The day of the month the invoice closes, clamped to short months.
    pub closing_day: u8,
    /// The day of the month the invoice is due, clamped to short months.
    pub due_day: u8,
    pub credit_limit: f64,
    /// The account invoices are usually paid from.
    pub payment_account_id: AccountId,
}

impl Card {
    /// The due month of the invoice that a purchase on `date` is billed to.
    ///
    /// A purchase on or before the closing day of its month closes in that
    /// month, a later purchase closes in the next month. An invoice is due in
    /// the month it closes when the due day is after the closing day, and in
    /// the following month otherwise.
    pub fn invoice_month_for_purchase(&self, date: Date) -> YearMonth {
        let purchase_month = YearMonth::from_date(date);
        let closing_month = if date <= purchase_month.day(self.closing_day) {
            purchase_month
        } else {
            purchase_month.next()
        };

        self.due_month(closing_month)
    }

    fn due_month(&self, closing_month: YearMonth) -> YearMonth {
        if self.due_day > self.closing_day {
            closing_month
        } else {
            closing_month.next()
        }
    }

    /// The month the invoice due in `due_month` closes.
    pub fn closing_month(&self, due_month: YearMonth) -> YearMonth {
        if self.due_day > self.closing_day {
            due_month
        } else {
            due_month.prev()
        }
    }

    pub fn closing_date(&self, due_month: YearMonth) -> Date {
        self.closing_month(due_month).day(self.closing_day)
    }

    pub fn due_date(&self, due_month: YearMonth) -> Date {
        due_month.day(self.due_day)
    }
}

/// The data needed to create or edit a card.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCard {
    pub name: String,
    pub closing_day: u8,
    pub due_day: u8,
    pub credit_limit: f64,
    pub payment_account_id: AccountId,
}

pub fn create_card_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS card (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            closing_day INTEGER NOT NULL CHECK (closing_day BETWEEN 1 AND 31),
            due_day INTEGER NOT NULL CHECK (due_day BETWEEN 1 AND 31),
            credit_limit REAL NOT NULL,
            payment_account_id INTEGER NOT NULL REFERENCES account(id),
            UNIQUE (control_id, name)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_card_row(row: &Row) -> Result<Card, rusqlite::Error> {
    Ok(Card {
        id: row.get(0)?,
        control_id: row.get(1)?,
        name: row.get(2)?,
        closing_day: row.get(3)?,
        due_day: row.get(4)?,
        credit_limit: row.get(5)?,
        payment_account_id: row.get(6)?,
    })
}

fn validate(
    control_id: ControlId,
    card: &NewCard,
    connection: &Connection,
) -> Result<NewCard, Error> {
    let name = card.name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    for day in [card.closing_day, card.due_day] {
        if !(1..=31).contains(&day) {
            return Err(Error::InvalidDay(day));
        }
    }

    if !card.credit_limit.is_finite() || card.credit_limit < 0.0 {
        return Err(Error::InvalidAmount(card.credit_limit));
    }

    check_account(control_id, card.payment_account_id, connection)?;

    Ok(NewCard {
        name: name.to_owned(),
        credit_limit: round_to_cents(card.credit_limit),
        ..card.clone()
    })
}

fn map_unique_violation(name: &str) -> impl Fn(rusqlite::Error) -> Error + '_ {
    move |error| {
        if is_unique_violation(&error) {
            Error::DuplicateName(name.to_owned())
        } else {
            error.into()
        }
    }
}

/// Create a card in the financial control `control_id`.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyName] if the name is blank,
/// - [Error::InvalidDay] if the closing or due day is not in 1..=31,
/// - [Error::InvalidAmount] if the credit limit is negative,
/// - [Error::InvalidAccount] if the payment account is not in the control,
/// - [Error::DuplicateName] if the control already has a card with the name.
pub fn create_card(
    control_id: ControlId,
    card: &NewCard,
    connection: &Connection,
) -> Result<Card, Error> {
    let card = validate(control_id, card, connection)?;

    connection
        .prepare(
            "INSERT INTO card
                (control_id, name, closing_day, due_day, credit_limit, payment_account_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, control_id, name, closing_day, due_day, credit_limit, payment_account_id",
        )?
        .query_row(
            (
                control_id,
                &card.name,
                card.closing_day,
                card.due_day,
                card.credit_limit,
                card.payment_account_id,
            ),
            map_card_row,
        )
        .map_err(map_unique_violation(&card.name))
}

pub fn get_card(
    control_id: ControlId,
    card_id: CardId,
    connection: &Connection,
) -> Result<Card, Error> {
    connection
        .prepare(
            "SELECT id, control_id, name, closing_day, due_day, credit_limit, payment_account_id
            FROM card WHERE id = ?1 AND control_id = ?2",
        )?
        .query_row((card_id, control_id), map_card_row)
        .map_err(Error::from)
}

/// Like [get_card], but reports a missing card as [Error::InvalidCard].
pub fn check_card(
    control_id: ControlId,
    card_id: CardId,
    connection: &Connection,
) -> Result<Card, Error> {
    get_card(control_id, card_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCard,
        error => error,
    })
}

pub fn get_cards(control_id: ControlId, connection: &Connection) -> Result<Vec<Card>, Error> {
    connection
        .prepare(
            "SELECT id, control_id, name, closing_day, due_day, credit_limit, payment_account_id
            FROM card WHERE control_id = ?1
            ORDER BY name COLLATE NOCASE",
        )?
        .query_map((control_id,), map_card_row)?
        .map(|card_result| card_result.map_err(Error::from))
        .collect()
}

/// Update a card.
///
/// Invoices that already exist keep the closing and due dates they were
/// created with.
pub fn update_card(
    control_id: ControlId,
    card_id: CardId,
    card: &NewCard,
    connection: &Connection,
) -> Result<(), Error> {
    let card = validate(control_id, card, connection)?;

    let rows_affected: RowsAffected = connection
        .execute(
            "UPDATE card
            SET name = ?1, closing_day = ?2, due_day = ?3, credit_limit = ?4,
                payment_account_id = ?5
            WHERE id = ?6 AND control_id = ?7",
            (
                &card.name,
                card.closing_day,
                card.due_day,
                card.credit_limit,
                card.payment_account_id,
                card_id,
                control_id,
            ),
        )
        .map_err(map_unique_violation(&card.name))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete a card together with its invoices.
///
/// # Errors
/// Returns [Error::CardInUse] while transactions or provisioned transactions
/// are charged to the card.
pub fn delete_card(
    control_id: ControlId,
    card_id: CardId,
    connection: &Connection,
) -> Result<(), Error> {
    get_card(control_id, card_id, connection)?;

    let references: i64 = connection.query_row(
        "SELECT (SELECT COUNT(*) FROM \"transaction\" WHERE card_id = ?1)
            + (SELECT COUNT(*) FROM provisioned WHERE card_id = ?1)",
        (card_id,),
        |row| row.get(0),
    )?;

    if references > 0 {
        return Err(Error::CardInUse);
    }

    connection.execute("DELETE FROM card WHERE id = ?1", (card_id,))?;

    Ok(())
}

/// The credit limit in use by unpaid invoices.
pub fn used_limit(card_id: CardId, connection: &Connection) -> Result<f64, Error> {
    let used: f64 = connection.query_row(
        "SELECT COALESCE(SUM(total), 0) FROM invoice WHERE card_id = ?1 AND paid_on IS NULL",
        (card_id,),
        |row| row.get(0),
    )?;

    Ok(round_to_cents(used))
}

/// The credit limit still available on the card.
pub fn available_limit(card: &Card, connection: &Connection) -> Result<f64, Error> {
    let used = used_limit(card.id, connection)?;

    Ok(round_to_cents(card.credit_limit - used))
}
