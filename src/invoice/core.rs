//! Monthly credit card invoices.
//!
//! An invoice is identified by its card and the month it is due in. Its total
//! is stored and kept equal to the signed sum of the card transactions linked
//! to it: expenses add to the total, incomes (refunds) subtract from it.

use rusqlite::{Connection, OptionalExtension, Row};
use time::Date;

use crate::{
    Error,
    account::{AccountId, check_account},
    card::{Card, CardId},
    control::ControlId,
    database_id::DatabaseId,
    money::round_to_cents,
    month::YearMonth,
};

pub type InvoiceId = DatabaseId;

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub card_id: CardId,
    /// The month the invoice is due in.
    pub month: YearMonth,
    pub closing_date: Date,
    pub due_date: Date,
    pub total: f64,
    pub paid_on: Option<Date>,
    pub paid_from_account_id: Option<AccountId>,
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.paid_on.is_some()
    }
}

pub fn create_invoice_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS invoice (
            id INTEGER PRIMARY KEY,
            card_id INTEGER NOT NULL REFERENCES card(id) ON DELETE CASCADE,
            month TEXT NOT NULL,
            closing_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            total REAL NOT NULL DEFAULT 0,
            paid_on TEXT,
            paid_from_account_id INTEGER REFERENCES account(id),
            UNIQUE (card_id, month)
        )",
        (),
    )?;

    Ok(())
}

const SELECT_INVOICE: &str = "SELECT invoice.id, invoice.card_id, invoice.month,
    invoice.closing_date, invoice.due_date, invoice.total, invoice.paid_on,
    invoice.paid_from_account_id
    FROM invoice";

fn map_invoice_row(row: &Row) -> Result<Invoice, rusqlite::Error> {
    Ok(Invoice {
        id: row.get(0)?,
        card_id: row.get(1)?,
        month: row.get(2)?,
        closing_date: row.get(3)?,
        due_date: row.get(4)?,
        total: row.get(5)?,
        paid_on: row.get(6)?,
        paid_from_account_id: row.get(7)?,
    })
}

/// Get the invoice of `card` due in `month`, creating an empty one if needed.
///
/// The closing and due dates are fixed when the invoice is created.
pub fn get_or_create_invoice(
    card: &Card,
    month: YearMonth,
    connection: &Connection,
) -> Result<Invoice, Error> {
    connection.execute(
        "INSERT INTO invoice (card_id, month, closing_date, due_date, total)
        VALUES (?1, ?2, ?3, ?4, 0)
        ON CONFLICT (card_id, month) DO NOTHING",
        (
            card.id,
            month,
            card.closing_date(month),
            card.due_date(month),
        ),
    )?;

    connection
        .prepare(&format!("{SELECT_INVOICE} WHERE card_id = ?1 AND month = ?2"))?
        .query_row((card.id, month), map_invoice_row)
        .map_err(Error::from)
}

/// Get an invoice of a card in the control `control_id`.
pub fn get_invoice(
    control_id: ControlId,
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<Invoice, Error> {
    connection
        .prepare(&format!(
            "{SELECT_INVOICE}
            INNER JOIN card ON card.id = invoice.card_id
            WHERE invoice.id = ?1 AND card.control_id = ?2"
        ))?
        .query_row((invoice_id, control_id), map_invoice_row)
        .map_err(Error::from)
}

/// Whether the invoice exists and has been paid.
pub(crate) fn is_invoice_paid(
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<bool, Error> {
    let paid: Option<bool> = connection
        .query_row(
            "SELECT paid_on IS NOT NULL FROM invoice WHERE id = ?1",
            (invoice_id,),
            |row| row.get(0),
        )
        .optional()?;

    Ok(paid.unwrap_or(false))
}

/// The invoices of a card, oldest first.
pub fn get_invoices(card_id: CardId, connection: &Connection) -> Result<Vec<Invoice>, Error> {
    connection
        .prepare(&format!("{SELECT_INVOICE} WHERE card_id = ?1 ORDER BY month"))?
        .query_map((card_id,), map_invoice_row)?
        .map(|invoice| invoice.map_err(Error::from))
        .collect()
}

/// The invoices of every card in the control that are due in `month`.
pub fn get_invoices_due_in(
    control_id: ControlId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<Invoice>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_INVOICE}
            INNER JOIN card ON card.id = invoice.card_id
            WHERE card.control_id = ?1 AND invoice.month = ?2
            ORDER BY card.name COLLATE NOCASE"
        ))?
        .query_map((control_id, month), map_invoice_row)?
        .map(|invoice| invoice.map_err(Error::from))
        .collect()
}

/// Set the total of an invoice to the signed sum of its transactions.
///
/// An unpaid invoice without transactions is deleted.
pub fn recalculate_invoice_total(
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<(), Error> {
    let (count, total): (i64, f64) = connection.query_row(
        "SELECT COUNT(*),
            COALESCE(SUM(CASE kind WHEN 'income' THEN -amount ELSE amount END), 0)
        FROM \"transaction\" WHERE invoice_id = ?1",
        (invoice_id,),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    if count == 0 {
        let deleted = connection.execute(
            "DELETE FROM invoice WHERE id = ?1 AND paid_on IS NULL",
            (invoice_id,),
        )?;

        if deleted > 0 {
            tracing::debug!("deleted empty invoice {invoice_id}");
            return Ok(());
        }
    }

    connection.execute(
        "UPDATE invoice SET total = ?1 WHERE id = ?2",
        (round_to_cents(total), invoice_id),
    )?;

    Ok(())
}

/// Record that an invoice was paid from `account_id` on `date`.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if the invoice is not in the control,
/// - [Error::InvoicePaid] if it has already been paid,
/// - [Error::InvalidAccount] if the account is not in the control.
pub fn pay_invoice(
    control_id: ControlId,
    invoice_id: InvoiceId,
    account_id: AccountId,
    date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let invoice = get_invoice(control_id, invoice_id, connection)?;

    if invoice.is_paid() {
        return Err(Error::InvoicePaid);
    }

    check_account(control_id, account_id, connection)?;

    connection.execute(
        "UPDATE invoice SET paid_on = ?1, paid_from_account_id = ?2 WHERE id = ?3",
        (date, account_id, invoice_id),
    )?;

    Ok(())
}

/// Undo the payment of an invoice so that its transactions can change again.
pub fn reopen_invoice(
    control_id: ControlId,
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<(), Error> {
    get_invoice(control_id, invoice_id, connection)?;

    connection.execute(
        "UPDATE invoice SET paid_on = NULL, paid_from_account_id = NULL WHERE id = ?1",
        (invoice_id,),
    )?;

    // A reopened invoice may have lost all of its transactions while it was paid.
    recalculate_invoice_total(invoice_id, connection)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{
            get_test_connection, insert_test_account, insert_test_card, insert_test_control,
        },
        transaction::{
            PaymentSource, Transaction, TransactionKind, create_transaction, delete_transaction,
        },
    };

    use super::{get_invoice, get_invoices, get_or_create_invoice, pay_invoice, reopen_invoice};

    #[test]
    fn get_or_create_is_idempotent_and_sets_dates() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let card = insert_test_card(control.id, account.id, 25, 5, &connection);
        let month = "2025-04".parse().unwrap();

        let first = get_or_create_invoice(&card, month, &connection).unwrap();
        let second = get_or_create_invoice(&card, month, &connection).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.closing_date, date!(2025 - 03 - 25));
        assert_eq!(first.due_date, date!(2025 - 04 - 05));
        assert_eq!(first.total, 0.0);
    }

    #[test]
    fn total_is_signed_sum_of_entries() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let card = insert_test_card(control.id, account.id, 10, 20, &connection);
        let source = PaymentSource::Card(card.id);

        for (kind, amount) in [
            (TransactionKind::Expense, 100.1),
            (TransactionKind::Expense, 0.2),
            (TransactionKind::Income, 30.0),
        ] {
            create_transaction(
                control.id,
                Transaction::build(kind, amount, date!(2025 - 03 - 02), "Shop", source),
                &connection,
            )
            .unwrap();
        }

        let invoices = get_invoices(card.id, &connection).unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].total, 70.3);
        assert_eq!(invoices[0].month, "2025-03".parse().unwrap());
    }

    #[test]
    fn removing_last_entry_deletes_unpaid_invoice() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let card = insert_test_card(control.id, account.id, 10, 20, &connection);
        let transaction = create_transaction(
            control.id,
            Transaction::build(
                TransactionKind::Expense,
                10.0,
                date!(2025 - 03 - 02),
                "Shop",
                PaymentSource::Card(card.id),
            ),
            &connection,
        )
        .unwrap();

        delete_transaction(control.id, transaction.id, &connection).unwrap();

        assert_eq!(get_invoices(card.id, &connection), Ok(vec![]));
    }

    #[test]
    fn pay_twice_fails_and_reopen_allows_changes() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let card = insert_test_card(control.id, account.id, 10, 20, &connection);
        let transaction = create_transaction(
            control.id,
            Transaction::build(
                TransactionKind::Expense,
                10.0,
                date!(2025 - 03 - 02),
                "Shop",
                PaymentSource::Card(card.id),
            ),
            &connection,
        )
        .unwrap();
        let invoice_id = transaction.invoice_id.unwrap();

        pay_invoice(control.id, invoice_id, account.id, date!(2025 - 03 - 20), &connection)
            .unwrap();

        assert_eq!(
            pay_invoice(control.id, invoice_id, account.id, date!(2025 - 03 - 21), &connection),
            Err(Error::InvoicePaid)
        );
        assert_eq!(
            delete_transaction(control.id, transaction.id, &connection),
            Err(Error::InvoicePaid)
        );

        reopen_invoice(control.id, invoice_id, &connection).unwrap();
        let invoice = get_invoice(control.id, invoice_id, &connection).unwrap();
        assert_eq!(invoice.paid_on, None);
        assert_eq!(invoice.paid_from_account_id, None);
        assert_eq!(delete_transaction(control.id, transaction.id, &connection), Ok(()));
    }

    #[test]
    fn cannot_pay_invoice_of_other_control() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let (_, other) = insert_test_control(&connection);
        let account = insert_test_account(other.id, &connection);
        let card = insert_test_card(other.id, account.id, 10, 20, &connection);
        let invoice =
            get_or_create_invoice(&card, "2025-03".parse().unwrap(), &connection).unwrap();

        assert_eq!(
            pay_invoice(control.id, invoice.id, account.id, date!(2025 - 03 - 20), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn paying_from_account_of_other_control_fails() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let (_, other) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let other_account = insert_test_account(other.id, &connection);
        let card = insert_test_card(control.id, account.id, 10, 20, &connection);
        let invoice =
            get_or_create_invoice(&card, "2025-03".parse().unwrap(), &connection).unwrap();

        assert_eq!(
            pay_invoice(
                control.id,
                invoice.id,
                other_account.id,
                date!(2025 - 03 - 20),
                &connection
            ),
            Err(Error::InvalidAccount)
        );
    }
}
