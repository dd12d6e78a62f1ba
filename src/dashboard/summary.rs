//! Month totals for the dashboard.
//!
//! Account entries count in their ledger month. Card entries count through
//! their invoice, in the month the invoice is due.

use rusqlite::Connection;

use crate::{Error, control::ControlId, money::round_to_cents, month::YearMonth};

/// The label for expenses without a category.
pub(super) const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// The expenses of one category in a month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub amount: f64,
}

/// The income, expenses and result of a month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub income: f64,
    /// The part of the income already marked as paid.
    pub income_received: f64,
    /// Account expenses plus the invoices due in the month.
    pub expenses: f64,
    /// Paid account expenses plus paid invoices.
    pub expenses_paid: f64,
    /// Expenses per category, largest first.
    pub categories: Vec<CategoryTotal>,
}

impl MonthSummary {
    pub fn result(&self) -> f64 {
        round_to_cents(self.income - self.expenses)
    }

    pub fn income_pending(&self) -> f64 {
        round_to_cents(self.income - self.income_received)
    }

    pub fn expenses_pending(&self) -> f64 {
        round_to_cents(self.expenses - self.expenses_paid)
    }
}

/// Calculate the totals of `month` for the control.
pub fn month_summary(
    control_id: ControlId,
    month: YearMonth,
    connection: &Connection,
) -> Result<MonthSummary, Error> {
    let (income, income_received, account_expenses, account_expenses_paid): (f64, f64, f64, f64) =
        connection.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN kind = 'income' AND paid = 1 THEN amount END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' AND paid = 1 THEN amount END), 0)
            FROM \"transaction\"
            WHERE control_id = ?1 AND month = ?2 AND account_id IS NOT NULL",
            (control_id, month),
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

    let (invoices, invoices_paid): (f64, f64) = connection.query_row(
        "SELECT
            COALESCE(SUM(invoice.total), 0),
            COALESCE(SUM(CASE WHEN invoice.paid_on IS NOT NULL THEN invoice.total END), 0)
        FROM invoice
        INNER JOIN card ON card.id = invoice.card_id
        WHERE card.control_id = ?1 AND invoice.month = ?2",
        (control_id, month),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(MonthSummary {
        income: round_to_cents(income),
        income_received: round_to_cents(income_received),
        expenses: round_to_cents(account_expenses + invoices),
        expenses_paid: round_to_cents(account_expenses_paid + invoices_paid),
        categories: category_totals(control_id, month, connection)?,
    })
}

fn category_totals(
    control_id: ControlId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT category.name, SUM(entry.amount) AS total
            FROM \"transaction\" AS entry
            LEFT JOIN category ON category.id = entry.category_id
            LEFT JOIN invoice ON invoice.id = entry.invoice_id
            WHERE entry.control_id = ?1
                AND entry.kind = 'expense'
                AND ((entry.account_id IS NOT NULL AND entry.month = ?2)
                    OR (entry.card_id IS NOT NULL AND invoice.month = ?2))
            GROUP BY entry.category_id
            ORDER BY total DESC, category.name COLLATE NOCASE",
        )?
        .query_map((control_id, month), |row| {
            let name: Option<String> = row.get(0)?;
            let amount: f64 = row.get(1)?;

            Ok(CategoryTotal {
                name: name.unwrap_or_else(|| UNCATEGORISED_LABEL.to_owned()),
                amount: round_to_cents(amount),
            })
        })?
        .map(|total| total.map_err(Error::from))
        .collect()
}
