//! Account balances, the money set aside in savings boxes and the projected
//! balance at the end of a month.

use rusqlite::Connection;

use crate::{
    Error,
    account::core::{Account, AccountId, get_accounts},
    control::ControlId,
    money::round_to_cents,
    month::YearMonth,
};

/// The current and projected figures of one account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub account: Account,
    /// Opening balance plus everything paid into or out of the account.
    pub balance: f64,
    /// The sum of the balances of the account's savings boxes.
    pub boxes: f64,
    /// The balance minus the money in savings boxes.
    pub available: f64,
    /// The balance once everything still unpaid up to the month is settled.
    pub projected: f64,
}

/// The current balance of an account.
///
/// That is the opening balance, plus paid incomes, minus paid expenses, plus
/// transfers in, minus transfers out, minus the invoices paid from the account.
pub fn account_balance(account_id: AccountId, connection: &Connection) -> Result<f64, Error> {
    let balance: f64 = connection.query_row(
        "SELECT account.opening_balance
            + (SELECT COALESCE(SUM(CASE kind WHEN 'income' THEN amount ELSE -amount END), 0)
                FROM \"transaction\" WHERE account_id = ?1 AND paid = 1)
            + (SELECT COALESCE(SUM(amount), 0) FROM transfer WHERE to_account_id = ?1)
            - (SELECT COALESCE(SUM(amount), 0) FROM transfer WHERE from_account_id = ?1)
            - (SELECT COALESCE(SUM(total), 0) FROM invoice WHERE paid_from_account_id = ?1)
        FROM account WHERE account.id = ?1",
        (account_id,),
        |row| row.get(0),
    )?;

    Ok(round_to_cents(balance))
}

/// The money held in the savings boxes of an account.
pub fn boxes_balance(account_id: AccountId, connection: &Connection) -> Result<f64, Error> {
    let balance: f64 = connection.query_row(
        "SELECT COALESCE(SUM(box_movement.amount), 0)
        FROM box_movement
        INNER JOIN savings_box ON savings_box.id = box_movement.box_id
        WHERE savings_box.account_id = ?1",
        (account_id,),
        |row| row.get(0),
    )?;

    Ok(round_to_cents(balance))
}

/// The part of the balance that is not set aside in savings boxes.
pub fn available_balance(account_id: AccountId, connection: &Connection) -> Result<f64, Error> {
    let balance = account_balance(account_id, connection)?;
    let boxes = boxes_balance(account_id, connection)?;

    Ok(round_to_cents(balance - boxes))
}

/// The balance the account will have once all unpaid entries with a ledger
/// month up to `month` and all unpaid invoices due up to `month` of the cards
/// paid from the account are settled.
pub fn projected_balance(
    account_id: AccountId,
    month: YearMonth,
    connection: &Connection,
) -> Result<f64, Error> {
    let balance = account_balance(account_id, connection)?;

    let pending: f64 = connection.query_row(
        "SELECT
            (SELECT COALESCE(SUM(CASE kind WHEN 'income' THEN amount ELSE -amount END), 0)
                FROM \"transaction\"
                WHERE account_id = ?1 AND paid = 0 AND month <= ?2)
            - (SELECT COALESCE(SUM(invoice.total), 0)
                FROM invoice
                INNER JOIN card ON card.id = invoice.card_id
                WHERE card.payment_account_id = ?1
                    AND invoice.paid_on IS NULL
                    AND invoice.month <= ?2)",
        (account_id, month),
        |row| row.get(0),
    )?;

    Ok(round_to_cents(balance + pending))
}

/// The balances of every account in a control, projected to the end of `month`.
pub fn get_account_balances(
    control_id: ControlId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<AccountBalance>, Error> {
    get_accounts(control_id, connection)?
        .into_iter()
        .map(|account| {
            let balance = account_balance(account.id, connection)?;
            let boxes = boxes_balance(account.id, connection)?;
            let projected = projected_balance(account.id, month, connection)?;

            Ok(AccountBalance {
                account,
                balance,
                boxes,
                available: round_to_cents(balance - boxes),
                projected,
            })
        })
        .collect()
}
