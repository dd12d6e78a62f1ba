//! Ledger entries: the expenses and incomes of a month, paid from an account
//! or charged to a credit card.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use serde::{Deserialize, Deserializer};
use time::Date;

use crate::{
    Error,
    account::{AccountId, check_account},
    card::{Card, CardId, check_card},
    category::{CategoryId, check_category},
    classification::{ClassificationId, check_classification},
    control::ControlId,
    database_id::DatabaseId,
    invoice::{InvoiceId, get_or_create_invoice, is_invoice_paid, recalculate_invoice_total},
    money::validate_amount,
    month::YearMonth,
    provisioned::{
        NewProvisioned, ProvisionedId, Recurrence, create_provisioned, last_installment_month,
    },
    transaction::generation::generate_plan_through,
};

pub type TransactionId = DatabaseId;

/// Whether money goes out (expense) or comes in (income).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Expense, TransactionKind::Income];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expense",
            TransactionKind::Income => "Income",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            other => Err(format!("unknown transaction kind \"{other}\"")),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// Where the money of a transaction comes from or goes to.
///
/// The text form, used in HTML forms, is `account:<id>` or `card:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentSource {
    Account(AccountId),
    Card(CardId),
}

impl PaymentSource {
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            PaymentSource::Account(id) => Some(*id),
            PaymentSource::Card(_) => None,
        }
    }

    pub fn card_id(&self) -> Option<CardId> {
        match self {
            PaymentSource::Account(_) => None,
            PaymentSource::Card(id) => Some(*id),
        }
    }

    /// Read the source from the `account_id` and `card_id` columns at `index`
    /// and `index + 1`.
    pub(crate) fn from_row(row: &Row, index: usize) -> Result<Self, rusqlite::Error> {
        let account_id: Option<AccountId> = row.get(index)?;
        let card_id: Option<CardId> = row.get(index + 1)?;

        match (account_id, card_id) {
            (Some(account_id), _) => Ok(PaymentSource::Account(account_id)),
            (None, Some(card_id)) => Ok(PaymentSource::Card(card_id)),
            (None, None) => Err(rusqlite::Error::InvalidColumnType(
                index,
                "account_id".to_owned(),
                Type::Null,
            )),
        }
    }
}

impl Display for PaymentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentSource::Account(id) => write!(f, "account:{id}"),
            PaymentSource::Card(id) => write!(f, "card:{id}"),
        }
    }
}

impl FromStr for PaymentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("\"{s}\" is not a valid payment source");
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        let id = id.parse().map_err(|_| invalid())?;

        match kind {
            "account" => Ok(PaymentSource::Account(id)),
            "card" => Ok(PaymentSource::Card(id)),
            _ => Err(invalid()),
        }
    }
}

impl<'de> Deserialize<'de> for PaymentSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// The position of an entry in an installment plan, e.g. 2 of 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installment {
    pub number: u32,
    pub total: u32,
}

impl Display for Installment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.number, self.total)
    }
}

/// An expense or income in the ledger of a month.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub control_id: ControlId,
    pub description: String,
    /// Always positive, [Transaction::kind] decides the direction.
    pub amount: f64,
    pub kind: TransactionKind,
    pub date: Date,
    /// The ledger month of the entry. Generated entries belong to the month
    /// of their occurrence, manual entries to the month of their date.
    pub month: YearMonth,
    pub source: PaymentSource,
    pub category_id: Option<CategoryId>,
    pub classification_id: Option<ClassificationId>,
    /// The plan that generated this entry.
    pub provisioned_id: Option<ProvisionedId>,
    pub installment: Option<Installment>,
    /// The invoice of a card entry. Account entries have no invoice.
    pub invoice_id: Option<InvoiceId>,
    /// For card entries this is whether their invoice has been paid.
    pub paid: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionKind,
        amount: f64,
        date: Date,
        description: &str,
        source: PaymentSource,
    ) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            date,
            description: description.to_owned(),
            source,
            category_id: None,
            classification_id: None,
            installments: 1,
        }
    }

    /// The amount with the sign of its kind: negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Expense => -self.amount,
            TransactionKind::Income => self.amount,
        }
    }
}

/// A builder for creating and editing [Transaction]s.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub kind: TransactionKind,
    /// The amount of a single entry. For installment purchases this is the
    /// amount of each installment.
    pub amount: f64,
    pub date: Date,
    pub description: String,
    pub source: PaymentSource,
    pub category_id: Option<CategoryId>,
    pub classification_id: Option<ClassificationId>,
    /// The number of monthly installments, 1 for a single entry.
    pub installments: u32,
}

impl TransactionBuilder {
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn classification_id(mut self, classification_id: Option<ClassificationId>) -> Self {
        self.classification_id = classification_id;
        self
    }

    pub fn installments(mut self, installments: u32) -> Self {
        self.installments = installments;
        self
    }
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL,
            date TEXT NOT NULL,
            month TEXT NOT NULL,
            account_id INTEGER REFERENCES account(id),
            card_id INTEGER REFERENCES card(id),
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            classification_id INTEGER REFERENCES classification(id) ON DELETE SET NULL,
            provisioned_id INTEGER REFERENCES provisioned(id) ON DELETE SET NULL,
            installment_number INTEGER,
            installment_total INTEGER,
            invoice_id INTEGER REFERENCES invoice(id),
            paid INTEGER NOT NULL DEFAULT 0,
            CHECK ((account_id IS NULL) != (card_id IS NULL))
        )",
        (),
    )?;

    // A plan generates at most one entry per month.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_provisioned_month
        ON \"transaction\"(provisioned_id, month)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_control_month
        ON \"transaction\"(control_id, month)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_invoice ON \"transaction\"(invoice_id)",
        (),
    )?;

    Ok(())
}

const SELECT_TRANSACTION: &str = "SELECT t.id, t.control_id, t.description, t.amount, t.kind,
    t.date, t.month, t.account_id, t.card_id, t.category_id, t.classification_id,
    t.provisioned_id, t.installment_number, t.installment_total, t.invoice_id,
    CASE WHEN t.card_id IS NULL THEN t.paid ELSE invoice.paid_on IS NOT NULL END
    FROM \"transaction\" AS t
    LEFT JOIN invoice ON invoice.id = t.invoice_id";

/// Map a row selected with [SELECT_TRANSACTION] to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let installment_number: Option<u32> = row.get(12)?;
    let installment_total: Option<u32> = row.get(13)?;
    let installment = installment_number
        .zip(installment_total)
        .map(|(number, total)| Installment { number, total });

    Ok(Transaction {
        id: row.get(0)?,
        control_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        kind: row.get(4)?,
        date: row.get(5)?,
        month: row.get(6)?,
        source: PaymentSource::from_row(row, 7)?,
        category_id: row.get(9)?,
        classification_id: row.get(10)?,
        provisioned_id: row.get(11)?,
        installment,
        invoice_id: row.get(14)?,
        paid: row.get::<_, Option<bool>>(15)?.unwrap_or(false),
    })
}

/// Check that the source, category and classification all belong to the
/// control, returning the card when the source is a card.
pub(crate) fn check_references(
    control_id: ControlId,
    source: PaymentSource,
    category_id: Option<CategoryId>,
    classification_id: Option<ClassificationId>,
    connection: &Connection,
) -> Result<Option<Card>, Error> {
    let card = match source {
        PaymentSource::Account(account_id) => {
            check_account(control_id, account_id, connection)?;
            None
        }
        PaymentSource::Card(card_id) => Some(check_card(control_id, card_id, connection)?),
    };

    if let Some(category_id) = category_id {
        check_category(control_id, category_id, connection)?;
    }

    if let Some(classification_id) = classification_id {
        check_classification(control_id, classification_id, connection)?;
    }

    Ok(card)
}

/// A ledger entry ready to be inserted, see [insert_entry].
pub(crate) struct NewEntry<'a> {
    pub description: &'a str,
    pub amount: f64,
    pub kind: TransactionKind,
    pub date: Date,
    pub month: YearMonth,
    pub source: PaymentSource,
    pub category_id: Option<CategoryId>,
    pub classification_id: Option<ClassificationId>,
    pub provisioned_id: Option<ProvisionedId>,
    pub installment: Option<Installment>,
    pub invoice_id: Option<InvoiceId>,
}

/// Insert a ledger entry without validating it or updating its invoice.
///
/// Returns `None` if the plan already has an entry for the month.
pub(crate) fn insert_entry(
    control_id: ControlId,
    entry: &NewEntry<'_>,
    connection: &Connection,
) -> Result<Option<TransactionId>, Error> {
    let id = connection
        .prepare(
            "INSERT INTO \"transaction\" (control_id, description, amount, kind, date, month,
                account_id, card_id, category_id, classification_id, provisioned_id,
                installment_number, installment_total, invoice_id, paid)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0)
            ON CONFLICT (provisioned_id, month) DO NOTHING
            RETURNING id",
        )?
        .query_row(
            rusqlite::params![
                control_id,
                entry.description,
                entry.amount,
                entry.kind,
                entry.date,
                entry.month,
                entry.source.account_id(),
                entry.source.card_id(),
                entry.category_id,
                entry.classification_id,
                entry.provisioned_id,
                entry.installment.map(|installment| installment.number),
                entry.installment.map(|installment| installment.total),
                entry.invoice_id,
            ],
            |row| row.get(0),
        )
        .optional()?;

    Ok(id)
}

/// Create a transaction from a builder.
///
/// With more than one installment an installment plan starting in the month
/// of the date is created and all of its entries are generated at once. The
/// first entry is returned.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::InvalidInstallmentCount] if the number of installments is zero
///   or above [crate::provisioned::MAX_INSTALLMENTS],
/// - [Error::InvalidAccount], [Error::InvalidCard], [Error::InvalidCategory]
///   or [Error::InvalidClassification] for references outside of the control,
/// - [Error::InvoicePaid] if a card entry would land in a paid invoice.
pub fn create_transaction(
    control_id: ControlId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = validate_amount(builder.amount)?;

    let last_month =
        last_installment_month(YearMonth::from_date(builder.date), builder.installments)?;

    let card = check_references(
        control_id,
        builder.source,
        builder.category_id,
        builder.classification_id,
        connection,
    )?;

    let sql_transaction = connection.unchecked_transaction()?;
    let description = builder.description.trim();

    let transaction_id = if builder.installments > 1 {
        let plan = create_provisioned(
            control_id,
            &NewProvisioned {
                description: description.to_owned(),
                amount,
                kind: builder.kind,
                source: builder.source,
                category_id: builder.category_id,
                classification_id: builder.classification_id,
                start_month: YearMonth::from_date(builder.date),
                day_of_month: builder.date.day(),
                recurrence: Recurrence::Installments {
                    count: builder.installments,
                },
            },
            &sql_transaction,
        )?;

        generate_plan_through(&plan, last_month, &sql_transaction)?;

        sql_transaction.query_row(
            "SELECT id FROM \"transaction\" WHERE provisioned_id = ?1 ORDER BY month LIMIT 1",
            (plan.id,),
            |row| row.get(0),
        )?
    } else {
        let invoice = match &card {
            Some(card) => {
                let month = card.invoice_month_for_purchase(builder.date);
                let invoice = get_or_create_invoice(card, month, &sql_transaction)?;

                if invoice.is_paid() {
                    return Err(Error::InvoicePaid);
                }

                Some(invoice)
            }
            None => None,
        };

        let id = insert_entry(
            control_id,
            &NewEntry {
                description,
                amount,
                kind: builder.kind,
                date: builder.date,
                month: YearMonth::from_date(builder.date),
                source: builder.source,
                category_id: builder.category_id,
                classification_id: builder.classification_id,
                provisioned_id: None,
                installment: None,
                invoice_id: invoice.as_ref().map(|invoice| invoice.id),
            },
            &sql_transaction,
        )?
        .ok_or(Error::NotFound)?;

        if let Some(invoice) = invoice {
            recalculate_invoice_total(invoice.id, &sql_transaction)?;
        }

        id
    };

    sql_transaction.commit()?;

    get_transaction(control_id, transaction_id, connection)
}

/// Retrieve a transaction of the control `control_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a transaction in the control.
pub fn get_transaction(
    control_id: ControlId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = ?1 AND t.control_id = ?2"
        ))?
        .query_row((id, control_id), map_transaction_row)
        .map_err(Error::from)
}

/// The account entries of a control in the ledger month `month`.
pub fn get_account_transactions_for_month(
    control_id: ControlId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION}
            WHERE t.control_id = ?1 AND t.month = ?2 AND t.account_id IS NOT NULL
            ORDER BY t.date, t.id"
        ))?
        .query_map((control_id, month), map_transaction_row)?
        .map(|transaction| transaction.map_err(Error::from))
        .collect()
}

/// The card entries billed to an invoice.
pub fn get_invoice_transactions(
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.invoice_id = ?1 ORDER BY t.date, t.id"
        ))?
        .query_map((invoice_id,), map_transaction_row)?
        .map(|transaction| transaction.map_err(Error::from))
        .collect()
}

fn ensure_invoice_unpaid(
    invoice_id: Option<InvoiceId>,
    connection: &Connection,
) -> Result<(), Error> {
    match invoice_id {
        Some(invoice_id) if is_invoice_paid(invoice_id, connection)? => Err(Error::InvoicePaid),
        _ => Ok(()),
    }
}

/// Update a transaction with the fields of `builder`.
///
/// The number of installments in `builder` is ignored. Card entries move to
/// the invoice of their new date or card, and the totals of the old and the
/// new invoice are recalculated. Generated entries keep their ledger month.
///
/// # Errors
/// Returns a:
/// - [Error::UpdateMissingTransaction] if the transaction is not in the control,
/// - [Error::InvoicePaid] if the old or the new invoice has been paid,
/// - or any of the validation errors of [create_transaction].
pub fn update_transaction(
    control_id: ControlId,
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = validate_amount(builder.amount)?;
    let card = check_references(
        control_id,
        builder.source,
        builder.category_id,
        builder.classification_id,
        connection,
    )?;

    let sql_transaction = connection.unchecked_transaction()?;

    let old = get_transaction(control_id, id, &sql_transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;
    ensure_invoice_unpaid(old.invoice_id, &sql_transaction)?;

    let unchanged_billing = old.source == builder.source && old.date == builder.date;

    let invoice_id = match &card {
        None => None,
        Some(_) if unchanged_billing => old.invoice_id,
        Some(card) => {
            let month = card.invoice_month_for_purchase(builder.date);
            let invoice = get_or_create_invoice(card, month, &sql_transaction)?;

            if invoice.is_paid() {
                return Err(Error::InvoicePaid);
            }

            Some(invoice.id)
        }
    };

    let month = if old.provisioned_id.is_some() {
        old.month
    } else {
        YearMonth::from_date(builder.date)
    };
    let paid = old.paid && old.source == builder.source && card.is_none();

    sql_transaction.execute(
        "UPDATE \"transaction\"
        SET description = ?1, amount = ?2, kind = ?3, date = ?4, month = ?5,
            account_id = ?6, card_id = ?7, category_id = ?8, classification_id = ?9,
            invoice_id = ?10, paid = ?11
        WHERE id = ?12",
        rusqlite::params![
            builder.description.trim(),
            amount,
            builder.kind,
            builder.date,
            month,
            builder.source.account_id(),
            builder.source.card_id(),
            builder.category_id,
            builder.classification_id,
            invoice_id,
            paid,
            id,
        ],
    )?;

    if let Some(old_invoice_id) = old.invoice_id {
        recalculate_invoice_total(old_invoice_id, &sql_transaction)?;
    }

    if let Some(new_invoice_id) = invoice_id
        && Some(new_invoice_id) != old.invoice_id
    {
        recalculate_invoice_total(new_invoice_id, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    get_transaction(control_id, id, connection)
}

/// Delete a transaction and update the total of its invoice.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the transaction is not in the
/// control, or [Error::InvoicePaid] if its invoice has been paid.
pub fn delete_transaction(
    control_id: ControlId,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transaction =
        get_transaction(control_id, id, &sql_transaction).map_err(|error| match error {
            Error::NotFound => Error::DeleteMissingTransaction,
            error => error,
        })?;
    ensure_invoice_unpaid(transaction.invoice_id, &sql_transaction)?;

    sql_transaction.execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

    if let Some(invoice_id) = transaction.invoice_id {
        recalculate_invoice_total(invoice_id, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(())
}

/// Mark an account entry as paid or unpaid.
///
/// # Errors
/// Returns [Error::CardTransactionPaid] for card entries, which are paid
/// through their invoice.
pub fn set_transaction_paid(
    control_id: ControlId,
    id: TransactionId,
    paid: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = get_transaction(control_id, id, connection)?;

    if let PaymentSource::Card(_) = transaction.source {
        return Err(Error::CardTransactionPaid);
    }

    connection.execute(
        "UPDATE \"transaction\" SET paid = ?1 WHERE id = ?2",
        (paid, id),
    )?;

    Ok(())
}

/// Flip the paid status of an account entry, returning the new status.
pub fn toggle_transaction_paid(
    control_id: ControlId,
    id: TransactionId,
    connection: &Connection,
) -> Result<bool, Error> {
    let transaction = get_transaction(control_id, id, connection)?;
    let paid = !transaction.paid;

    set_transaction_paid(control_id, id, paid, connection)?;

    Ok(paid)
}
