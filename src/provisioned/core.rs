//! Provisioned transactions: plans for recurring monthly entries and
//! installment purchases that generate ledger entries month by month.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    category::{CategoryId, check_category},
    classification::{ClassificationId, check_classification},
    control::ControlId,
    database_id::{DatabaseId, RowsAffected},
    invoice::{InvoiceId, recalculate_invoice_total},
    money::validate_amount,
    month::YearMonth,
    transaction::{Installment, PaymentSource, TransactionKind, check_references},
};

pub type ProvisionedId = DatabaseId;

/// The largest number of installments a purchase can be split into.
pub const MAX_INSTALLMENTS: u32 = 360;

/// The month of the last of `count` monthly installments starting in `start_month`.
///
/// # Errors
/// Returns [Error::InvalidInstallmentCount] if `count` is zero, larger than
/// [MAX_INSTALLMENTS], or the last installment would fall after the year 9999.
pub fn last_installment_month(start_month: YearMonth, count: u32) -> Result<YearMonth, Error> {
    if count == 0 || count > MAX_INSTALLMENTS {
        return Err(Error::InvalidInstallmentCount);
    }

    let offset = i32::try_from(count - 1).map_err(|_| Error::InvalidInstallmentCount)?;
    let last_month = start_month.add_months(offset);

    if last_month.year() > 9999 {
        return Err(Error::InvalidInstallmentCount);
    }

    Ok(last_month)
}

/// How often a provisioned transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Every month from the start month, until `end_month` if given.
    Monthly { end_month: Option<YearMonth> },
    /// A purchase split into `count` monthly installments.
    Installments { count: u32 },
}

/// A plan that generates a ledger entry every month.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionedTransaction {
    pub id: ProvisionedId,
    pub control_id: ControlId,
    pub description: String,
    /// The amount of each generated entry.
    pub amount: f64,
    pub kind: TransactionKind,
    pub source: PaymentSource,
    pub category_id: Option<CategoryId>,
    pub classification_id: Option<ClassificationId>,
    pub start_month: YearMonth,
    /// Clamped to the length of each month.
    pub day_of_month: u8,
    pub recurrence: Recurrence,
    /// The last month entries were generated for.
    pub generated_through: Option<YearMonth>,
}

/// A month in which a plan produces an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub month: YearMonth,
    pub date: Date,
    pub installment: Option<Installment>,
}

impl ProvisionedTransaction {
    /// The last month with an occurrence, or `None` for open-ended plans.
    pub fn last_month(&self) -> Option<YearMonth> {
        match self.recurrence {
            Recurrence::Monthly { end_month } => end_month,
            Recurrence::Installments { count } => {
                // Stored counts are validated on creation, so the clamp never changes them.
                let count = count.clamp(1, MAX_INSTALLMENTS);
                Some(self.start_month.add_months(count as i32 - 1))
            }
        }
    }

    pub fn first_occurrence_date(&self) -> Date {
        self.start_month.day(self.day_of_month)
    }

    /// The occurrences after [Self::generated_through] up to and including
    /// `through`, oldest first.
    pub fn pending_occurrences(&self, through: YearMonth) -> Vec<Occurrence> {
        let from = match self.generated_through {
            Some(generated_through) => generated_through.next().max(self.start_month),
            None => self.start_month,
        };
        let to = match self.last_month() {
            Some(last_month) => last_month.min(through),
            None => through,
        };

        YearMonth::range_inclusive(from, to)
            .map(|month| Occurrence {
                month,
                date: month.day(self.day_of_month),
                installment: match self.recurrence {
                    Recurrence::Installments { count } => Some(Installment {
                        number: month.months_since(self.start_month) as u32 + 1,
                        total: count,
                    }),
                    Recurrence::Monthly { .. } => None,
                },
            })
            .collect()
    }
}

/// The data needed to create a provisioned transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProvisioned {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub source: PaymentSource,
    pub category_id: Option<CategoryId>,
    pub classification_id: Option<ClassificationId>,
    pub start_month: YearMonth,
    pub day_of_month: u8,
    pub recurrence: Recurrence,
}

/// The fields of a provisioned transaction that can change after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionedUpdate {
    pub description: String,
    pub amount: f64,
    pub category_id: Option<CategoryId>,
    pub classification_id: Option<ClassificationId>,
    /// Ignored for installment plans.
    pub end_month: Option<YearMonth>,
    /// Also rewrite the unpaid generated entries from this month on.
    pub apply_from: Option<YearMonth>,
}

pub fn create_provisioned_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS provisioned (
            id INTEGER PRIMARY KEY,
            control_id INTEGER NOT NULL REFERENCES control(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL,
            account_id INTEGER REFERENCES account(id),
            card_id INTEGER REFERENCES card(id),
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            classification_id INTEGER REFERENCES classification(id) ON DELETE SET NULL,
            start_month TEXT NOT NULL,
            day_of_month INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
            end_month TEXT,
            installment_count INTEGER,
            generated_through TEXT,
            CHECK ((account_id IS NULL) != (card_id IS NULL))
        )",
        (),
    )?;

    Ok(())
}

const SELECT_PROVISIONED: &str = "SELECT id, control_id, description, amount, kind,
    account_id, card_id, category_id, classification_id, start_month, day_of_month,
    end_month, installment_count, generated_through
    FROM provisioned";

fn map_provisioned_row(row: &Row) -> Result<ProvisionedTransaction, rusqlite::Error> {
    let installment_count: Option<u32> = row.get(12)?;
    let recurrence = match installment_count {
        Some(count) => Recurrence::Installments { count },
        None => Recurrence::Monthly {
            end_month: row.get(11)?,
        },
    };

    Ok(ProvisionedTransaction {
        id: row.get(0)?,
        control_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        kind: row.get(4)?,
        source: PaymentSource::from_row(row, 5)?,
        category_id: row.get(7)?,
        classification_id: row.get(8)?,
        start_month: row.get(9)?,
        day_of_month: row.get(10)?,
        recurrence,
        generated_through: row.get(13)?,
    })
}

/// Create a provisioned transaction. No entries are generated until
/// [crate::transaction::generate_through] runs.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::InvalidDay] if the day of month is not in 1..=31,
/// - [Error::InvalidInstallmentCount] for zero installments or more than
///   [MAX_INSTALLMENTS],
/// - [Error::InvalidMonthRange] if the end month is before the start month,
/// - or an error for a source, category or classification outside the control.
pub fn create_provisioned(
    control_id: ControlId,
    new: &NewProvisioned,
    connection: &Connection,
) -> Result<ProvisionedTransaction, Error> {
    let amount = validate_amount(new.amount)?;

    if !(1..=31).contains(&new.day_of_month) {
        return Err(Error::InvalidDay(new.day_of_month));
    }

    let (end_month, installment_count) = match new.recurrence {
        Recurrence::Installments { count } => {
            last_installment_month(new.start_month, count)?;
            (None, Some(count))
        }
        Recurrence::Monthly {
            end_month: Some(end_month),
        } if end_month < new.start_month => return Err(Error::InvalidMonthRange),
        Recurrence::Monthly { end_month } => (end_month, None),
    };

    check_references(
        control_id,
        new.source,
        new.category_id,
        new.classification_id,
        connection,
    )?;

    let id: ProvisionedId = connection.query_row(
        "INSERT INTO provisioned (control_id, description, amount, kind, account_id, card_id,
            category_id, classification_id, start_month, day_of_month, end_month,
            installment_count)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        RETURNING id",
        rusqlite::params![
            control_id,
            new.description.trim(),
            amount,
            new.kind,
            new.source.account_id(),
            new.source.card_id(),
            new.category_id,
            new.classification_id,
            new.start_month,
            new.day_of_month,
            end_month,
            installment_count,
        ],
        |row| row.get(0),
    )?;

    get_provisioned(control_id, id, connection)
}

pub fn get_provisioned(
    control_id: ControlId,
    id: ProvisionedId,
    connection: &Connection,
) -> Result<ProvisionedTransaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_PROVISIONED} WHERE id = ?1 AND control_id = ?2"
        ))?
        .query_row((id, control_id), map_provisioned_row)
        .map_err(Error::from)
}

/// All the provisioned transactions of a control ordered by description.
pub fn get_all_provisioned(
    control_id: ControlId,
    connection: &Connection,
) -> Result<Vec<ProvisionedTransaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_PROVISIONED} WHERE control_id = ?1 ORDER BY description COLLATE NOCASE, id"
        ))?
        .query_map((control_id,), map_provisioned_row)?
        .map(|plan| plan.map_err(Error::from))
        .collect()
}

pub(crate) fn set_generated_through(
    id: ProvisionedId,
    month: YearMonth,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE provisioned SET generated_through = ?1 WHERE id = ?2",
        (month, id),
    )?;

    Ok(())
}

/// Selects the generated entries that can still change: unpaid account
/// entries and card entries whose invoice is open.
const UNPAID_ENTRY: &str = "((account_id IS NOT NULL AND paid = 0)
    OR (card_id IS NOT NULL AND invoice_id IN (SELECT id FROM invoice WHERE paid_on IS NULL)))";

fn unpaid_entry_invoices(
    id: ProvisionedId,
    from: YearMonth,
    connection: &Connection,
) -> Result<Vec<InvoiceId>, Error> {
    connection
        .prepare(&format!(
            "SELECT DISTINCT invoice_id FROM \"transaction\"
            WHERE provisioned_id = ?1 AND month >= ?2 AND invoice_id IS NOT NULL
            AND {UNPAID_ENTRY}"
        ))?
        .query_map((id, from), |row| row.get(0))?
        .map(|invoice_id| invoice_id.map_err(Error::from))
        .collect()
}

/// Delete the unpaid entries generated by a plan from `from` on.
fn remove_generated_entries(
    id: ProvisionedId,
    from: YearMonth,
    connection: &Connection,
) -> Result<usize, Error> {
    let invoice_ids = unpaid_entry_invoices(id, from, connection)?;

    let removed = connection.execute(
        &format!(
            "DELETE FROM \"transaction\"
            WHERE provisioned_id = ?1 AND month >= ?2 AND {UNPAID_ENTRY}"
        ),
        (id, from),
    )?;

    for invoice_id in invoice_ids {
        recalculate_invoice_total(invoice_id, connection)?;
    }

    Ok(removed)
}

/// Update the editable fields of a provisioned transaction.
///
/// The kind, source, start month, day and number of installments are fixed
/// once a plan exists. Shortening the end month removes the unpaid entries
/// after the new end. With [ProvisionedUpdate::apply_from] the unpaid entries
/// from that month on are rewritten with the new description, amount,
/// category and classification.
///
/// # Errors
/// Returns [Error::NotFound] if the plan is not in the control, or the
/// validation errors of [create_provisioned].
pub fn update_provisioned(
    control_id: ControlId,
    id: ProvisionedId,
    update: &ProvisionedUpdate,
    connection: &Connection,
) -> Result<ProvisionedTransaction, Error> {
    let amount = validate_amount(update.amount)?;

    if let Some(category_id) = update.category_id {
        check_category(control_id, category_id, connection)?;
    }

    if let Some(classification_id) = update.classification_id {
        check_classification(control_id, classification_id, connection)?;
    }

    let sql_transaction = connection.unchecked_transaction()?;
    let plan = get_provisioned(control_id, id, &sql_transaction)?;

    let end_month = match plan.recurrence {
        Recurrence::Monthly { .. } => update.end_month,
        Recurrence::Installments { .. } => None,
    };

    if let Some(end_month) = end_month
        && end_month < plan.start_month
    {
        return Err(Error::InvalidMonthRange);
    }

    sql_transaction.execute(
        "UPDATE provisioned
        SET description = ?1, amount = ?2, category_id = ?3, classification_id = ?4,
            end_month = ?5
        WHERE id = ?6",
        rusqlite::params![
            update.description.trim(),
            amount,
            update.category_id,
            update.classification_id,
            end_month,
            id,
        ],
    )?;

    if let Some(end_month) = end_month
        && plan
            .generated_through
            .is_some_and(|generated_through| generated_through > end_month)
    {
        let removed = remove_generated_entries(id, end_month.next(), &sql_transaction)?;
        set_generated_through(id, end_month, &sql_transaction)?;
        tracing::debug!("removed {removed} entries of plan {id} after {end_month}");
    }

    if let Some(apply_from) = update.apply_from {
        let invoice_ids = unpaid_entry_invoices(id, apply_from, &sql_transaction)?;

        sql_transaction.execute(
            &format!(
                "UPDATE \"transaction\"
                SET description = ?1, amount = ?2, category_id = ?3, classification_id = ?4
                WHERE provisioned_id = ?5 AND month >= ?6 AND {UNPAID_ENTRY}"
            ),
            rusqlite::params![
                update.description.trim(),
                amount,
                update.category_id,
                update.classification_id,
                id,
                apply_from,
            ],
        )?;

        for invoice_id in invoice_ids {
            recalculate_invoice_total(invoice_id, &sql_transaction)?;
        }
    }

    sql_transaction.commit()?;

    get_provisioned(control_id, id, connection)
}

/// Delete a provisioned transaction.
///
/// Entries generated before `remove_from` (or all of them if `None`) stay in
/// the ledger as ordinary entries. Unpaid entries from `remove_from` on are
/// deleted.
///
/// # Errors
/// Returns [Error::NotFound] if the plan is not in the control.
pub fn delete_provisioned(
    control_id: ControlId,
    id: ProvisionedId,
    remove_from: Option<YearMonth>,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    if let Some(remove_from) = remove_from {
        get_provisioned(control_id, id, &sql_transaction)?;
        remove_generated_entries(id, remove_from, &sql_transaction)?;
    }

    let rows_affected: RowsAffected = sql_transaction.execute(
        "DELETE FROM provisioned WHERE id = ?1 AND control_id = ?2",
        (id, control_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    sql_transaction.commit()?;

    Ok(())
}


#[cfg(test)]
mod database_tests {
    use time::macros::date;

    use crate::{
        Error,
        invoice::{get_invoices, pay_invoice},
        month::YearMonth,
        test_utils::{
            get_test_connection, insert_test_account, insert_test_card, insert_test_control,
        },
        transaction::{
            PaymentSource, TransactionKind, generate_through, get_account_transactions_for_month,
            get_invoice_transactions, get_transaction, set_transaction_paid,
        },
    };

    use super::{
        MAX_INSTALLMENTS, NewProvisioned, ProvisionedUpdate, Recurrence, create_provisioned,
        delete_provisioned, get_all_provisioned, get_provisioned, update_provisioned,
    };

    fn month(text: &str) -> YearMonth {
        text.parse().unwrap()
    }

    fn monthly(source: PaymentSource) -> NewProvisioned {
        NewProvisioned {
            description: "Internet".to_owned(),
            amount: 80.0,
            kind: TransactionKind::Expense,
            source,
            category_id: None,
            classification_id: None,
            start_month: month("2025-01"),
            day_of_month: 10,
            recurrence: Recurrence::Monthly { end_month: None },
        }
    }

    fn update(amount: f64) -> ProvisionedUpdate {
        ProvisionedUpdate {
            description: "Fibre".to_owned(),
            amount,
            category_id: None,
            classification_id: None,
            end_month: None,
            apply_from: None,
        }
    }

    #[test]
    fn create_validates_input() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let base = monthly(PaymentSource::Account(account.id));

        assert_eq!(
            create_provisioned(
                control.id,
                &NewProvisioned {
                    day_of_month: 0,
                    ..base.clone()
                },
                &connection
            ),
            Err(Error::InvalidDay(0))
        );
        assert_eq!(
            create_provisioned(
                control.id,
                &NewProvisioned {
                    recurrence: Recurrence::Installments { count: 0 },
                    ..base.clone()
                },
                &connection
            ),
            Err(Error::InvalidInstallmentCount)
        );
        assert_eq!(
            create_provisioned(
                control.id,
                &NewProvisioned {
                    recurrence: Recurrence::Installments {
                        count: 2_147_483_648
                    },
                    ..base.clone()
                },
                &connection
            ),
            Err(Error::InvalidInstallmentCount)
        );
        assert_eq!(
            create_provisioned(
                control.id,
                &NewProvisioned {
                    recurrence: Recurrence::Installments {
                        count: MAX_INSTALLMENTS + 1
                    },
                    ..base.clone()
                },
                &connection
            ),
            Err(Error::InvalidInstallmentCount)
        );
        assert_eq!(
            create_provisioned(
                control.id,
                &NewProvisioned {
                    recurrence: Recurrence::Monthly {
                        end_month: Some(month("2024-12"))
                    },
                    ..base.clone()
                },
                &connection
            ),
            Err(Error::InvalidMonthRange)
        );
        assert_eq!(
            create_provisioned(
                control.id,
                &NewProvisioned {
                    source: PaymentSource::Account(999),
                    ..base.clone()
                },
                &connection
            ),
            Err(Error::InvalidAccount)
        );
        assert_eq!(get_all_provisioned(control.id, &connection), Ok(vec![]));
    }

    #[test]
    fn apply_from_rewrites_unpaid_entries_only() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let plan = create_provisioned(
            control.id,
            &monthly(PaymentSource::Account(account.id)),
            &connection,
        )
        .unwrap();
        generate_through(control.id, month("2025-03"), &connection).unwrap();
        let january =
            get_account_transactions_for_month(control.id, month("2025-01"), &connection).unwrap();
        let february =
            get_account_transactions_for_month(control.id, month("2025-02"), &connection).unwrap();
        set_transaction_paid(control.id, february[0].id, true, &connection).unwrap();

        let updated = update_provisioned(
            control.id,
            plan.id,
            &ProvisionedUpdate {
                apply_from: Some(month("2025-02")),
                ..update(95.0)
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.amount, 95.0);
        assert_eq!(updated.description, "Fibre");
        let amount_of = |id| get_transaction(control.id, id, &connection).unwrap().amount;
        assert_eq!(amount_of(january[0].id), 80.0);
        assert_eq!(amount_of(february[0].id), 80.0);
        let march =
            get_account_transactions_for_month(control.id, month("2025-03"), &connection).unwrap();
        assert_eq!(march[0].amount, 95.0);
        assert_eq!(march[0].description, "Fibre");
    }

    #[test]
    fn apply_from_updates_invoice_totals() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let card = insert_test_card(control.id, account.id, 5, 15, &connection);
        let plan =
            create_provisioned(control.id, &monthly(PaymentSource::Card(card.id)), &connection)
                .unwrap();
        generate_through(control.id, month("2025-02"), &connection).unwrap();
        let invoices = get_invoices(card.id, &connection).unwrap();
        pay_invoice(control.id, invoices[0].id, account.id, date!(2025 - 02 - 15), &connection)
            .unwrap();

        update_provisioned(
            control.id,
            plan.id,
            &ProvisionedUpdate {
                apply_from: Some(month("2025-01")),
                ..update(100.0)
            },
            &connection,
        )
        .unwrap();

        let invoices = get_invoices(card.id, &connection).unwrap();
        assert_eq!(invoices[0].total, 80.0);
        assert_eq!(invoices[1].total, 100.0);
    }

    #[test]
    fn shortening_end_month_removes_later_unpaid_entries() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let plan = create_provisioned(
            control.id,
            &monthly(PaymentSource::Account(account.id)),
            &connection,
        )
        .unwrap();
        generate_through(control.id, month("2025-06"), &connection).unwrap();

        let updated = update_provisioned(
            control.id,
            plan.id,
            &ProvisionedUpdate {
                end_month: Some(month("2025-03")),
                ..update(80.0)
            },
            &connection,
        )
        .unwrap();

        assert_eq!(
            updated.recurrence,
            Recurrence::Monthly {
                end_month: Some(month("2025-03"))
            }
        );
        assert_eq!(updated.generated_through, Some(month("2025-03")));
        for (text, expected) in [("2025-03", 1), ("2025-04", 0), ("2025-06", 0)] {
            let entries =
                get_account_transactions_for_month(control.id, month(text), &connection).unwrap();
            assert_eq!(entries.len(), expected, "month {text}");
        }
        assert_eq!(generate_through(control.id, month("2025-12"), &connection), Ok(0));
    }

    #[test]
    fn end_month_before_start_is_rejected() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let plan = create_provisioned(
            control.id,
            &monthly(PaymentSource::Account(account.id)),
            &connection,
        )
        .unwrap();

        assert_eq!(
            update_provisioned(
                control.id,
                plan.id,
                &ProvisionedUpdate {
                    end_month: Some(month("2024-06")),
                    ..update(80.0)
                },
                &connection,
            ),
            Err(Error::InvalidMonthRange)
        );
    }

    #[test]
    fn delete_keeps_or_removes_entries() {
        let connection = get_test_connection();
        let (_, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let card = insert_test_card(control.id, account.id, 5, 15, &connection);
        let kept =
            create_provisioned(control.id, &monthly(PaymentSource::Card(card.id)), &connection)
                .unwrap();
        let removed = create_provisioned(
            control.id,
            &monthly(PaymentSource::Account(account.id)),
            &connection,
        )
        .unwrap();
        generate_through(control.id, month("2025-03"), &connection).unwrap();

        delete_provisioned(control.id, kept.id, None, &connection).unwrap();
        delete_provisioned(control.id, removed.id, Some(month("2025-02")), &connection).unwrap();

        assert_eq!(get_all_provisioned(control.id, &connection), Ok(vec![]));
        let invoices = get_invoices(card.id, &connection).unwrap();
        assert_eq!(invoices.len(), 3);
        let entries = get_invoice_transactions(invoices[0].id, &connection).unwrap();
        assert_eq!(entries[0].provisioned_id, None);
        assert_eq!(
            get_account_transactions_for_month(control.id, month("2025-01"), &connection)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            get_account_transactions_for_month(control.id, month("2025-02"), &connection)
                .unwrap()
                .len(),
            0
        );
        assert_eq!(
            delete_provisioned(control.id, kept.id, None, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            get_provisioned(control.id, kept.id, &connection),
            Err(Error::NotFound)
        );
    }
}
