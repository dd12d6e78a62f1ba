//! Turns provisioned transactions into ledger entries, month by month.

use rusqlite::Connection;

use crate::{
    Error,
    card::get_card,
    control::ControlId,
    invoice::{InvoiceId, get_or_create_invoice, recalculate_invoice_total},
    month::YearMonth,
    provisioned::{ProvisionedTransaction, get_all_provisioned, set_generated_through},
    transaction::{
        PaymentSource,
        core::{NewEntry, insert_entry},
    },
};

/// Generate the ledger entries of every provisioned transaction of the
/// control up to and including `through`.
///
/// Generation is idempotent: each plan remembers the last month it generated
/// and at most one entry exists per plan and month. Returns the number of
/// entries created.
///
/// # Errors
/// Returns [Error::InvoicePaid] if a card entry would land in an invoice that
/// has already been paid. Nothing is generated in that case.
pub fn generate_through(
    control_id: ControlId,
    through: YearMonth,
    connection: &Connection,
) -> Result<usize, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut created = 0;

    for plan in get_all_provisioned(control_id, &sql_transaction)? {
        created += generate_plan_through(&plan, through, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    if created > 0 {
        tracing::info!("generated {created} entries for control {control_id} through {through}");
    }

    Ok(created)
}

fn entry_exists(
    plan: &ProvisionedTransaction,
    month: YearMonth,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (
                SELECT 1 FROM \"transaction\" WHERE provisioned_id = ?1 AND month = ?2
            )",
            (plan.id, month),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Generate the pending entries of a single plan up to `through`.
///
/// Must be called inside an SQL transaction. The n-th card entry of a plan
/// is billed to the invoice n - 1 months after the invoice of the first
/// occurrence, so installments never share an invoice even when day
/// clamping would put two of them in the same billing cycle.
pub(crate) fn generate_plan_through(
    plan: &ProvisionedTransaction,
    through: YearMonth,
    connection: &Connection,
) -> Result<usize, Error> {
    let occurrences = plan.pending_occurrences(through);
    let Some(last_month) = occurrences.last().map(|occurrence| occurrence.month) else {
        return Ok(0);
    };

    let card = match plan.source {
        PaymentSource::Card(card_id) => Some(get_card(plan.control_id, card_id, connection)?),
        PaymentSource::Account(_) => None,
    };
    let first_invoice_month = card
        .as_ref()
        .map(|card| card.invoice_month_for_purchase(plan.first_occurrence_date()));

    let mut touched_invoices: Vec<InvoiceId> = Vec::new();
    let mut created = 0;

    for occurrence in occurrences {
        if entry_exists(plan, occurrence.month, connection)? {
            continue;
        }

        let invoice_id = match (&card, first_invoice_month) {
            (Some(card), Some(first_invoice_month)) => {
                let offset = occurrence.month.months_since(plan.start_month);
                let invoice =
                    get_or_create_invoice(card, first_invoice_month.add_months(offset), connection)?;

                if invoice.is_paid() {
                    return Err(Error::InvoicePaid);
                }

                if !touched_invoices.contains(&invoice.id) {
                    touched_invoices.push(invoice.id);
                }

                Some(invoice.id)
            }
            _ => None,
        };

        let inserted = insert_entry(
            plan.control_id,
            &NewEntry {
                description: &plan.description,
                amount: plan.amount,
                kind: plan.kind,
                date: occurrence.date,
                month: occurrence.month,
                source: plan.source,
                category_id: plan.category_id,
                classification_id: plan.classification_id,
                provisioned_id: Some(plan.id),
                installment: occurrence.installment,
                invoice_id,
            },
            connection,
        )?;

        if inserted.is_some() {
            created += 1;
        }
    }

    for invoice_id in touched_invoices {
        recalculate_invoice_total(invoice_id, connection)?;
    }

    set_generated_through(plan.id, last_month, connection)?;

    Ok(created)
}
