//! Displays the invoices of a card with their entries, and lets editors pay
//! or reopen them.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{Account, get_accounts},
    app_state::DbState,
    auth::UserID,
    card::{Card, CardId, get_card},
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency, link, page_header,
    },
    invoice::core::{Invoice, get_invoices},
    navigation::NavBar,
    transaction::{Transaction, get_invoice_transactions},
};

struct InvoiceSection {
    invoice: Invoice,
    entries: Vec<Transaction>,
}

fn pay_form(
    control_id: ControlId,
    card: &Card,
    invoice: &Invoice,
    accounts: &[Account],
) -> Markup {
    let pay_url = format_endpoint(endpoints::PAY_INVOICE, &[&control_id, &invoice.id]);
    let account_input_id = format!("account-{}", invoice.id);
    let date_input_id = format!("date-{}", invoice.id);

    html!(
        form
            hx-post=(pay_url)
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for=(account_input_id) class=(FORM_LABEL_STYLE) { "Paid from" }

                select
                    id=(account_input_id)
                    name="account_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[account.id == card.payment_account_id]
                        {
                            (account.name)
                        }
                    }
                }
            }

            div
            {
                label for=(date_input_id) class=(FORM_LABEL_STYLE) { "Paid on" }

                input
                    id=(date_input_id)
                    name="date"
                    type="date"
                    value=(invoice.due_date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Pay Invoice" }
            }
        }
    )
}

fn entries_table(entries: &[Transaction]) -> Markup {
    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                    th scope="col" class="px-6 py-3 text-right" { "Amount" }
                }
            }

            tbody
            {
                @for entry in entries {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (entry.date) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            (entry.description)
                            @if let Some(installment) = entry.installment {
                                " " span class=(BADGE_STYLE) { (installment) }
                            }
                        }
                        td class="px-6 py-4 text-right tabular-nums"
                        {
                            (format_currency(-entry.signed_amount()))
                        }
                    }
                }
            }
        }
    )
}

fn invoices_view(
    card: &Card,
    sections: &[InvoiceSection],
    accounts: &[Account],
    can_edit: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVOICES_VIEW, card.control_id).into_html();
    let cards_url = control_endpoint(endpoints::CARDS_VIEW, card.control_id);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                (page_header(&format!("{} Invoices", card.name), Some((&cards_url, "Back to cards"))))

                @if sections.is_empty() {
                    p { "This card has no invoices yet." }
                }

                @for section in sections {
                    @let invoice = &section.invoice;

                    article
                        id={ "invoice-" (invoice.id) }
                        class="space-y-3 rounded border border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    {
                        header class="flex flex-wrap items-baseline justify-between gap-2"
                        {
                            h2 class="text-lg font-semibold" { (invoice.month.label()) }

                            div class="text-sm text-gray-500 dark:text-gray-400"
                            {
                                "Closes " (invoice.closing_date) ", due " (invoice.due_date)
                            }

                            div class="text-lg font-semibold tabular-nums"
                            {
                                (format_currency(invoice.total))
                            }
                        }

                        (entries_table(&section.entries))

                        @match invoice.paid_on {
                            Some(paid_on) => {
                                div class="flex flex-wrap items-center gap-4"
                                {
                                    span class=(BADGE_STYLE) { "Paid on " (paid_on) }

                                    @if can_edit {
                                        button
                                            type="button"
                                            hx-post=(format_endpoint(endpoints::REOPEN_INVOICE, &[&card.control_id, &invoice.id]))
                                            hx-confirm="Reopen this invoice? Its payment will be undone."
                                            hx-target-error="#alert-container"
                                            class=(BUTTON_SECONDARY_STYLE)
                                        {
                                            "Reopen"
                                        }
                                    }
                                }
                            }
                            None => {
                                @if can_edit && !accounts.is_empty() {
                                    (pay_form(card.control_id, card, invoice, accounts))
                                } @else {
                                    span class=(BADGE_STYLE) { "Open" }
                                }
                            }
                        }
                    }
                }

                p { (link(&cards_url, "All cards")) }
            }
        }
    );

    base(&format!("{} Invoices", card.name), &[], &content)
}

/// Renders the invoices of a card, newest first.
pub async fn get_invoices_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, card_id)): Path<(ControlId, CardId)>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let card = get_card(control_id, card_id, &connection)?;
    let accounts = get_accounts(control_id, &connection)?;

    let sections = get_invoices(card.id, &connection)?
        .into_iter()
        .rev()
        .map(|invoice| {
            Ok(InvoiceSection {
                entries: get_invoice_transactions(invoice.id, &connection)?,
                invoice,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(invoices_view(&card, &sections, &accounts, role >= Role::Editor).into_response())
}
