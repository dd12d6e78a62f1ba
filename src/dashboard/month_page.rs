//! The month view of a control: totals, spending per category, account
//! balances and the entries and invoices of the month.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{AccountBalance, get_account_balances},
    app_state::DbState,
    auth::UserID,
    card::{CardId, get_cards},
    control::{ControlId, Role, authorize},
    dashboard::summary::{MonthSummary, month_summary},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, format_currency,
        link,
    },
    invoice::{Invoice, get_invoices_due_in},
    month::YearMonth,
    navigation::NavBar,
    transaction::{
        Transaction, get_account_transactions_for_month, get_invoice_transactions, paid_toggle,
    },
};

const AMOUNT_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const AMOUNT_RED_STYLE: &str = "text-red-600 dark:text-red-400";

fn amount_style(amount: f64) -> &'static str {
    if amount >= 0.0 {
        AMOUNT_GREEN_STYLE
    } else {
        AMOUNT_RED_STYLE
    }
}

struct MonthData {
    summary: MonthSummary,
    balances: Vec<AccountBalance>,
    entries: Vec<Transaction>,
    invoices: Vec<(Invoice, Vec<Transaction>)>,
    card_names: HashMap<CardId, String>,
}

fn month_navigation(control_id: ControlId, month: YearMonth, can_edit: bool) -> Markup {
    let month_url = |month: YearMonth| format_endpoint(endpoints::MONTH_VIEW, &[&control_id, &month]);
    let generate_url = format_endpoint(endpoints::GENERATE_MONTH, &[&control_id, &month]);
    let new_url = format!(
        "{}?month={month}",
        control_endpoint(endpoints::NEW_TRANSACTION_VIEW, control_id)
    );

    html!(
        header class="flex flex-wrap items-center justify-between gap-4 w-full"
        {
            div class="flex items-center gap-4"
            {
                a href=(month_url(month.prev())) class=(BUTTON_SECONDARY_STYLE) aria-label="Previous month" { "<" }
                h1 class="text-xl font-bold" { (month.label()) }
                a href=(month_url(month.next())) class=(BUTTON_SECONDARY_STYLE) aria-label="Next month" { ">" }
            }

            @if can_edit {
                div class="flex items-center gap-4"
                {
                    button
                        type="button"
                        hx-post=(generate_url)
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Generate month"
                    }

                    (link(&new_url, "New transaction"))
                }
            }
        }
    )
}

fn summary_cards(summary: &MonthSummary) -> Markup {
    let card = |title: &str, amount: f64, detail: Markup| {
        html!(
            div class="rounded border border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700 dark:bg-gray-800"
            {
                div class="text-sm text-gray-500 dark:text-gray-400" { (title) }
                div class="text-2xl font-semibold tabular-nums" data-summary=(title)
                {
                    (format_currency(amount))
                }
                div class="text-xs text-gray-500 dark:text-gray-400" { (detail) }
            }
        )
    };

    html!(
        section class="grid gap-4 sm:grid-cols-3 w-full"
        {
            (card("Income", summary.income, html!(
                (format_currency(summary.income_received)) " received, "
                (format_currency(summary.income_pending())) " pending"
            )))
            (card("Expenses", summary.expenses, html!(
                (format_currency(summary.expenses_paid)) " paid, "
                (format_currency(summary.expenses_pending())) " pending"
            )))
            (card("Result", summary.result(), html!(
                span class=(amount_style(summary.result()))
                {
                    @if summary.result() >= 0.0 { "Surplus" } @else { "Deficit" }
                }
            )))
        }
    )
}

fn category_table(summary: &MonthSummary) -> Markup {
    html!(
        section class="w-full space-y-2"
        {
            h2 class="text-lg font-semibold" { "Expenses by category" }

            @if summary.categories.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400" { "No expenses this month." }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" data-categories
                {
                    tbody
                    {
                        @for category in &summary.categories {
                            @let share = if summary.expenses > 0.0 {
                                category.amount / summary.expenses * 100.0
                            } else {
                                0.0
                            };

                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { (category.name) }
                                td class="px-6 py-4 text-right tabular-nums"
                                {
                                    (format_currency(category.amount))
                                }
                                td class="px-6 py-4 text-right tabular-nums" { (format!("{share:.0}%")) }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn balances_table(balances: &[AccountBalance], month: YearMonth) -> Markup {
    html!(
        section class="w-full space-y-2"
        {
            h2 class="text-lg font-semibold" { "Accounts" }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                        th scope="col" class="px-6 py-3 text-right" { "Balance" }
                        th scope="col" class="px-6 py-3 text-right" { "Available" }
                        th scope="col" class="px-6 py-3 text-right" { "End of " (month.label()) }
                    }
                }

                tbody
                {
                    @for balance in balances {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { (balance.account.name) }
                            td class="px-6 py-4 text-right tabular-nums" { (format_currency(balance.balance)) }
                            td class="px-6 py-4 text-right tabular-nums" { (format_currency(balance.available)) }
                            td class="px-6 py-4 text-right tabular-nums" { (format_currency(balance.projected)) }
                        }
                    }
                }
            }
        }
    )
}

fn entries_table(entries: &[Transaction], can_edit: bool) -> Markup {
    html!(
        section class="w-full space-y-2"
        {
            h2 class="text-lg font-semibold" { "Entries" }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" data-entries
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }

                        @if can_edit {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
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
                            td class={ "px-6 py-4 text-right tabular-nums " (amount_style(entry.signed_amount())) }
                            {
                                (format_currency(entry.signed_amount()))
                            }
                            td class=(TABLE_CELL_STYLE) { (paid_toggle(entry, can_edit)) }

                            @if can_edit {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    div class="flex gap-4"
                                    {
                                        (edit_delete_action_links(
                                            &format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, &[&entry.control_id, &entry.id]),
                                            &format_endpoint(endpoints::TRANSACTION, &[&entry.control_id, &entry.id]),
                                            &format!("Delete '{}'?", entry.description),
                                            "closest tr",
                                            "delete",
                                        ))
                                    }
                                }
                            }
                        }
                    }

                    @if entries.is_empty() {
                        tr
                        {
                            td colspan="5" class="px-6 py-4 text-center" { "No entries this month." }
                        }
                    }
                }
            }
        }
    )
}

fn invoices_table(
    control_id: ControlId,
    invoices: &[(Invoice, Vec<Transaction>)],
    card_names: &HashMap<CardId, String>,
) -> Markup {
    html!(
        @if !invoices.is_empty() {
            section class="w-full space-y-2"
            {
                h2 class="text-lg font-semibold" { "Invoices due" }

                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" data-invoices
                {
                    tbody
                    {
                        @for (invoice, entries) in invoices {
                            @let card_name = card_names.get(&invoice.card_id).map(String::as_str).unwrap_or_default();

                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE)
                                {
                                    (link(
                                        &format_endpoint(endpoints::INVOICES_VIEW, &[&control_id, &invoice.card_id]),
                                        card_name,
                                    ))
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    details
                                    {
                                        summary class="cursor-pointer"
                                        {
                                            "Due " (invoice.due_date) ", " (entries.len()) " entries"
                                        }

                                        ul class="mt-2 space-y-1"
                                        {
                                            @for entry in entries {
                                                li class="flex justify-between gap-4"
                                                {
                                                    span { (entry.date) " " (entry.description) }
                                                    span class="tabular-nums" { (format_currency(entry.signed_amount())) }
                                                }
                                            }
                                        }
                                    }
                                }
                                td class="px-6 py-4 text-right tabular-nums" { (format_currency(invoice.total)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @if invoice.is_paid() {
                                        span class=(AMOUNT_GREEN_STYLE) { "Paid" }
                                    } @else {
                                        span class="text-amber-700 dark:text-amber-400" { "Pending" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn month_view(control_id: ControlId, month: YearMonth, data: &MonthData, can_edit: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::MONTH_VIEW, control_id).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-6 w-full lg:max-w-5xl"
            {
                (month_navigation(control_id, month, can_edit))
                (summary_cards(&data.summary))

                div class="grid gap-6 lg:grid-cols-2"
                {
                    (category_table(&data.summary))
                    (balances_table(&data.balances, month))
                }

                (entries_table(&data.entries, can_edit))
                (invoices_table(control_id, &data.invoices, &data.card_names))
            }
        }
    );

    base(&month.label(), &[], &content)
}

/// Renders the dashboard of a month.
pub async fn get_month_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, month)): Path<(ControlId, YearMonth)>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;

    let data = MonthData {
        summary: month_summary(control_id, month, &connection)
            .inspect_err(|error| tracing::error!("could not summarise {month}: {error}"))?,
        balances: get_account_balances(control_id, month, &connection)?,
        entries: get_account_transactions_for_month(control_id, month, &connection)?,
        invoices: get_invoices_due_in(control_id, month, &connection)?
            .into_iter()
            .map(|invoice| {
                let entries = get_invoice_transactions(invoice.id, &connection)?;
                Ok::<_, Error>((invoice, entries))
            })
            .collect::<Result<_, Error>>()?,
        card_names: get_cards(control_id, &connection)?
            .into_iter()
            .map(|card| (card.id, card.name))
            .collect(),
    };

    Ok(month_view(control_id, month, &data, role >= Role::Editor).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Path, State},
    };
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        Error,
        app_state::DbState,
        endpoints::{self, format_endpoint},
        html::format_currency,
        month::YearMonth,
        test_utils::{
            assert_status_ok, assert_valid_html, insert_test_account, insert_test_card,
            insert_test_control, insert_test_viewer, parse_html_document,
        },
        transaction::{PaymentSource, Transaction, TransactionKind, create_transaction},
    };

    use super::get_month_page;

    fn month(text: &str) -> YearMonth {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn shows_totals_entries_and_invoices() {
        let state = DbState::in_memory();
        let (user, control) = {
            let connection = state.lock().unwrap();
            let (user, control) = insert_test_control(&connection);
            let account = insert_test_account(control.id, &connection);
            let card = insert_test_card(control.id, account.id, 5, 15, &connection);
            create_transaction(
                control.id,
                Transaction::build(
                    TransactionKind::Income,
                    2000.0,
                    date!(2025 - 06 - 01),
                    "Salary",
                    PaymentSource::Account(account.id),
                ),
                &connection,
            )
            .unwrap();
            create_transaction(
                control.id,
                Transaction::build(
                    TransactionKind::Expense,
                    80.0,
                    date!(2025 - 06 - 02),
                    "Books",
                    PaymentSource::Card(card.id),
                ),
                &connection,
            )
            .unwrap();
            (user, control)
        };

        let response = get_month_page(
            State(state),
            Extension(user.id),
            Path((control.id, month("2025-06"))),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let summary = |title: &str| {
            html.select(&Selector::parse(&format!("[data-summary='{title}']")).unwrap())
                .next()
                .unwrap_or_else(|| panic!("no {title} summary"))
                .text()
                .collect::<String>()
                .trim()
                .to_owned()
        };
        assert_eq!(summary("Income"), format_currency(2000.0));
        assert_eq!(summary("Expenses"), format_currency(80.0));
        assert_eq!(summary("Result"), format_currency(1920.0));

        let entry_rows = html
            .select(&Selector::parse("[data-entries] tbody tr").unwrap())
            .count();
        assert_eq!(entry_rows, 1);
        let invoice_rows = html
            .select(&Selector::parse("[data-invoices] tbody tr").unwrap())
            .count();
        assert_eq!(invoice_rows, 1);
        let invoice_entries: Vec<String> = html
            .select(&Selector::parse("[data-invoices] li").unwrap())
            .map(|entry| entry.text().collect())
            .collect();
        assert_eq!(invoice_entries.len(), 1);
        assert!(invoice_entries[0].contains("Books"));
        let generate = html
            .select(&Selector::parse("button[hx-post]").unwrap())
            .find(|button| button.text().collect::<String>().contains("Generate"))
            .expect("no generate button");
        assert_eq!(
            generate.value().attr("hx-post"),
            Some(
                format_endpoint(endpoints::GENERATE_MONTH, &[&control.id, &month("2025-06")])
                    .as_str()
            )
        );
    }

    #[tokio::test]
    async fn viewer_cannot_generate() {
        let state = DbState::in_memory();
        let (viewer, control) = {
            let connection = state.lock().unwrap();
            let (_, control) = insert_test_control(&connection);
            (insert_test_viewer(control.id, &connection), control)
        };

        let response = get_month_page(
            State(state),
            Extension(viewer.id),
            Path((control.id, month("2025-06"))),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("button[hx-post]").unwrap())
                .next()
                .is_none()
        );
    }

    #[tokio::test]
    async fn non_member_gets_not_found() {
        let state = DbState::in_memory();
        let (user, control) = {
            let connection = state.lock().unwrap();
            let (_, control) = insert_test_control(&connection);
            let (stranger, _) = insert_test_control(&connection);
            (stranger, control)
        };

        let result = get_month_page(
            State(state),
            Extension(user.id),
            Path((control.id, month("2025-06"))),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
    }
}
