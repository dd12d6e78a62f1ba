//! Displays accounts and their balances.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{
        balance::{AccountBalance, get_account_balances},
        edit_page::account_form,
    },
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        FormAction, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, dollar_input_styles, edit_delete_action_links, format_currency, page_header,
    },
    month::YearMonth,
    navigation::NavBar,
    timezone::local_today,
};

/// The account data to display in the view
#[derive(Debug, PartialEq)]
struct AccountTableRow {
    name: String,
    balance: f64,
    boxes: f64,
    available: f64,
    projected: f64,
    edit_url: String,
    delete_url: String,
}

impl AccountTableRow {
    fn new(control_id: ControlId, balance: AccountBalance) -> Self {
        let account_id = balance.account.id;

        Self {
            name: balance.account.name,
            balance: balance.balance,
            boxes: balance.boxes,
            available: balance.available,
            projected: balance.projected,
            edit_url: format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, &[&control_id, &account_id]),
            delete_url: format_endpoint(endpoints::ACCOUNT, &[&control_id, &account_id]),
        }
    }

    fn confirm_delete_message(&self) -> String {
        format!(
            "Are you sure you want to delete the account '{}'? This cannot be undone.",
            self.name
        )
    }
}

fn accounts_view(
    control_id: ControlId,
    accounts: &[AccountTableRow],
    month: YearMonth,
    can_edit: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW, control_id).into_html();
    let projected_header = format!("Projected ({})", month.label());

    let table_row = |account: &AccountTableRow| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.name)
                }

                td class="px-6 py-4 text-right" { (format_currency(account.balance)) }
                td class="px-6 py-4 text-right" { (format_currency(account.boxes)) }
                td class="px-6 py-4 text-right" { (format_currency(account.available)) }
                td class="px-6 py-4 text-right" { (format_currency(account.projected)) }

                @if can_edit {
                    td class=(TABLE_CELL_STYLE)
                    {
                        div class="flex gap-4"
                        {
                            (edit_delete_action_links(
                                &account.edit_url,
                                &account.delete_url,
                                &account.confirm_delete_message(),
                                "closest tr",
                                "delete",
                            ))
                        }
                    }
                }
            }
        )
    };

    let column_count = if can_edit { 6 } else { 5 };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Accounts", None))

                (accounts_cards_view(accounts, can_edit))

                section class="hidden lg:block w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class="px-6 py-3 text-right" { "In boxes" }
                                th scope="col" class="px-6 py-3 text-right" { "Available" }
                                th scope="col" class="px-6 py-3 text-right" { (projected_header) }

                                @if can_edit {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan=(column_count)
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found."
                                    }
                                }
                            }
                        }
                    }
                }

                @if can_edit {
                    div class="max-w-md"
                    {
                        h2 class="text-lg font-semibold mb-4" { "Add an account" }
                        (account_form(
                            FormAction::Post(&control_endpoint(endpoints::POST_ACCOUNT, control_id)),
                            None,
                            "Add Account",
                        ))
                    }
                }
            }
        }
    );

    base("Accounts", &[dollar_input_styles()], &content)
}

fn accounts_cards_view(accounts: &[AccountTableRow], can_edit: bool) -> Markup {
    html!(
        ul class="lg:hidden space-y-4"
        {
            @for account in accounts {
                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-account-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        div class="text-sm font-semibold text-gray-900 dark:text-white"
                        { (account.name) }
                        div class="text-sm tabular-nums text-right text-gray-900 dark:text-white"
                        { (format_currency(account.balance)) }
                    }

                    dl class="mt-1 grid grid-cols-2 gap-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        dt { "Available" }
                        dd class="text-right tabular-nums" { (format_currency(account.available)) }
                        dt { "Projected" }
                        dd class="text-right tabular-nums" { (format_currency(account.projected)) }
                    }

                    @if can_edit {
                        div class="mt-2 flex items-center gap-4 text-sm"
                        {
                            (edit_delete_action_links(
                                &account.edit_url,
                                &account.delete_url,
                                &account.confirm_delete_message(),
                                "closest [data-account-card='true']",
                                "outerHTML",
                            ))
                        }
                    }
                }
            }

            @if accounts.is_empty() {
                li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:bg-gray-800 dark:text-gray-400"
                {
                    "No accounts found."
                }
            }
        }
    )
}

/// Renders the accounts page showing all accounts of a control.
pub async fn get_accounts_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let month = YearMonth::from_date(local_today(&state.local_timezone)?);

    let accounts: Vec<AccountTableRow> = get_account_balances(control_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get account balances: {error}"))?
        .into_iter()
        .map(|balance| AccountTableRow::new(control_id, balance))
        .collect();

    Ok(accounts_view(control_id, &accounts, month, role >= Role::Editor).into_response())
}
