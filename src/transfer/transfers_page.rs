//! Lists the transfers of a month and has a form for recording a new one.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, get_accounts},
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_action_link,
        dollar_input_styles, format_currency, link, page_header,
    },
    month::YearMonth,
    navigation::NavBar,
    timezone::local_today,
    transaction::{amount_field, description_field},
    transfer::core::{Transfer, get_transfers_for_month},
};

#[derive(Debug, Default, Deserialize)]
pub struct TransfersQuery {
    pub month: Option<YearMonth>,
}

fn account_select(
    name: &str,
    label: &str,
    accounts: &[Account],
    selected: Option<AccountId>,
) -> Markup {
    html!(
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select name=(name) id=(name) required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for account in accounts {
                    option value=(account.id) selected[Some(account.id) == selected]
                    {
                        (account.name)
                    }
                }
            }
        }
    )
}

fn transfer_form(control_id: ControlId, accounts: &[Account], date: Date) -> Markup {
    let create_url = control_endpoint(endpoints::POST_TRANSFER, control_id);
    let from = accounts.first().map(|account| account.id);
    let to = accounts.get(1).map(|account| account.id);

    html!(
        form
            hx-post=(create_url)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            (account_select("from_account_id", "From", accounts, from))
            (account_select("to_account_id", "To", accounts, to))
            (amount_field("Amount", None))

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (description_field(None))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Transfer" }
        }
    )
}

fn transfers_view(
    control_id: ControlId,
    month: YearMonth,
    transfers: &[Transfer],
    accounts: &[Account],
    today: Date,
    can_edit: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFERS_VIEW, control_id).into_html();
    let base_url = control_endpoint(endpoints::TRANSFERS_VIEW, control_id);
    let account_names: HashMap<AccountId, &str> = accounts
        .iter()
        .map(|account| (account.id, account.name.as_str()))
        .collect();
    let name_of = |id: AccountId| account_names.get(&id).copied().unwrap_or("Unknown");
    let default_date = if YearMonth::from_date(today) == month {
        today
    } else {
        month.first_day()
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header(&format!("Transfers: {}", month.label()), None))

                nav class="flex justify-between text-sm"
                {
                    (link(&format!("{base_url}?month={}", month.prev()), "Previous month"))
                    (link(&format!("{base_url}?month={}", month.next()), "Next month"))
                }

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "From" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "To" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }

                                @if can_edit {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }
                        }

                        tbody
                        {
                            @for transfer in transfers {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (transfer.date) }
                                    td class=(TABLE_CELL_STYLE) { (name_of(transfer.from_account_id)) }
                                    td class=(TABLE_CELL_STYLE) { (name_of(transfer.to_account_id)) }
                                    td class=(TABLE_CELL_STYLE) { (transfer.description) }
                                    td class="px-6 py-4 text-right tabular-nums"
                                    {
                                        (format_currency(transfer.amount))
                                    }

                                    @if can_edit {
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            (delete_action_link(
                                                &format_endpoint(endpoints::TRANSFER, &[&control_id, &transfer.id]),
                                                "Are you sure you want to delete this transfer?",
                                                "closest tr",
                                                "delete",
                                            ))
                                        }
                                    }
                                }
                            }

                            @if transfers.is_empty() {
                                tr
                                {
                                    td
                                        colspan=(if can_edit { 6 } else { 5 })
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No transfers this month."
                                    }
                                }
                            }
                        }
                    }
                }

                @if can_edit {
                    div class="max-w-md"
                    {
                        h2 class="text-lg font-semibold mb-4" { "New transfer" }

                        @if accounts.len() < 2 {
                            p
                            {
                                "Transfers need at least two accounts. "
                                (link(&control_endpoint(endpoints::ACCOUNTS_VIEW, control_id), "Add an account"))
                            }
                        } @else {
                            (transfer_form(control_id, accounts, default_date))
                        }
                    }
                }
            }
        }
    );

    base("Transfers", &[dollar_input_styles()], &content)
}

/// Renders the transfers of a month, the current month by default.
pub async fn get_transfers_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Query(query): Query<TransfersQuery>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let today = local_today(&state.local_timezone)?;
    let month = query.month.unwrap_or_else(|| YearMonth::from_date(today));

    let transfers = get_transfers_for_month(control_id, month, &connection)?;
    let accounts = get_accounts(control_id, &connection)?;

    Ok(transfers_view(
        control_id,
        month,
        &transfers,
        &accounts,
        today,
        role >= Role::Editor,
    )
    .into_response())
}
