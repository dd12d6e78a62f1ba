//! Displays the savings boxes of a control with their progress and recent
//! movements.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, get_accounts},
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        delete_action_link, dollar_input_styles, format_currency, link, page_header,
    },
    navigation::NavBar,
    savings_box::core::{BoxMovement, SavingsBoxSummary, get_box_movements, get_savings_boxes},
    timezone::local_today,
};

/// How many movements to show under each box.
const RECENT_MOVEMENTS: usize = 5;

struct BoxCard {
    summary: SavingsBoxSummary,
    account_name: String,
    movements: Vec<BoxMovement>,
}

fn movement_form(control_id: ControlId, card: &BoxCard, today: Date) -> Markup {
    let box_id = card.summary.savings_box.id;
    let url = format_endpoint(endpoints::BOX_MOVEMENTS, &[&control_id, &box_id]);
    let deposit_id = format!("deposit-{box_id}");
    let withdraw_id = format!("withdraw-{box_id}");
    let amount_id = format!("amount-{box_id}");
    let date_id = format!("date-{box_id}");

    html!(
        form
            hx-post=(url)
            hx-target-error="#alert-container"
            class="grid grid-cols-1 sm:grid-cols-2 gap-3"
        {
            div class=(FORM_RADIO_GROUP_STYLE)
            {
                label for=(deposit_id) class=(FORM_RADIO_LABEL_STYLE)
                {
                    input
                        id=(deposit_id)
                        type="radio"
                        name="direction"
                        value="deposit"
                        checked
                        class=(FORM_RADIO_INPUT_STYLE);
                    "Deposit"
                }

                label for=(withdraw_id) class=(FORM_RADIO_LABEL_STYLE)
                {
                    input
                        id=(withdraw_id)
                        type="radio"
                        name="direction"
                        value="withdraw"
                        class=(FORM_RADIO_INPUT_STYLE);
                    "Withdraw"
                }
            }

            div class="input-wrapper w-full"
            {
                label for=(amount_id) class="sr-only" { "Amount" }

                input
                    id=(amount_id)
                    name="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for=(date_id) class="sr-only" { "Date" }

                input
                    id=(date_id)
                    name="date"
                    type="date"
                    value=(today)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            input
                name="description"
                type="text"
                placeholder="Description"
                class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
        }
    )
}

fn box_card(control_id: ControlId, card: &BoxCard, today: Date, can_edit: bool) -> Markup {
    let savings_box = &card.summary.savings_box;
    let delete_url = format_endpoint(endpoints::BOX, &[&control_id, &savings_box.id]);
    let progress = card.summary.progress();

    html!(
        li
            class="space-y-3 rounded border border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700 dark:bg-gray-800"
            data-box-card="true"
        {
            div class="flex items-start justify-between gap-3"
            {
                div
                {
                    h2 class="text-lg font-semibold text-gray-900 dark:text-white" { (savings_box.name) }
                    p class="text-xs text-gray-500 dark:text-gray-400" { "In " (card.account_name) }
                }

                div class="text-right"
                {
                    div class="text-lg font-semibold tabular-nums" data-box-balance
                    {
                        (format_currency(card.summary.balance))
                    }

                    @if let Some(goal) = savings_box.goal {
                        div class="text-xs text-gray-500 dark:text-gray-400"
                        {
                            "of " (format_currency(goal))
                        }
                    }
                }
            }

            @if let Some(progress) = progress {
                div class="w-full h-2 rounded bg-gray-200 dark:bg-gray-700"
                {
                    div
                        class="h-2 rounded bg-blue-500"
                        style={ "width: " (format!("{:.0}", progress * 100.0)) "%" }
                    {}
                }
            }

            @if !card.movements.is_empty() {
                ul class="text-sm divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for movement in &card.movements {
                        li class="flex justify-between py-1"
                        {
                            span
                            {
                                (movement.date)
                                @if !movement.description.is_empty() {
                                    " " (movement.description)
                                }
                            }
                            span class="tabular-nums" { (format_currency(movement.amount)) }
                        }
                    }
                }
            }

            @if can_edit {
                (movement_form(control_id, card, today))

                div class="text-sm"
                {
                    (delete_action_link(
                        &delete_url,
                        &format!("Delete the box '{}'? Only empty boxes can be deleted.", savings_box.name),
                        "closest [data-box-card='true']",
                        "delete",
                    ))
                }
            }
        }
    )
}

fn new_box_form(control_id: ControlId, accounts: &[Account]) -> Markup {
    let create_url = control_endpoint(endpoints::POST_BOX, control_id);

    html!(
        form
            hx-post=(create_url)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    name="name"
                    id="name"
                    type="text"
                    placeholder="Holiday"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                select name="account_id" id="account_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account in accounts {
                        option value=(account.id) { (account.name) }
                    }
                }
            }

            div
            {
                label for="goal" class=(FORM_LABEL_STYLE) { "Goal (optional)" }

                div class="input-wrapper w-full"
                {
                    input
                        name="goal"
                        id="goal"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Box" }
        }
    )
}

fn boxes_view(
    control_id: ControlId,
    cards: &[BoxCard],
    accounts: &[Account],
    today: Date,
    can_edit: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::BOXES_VIEW, control_id).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                (page_header("Savings Boxes", None))

                ul class="grid gap-4 md:grid-cols-2"
                {
                    @for card in cards {
                        (box_card(control_id, card, today, can_edit))
                    }
                }

                @if cards.is_empty() {
                    p class="text-gray-500 dark:text-gray-400" { "No savings boxes yet." }
                }

                @if can_edit {
                    div class="max-w-md"
                    {
                        h2 class="text-lg font-semibold mb-4" { "New box" }

                        @if accounts.is_empty() {
                            p
                            {
                                "Boxes belong to an account. "
                                (link(&control_endpoint(endpoints::ACCOUNTS_VIEW, control_id), "Add an account"))
                            }
                        } @else {
                            (new_box_form(control_id, accounts))
                        }
                    }
                }
            }
        }
    );

    base("Savings Boxes", &[dollar_input_styles()], &content)
}

/// Renders the savings boxes page.
pub async fn get_boxes_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let today = local_today(&state.local_timezone)?;
    let accounts = get_accounts(control_id, &connection)?;
    let account_names: HashMap<AccountId, &str> = accounts
        .iter()
        .map(|account| (account.id, account.name.as_str()))
        .collect();

    let cards = get_savings_boxes(control_id, &connection)?
        .into_iter()
        .map(|summary| {
            let mut movements = get_box_movements(summary.savings_box.id, &connection)?;
            movements.truncate(RECENT_MOVEMENTS);

            Ok(BoxCard {
                account_name: account_names
                    .get(&summary.savings_box.account_id)
                    .copied()
                    .unwrap_or_default()
                    .to_owned(),
                summary,
                movements,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(boxes_view(control_id, &cards, &accounts, today, role >= Role::Editor).into_response())
}
