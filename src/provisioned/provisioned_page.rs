//! Lists the provisioned transactions of a control with a form for adding one.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE,
        FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, dollar_input_styles, format_currency, link,
        page_header,
    },
    month::YearMonth,
    navigation::NavBar,
    provisioned::core::{
        MAX_INSTALLMENTS, ProvisionedTransaction, Recurrence, get_all_provisioned,
    },
    timezone::local_today,
    transaction::{
        FormChoices, PaymentSource, TransactionKind, amount_field, category_select,
        classification_select, description_field, kind_fields, source_select,
    },
};

/// Describes when a plan produces entries, e.g. "Monthly from March 2025".
pub fn schedule_label(plan: &ProvisionedTransaction) -> String {
    match plan.recurrence {
        Recurrence::Monthly { end_month: None } => {
            format!("Monthly from {}", plan.start_month.label())
        }
        Recurrence::Monthly {
            end_month: Some(end_month),
        } => format!(
            "Monthly from {} to {}",
            plan.start_month.label(),
            end_month.label()
        ),
        Recurrence::Installments { count } => {
            format!("{count} installments from {}", plan.start_month.label())
        }
    }
}

pub(crate) fn source_name(source: PaymentSource, choices: &FormChoices) -> String {
    let name = match source {
        PaymentSource::Account(id) => choices
            .accounts
            .iter()
            .find(|account| account.id == id)
            .map(|account| account.name.as_str()),
        PaymentSource::Card(id) => choices
            .cards
            .iter()
            .find(|card| card.id == id)
            .map(|card| card.name.as_str()),
    };

    name.unwrap_or("Unknown").to_owned()
}

fn recurrence_fields() -> Markup {
    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Repeats" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        name="recurrence"
                        id="recurrence-monthly"
                        type="radio"
                        value="monthly"
                        checked
                        required
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="recurrence-monthly" class=(FORM_RADIO_LABEL_STYLE) { "Monthly" }
                }

                div class="flex items-center gap-3"
                {
                    input
                        name="recurrence"
                        id="recurrence-installments"
                        type="radio"
                        value="installments"
                        required
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="recurrence-installments" class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Installments"
                    }
                }
            }
        }

        div class="grid grid-cols-2 gap-4"
        {
            div
            {
                label for="end_month" class=(FORM_LABEL_STYLE) { "Last month (monthly)" }

                input
                    name="end_month"
                    id="end_month"
                    type="month"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="installment_count" class=(FORM_LABEL_STYLE) { "Installments" }

                input
                    name="installment_count"
                    id="installment_count"
                    type="number"
                    min="1"
                    max=(MAX_INSTALLMENTS)
                    step="1"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn new_provisioned_form(
    control_id: ControlId,
    month: YearMonth,
    day: u8,
    choices: &FormChoices,
) -> Markup {
    html! {
        form
            hx-post=(control_endpoint(endpoints::POST_PROVISIONED, control_id))
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (kind_fields(TransactionKind::Expense))
            (amount_field("Amount per month", None))
            (description_field(None))
            (source_select(choices, None))
            (category_select(&choices.categories, None))
            (classification_select(&choices.classifications, None))

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for="start_month" class=(FORM_LABEL_STYLE) { "First month" }

                    input
                        name="start_month"
                        id="start_month"
                        type="month"
                        value=(month)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="day_of_month" class=(FORM_LABEL_STYLE) { "Day of month" }

                    input
                        name="day_of_month"
                        id="day_of_month"
                        type="number"
                        min="1"
                        max="31"
                        step="1"
                        value=(day)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            (recurrence_fields())

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Provisioned Transaction" }
        }
    }
}

fn provisioned_view(
    control_id: ControlId,
    plans: &[ProvisionedTransaction],
    choices: &FormChoices,
    today_month: YearMonth,
    today_day: u8,
    can_edit: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROVISIONED_VIEW, control_id).into_html();

    let table_row = |plan: &ProvisionedTransaction| {
        let edit_url = format_endpoint(endpoints::EDIT_PROVISIONED_VIEW, &[&control_id, &plan.id]);
        let delete_url = format_endpoint(endpoints::PROVISIONED, &[&control_id, &plan.id]);
        let remove_entries_url = format!("{delete_url}?remove_from={today_month}");
        let amount = match plan.kind {
            TransactionKind::Expense => -plan.amount,
            TransactionKind::Income => plan.amount,
        };

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (plan.description)
                }
                td class="px-6 py-4 text-right tabular-nums" { (format_currency(amount)) }
                td class=(TABLE_CELL_STYLE) { (source_name(plan.source, choices)) }
                td class=(TABLE_CELL_STYLE)
                {
                    (schedule_label(plan)) ", day " (plan.day_of_month)
                }
                td class=(TABLE_CELL_STYLE)
                {
                    @match plan.generated_through {
                        Some(month) => {
                            span class=(BADGE_STYLE) { (month.label()) }
                        }
                        None => { "Not yet" }
                    }
                }
                @if can_edit {
                    td class=(TABLE_CELL_STYLE)
                    {
                        div class="flex flex-wrap gap-4"
                        {
                            a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                            button
                                type="button"
                                hx-delete=(delete_url)
                                hx-confirm={
                                    "Delete '" (plan.description) "'? Entries already generated stay in the ledger."
                                }
                                hx-target="closest tr"
                                hx-target-error="#alert-container"
                                hx-swap="delete"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Delete"
                            }

                            button
                                type="button"
                                hx-delete=(remove_entries_url)
                                hx-confirm={
                                    "Delete '" (plan.description) "' and its unpaid entries from "
                                    (today_month.label()) " on?"
                                }
                                hx-target="closest tr"
                                hx-target-error="#alert-container"
                                hx-swap="delete"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Delete with entries"
                            }
                        }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-6xl"
            {
                (page_header("Provisioned Transactions", None))

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Recurring expenses and incomes, and purchases in installments. "
                    "Their entries are added to a month when it is generated."
                }

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Paid with" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Schedule" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Generated through" }
                                @if can_edit {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }
                        }

                        tbody
                        {
                            @for plan in plans {
                                (table_row(plan))
                            }

                            @if plans.is_empty() {
                                tr
                                {
                                    td colspan="6" class="px-6 py-4 text-center"
                                    {
                                        "No provisioned transactions yet."
                                    }
                                }
                            }
                        }
                    }
                }

                @if can_edit {
                    div class="max-w-md"
                    {
                        h2 class="text-lg font-semibold mb-4" { "Add a provisioned transaction" }

                        @if choices.has_sources() {
                            (new_provisioned_form(control_id, today_month, today_day, choices))
                        } @else {
                            p
                            {
                                (link(&control_endpoint(endpoints::ACCOUNTS_VIEW, control_id), "Add an account"))
                                " first."
                            }
                        }
                    }
                }
            }
        }
    );

    base("Provisioned Transactions", &[dollar_input_styles()], &content)
}

/// Renders the list of provisioned transactions.
pub async fn get_provisioned_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let plans = get_all_provisioned(control_id, &connection)?;
    let choices = FormChoices::load(control_id, &connection)?;
    let today = local_today(&state.local_timezone)?;

    Ok(provisioned_view(
        control_id,
        &plans,
        &choices,
        YearMonth::from_date(today),
        today.day(),
        role >= Role::Editor,
    )
    .into_response())
}
