//! The page for editing a provisioned transaction.

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
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, dollar_input_styles,
    },
    month::YearMonth,
    navigation::NavBar,
    provisioned::{
        core::{ProvisionedId, ProvisionedTransaction, Recurrence, get_provisioned},
        provisioned_page::{schedule_label, source_name},
    },
    timezone::local_today,
    transaction::{
        FormChoices, amount_field, category_select, classification_select, description_field,
    },
};

fn edit_provisioned_view(
    plan: &ProvisionedTransaction,
    choices: &FormChoices,
    current_month: YearMonth,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_PROVISIONED_VIEW, plan.control_id).into_html();
    let update_url = format_endpoint(endpoints::PROVISIONED, &[&plan.control_id, &plan.id]);
    let end_month = match plan.recurrence {
        Recurrence::Monthly { end_month } => Some(end_month),
        Recurrence::Installments { .. } => None,
    };

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Provisioned Transaction" }

            p class="mb-4 text-sm text-gray-500 dark:text-gray-400"
            {
                (plan.kind.label()) " paid with " (source_name(plan.source, choices)) ". "
                (schedule_label(plan)) ", day " (plan.day_of_month) "."
            }

            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (amount_field("Amount per month", Some(plan.amount)))
                (description_field(Some(&plan.description)))
                (category_select(&choices.categories, plan.category_id))
                (classification_select(&choices.classifications, plan.classification_id))

                @if let Some(end_month) = end_month {
                    div
                    {
                        label for="end_month" class=(FORM_LABEL_STYLE) { "Last month" }

                        input
                            name="end_month"
                            id="end_month"
                            type="month"
                            value=[end_month]
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="apply_from" class=(FORM_LABEL_STYLE)
                    {
                        "Also update unpaid entries from"
                    }

                    input
                        name="apply_from"
                        id="apply_from"
                        type="month"
                        value=(current_month)
                        class=(FORM_TEXT_INPUT_STYLE);

                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "Leave empty to only change future entries."
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    );

    base("Edit Provisioned Transaction", &[dollar_input_styles()], &content)
}

/// Renders the page for editing a provisioned transaction.
pub async fn get_edit_provisioned_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, provisioned_id)): Path<(ControlId, ProvisionedId)>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    authorize(control_id, user_id, Role::Editor, &connection)?;
    let plan = get_provisioned(control_id, provisioned_id, &connection)?;
    let choices = FormChoices::load(control_id, &connection)?;
    let current_month = YearMonth::from_date(local_today(&state.local_timezone)?);

    Ok(edit_provisioned_view(&plan, &choices, current_month).into_response())
}
