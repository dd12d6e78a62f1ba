//! The page for recording a new expense or income.

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
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        FormAction, base, dollar_input_styles, link,
    },
    month::YearMonth,
    navigation::NavBar,
    provisioned::MAX_INSTALLMENTS,
    timezone::local_today,
    transaction::{
        core::TransactionKind,
        form::{FormChoices, TransactionFormDefaults, transaction_form_fields},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct NewTransactionQuery {
    /// The month the user came from, used to pick the default date.
    pub month: Option<YearMonth>,
}

/// Today if it falls in `month`, otherwise the first day of `month`.
fn default_date(today: Date, month: Option<YearMonth>) -> Date {
    match month {
        Some(month) if month != YearMonth::from_date(today) => month.first_day(),
        _ => today,
    }
}

fn new_transaction_view(control_id: ControlId, date: Date, choices: &FormChoices) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW, control_id).into_html();
    let create_url = control_endpoint(endpoints::POST_TRANSACTION, control_id);

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Transaction" }

            @if choices.has_sources() {
                form
                    hx-post=(create_url)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (transaction_form_fields(
                        &TransactionFormDefaults {
                            kind: TransactionKind::Expense,
                            amount: None,
                            date,
                            description: None,
                            source: None,
                            category_id: None,
                            classification_id: None,
                        },
                        choices,
                    ))

                    div
                    {
                        label for="installments" class=(FORM_LABEL_STYLE) { "Installments" }

                        input
                            name="installments"
                            id="installments"
                            type="number"
                            min="1"
                            max=(MAX_INSTALLMENTS)
                            step="1"
                            value="1"
                            class=(FORM_TEXT_INPUT_STYLE);

                        p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                        {
                            "With more than one installment the amount is charged every month."
                        }
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Transaction" }
                }
            } @else {
                p
                {
                    "Transactions are paid from an account or a card. "
                    (link(&control_endpoint(endpoints::ACCOUNTS_VIEW, control_id), "Add an account"))
                    " first."
                }
            }
        }
    );

    base("New Transaction", &[dollar_input_styles()], &content)
}

/// Renders the page for creating a transaction.
pub async fn get_new_transaction_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Query(query): Query<NewTransactionQuery>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    authorize(control_id, user_id, Role::Editor, &connection)?;
    let choices = FormChoices::load(control_id, &connection)?;
    let date = default_date(local_today(&state.local_timezone)?, query.month);

    Ok(new_transaction_view(control_id, date, &choices).into_response())
}
