//! The page for editing a transaction.

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
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    transaction::{
        core::{Transaction, TransactionId, get_transaction},
        form::{FormChoices, TransactionFormDefaults, transaction_form_fields},
    },
};

fn edit_transaction_view(transaction: &Transaction, choices: &FormChoices) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW, transaction.control_id).into_html();
    let update_url = format_endpoint(
        endpoints::TRANSACTION,
        &[&transaction.control_id, &transaction.id],
    );

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Transaction" }

            @if let Some(installment) = transaction.installment {
                p class="mb-4 text-sm text-gray-500 dark:text-gray-400"
                {
                    "Installment " (installment) ". Changes only apply to this installment."
                }
            }

            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (transaction_form_fields(
                    &TransactionFormDefaults {
                        kind: transaction.kind,
                        amount: Some(transaction.amount),
                        date: transaction.date,
                        description: Some(&transaction.description),
                        source: Some(transaction.source),
                        category_id: transaction.category_id,
                        classification_id: transaction.classification_id,
                    },
                    choices,
                ))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Transaction" }
            }
        }
    );

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

/// Renders the page for editing a transaction.
pub async fn get_edit_transaction_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, transaction_id)): Path<(ControlId, TransactionId)>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    authorize(control_id, user_id, Role::Editor, &connection)?;
    let transaction = get_transaction(control_id, transaction_id, &connection)?;
    let choices = FormChoices::load(control_id, &connection)?;

    Ok(edit_transaction_view(&transaction, &choices).into_response())
}
