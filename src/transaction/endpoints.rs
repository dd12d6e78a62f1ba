//! Endpoints for creating, editing, deleting and paying transactions, and for
//! generating the entries of a month.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    category::CategoryId,
    classification::ClassificationId,
    control::{ControlId, Role, authorize},
    endpoints::{self, format_endpoint},
    html::BADGE_STYLE,
    month::YearMonth,
    transaction::{
        core::{
            PaymentSource, Transaction, TransactionBuilder, TransactionId, TransactionKind,
            create_transaction, delete_transaction, get_transaction, toggle_transaction_paid,
            update_transaction,
        },
        generation::generate_through,
    },
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    /// The amount in dollars, per installment for installment purchases.
    pub amount: f64,
    pub date: Date,
    #[serde(default)]
    pub description: String,
    pub source: PaymentSource,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub classification_id: Option<ClassificationId>,
    #[serde(default)]
    pub installments: Option<u32>,
}

impl TransactionForm {
    fn into_builder(self) -> TransactionBuilder {
        Transaction::build(
            self.kind,
            self.amount,
            self.date,
            &self.description,
            self.source,
        )
        .category_id(self.category_id)
        .classification_id(self.classification_id)
        .installments(self.installments.unwrap_or(1))
    }
}

fn month_url(control_id: ControlId, month: YearMonth) -> String {
    format_endpoint(endpoints::MONTH_VIEW, &[&control_id, &month])
}

/// A route handler for creating a transaction, redirects to the month of the
/// new transaction on success.
pub async fn create_transaction_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| create_transaction(control_id, form.into_builder(), &connection));

    match result {
        Ok(transaction) => (
            HxRedirect(month_url(control_id, transaction.month)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for updating a transaction, redirects to its month on success.
pub async fn edit_transaction_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, transaction_id)): Path<(ControlId, TransactionId)>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection).and_then(|_| {
        update_transaction(control_id, transaction_id, form.into_builder(), &connection)
    });

    match result {
        Ok(transaction) => (
            HxRedirect(month_url(control_id, transaction.month)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for deleting a transaction, responds with an alert.
pub async fn delete_transaction_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, transaction_id)): Path<(ControlId, TransactionId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| delete_transaction(control_id, transaction_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Transaction deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// The paid status of an entry. Account entries get a button that toggles
/// the status, card entries follow their invoice.
pub fn paid_toggle(transaction: &Transaction, can_edit: bool) -> Markup {
    let label = if transaction.paid { "Paid" } else { "Pending" };
    let style = if transaction.paid {
        "text-green-700 dark:text-green-400"
    } else {
        "text-amber-700 dark:text-amber-400"
    };

    match transaction.source {
        PaymentSource::Account(_) if can_edit => {
            let toggle_url = format_endpoint(
                endpoints::TOGGLE_TRANSACTION_PAID,
                &[&transaction.control_id, &transaction.id],
            );

            html!(
                button
                    type="button"
                    hx-post=(toggle_url)
                    hx-target="this"
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    data-paid=(transaction.paid)
                    class={ "font-medium hover:underline " (style) }
                {
                    (label)
                }
            )
        }
        PaymentSource::Account(_) => html!(span class=(style) { (label) }),
        PaymentSource::Card(_) => html!(span class=(BADGE_STYLE) { "Invoice: " (label) }),
    }
}

/// A route handler that flips the paid status of an account entry and
/// responds with the new toggle button.
pub async fn toggle_transaction_paid_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, transaction_id)): Path<(ControlId, TransactionId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| toggle_transaction_paid(control_id, transaction_id, &connection))
        .and_then(|_| get_transaction(control_id, transaction_id, &connection));

    match result {
        Ok(transaction) => paid_toggle(&transaction, true).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler that generates the entries of the provisioned transactions
/// up to `month`, redirects to the month on success.
pub async fn generate_month_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, month)): Path<(ControlId, YearMonth)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| generate_through(control_id, month, &connection));

    match result {
        Ok(_) => (
            HxRedirect(month_url(control_id, month)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
