//! Endpoints for paying and reopening card invoices.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use serde::Deserialize;
use time::Date;

use crate::{
    account::AccountId,
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, format_endpoint},
    invoice::core::{InvoiceId, get_invoice, pay_invoice, reopen_invoice},
};

/// The form data for paying an invoice.
#[derive(Debug, Deserialize)]
pub struct PayInvoiceForm {
    pub account_id: AccountId,
    pub date: Date,
}

fn redirect_to_invoices(
    control_id: ControlId,
    invoice_id: InvoiceId,
    state: &DbState,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match get_invoice(control_id, invoice_id, &connection) {
        Ok(invoice) => (
            HxRedirect(format_endpoint(
                endpoints::INVOICES_VIEW,
                &[&control_id, &invoice.card_id],
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for paying an invoice, redirects to the card's invoices.
pub async fn pay_invoice_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, invoice_id)): Path<(ControlId, InvoiceId)>,
    Form(form): Form<PayInvoiceForm>,
) -> Response {
    {
        let connection = match state.lock() {
            Ok(connection) => connection,
            Err(error) => return error.into_alert_response(),
        };

        let result = authorize(control_id, user_id, Role::Editor, &connection).and_then(|_| {
            pay_invoice(control_id, invoice_id, form.account_id, form.date, &connection)
        });

        if let Err(error) = result {
            return error.into_alert_response();
        }

        tracing::debug!("invoice {invoice_id} paid on {}", form.date);
    }

    redirect_to_invoices(control_id, invoice_id, &state)
}

/// A route handler for undoing the payment of an invoice, redirects to the
/// card's invoices.
pub async fn reopen_invoice_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, invoice_id)): Path<(ControlId, InvoiceId)>,
) -> Response {
    {
        let connection = match state.lock() {
            Ok(connection) => connection,
            Err(error) => return error.into_alert_response(),
        };

        let result = authorize(control_id, user_id, Role::Editor, &connection)
            .and_then(|_| reopen_invoice(control_id, invoice_id, &connection));

        if let Err(error) = result {
            return error.into_alert_response();
        }
    }

    redirect_to_invoices(control_id, invoice_id, &state)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        app_state::DbState,
        auth::UserID,
        endpoints::{self, format_endpoint},
        invoice::get_invoice,
        test_utils::{
            assert_hx_redirect, insert_test_account, insert_test_card, insert_test_control,
            insert_test_viewer,
        },
        transaction::{PaymentSource, Transaction, TransactionKind, create_transaction},
    };

    use super::{PayInvoiceForm, pay_invoice_endpoint, reopen_invoice_endpoint};

    struct Fixture {
        state: DbState,
        user_id: UserID,
        control_id: i64,
        account_id: i64,
        card_id: i64,
        invoice_id: i64,
    }

    fn fixture() -> Fixture {
        let state = DbState::in_memory();
        let connection = state.lock().unwrap();
        let (user, control) = insert_test_control(&connection);
        let account = insert_test_account(control.id, &connection);
        let card = insert_test_card(control.id, account.id, 10, 20, &connection);
        let transaction = create_transaction(
            control.id,
            Transaction::build(
                TransactionKind::Expense,
                120.0,
                date!(2025 - 04 - 03),
                "Tyres",
                PaymentSource::Card(card.id),
            ),
            &connection,
        )
        .unwrap();
        drop(connection);

        Fixture {
            state,
            user_id: user.id,
            control_id: control.id,
            account_id: account.id,
            card_id: card.id,
            invoice_id: transaction.invoice_id.unwrap(),
        }
    }

    #[tokio::test]
    async fn pays_invoice_and_redirects() {
        let fixture = fixture();

        let response = pay_invoice_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.user_id),
            Path((fixture.control_id, fixture.invoice_id)),
            Form(PayInvoiceForm {
                account_id: fixture.account_id,
                date: date!(2025 - 04 - 19),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format_endpoint(
                endpoints::INVOICES_VIEW,
                &[&fixture.control_id, &fixture.card_id],
            ),
        );
        let invoice = get_invoice(
            fixture.control_id,
            fixture.invoice_id,
            &fixture.state.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(invoice.paid_on, Some(date!(2025 - 04 - 19)));
        assert_eq!(invoice.paid_from_account_id, Some(fixture.account_id));
    }

    #[tokio::test]
    async fn paying_twice_is_bad_request() {
        let fixture = fixture();
        let form = || {
            Form(PayInvoiceForm {
                account_id: fixture.account_id,
                date: date!(2025 - 04 - 19),
            })
        };
        pay_invoice_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.user_id),
            Path((fixture.control_id, fixture.invoice_id)),
            form(),
        )
        .await;

        let response = pay_invoice_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.user_id),
            Path((fixture.control_id, fixture.invoice_id)),
            form(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reopens_invoice() {
        let fixture = fixture();
        pay_invoice_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.user_id),
            Path((fixture.control_id, fixture.invoice_id)),
            Form(PayInvoiceForm {
                account_id: fixture.account_id,
                date: date!(2025 - 04 - 19),
            }),
        )
        .await;

        let response = reopen_invoice_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.user_id),
            Path((fixture.control_id, fixture.invoice_id)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let invoice = get_invoice(
            fixture.control_id,
            fixture.invoice_id,
            &fixture.state.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(invoice.paid_on, None);
    }

    #[tokio::test]
    async fn viewer_cannot_pay() {
        let fixture = fixture();
        let viewer = insert_test_viewer(fixture.control_id, &fixture.state.lock().unwrap());

        let response = pay_invoice_endpoint(
            State(fixture.state.clone()),
            Extension(viewer.id),
            Path((fixture.control_id, fixture.invoice_id)),
            Form(PayInvoiceForm {
                account_id: fixture.account_id,
                date: date!(2025 - 04 - 19),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
