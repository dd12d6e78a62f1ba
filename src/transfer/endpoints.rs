//! Endpoints for creating and deleting transfers.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
    month::YearMonth,
    transfer::core::{NewTransfer, TransferId, create_transfer, delete_transfer},
};

/// A route handler for recording a transfer, redirects to the transfers of
/// the transfer's month.
pub async fn create_transfer_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<NewTransfer>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| create_transfer(control_id, &form, &connection));

    match result {
        Ok(transfer) => {
            tracing::debug!("created transfer {} in control {control_id}", transfer.id);
            let url = format!(
                "{}?month={}",
                control_endpoint(endpoints::TRANSFERS_VIEW, control_id),
                YearMonth::from_date(transfer.date)
            );
            (HxRedirect(url), StatusCode::SEE_OTHER).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for deleting a transfer, responds with an alert.
pub async fn delete_transfer_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, transfer_id)): Path<(ControlId, TransferId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| delete_transfer(control_id, transfer_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Transfer deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
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
        endpoints::{self, control_endpoint},
        test_utils::{
            assert_hx_redirect, insert_test_account, insert_test_control, insert_test_viewer,
        },
        transfer::{NewTransfer, create_transfer, get_transfers_for_month},
    };

    use super::{create_transfer_endpoint, delete_transfer_endpoint};

    #[tokio::test]
    async fn creates_transfer_and_redirects_to_month() {
        let state = DbState::in_memory();
        let (user, control, from, to) = {
            let connection = state.lock().unwrap();
            let (user, control) = insert_test_control(&connection);
            let from = insert_test_account(control.id, &connection);
            let to = insert_test_account(control.id, &connection);
            (user, control, from, to)
        };

        let response = create_transfer_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(control.id),
            Form(NewTransfer {
                from_account_id: from.id,
                to_account_id: to.id,
                amount: 40.0,
                date: date!(2025 - 07 - 09),
                description: String::new(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &format!(
                "{}?month=2025-07",
                control_endpoint(endpoints::TRANSFERS_VIEW, control.id)
            ),
        );
        let transfers =
            get_transfers_for_month(control.id, "2025-07".parse().unwrap(), &state.lock().unwrap())
                .unwrap();
        assert_eq!(transfers.len(), 1);
    }

    #[tokio::test]
    async fn same_account_is_bad_request() {
        let state = DbState::in_memory();
        let (user, control, account) = {
            let connection = state.lock().unwrap();
            let (user, control) = insert_test_control(&connection);
            let account = insert_test_account(control.id, &connection);
            (user, control, account)
        };

        let response = create_transfer_endpoint(
            State(state),
            Extension(user.id),
            Path(control.id),
            Form(NewTransfer {
                from_account_id: account.id,
                to_account_id: account.id,
                amount: 40.0,
                date: date!(2025 - 07 - 09),
                description: String::new(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn viewer_cannot_delete() {
        let state = DbState::in_memory();
        let (viewer, control, transfer) = {
            let connection = state.lock().unwrap();
            let (_, control) = insert_test_control(&connection);
            let from = insert_test_account(control.id, &connection);
            let to = insert_test_account(control.id, &connection);
            let transfer = create_transfer(
                control.id,
                &NewTransfer {
                    from_account_id: from.id,
                    to_account_id: to.id,
                    amount: 40.0,
                    date: date!(2025 - 07 - 09),
                    description: String::new(),
                },
                &connection,
            )
            .unwrap();
            (insert_test_viewer(control.id, &connection), control, transfer)
        };

        let response = delete_transfer_endpoint(
            State(state.clone()),
            Extension(viewer.id),
            Path((control.id, transfer.id)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let transfers =
            get_transfers_for_month(control.id, "2025-07".parse().unwrap(), &state.lock().unwrap())
                .unwrap();
        assert_eq!(transfers, vec![transfer]);
    }
}
