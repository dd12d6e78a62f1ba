//! Defines the endpoint for deleting an account.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    account::core::{AccountId, delete_account},
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
};

/// A route handler for deleting an account, responds with an alert.
pub async fn delete_account_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, account_id)): Path<(ControlId, AccountId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| delete_account(control_id, account_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Account deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
