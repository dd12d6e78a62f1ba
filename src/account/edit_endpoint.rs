//! Defines the endpoint for updating an account.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    account::core::{AccountId, NewAccount, update_account},
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
};

pub async fn edit_account_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, account_id)): Path<(ControlId, AccountId)>,
    Form(form): Form<NewAccount>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| update_account(control_id, account_id, &form, &connection));

    match result {
        Ok(()) => (
            HxRedirect(control_endpoint(endpoints::ACCOUNTS_VIEW, control_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
