//! Defines the endpoint for creating a new account.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    account::core::{NewAccount, create_account},
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
};

/// A route handler for creating a new account, redirects to the accounts page on success.
pub async fn create_account_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<NewAccount>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| create_account(control_id, &form, &connection));

    match result {
        Ok(account) => {
            tracing::debug!("created account {} in control {control_id}", account.id);
            (
                HxRedirect(control_endpoint(endpoints::ACCOUNTS_VIEW, control_id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
