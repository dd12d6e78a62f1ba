//! Endpoints for creating and deleting categories.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    category::core::{CategoryId, NewCategory, create_category, delete_category},
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
};

pub async fn create_category_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<NewCategory>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| create_category(control_id, &form.name, form.kind, &connection));

    match result {
        Ok(_) => (
            HxRedirect(control_endpoint(endpoints::CATEGORIES_VIEW, control_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn delete_category_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, category_id)): Path<(ControlId, CategoryId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| delete_category(control_id, category_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
