//! Endpoints for creating and deleting classifications.

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
    classification::core::{
        ClassificationId, NewClassification, create_classification, delete_classification,
    },
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
};

pub async fn create_classification_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<NewClassification>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| create_classification(control_id, &form.name, &connection));

    match result {
        Ok(_) => (
            HxRedirect(control_endpoint(endpoints::CATEGORIES_VIEW, control_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn delete_classification_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, classification_id)): Path<(ControlId, ClassificationId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| delete_classification(control_id, classification_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Classification deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
