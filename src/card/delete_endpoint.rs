//! Defines the endpoint for deleting a card.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    card::core::{CardId, delete_card},
    control::{ControlId, Role, authorize},
};

/// A route handler for deleting a card, responds with an alert.
pub async fn delete_card_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, card_id)): Path<(ControlId, CardId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| delete_card(control_id, card_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Card deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
