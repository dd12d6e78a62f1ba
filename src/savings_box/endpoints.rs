//! Endpoints for creating and deleting savings boxes and moving money in and
//! out of them.

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
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
    savings_box::core::{
        NewSavingsBox, SavingsBoxId, create_savings_box, delete_savings_box, deposit, withdraw,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Deposit,
    Withdraw,
}

/// The form data for moving money in or out of a box.
#[derive(Debug, Deserialize)]
pub struct MovementForm {
    pub direction: Direction,
    pub amount: f64,
    pub date: Date,
    #[serde(default)]
    pub description: String,
}

fn redirect_to_boxes(control_id: ControlId) -> Response {
    (
        HxRedirect(control_endpoint(endpoints::BOXES_VIEW, control_id)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for creating a savings box, redirects to the boxes page.
pub async fn create_box_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    // Must use axum_extra's Form since that parses an empty string as None instead of crashing
    // like axum::Form.
    Form(form): Form<NewSavingsBox>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| create_savings_box(control_id, &form, &connection));

    match result {
        Ok(savings_box) => {
            tracing::debug!("created savings box {} in control {control_id}", savings_box.id);
            redirect_to_boxes(control_id)
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for depositing into or withdrawing from a box, redirects
/// to the boxes page.
pub async fn box_movement_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, box_id)): Path<(ControlId, SavingsBoxId)>,
    Form(form): Form<MovementForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let (amount, date, description) = (form.amount, form.date, &form.description);
    let result = authorize(control_id, user_id, Role::Editor, &connection).and_then(|_| {
        match form.direction {
            Direction::Deposit => {
                deposit(control_id, box_id, amount, date, description, &connection)
            }
            Direction::Withdraw => {
                withdraw(control_id, box_id, amount, date, description, &connection)
            }
        }
    });

    match result {
        Ok(_) => redirect_to_boxes(control_id),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for deleting an empty savings box, responds with an alert.
pub async fn delete_box_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, box_id)): Path<(ControlId, SavingsBoxId)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| delete_savings_box(control_id, box_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Savings box deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
