//! Endpoints for creating, updating and deleting provisioned transactions.

use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    category::CategoryId,
    classification::ClassificationId,
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
    month::YearMonth,
    provisioned::core::{
        NewProvisioned, ProvisionedId, ProvisionedUpdate, Recurrence, create_provisioned,
        delete_provisioned, update_provisioned,
    },
    transaction::{PaymentSource, TransactionKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Monthly,
    Installments,
}

/// The form data for creating a provisioned transaction.
#[derive(Debug, Deserialize)]
pub struct ProvisionedForm {
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub source: PaymentSource,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub classification_id: Option<ClassificationId>,
    pub start_month: YearMonth,
    pub day_of_month: u8,
    pub recurrence: RecurrenceType,
    #[serde(default)]
    pub end_month: Option<YearMonth>,
    #[serde(default)]
    pub installment_count: Option<u32>,
}

impl ProvisionedForm {
    fn into_new_provisioned(self) -> Result<NewProvisioned, Error> {
        let recurrence = match self.recurrence {
            RecurrenceType::Monthly => Recurrence::Monthly {
                end_month: self.end_month,
            },
            RecurrenceType::Installments => Recurrence::Installments {
                count: self
                    .installment_count
                    .ok_or(Error::InvalidInstallmentCount)?,
            },
        };

        Ok(NewProvisioned {
            description: self.description,
            amount: self.amount,
            kind: self.kind,
            source: self.source,
            category_id: self.category_id,
            classification_id: self.classification_id,
            start_month: self.start_month,
            day_of_month: self.day_of_month,
            recurrence,
        })
    }
}

/// The form data for editing a provisioned transaction.
#[derive(Debug, Deserialize)]
pub struct EditProvisionedForm {
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub classification_id: Option<ClassificationId>,
    #[serde(default)]
    pub end_month: Option<YearMonth>,
    #[serde(default)]
    pub apply_from: Option<YearMonth>,
}

impl From<EditProvisionedForm> for ProvisionedUpdate {
    fn from(form: EditProvisionedForm) -> Self {
        ProvisionedUpdate {
            description: form.description,
            amount: form.amount,
            category_id: form.category_id,
            classification_id: form.classification_id,
            end_month: form.end_month,
            apply_from: form.apply_from,
        }
    }
}

fn redirect_to_list(control_id: ControlId) -> Response {
    (
        HxRedirect(control_endpoint(endpoints::PROVISIONED_VIEW, control_id)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for creating a provisioned transaction, redirects to the
/// list on success.
pub async fn create_provisioned_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<ProvisionedForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| form.into_new_provisioned())
        .and_then(|new| create_provisioned(control_id, &new, &connection));

    match result {
        Ok(plan) => {
            tracing::debug!(
                "created provisioned transaction {} in control {control_id}",
                plan.id
            );
            redirect_to_list(control_id)
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for updating a provisioned transaction, redirects to the
/// list on success.
pub async fn edit_provisioned_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, provisioned_id)): Path<(ControlId, ProvisionedId)>,
    Form(form): Form<EditProvisionedForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let update = ProvisionedUpdate::from(form);
    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| update_provisioned(control_id, provisioned_id, &update, &connection));

    match result {
        Ok(_) => redirect_to_list(control_id),
        Err(error) => error.into_alert_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteProvisionedQuery {
    /// Remove the unpaid generated entries from this month on.
    pub remove_from: Option<YearMonth>,
}

/// A route handler for deleting a provisioned transaction, responds with an alert.
pub async fn delete_provisioned_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, provisioned_id)): Path<(ControlId, ProvisionedId)>,
    Query(query): Query<DeleteProvisionedQuery>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection).and_then(|_| {
        delete_provisioned(control_id, provisioned_id, query.remove_from, &connection)
    });

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Provisioned transaction deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
