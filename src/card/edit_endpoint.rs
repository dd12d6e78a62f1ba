//! Defines the endpoint for updating a card.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    app_state::DbState,
    auth::UserID,
    card::core::{CardId, NewCard, update_card},
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
};

pub async fn edit_card_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, card_id)): Path<(ControlId, CardId)>,
    Form(form): Form<NewCard>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| update_card(control_id, card_id, &form, &connection));

    match result {
        Ok(()) => (
            HxRedirect(control_endpoint(endpoints::CARDS_VIEW, control_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        app_state::DbState,
        card::{NewCard, get_card},
        endpoints::{self, control_endpoint},
        test_utils::{
            assert_hx_redirect, insert_test_account, insert_test_card, insert_test_control,
        },
    };

    use super::edit_card_endpoint;

    #[tokio::test]
    async fn can_update_card() {
        let state = DbState::in_memory();
        let (user, control, account, card) = {
            let connection = state.lock().unwrap();
            let (user, control) = insert_test_control(&connection);
            let account = insert_test_account(control.id, &connection);
            let card = insert_test_card(control.id, account.id, 5, 15, &connection);
            (user, control, account, card)
        };

        let response = edit_card_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path((control.id, card.id)),
            Form(NewCard {
                name: "Mastercard".to_owned(),
                closing_day: 28,
                due_day: 7,
                credit_limit: 500.0,
                payment_account_id: account.id,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &control_endpoint(endpoints::CARDS_VIEW, control.id),
        );
        let got = get_card(control.id, card.id, &state.lock().unwrap()).unwrap();
        assert_eq!(got.name, "Mastercard");
        assert_eq!((got.closing_day, got.due_day), (28, 7));
        assert_eq!(got.credit_limit, 500.0);
    }
}
