//! Defines the endpoint for creating a new card.

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
    card::core::{NewCard, create_card},
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint},
};

/// A route handler for creating a new card, redirects to the cards page on success.
pub async fn create_card_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<NewCard>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Editor, &connection)
        .and_then(|_| create_card(control_id, &form, &connection));

    match result {
        Ok(card) => {
            tracing::debug!("created card {} in control {control_id}", card.id);
            (
                HxRedirect(control_endpoint(endpoints::CARDS_VIEW, control_id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
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
        card::{NewCard, get_cards},
        endpoints::{self, control_endpoint},
        test_utils::{
            assert_hx_redirect, insert_test_account, insert_test_control, insert_test_viewer,
        },
    };

    use super::create_card_endpoint;

    fn form(payment_account_id: i64, closing_day: u8) -> Form<NewCard> {
        Form(NewCard {
            name: "Visa".to_owned(),
            closing_day,
            due_day: 10,
            credit_limit: 2000.0,
            payment_account_id,
        })
    }

    #[tokio::test]
    async fn creates_card_and_redirects() {
        let state = DbState::in_memory();
        let (user, control, account) = {
            let connection = state.lock().unwrap();
            let (user, control) = insert_test_control(&connection);
            let account = insert_test_account(control.id, &connection);
            (user, control, account)
        };

        let response = create_card_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(control.id),
            form(account.id, 3),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &control_endpoint(endpoints::CARDS_VIEW, control.id),
        );
        let cards = get_cards(control.id, &state.lock().unwrap()).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].closing_day, 3);
    }

    #[tokio::test]
    async fn invalid_day_is_bad_request() {
        let state = DbState::in_memory();
        let (user, control, account) = {
            let connection = state.lock().unwrap();
            let (user, control) = insert_test_control(&connection);
            let account = insert_test_account(control.id, &connection);
            (user, control, account)
        };

        let response = create_card_endpoint(
            State(state),
            Extension(user.id),
            Path(control.id),
            form(account.id, 32),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn viewer_is_forbidden() {
        let state = DbState::in_memory();
        let (viewer, control, account) = {
            let connection = state.lock().unwrap();
            let (_, control) = insert_test_control(&connection);
            let account = insert_test_account(control.id, &connection);
            (insert_test_viewer(control.id, &connection), control, account)
        };

        let response = create_card_endpoint(
            State(state),
            Extension(viewer.id),
            Path(control.id),
            form(account.id, 3),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
