//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_accounts_page, get_edit_account_page,
    },
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    card::{
        create_card_endpoint, delete_card_endpoint, edit_card_endpoint, get_cards_page,
        get_edit_card_page,
    },
    category::{create_category_endpoint, delete_category_endpoint, get_categories_page},
    classification::{create_classification_endpoint, delete_classification_endpoint},
    control::{
        add_member_endpoint, create_control_endpoint, delete_control_endpoint, get_control_page,
        get_controls_page, get_members_page, remove_member_endpoint, rename_control_endpoint,
        update_member_endpoint,
    },
    dashboard::get_month_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    invoice::{get_invoices_page, pay_invoice_endpoint, reopen_invoice_endpoint},
    not_found::get_404_not_found,
    provisioned::{
        create_provisioned_endpoint, delete_provisioned_endpoint, edit_provisioned_endpoint,
        get_edit_provisioned_page, get_provisioned_page,
    },
    savings_box::{
        box_movement_endpoint, create_box_endpoint, delete_box_endpoint, get_boxes_page,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        generate_month_endpoint, get_edit_transaction_page, get_new_transaction_page,
        toggle_transaction_paid_endpoint,
    },
    transfer::{create_transfer_endpoint, delete_transfer_endpoint, get_transfers_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::CONTROLS_VIEW, get(get_controls_page))
        .route(endpoints::CONTROL_VIEW, get(get_control_page))
        .route(endpoints::MONTH_VIEW, get(get_month_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::PROVISIONED_VIEW, get(get_provisioned_page))
        .route(
            endpoints::EDIT_PROVISIONED_VIEW,
            get(get_edit_provisioned_page),
        )
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::CARDS_VIEW, get(get_cards_page))
        .route(endpoints::EDIT_CARD_VIEW, get(get_edit_card_page))
        .route(endpoints::INVOICES_VIEW, get(get_invoices_page))
        .route(endpoints::TRANSFERS_VIEW, get(get_transfers_page))
        .route(endpoints::BOXES_VIEW, get(get_boxes_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::MEMBERS_VIEW, get(get_members_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::POST_CONTROL, post(create_control_endpoint))
            .route(
                endpoints::CONTROL,
                put(rename_control_endpoint).delete(delete_control_endpoint),
            )
            .route(endpoints::POST_MEMBER, post(add_member_endpoint))
            .route(
                endpoints::MEMBER,
                put(update_member_endpoint).delete(remove_member_endpoint),
            )
            .route(endpoints::GENERATE_MONTH, post(generate_month_endpoint))
            .route(
                endpoints::POST_TRANSACTION,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(
                endpoints::TOGGLE_TRANSACTION_PAID,
                post(toggle_transaction_paid_endpoint),
            )
            .route(
                endpoints::POST_PROVISIONED,
                post(create_provisioned_endpoint),
            )
            .route(
                endpoints::PROVISIONED,
                put(edit_provisioned_endpoint).delete(delete_provisioned_endpoint),
            )
            .route(endpoints::POST_ACCOUNT, post(create_account_endpoint))
            .route(
                endpoints::ACCOUNT,
                put(edit_account_endpoint).delete(delete_account_endpoint),
            )
            .route(endpoints::POST_CARD, post(create_card_endpoint))
            .route(
                endpoints::CARD,
                put(edit_card_endpoint).delete(delete_card_endpoint),
            )
            .route(endpoints::PAY_INVOICE, post(pay_invoice_endpoint))
            .route(endpoints::REOPEN_INVOICE, post(reopen_invoice_endpoint))
            .route(endpoints::POST_TRANSFER, post(create_transfer_endpoint))
            .route(endpoints::TRANSFER, delete(delete_transfer_endpoint))
            .route(endpoints::POST_BOX, post(create_box_endpoint))
            .route(endpoints::BOX, delete(delete_box_endpoint))
            .route(endpoints::BOX_MOVEMENTS, post(box_movement_endpoint))
            .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
            .route(endpoints::CATEGORY, delete(delete_category_endpoint))
            .route(
                endpoints::POST_CLASSIFICATION,
                post(create_classification_endpoint),
            )
            .route(
                endpoints::CLASSIFICATION,
                delete(delete_classification_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the list of financial controls.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::CONTROLS_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_controls() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::CONTROLS_VIEW);
    }
}
