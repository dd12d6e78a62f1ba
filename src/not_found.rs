//! The pages shown for missing resources and forbidden actions.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// The fallback route handler.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    let page = error_view(
        "Not Found",
        "404",
        "Page not found.",
        "Sorry, we can't find that page. Check the link or go back to your financial controls.",
    );

    (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
}

/// The page shown when a member's role does not allow an action.
pub fn get_403_forbidden_response() -> Response {
    let page = error_view(
        "Forbidden",
        "403",
        "You can't do that here.",
        "Your role in this financial control does not allow this. Ask an owner for access.",
    );

    (StatusCode::FORBIDDEN, Html(page.into_string())).into_response()
}
