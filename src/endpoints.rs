//! The API endpoints URIs.
//!
//! For endpoints that take parameters, e.g., '/controls/{control_id}/accounts', use [format_endpoint].

/// The root route which redirects to the list of financial controls.
pub const ROOT: &str = "/";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The page listing the financial controls of the user.
pub const CONTROLS_VIEW: &str = "/controls";
/// The landing page of a financial control, redirects to the current month.
pub const CONTROL_VIEW: &str = "/controls/{control_id}";
/// The month dashboard of a financial control.
pub const MONTH_VIEW: &str = "/controls/{control_id}/months/{month}";
/// The page for creating a transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/controls/{control_id}/transactions/new";
/// The page for editing a transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/controls/{control_id}/transactions/{transaction_id}/edit";
/// The page listing provisioned (recurring and installment) transactions.
pub const PROVISIONED_VIEW: &str = "/controls/{control_id}/provisioned";
/// The page for editing a provisioned transaction.
pub const EDIT_PROVISIONED_VIEW: &str = "/controls/{control_id}/provisioned/{provisioned_id}/edit";
/// The page listing bank accounts.
pub const ACCOUNTS_VIEW: &str = "/controls/{control_id}/accounts";
/// The page for editing a bank account.
pub const EDIT_ACCOUNT_VIEW: &str = "/controls/{control_id}/accounts/{account_id}/edit";
/// The page listing credit cards.
pub const CARDS_VIEW: &str = "/controls/{control_id}/cards";
/// The page for editing a credit card.
pub const EDIT_CARD_VIEW: &str = "/controls/{control_id}/cards/{card_id}/edit";
/// The page listing the invoices of a credit card.
pub const INVOICES_VIEW: &str = "/controls/{control_id}/cards/{card_id}/invoices";
/// The page listing transfers between accounts.
pub const TRANSFERS_VIEW: &str = "/controls/{control_id}/transfers";
/// The page listing savings boxes.
pub const BOXES_VIEW: &str = "/controls/{control_id}/boxes";
/// The page listing categories and classifications.
pub const CATEGORIES_VIEW: &str = "/controls/{control_id}/categories";
/// The page listing the members of a financial control.
pub const MEMBERS_VIEW: &str = "/controls/{control_id}/members";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create financial controls.
pub const POST_CONTROL: &str = "/api/controls";
/// The route to rename or delete a financial control.
pub const CONTROL: &str = "/api/controls/{control_id}";
/// The route to generate the ledger entries of provisioned transactions up to a month.
pub const GENERATE_MONTH: &str = "/api/controls/{control_id}/months/{month}/generate";
/// The route to create transactions.
pub const POST_TRANSACTION: &str = "/api/controls/{control_id}/transactions";
/// The route to update or delete a transaction.
pub const TRANSACTION: &str = "/api/controls/{control_id}/transactions/{transaction_id}";
/// The route to toggle whether a transaction has been paid.
pub const TOGGLE_TRANSACTION_PAID: &str =
    "/api/controls/{control_id}/transactions/{transaction_id}/paid";
/// The route to create provisioned transactions.
pub const POST_PROVISIONED: &str = "/api/controls/{control_id}/provisioned";
/// The route to update or delete a provisioned transaction.
pub const PROVISIONED: &str = "/api/controls/{control_id}/provisioned/{provisioned_id}";
/// The route to create accounts.
pub const POST_ACCOUNT: &str = "/api/controls/{control_id}/accounts";
/// The route to update or delete an account.
pub const ACCOUNT: &str = "/api/controls/{control_id}/accounts/{account_id}";
/// The route to create cards.
pub const POST_CARD: &str = "/api/controls/{control_id}/cards";
/// The route to update or delete a card.
pub const CARD: &str = "/api/controls/{control_id}/cards/{card_id}";
/// The route to pay an invoice.
pub const PAY_INVOICE: &str = "/api/controls/{control_id}/invoices/{invoice_id}/pay";
/// The route to undo the payment of an invoice.
pub const REOPEN_INVOICE: &str = "/api/controls/{control_id}/invoices/{invoice_id}/reopen";
/// The route to create transfers.
pub const POST_TRANSFER: &str = "/api/controls/{control_id}/transfers";
/// The route to delete a transfer.
pub const TRANSFER: &str = "/api/controls/{control_id}/transfers/{transfer_id}";
/// The route to create savings boxes.
pub const POST_BOX: &str = "/api/controls/{control_id}/boxes";
/// The route to delete a savings box.
pub const BOX: &str = "/api/controls/{control_id}/boxes/{box_id}";
/// The route to deposit into or withdraw from a savings box.
pub const BOX_MOVEMENTS: &str = "/api/controls/{control_id}/boxes/{box_id}/movements";
/// The route to create categories.
pub const POST_CATEGORY: &str = "/api/controls/{control_id}/categories";
/// The route to delete a category.
pub const CATEGORY: &str = "/api/controls/{control_id}/categories/{category_id}";
/// The route to create classifications.
pub const POST_CLASSIFICATION: &str = "/api/controls/{control_id}/classifications";
/// The route to delete a classification.
pub const CLASSIFICATION: &str = "/api/controls/{control_id}/classifications/{classification_id}";
/// The route to add members to a financial control.
pub const POST_MEMBER: &str = "/api/controls/{control_id}/members";
/// The route to change the role of or remove a member.
pub const MEMBER: &str = "/api/controls/{control_id}/members/{user_id}";

/// Replace the parameters in `endpoint_path` with `params`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/controls/{control_id}', '{control_id}' is the parameter.
///
/// Parameters without a matching value are left untouched, and extra values
/// are ignored.
pub fn format_endpoint(endpoint_path: &str, params: &[&dyn std::fmt::Display]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut rest = endpoint_path;
    let mut params = params.iter();

    while let Some(param_start) = rest.find('{') {
        let Some(param_len) = rest[param_start..].find('}') else {
            break;
        };
        let Some(value) = params.next() else {
            break;
        };

        formatted.push_str(&rest[..param_start]);
        formatted.push_str(&value.to_string());
        rest = &rest[param_start + param_len + 1..];
    }

    formatted.push_str(rest);
    formatted
}

/// Shortcut for formatting an endpoint that only takes a control ID.
pub fn control_endpoint(endpoint_path: &str, control_id: i64) -> String {
    format_endpoint(endpoint_path, &[&control_id])
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::CONTROLS_VIEW,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::POST_CONTROL,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn formatted_parameterised_endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::CONTROL_VIEW,
            endpoints::MONTH_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::EDIT_TRANSACTION_VIEW,
            endpoints::PROVISIONED_VIEW,
            endpoints::EDIT_PROVISIONED_VIEW,
            endpoints::ACCOUNTS_VIEW,
            endpoints::EDIT_ACCOUNT_VIEW,
            endpoints::CARDS_VIEW,
            endpoints::EDIT_CARD_VIEW,
            endpoints::INVOICES_VIEW,
            endpoints::TRANSFERS_VIEW,
            endpoints::BOXES_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::MEMBERS_VIEW,
            endpoints::CONTROL,
            endpoints::GENERATE_MONTH,
            endpoints::POST_TRANSACTION,
            endpoints::TRANSACTION,
            endpoints::TOGGLE_TRANSACTION_PAID,
            endpoints::POST_PROVISIONED,
            endpoints::PROVISIONED,
            endpoints::POST_ACCOUNT,
            endpoints::ACCOUNT,
            endpoints::POST_CARD,
            endpoints::CARD,
            endpoints::PAY_INVOICE,
            endpoints::REOPEN_INVOICE,
            endpoints::POST_TRANSFER,
            endpoints::TRANSFER,
            endpoints::POST_BOX,
            endpoints::BOX,
            endpoints::BOX_MOVEMENTS,
            endpoints::POST_CATEGORY,
            endpoints::CATEGORY,
            endpoints::POST_CLASSIFICATION,
            endpoints::CLASSIFICATION,
            endpoints::POST_MEMBER,
            endpoints::MEMBER,
        ] {
            let formatted = format_endpoint(endpoint, &[&1, &"2025-01"]);

            assert!(!formatted.contains('{'), "{formatted} still has parameters");
            assert_endpoint_is_valid_uri(&formatted);
        }
    }

    #[test]
    fn replaces_single_parameter() {
        let formatted_path = format_endpoint("/hello/{world_id}", &[&1]);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn replaces_parameters_in_order() {
        let formatted_path = format_endpoint("/controls/{control_id}/months/{month}", &[&3, &"2025-04"]);

        assert_eq!(formatted_path, "/controls/3/months/2025-04");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", &[&1]);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", &[&1]);

        assert_eq!(formatted_path, "/hello/1/bye");
    }

    #[test]
    fn leaves_parameters_without_values() {
        let formatted_path = format_endpoint("/a/{a_id}/b/{b_id}", &[&1]);

        assert_eq!(formatted_path, "/a/1/b/{b_id}");
    }
}
