//! Financial control is a web app for tracking the finances of a person or a
//! family: bank accounts, credit cards and their invoices, recurring and
//! installment expenses, transfers and savings boxes.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod card;
mod category;
mod classification;
mod control;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod invoice;
mod logging;
mod money;
mod month;
mod navigation;
mod not_found;
mod provisioned;
mod routing;
mod savings_box;
mod timezone;
mod transaction;
mod transfer;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, get_user_by_email, parse_email, update_password,
};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use month::YearMonth;
pub use routing::build_router;
pub use timezone::get_local_offset;

/// Functions used by the binaries to populate a database.
pub mod seed {
    pub use crate::account::{NewAccount, create_account};
    pub use crate::auth::{create_user, parse_email};
    pub use crate::card::{NewCard, create_card};
    pub use crate::category::{CategoryKind, create_category};
    pub use crate::control::create_control;
    pub use crate::provisioned::{NewProvisioned, Recurrence, create_provisioned};
    pub use crate::transaction::{PaymentSource, TransactionKind, generate_through};
}

use crate::{
    alert::Alert,
    internal_server_error::InternalServerError,
    not_found::{get_403_forbidden_response, get_404_not_found_response},
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    #[error("could not create or read the cookie expiry date-time")]
    InvalidDateFormat,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address is already used by another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// No registered user has the email address.
    #[error("no user is registered with the email \"{0}\"")]
    UnknownEmail(String),

    /// An empty string was used as a name.
    #[error("name cannot be empty")]
    EmptyName,

    /// A monetary amount was zero, negative or not a number where a positive
    /// amount is required.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// A day of the month outside of 1..=31.
    #[error("{0} is not a valid day of the month")]
    InvalidDay(u8),

    /// A month string that is not in the format `YYYY-MM`.
    #[error("\"{0}\" is not a valid month, expected the format YYYY-MM")]
    InvalidMonth(String),

    /// An end month before the start month.
    #[error("the end month must not be before the start month")]
    InvalidMonthRange,

    /// An installment plan needs at least one installment.
    #[error("the number of installments must be at least one")]
    InvalidInstallmentCount,

    /// The requested resource was not found.
    ///
    /// This is also returned when the resource exists but belongs to a
    /// financial control the user is not a member of.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The user is a member of the financial control but their role does
    /// not allow the operation.
    #[error("your role does not allow this operation")]
    Forbidden,

    /// The user is already a member of the financial control.
    #[error("the user is already a member of this financial control")]
    AlreadyMember,

    /// Removing or demoting the member would leave the control without an owner.
    #[error("a financial control must have at least one owner")]
    LastOwner,

    /// The specified account name already exists in the financial control.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// A category, classification, card or box with the same name already exists.
    #[error("\"{0}\" already exists")]
    DuplicateName(String),

    /// The account ID does not refer to an account in the financial control.
    #[error("the account does not exist in this financial control")]
    InvalidAccount,

    /// The card ID does not refer to a card in the financial control.
    #[error("the card does not exist in this financial control")]
    InvalidCard,

    /// The category ID does not refer to a category in the financial control.
    #[error("the category does not exist in this financial control")]
    InvalidCategory,

    /// The classification ID does not refer to a classification in the financial control.
    #[error("the classification does not exist in this financial control")]
    InvalidClassification,

    /// The account is still referenced by transactions, transfers, boxes or cards.
    #[error("the account is still in use")]
    AccountInUse,

    /// The card still has transactions.
    #[error("the card still has transactions")]
    CardInUse,

    /// The operation would change an invoice that has already been paid.
    #[error("the invoice has already been paid")]
    InvoicePaid,

    /// Card transactions are paid through their invoice.
    #[error("card transactions are paid through their invoice")]
    CardTransactionPaid,

    /// A transfer must move money between two different accounts.
    #[error("cannot transfer money from an account to itself")]
    SameAccountTransfer,

    /// The account does not have enough money available for the deposit.
    #[error("the account only has {0:.2} available")]
    InsufficientFunds(f64),

    /// The savings box does not hold enough money for the withdrawal.
    #[error("the box only holds {0:.2}")]
    InsufficientBoxBalance(f64),

    /// A savings box can only be deleted once it is empty.
    #[error("the box still holds money")]
    BoxNotEmpty,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Whether `error` is a failed UNIQUE constraint.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::Forbidden => get_403_forbidden_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for htmx requests.
    fn into_alert_response(self) -> Response {
        let (status_code, message, details): (StatusCode, &str, String) = match &self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "Not found",
                "The item could not be found. \
                Try refreshing the page to see if it has already been deleted."
                    .to_owned(),
            ),
            Error::Forbidden => (
                StatusCode::FORBIDDEN,
                "Not allowed",
                "Your role in this financial control does not allow this change. \
                Ask an owner of the control for access."
                    .to_owned(),
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not update transaction",
                "The transaction could not be found.".to_owned(),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not delete transaction",
                "The transaction could not be found. \
                Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            ),
            Error::DuplicateAccountName(name) => (
                StatusCode::BAD_REQUEST,
                "Duplicate Account Name",
                format!(
                    "The account {name} already exists. \
                    Choose a different account name, or edit or delete the existing account.",
                ),
            ),
            Error::InvoicePaid => (
                StatusCode::BAD_REQUEST,
                "Invoice already paid",
                "The change affects an invoice that has already been paid. \
                Reopen the invoice first if you really want to change it."
                    .to_owned(),
            ),
            Error::InvalidAmount(_)
            | Error::InvalidDay(_)
            | Error::InvalidMonth(_)
            | Error::InvalidMonthRange
            | Error::InvalidInstallmentCount
            | Error::EmptyName
            | Error::InvalidEmail(_)
            | Error::UnknownEmail(_)
            | Error::AlreadyMember
            | Error::LastOwner
            | Error::DuplicateName(_)
            | Error::DuplicateEmail
            | Error::InvalidAccount
            | Error::InvalidCard
            | Error::InvalidCategory
            | Error::InvalidClassification
            | Error::AccountInUse
            | Error::CardInUse
            | Error::CardTransactionPaid
            | Error::SameAccountTransfer
            | Error::InsufficientFunds(_)
            | Error::InsufficientBoxBalance(_)
            | Error::BoxNotEmpty => (
                StatusCode::BAD_REQUEST,
                "Invalid request",
                capitalise_first_char(&self.to_string()),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        Alert::Error {
            message: message.to_owned(),
            details,
        }
        .into_response_with_status(status_code)
    }
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn missing_rows_become_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn not_found_renders_404_page() {
        let response = Error::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn forbidden_renders_403_page() {
        let response = Error::Forbidden.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn user_errors_render_bad_request_alerts() {
        let response = Error::SameAccountTransfer.into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_errors_render_internal_server_error_alerts() {
        let response = Error::DatabaseLockError.into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
