//! Alerts for telling the user whether an action succeeded or failed.
//!
//! Error alerts are returned as the body of failed htmx requests, which the
//! forms swap into `#alert-container` via `hx-target-error`. Success alerts are
//! swapped out-of-band so that the main response can still target a table row
//! or a list.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

const ALERT_SUCCESS_STYLE: &str = "flex items-start p-4 mb-4 text-green-800 \
    rounded-lg bg-green-50 dark:bg-gray-800 dark:text-green-400 shadow";
const ALERT_ERROR_STYLE: &str = "flex items-start p-4 mb-4 text-red-800 \
    rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400 shadow";

/// A message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action succeeded, with more details.
    #[allow(dead_code)]
    Success {
        /// The headline.
        message: String,
        /// The explanation under the headline.
        details: String,
    },
    /// The action succeeded.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// The action failed, with details on how to fix it.
    Error {
        /// The headline.
        message: String,
        /// What went wrong and how to fix it.
        details: String,
    },
    /// The action failed.
    #[allow(dead_code)]
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

impl Alert {
    fn is_success(&self) -> bool {
        matches!(self, Alert::Success { .. } | Alert::SuccessSimple { .. })
    }

    /// Render the alert without the out-of-band wrapper.
    pub fn into_markup(self) -> Markup {
        let style = if self.is_success() {
            ALERT_SUCCESS_STYLE
        } else {
            ALERT_ERROR_STYLE
        };

        let (message, details) = match self {
            Alert::Success { message, details } | Alert::Error { message, details } => {
                (message, Some(details))
            }
            Alert::SuccessSimple { message } | Alert::ErrorSimple { message } => (message, None),
        };

        html!(
            div class=(style) role="alert"
            {
                div class="ms-1 text-sm flex-1"
                {
                    p class="font-semibold" { (message) }

                    @if let Some(details) = details.filter(|details| !details.is_empty()) {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Close"
                    onclick="this.closest('[role=alert]').remove()"
                    class="ms-3 -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex
                        items-center justify-center h-8 w-8 hover:opacity-75"
                {
                    "✕"
                }
            }
        )
    }

    /// Render the alert as HTML.
    ///
    /// Success alerts are wrapped in an out-of-band swap for `#alert-container`.
    pub fn into_html(self) -> Html<String> {
        let markup = if self.is_success() {
            html!(
                div id="alert-container" hx-swap-oob="innerHTML" { (self.into_markup()) }
            )
        } else {
            self.into_markup()
        };

        Html(markup.into_string())
    }

    /// Render the alert with a specific status code.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        let status_code = if self.is_success() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };

        self.into_response_with_status(status_code)
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn success_alert_is_swapped_out_of_band() {
        let html = Alert::SuccessSimple {
            message: "Account deleted".to_owned(),
        }
        .into_html()
        .0;

        let document = Html::parse_fragment(&html);
        let selector = Selector::parse("#alert-container[hx-swap-oob] [role=alert]").unwrap();
        let alert = document.select(&selector).next().expect("alert not found");
        assert!(alert.text().collect::<String>().contains("Account deleted"));
    }

    #[test]
    fn error_alert_is_not_out_of_band() {
        let html = Alert::Error {
            message: "Invalid request".to_owned(),
            details: "Name cannot be empty".to_owned(),
        }
        .into_html()
        .0;

        let document = Html::parse_fragment(&html);
        let selector = Selector::parse("[hx-swap-oob]").unwrap();
        assert_eq!(document.select(&selector).count(), 0);
        assert!(html.contains("Name cannot be empty"));
    }

    #[test]
    fn default_status_codes() {
        let success = Alert::SuccessSimple {
            message: "ok".to_owned(),
        }
        .into_response();
        let error = Alert::ErrorSimple {
            message: "nope".to_owned(),
        }
        .into_response();

        assert_eq!(success.status(), StatusCode::OK);
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
