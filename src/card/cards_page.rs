//! Displays the credit cards of a control with their limits.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{Account, get_accounts},
    app_state::DbState,
    auth::UserID,
    card::{
        core::{Card, available_limit, get_cards, used_limit},
        edit_page::card_form,
    },
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        FormAction, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, dollar_input_styles, edit_delete_action_links, format_currency,
        link, page_header,
    },
    navigation::NavBar,
};

struct CardRow {
    card: Card,
    payment_account: String,
    used_limit: f64,
    available_limit: f64,
}

impl CardRow {
    fn invoices_url(&self) -> String {
        format_endpoint(
            endpoints::INVOICES_VIEW,
            &[&self.card.control_id, &self.card.id],
        )
    }

    fn edit_url(&self) -> String {
        format_endpoint(
            endpoints::EDIT_CARD_VIEW,
            &[&self.card.control_id, &self.card.id],
        )
    }

    fn delete_url(&self) -> String {
        format_endpoint(endpoints::CARD, &[&self.card.control_id, &self.card.id])
    }

    fn confirm_delete_message(&self) -> String {
        format!(
            "Are you sure you want to delete the card '{}' and its invoices? This cannot be undone.",
            self.card.name
        )
    }
}

fn cards_view(
    control_id: ControlId,
    cards: &[CardRow],
    accounts: &[Account],
    can_edit: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CARDS_VIEW, control_id).into_html();

    let table_row = |row: &CardRow| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (row.card.name)
                }
                td class=(TABLE_CELL_STYLE)
                {
                    "Closes on " (row.card.closing_day) ", due on " (row.card.due_day)
                }
                td class=(TABLE_CELL_STYLE) { (row.payment_account) }
                td class="px-6 py-4 text-right" { (format_currency(row.card.credit_limit)) }
                td class="px-6 py-4 text-right" { (format_currency(row.used_limit)) }
                td class="px-6 py-4 text-right" { (format_currency(row.available_limit)) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (link(&row.invoices_url(), "Invoices"))

                        @if can_edit {
                            (edit_delete_action_links(
                                &row.edit_url(),
                                &row.delete_url(),
                                &row.confirm_delete_message(),
                                "closest tr",
                                "delete",
                            ))
                        }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-6xl"
            {
                (page_header("Cards", None))

                ul class="lg:hidden space-y-4"
                {
                    @for row in cards {
                        li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                            data-card-item="true"
                        {
                            div class="flex items-start justify-between gap-3"
                            {
                                a href=(row.invoices_url()) class=(LINK_STYLE) { (row.card.name) }
                                div class="text-sm tabular-nums text-right"
                                {
                                    (format_currency(row.available_limit)) " available"
                                }
                            }

                            @if can_edit {
                                div class="mt-2 flex items-center gap-4 text-sm"
                                {
                                    (edit_delete_action_links(
                                        &row.edit_url(),
                                        &row.delete_url(),
                                        &row.confirm_delete_message(),
                                        "closest [data-card-item='true']",
                                        "outerHTML",
                                    ))
                                }
                            }
                        }
                    }
                }

                section class="hidden lg:block w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Billing" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Paid from" }
                                th scope="col" class="px-6 py-3 text-right" { "Limit" }
                                th scope="col" class="px-6 py-3 text-right" { "Used" }
                                th scope="col" class="px-6 py-3 text-right" { "Available" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in cards {
                                (table_row(row))
                            }

                            @if cards.is_empty() {
                                tr
                                {
                                    td colspan="7" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No cards found."
                                    }
                                }
                            }
                        }
                    }
                }

                @if can_edit {
                    div class="max-w-md"
                    {
                        h2 class="text-lg font-semibold mb-4" { "Add a card" }

                        @if accounts.is_empty() {
                            p
                            {
                                "Cards are paid from an account. "
                                (link(&control_endpoint(endpoints::ACCOUNTS_VIEW, control_id), "Add an account"))
                                " first."
                            }
                        } @else {
                            (card_form(
                                FormAction::Post(&control_endpoint(endpoints::POST_CARD, control_id)),
                                None,
                                accounts,
                                "Add Card",
                            ))
                        }
                    }
                }
            }
        }
    );

    base("Cards", &[dollar_input_styles()], &content)
}

/// Renders the list of cards with their used and available limits.
pub async fn get_cards_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let accounts = get_accounts(control_id, &connection)?;

    let rows = get_cards(control_id, &connection)?
        .into_iter()
        .map(|card| {
            let payment_account = accounts
                .iter()
                .find(|account| account.id == card.payment_account_id)
                .map(|account| account.name.clone())
                .unwrap_or_default();

            Ok(CardRow {
                payment_account,
                used_limit: used_limit(card.id, &connection)?,
                available_limit: available_limit(&card, &connection)?,
                card,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(cards_view(control_id, &rows, &accounts, role >= Role::Editor).into_response())
}

#[cfg(test)]
mod cards_page_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use scraper::Selector;

    use crate::{
        app_state::DbState,
        endpoints::{self, control_endpoint, format_endpoint},
        test_utils::{
            assert_hx_endpoint, assert_valid_html, insert_test_account, insert_test_card,
            insert_test_control, must_get_form, parse_html_document,
        },
    };

    use super::get_cards_page;

    #[tokio::test]
    async fn lists_cards_with_invoice_links() {
        let state = DbState::in_memory();
        let (user, control, card) = {
            let connection = state.lock().unwrap();
            let (user, control) = insert_test_control(&connection);
            let account = insert_test_account(control.id, &connection);
            let card = insert_test_card(control.id, account.id, 5, 15, &connection);
            (user, control, card)
        };

        let response = get_cards_page(State(state), Extension(user.id), Path(control.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows: Vec<_> = html
            .select(&Selector::parse("table tbody tr").unwrap())
            .collect();
        assert_eq!(rows.len(), 1);
        let invoices_url = format_endpoint(endpoints::INVOICES_VIEW, &[&control.id, &card.id]);
        let has_invoices_link = rows[0]
            .select(&Selector::parse("a").unwrap())
            .any(|link| link.attr("href") == Some(invoices_url.as_str()));
        assert!(has_invoices_link, "no link to {invoices_url}");

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &control_endpoint(endpoints::POST_CARD, control.id),
            "hx-post",
        );
    }

    #[tokio::test]
    async fn asks_for_an_account_before_adding_cards() {
        let state = DbState::in_memory();
        let (user, control) = insert_test_control(&state.lock().unwrap());

        let response = get_cards_page(State(state), Extension(user.id), Path(control.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert!(html.select(&Selector::parse("form").unwrap()).next().is_none());
        let accounts_url = control_endpoint(endpoints::ACCOUNTS_VIEW, control.id);
        assert!(
            html.select(&Selector::parse("a").unwrap())
                .any(|link| link.attr("href") == Some(accounts_url.as_str()))
        );
    }
}
