//! The card form and the page for editing a card.

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
    card::core::{Card, CardId, get_card},
    control::{ControlId, Role, authorize},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        FormAction, base, dollar_input_styles,
    },
    navigation::NavBar,
};

fn day_input(id: &str, label: &str, value: Option<u8>) -> Markup {
    html!(
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { (label) }

            input
                id=(id)
                type="number"
                name=(id)
                min="1"
                max="31"
                step="1"
                value=[value]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    )
}

/// The form for creating or editing a card, prefilled from `card`.
pub fn card_form(
    action: FormAction<'_>,
    card: Option<&Card>,
    accounts: &[Account],
    submit_text: &str,
) -> Markup {
    let credit_limit = card.map(|card| format!("{:.2}", card.credit_limit));
    let payment_account_id = card.map(|card| card.payment_account_id);

    html!(
        form
            hx-post=[action.hx_post()]
            hx-put=[action.hx_put()]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Visa"
                    value=[card.map(|card| card.name.as_str())]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="grid grid-cols-2 gap-4"
            {
                (day_input("closing_day", "Closing day", card.map(|card| card.closing_day)))
                (day_input("due_day", "Due day", card.map(|card| card.due_day)))
            }

            div
            {
                label for="credit_limit" class=(FORM_LABEL_STYLE) { "Credit limit" }

                div class="input-wrapper w-full"
                {
                    input
                        id="credit_limit"
                        type="number"
                        step="0.01"
                        min="0"
                        name="credit_limit"
                        placeholder="0.00"
                        value=[credit_limit]
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="payment_account_id" class=(FORM_LABEL_STYLE) { "Paid from" }

                select
                    id="payment_account_id"
                    name="payment_account_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[payment_account_id == Some(account.id)]
                        {
                            (account.name)
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    )
}

fn edit_card_view(card: &Card, accounts: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_CARD_VIEW, card.control_id).into_html();
    let update_url = format_endpoint(endpoints::CARD, &[&card.control_id, &card.id]);

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Card" }
            p class="mb-4 text-sm text-gray-500 dark:text-gray-400"
            {
                "New billing days only apply to invoices created after the change."
            }
            (card_form(FormAction::Put(&update_url), Some(card), accounts, "Save Card"))
        }
    );

    base("Edit Card", &[dollar_input_styles()], &content)
}

/// Renders the page for editing a card.
pub async fn get_edit_card_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, card_id)): Path<(ControlId, CardId)>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    authorize(control_id, user_id, Role::Editor, &connection)?;
    let card = get_card(control_id, card_id, &connection)?;
    let accounts = get_accounts(control_id, &connection)?;

    Ok(edit_card_view(&card, &accounts).into_response())
}
