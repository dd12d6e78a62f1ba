//! The account form and the page for editing an account.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::core::{Account, AccountId, get_account},
    app_state::DbState,
    auth::UserID,
    control::{ControlId, Role, authorize},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        FormAction, base, dollar_input_styles,
    },
    navigation::NavBar,
};

/// The form for creating or editing an account, prefilled from `account`.
pub fn account_form(action: FormAction<'_>, account: Option<&Account>, submit_text: &str) -> Markup {
    let opening_balance = account.map(|account| format!("{:.2}", account.opening_balance));

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
                    placeholder="Checking"
                    value=[account.map(|account| account.name.as_str())]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="opening_balance" class=(FORM_LABEL_STYLE) { "Opening balance" }

                div class="input-wrapper w-full"
                {
                    input
                        id="opening_balance"
                        type="number"
                        step="0.01"
                        name="opening_balance"
                        placeholder="0.00"
                        value=[opening_balance]
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    )
}

fn edit_account_view(account: &Account) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_ACCOUNT_VIEW, account.control_id).into_html();
    let update_url = format_endpoint(endpoints::ACCOUNT, &[&account.control_id, &account.id]);

    let content = html!(
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Account" }
            (account_form(FormAction::Put(&update_url), Some(account), "Save Account"))
        }
    );

    base("Edit Account", &[dollar_input_styles()], &content)
}

/// Renders the page for editing an account.
pub async fn get_edit_account_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, account_id)): Path<(ControlId, AccountId)>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    authorize(control_id, user_id, Role::Editor, &connection)?;
    let account = get_account(control_id, account_id, &connection)?;

    Ok(edit_account_view(&account).into_response())
}
