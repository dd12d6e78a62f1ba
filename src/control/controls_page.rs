//! The list of financial controls of the logged in user, the form for
//! creating a control and the redirect from a control to its current month.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    app_state::DbState,
    auth::UserID,
    control::core::{
        ControlId, ControlMembership, Role, authorize, create_control, delete_control,
        list_controls_for_user, rename_control,
    },
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        delete_action_link, link, page_header,
    },
    month::YearMonth,
    navigation::NavBar,
    timezone::local_today,
};

/// Display the financial controls the user belongs to.
pub async fn get_controls_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let memberships = list_controls_for_user(user_id, &connection)?;

    Ok(controls_view(&memberships).into_response())
}

/// Redirect from the landing page of a control to the dashboard of the current month.
pub async fn get_control_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    authorize(control_id, user_id, Role::Viewer, &connection)?;
    let month = YearMonth::from_date(local_today(&state.local_timezone)?);

    Ok(Redirect::to(&format_endpoint(endpoints::MONTH_VIEW, &[&control_id, &month])).into_response())
}

fn control_row(membership: &ControlMembership) -> Markup {
    let control = &membership.control;
    let url = control_endpoint(endpoints::CONTROL_VIEW, control.id);
    let delete_url = control_endpoint(endpoints::CONTROL, control.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? All of its accounts, cards and transactions \
        will be deleted too. This cannot be undone.",
        control.name
    );

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (link(&url, &control.name)) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(BADGE_STYLE) { (membership.role.label()) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if membership.role == Role::Owner {
                    (delete_action_link(&delete_url, &confirm_message, "closest tr", "delete"))
                }
            }
        }
    )
}

fn new_control_form() -> Markup {
    html!(
        form
            hx-post=(endpoints::POST_CONTROL)
            hx-target-error="#alert-container"
            class="w-full max-w-md space-y-4"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "New control name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Family budget"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Control" }
        }
    )
}

fn controls_view(memberships: &[ControlMembership]) -> Markup {
    let nav_bar = NavBar::without_control(endpoints::CONTROLS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-6"
            {
                (page_header("Financial Controls", None))

                div class="relative overflow-x-auto shadow-md rounded"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Your role" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for membership in memberships {
                                (control_row(membership))
                            }

                            @if memberships.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="3" class="px-6 py-4 text-center"
                                    {
                                        "You are not part of any financial control yet. \
                                        Create one below, or ask someone to share theirs with you."
                                    }
                                }
                            }
                        }
                    }
                }

                (new_control_form())
            }
        }
    );

    base("Financial Controls", &[], &content)
}

#[derive(Debug, Deserialize)]
pub struct ControlForm {
    pub name: String,
}

/// Create a financial control owned by the current user and open it.
pub async fn create_control_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ControlForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    match create_control(&form.name, user_id, &connection) {
        Ok(control) => {
            tracing::info!("user {user_id} created control {}", control.id);
            (
                HxRedirect(control_endpoint(endpoints::CONTROL_VIEW, control.id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Rename a financial control, only owners may do this.
pub async fn rename_control_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<ControlForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Owner, &connection)
        .and_then(|_| rename_control(control_id, &form.name, &connection));

    match result {
        Ok(()) => (
            HxRedirect(control_endpoint(endpoints::MEMBERS_VIEW, control_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// Delete a financial control and everything in it, only owners may do this.
pub async fn delete_control_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Owner, &connection)
        .and_then(|_| delete_control(control_id, &connection));

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => {
            tracing::info!("user {user_id} deleted control {control_id}");
            Alert::SuccessSimple {
                message: "Financial control deleted".to_owned(),
            }
            .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod controls_page_tests {
    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use scraper::Selector;

    use crate::{
        Error,
        app_state::DbState,
        control::core::{Role, add_member, create_control, get_control},
        endpoints::{self, control_endpoint},
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_hx_redirect, assert_valid_html,
            get_header, insert_test_user, insert_test_user_with_email, must_get_form,
            parse_html_document,
        },
    };

    use super::{
        ControlForm, create_control_endpoint, delete_control_endpoint, get_control_page,
        get_controls_page, rename_control_endpoint,
    };

    #[tokio::test]
    async fn lists_controls_with_create_form() {
        let state = DbState::in_memory();
        let user = {
            let connection = state.lock().unwrap();
            let user = insert_test_user(&connection);
            create_control("Family", user.id, &connection).unwrap();
            user
        };

        let response = get_controls_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows: Vec<_> = html
            .select(&Selector::parse("tbody tr").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("Family"));
        assert!(rows[0].contains("Owner"));
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_CONTROL, "hx-post");
        assert_form_input(&form, "name", "text");
    }

    #[tokio::test]
    async fn only_owners_see_delete_button() {
        let state = DbState::in_memory();
        let viewer = {
            let connection = state.lock().unwrap();
            let owner = insert_test_user(&connection);
            let viewer = insert_test_user_with_email("viewer@example.com", &connection);
            let control = create_control("Family", owner.id, &connection).unwrap();
            add_member(control.id, "viewer@example.com", Role::Viewer, &connection).unwrap();
            viewer
        };

        let response = get_controls_page(State(state), Extension(viewer.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let delete_buttons = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .count();
        assert_eq!(delete_buttons, 0);
    }

    #[tokio::test]
    async fn control_page_redirects_to_current_month() {
        let state = DbState::in_memory();
        let (user, control) = {
            let connection = state.lock().unwrap();
            let user = insert_test_user(&connection);
            let control = create_control("Family", user.id, &connection).unwrap();
            (user, control)
        };

        let response = get_control_page(State(state), Extension(user.id), Path(control.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = get_header(&response, "location");
        assert!(
            location.starts_with(&format!("/controls/{}/months/", control.id)),
            "got location {location}"
        );
    }

    #[tokio::test]
    async fn control_page_hides_controls_of_others() {
        let state = DbState::in_memory();
        let (stranger, control) = {
            let connection = state.lock().unwrap();
            let owner = insert_test_user(&connection);
            let stranger = insert_test_user_with_email("stranger@example.com", &connection);
            let control = create_control("Family", owner.id, &connection).unwrap();
            (stranger, control)
        };

        let result = get_control_page(State(state), Extension(stranger.id), Path(control.id)).await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
    }

    #[tokio::test]
    async fn create_control_redirects_to_new_control() {
        let state = DbState::in_memory();
        let user = insert_test_user(&state.lock().unwrap());

        let response = create_control_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(ControlForm {
                name: "Family".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, &control_endpoint(endpoints::CONTROL_VIEW, 1));
        assert_eq!(get_control(1, &state.lock().unwrap()).unwrap().name, "Family");
    }

    #[tokio::test]
    async fn editor_cannot_rename_or_delete_control() {
        let state = DbState::in_memory();
        let (editor, control) = {
            let connection = state.lock().unwrap();
            let owner = insert_test_user(&connection);
            let editor = insert_test_user_with_email("editor@example.com", &connection);
            let control = create_control("Family", owner.id, &connection).unwrap();
            add_member(control.id, "editor@example.com", Role::Editor, &connection).unwrap();
            (editor, control)
        };

        let response = rename_control_endpoint(
            State(state.clone()),
            Extension(editor.id),
            Path(control.id),
            Form(ControlForm {
                name: "Mine now".to_owned(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response =
            delete_control_endpoint(State(state.clone()), Extension(editor.id), Path(control.id))
                .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            get_control(control.id, &state.lock().unwrap()).unwrap().name,
            "Family"
        );
    }

    #[tokio::test]
    async fn owner_can_delete_control() {
        let state = DbState::in_memory();
        let (owner, control) = {
            let connection = state.lock().unwrap();
            let owner = insert_test_user(&connection);
            let control = create_control("Family", owner.id, &connection).unwrap();
            (owner, control)
        };

        let response =
            delete_control_endpoint(State(state.clone()), Extension(owner.id), Path(control.id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_control(control.id, &state.lock().unwrap()),
            Err(Error::NotFound)
        );
    }
}
