//! Sharing a financial control: the members page and the endpoints for
//! adding members, changing their role and removing them.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
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
        Control, ControlId, Member, Role, add_member, authorize, get_control, get_members,
        remove_member, update_member_role,
    },
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        delete_action_link, page_header,
    },
    navigation::NavBar,
};

/// Display the members of a control. Owners also get the forms for managing them.
pub async fn get_members_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let control = get_control(control_id, &connection)?;
    let members = get_members(control_id, &connection)?;

    Ok(members_view(&control, &members, user_id, role == Role::Owner).into_response())
}

fn role_select(id: &str, current: Role) -> Markup {
    html!(
        select id=(id) name="role" aria-label="Role" class=(FORM_TEXT_INPUT_STYLE)
        {
            @for role in Role::ALL {
                option value=(role.as_str()) selected[role == current] { (role.label()) }
            }
        }
    )
}

fn member_row(
    control_id: ControlId,
    member: &Member,
    current_user: UserID,
    can_manage: bool,
) -> Markup {
    let member_url = format_endpoint(endpoints::MEMBER, &[&control_id, &member.user_id]);
    let is_current_user = member.user_id == current_user;
    let confirm_message = if is_current_user {
        "Are you sure you want to leave this financial control?".to_owned()
    } else {
        format!(
            "Are you sure you want to remove {} from this financial control?",
            member.name
        )
    };

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                (member.name)
                @if is_current_user {
                    " (you)"
                }
            }
            td class=(TABLE_CELL_STYLE) { (member.email) }
            td class=(TABLE_CELL_STYLE)
            {
                @if can_manage {
                    form
                        hx-put=(member_url)
                        hx-trigger="change"
                        hx-target-error="#alert-container"
                    {
                        (role_select(&format!("role-{}", member.user_id), member.role))
                    }
                } @else {
                    span class=(BADGE_STYLE) { (member.role.label()) }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if can_manage || is_current_user {
                    (delete_action_link(&member_url, &confirm_message, "closest tr", "delete"))
                }
            }
        }
    )
}

fn add_member_form(control_id: ControlId) -> Markup {
    html!(
        form
            hx-post=(control_endpoint(endpoints::POST_MEMBER, control_id))
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            h2 class="text-lg font-semibold" { "Add a member" }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "E-mail of a registered user" }

                input
                    id="email"
                    type="email"
                    name="email"
                    placeholder="name@example.com"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="new_member_role" class=(FORM_LABEL_STYLE) { "Role" }
                (role_select("new_member_role", Role::Editor))
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Member" }
        }
    )
}

fn rename_form(control: &Control) -> Markup {
    html!(
        form
            hx-put=(control_endpoint(endpoints::CONTROL, control.id))
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            h2 class="text-lg font-semibold" { "Rename" }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(control.name)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
        }
    )
}

fn members_view(
    control: &Control,
    members: &[Member],
    current_user: UserID,
    can_manage: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::MEMBERS_VIEW, control.id).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-8"
            {
                (page_header(&format!("Members of {}", control.name), None))

                div class="relative overflow-x-auto shadow-md rounded"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "E-mail" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Role" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for member in members {
                                (member_row(control.id, member, current_user, can_manage))
                            }
                        }
                    }
                }

                @if can_manage {
                    div class="grid gap-8 md:grid-cols-2"
                    {
                        (add_member_form(control.id))
                        (rename_form(control))
                    }
                }
            }
        }
    );

    base("Members", &[], &content)
}

#[derive(Debug, Deserialize)]
pub struct NewMemberForm {
    pub email: String,
    pub role: Role,
}

pub async fn add_member_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
    Form(form): Form<NewMemberForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Owner, &connection)
        .and_then(|_| add_member(control_id, &form.email, form.role, &connection));

    match result {
        Ok(member) => {
            tracing::info!(
                "user {user_id} added user {} to control {control_id} as {}",
                member.user_id,
                member.role
            );
            (
                HxRedirect(control_endpoint(endpoints::MEMBERS_VIEW, control_id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberRoleForm {
    pub role: Role,
}

pub async fn update_member_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, member_id)): Path<(ControlId, i64)>,
    Form(form): Form<MemberRoleForm>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let result = authorize(control_id, user_id, Role::Owner, &connection).and_then(|_| {
        update_member_role(control_id, UserID::new(member_id), form.role, &connection)
    });

    match result {
        Ok(()) => (
            HxRedirect(control_endpoint(endpoints::MEMBERS_VIEW, control_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// Remove a member. Owners may remove anyone, other members may only leave.
pub async fn remove_member_endpoint(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path((control_id, member_id)): Path<(ControlId, i64)>,
) -> Response {
    let connection = match state.lock() {
        Ok(connection) => connection,
        Err(error) => return error.into_alert_response(),
    };

    let member_id = UserID::new(member_id);
    let required_role = if member_id == user_id {
        Role::Viewer
    } else {
        Role::Owner
    };

    let result = authorize(control_id, user_id, required_role, &connection)
        .and_then(|_| remove_member(control_id, member_id, &connection));

    match result {
        Ok(()) if member_id == user_id => (
            HxRedirect(endpoints::CONTROLS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Member removed".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod members_page_tests {
    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use scraper::Selector;

    use crate::{
        app_state::DbState,
        auth::User,
        control::core::{Control, Role, add_member, authorize, create_control, get_members},
        endpoints::{self, control_endpoint},
        test_utils::{
            assert_hx_redirect, assert_valid_html, insert_test_user, insert_test_user_with_email,
            parse_html_document,
        },
    };

    use super::{
        MemberRoleForm, NewMemberForm, add_member_endpoint, get_members_page,
        remove_member_endpoint, update_member_endpoint,
    };

    fn setup() -> (DbState, User, User, Control) {
        let state = DbState::in_memory();
        let (owner, other, control) = {
            let connection = state.lock().unwrap();
            let owner = insert_test_user(&connection);
            let other = insert_test_user_with_email("other@example.com", &connection);
            let control = create_control("Family", owner.id, &connection).unwrap();
            (owner, other, control)
        };

        (state, owner, other, control)
    }

    #[tokio::test]
    async fn owner_sees_management_forms() {
        let (state, owner, _, control) = setup();

        let response = get_members_page(State(state), Extension(owner.id), Path(control.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let add_form = html
            .select(&Selector::parse("form[hx-post]").unwrap())
            .next()
            .expect("no add member form");
        assert_eq!(
            add_form.value().attr("hx-post"),
            Some(control_endpoint(endpoints::POST_MEMBER, control.id).as_str())
        );
        assert!(html.select(&Selector::parse("form[hx-put]").unwrap()).count() >= 2);
    }

    #[tokio::test]
    async fn viewer_sees_read_only_list() {
        let (state, _, other, control) = setup();
        add_member(control.id, "other@example.com", Role::Viewer, &state.lock().unwrap()).unwrap();

        let response = get_members_page(State(state), Extension(other.id), Path(control.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(html.select(&Selector::parse("form").unwrap()).count(), 0);
        assert_eq!(html.select(&Selector::parse("tbody tr").unwrap()).count(), 2);
    }

    #[tokio::test]
    async fn owner_adds_member() {
        let (state, owner, other, control) = setup();

        let response = add_member_endpoint(
            State(state.clone()),
            Extension(owner.id),
            Path(control.id),
            Form(NewMemberForm {
                email: "other@example.com".to_owned(),
                role: Role::Editor,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(
            &response,
            &control_endpoint(endpoints::MEMBERS_VIEW, control.id),
        );
        assert_eq!(
            authorize(control.id, other.id, Role::Editor, &state.lock().unwrap()),
            Ok(Role::Editor)
        );
    }

    #[tokio::test]
    async fn adding_unknown_email_is_bad_request() {
        let (state, owner, _, control) = setup();

        let response = add_member_endpoint(
            State(state),
            Extension(owner.id),
            Path(control.id),
            Form(NewMemberForm {
                email: "nobody@example.com".to_owned(),
                role: Role::Viewer,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn demoting_last_owner_is_bad_request() {
        let (state, owner, _, control) = setup();

        let response = update_member_endpoint(
            State(state),
            Extension(owner.id),
            Path((control.id, owner.id.as_i64())),
            Form(MemberRoleForm { role: Role::Viewer }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn member_can_leave_but_not_remove_others() {
        let (state, owner, other, control) = setup();
        add_member(control.id, "other@example.com", Role::Editor, &state.lock().unwrap()).unwrap();

        let response = remove_member_endpoint(
            State(state.clone()),
            Extension(other.id),
            Path((control.id, owner.id.as_i64())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = remove_member_endpoint(
            State(state.clone()),
            Extension(other.id),
            Path((control.id, other.id.as_i64())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CONTROLS_VIEW);
        assert_eq!(get_members(control.id, &state.lock().unwrap()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn owner_removes_member_with_alert() {
        let (state, owner, other, control) = setup();
        add_member(control.id, "other@example.com", Role::Viewer, &state.lock().unwrap()).unwrap();

        let response = remove_member_endpoint(
            State(state),
            Extension(owner.id),
            Path((control.id, other.id.as_i64())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
