//! The page that lists the categories and classifications of a control.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    auth::UserID,
    category::core::{Category, get_categories},
    classification::{Classification, get_classifications},
    control::{ControlId, Role, authorize},
    endpoints::{self, control_endpoint, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        delete_action_link, page_header,
    },
    navigation::NavBar,
    transaction::TransactionKind,
};

fn categories_table(control_id: ControlId, categories: &[Category], can_edit: bool) -> Markup {
    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                    @if can_edit {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }
            }

            tbody id="categories"
            {
                @for category in categories {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (category.name) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            span class=(BADGE_STYLE) { (category.kind.label()) }
                        }
                        @if can_edit {
                            td class=(TABLE_CELL_STYLE)
                            {
                                (delete_action_link(
                                    &format_endpoint(endpoints::CATEGORY, &[&control_id, &category.id]),
                                    &format!(
                                        "Are you sure you want to delete '{}'? \
                                        Its transactions will become uncategorised.",
                                        category.name
                                    ),
                                    "closest tr",
                                    "delete",
                                ))
                            }
                        }
                    }
                }

                @if categories.is_empty() {
                    tr
                    {
                        td colspan="3" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No categories yet."
                        }
                    }
                }
            }
        }
    )
}

fn classifications_table(
    control_id: ControlId,
    classifications: &[Classification],
    can_edit: bool,
) -> Markup {
    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                    @if can_edit {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }
            }

            tbody id="classifications"
            {
                @for classification in classifications {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (classification.name) }
                        @if can_edit {
                            td class=(TABLE_CELL_STYLE)
                            {
                                (delete_action_link(
                                    &format_endpoint(
                                        endpoints::CLASSIFICATION,
                                        &[&control_id, &classification.id],
                                    ),
                                    &format!(
                                        "Are you sure you want to delete '{}'?",
                                        classification.name
                                    ),
                                    "closest tr",
                                    "delete",
                                ))
                            }
                        }
                    }
                }

                @if classifications.is_empty() {
                    tr
                    {
                        td colspan="2" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No classifications yet."
                        }
                    }
                }
            }
        }
    )
}

fn new_category_form(control_id: ControlId) -> Markup {
    html!(
        form
            id="new-category"
            hx-post=(control_endpoint(endpoints::POST_CATEGORY, control_id))
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-4"
        {
            div class="grow"
            {
                label for="category-name" class=(FORM_LABEL_STYLE) { "Name" }
                input
                    id="category-name"
                    type="text"
                    name="name"
                    placeholder="Groceries"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category-kind" class=(FORM_LABEL_STYLE) { "Kind" }
                select id="category-kind" name="kind" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in TransactionKind::ALL {
                        option value=(kind.as_str()) { (kind.label()) }
                    }
                }
            }

            div { button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Category" } }
        }
    )
}

fn new_classification_form(control_id: ControlId) -> Markup {
    html!(
        form
            id="new-classification"
            hx-post=(control_endpoint(endpoints::POST_CLASSIFICATION, control_id))
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-4"
        {
            div class="grow"
            {
                label for="classification-name" class=(FORM_LABEL_STYLE) { "Name" }
                input
                    id="classification-name"
                    type="text"
                    name="name"
                    placeholder="Fixed"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div { button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Classification" } }
        }
    )
}

fn categories_view(
    control_id: ControlId,
    categories: &[Category],
    classifications: &[Classification],
    can_edit: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW, control_id).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-8 w-full lg:max-w-3xl"
            {
                (page_header("Categories", None))

                section class="space-y-4"
                {
                    div class="overflow-x-auto dark:bg-gray-800"
                    {
                        (categories_table(control_id, categories, can_edit))
                    }

                    @if can_edit {
                        (new_category_form(control_id))
                    }
                }

                section class="space-y-4"
                {
                    h2 class="text-lg font-semibold" { "Classifications" }

                    div class="overflow-x-auto dark:bg-gray-800"
                    {
                        (classifications_table(control_id, classifications, can_edit))
                    }

                    @if can_edit {
                        (new_classification_form(control_id))
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}

/// Renders the categories and classifications of a control.
pub async fn get_categories_page(
    State(state): State<DbState>,
    Extension(user_id): Extension<UserID>,
    Path(control_id): Path<ControlId>,
) -> Result<Response, Error> {
    let connection = state.lock()?;
    let role = authorize(control_id, user_id, Role::Viewer, &connection)?;
    let categories = get_categories(control_id, &connection)?;
    let classifications = get_classifications(control_id, &connection)?;

    Ok(
        categories_view(control_id, &categories, &classifications, role >= Role::Editor)
            .into_response(),
    )
}
