//! Form fields shared by the transaction and provisioned transaction forms.

use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    account::{Account, get_accounts},
    card::{Card, get_cards},
    category::{Category, CategoryId, get_categories},
    classification::{Classification, ClassificationId, get_classifications},
    control::ControlId,
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    transaction::core::{PaymentSource, TransactionKind},
};

/// The accounts, cards, categories and classifications a form can pick from.
pub struct FormChoices {
    pub accounts: Vec<Account>,
    pub cards: Vec<Card>,
    pub categories: Vec<Category>,
    pub classifications: Vec<Classification>,
}

impl FormChoices {
    pub fn load(control_id: ControlId, connection: &Connection) -> Result<Self, Error> {
        Ok(Self {
            accounts: get_accounts(control_id, connection)?,
            cards: get_cards(control_id, connection)?,
            categories: get_categories(control_id, connection)?,
            classifications: get_classifications(control_id, connection)?,
        })
    }

    /// Whether there is anywhere to pay from.
    pub fn has_sources(&self) -> bool {
        !self.accounts.is_empty() || !self.cards.is_empty()
    }
}

/// The values a form starts with.
pub struct TransactionFormDefaults<'a> {
    pub kind: TransactionKind,
    pub amount: Option<f64>,
    pub date: Date,
    pub description: Option<&'a str>,
    pub source: Option<PaymentSource>,
    pub category_id: Option<CategoryId>,
    pub classification_id: Option<ClassificationId>,
}

pub fn kind_fields(kind: TransactionKind) -> Markup {
    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for option in TransactionKind::ALL {
                    @let id = format!("kind-{}", option.as_str());

                    div class="flex items-center gap-3"
                    {
                        input
                            name="kind"
                            id=(id)
                            type="radio"
                            value=(option.as_str())
                            checked[option == kind]
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (option.label()) }
                    }
                }
            }
        }
    }
}

pub fn amount_field(label: &str, amount: Option<f64>) -> Markup {
    let amount = amount.map(|amount| format!("{amount:.2}"));

    html! {
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { (label) }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    placeholder="0.00"
                    min="0.01"
                    required
                    value=[amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

pub fn description_field(description: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=[description]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// A select with the accounts and cards of the control. The value of each
/// option is the text form of a [PaymentSource].
pub fn source_select(choices: &FormChoices, selected: Option<PaymentSource>) -> Markup {
    html! {
        div
        {
            label for="source" class=(FORM_LABEL_STYLE) { "Paid with" }

            select name="source" id="source" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @if !choices.accounts.is_empty() {
                    optgroup label="Accounts"
                    {
                        @for account in &choices.accounts {
                            @let source = PaymentSource::Account(account.id);
                            option value=(source) selected[selected == Some(source)]
                            {
                                (account.name)
                            }
                        }
                    }
                }

                @if !choices.cards.is_empty() {
                    optgroup label="Cards"
                    {
                        @for card in &choices.cards {
                            @let source = PaymentSource::Card(card.id);
                            option value=(source) selected[selected == Some(source)]
                            {
                                (card.name)
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn category_select(categories: &[Category], selected: Option<CategoryId>) -> Markup {
    html! {
        @if !categories.is_empty() {
            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "No category" }

                    @for kind in TransactionKind::ALL {
                        optgroup label=(kind.label())
                        {
                            @for category in categories.iter().filter(|category| category.kind == kind) {
                                option
                                    value=(category.id)
                                    selected[selected == Some(category.id)]
                                {
                                    (category.name)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn classification_select(
    classifications: &[Classification],
    selected: Option<ClassificationId>,
) -> Markup {
    html! {
        @if !classifications.is_empty() {
            div
            {
                label for="classification_id" class=(FORM_LABEL_STYLE) { "Classification" }

                select name="classification_id" id="classification_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "No classification" }

                    @for classification in classifications {
                        option
                            value=(classification.id)
                            selected[selected == Some(classification.id)]
                        {
                            (classification.name)
                        }
                    }
                }
            }
        }
    }
}

/// The fields of a single transaction, without the installments input.
pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    choices: &FormChoices,
) -> Markup {
    html! {
        (kind_fields(defaults.kind))
        (amount_field("Amount", defaults.amount))

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        (description_field(defaults.description))
        (source_select(choices, defaults.source))
        (category_select(&choices.categories, defaults.category_id))
        (classification_select(&choices.classifications, defaults.classification_id))
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        account::Account,
        card::Card,
        transaction::core::{PaymentSource, TransactionKind},
    };

    use super::{FormChoices, TransactionFormDefaults, transaction_form_fields};

    fn choices() -> FormChoices {
        FormChoices {
            accounts: vec![Account {
                id: 1,
                control_id: 1,
                name: "Checking".to_owned(),
                opening_balance: 0.0,
            }],
            cards: vec![Card {
                id: 2,
                control_id: 1,
                name: "Visa".to_owned(),
                closing_day: 5,
                due_day: 15,
                credit_limit: 1000.0,
                payment_account_id: 1,
            }],
            categories: vec![],
            classifications: vec![],
        }
    }

    fn render(kind: TransactionKind, source: Option<PaymentSource>) -> Html {
        let fields = transaction_form_fields(
            &TransactionFormDefaults {
                kind,
                amount: None,
                date: date!(2025 - 03 - 01),
                description: None,
                source,
                category_id: None,
                classification_id: None,
            },
            &choices(),
        );
        Html::parse_document(&maud::html! { form { (fields) } }.into_string())
    }

    #[test]
    fn checks_selected_kind() {
        for (kind, expected) in [
            (TransactionKind::Expense, "expense"),
            (TransactionKind::Income, "income"),
        ] {
            let html = render(kind, None);
            let checked = html
                .select(&Selector::parse("input[type=radio][name=kind][checked]").unwrap())
                .next()
                .and_then(|input| input.value().attr("value"));

            assert_eq!(checked, Some(expected));
        }
    }

    #[test]
    fn lists_accounts_and_cards_as_sources() {
        let html = render(TransactionKind::Expense, Some(PaymentSource::Card(2)));

        let values: Vec<_> = html
            .select(&Selector::parse("select[name=source] option").unwrap())
            .filter_map(|option| option.value().attr("value"))
            .collect();
        assert_eq!(values, vec!["account:1", "card:2"]);

        let selected = html
            .select(&Selector::parse("select[name=source] option[selected]").unwrap())
            .next()
            .and_then(|option| option.value().attr("value"));
        assert_eq!(selected, Some("card:2"));
    }

    #[test]
    fn hides_empty_category_select() {
        let html = render(TransactionKind::Expense, None);

        assert!(
            html.select(&Selector::parse("select[name=category_id]").unwrap())
                .next()
                .is_none()
        );
    }
}
