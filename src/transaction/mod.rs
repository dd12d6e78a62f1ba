//! The monthly ledger: expenses and incomes paid from accounts or charged to
//! cards, and the generation of entries from provisioned transactions.

mod core;
mod edit_page;
mod endpoints;
mod form;
mod generation;
mod new_page;

pub use core::{
    Installment, PaymentSource, Transaction, TransactionBuilder, TransactionId, TransactionKind,
    create_transaction, create_transaction_table, delete_transaction,
    get_account_transactions_for_month, get_invoice_transactions, get_transaction,
    set_transaction_paid, toggle_transaction_paid, update_transaction,
};
pub(crate) use core::check_references;
pub use edit_page::get_edit_transaction_page;
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
    generate_month_endpoint, paid_toggle, toggle_transaction_paid_endpoint,
};
pub use form::{
    FormChoices, amount_field, category_select, classification_select, description_field,
    kind_fields, source_select,
};
pub use generation::generate_through;
pub use new_page::get_new_transaction_page;
