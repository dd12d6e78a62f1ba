//! The month dashboard of a control.
//!
//! Shows the income, expenses and result of a month, spending per category,
//! the balances of the accounts and the entries and invoices of the month.

mod month_page;
mod summary;

pub use month_page::get_month_page;
