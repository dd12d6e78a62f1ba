//! Bank accounts and their balances.

mod accounts_page;
mod balance;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use accounts_page::get_accounts_page;
pub use balance::{
    AccountBalance, account_balance, available_balance, boxes_balance, get_account_balances,
    projected_balance,
};
pub use core::{
    Account, AccountId, NewAccount, check_account, create_account, create_account_table,
    get_account, get_accounts,
};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use edit_page::get_edit_account_page;
