//! Money moved between the accounts of a control.

mod core;
mod endpoints;
mod transfers_page;

pub use core::{
    NewTransfer, Transfer, TransferId, create_transfer, create_transfer_table, delete_transfer,
    get_transfers_for_month,
};
pub use endpoints::{create_transfer_endpoint, delete_transfer_endpoint};
pub use transfers_page::get_transfers_page;
