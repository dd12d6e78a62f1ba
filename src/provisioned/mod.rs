//! Provisioned transactions: recurring monthly entries and installment plans.

mod core;
mod edit_page;
mod endpoints;
mod provisioned_page;

pub use core::{
    MAX_INSTALLMENTS, NewProvisioned, Occurrence, ProvisionedId, ProvisionedTransaction,
    ProvisionedUpdate, Recurrence, create_provisioned, create_provisioned_table,
    delete_provisioned, get_all_provisioned, get_provisioned, last_installment_month,
    update_provisioned,
};
pub(crate) use core::set_generated_through;
pub use edit_page::get_edit_provisioned_page;
pub use endpoints::{
    create_provisioned_endpoint, delete_provisioned_endpoint, edit_provisioned_endpoint,
};
pub use provisioned_page::get_provisioned_page;
