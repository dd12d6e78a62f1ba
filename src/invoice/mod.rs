//! Credit card invoices: one per card and due month.

mod core;
mod endpoints;
mod invoices_page;

pub use core::{
    Invoice, InvoiceId, create_invoice_table, get_invoice, get_invoices, get_invoices_due_in,
    get_or_create_invoice, pay_invoice, recalculate_invoice_total, reopen_invoice,
};
pub(crate) use core::is_invoice_paid;
pub use endpoints::{pay_invoice_endpoint, reopen_invoice_endpoint};
pub use invoices_page::get_invoices_page;
