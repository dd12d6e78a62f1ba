//! Expense and income categories, and the page that also lists classifications.

mod categories_page;
mod core;
mod endpoints;

pub use categories_page::get_categories_page;
pub use core::{
    Category, CategoryId, CategoryKind, NewCategory, check_category, create_category,
    create_category_table, get_categories,
};
pub use endpoints::{create_category_endpoint, delete_category_endpoint};
