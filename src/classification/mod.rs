//! Classifications: labels such as "Fixed" or "Variable" for transactions.

mod core;
mod endpoints;

pub use core::{
    Classification, ClassificationId, NewClassification, check_classification,
    create_classification, create_classification_table, get_classifications,
};
pub use endpoints::{create_classification_endpoint, delete_classification_endpoint};
