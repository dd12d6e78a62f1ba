//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    auth::create_user_table,
    card::create_card_table,
    category::create_category_table,
    classification::create_classification_table,
    control::create_control_tables,
    invoice::create_invoice_table,
    provisioned::create_provisioned_table,
    savings_box::create_savings_box_tables,
    transaction::create_transaction_table,
    transfer::create_transfer_table,
};

/// Enable foreign keys and create the tables for all the domain models.
///
/// The tables are created in a single exclusive transaction and only if they
/// do not exist yet, so calling this on an existing database is a no-op.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_control_tables(&transaction)?;
    create_account_table(&transaction)?;
    create_card_table(&transaction)?;
    create_category_table(&transaction)?;
    create_classification_table(&transaction)?;
    create_provisioned_table(&transaction)?;
    create_invoice_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transfer_table(&transaction)?;
    create_savings_box_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
