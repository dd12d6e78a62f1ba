//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Rows changed by an `UPDATE` or `DELETE` statement.
pub type RowsAffected = usize;
