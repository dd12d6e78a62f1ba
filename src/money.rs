//! Helpers for monetary amounts, which are stored as dollars in `f64`.

use crate::Error;

/// Round `amount` to the nearest cent.
///
/// Sums of many `f64` amounts pick up representation error, so every computed
/// total is rounded before it is stored or compared.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Check that `amount` is a finite, positive amount and round it to cents.
///
/// # Errors
/// Returns [Error::InvalidAmount] if the rounded amount is not a finite number
/// greater than zero.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() {
        return Err(Error::InvalidAmount(amount));
    }

    let rounded = round_to_cents(amount);

    if !rounded.is_finite() || rounded <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(rounded)
}
