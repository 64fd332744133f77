//! Monetary amounts.
//!
//! Prices, deposits, discounts and balances are exact decimals. Balances can
//! legitimately go negative, so `Amount` is signed; inputs that must not be
//! negative are checked with [`non_negative`].

use rust_decimal::Decimal;

use crate::error::DomainError;

/// Monetary amount in the shop's currency.
pub type Amount = Decimal;

/// Validate that an input amount is `>= 0`.
pub fn non_negative(field: &str, value: Amount) -> Result<Amount, DomainError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(format!(
            "{field} cannot be negative (got {value})"
        )));
    }
    Ok(value)
}
