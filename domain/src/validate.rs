//! Lightweight input validation helpers. Keep logic minimal and deterministic.

use crate::CoreError;

/// A product name must contain something other than whitespace.
pub fn validate_name(s: &str) -> Result<(), CoreError> {
    if s.trim().is_empty() {
        return Err(CoreError::InvalidName);
    }
    Ok(())
}

/// Prices are finite and non-negative.
pub fn validate_price(price: f64) -> Result<(), CoreError> {
    if !price.is_finite() {
        return Err(CoreError::InvalidPrice("must be a finite number".into()));
    }
    if price < 0.0 {
        return Err(CoreError::InvalidPrice("must not be negative".into()));
    }
    Ok(())
}
