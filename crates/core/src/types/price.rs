//! Money formatting using decimal arithmetic.
//!
//! Prices travel as JSON numbers and are held as [`Decimal`] so that cart
//! totals never accumulate floating point error. Display follows the
//! Colombian peso convention used by the store: `$ 1.234.567,89`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as Colombian pesos (`$ 12.500,00`).
///
/// Rounds half away from zero to two decimals, groups thousands with `.`
/// and uses `,` as the decimal separator.
///
/// ```
/// use rust_decimal::Decimal;
/// use tienda_core::format_cop;
///
/// assert_eq!(format_cop(Decimal::new(1_234_567_89, 2)), "$ 1.234.567,89");
/// assert_eq!(format_cop(Decimal::new(-5, 1)), "-$ 0,50");
/// ```
#[must_use]
pub fn format_cop(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded = rounded.abs();
    rounded.rescale(2);

    let text = rounded.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}$ {grouped},{frac_part}")
}

/// Format a unit price times a quantity.
#[must_use]
pub fn format_price(unit_price: Decimal, quantity: u32) -> String {
    format_cop(unit_price * Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_small_amounts() {
        assert_eq!(format_cop(Decimal::ZERO), "$ 0,00");
        assert_eq!(format_cop(Decimal::new(999, 0)), "$ 999,00");
        assert_eq!(format_cop(Decimal::new(1000, 0)), "$ 1.000,00");
    }

    #[test]
    fn test_format_rounds_half_away_from_zero() {
        assert_eq!(format_cop(Decimal::new(12_345, 3)), "$ 12,35");
        assert_eq!(format_cop(Decimal::new(-12_345, 3)), "-$ 12,35");
    }

    #[test]
    fn test_format_large_amount() {
        assert_eq!(format_cop(Decimal::new(1_000_000, 0)), "$ 1.000.000,00");
    }

    #[test]
    fn test_format_price_multiplies() {
        assert_eq!(format_price(Decimal::new(25_000, 0), 3), "$ 75.000,00");
    }
}
