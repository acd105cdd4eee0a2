//! Disposal gain/loss.

use fixedledger_core::GainLoss;
use rust_decimal::Decimal;

/// Gain or loss on disposing of an asset carried at `carrying_amount`.
///
/// ```
/// use fixedledger_lifecycle::calculate_disposal_gain_loss;
/// use rust_decimal_macros::dec;
///
/// let result = calculate_disposal_gain_loss(dec!(10000), dec!(12000));
/// assert_eq!(result.amount, dec!(2000));
/// assert!(result.is_gain);
/// ```
#[must_use]
pub fn calculate_disposal_gain_loss(carrying_amount: Decimal, proceeds: Decimal) -> GainLoss {
    let amount = proceeds - carrying_amount;
    GainLoss {
        amount,
        is_gain: amount > Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_gain() {
        let result = calculate_disposal_gain_loss(dec!(10000), dec!(12000));
        assert_eq!(result.amount, dec!(2000));
        assert!(result.is_gain);
    }

    #[test]
    fn test_break_even_is_neither() {
        let result = calculate_disposal_gain_loss(dec!(10000), dec!(10000));
        assert_eq!(result.amount, dec!(0));
        assert!(!result.is_gain);
        assert!(!result.is_loss());
    }

    #[test]
    fn test_loss() {
        let result = calculate_disposal_gain_loss(dec!(10000), dec!(3000));
        assert_eq!(result.amount, dec!(-7000));
        assert!(!result.is_gain);
        assert!(result.is_loss());
    }

    #[test]
    fn test_no_proceeds_loses_carrying_amount() {
        let result = calculate_disposal_gain_loss(dec!(4250.50), Decimal::ZERO);
        assert_eq!(result.amount, dec!(-4250.50));
    }
}
