use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::UnitsError;
use crate::state::units::{self, NATIVE_DECIMALS};
use alloy_primitives::U256;

/// Smallest bet the panel accepts, in ether.
pub const MIN_BET: Decimal = dec!(0.001);

/// Quick-pick amounts offered next to the input.
pub const PRESET_AMOUNTS: [Decimal; 4] = [dec!(0.001), dec!(0.01), dec!(0.05), dec!(0.1)];

/// Check a bet amount before anything is sent.
///
/// # Returns
/// The amount in wei, or why it was refused.
pub fn validate_bet(amount: Decimal) -> Result<U256, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative);
    }
    if amount < MIN_BET {
        return Err(UnitsError::BelowMinimum { min: MIN_BET });
    }
    units::to_units(amount, NATIVE_DECIMALS)
}

/// Parse and validate a user-entered bet amount such as "0.01".
pub fn parse_bet(input: &str) -> Result<(Decimal, U256), UnitsError> {
    let amount = units::parse_amount(input)?;
    let wei = validate_bet(amount)?;
    Ok((amount, wei))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for amount in PRESET_AMOUNTS {
            assert!(validate_bet(amount).is_ok(), "{} should be valid", amount);
        }
    }

    #[test]
    fn test_min_bet() {
        assert_eq!(
            validate_bet(dec!(0.001)),
            Ok(U256::from(1_000_000_000_000_000u128))
        );
        assert_eq!(
            validate_bet(dec!(0.0009)),
            Err(UnitsError::BelowMinimum { min: MIN_BET })
        );
        assert_eq!(
            validate_bet(Decimal::ZERO),
            Err(UnitsError::BelowMinimum { min: MIN_BET })
        );
        assert_eq!(validate_bet(dec!(-0.5)), Err(UnitsError::Negative));
    }

    #[test]
    fn test_too_precise() {
        assert_eq!(
            validate_bet(dec!(0.0010000000000000001)),
            Err(UnitsError::TooPrecise { decimals: 18 })
        );
    }

    #[test]
    fn test_parse_bet() {
        let (amount, wei) = parse_bet("0.05").unwrap();
        assert_eq!(amount, dec!(0.05));
        assert_eq!(wei, U256::from(50_000_000_000_000_000u128));

        assert!(parse_bet("lots").is_err());
    }
}
