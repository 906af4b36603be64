use alloy_primitives::{I256, U256};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::UnitsError;

/// Fraction digits of the oracle-backed prices stored by the market.
pub const PRICE_DECIMALS: u32 = 8;
/// Fraction digits of the native currency (wei per ether).
pub const NATIVE_DECIMALS: u32 = 18;

/// Scale an unsigned on-chain fixed-point integer into a decimal.
pub fn from_units(raw: U256, decimals: u32) -> Result<Decimal, UnitsError> {
    let raw = u128::try_from(raw).map_err(|_| UnitsError::Overflow { decimals })?;
    let raw = i128::try_from(raw).map_err(|_| UnitsError::Overflow { decimals })?;
    scale(raw, decimals)
}

/// Scale a signed on-chain fixed-point integer (oracle answers) into a decimal.
pub fn from_signed_units(raw: I256, decimals: u32) -> Result<Decimal, UnitsError> {
    let raw = i128::try_from(raw).map_err(|_| UnitsError::Overflow { decimals })?;
    scale(raw, decimals)
}

fn scale(raw: i128, decimals: u32) -> Result<Decimal, UnitsError> {
    Decimal::try_from_i128_with_scale(raw, decimals)
        .map(|d| d.normalize())
        .map_err(|_| UnitsError::Overflow { decimals })
}

/// Convert a decimal amount back into an on-chain integer.
///
/// Rejects negative amounts and amounts with more fraction digits than the
/// target encoding can hold; nothing is silently truncated.
pub fn to_units(amount: Decimal, decimals: u32) -> Result<U256, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative);
    }
    let amount = amount.normalize();
    if amount.scale() > decimals {
        return Err(UnitsError::TooPrecise { decimals });
    }
    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| UnitsError::Negative)?;
    let factor = 10u128
        .checked_pow(decimals - amount.scale())
        .ok_or(UnitsError::Overflow { decimals })?;
    let raw = mantissa
        .checked_mul(factor)
        .ok_or(UnitsError::Overflow { decimals })?;
    Ok(U256::from(raw))
}

/// Parse a user-entered decimal string such as "0.01".
pub fn parse_amount(input: &str) -> Result<Decimal, UnitsError> {
    Decimal::from_str(input.trim()).map_err(|e| UnitsError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_units_ether() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(from_units(one_and_half, NATIVE_DECIMALS), Ok(dec!(1.5)));
        assert_eq!(from_units(U256::ZERO, NATIVE_DECIMALS), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_from_units_price() {
        // 3245.12 with 8 fraction digits
        let raw = U256::from(324_512_000_000u64);
        assert_eq!(from_units(raw, PRICE_DECIMALS), Ok(dec!(3245.12)));
    }

    #[test]
    fn test_from_signed_units() {
        let raw = I256::try_from(-150_000_000i64).unwrap();
        assert_eq!(from_signed_units(raw, PRICE_DECIMALS), Ok(dec!(-1.5)));
    }

    #[test]
    fn test_from_units_overflow() {
        assert_eq!(
            from_units(U256::MAX, NATIVE_DECIMALS),
            Err(UnitsError::Overflow { decimals: 18 })
        );
    }

    #[test]
    fn test_to_units_ether() {
        assert_eq!(
            to_units(dec!(0.001), NATIVE_DECIMALS),
            Ok(U256::from(1_000_000_000_000_000u128))
        );
        assert_eq!(
            to_units(dec!(2), NATIVE_DECIMALS),
            Ok(U256::from(2_000_000_000_000_000_000u128))
        );
    }

    #[test]
    fn test_to_units_rejects_bad_amounts() {
        assert_eq!(to_units(dec!(-1), NATIVE_DECIMALS), Err(UnitsError::Negative));
        assert_eq!(
            to_units(dec!(0.000000001), PRICE_DECIMALS),
            Err(UnitsError::TooPrecise { decimals: 8 })
        );
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 0.05 "), Ok(dec!(0.05)));
        assert!(matches!(parse_amount("abc"), Err(UnitsError::Parse(_))));
    }
}
