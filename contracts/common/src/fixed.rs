//! WAD fixed-point arithmetic.
//!
//! All amounts handled here are non-negative. Products are computed in `i128`
//! when they fit and in the host's 256-bit integer otherwise, so
//! `shares * total_token` style expressions on 18-decimal balances do not
//! overflow. A quotient that does not fit back in `i128` is an error.

use soroban_sdk::{Env, I256};

use crate::error::SaverError;

pub const WAD: i128 = 1_000_000_000_000_000_000;

/// `a * b / d`, rounded down.
pub fn mul_div_floor(env: &Env, a: i128, b: i128, d: i128) -> Result<i128, SaverError> {
    check_operands(a, b, d)?;
    match a.checked_mul(b) {
        Some(product) => Ok(product / d),
        None => wide_mul_div(env, a, b, d, false),
    }
}

/// `a * b / d`, rounded up.
pub fn mul_div_ceil(env: &Env, a: i128, b: i128, d: i128) -> Result<i128, SaverError> {
    check_operands(a, b, d)?;
    match a.checked_mul(b) {
        Some(product) => {
            let quotient = product / d;
            if product % d == 0 {
                Ok(quotient)
            } else {
                checked_add(quotient, 1)
            }
        }
        None => wide_mul_div(env, a, b, d, true),
    }
}

/// `a * b / WAD`, rounded down.
pub fn wad_mul(env: &Env, a: i128, b: i128) -> Result<i128, SaverError> {
    mul_div_floor(env, a, b, WAD)
}

/// `a * WAD / b`, rounded down.
pub fn wad_div(env: &Env, a: i128, b: i128) -> Result<i128, SaverError> {
    mul_div_floor(env, a, WAD, b)
}

pub fn checked_add(a: i128, b: i128) -> Result<i128, SaverError> {
    a.checked_add(b).ok_or(SaverError::ArithmeticOverflow)
}

pub fn checked_sub(a: i128, b: i128) -> Result<i128, SaverError> {
    a.checked_sub(b).ok_or(SaverError::ArithmeticOverflow)
}

#[inline]
fn check_operands(a: i128, b: i128, d: i128) -> Result<(), SaverError> {
    if a < 0 || b < 0 {
        return Err(SaverError::InvalidAmount);
    }
    if d <= 0 {
        return Err(SaverError::ArithmeticOverflow);
    }
    Ok(())
}

fn wide_mul_div(env: &Env, a: i128, b: i128, d: i128, round_up: bool) -> Result<i128, SaverError> {
    let product = I256::from_i128(env, a).mul(&I256::from_i128(env, b));
    let divisor = I256::from_i128(env, d);
    let numerator = if round_up {
        product.add(&divisor.sub(&I256::from_i32(env, 1)))
    } else {
        product
    };
    numerator
        .div(&divisor)
        .to_i128()
        .ok_or(SaverError::ArithmeticOverflow)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_floor_and_ceil_differ_only_on_remainder() {
        let env = Env::default();
        assert_eq!(mul_div_floor(&env, 10, 10, 4), Ok(25));
        assert_eq!(mul_div_ceil(&env, 10, 10, 4), Ok(25));
        assert_eq!(mul_div_floor(&env, 10, 10, 3), Ok(33));
        assert_eq!(mul_div_ceil(&env, 10, 10, 3), Ok(34));
    }

    #[test]
    fn test_wide_products() {
        let env = Env::default();
        // 1e22 * 1e22 overflows i128 before the division brings it back
        let big = 10_000 * WAD;
        assert_eq!(mul_div_floor(&env, big, big, big), Ok(big));
        assert_eq!(mul_div_floor(&env, big, big + 1, big), Ok(big + 1));
        assert_eq!(
            mul_div_ceil(&env, big, big, 3 * WAD),
            Ok(33_333_333 * WAD + 333_333_333_333_333_334)
        );
    }

    #[test]
    fn test_quotient_overflow() {
        let env = Env::default();
        assert_eq!(
            mul_div_floor(&env, i128::MAX, 2, 1),
            Err(SaverError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_rejects_bad_operands() {
        let env = Env::default();
        assert_eq!(mul_div_floor(&env, -1, 2, 1), Err(SaverError::InvalidAmount));
        assert_eq!(mul_div_floor(&env, 1, 2, 0), Err(SaverError::ArithmeticOverflow));
    }

    #[test]
    fn test_wad_helpers() {
        let env = Env::default();
        let half = WAD / 2;
        assert_eq!(wad_mul(&env, half, 3 * WAD), Ok(3 * WAD / 2));
        assert_eq!(wad_div(&env, 1, 4), Ok(WAD / 4));
    }
}
