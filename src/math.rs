// 2.0 math.rs: checked fixed-point arithmetic over scaled integers.
// every quantity in the ledger is an integer scaled by one of three precisions.
// nothing here wraps or truncates silently: overflow, underflow and division
// by zero all surface as MathError and abort the calling operation.

use thiserror::Error;

// quote amounts (collateral, deposits, NAV, pnl): 6 decimals, USDC style
pub const QUOTE_PRECISION: u64 = 1_000_000;
// pool shares: 6 decimals, so the 1:1 bootstrap mints share units == quote units
pub const SHARE_PRECISION: u64 = 1_000_000;
// oracle prices and NAV-per-share: 9 decimals
pub const PRICE_PRECISION: u64 = 1_000_000_000;
// base-denominated market quantities (position size, base pnl): 9 decimals
pub const BASE_PRECISION: u64 = 1_000_000_000;
// dividing a base-scaled quote value down to quote precision
pub const BASE_TO_QUOTE_PRECISION_RATIO: u64 = BASE_PRECISION / QUOTE_PRECISION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,
}

pub fn add_u64(a: u64, b: u64) -> Result<u64, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn sub_u64(a: u64, b: u64) -> Result<u64, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

pub fn add_u128(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn sub_u128(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

pub fn add_i128(a: i128, b: i128) -> Result<i128, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn sub_i128(a: i128, b: i128) -> Result<i128, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

// 2.1: floor(a * b / d) with u128 widening. the workhorse behind share
// minting and burning; floor keeps rounding in the pool's favor.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    a.checked_mul(b)
        .ok_or(MathError::Overflow)?
        .checked_div(d)
        .ok_or(MathError::DivisionByZero)
}

// 2.2: signed floor(a * b / d), magnitude math with the sign reapplied.
// truncates toward zero.
pub fn mul_div_signed(a: i128, b: u128, d: u128) -> Result<i128, MathError> {
    let magnitude = mul_div_floor(a.unsigned_abs(), b, d)?;
    let magnitude = i128::try_from(magnitude).map_err(|_| MathError::Overflow)?;
    Ok(if a < 0 { -magnitude } else { magnitude })
}

pub fn u128_to_u64(v: u128) -> Result<u64, MathError> {
    u64::try_from(v).map_err(|_| MathError::Overflow)
}

pub fn u128_to_i128(v: u128) -> Result<i128, MathError> {
    i128::try_from(v).map_err(|_| MathError::Overflow)
}
