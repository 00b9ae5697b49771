//! Simple-interest accrual.

use knowton_core::{KnowtonError, KnowtonResult};
use rust_decimal::Decimal;

/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Expected return on `principal` at annual rate `apy` over `elapsed_seconds`.
///
/// `principal × apy × elapsed / SECONDS_PER_YEAR`. Negative elapsed time
/// accrues nothing. Principals too large for the exact product are scaled by
/// the year fraction first; a return outside the decimal range is a
/// validation error.
pub fn expected_return(
    principal: Decimal,
    apy: Decimal,
    elapsed_seconds: i64,
) -> KnowtonResult<Decimal> {
    if elapsed_seconds <= 0 || principal <= Decimal::ZERO || apy <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let elapsed = Decimal::from(elapsed_seconds);
    let year = Decimal::from(SECONDS_PER_YEAR);
    let rate = principal.checked_mul(apy);

    rate.and_then(|r| r.checked_mul(elapsed))
        .and_then(|r| r.checked_div(year))
        .or_else(|| rate?.checked_mul(elapsed.checked_div(year)?))
        .ok_or_else(|| KnowtonError::overflow(format!("return on {principal} at {apy}")))
}
