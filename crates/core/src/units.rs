//! Conversion between whole SOL amounts and lamports.

use thiserror::Error;

/// Number of lamports (base units) in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fractional digits representable in lamports.
const MAX_DECIMALS: usize = 9;

/// Fractional digits shown when displaying a balance.
const DISPLAY_DECIMALS: u32 = 3;

/// Errors produced while parsing a user-entered amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is not a number: {0}")]
    Invalid(String),
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount has more than {MAX_DECIMALS} decimal places")]
    TooPrecise,
    #[error("amount is too large")]
    Overflow,
}

/// Parse a decimal SOL amount such as `"1"`, `"0.5"` or `".25"` into lamports.
///
/// The result is always a positive integer number of lamports. Signs,
/// exponents, separators and anything finer than one lamport are rejected
/// rather than rounded.
pub fn parse_sol(input: &str) -> Result<u64, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::NotPositive);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::Invalid(s.to_string()));
    }
    if frac.len() > MAX_DECIMALS {
        return Err(AmountError::TooPrecise);
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        // Right-pad to nine digits: "5" -> 500_000_000.
        format!("{:0<width$}", frac, width = MAX_DECIMALS)
            .parse()
            .map_err(|_| AmountError::Invalid(s.to_string()))?
    };

    let lamports = whole
        .checked_mul(LAMPORTS_PER_SOL)
        .and_then(|l| l.checked_add(frac))
        .ok_or(AmountError::Overflow)?;
    if lamports == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(lamports)
}

/// Format a lamport balance as SOL with three decimals, rounding half up.
///
/// Display only: never feed the result back into an amount calculation.
pub fn format_sol(lamports: u64) -> String {
    let unit = (LAMPORTS_PER_SOL / 10u64.pow(DISPLAY_DECIMALS)) as u128;
    let scaled = (lamports as u128 + unit / 2) / unit;
    let divisor = 10u128.pow(DISPLAY_DECIMALS);
    format!(
        "{}.{:0width$}",
        scaled / divisor,
        scaled % divisor,
        width = DISPLAY_DECIMALS as usize
    )
}
