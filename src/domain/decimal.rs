//! Exact decimal numeric type for prices, quantities and P&L.
//!
//! Parsing accepts plain decimal strings; formatting never uses exponent notation.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exact decimal used for every monetary value in the desk.
///
/// Backed by rust_decimal so weighted averages and P&L never drift.
/// Serializes to a JSON number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Build a decimal from an integer mantissa and a scale, e.g. `(6800012, 2)` is `68000.12`.
    pub fn from_scaled(mantissa: i64, scale: u32) -> Self {
        Decimal(RustDecimal::new(mantissa, scale))
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Format without trailing zeros or exponent notation.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn min(self, other: Decimal) -> Decimal {
        if self <= other {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Decimal) -> Decimal {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// `None` when the sum leaves rust_decimal's range.
    pub fn checked_add(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    pub fn checked_sub(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_sub(rhs.0).map(Decimal)
    }

    pub fn checked_mul(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }

    /// `None` on division by zero or overflow.
    pub fn checked_div(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_div(rhs.0).map(Decimal)
    }

    /// Round half away from zero to `dp` decimal places.
    pub fn round_dp(&self, dp: u32) -> Self {
        Decimal(self.0.round_dp(dp))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::SubAssign for Decimal {
    fn sub_assign(&mut self, rhs: Decimal) {
        self.0 -= rhs.0;
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_canonical_string_strips_trailing_zeros() {
        assert_eq!(d("68000.10").to_canonical_string(), "68000.1");
        assert_eq!(d("150.000").to_canonical_string(), "150");
        assert!(!d("0.0001").to_canonical_string().contains('e'));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(d(" 42.5 "), d("42.5"));
        assert!(Decimal::from_str_canonical("abc").is_err());
    }

    #[test]
    fn test_weighted_average_is_exact() {
        // (100 * 1 + 200 * 1) / 2
        let avg = (d("100") * d("1") + d("200") * d("1")) / d("2");
        assert_eq!(avg, d("150"));
    }

    #[test]
    fn test_sign_predicates() {
        assert!(d("0.01").is_positive());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
        assert!(d("-3").is_negative());
        assert_eq!(d("-3").abs(), d("3"));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(d("5").min(d("2")), d("2"));
        assert_eq!(d("5").max(d("2")), d("5"));
    }

    #[test]
    fn test_from_scaled_and_round() {
        assert_eq!(Decimal::from_scaled(6800012, 2), d("68000.12"));
        assert_eq!(d("68000.125").round_dp(2), d("68000.13"));
    }

    #[test]
    fn test_json_serializes_as_number() {
        let json = serde_json::to_value(d("123.456")).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "123.456");
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let big = d("100000000000000000000");
        assert_eq!(big.checked_mul(d("1000000000")), None);
        assert_eq!(d("1.5").checked_mul(d("2")), Some(d("3")));
        assert_eq!(d("1").checked_div(Decimal::zero()), None);
        assert_eq!(Decimal::new(RustDecimal::MAX).checked_add(d("1")), None);
        assert_eq!(Decimal::new(RustDecimal::MIN).checked_sub(d("1")), None);
    }

    #[test]
    fn test_sum_and_assign_ops() {
        let total: Decimal = vec![d("1.5"), d("2.5"), d("-1")].into_iter().sum();
        assert_eq!(total, d("3"));

        let mut acc = d("10");
        acc += d("5");
        acc -= d("2.5");
        assert_eq!(acc, d("12.5"));
    }
}
