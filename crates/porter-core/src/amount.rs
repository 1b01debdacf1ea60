//! Fixed-point amount type shared by both settlement currencies.
//!
//! An [`Amount`] is an unsigned quantity in the smallest unit of whichever
//! currency it denominates (native coin or platform token). Both currencies
//! use 9 decimal places, so the type itself is currency-agnostic; the ledger
//! tracks which currency an amount belongs to.
//!
//! All arithmetic is overflow-checked. Fee math uses `u128` intermediates so
//! no valid input can lose precision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::CoreError;

/// Number of decimal places of precision.
pub const DECIMALS: u32 = 9;

/// Smallest units per one whole coin/token.
pub const UNITS_PER_WHOLE: u64 = 1_000_000_000;

/// An unsigned fixed-point quantity in the smallest unit of a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an amount from smallest units.
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Creates an amount from whole coins/tokens.
    #[must_use]
    pub const fn from_whole(whole: u64) -> Self {
        Self(whole * UNITS_PER_WHOLE)
    }

    /// Returns the amount in smallest units.
    #[must_use]
    pub const fn as_units(self) -> u64 {
        self.0
    }

    /// Returns the amount in whole coins/tokens, truncating the fraction.
    #[must_use]
    pub const fn as_whole(self) -> u64 {
        self.0 / UNITS_PER_WHOLE
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Computes `rate` thousandths of this amount, rounding down.
    ///
    /// This is the primitive behind protocol fees: a 0.1% fee is
    /// `amount.permille(1)`, a 1% fee is `amount.permille(10)`. The
    /// intermediate product is computed in `u128`, so the result is exact
    /// for every representable amount and cannot overflow for `rate <= 1000`.
    #[must_use]
    pub const fn permille(self, rate: u64) -> Self {
        let units = (self.0 as u128 * rate as u128) / 1000;
        // rate <= 1000 keeps the quotient within u64; larger rates saturate
        if units > u64::MAX as u128 {
            Self::MAX
        } else {
            Self(units as u64)
        }
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNITS_PER_WHOLE;
        let frac = self.0 % UNITS_PER_WHOLE;
        write!(f, "{whole}.{frac:09}")
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('-') {
            return Err(CoreError::InvalidAmount(
                "negative values not allowed".into(),
            ));
        }

        let (whole_str, frac_str) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        let whole: u64 = if whole_str.is_empty() {
            0
        } else {
            whole_str
                .parse()
                .map_err(|_| CoreError::InvalidAmount(format!("invalid whole part: {s}")))?
        };

        let frac: u64 = if frac_str.is_empty() {
            0
        } else {
            if frac_str.len() > DECIMALS as usize {
                return Err(CoreError::InvalidAmount("too many decimal places".into()));
            }
            // Right-pad to 9 digits so "3.3" reads as 300_000_000 units
            let padded = format!("{frac_str:0<9}");
            padded
                .parse()
                .map_err(|_| CoreError::InvalidAmount(format!("invalid fractional part: {s}")))?
        };

        whole
            .checked_mul(UNITS_PER_WHOLE)
            .and_then(|w| w.checked_add(frac))
            .map(Amount)
            .ok_or_else(|| CoreError::InvalidAmount("overflow".into()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Decimal string without trailing zeros
        let whole = self.0 / UNITS_PER_WHOLE;
        let frac = self.0 % UNITS_PER_WHOLE;

        let s = if frac == 0 {
            format!("{whole}")
        } else {
            let frac_str = format!("{frac:09}");
            format!("{whole}.{}", frac_str.trim_end_matches('0'))
        };

        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_roundtrips() {
        let amount = Amount::from_units(1_000_000_000);
        assert_eq!(amount.as_units(), 1_000_000_000);
    }

    #[test]
    fn from_whole_converts() {
        assert_eq!(Amount::from_whole(7).as_units(), 7_000_000_000);
    }

    #[test]
    fn as_whole_truncates() {
        assert_eq!(Amount::from_units(2_500_000_000).as_whole(), 2);
    }

    #[test]
    fn checked_add_detects_overflow() {
        let a = Amount::from_whole(5);
        let b = Amount::from_whole(3);
        assert_eq!(a.checked_add(b), Some(Amount::from_whole(8)));
        assert_eq!(Amount::MAX.checked_add(Amount::from_units(1)), None);
    }

    #[test]
    fn checked_sub_detects_underflow() {
        let a = Amount::from_whole(10);
        let b = Amount::from_whole(3);
        assert_eq!(a.checked_sub(b), Some(Amount::from_whole(7)));
        assert_eq!(b.checked_sub(a), None);
    }

    #[test]
    fn permille_computes_fees_exactly() {
        // 0.1% of 3.0 = 0.003
        let deposit: Amount = "3".parse().unwrap();
        assert_eq!(deposit.permille(1), "0.003".parse().unwrap());

        // 1% of 3.0 = 0.03
        assert_eq!(deposit.permille(10), "0.03".parse().unwrap());
    }

    #[test]
    fn permille_rounds_down() {
        // 0.1% of 1999 units = 1.999 units -> 1
        assert_eq!(Amount::from_units(1999).permille(1).as_units(), 1);
    }

    #[test]
    fn permille_no_overflow_at_max() {
        // u128 intermediate keeps the full product
        assert_eq!(Amount::MAX.permille(1000), Amount::MAX);
    }

    #[test]
    fn display_pads_fraction() {
        assert_eq!(Amount::from_units(1_500_000_000).to_string(), "1.500000000");
        assert_eq!(Amount::ZERO.to_string(), "0.000000000");
    }

    #[test]
    fn from_str_parses_decimals() {
        let amount: Amount = "3.3".parse().unwrap();
        assert_eq!(amount.as_units(), 3_300_000_000);

        let amount: Amount = "0.000000001".parse().unwrap();
        assert_eq!(amount.as_units(), 1);

        let amount: Amount = "42".parse().unwrap();
        assert_eq!(amount.as_units(), 42_000_000_000);
    }

    #[test]
    fn from_str_rejects_malformed() {
        assert!("abc".parse::<Amount>().is_err());
        assert!("-1.0".parse::<Amount>().is_err());
        assert!("1.0000000001".parse::<Amount>().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let original = Amount::from_units(12_345_678_900);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, r#""12.3456789""#);
        let restored: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
