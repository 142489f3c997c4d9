//! Type conversion and formatting utilities.
//!
//! Functions for converting raw token amounts (BigInt, token-native precision)
//! into exact decimal values, plus serde adapters that carry big integers as
//! decimal strings.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use once_cell::sync::Lazy;

// ============================================
// Decimal Conversions
// ============================================

/// Convert a raw token amount to a decimal value using the token's precision.
///
/// The conversion is an exact scale shift: no rounding is involved, so
/// replaying the same amounts always produces identical results.
///
/// # Example
/// ```ignore
/// let one_weth = BigInt::from(1_000_000_000_000_000_000u128);
/// assert_eq!(to_decimal(&one_weth, 18), BigDecimal::from(1));
/// ```
pub fn to_decimal(amount: &BigInt, decimals: u8) -> BigDecimal {
    BigDecimal::new(amount.clone(), decimals as i64)
}

/// USD value of a raw token amount at the given unit price.
pub fn amount_to_usd(amount: &BigInt, decimals: u8, price_usd: &BigDecimal) -> BigDecimal {
    if amount.sign() == Sign::NoSign {
        return BigDecimal::from(0);
    }
    to_decimal(amount, decimals) * price_usd
}

// ============================================
// BigInt Helpers
// ============================================

/// Saturate a signed value at zero, returning whether saturation happened.
pub fn clamp_non_negative(value: BigInt) -> (BigInt, bool) {
    if value.sign() == Sign::Minus {
        (BigInt::from(0), true)
    } else {
        (value, false)
    }
}

static POW10_CACHE: Lazy<[BigInt; 37]> =
    Lazy::new(|| std::array::from_fn(|i| BigInt::from(10u32).pow(i as u32)));

/// Compute 10^exp as BigInt.
pub(crate) fn big_pow10(exp: u32) -> BigInt {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigInt::from(10u32).pow(exp)
    }
}

// ============================================
// Serde Adapters
// ============================================

/// Serialize a `BigInt` as a base-10 string (`"-1500000000"`).
///
/// Raw on-chain amounts routinely exceed 2^53, so JSON numbers are not safe.
pub mod bigint_string {
    use num_bigint::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BigInt::from_str(raw.trim()).map_err(D::Error::custom)
    }
}

/// Same as [`bigint_string`] for an optional value.
pub mod opt_bigint_string {
    use num_bigint::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(
        value: &Option<BigInt>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigInt>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| BigInt::from_str(s.trim()).map_err(D::Error::custom))
            .transpose()
    }
}

/// Same as [`bigint_string`] for a vector of values.
pub mod vec_bigint_string {
    use num_bigint::BigInt;
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(values: &[BigInt], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for v in values {
            seq.serialize_element(&v.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<BigInt>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| BigInt::from_str(s.trim()).map_err(D::Error::custom))
            .collect()
    }
}
