//! Binary-scaled resource amounts and their human-readable rendering.

use std::fmt;
use std::str::FromStr;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Serialize;

use crate::QuantityError;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;

/// Rendered in place of a quantity that was never declared
pub const NOT_SET: &str = "Not Set";

/// An amount of memory in bytes. Zero doubles as the "unset" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceQuantity(u64);

impl ResourceQuantity {
    pub const UNSET: ResourceQuantity = ResourceQuantity(0);

    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> u64 {
        self.0
    }

    pub const fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// Convert an optional API quantity, treating absence as unset
    pub fn from_optional(quantity: Option<&Quantity>) -> Result<Self, QuantityError> {
        match quantity {
            Some(q) => Self::try_from(q),
            None => Ok(Self::UNSET),
        }
    }
}

/// Format a quantity for display.
///
/// Whole MiB when at least 1 MiB, whole KiB when at least 1 KiB, and
/// `"Not Set"` for zero. Positive amounts below 1 KiB render as `"0Mi"`,
/// which makes them indistinguishable from an empty reading in the table.
pub fn format_quantity(quantity: ResourceQuantity) -> String {
    if quantity.is_unset() {
        return NOT_SET.to_string();
    }

    let bytes = quantity.bytes();
    if bytes >= MIB {
        return format!("{}Mi", bytes / MIB);
    }
    if bytes >= KIB {
        return format!("{}Ki", bytes / KIB);
    }

    "0Mi".to_string()
}

impl fmt::Display for ResourceQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_quantity(*self))
    }
}

impl TryFrom<&Quantity> for ResourceQuantity {
    type Error = QuantityError;

    fn try_from(quantity: &Quantity) -> Result<Self, Self::Error> {
        quantity.0.parse()
    }
}

enum Scale {
    Binary(u32),
    Decimal(i32),
}

impl FromStr for ResourceQuantity {
    type Err = QuantityError;

    /// Parse a Kubernetes quantity (`128Mi`, `1.5G`, `500e6`, `1024`) into
    /// bytes, rounding fractional results up.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }

        let s = match s.strip_prefix('+') {
            Some(rest) => rest,
            None => s,
        };
        if s.starts_with('-') {
            return Err(QuantityError::Negative(input.to_string()));
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);

        let (whole, fraction) = match number.split_once('.') {
            Some((w, f)) => (w, f),
            None => (number, ""),
        };
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(QuantityError::InvalidNumber(input.to_string()));
        }

        let scale = parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix(input.to_string()))?;
        let out_of_range = || QuantityError::OutOfRange(input.to_string());

        let mut mantissa: u128 = 0;
        for digit in whole.bytes().chain(fraction.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(u128::from(digit - b'0')))
                .ok_or_else(out_of_range)?;
        }
        let fraction_digits = u32::try_from(fraction.len()).map_err(|_| out_of_range())?;

        let (numerator, denominator_exp) = match scale {
            Scale::Binary(power) => {
                let factor = 1024u128.checked_pow(power).ok_or_else(out_of_range)?;
                (mantissa.checked_mul(factor).ok_or_else(out_of_range)?, fraction_digits)
            }
            Scale::Decimal(exp) if exp >= 0 => {
                let factor = 10u128.checked_pow(exp.unsigned_abs()).ok_or_else(out_of_range)?;
                (mantissa.checked_mul(factor).ok_or_else(out_of_range)?, fraction_digits)
            }
            Scale::Decimal(exp) => (mantissa, fraction_digits + exp.unsigned_abs()),
        };

        let denominator = 10u128.checked_pow(denominator_exp).ok_or_else(out_of_range)?;
        let bytes = numerator.div_ceil(denominator);

        u64::try_from(bytes)
            .map(ResourceQuantity)
            .map_err(|_| out_of_range())
    }
}

fn parse_suffix(suffix: &str) -> Option<Scale> {
    let scale = match suffix {
        "" => Scale::Decimal(0),
        "Ki" => Scale::Binary(1),
        "Mi" => Scale::Binary(2),
        "Gi" => Scale::Binary(3),
        "Ti" => Scale::Binary(4),
        "Pi" => Scale::Binary(5),
        "Ei" => Scale::Binary(6),
        "n" => Scale::Decimal(-9),
        "u" => Scale::Decimal(-6),
        "m" => Scale::Decimal(-3),
        "k" => Scale::Decimal(3),
        "M" => Scale::Decimal(6),
        "G" => Scale::Decimal(9),
        "T" => Scale::Decimal(12),
        "P" => Scale::Decimal(15),
        "E" => Scale::Decimal(18),
        exponent => {
            let digits = exponent
                .strip_prefix('e')
                .or_else(|| exponent.strip_prefix('E'))?;
            Scale::Decimal(digits.parse().ok()?)
        }
    };
    Some(scale)
}
