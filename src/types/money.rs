//! Fixed-point peso amounts
//!
//! Source rows carry prices and totals as decimal numbers (or numeric strings from
//! PostgREST `numeric` columns). They are converted once, on decode, to whole
//! centavos; every sum after that is integer arithmetic.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Centavos per peso
pub const CENTAVOS_PER_PESO: i64 = 100;

/// An amount of Philippine pesos stored as whole centavos
///
/// Serialises as a peso number so exported rows read back through
/// [`deserialize_pesos`] unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Centavos(pub i64);

impl Centavos {
    pub const ZERO: Centavos = Centavos(0);

    /// Convert a decimal peso amount, rounding half away from zero to the nearest centavo
    pub fn from_pesos(pesos: f64) -> Option<Self> {
        if !pesos.is_finite() {
            return None;
        }
        let scaled = (pesos * CENTAVOS_PER_PESO as f64).round();
        if scaled.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Centavos(scaled as i64))
    }

    pub fn as_pesos(self) -> f64 {
        self.0 as f64 / CENTAVOS_PER_PESO as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Centavos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Centavos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_pesos())
    }
}

impl Add for Centavos {
    type Output = Centavos;

    fn add(self, rhs: Centavos) -> Centavos {
        Centavos(self.0 + rhs.0)
    }
}

impl AddAssign for Centavos {
    fn add_assign(&mut self, rhs: Centavos) {
        self.0 += rhs.0;
    }
}

impl Sub for Centavos {
    type Output = Centavos;

    fn sub(self, rhs: Centavos) -> Centavos {
        Centavos(self.0 - rhs.0)
    }
}

/// Line revenue: unit price times quantity
impl Mul<i64> for Centavos {
    type Output = Centavos;

    fn mul(self, rhs: i64) -> Centavos {
        Centavos(self.0 * rhs)
    }
}

impl Sum for Centavos {
    fn sum<I: Iterator<Item = Centavos>>(iter: I) -> Centavos {
        iter.fold(Centavos::ZERO, |acc, c| acc + c)
    }
}

impl<'a> Sum<&'a Centavos> for Centavos {
    fn sum<I: Iterator<Item = &'a Centavos>>(iter: I) -> Centavos {
        iter.fold(Centavos::ZERO, |acc, c| acc + *c)
    }
}

/// Raw numeric shapes a peso amount arrives in
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

fn raw_to_centavos<E: serde::de::Error>(raw: RawAmount) -> Result<Centavos, E> {
    let pesos = match raw {
        RawAmount::Int(i) => {
            return i
                .checked_mul(CENTAVOS_PER_PESO)
                .map(Centavos)
                .ok_or_else(|| E::custom(format!("peso amount out of range: {}", i)))
        }
        RawAmount::Float(f) => f,
        RawAmount::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid peso amount '{}'", s)))?,
    };
    Centavos::from_pesos(pesos)
        .ok_or_else(|| E::custom(format!("peso amount out of range: {}", pesos)))
}

/// Deserialise a peso amount (number or numeric string) into centavos
pub fn deserialize_pesos<'de, D>(deserializer: D) -> Result<Centavos, D::Error>
where
    D: Deserializer<'de>,
{
    raw_to_centavos(RawAmount::deserialize(deserializer)?)
}

/// Nullable variant of [`deserialize_pesos`]; `null` and missing become zero
pub fn deserialize_pesos_or_zero<'de, D>(deserializer: D) -> Result<Centavos, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        Some(raw) => raw_to_centavos(raw),
        None => Ok(Centavos::ZERO),
    }
}
