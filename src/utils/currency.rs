//! Peso and percentage display formatting
//!
//! Dashboard cards show whole pesos with thousands separators (`₱1,235`).
//! Values that are not numbers are passed through unchanged.

use crate::types::Centavos;
use std::fmt;

/// Philippine peso sign
pub const PESO_SIGN: char = '₱';

/// A cell value on its way to a formatter
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Money(Centavos),
    Number(f64),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Money(c) => write!(f, "{}", c),
            DisplayValue::Number(n) => write!(f, "{}", n),
            DisplayValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<Centavos> for DisplayValue {
    fn from(value: Centavos) -> Self {
        DisplayValue::Money(value)
    }
}

impl From<f64> for DisplayValue {
    fn from(value: f64) -> Self {
        DisplayValue::Number(value)
    }
}

impl From<&str> for DisplayValue {
    fn from(value: &str) -> Self {
        DisplayValue::Text(value.to_string())
    }
}

impl From<String> for DisplayValue {
    fn from(value: String) -> Self {
        DisplayValue::Text(value)
    }
}

/// Insert thousands separators into a run of ASCII digits
pub fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Whole pesos with separators, rounded half away from zero
///
/// # Examples
/// ```
/// use scout_analytics::types::Centavos;
/// use scout_analytics::utils::currency::format_pesos;
///
/// assert_eq!(format_pesos(Centavos(123_450)), "₱1,235");
/// assert_eq!(format_pesos(Centavos(-5_000)), "-₱50");
/// ```
pub fn format_pesos(amount: Centavos) -> String {
    let negative = amount.0 < 0;
    let abs = amount.0.unsigned_abs();
    let pesos = (abs + 50) / 100;
    format!(
        "{}{}{}",
        if negative && pesos > 0 { "-" } else { "" },
        PESO_SIGN,
        group_thousands(&pesos.to_string())
    )
}

fn format_pesos_f64(pesos: f64) -> String {
    match Centavos::from_pesos(pesos) {
        Some(c) => format_pesos(c),
        None => pesos.to_string(),
    }
}

/// Currency display for any cell value
///
/// Numbers are taken as pesos. Text that parses as a finite number is
/// formatted too; anything else comes back unchanged.
///
/// # Examples
/// ```
/// use scout_analytics::utils::currency::{format_currency, DisplayValue};
///
/// assert_eq!(format_currency(&DisplayValue::Number(1234.5)), "₱1,235");
/// assert_eq!(format_currency(&DisplayValue::from("n/a")), "n/a");
/// ```
pub fn format_currency(value: &DisplayValue) -> String {
    match value {
        DisplayValue::Money(c) => format_pesos(*c),
        DisplayValue::Number(n) if n.is_finite() => format_pesos_f64(*n),
        DisplayValue::Number(n) => n.to_string(),
        DisplayValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => format_pesos_f64(n),
            _ => s.clone(),
        },
    }
}

/// Percentage with one decimal
///
/// # Examples
/// ```
/// use scout_analytics::utils::currency::{format_percent, DisplayValue};
///
/// assert_eq!(format_percent(&DisplayValue::Number(33.333)), "33.3%");
/// assert_eq!(format_percent(&DisplayValue::from("--")), "--");
/// ```
pub fn format_percent(value: &DisplayValue) -> String {
    match value {
        DisplayValue::Number(n) if n.is_finite() => format!("{:.1}%", n),
        DisplayValue::Number(n) => n.to_string(),
        DisplayValue::Money(c) => format!("{:.1}%", c.as_pesos()),
        DisplayValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => format!("{:.1}%", n),
            _ => s.clone(),
        },
    }
}

/// Signed growth label, e.g. `+12.5%`
pub fn format_growth(percent: f64) -> String {
    if !percent.is_finite() {
        return percent.to_string();
    }
    if percent > 0.0 {
        format!("+{:.1}%", percent)
    } else {
        format!("{:.1}%", percent)
    }
}
