//! Wire types for the monitor-data payload.
//!
//! These types match the JSON served by `/api/monitor_data`. A snapshot is
//! transient: every poll decodes a fresh one and it fully replaces whatever
//! was rendered before.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One fetched status payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// Current, minimum and maximum KPI readings.
    pub kpi: Kpi,

    /// Display-ready timestamp of the reading.
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_update: String,

    /// Severity token selecting the badge icon and colour.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_class: StatusClass,

    /// Human-readable status description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_text: String,

    /// Rendered chart markup. May embed script content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_html: Option<String>,
}

impl MonitorSnapshot {
    /// Returns the chart fragment if there is one worth inserting.
    pub fn chart_markup(&self) -> Option<&str> {
        self.graph_html.as_deref().filter(|html| !html.is_empty())
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// KPI readings. Each value is opaque and shown as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    #[serde(default)]
    pub current: DisplayValue,
    #[serde(default)]
    pub min: DisplayValue,
    #[serde(default)]
    pub max: DisplayValue,
    /// Average over the window. Only some producers send it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<DisplayValue>,
}

/// A display-ready scalar: either a JSON number or a pre-formatted string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    #[default]
    Null,
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Null => Ok(()),
            DisplayValue::Text(text) => f.write_str(text),
            DisplayValue::Number(n) => match n.as_f64() {
                Some(value) => f.write_str(&js_number_string(value)),
                None => write!(f, "{}", n),
            },
        }
    }
}

/// Format a number the way ECMAScript `Number::toString` does.
///
/// Integers above 2^53 lose precision exactly as they would in a browser.
fn js_number_string(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e-7".
    let sci = format!("{:e}", value.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = digits.len() as i32;
    let n = exponent + 1;
    let sign = if value < 0.0 { "-" } else { "" };

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, e_sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, e_sign, e.abs())
        }
    };

    format!("{}{}", sign, body)
}

impl From<i64> for DisplayValue {
    fn from(value: i64) -> Self {
        DisplayValue::Number(value.into())
    }
}

impl From<&str> for DisplayValue {
    fn from(value: &str) -> Self {
        DisplayValue::Text(value.to_string())
    }
}

/// Severity token carried in `status_class`.
///
/// Only `status-warning` and `status-danger` are special. Every other token,
/// including `status-neutral`, is the good/neutral case but keeps its
/// original spelling so it can be placed in the class list verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusClass {
    #[default]
    Good,
    Warning,
    Danger,
    Other(String),
}

impl StatusClass {
    pub const GOOD: &'static str = "status-good";
    pub const WARNING: &'static str = "status-warning";
    pub const DANGER: &'static str = "status-danger";

    /// Returns the token as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            StatusClass::Good => Self::GOOD,
            StatusClass::Warning => Self::WARNING,
            StatusClass::Danger => Self::DANGER,
            StatusClass::Other(token) => token,
        }
    }
}

impl From<String> for StatusClass {
    fn from(token: String) -> Self {
        match token.as_str() {
            Self::GOOD => StatusClass::Good,
            Self::WARNING => StatusClass::Warning,
            Self::DANGER => StatusClass::Danger,
            _ => StatusClass::Other(token),
        }
    }
}

impl From<StatusClass> for String {
    fn from(class: StatusClass) -> Self {
        class.as_str().to_string()
    }
}
