//! Dollar amounts scraped from rendered page text.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// `$` then either comma-grouped thousands or a plain digit run, then exactly
/// two decimals not followed by another digit. Letters may follow directly,
/// since rendered text joins adjacent inline elements without a space.
static MONEY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\d{1,3}(?:,\d{3})+|\d+)\.(\d{2})(?:\D|$)").expect("money pattern is valid")
});

/// A non-negative dollar amount held as whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    cents: u64,
}

impl Amount {
    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Convert a configured dollar value, rounding to the nearest cent.
    /// Negative and non-finite input clamps to zero.
    pub fn from_dollars(dollars: f64) -> Self {
        if !dollars.is_finite() || dollars <= 0.0 {
            return Self::default();
        }
        Self {
            cents: (dollars * 100.0).round() as u64,
        }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    pub fn as_dollars(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_dollars())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dollars = f64::deserialize(deserializer)?;
        if dollars < 0.0 {
            return Err(serde::de::Error::custom("amount must not be negative"));
        }
        Ok(Amount::from_dollars(dollars))
    }
}

/// First dollar amount in `text`, if any.
pub fn parse_money(text: &str) -> Option<Amount> {
    let caps = MONEY_TOKEN.captures(text)?;
    let whole: u64 = caps[1].replace(',', "").parse().ok()?;
    let fraction: u64 = caps[2].parse().ok()?;
    Some(Amount::from_cents(whole.checked_mul(100)?.checked_add(fraction)?))
}
