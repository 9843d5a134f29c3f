use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A validated AcuPay account number: exactly 14 alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("account number must be exactly 14 alphanumeric characters (got \"{0}\")")]
pub struct InvalidAccountNumber(pub String);

impl AccountNumber {
    pub fn parse(raw: &str) -> Result<Self, InvalidAccountNumber> {
        let trimmed = raw.trim();
        if trimmed.len() == 14 && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(InvalidAccountNumber(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A currency amount in minor units (cents). The backend wire format carries
/// amounts as decimal numbers of whole units; conversion happens at the API
/// boundary only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidAmount {
    #[error("amount is not a valid number")]
    NotANumber,
    #[error("amount has more than two decimal places")]
    Precision,
    #[error("amount is too large")]
    OutOfRange,
}

impl Money {
    pub const fn from_minor_units(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// Parses user input such as "50", "50.2" or "50.25". Negative and
    /// over-precise values are rejected; the form never produces them.
    pub fn parse_input(raw: &str) -> Result<Self, InvalidAmount> {
        let raw = raw.trim();
        let (units, fraction) = match raw.split_once('.') {
            Some((units, fraction)) => (units, fraction),
            None => (raw, ""),
        };
        if units.is_empty() && fraction.is_empty() {
            return Err(InvalidAmount::NotANumber);
        }
        if !units.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(InvalidAmount::NotANumber);
        }
        if fraction.len() > 2 {
            return Err(InvalidAmount::Precision);
        }

        let whole: i64 = if units.is_empty() {
            0
        } else {
            units.parse().map_err(|_| InvalidAmount::OutOfRange)?
        };
        let mut cents: i64 = if fraction.is_empty() {
            0
        } else {
            // "5" means 50 cents, "05" means 5 cents.
            let parsed: i64 = fraction.parse().map_err(|_| InvalidAmount::NotANumber)?;
            if fraction.len() == 1 {
                parsed * 10
            } else {
                parsed
            }
        };
        cents = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or(InvalidAmount::OutOfRange)?;
        Ok(Self(cents))
    }

    pub fn from_major_f64(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Sub-unit transfers are rejected: the minimum transferable amount is
    /// one whole currency unit.
    pub const fn is_at_least_one_unit(&self) -> bool {
        self.0 >= 100
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// Transaction history view filter, matching the backend query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Sent,
    Received,
}

impl HistoryFilter {
    pub const fn as_query_value(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown history filter \"{0}\" (expected all, sent or received)")]
pub struct InvalidHistoryFilter(pub String);

impl FromStr for HistoryFilter {
    type Err = InvalidHistoryFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "sent" => Ok(Self::Sent),
            "received" => Ok(Self::Received),
            other => Err(InvalidHistoryFilter(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_fourteen_alphanumerics() {
        let parsed = AccountNumber::parse(" ACUP8112994147 ").expect("valid");
        assert_eq!(parsed.as_str(), "ACUP8112994147");
    }

    #[test]
    fn rejects_wrong_length_and_charset() {
        assert!(AccountNumber::parse("AB").is_err());
        assert!(AccountNumber::parse("ACUP81129941477").is_err());
        assert!(AccountNumber::parse("ACUP8112-94147").is_err());
        assert!(AccountNumber::parse("").is_err());
    }

    #[test]
    fn parses_decimal_amounts_to_cents() {
        assert_eq!(Money::parse_input("50").unwrap().minor_units(), 5000);
        assert_eq!(Money::parse_input("50.2").unwrap().minor_units(), 5020);
        assert_eq!(Money::parse_input("50.25").unwrap().minor_units(), 5025);
        assert_eq!(Money::parse_input("0.05").unwrap().minor_units(), 5);
        assert_eq!(Money::parse_input(".5").unwrap().minor_units(), 50);
    }

    #[test]
    fn rejects_bad_amounts() {
        assert_eq!(Money::parse_input(""), Err(InvalidAmount::NotANumber));
        assert_eq!(Money::parse_input("abc"), Err(InvalidAmount::NotANumber));
        assert_eq!(Money::parse_input("-5"), Err(InvalidAmount::NotANumber));
        assert_eq!(Money::parse_input("1.234"), Err(InvalidAmount::Precision));
    }

    #[test]
    fn whole_unit_floor() {
        assert!(Money::parse_input("1").unwrap().is_at_least_one_unit());
        assert!(!Money::parse_input("0.99").unwrap().is_at_least_one_unit());
    }

    #[test]
    fn formats_as_currency() {
        assert_eq!(Money::from_minor_units(5025).to_string(), "$50.25");
        assert_eq!(Money::from_minor_units(5).to_string(), "$0.05");
        assert_eq!(Money::from_minor_units(-150).to_string(), "-$1.50");
    }

    #[test]
    fn round_trips_wire_decimals() {
        let money = Money::from_major_f64(450.0);
        assert_eq!(money.minor_units(), 45000);
        assert_eq!(money.as_major_f64(), 450.0);
    }

    #[test]
    fn history_filter_parses_known_values() {
        assert_eq!("all".parse::<HistoryFilter>().unwrap(), HistoryFilter::All);
        assert_eq!("Sent".parse::<HistoryFilter>().unwrap(), HistoryFilter::Sent);
        assert!("credit".parse::<HistoryFilter>().is_err());
    }
}
