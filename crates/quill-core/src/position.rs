//! Position type representing units held at a cost.
//!
//! A [`Position`] is a holding of some units of a currency or commodity,
//! optionally with an associated cost basis (lot). Positions are what
//! postings contribute to an account and what inventories accumulate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Amount, Cost};

/// A position is units of a currency held at an optional cost.
///
/// For plain currencies (cash), positions have no cost. For commodities
/// held at cost (stock lots), the cost carries the acquisition basis.
///
/// # Examples
///
/// ```
/// use quill_core::{Amount, Cost, Position};
/// use rust_decimal_macros::dec;
///
/// let cash = Position::simple(Amount::new(dec!(1000.00), "USD"));
/// assert!(cash.cost.is_none());
///
/// let lot = Position::with_cost(
///     Amount::new(dec!(10), "HOOL"),
///     Cost::new(dec!(500.00), "USD"),
/// );
/// assert_eq!(lot.at_cost().number, dec!(5000.00));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The units held (number + currency/commodity)
    pub units: Amount,
    /// The cost basis (if held at cost)
    pub cost: Option<Cost>,
}

impl Position {
    /// Create a new position without cost tracking.
    #[must_use]
    pub const fn simple(units: Amount) -> Self {
        Self { units, cost: None }
    }

    /// Create a new position held at cost.
    #[must_use]
    pub const fn with_cost(units: Amount, cost: Cost) -> Self {
        Self {
            units,
            cost: Some(cost),
        }
    }

    /// Check if this position is empty (zero units).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.units.is_zero()
    }

    /// Get the currency of this position's units.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.units.currency
    }

    /// Get the cost currency, if this position is held at cost.
    #[must_use]
    pub fn cost_currency(&self) -> Option<&str> {
        self.cost.as_ref().map(|c| c.currency.as_str())
    }

    /// The value of this position reduced to its cost.
    ///
    /// Positions held at cost convert to their book value; positions
    /// without cost are their own value.
    #[must_use]
    pub fn at_cost(&self) -> Amount {
        match &self.cost {
            Some(cost) => cost.total_cost(self.units.number),
            None => self.units.clone(),
        }
    }

    /// Negate this position (reverse the sign of units).
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            units: -&self.units,
            cost: self.cost.clone(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_simple_position() {
        let pos = Position::simple(Amount::new(dec!(1000.00), "USD"));
        assert_eq!(pos.units.number, dec!(1000.00));
        assert_eq!(pos.currency(), "USD");
        assert!(pos.cost.is_none());
    }

    #[test]
    fn test_position_with_cost() {
        let cost = Cost::new(dec!(150.00), "USD").with_date(date(2024, 1, 15));
        let pos = Position::with_cost(Amount::new(dec!(10), "HOOL"), cost);

        assert_eq!(pos.units.number, dec!(10));
        assert_eq!(pos.currency(), "HOOL");
        assert_eq!(pos.cost_currency(), Some("USD"));
    }

    #[test]
    fn test_at_cost() {
        let cost = Cost::new(dec!(150.00), "USD");
        let pos = Position::with_cost(Amount::new(dec!(10), "HOOL"), cost);

        let value = pos.at_cost();
        assert_eq!(value.number, dec!(1500.00));
        assert_eq!(value.currency, "USD");
    }

    #[test]
    fn test_at_cost_without_cost() {
        let pos = Position::simple(Amount::new(dec!(1000.00), "USD"));
        assert_eq!(pos.at_cost(), pos.units);
    }

    #[test]
    fn test_is_empty() {
        let empty = Position::simple(Amount::zero("USD"));
        assert!(empty.is_empty());

        let non_empty = Position::simple(Amount::new(dec!(100), "USD"));
        assert!(!non_empty.is_empty());
    }

    #[test]
    fn test_neg() {
        let cost = Cost::new(dec!(150.00), "USD");
        let pos = Position::with_cost(Amount::new(dec!(100), "HOOL"), cost.clone());
        let neg = pos.neg();
        assert_eq!(neg.units.number, dec!(-100));
        assert_eq!(neg.cost, Some(cost));
    }

    #[test]
    fn test_display() {
        let cost = Cost::new(dec!(150.00), "USD");
        let pos = Position::with_cost(Amount::new(dec!(10), "HOOL"), cost);
        assert_eq!(format!("{pos}"), "10 HOOL {150.00 USD}");

        let cash = Position::simple(Amount::new(dec!(100.00), "USD"));
        assert_eq!(format!("{cash}"), "100.00 USD");
    }
}
