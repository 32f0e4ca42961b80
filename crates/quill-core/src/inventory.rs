//! Inventory type representing a collection of positions.
//!
//! An [`Inventory`] tracks the holdings of an account as a collection of
//! [`Position`]s partitioned by lot: positions with the same currency and
//! the same cost are one bucket. Accumulating into a bucket sums the
//! units, and buckets that reach zero are dropped.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Amount, Position};

/// An inventory is a collection of positions keyed by (currency, cost).
///
/// # Examples
///
/// ```
/// use quill_core::{Inventory, Position, Amount, Cost};
/// use rust_decimal_macros::dec;
///
/// let mut inv = Inventory::new();
///
/// inv.add(Position::simple(Amount::new(dec!(100), "USD")));
/// inv.add(Position::simple(Amount::new(dec!(50), "USD")));
/// assert_eq!(inv.units_of("USD"), dec!(150));
///
/// // Lots with different costs stay separate
/// inv.add(Position::with_cost(Amount::new(dec!(10), "HOOL"), Cost::new(dec!(500), "USD")));
/// inv.add(Position::with_cost(Amount::new(dec!(10), "HOOL"), Cost::new(dec!(510), "USD")));
/// assert_eq!(inv.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    positions: Vec<Position>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all positions, in first-accumulated order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Check if the inventory holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.positions.iter().all(Position::is_empty)
    }

    /// Get the number of distinct lots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Get total units of a currency, summed across lots.
    #[must_use]
    pub fn units_of(&self, currency: &str) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.units.currency == currency)
            .map(|p| p.units.number)
            .sum()
    }

    /// Get all currencies held, sorted and deduplicated.
    #[must_use]
    pub fn currencies(&self) -> Vec<&str> {
        let mut currencies: Vec<&str> = self
            .positions
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.units.currency.as_str())
            .collect();
        currencies.sort_unstable();
        currencies.dedup();
        currencies
    }

    /// Add a position to the inventory.
    ///
    /// The position merges into the lot with the same currency and cost
    /// if one exists; a lot whose units reach zero is removed.
    pub fn add(&mut self, position: Position) {
        if position.is_empty() {
            return;
        }

        for (idx, existing) in self.positions.iter_mut().enumerate() {
            if existing.units.currency == position.units.currency && existing.cost == position.cost
            {
                existing.units += &position.units;
                if existing.is_empty() {
                    self.positions.remove(idx);
                }
                return;
            }
        }

        self.positions.push(position);
    }

    /// Add a bare amount as a position without cost.
    pub fn add_amount(&mut self, amount: Amount) {
        self.add(Position::simple(amount));
    }

    /// Merge another inventory into this one.
    pub fn merge(&mut self, other: &Self) {
        for pos in &other.positions {
            self.add(pos.clone());
        }
    }

    /// Negate every position.
    #[must_use]
    pub fn neg(&self) -> Self {
        let mut result = Self::new();
        for pos in &self.positions {
            result.add(pos.neg());
        }
        result
    }

    /// Reduce every lot to its cost value.
    ///
    /// Lots held at cost convert to their book value and merge by cost
    /// currency; positions without cost pass through unchanged.
    #[must_use]
    pub fn at_cost(&self) -> Self {
        let mut result = Self::new();
        for pos in &self.positions {
            if pos.is_empty() {
                continue;
            }
            result.add(Position::simple(pos.at_cost()));
        }
        result
    }

    /// Strip cost from every lot, aggregating by currency only.
    #[must_use]
    pub fn at_units(&self) -> Self {
        let mut result = Self::new();
        for pos in &self.positions {
            if pos.is_empty() {
                continue;
            }
            result.add(Position::simple(pos.units.clone()));
        }
        result
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty)");
        }

        let non_empty: Vec<_> = self.positions.iter().filter(|p| !p.is_empty()).collect();
        for (i, pos) in non_empty.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pos}")?;
        }
        Ok(())
    }
}

impl FromIterator<Position> for Inventory {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut inv = Self::new();
        for pos in iter {
            inv.add(pos);
        }
        inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cost;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_empty_inventory() {
        let inv = Inventory::new();
        assert!(inv.is_empty());
        assert_eq!(inv.len(), 0);
    }

    #[test]
    fn test_add_merges_same_currency() {
        let mut inv = Inventory::new();
        inv.add(Position::simple(Amount::new(dec!(100), "USD")));
        inv.add(Position::simple(Amount::new(dec!(50), "USD")));

        assert_eq!(inv.len(), 1);
        assert_eq!(inv.units_of("USD"), dec!(150));
    }

    #[test]
    fn test_add_cancels_to_zero() {
        let mut inv = Inventory::new();
        inv.add(Position::simple(Amount::new(dec!(100), "USD")));
        inv.add(Position::simple(Amount::new(dec!(-100), "USD")));

        assert!(inv.is_empty());
        assert_eq!(inv.len(), 0);
    }

    #[test]
    fn test_add_same_lot_merges() {
        let mut inv = Inventory::new();
        let cost = Cost::new(dec!(500.00), "USD").with_date(date(2024, 1, 1));

        inv.add(Position::with_cost(
            Amount::new(dec!(10), "HOOL"),
            cost.clone(),
        ));
        inv.add(Position::with_cost(Amount::new(dec!(5), "HOOL"), cost));

        assert_eq!(inv.len(), 1);
        assert_eq!(inv.units_of("HOOL"), dec!(15));
    }

    #[test]
    fn test_add_different_lots_stay_separate() {
        let mut inv = Inventory::new();

        let cost1 = Cost::new(dec!(500.00), "USD").with_date(date(2024, 1, 1));
        let cost2 = Cost::new(dec!(510.00), "USD").with_date(date(2024, 1, 15));

        inv.add(Position::with_cost(Amount::new(dec!(10), "HOOL"), cost1));
        inv.add(Position::with_cost(Amount::new(dec!(5), "HOOL"), cost2));

        assert_eq!(inv.len(), 2);
        assert_eq!(inv.units_of("HOOL"), dec!(15));
    }

    #[test]
    fn test_cost_and_no_cost_stay_separate() {
        let mut inv = Inventory::new();
        inv.add(Position::simple(Amount::new(dec!(100), "USD")));
        inv.add(Position::with_cost(
            Amount::new(dec!(100), "USD"),
            Cost::new(dec!(1.30), "CAD"),
        ));

        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn test_currencies() {
        let mut inv = Inventory::new();
        inv.add(Position::simple(Amount::new(dec!(100), "USD")));
        inv.add(Position::simple(Amount::new(dec!(50), "EUR")));
        inv.add(Position::simple(Amount::new(dec!(10), "HOOL")));

        assert_eq!(inv.currencies(), vec!["EUR", "HOOL", "USD"]);
    }

    #[test]
    fn test_at_cost() {
        let mut inv = Inventory::new();
        inv.add(Position::simple(Amount::new(dec!(100.00), "USD")));
        inv.add(Position::with_cost(
            Amount::new(dec!(10), "HOOL"),
            Cost::new(dec!(500.00), "USD"),
        ));

        let at_cost = inv.at_cost();
        assert_eq!(at_cost.len(), 1);
        assert_eq!(at_cost.units_of("USD"), dec!(5100.00));
    }

    #[test]
    fn test_at_units() {
        let mut inv = Inventory::new();

        let cost1 = Cost::new(dec!(500.00), "USD").with_date(date(2024, 1, 1));
        let cost2 = Cost::new(dec!(510.00), "USD").with_date(date(2024, 1, 15));

        inv.add(Position::with_cost(Amount::new(dec!(10), "HOOL"), cost1));
        inv.add(Position::with_cost(Amount::new(dec!(5), "HOOL"), cost2));

        let units = inv.at_units();
        assert_eq!(units.len(), 1);
        assert_eq!(units.units_of("HOOL"), dec!(15));
    }

    #[test]
    fn test_neg() {
        let mut inv = Inventory::new();
        inv.add(Position::simple(Amount::new(dec!(100), "USD")));
        inv.add(Position::simple(Amount::new(dec!(-60), "CAD")));

        let neg = inv.neg();
        assert_eq!(neg.units_of("USD"), dec!(-100));
        assert_eq!(neg.units_of("CAD"), dec!(60));
    }

    #[test]
    fn test_merge() {
        let mut a = Inventory::new();
        a.add(Position::simple(Amount::new(dec!(100), "USD")));

        let mut b = Inventory::new();
        b.add(Position::simple(Amount::new(dec!(50), "USD")));
        b.add(Position::simple(Amount::new(dec!(25), "EUR")));

        a.merge(&b);
        assert_eq!(a.units_of("USD"), dec!(150));
        assert_eq!(a.units_of("EUR"), dec!(25));
    }

    #[test]
    fn test_display() {
        let mut inv = Inventory::new();
        inv.add(Position::simple(Amount::new(dec!(-50.00), "USD")));
        inv.add(Position::simple(Amount::new(dec!(-60.00), "CAD")));

        assert_eq!(format!("{inv}"), "-50.00 USD, -60.00 CAD");
    }

    #[test]
    fn test_display_empty() {
        let inv = Inventory::new();
        assert_eq!(format!("{inv}"), "(empty)");
    }

    #[test]
    fn test_from_iterator() {
        let positions = vec![
            Position::simple(Amount::new(dec!(100), "USD")),
            Position::simple(Amount::new(dec!(50), "USD")),
        ];

        let inv: Inventory = positions.into_iter().collect();
        assert_eq!(inv.units_of("USD"), dec!(150));
    }
}
