//! Cost basis for positions held at cost.
//!
//! A [`Cost`] records the per-unit acquisition price of a lot, with an
//! optional acquisition date and label. Positions that share the same cost
//! belong to the same lot and are merged when accumulated into an
//! [`crate::Inventory`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::intern::Symbol;
use crate::Amount;

/// The resolved cost basis of a lot.
///
/// # Examples
///
/// ```
/// use quill_core::Cost;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let cost = Cost::new(dec!(150.00), "USD")
///     .with_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
///     .with_label("lot1");
///
/// assert_eq!(format!("{cost}"), "{150.00 USD, 2024-01-15, \"lot1\"}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    /// Per-unit cost
    pub number: Decimal,
    /// Cost currency
    pub currency: Symbol,
    /// Acquisition date
    pub date: Option<NaiveDate>,
    /// User label for the lot
    pub label: Option<String>,
}

impl Cost {
    /// Create a new cost with just a per-unit price.
    #[must_use]
    pub fn new(number: Decimal, currency: impl Into<Symbol>) -> Self {
        Self {
            number,
            currency: currency.into(),
            date: None,
            label: None,
        }
    }

    /// Set the acquisition date.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the lot label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The per-unit cost as an amount.
    #[must_use]
    pub fn as_amount(&self) -> Amount {
        Amount::new(self.number, self.currency.clone())
    }

    /// The total cost of holding `units` at this per-unit cost.
    #[must_use]
    pub fn total_cost(&self, units: Decimal) -> Amount {
        Amount::new(units * self.number, self.currency.clone())
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {}", self.number, self.currency)?;
        if let Some(date) = self.date {
            write!(f, ", {date}")?;
        }
        if let Some(label) = &self.label {
            write!(f, ", \"{label}\"")?;
        }
        write!(f, "}}")
    }
}
