//! Property-based tests for quill-core.
//!
//! These tests verify invariants hold for arbitrary inputs using proptest.
//!
//! Run with: cargo test -p quill-core --test `property_tests`

use chrono::NaiveDate;
use proptest::prelude::*;
use quill_core::{
    sort_directives, Amount, Cost, Directive, Inventory, Open, Position, Price, Symbol,
    Transaction,
};
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_decimal() -> impl Strategy<Value = Decimal> {
    // Generate reasonable decimals for testing
    (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_positive_decimal() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_currency() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("USD".to_string()),
        Just("EUR".to_string()),
        Just("GBP".to_string()),
        Just("AAPL".to_string()),
        Just("BTC".to_string()),
    ]
}

fn arb_amount() -> impl Strategy<Value = Amount> {
    (arb_decimal(), arb_currency()).prop_map(|(n, c)| Amount::new(n, c))
}

fn arb_positive_amount() -> impl Strategy<Value = Amount> {
    (arb_positive_decimal(), arb_currency()).prop_map(|(n, c)| Amount::new(n, c))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020u32..2025u32, 1u32..13u32, 1u32..29u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y as i32, m, d).unwrap())
}

fn arb_cost() -> impl Strategy<Value = Cost> {
    (
        arb_positive_decimal(),
        arb_currency(),
        prop::option::of(arb_date()),
    )
        .prop_map(|(n, c, date)| {
            let mut cost = Cost::new(n, c);
            if let Some(d) = date {
                cost = cost.with_date(d);
            }
            cost
        })
}

fn arb_position() -> impl Strategy<Value = Position> {
    (arb_positive_amount(), prop::option::of(arb_cost())).prop_map(|(units, cost)| {
        if let Some(c) = cost {
            Position::with_cost(units, c)
        } else {
            Position::simple(units)
        }
    })
}

fn arb_inventory() -> impl Strategy<Value = Inventory> {
    prop::collection::vec(arb_position(), 0..10).prop_map(|positions| {
        let mut inv = Inventory::new();
        for pos in positions {
            inv.add(pos);
        }
        inv
    })
}

fn arb_directive() -> impl Strategy<Value = Directive> {
    (arb_date(), 0u8..4u8, arb_amount()).prop_map(|(date, kind, amount)| match kind {
        0 => Directive::Open(Open::new(date, "Assets:Bank")),
        1 => Directive::Price(Price::new(date, "AAPL", amount)),
        2 => Directive::Transaction(Transaction::new(date, "Payment")),
        _ => Directive::Transaction(Transaction::new(date, "Transfer")),
    })
}

// ============================================================================
// Decimal Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Addition is commutative
    #[test]
    fn prop_decimal_addition_commutative(a in arb_decimal(), b in arb_decimal()) {
        prop_assert_eq!(a + b, b + a);
    }

    /// Addition is associative
    #[test]
    fn prop_decimal_addition_associative(
        a in arb_decimal(),
        b in arb_decimal(),
        c in arb_decimal()
    ) {
        let left = (a + b) + c;
        let right = a + (b + c);
        prop_assert_eq!(left, right);
    }

    /// Zero is additive identity
    #[test]
    fn prop_decimal_zero_identity(a in arb_decimal()) {
        prop_assert_eq!(a + Decimal::ZERO, a);
        prop_assert_eq!(Decimal::ZERO + a, a);
    }

    /// Negation is its own inverse
    #[test]
    fn prop_decimal_negation_inverse(a in arb_decimal()) {
        prop_assert_eq!(-(-a), a);
    }
}

// ============================================================================
// Amount Properties
// ============================================================================

proptest! {
    /// Amount negation is its own inverse
    #[test]
    fn prop_amount_negation_inverse(amount in arb_amount()) {
        let double_neg = -(-amount.clone());
        prop_assert_eq!(double_neg.number, amount.number);
        prop_assert_eq!(double_neg.currency, amount.currency);
    }

    /// Amount addition produces same currency
    #[test]
    fn prop_amount_same_currency_add(
        n1 in arb_decimal(),
        n2 in arb_decimal(),
        currency in arb_currency()
    ) {
        let a1 = Amount::new(n1, &currency);
        let a2 = Amount::new(n2, &currency);
        let sum = a1 + a2;
        prop_assert_eq!(sum.currency, currency);
        prop_assert_eq!(sum.number, n1 + n2);
    }
}

// ============================================================================
// Inventory Properties
// ============================================================================

proptest! {
    /// Adding a position increases units by exactly that position's units
    #[test]
    fn prop_inventory_add_increases_units(
        inv in arb_inventory(),
        pos in arb_position()
    ) {
        let currency = pos.units.currency.clone();
        let before = inv.units_of(&currency);
        let mut after_inv = inv;
        after_inv.add(pos.clone());
        let after = after_inv.units_of(&currency);

        prop_assert_eq!(after, before + pos.units.number);
    }

    /// Inventory merge sums units per currency
    #[test]
    fn prop_inventory_merge_units(
        inv1 in arb_inventory(),
        inv2 in arb_inventory()
    ) {
        let mut merged = inv1.clone();
        merged.merge(&inv2);

        for currency in ["USD", "EUR", "GBP", "AAPL", "BTC"] {
            let expected = inv1.units_of(currency) + inv2.units_of(currency);
            let actual = merged.units_of(currency);
            prop_assert_eq!(actual, expected, "Currency {} mismatch", currency);
        }
    }

    /// Empty inventory has zero units for any currency
    #[test]
    fn prop_empty_inventory_zero_units(currency in arb_currency()) {
        let inv = Inventory::new();
        prop_assert_eq!(inv.units_of(&currency), Decimal::ZERO);
    }

    /// Inventory units stay consistent across a sequence of additions
    #[test]
    fn prop_inventory_units_consistency(positions in prop::collection::vec(arb_position(), 1..5)) {
        let mut inv = Inventory::new();
        let mut expected_units: std::collections::HashMap<Symbol, Decimal> = std::collections::HashMap::new();

        for pos in &positions {
            inv.add(pos.clone());
            *expected_units.entry(pos.units.currency.clone()).or_default() += pos.units.number;
        }

        for (currency, expected) in expected_units {
            prop_assert_eq!(inv.units_of(currency.as_str()), expected);
        }
    }

    /// Adding a position and then its negation leaves the lot fully removed
    #[test]
    fn prop_inventory_cancellation_prunes(pos in arb_position()) {
        let mut inv = Inventory::new();
        inv.add(pos.clone());
        inv.add(pos.neg());

        prop_assert!(inv.is_empty(), "Expected empty inventory, got {:?}", inv);
    }

    /// A negated inventory has negated units for every currency
    #[test]
    fn prop_inventory_neg_negates_units(inv in arb_inventory()) {
        let negated = inv.neg();
        for currency in ["USD", "EUR", "GBP", "AAPL", "BTC"] {
            prop_assert_eq!(negated.units_of(currency), -inv.units_of(currency));
        }
    }

    /// Reducing to cost never increases the number of positions
    #[test]
    fn prop_inventory_at_cost_no_growth(inv in arb_inventory()) {
        let at_cost = inv.at_cost();
        prop_assert!(at_cost.len() <= inv.len());
    }
}

// ============================================================================
// Cost and Position Properties
// ============================================================================

proptest! {
    /// Book value of a costed position scales with the unit count
    #[test]
    fn prop_position_at_cost_scales(
        n in arb_positive_decimal(),
        cost in arb_cost()
    ) {
        let pos = Position::with_cost(Amount::new(n, "HOOL"), cost.clone());
        let value = pos.at_cost();

        prop_assert_eq!(value.number, n * cost.number);
        prop_assert_eq!(value.currency, cost.currency);
    }

    /// Uncosted positions are their own book value
    #[test]
    fn prop_position_at_cost_identity(units in arb_amount()) {
        let pos = Position::simple(units.clone());
        prop_assert_eq!(pos.at_cost(), units);
    }
}

// ============================================================================
// Directive Ordering Properties
// ============================================================================

proptest! {
    /// Sorting yields non-decreasing dates, with type priority breaking ties
    #[test]
    fn prop_sort_directives_canonical(mut directives in prop::collection::vec(arb_directive(), 0..20)) {
        sort_directives(&mut directives);

        for pair in directives.windows(2) {
            prop_assert!(pair[0].date() <= pair[1].date());
            if pair[0].date() == pair[1].date() {
                prop_assert!(pair[0].priority() <= pair[1].priority());
            }
        }
    }

    /// Sorting is idempotent
    #[test]
    fn prop_sort_directives_idempotent(mut directives in prop::collection::vec(arb_directive(), 0..20)) {
        sort_directives(&mut directives);
        let once = directives.clone();
        sort_directives(&mut directives);
        prop_assert_eq!(once, directives);
    }
}

// ============================================================================
// Display Properties
// ============================================================================

proptest! {
    /// Amount Display/parsing roundtrip
    #[test]
    fn prop_amount_display_roundtrip(amount in arb_amount()) {
        let display = format!("{amount}");

        // Display format is "number currency"
        let parts: Vec<&str> = display.split_whitespace().collect();
        prop_assert_eq!(parts.len(), 2);

        let parsed_number: Decimal = parts[0].parse().unwrap();
        let parsed_currency = parts[1];

        prop_assert_eq!(parsed_number, amount.number);
        prop_assert_eq!(parsed_currency, amount.currency.as_str());
    }

    /// Cost Display contains key components
    #[test]
    fn prop_cost_display_contains_components(cost in arb_cost()) {
        let display = format!("{cost}");

        prop_assert!(display.contains(&cost.number.to_string()));
        prop_assert!(display.contains(cost.currency.as_str()));
    }
}
