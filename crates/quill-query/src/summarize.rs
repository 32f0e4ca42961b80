//! Entry summarization for the `FROM` options.
//!
//! `OPEN ON date` compresses everything before the date into opening
//! balance entries, with past earnings moved to equity and past
//! currency conversions booked away. `CLOSE [ON date]` truncates the
//! stream and books the conversion residual of what remains. `CLEAR`
//! transfers income statement balances to the current earnings
//! account. The transforms compose in that order, and an optional
//! entry-level predicate prunes the result.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use quill_core::{
    sort_directives, Amount, Decimal, Directive, Inventory, Options, Position, Posting,
    Transaction,
};

use crate::ast::CloseClause;
use crate::compile::EvalFrom;
use crate::env::Context;
use crate::execute::evaluate;

/// Apply a compiled `FROM` clause to a sorted entry stream.
///
/// Evaluation problems in the predicate are appended to `diagnostics`
/// and treat the entry as filtered out.
pub fn filter_entries(
    from: &EvalFrom,
    entries: &[Directive],
    options: &Options,
    diagnostics: &mut Vec<String>,
) -> Vec<Directive> {
    let mut working: Vec<Directive> = entries.to_vec();

    if let Some(date) = from.open_on {
        working = open_at(&working, date, options);
    }
    if let Some(close) = from.close {
        working = close_at(&working, close, options);
    }
    if from.clear {
        working = clear_earnings(&working, options);
    }
    if let Some(filter) = &from.filter {
        working.retain(|entry| {
            let ctx = Context {
                entry,
                posting: None,
                balance: None,
                store: None,
            };
            let value = evaluate(filter, &ctx, diagnostics);
            value.as_truthy().unwrap_or_else(|| {
                diagnostics.push(format!(
                    "FROM filter evaluated to {}, expected a boolean",
                    value.kind()
                ));
                false
            })
        });
    }

    tracing::debug!("filtered entries: {} of {} kept", working.len(), entries.len());
    working
}

/// Summarize all entries strictly before `date` into opening balances.
fn open_at(entries: &[Directive], date: NaiveDate, options: &Options) -> Vec<Directive> {
    let account_types = options.account_types();

    // Balances accumulated over the truncated history.
    let mut balances: HashMap<String, Inventory> = HashMap::new();
    for entry in entries.iter().filter(|e| e.date() < date) {
        if let Some(txn) = entry.as_transaction() {
            for posting in &txn.postings {
                balances
                    .entry(posting.account.clone())
                    .or_default()
                    .add(posting.position());
            }
        }
    }

    // Book the conversion residual of the truncated period so the
    // remaining history still sums to zero at cost.
    let mut residual = Inventory::new();
    for balance in balances.values() {
        residual.merge(&balance.at_cost());
    }
    if !residual.is_empty() {
        balances
            .entry(options.account_previous_conversions.clone())
            .or_default()
            .merge(&residual.neg());
    }

    // Move income statement balances into previous earnings, at cost.
    let income_accounts: Vec<String> = balances
        .keys()
        .filter(|account| account_types.is_income_statement(account))
        .cloned()
        .collect();
    for account in income_accounts {
        let transfer = balances.get(&account).map_or_else(Inventory::new, Inventory::at_cost);
        if transfer.is_empty() {
            continue;
        }
        balances
            .entry(options.account_previous_earnings.clone())
            .or_default()
            .merge(&transfer);
        balances.entry(account).or_default().merge(&transfer.neg());
    }

    // One 'S' transaction per account, dated the day before the
    // cutoff, against the opening balances account.
    let open_date = date.pred_opt().unwrap_or(date);
    let mut summarized: Vec<Directive> = Vec::new();
    let mut accounts: Vec<(&String, &Inventory)> = balances.iter().collect();
    accounts.sort_by(|a, b| a.0.cmp(b.0));
    for (account, balance) in accounts {
        if balance.is_empty() || *account == options.account_previous_balances {
            continue;
        }
        let mut txn = Transaction::new(
            open_date,
            format!("Opening balance for '{account}' (Summarization)"),
        )
        .with_flag('S');
        let mut lots: Vec<&Position> = balance.positions().iter().collect();
        lots.sort_by(|a, b| {
            a.units
                .currency
                .cmp(&b.units.currency)
                .then_with(|| a.to_string().cmp(&b.to_string()))
        });
        for lot in lots {
            let mut posting = Posting::new(account.clone(), lot.units.clone());
            if let Some(cost) = &lot.cost {
                posting = posting.with_cost(cost.clone());
            }
            txn = txn.with_posting(posting);
            txn = txn.with_posting(Posting::new(
                options.account_previous_balances.clone(),
                -lot.at_cost(),
            ));
        }
        summarized.push(Directive::Transaction(txn));
    }

    // Accounts still open at the cutoff keep their open directives,
    // and the latest price per currency pair survives.
    let mut open_map: BTreeMap<String, Directive> = BTreeMap::new();
    let mut price_map: BTreeMap<(String, String), Directive> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.date() < date) {
        match entry {
            Directive::Open(open) => {
                open_map.insert(open.account.clone(), entry.clone());
            }
            Directive::Close(close) => {
                open_map.remove(&close.account);
            }
            Directive::Price(price) => {
                price_map.insert(
                    (price.currency.clone(), price.amount.currency.to_string()),
                    entry.clone(),
                );
            }
            _ => {}
        }
    }

    let mut result: Vec<Directive> = open_map.into_values().collect();
    result.extend(price_map.into_values());
    sort_directives(&mut result);
    result.extend(summarized);
    result.extend(entries.iter().filter(|e| e.date() >= date).cloned());
    result
}

/// Truncate entries after the closing date and book the conversion
/// residual of what remains.
fn close_at(entries: &[Directive], close: CloseClause, options: &Options) -> Vec<Directive> {
    let mut kept: Vec<Directive> = match close {
        CloseClause::On(date) => entries.iter().filter(|e| e.date() <= date).cloned().collect(),
        CloseClause::Implicit => entries.to_vec(),
    };

    let mut residual = Inventory::new();
    for entry in &kept {
        if let Some(txn) = entry.as_transaction() {
            for posting in &txn.postings {
                residual.add_amount(posting.position().at_cost());
            }
        }
    }
    if residual.is_empty() {
        return kept;
    }

    let date = match (close, kept.last()) {
        (CloseClause::On(date), _) => date,
        (CloseClause::Implicit, Some(last)) => last.date(),
        (CloseClause::Implicit, None) => return kept,
    };

    // The conversion postings are priced at zero in a currency no real
    // posting uses, so they change nothing but the currency totals.
    let mut txn = Transaction::new(date, format!("Conversion for ({residual})")).with_flag('C');
    let zero_price = Amount::new(Decimal::new(0, 2), options.conversion_currency.as_str());
    for position in residual.positions() {
        txn = txn.with_posting(
            Posting::new(
                options.account_current_conversions.clone(),
                -&position.units,
            )
            .with_price(zero_price.clone()),
        );
    }
    kept.push(Directive::Transaction(txn));
    kept
}

/// Transfer income statement balances to the current earnings account
/// with one final transaction.
fn clear_earnings(entries: &[Directive], options: &Options) -> Vec<Directive> {
    let account_types = options.account_types();

    let mut balances: HashMap<String, Inventory> = HashMap::new();
    for entry in entries {
        if let Some(txn) = entry.as_transaction() {
            for posting in &txn.postings {
                if account_types.is_income_statement(&posting.account) {
                    balances
                        .entry(posting.account.clone())
                        .or_default()
                        .add_amount(posting.position().at_cost());
                }
            }
        }
    }

    let mut accounts: Vec<(&String, &Inventory)> = balances
        .iter()
        .filter(|(_, balance)| !balance.is_empty())
        .collect();
    let Some(last) = entries.last() else {
        return entries.to_vec();
    };
    if accounts.is_empty() {
        return entries.to_vec();
    }
    accounts.sort_by(|a, b| a.0.cmp(b.0));

    let mut txn = Transaction::new(
        last.date(),
        format!(
            "Transfer balance for '{}' (Transfer balance)",
            options.account_current_earnings
        ),
    )
    .with_flag('T');
    for (account, balance) in accounts {
        let mut lots: Vec<&Position> = balance.positions().iter().collect();
        lots.sort_by(|a, b| {
            a.units
                .currency
                .cmp(&b.units.currency)
                .then_with(|| a.to_string().cmp(&b.to_string()))
        });
        for lot in lots {
            txn = txn.with_posting(Posting::new(account.clone(), -&lot.units));
            txn = txn.with_posting(Posting::new(
                options.account_current_earnings.clone(),
                lot.units.clone(),
            ));
        }
    }

    let mut result = entries.to_vec();
    result.push(Directive::Transaction(txn));
    result
}
