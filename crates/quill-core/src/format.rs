//! Ledger file formatter.
//!
//! Pretty-prints directives back to ledger syntax with configurable
//! amount alignment. This is the canonical rendering used by `print`
//! style reports.

use crate::{
    Amount, Balance, Close, Commodity, Cost, Custom, Directive, Document, Event, MetaValue, Note,
    Open, Pad, Posting, Price, Query, Transaction,
};
use std::fmt::Write;

/// Formatter configuration.
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Column to align amounts to (default: 60).
    pub amount_column: usize,
    /// Indentation for postings.
    pub indent: String,
    /// Indentation for posting metadata.
    pub meta_indent: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            amount_column: 60,
            indent: "  ".to_string(),
            meta_indent: "    ".to_string(),
        }
    }
}

impl FormatConfig {
    /// Create a new config with the specified amount column.
    #[must_use]
    pub fn with_column(column: usize) -> Self {
        Self {
            amount_column: column,
            ..Default::default()
        }
    }

    /// Create a new config with the specified indent width.
    #[must_use]
    pub fn with_indent(indent_width: usize) -> Self {
        let indent = " ".repeat(indent_width);
        let meta_indent = " ".repeat(indent_width * 2);
        Self {
            indent,
            meta_indent,
            ..Default::default()
        }
    }

    /// Create a new config with both column and indent settings.
    #[must_use]
    pub fn new(column: usize, indent_width: usize) -> Self {
        let indent = " ".repeat(indent_width);
        let meta_indent = " ".repeat(indent_width * 2);
        Self {
            amount_column: column,
            indent,
            meta_indent,
        }
    }
}

/// Format a directive to a string.
pub fn format_directive(directive: &Directive, config: &FormatConfig) -> String {
    match directive {
        Directive::Transaction(txn) => format_transaction(txn, config),
        Directive::Balance(bal) => format_balance(bal),
        Directive::Open(open) => format_open(open),
        Directive::Close(close) => format_close(close),
        Directive::Commodity(comm) => format_commodity(comm),
        Directive::Pad(pad) => format_pad(pad),
        Directive::Event(event) => format_event(event),
        Directive::Query(query) => format_query(query),
        Directive::Note(note) => format_note(note),
        Directive::Document(doc) => format_document(doc),
        Directive::Price(price) => format_price(price),
        Directive::Custom(custom) => format_custom(custom),
    }
}

/// Format a transaction.
fn format_transaction(txn: &Transaction, config: &FormatConfig) -> String {
    let mut out = String::new();

    // Date and flag
    write!(out, "{} {}", txn.date, txn.flag).unwrap();

    // Payee and narration
    if let Some(payee) = &txn.payee {
        write!(out, " \"{}\"", escape_string(payee)).unwrap();
    }
    write!(out, " \"{}\"", escape_string(&txn.narration)).unwrap();

    // Tags
    for tag in &txn.tags {
        write!(out, " #{tag}").unwrap();
    }

    // Links
    for link in &txn.links {
        write!(out, " ^{link}").unwrap();
    }

    out.push('\n');

    // Transaction-level metadata
    for (key, value) in &txn.meta {
        writeln!(
            out,
            "{}{}: {}",
            &config.indent,
            key,
            format_meta_value(value)
        )
        .unwrap();
    }

    // Postings
    for posting in &txn.postings {
        out.push_str(&format_posting(posting, config));
        out.push('\n');
        for (key, value) in &posting.meta {
            writeln!(
                out,
                "{}{}: {}",
                &config.meta_indent,
                key,
                format_meta_value(value)
            )
            .unwrap();
        }
    }

    out
}

/// Format a posting with amount alignment.
fn format_posting(posting: &Posting, config: &FormatConfig) -> String {
    let mut line = String::new();
    line.push_str(&config.indent);

    // Flag (if present)
    if let Some(flag) = posting.flag {
        write!(line, "{flag} ").unwrap();
    }

    // Account
    line.push_str(&posting.account);

    // Units, cost, price
    let current_len = line.len();
    let amount_str = format_amount(&posting.units);
    let amount_with_extras = format_posting_amount(&posting.units, &posting.cost, &posting.price);

    // Pad so the units end at the configured column
    let target_col = config.amount_column.saturating_sub(amount_str.len());
    if current_len < target_col {
        let padding = target_col - current_len;
        for _ in 0..padding {
            line.push(' ');
        }
    } else {
        line.push_str("  "); // Minimum 2 spaces
    }

    line.push_str(&amount_with_extras);

    line
}

/// Format the amount part of a posting (units + cost + price).
fn format_posting_amount(units: &Amount, cost: &Option<Cost>, price: &Option<Amount>) -> String {
    let mut out = format_amount(units);

    // Cost lot, in braces
    if let Some(cost) = cost {
        write!(out, " {cost}").unwrap();
    }

    // Per-unit price annotation
    if let Some(price) = price {
        write!(out, " @ {}", format_amount(price)).unwrap();
    }

    out
}

/// Format an amount.
fn format_amount(amount: &Amount) -> String {
    format!("{} {}", amount.number, amount.currency)
}

/// Format a metadata value.
fn format_meta_value(value: &MetaValue) -> String {
    match value {
        MetaValue::String(s) => format!("\"{}\"", escape_string(s)),
        MetaValue::Account(a) => a.clone(),
        MetaValue::Currency(c) => c.clone(),
        MetaValue::Tag(t) => format!("#{t}"),
        MetaValue::Link(l) => format!("^{l}"),
        MetaValue::Date(d) => d.to_string(),
        MetaValue::Number(n) => n.to_string(),
        MetaValue::Amount(a) => format_amount(a),
        MetaValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        MetaValue::None => String::new(),
    }
}

/// Format a balance directive.
fn format_balance(bal: &Balance) -> String {
    let mut out = format!(
        "{} balance {} {}",
        bal.date,
        bal.account,
        format_amount(&bal.amount)
    );
    if let Some(tol) = &bal.tolerance {
        write!(out, " ~ {tol}").unwrap();
    }
    out.push('\n');
    out
}

/// Format an open directive.
fn format_open(open: &Open) -> String {
    let mut out = format!("{} open {}", open.date, open.account);
    if !open.currencies.is_empty() {
        write!(out, " {}", open.currencies.join(",")).unwrap();
    }
    if let Some(booking) = &open.booking {
        write!(out, " \"{booking}\"").unwrap();
    }
    out.push('\n');
    out
}

/// Format a close directive.
fn format_close(close: &Close) -> String {
    format!("{} close {}\n", close.date, close.account)
}

/// Format a commodity directive.
fn format_commodity(comm: &Commodity) -> String {
    format!("{} commodity {}\n", comm.date, comm.currency)
}

/// Format a pad directive.
fn format_pad(pad: &Pad) -> String {
    format!("{} pad {} {}\n", pad.date, pad.account, pad.source_account)
}

/// Format an event directive.
fn format_event(event: &Event) -> String {
    format!(
        "{} event \"{}\" \"{}\"\n",
        event.date,
        escape_string(&event.event_type),
        escape_string(&event.value)
    )
}

/// Format a query directive.
fn format_query(query: &Query) -> String {
    format!(
        "{} query \"{}\" \"{}\"\n",
        query.date,
        escape_string(&query.name),
        escape_string(&query.query)
    )
}

/// Format a note directive.
fn format_note(note: &Note) -> String {
    format!(
        "{} note {} \"{}\"\n",
        note.date,
        note.account,
        escape_string(&note.comment)
    )
}

/// Format a document directive.
fn format_document(doc: &Document) -> String {
    format!(
        "{} document {} \"{}\"\n",
        doc.date,
        doc.account,
        escape_string(&doc.path)
    )
}

/// Format a price directive.
fn format_price(price: &Price) -> String {
    format!(
        "{} price {} {}\n",
        price.date,
        price.currency,
        format_amount(&price.amount)
    )
}

/// Format a custom directive.
fn format_custom(custom: &Custom) -> String {
    let mut out = format!(
        "{} custom \"{}\"",
        custom.date,
        escape_string(&custom.custom_type)
    );
    for value in &custom.values {
        write!(out, " {}", format_meta_value(value)).unwrap();
    }
    out.push('\n');
    out
}

/// Escape a string for output (handle quotes and backslashes).
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
