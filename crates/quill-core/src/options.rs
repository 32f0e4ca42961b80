//! Ledger options parsing and storage.

use std::collections::{HashMap, HashSet};

use crate::account::AccountTypes;

/// Known option names.
const KNOWN_OPTIONS: &[&str] = &[
    "title",
    "filename",
    "operating_currency",
    "name_assets",
    "name_liabilities",
    "name_equity",
    "name_income",
    "name_expenses",
    "account_previous_balances",
    "account_previous_earnings",
    "account_previous_conversions",
    "account_current_earnings",
    "account_current_conversions",
    "conversion_currency",
];

/// Options that can be specified multiple times.
const REPEATABLE_OPTIONS: &[&str] = &["operating_currency"];

/// Options whose values must be account names.
const ACCOUNT_OPTIONS: &[&str] = &[
    "account_previous_balances",
    "account_previous_earnings",
    "account_previous_conversions",
    "account_current_earnings",
    "account_current_conversions",
];

/// Option validation warning.
#[derive(Debug, Clone)]
pub struct OptionWarning {
    /// Warning code (E7001, E7002, E7003).
    pub code: &'static str,
    /// Warning message.
    pub message: String,
    /// Option name.
    pub option: String,
    /// Option value.
    pub value: String,
}

/// Ledger file options.
///
/// These correspond to the `option` directives in ledger files. Only the
/// options that affect querying and summarization are modeled; everything
/// else lands in the `custom` map.
#[derive(Debug, Clone)]
pub struct Options {
    /// Title for the ledger.
    pub title: Option<String>,

    /// Source filename (auto-set).
    pub filename: Option<String>,

    /// Operating currencies (for reporting).
    pub operating_currency: Vec<String>,

    /// Name prefix for Assets accounts.
    pub name_assets: String,

    /// Name prefix for Liabilities accounts.
    pub name_liabilities: String,

    /// Name prefix for Equity accounts.
    pub name_equity: String,

    /// Name prefix for Income accounts.
    pub name_income: String,

    /// Name prefix for Expenses accounts.
    pub name_expenses: String,

    /// Account for previous balances (opening balances).
    pub account_previous_balances: String,

    /// Account for previous earnings.
    pub account_previous_earnings: String,

    /// Account for previous conversions.
    pub account_previous_conversions: String,

    /// Account for current earnings.
    pub account_current_earnings: String,

    /// Account for current conversion differences.
    pub account_current_conversions: String,

    /// Currency used to price conversion postings.
    pub conversion_currency: String,

    /// Any other custom options.
    pub custom: HashMap<String, String>,

    /// Options that have been set (for duplicate detection).
    #[doc(hidden)]
    pub set_options: HashSet<String>,

    /// Validation warnings collected during parsing.
    pub warnings: Vec<OptionWarning>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    /// Create new options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            filename: None,
            operating_currency: Vec::new(),
            name_assets: "Assets".to_string(),
            name_liabilities: "Liabilities".to_string(),
            name_equity: "Equity".to_string(),
            name_income: "Income".to_string(),
            name_expenses: "Expenses".to_string(),
            account_previous_balances: "Equity:Opening-Balances".to_string(),
            account_previous_earnings: "Equity:Earnings:Previous".to_string(),
            account_previous_conversions: "Equity:Conversions:Previous".to_string(),
            account_current_earnings: "Equity:Earnings:Current".to_string(),
            account_current_conversions: "Equity:Conversions:Current".to_string(),
            conversion_currency: "NOTHING".to_string(),
            custom: HashMap::new(),
            set_options: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Set an option by name.
    ///
    /// Validates the option and collects any warnings in `self.warnings`.
    pub fn set(&mut self, key: &str, value: &str) {
        // Check for unknown options (E7001)
        let is_known = KNOWN_OPTIONS.contains(&key);
        if !is_known {
            self.warnings.push(OptionWarning {
                code: "E7001",
                message: format!("Unknown option \"{key}\""),
                option: key.to_string(),
                value: value.to_string(),
            });
        }

        // Check for duplicate non-repeatable options (E7003)
        let is_repeatable = REPEATABLE_OPTIONS.contains(&key);
        if is_known && !is_repeatable && self.set_options.contains(key) {
            self.warnings.push(OptionWarning {
                code: "E7003",
                message: format!("Option \"{key}\" can only be specified once"),
                option: key.to_string(),
                value: value.to_string(),
            });
        }

        // Account-valued options must name a sub-account (E7002)
        if ACCOUNT_OPTIONS.contains(&key) && !value.contains(':') {
            self.warnings.push(OptionWarning {
                code: "E7002",
                message: format!("Invalid value \"{value}\" for option \"{key}\": expected account name"),
                option: key.to_string(),
                value: value.to_string(),
            });
        }

        // Track that this option was set
        self.set_options.insert(key.to_string());

        // Apply the option value
        match key {
            "title" => self.title = Some(value.to_string()),
            "filename" => self.filename = Some(value.to_string()),
            "operating_currency" => self.operating_currency.push(value.to_string()),
            "name_assets" => self.name_assets = value.to_string(),
            "name_liabilities" => self.name_liabilities = value.to_string(),
            "name_equity" => self.name_equity = value.to_string(),
            "name_income" => self.name_income = value.to_string(),
            "name_expenses" => self.name_expenses = value.to_string(),
            "account_previous_balances" => self.account_previous_balances = value.to_string(),
            "account_previous_earnings" => self.account_previous_earnings = value.to_string(),
            "account_previous_conversions" => self.account_previous_conversions = value.to_string(),
            "account_current_earnings" => self.account_current_earnings = value.to_string(),
            "account_current_conversions" => self.account_current_conversions = value.to_string(),
            "conversion_currency" => self.conversion_currency = value.to_string(),
            _ => {
                // Unknown options go to custom map
                self.custom.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Get a custom option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }

    /// Get the account type prefixes as a classification table.
    #[must_use]
    pub fn account_types(&self) -> AccountTypes {
        AccountTypes {
            assets: self.name_assets.clone(),
            liabilities: self.name_liabilities.clone(),
            equity: self.name_equity.clone(),
            income: self.name_income.clone(),
            expenses: self.name_expenses.clone(),
        }
    }
}
