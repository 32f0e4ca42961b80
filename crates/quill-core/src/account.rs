//! Account name helpers and account-type classification.
//!
//! Account names are colon-separated component paths like
//! `Assets:Bank:Checking`. The first component determines the account
//! type; the configured type names live in [`crate::Options`] and are
//! resolved here into an [`AccountTypes`] table.

use serde::{Deserialize, Serialize};

/// Separator between account name components.
pub const SEP: char = ':';

/// Get the parent of an account name.
///
/// Returns `None` for a single-component account.
///
/// # Examples
///
/// ```
/// use quill_core::account::parent;
///
/// assert_eq!(parent("Assets:Bank:Checking"), Some("Assets:Bank"));
/// assert_eq!(parent("Assets"), None);
/// ```
#[must_use]
pub fn parent(account: &str) -> Option<&str> {
    account.rfind(SEP).map(|idx| &account[..idx])
}

/// Get the last component of an account name.
#[must_use]
pub fn leaf(account: &str) -> &str {
    account.rsplit(SEP).next().unwrap_or(account)
}

/// Get the first component of an account name.
#[must_use]
pub fn root(account: &str) -> &str {
    account.split(SEP).next().unwrap_or(account)
}

/// Iterate over the components of an account name.
pub fn components(account: &str) -> impl Iterator<Item = &str> {
    account.split(SEP)
}

/// The five account types of a double-entry ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Things owned
    Assets,
    /// Things owed
    Liabilities,
    /// Net worth accounts
    Equity,
    /// Money coming in
    Income,
    /// Money going out
    Expenses,
}

/// The configured names of the five account type roots.
///
/// Ledgers may rename the standard roots (for example to a localized
/// spelling); classification always goes through the configured names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTypes {
    /// Root name for asset accounts
    pub assets: String,
    /// Root name for liability accounts
    pub liabilities: String,
    /// Root name for equity accounts
    pub equity: String,
    /// Root name for income accounts
    pub income: String,
    /// Root name for expense accounts
    pub expenses: String,
}

impl Default for AccountTypes {
    fn default() -> Self {
        Self {
            assets: "Assets".to_string(),
            liabilities: "Liabilities".to_string(),
            equity: "Equity".to_string(),
            income: "Income".to_string(),
            expenses: "Expenses".to_string(),
        }
    }
}

impl AccountTypes {
    /// Classify an account by its root component.
    ///
    /// Returns `None` for accounts under an unknown root.
    #[must_use]
    pub fn classify(&self, account: &str) -> Option<AccountType> {
        let account_root = root(account);
        if account_root == self.assets {
            Some(AccountType::Assets)
        } else if account_root == self.liabilities {
            Some(AccountType::Liabilities)
        } else if account_root == self.equity {
            Some(AccountType::Equity)
        } else if account_root == self.income {
            Some(AccountType::Income)
        } else if account_root == self.expenses {
            Some(AccountType::Expenses)
        } else {
            None
        }
    }

    /// Check if an account belongs to the income statement
    /// (income or expenses).
    #[must_use]
    pub fn is_income_statement(&self, account: &str) -> bool {
        matches!(
            self.classify(account),
            Some(AccountType::Income | AccountType::Expenses)
        )
    }

    /// Check if an account belongs to the balance sheet
    /// (assets, liabilities, or equity).
    #[must_use]
    pub fn is_balance_sheet(&self, account: &str) -> bool {
        matches!(
            self.classify(account),
            Some(AccountType::Assets | AccountType::Liabilities | AccountType::Equity)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent() {
        assert_eq!(parent("Assets:Bank:Checking"), Some("Assets:Bank"));
        assert_eq!(parent("Assets:Bank"), Some("Assets"));
        assert_eq!(parent("Assets"), None);
    }

    #[test]
    fn test_leaf() {
        assert_eq!(leaf("Assets:Bank:Checking"), "Checking");
        assert_eq!(leaf("Assets"), "Assets");
    }

    #[test]
    fn test_root() {
        assert_eq!(root("Assets:Bank:Checking"), "Assets");
        assert_eq!(root("Assets"), "Assets");
    }

    #[test]
    fn test_components() {
        let parts: Vec<&str> = components("Expenses:Food:Restaurant").collect();
        assert_eq!(parts, vec!["Expenses", "Food", "Restaurant"]);
    }

    #[test]
    fn test_classify() {
        let types = AccountTypes::default();
        assert_eq!(
            types.classify("Assets:Bank:Checking"),
            Some(AccountType::Assets)
        );
        assert_eq!(
            types.classify("Liabilities:CreditCard"),
            Some(AccountType::Liabilities)
        );
        assert_eq!(
            types.classify("Equity:Opening-Balances"),
            Some(AccountType::Equity)
        );
        assert_eq!(types.classify("Income:Salary"), Some(AccountType::Income));
        assert_eq!(
            types.classify("Expenses:Restaurant"),
            Some(AccountType::Expenses)
        );
        assert_eq!(types.classify("Unknown:Account"), None);
    }

    #[test]
    fn test_classify_renamed_roots() {
        let types = AccountTypes {
            assets: "Actif".to_string(),
            liabilities: "Passif".to_string(),
            equity: "Capital".to_string(),
            income: "Revenus".to_string(),
            expenses: "Depenses".to_string(),
        };
        assert_eq!(types.classify("Actif:Banque"), Some(AccountType::Assets));
        assert_eq!(types.classify("Assets:Bank"), None);
    }

    #[test]
    fn test_income_statement() {
        let types = AccountTypes::default();
        assert!(types.is_income_statement("Income:Salary"));
        assert!(types.is_income_statement("Expenses:Restaurant"));
        assert!(!types.is_income_statement("Assets:Bank:Checking"));
        assert!(!types.is_income_statement("Equity:Earnings:Current"));
    }

    #[test]
    fn test_balance_sheet() {
        let types = AccountTypes::default();
        assert!(types.is_balance_sheet("Assets:Bank:Checking"));
        assert!(types.is_balance_sheet("Equity:Opening-Balances"));
        assert!(!types.is_balance_sheet("Expenses:Restaurant"));
    }
}
