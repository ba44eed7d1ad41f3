use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::Result;

/// The kind of money flow a category represents.
///
/// The discriminants are the primary keys of the `categoryTypes` table and must not change.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Income = 1,
    #[default]
    Expense = 2,
    Credit = 3,
    Savings = 4,
}

serde_plain::derive_display_from_serialize!(CategoryType);
serde_plain::derive_fromstr_from_deserialize!(CategoryType);

impl CategoryType {
    /// All types in code order.
    pub const ALL: [CategoryType; 4] = [
        CategoryType::Income,
        CategoryType::Expense,
        CategoryType::Credit,
        CategoryType::Savings,
    ];

    /// The `categoryTypes.id` code.
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(CategoryType::Income),
            2 => Ok(CategoryType::Expense),
            3 => Ok(CategoryType::Credit),
            4 => Ok(CategoryType::Savings),
            bad => bail!("Invalid category type code {bad}"),
        }
    }

    /// The description seeded into `categoryTypes`.
    pub fn name(self) -> &'static str {
        match self {
            CategoryType::Income => "Income",
            CategoryType::Expense => "Expense",
            CategoryType::Credit => "Credit",
            CategoryType::Savings => "Savings",
        }
    }
}

/// A spending category as read from the store.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    id: i64,
    description: String,
    #[serde(rename = "type")]
    category_type: CategoryType,
}

impl Category {
    pub fn new(id: i64, description: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id,
            description: description.into(),
            category_type,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category_type(&self) -> CategoryType {
        self.category_type
    }
}

/// The categories seeded into a brand-new budget, in insertion order.
pub(crate) const DEFAULT_CATEGORIES: [(&str, CategoryType); 16] = [
    ("Utilities", CategoryType::Expense),
    ("Rent", CategoryType::Expense),
    ("Food", CategoryType::Expense),
    ("Entertainment", CategoryType::Expense),
    ("Education", CategoryType::Expense),
    ("Miscellaneous", CategoryType::Expense),
    ("Medical Expenses", CategoryType::Expense),
    ("Vacation", CategoryType::Expense),
    ("Credit Card", CategoryType::Credit),
    ("Clothes", CategoryType::Expense),
    ("Gifts", CategoryType::Expense),
    ("Insurance", CategoryType::Expense),
    ("Transportation", CategoryType::Expense),
    ("Eating Out", CategoryType::Expense),
    ("Savings", CategoryType::Savings),
    ("Income", CategoryType::Income),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_codes_round_trip() {
        for t in CategoryType::ALL {
            assert_eq!(CategoryType::from_code(t.code()).unwrap(), t);
        }
        assert!(CategoryType::from_code(0).is_err());
        assert!(CategoryType::from_code(5).is_err());
    }

    #[test]
    fn test_category_type_strings() {
        assert_eq!(CategoryType::Credit.to_string(), "credit");
        assert_eq!(
            CategoryType::from_str("savings").unwrap(),
            CategoryType::Savings
        );
        assert_eq!(CategoryType::Income.name(), "Income");
    }

    #[test]
    fn test_default_categories() {
        let credit: Vec<_> = DEFAULT_CATEGORIES
            .iter()
            .filter(|(_, t)| *t == CategoryType::Credit)
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(credit, vec!["Credit Card"]);
        assert_eq!(DEFAULT_CATEGORIES[15], ("Income", CategoryType::Income));
        assert_eq!(DEFAULT_CATEGORIES[14], ("Savings", CategoryType::Savings));
    }

    #[test]
    fn test_serialize_category() {
        let c = Category::new(9, "Credit Card", CategoryType::Credit);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(
            json,
            r#"{"id":9,"description":"Credit Card","type":"credit"}"#
        );
    }
}
