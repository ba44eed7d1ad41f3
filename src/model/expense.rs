use crate::model::Amount;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A dated expense (or income, when the amount is positive) as read from the store.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Expense {
    id: i64,
    date: NaiveDateTime,
    category_id: i64,
    amount: Amount,
    description: String,
}

impl Expense {
    pub fn new(
        id: i64,
        date: NaiveDateTime,
        category_id: i64,
        amount: Amount,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date,
            category_id,
            amount,
            description: description.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
