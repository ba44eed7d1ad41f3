//! Types that represent the core data model, such as `Expense`, `Category` and the derived
//! report shapes.
mod amount;
mod budget_item;
mod category;
pub(crate) mod date;
mod expense;

pub use amount::{Amount, AmountError};
pub use budget_item::{
    BudgetItem, CategorySummary, CategoryTotal, MonthPivot, MonthSummary, PivotRow, TOTALS,
};
pub(crate) use category::DEFAULT_CATEGORIES;
pub use category::{Category, CategoryType};
pub use date::{month_key, parse_date};
pub use expense::Expense;
