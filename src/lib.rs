//! A personal budget tracker: spending categories, dated expenses, and reports that list them
//! with a running balance or group them by month, by category or both.
//!
//! Open a budget with [`HomeBudget::open`] and use its [`Categories`] and [`Expenses`] stores to
//! record data and its [`Reports`] engine to read it back.

pub mod args;
mod budget;
pub mod commands;
mod config;
mod db;
mod error;
pub mod model;
pub mod report;
mod utils;


pub use budget::HomeBudget;
pub use config::Config;
pub use db::{Categories, Expenses};
pub use error::{is_not_found, Entity, Error, NoOpReason, NotFound, Outcome, Result};
pub use report::Reports;
