pub mod json_backend;
pub mod sqlite_backend;

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{Category, Expense, ExpenseChanges, MonthlySalary, NewExpense};
use crate::errors::Result;

pub use json_backend::JsonStore;
pub use sqlite_backend::SqliteStore;

/// Listing filter handed to the store by the HTTP facade. `page` is
/// 1-based; a category of "All" means no category filter.
#[derive(Debug, Clone)]
pub struct ExpenseQuery {
    pub month: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: usize,
    pub limit: usize,
}

impl Default for ExpenseQuery {
    fn default() -> Self {
        Self {
            month: None,
            search: None,
            category: None,
            page: 1,
            limit: 50,
        }
    }
}

impl ExpenseQuery {
    /// True when `candidate` should be filtered out rather than listed.
    pub fn excludes(&self, expense: &Expense) -> bool {
        if let Some(month) = &self.month {
            if &expense.month != month {
                return true;
            }
        }
        if let Some(search) = &self.search {
            if !expense
                .item
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return true;
            }
        }
        if let Some(category) = &self.category {
            if category != "All" && expense.category.as_deref() != Some(category.as_str()) {
                return true;
            }
        }
        false
    }
}

/// One page of expenses ordered by date descending, then id descending.
#[derive(Debug, Clone, Serialize)]
pub struct ExpensePage {
    pub items: Vec<Expense>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
    pub has_next: bool,
}

impl ExpensePage {
    /// Builds the page envelope; `limit` is clamped to at least 1.
    pub fn new(items: Vec<Expense>, total: usize, page: usize, limit: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let pages = total.div_ceil(limit);
        Self {
            has_next: page < pages,
            items,
            total,
            page,
            pages,
        }
    }
}

/// Abstraction over persistence backends holding expenses, monthly salaries
/// and the category taxonomy. Adapters are selected at configuration time
/// and must be interchangeable behind this contract.
pub trait ExpenseStore: Send + Sync {
    fn insert_expense(&self, record: NewExpense) -> Result<Expense>;
    fn update_expense(&self, id: i64, changes: ExpenseChanges) -> Result<Expense>;
    fn delete_expense(&self, id: i64) -> Result<()>;
    /// Wipes all expenses and all salaries; categories survive.
    fn clear_all(&self) -> Result<()>;
    fn list_expenses(&self, query: &ExpenseQuery) -> Result<ExpensePage>;
    fn expenses_for_export(&self, month: Option<&str>) -> Result<Vec<Expense>>;

    /// Upserts the salary for a month.
    fn set_salary(&self, month: &str, amount: f64) -> Result<MonthlySalary>;
    fn salary(&self, month: &str) -> Result<Option<f64>>;
    fn all_salaries(&self) -> Result<HashMap<String, f64>>;

    fn expense_totals_by_month(&self) -> Result<HashMap<String, f64>>;
    fn expense_totals_by_category(&self, month: &str) -> Result<HashMap<Option<String>, f64>>;

    /// Categories ordered by name.
    fn categories(&self) -> Result<Vec<Category>>;
    fn add_category(&self, name: &str) -> Result<Category>;
    fn delete_category(&self, id: i64) -> Result<()>;
    /// Seeds the default taxonomy, only when no categories exist yet.
    fn seed_default_categories(&self) -> Result<()>;
}
