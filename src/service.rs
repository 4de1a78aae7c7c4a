use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{Category, Expense, ExpenseChanges, MonthlySalary, NewExpense};
use crate::errors::{Result, TrackerError};
use crate::export;
use crate::month::{self, DATE_FORMAT};
use crate::stats::{self, BalanceReport, MonthSnapshot};
use crate::storage::{ExpensePage, ExpenseQuery, ExpenseStore};
use crate::time::Clock;

/// Loose write payloads as they arrive off the wire. Validation and month
/// derivation happen here, above whichever store is configured.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseInput {
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub month: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalaryInput {
    pub month: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
}

/// Orchestrates record writes and dashboard reads over the configured
/// store. Reads snapshot the store's aggregates and hand them to the pure
/// stats core.
pub struct TrackerService {
    store: Arc<dyn ExpenseStore>,
    clock: Arc<dyn Clock>,
}

impl TrackerService {
    pub fn new(store: Arc<dyn ExpenseStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Month key of the current real-world month, the default filter for
    /// dashboard reads.
    pub fn current_month(&self) -> String {
        month::month_key_of(self.clock.today())
    }

    pub fn dashboard(&self, target: Option<&str>) -> Result<BalanceReport> {
        let target = target
            .map(str::to_string)
            .unwrap_or_else(|| self.current_month());
        let snapshot = MonthSnapshot {
            expense_totals: self.store.expense_totals_by_month()?,
            salaries: self.store.all_salaries()?,
        };
        debug!(%target, months = snapshot.known_months().len(), "computing balance");
        Ok(stats::compute_balance(&snapshot, &target, self.clock.as_ref()))
    }

    pub fn category_stats(&self, target: Option<&str>) -> Result<BTreeMap<String, f64>> {
        let target = target
            .map(str::to_string)
            .unwrap_or_else(|| self.current_month());
        let rows = self.store.expense_totals_by_category(&target)?;
        Ok(stats::category_totals(&rows))
    }

    pub fn add_expense(&self, input: ExpenseInput) -> Result<Expense> {
        let item = input
            .item
            .filter(|item| !item.trim().is_empty())
            .ok_or_else(|| TrackerError::Validation("expense item is required".into()))?;
        let amount = validate_amount(input.amount)?
            .ok_or_else(|| TrackerError::Validation("expense amount is required".into()))?;
        let derived =
            month::derive_month_key(input.date.as_deref(), input.month.as_deref(), self.clock.as_ref());
        self.store.insert_expense(NewExpense {
            item,
            amount,
            category: input
                .category
                .or_else(|| Some(crate::domain::GENERAL_CATEGORY.to_string())),
            month: derived.month,
            date: derived.date,
        })
    }

    pub fn update_expense(&self, id: i64, input: ExpenseInput) -> Result<Expense> {
        let mut changes = ExpenseChanges {
            item: input.item,
            amount: validate_amount(input.amount)?,
            category: input.category,
            ..ExpenseChanges::default()
        };
        // A date change re-derives the month; an unparseable date is stored
        // as given and leaves the month alone.
        if let Some(raw) = input.date {
            match month::parse_calendar_date(&raw) {
                Some(parsed) => {
                    changes.date = Some(parsed.format(DATE_FORMAT).to_string());
                    changes.month = Some(month::month_key_of(parsed));
                }
                None => changes.date = Some(raw),
            }
        }
        self.store.update_expense(id, changes)
    }

    pub fn delete_expense(&self, id: i64) -> Result<()> {
        self.store.delete_expense(id)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.store.clear_all()
    }

    pub fn list_expenses(&self, query: &ExpenseQuery) -> Result<ExpensePage> {
        self.store.list_expenses(query)
    }

    pub fn set_salary(&self, input: SalaryInput) -> Result<MonthlySalary> {
        let month = input
            .month
            .map(|month| month.trim().to_string())
            .filter(|month| !month.is_empty())
            .ok_or_else(|| TrackerError::Validation("salary month is required".into()))?;
        let amount = input
            .amount
            .ok_or_else(|| TrackerError::Validation("salary amount is required".into()))?;
        self.store.set_salary(&month, amount)
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        self.store.categories()
    }

    pub fn add_category(&self, input: CategoryInput) -> Result<Category> {
        let name = input
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TrackerError::Validation("category name is required".into()))?;
        self.store.add_category(&name)
    }

    pub fn delete_category(&self, id: i64) -> Result<()> {
        self.store.delete_category(id)
    }

    /// Renders the spreadsheet download for an optional month filter,
    /// returning the suggested file name and the bytes.
    pub fn export(&self, month: Option<&str>) -> Result<(String, Vec<u8>)> {
        let rows = self.store.expenses_for_export(month)?;
        let bytes = export::render_csv(&rows)?;
        Ok((export::export_file_name(month), bytes))
    }
}

fn validate_amount(amount: Option<f64>) -> Result<Option<f64>> {
    match amount {
        Some(value) if !value.is_finite() || value < 0.0 => Err(TrackerError::Validation(
            "expense amount must be a non-negative number".into(),
        )),
        other => Ok(other),
    }
}
