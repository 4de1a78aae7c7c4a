use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::month::parse_month_key;
use crate::time::Clock;

/// Immutable aggregate snapshot the engine consumes: per-month expense sums
/// and per-month salary figures. Absent months implicitly carry 0.
#[derive(Debug, Clone, Default)]
pub struct MonthSnapshot {
    pub expense_totals: HashMap<String, f64>,
    pub salaries: HashMap<String, f64>,
}

impl MonthSnapshot {
    /// Union of every month key present in either mapping, in a stable
    /// order so the fold is deterministic.
    pub fn known_months(&self) -> BTreeSet<String> {
        self.expense_totals
            .keys()
            .chain(self.salaries.keys())
            .cloned()
            .collect()
    }
}

/// Running financial position for one queried month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BalanceReport {
    pub current_filter: String,
    pub salary: f64,
    pub previous_balance: f64,
    pub current_expenses: f64,
    pub total_available: f64,
    pub remaining_balance: f64,
    pub available_months: Vec<String>,
}

/// Folds every recorded month strictly before the target into a carried
/// balance and derives the position for the target itself.
///
/// Free-text month labels degrade instead of failing: an unparseable target
/// anchors the cutoff at the current date while `current_filter` still
/// echoes the original string, and unparseable keys contribute nothing to
/// the fold yet still appear, last, in `available_months`. That asymmetry
/// is kept on purpose for data recorded under free-text labels.
pub fn compute_balance(
    snapshot: &MonthSnapshot,
    target_month: &str,
    clock: &dyn Clock,
) -> BalanceReport {
    let salary = snapshot.salaries.get(target_month).copied().unwrap_or(0.0);
    let current_expenses = snapshot
        .expense_totals
        .get(target_month)
        .copied()
        .unwrap_or(0.0);

    let anchor = parse_month_key(target_month).unwrap_or_else(|| clock.today());

    let months = snapshot.known_months();
    let mut previous_balance = 0.0;
    for month in &months {
        if let Some(date) = parse_month_key(month) {
            if date < anchor {
                let income = snapshot.salaries.get(month).copied().unwrap_or(0.0);
                let spent = snapshot.expense_totals.get(month).copied().unwrap_or(0.0);
                previous_balance += income - spent;
            }
        }
    }

    let total_available = previous_balance + salary;
    let remaining_balance = total_available - current_expenses;

    let mut available_months: Vec<String> = months.into_iter().collect();
    available_months.sort_by_key(|month| {
        std::cmp::Reverse(parse_month_key(month).unwrap_or(NaiveDate::MIN))
    });

    BalanceReport {
        current_filter: target_month.to_string(),
        salary,
        previous_balance,
        current_expenses,
        total_available,
        remaining_balance,
        available_months,
    }
}
