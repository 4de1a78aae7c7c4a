//! End-to-end walk over the service layer: records flow in through the
//! write path and come back out through the dashboard and export reads.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use expense_core::service::{ExpenseInput, SalaryInput, TrackerService};
use expense_core::storage::{ExpenseQuery, JsonStore, SqliteStore};
use expense_core::time::Clock;
use tempfile::TempDir;

/// Clock pinned to Mar 10 2025 so month defaults are stable.
struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(
            NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            Utc,
        )
    }
}

fn expense(item: &str, amount: f64, month: &str) -> ExpenseInput {
    ExpenseInput {
        item: Some(item.to_string()),
        amount: Some(amount),
        month: Some(month.to_string()),
        ..ExpenseInput::default()
    }
}

fn salary(month: &str, amount: f64) -> SalaryInput {
    SalaryInput {
        month: Some(month.to_string()),
        amount: Some(amount),
    }
}

fn seed_scenario(service: &TrackerService) {
    service
        .add_expense(expense("rent", 100.0, "Jan 2025"))
        .expect("add expense");
    service
        .add_expense(expense("food", 50.0, "Feb 2025"))
        .expect("add expense");
    service.set_salary(salary("Jan 2025", 1000.0)).expect("set salary");
}

#[test]
fn dashboard_scenario_matches_on_both_backends() {
    let temp = TempDir::new().expect("temp dir");
    let stores: Vec<Arc<dyn expense_core::storage::ExpenseStore>> = vec![
        Arc::new(SqliteStore::open(&temp.path().join("expenses.db")).expect("sqlite")),
        Arc::new(JsonStore::open(temp.path().join("expenses.json")).expect("json")),
    ];

    for store in stores {
        let service = TrackerService::new(store, Arc::new(FixedClock));
        seed_scenario(&service);

        let report = service.dashboard(Some("Feb 2025")).expect("dashboard");
        assert_eq!(report.current_filter, "Feb 2025");
        assert_eq!(report.salary, 0.0);
        assert_eq!(report.previous_balance, 900.0);
        assert_eq!(report.current_expenses, 50.0);
        assert_eq!(report.total_available, 900.0);
        assert_eq!(report.remaining_balance, 850.0);
        assert_eq!(
            report.available_months,
            vec!["Feb 2025".to_string(), "Jan 2025".to_string()]
        );
    }
}

#[test]
fn category_stats_fold_uncategorized_into_general() {
    let service = TrackerService::new(
        Arc::new(SqliteStore::open_in_memory().expect("sqlite")),
        Arc::new(FixedClock),
    );
    service
        .add_expense(ExpenseInput {
            category: Some("Groceries".to_string()),
            ..expense("food", 30.0, "Mar 2025")
        })
        .expect("add expense");
    // No category supplied: the write path defaults it to General.
    service
        .add_expense(expense("misc", 12.0, "Mar 2025"))
        .expect("add expense");

    let totals = service.category_stats(None).expect("category stats");
    assert_eq!(totals.get("Groceries"), Some(&30.0));
    assert_eq!(totals.get("General"), Some(&12.0));
}

#[test]
fn export_includes_only_the_requested_month() {
    let service = TrackerService::new(
        Arc::new(SqliteStore::open_in_memory().expect("sqlite")),
        Arc::new(FixedClock),
    );
    seed_scenario(&service);

    let (file_name, bytes) = service.export(Some("Jan 2025")).expect("export");
    assert_eq!(file_name, "Expenses_Jan_2025.csv");
    let text = String::from_utf8(bytes).expect("utf8 csv");
    assert!(text.contains("rent"));
    assert!(!text.contains("food"));
}

#[test]
fn clear_all_resets_the_dashboard() {
    let service = TrackerService::new(
        Arc::new(SqliteStore::open_in_memory().expect("sqlite")),
        Arc::new(FixedClock),
    );
    seed_scenario(&service);
    service.clear_all().expect("clear");

    let report = service.dashboard(Some("Feb 2025")).expect("dashboard");
    assert_eq!(report.previous_balance, 0.0);
    assert_eq!(report.remaining_balance, 0.0);
    assert!(report.available_months.is_empty());

    let page = service
        .list_expenses(&ExpenseQuery::default())
        .expect("list");
    assert_eq!(page.total, 0);
}
