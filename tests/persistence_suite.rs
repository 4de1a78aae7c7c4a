//! Contract suite run against both storage adapters: whatever backend the
//! configuration selects, the facade must observe the same behavior.

use expense_core::domain::{ExpenseChanges, NewExpense, DEFAULT_CATEGORIES};
use expense_core::errors::TrackerError;
use expense_core::storage::{ExpenseQuery, ExpenseStore, JsonStore, SqliteStore};
use tempfile::TempDir;

fn sample(item: &str, amount: f64, month: &str) -> NewExpense {
    NewExpense {
        item: item.to_string(),
        amount,
        category: Some("General".to_string()),
        month: month.to_string(),
        date: None,
    }
}

fn with_each_store(check: impl Fn(&dyn ExpenseStore)) {
    let temp = TempDir::new().expect("temp dir");
    let sqlite = SqliteStore::open(&temp.path().join("expenses.db")).expect("open sqlite");
    check(&sqlite);
    let json = JsonStore::open(temp.path().join("expenses.json")).expect("open json");
    check(&json);
}

#[test]
fn expense_crud_round_trip() {
    with_each_store(|store| {
        let created = store
            .insert_expense(sample("coffee", 3.5, "Jan 2025"))
            .expect("insert");
        assert!(created.id > 0);

        let updated = store
            .update_expense(
                created.id,
                ExpenseChanges {
                    amount: Some(4.0),
                    ..ExpenseChanges::default()
                },
            )
            .expect("update");
        assert_eq!(updated.amount, 4.0);
        assert_eq!(updated.item, "coffee");

        store.delete_expense(created.id).expect("delete");
        let gone = store.delete_expense(created.id);
        assert!(matches!(gone, Err(TrackerError::NotFound(_))));
    });
}

#[test]
fn updating_a_missing_expense_reports_not_found() {
    with_each_store(|store| {
        let result = store.update_expense(9999, ExpenseChanges::default());
        assert!(matches!(result, Err(TrackerError::NotFound(_))));
    });
}

#[test]
fn listing_filters_and_paginates() {
    with_each_store(|store| {
        for i in 0..12 {
            store
                .insert_expense(sample(&format!("item {i}"), 1.0, "Jan 2025"))
                .expect("insert");
        }
        store
            .insert_expense(sample("other month", 1.0, "Feb 2025"))
            .expect("insert");

        let page = store
            .list_expenses(&ExpenseQuery {
                month: Some("Jan 2025".to_string()),
                page: 2,
                limit: 5,
                ..ExpenseQuery::default()
            })
            .expect("list");
        assert_eq!(page.total, 12);
        assert_eq!(page.pages, 3);
        assert_eq!(page.items.len(), 5);
        assert!(page.has_next);

        let last = store
            .list_expenses(&ExpenseQuery {
                month: Some("Jan 2025".to_string()),
                page: 3,
                limit: 5,
                ..ExpenseQuery::default()
            })
            .expect("list");
        assert_eq!(last.items.len(), 2);
        assert!(!last.has_next);
    });
}

#[test]
fn category_filter_treats_all_as_no_filter() {
    with_each_store(|store| {
        store
            .insert_expense(NewExpense {
                category: Some("Groceries".to_string()),
                ..sample("food", 30.0, "Jan 2025")
            })
            .expect("insert");
        store
            .insert_expense(sample("misc", 5.0, "Jan 2025"))
            .expect("insert");

        let all = store
            .list_expenses(&ExpenseQuery {
                category: Some("All".to_string()),
                ..ExpenseQuery::default()
            })
            .expect("list");
        assert_eq!(all.total, 2);

        let groceries = store
            .list_expenses(&ExpenseQuery {
                category: Some("Groceries".to_string()),
                ..ExpenseQuery::default()
            })
            .expect("list");
        assert_eq!(groceries.total, 1);
        assert_eq!(groceries.items[0].item, "food");
    });
}

#[test]
fn salary_upsert_keeps_one_record_per_month() {
    with_each_store(|store| {
        store.set_salary("Jan 2025", 1000.0).expect("set salary");
        store.set_salary("Jan 2025", 1250.0).expect("overwrite");
        store.set_salary("Feb 2025", 900.0).expect("set salary");

        assert_eq!(store.salary("Jan 2025").expect("read"), Some(1250.0));
        assert_eq!(store.salary("Mar 2025").expect("read"), None);
        let all = store.all_salaries().expect("all salaries");
        assert_eq!(all.len(), 2);
    });
}

#[test]
fn clear_all_wipes_expenses_and_salaries_but_not_categories() {
    with_each_store(|store| {
        store.seed_default_categories().expect("seed");
        store
            .insert_expense(sample("rent", 700.0, "Jan 2025"))
            .expect("insert");
        store.set_salary("Jan 2025", 1000.0).expect("set salary");

        store.clear_all().expect("clear");

        let page = store
            .list_expenses(&ExpenseQuery::default())
            .expect("list");
        assert_eq!(page.total, 0);
        assert!(store.all_salaries().expect("salaries").is_empty());
        assert_eq!(
            store.categories().expect("categories").len(),
            DEFAULT_CATEGORIES.len()
        );
    });
}

#[test]
fn seeding_is_idempotent_and_skips_populated_tables() {
    with_each_store(|store| {
        store.seed_default_categories().expect("seed");
        store.seed_default_categories().expect("seed again");
        assert_eq!(
            store.categories().expect("categories").len(),
            DEFAULT_CATEGORIES.len()
        );
    });
}

#[test]
fn duplicate_category_names_are_rejected() {
    with_each_store(|store| {
        store.add_category("Travel").expect("add");
        let duplicate = store.add_category("Travel");
        assert!(matches!(duplicate, Err(TrackerError::Validation(_))));
    });
}

#[test]
fn categories_list_alphabetically_and_delete_by_id() {
    with_each_store(|store| {
        let zoo = store.add_category("Zoo").expect("add");
        store.add_category("Books").expect("add");

        let names: Vec<String> = store
            .categories()
            .expect("categories")
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert_eq!(names, vec!["Books".to_string(), "Zoo".to_string()]);

        store.delete_category(zoo.id).expect("delete");
        assert!(matches!(
            store.delete_category(zoo.id),
            Err(TrackerError::NotFound(_))
        ));
    });
}

#[test]
fn aggregate_sums_match_across_backends() {
    with_each_store(|store| {
        store
            .insert_expense(sample("rent", 800.0, "Jan 2025"))
            .expect("insert");
        store
            .insert_expense(sample("food", 150.0, "Jan 2025"))
            .expect("insert");
        store
            .insert_expense(NewExpense {
                category: None,
                ..sample("misc", 50.0, "Feb 2025")
            })
            .expect("insert");

        let by_month = store.expense_totals_by_month().expect("totals");
        assert_eq!(by_month.get("Jan 2025"), Some(&950.0));
        assert_eq!(by_month.get("Feb 2025"), Some(&50.0));

        let by_category = store
            .expense_totals_by_category("Feb 2025")
            .expect("category totals");
        assert_eq!(by_category.get(&None), Some(&50.0));
    });
}

#[test]
fn export_rows_honor_the_month_filter() {
    with_each_store(|store| {
        store
            .insert_expense(sample("rent", 800.0, "Jan 2025"))
            .expect("insert");
        store
            .insert_expense(sample("gift", 20.0, "Feb 2025"))
            .expect("insert");

        let all = store.expenses_for_export(None).expect("export all");
        assert_eq!(all.len(), 2);
        let january = store
            .expenses_for_export(Some("Jan 2025"))
            .expect("export month");
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].item, "rent");
    });
}
