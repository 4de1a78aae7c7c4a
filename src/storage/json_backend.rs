use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

use crate::domain::{Category, Expense, ExpenseChanges, MonthlySalary, NewExpense};
use crate::errors::{Result, TrackerError};

use super::{ExpensePage, ExpenseQuery, ExpenseStore};

const TMP_SUFFIX: &str = "tmp";

/// Document-style adapter: the whole data set lives in one JSON file that
/// is rewritten atomically (tmp file + rename) on every mutation.
pub struct JsonStore {
    path: PathBuf,
    doc: Mutex<StoreDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    next_expense_id: i64,
    #[serde(default)]
    next_category_id: i64,
    #[serde(default)]
    expenses: Vec<Expense>,
    #[serde(default)]
    salaries: Vec<MonthlySalary>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl StoreDocument {
    fn alloc_expense_id(&mut self) -> i64 {
        self.next_expense_id += 1;
        self.next_expense_id
    }

    fn alloc_category_id(&mut self) -> i64 {
        self.next_category_id += 1;
        self.next_category_id
    }
}

impl JsonStore {
    /// Opens the document at `path`, starting empty when it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            StoreDocument::default()
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreDocument>> {
        self.doc
            .lock()
            .map_err(|_| TrackerError::Storage("store document lock poisoned".into()))
    }

    fn persist(&self, doc: &StoreDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ExpenseStore for JsonStore {
    fn insert_expense(&self, record: NewExpense) -> Result<Expense> {
        let mut doc = self.lock()?;
        let expense = Expense {
            id: doc.alloc_expense_id(),
            item: record.item,
            amount: record.amount,
            category: record.category,
            month: record.month,
            date: record.date,
        };
        doc.expenses.push(expense.clone());
        self.persist(&doc)?;
        Ok(expense)
    }

    fn update_expense(&self, id: i64, changes: ExpenseChanges) -> Result<Expense> {
        let mut doc = self.lock()?;
        let expense = doc
            .expenses
            .iter_mut()
            .find(|expense| expense.id == id)
            .ok_or_else(|| TrackerError::NotFound(format!("expense {id} not found")))?;
        if let Some(item) = changes.item {
            expense.item = item;
        }
        if let Some(amount) = changes.amount {
            expense.amount = amount;
        }
        if let Some(category) = changes.category {
            expense.category = Some(category);
        }
        if let Some(date) = changes.date {
            expense.date = Some(date);
        }
        if let Some(month) = changes.month {
            expense.month = month;
        }
        let updated = expense.clone();
        self.persist(&doc)?;
        Ok(updated)
    }

    fn delete_expense(&self, id: i64) -> Result<()> {
        let mut doc = self.lock()?;
        let before = doc.expenses.len();
        doc.expenses.retain(|expense| expense.id != id);
        if doc.expenses.len() == before {
            return Err(TrackerError::NotFound(format!("expense {id} not found")));
        }
        self.persist(&doc)
    }

    fn clear_all(&self) -> Result<()> {
        let mut doc = self.lock()?;
        doc.expenses.clear();
        doc.salaries.clear();
        self.persist(&doc)
    }

    fn list_expenses(&self, query: &ExpenseQuery) -> Result<ExpensePage> {
        let doc = self.lock()?;
        let mut matches: Vec<Expense> = doc
            .expenses
            .iter()
            .filter(|expense| !query.excludes(expense))
            .cloned()
            .collect();
        sort_newest_first(&mut matches);
        let total = matches.len();
        let limit = query.limit.max(1);
        let page = query.page.max(1);
        let start = (page - 1).saturating_mul(limit).min(total);
        let end = (start + limit).min(total);
        let items = matches[start..end].to_vec();
        Ok(ExpensePage::new(items, total, page, limit))
    }

    fn expenses_for_export(&self, month: Option<&str>) -> Result<Vec<Expense>> {
        let doc = self.lock()?;
        let mut rows: Vec<Expense> = doc
            .expenses
            .iter()
            .filter(|expense| month.map_or(true, |m| expense.month == m))
            .cloned()
            .collect();
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    fn set_salary(&self, month: &str, amount: f64) -> Result<MonthlySalary> {
        let mut doc = self.lock()?;
        let record = MonthlySalary {
            month: month.to_string(),
            salary: amount,
        };
        match doc.salaries.iter_mut().find(|entry| entry.month == month) {
            Some(existing) => *existing = record.clone(),
            None => doc.salaries.push(record.clone()),
        }
        self.persist(&doc)?;
        Ok(record)
    }

    fn salary(&self, month: &str) -> Result<Option<f64>> {
        let doc = self.lock()?;
        Ok(doc
            .salaries
            .iter()
            .find(|entry| entry.month == month)
            .map(|entry| entry.salary))
    }

    fn all_salaries(&self) -> Result<HashMap<String, f64>> {
        let doc = self.lock()?;
        Ok(doc
            .salaries
            .iter()
            .map(|entry| (entry.month.clone(), entry.salary))
            .collect())
    }

    fn expense_totals_by_month(&self) -> Result<HashMap<String, f64>> {
        let doc = self.lock()?;
        let mut totals = HashMap::new();
        for expense in &doc.expenses {
            *totals.entry(expense.month.clone()).or_insert(0.0) += expense.amount;
        }
        Ok(totals)
    }

    fn expense_totals_by_category(&self, month: &str) -> Result<HashMap<Option<String>, f64>> {
        let doc = self.lock()?;
        let mut totals = HashMap::new();
        for expense in doc.expenses.iter().filter(|e| e.month == month) {
            *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
        }
        Ok(totals)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        let doc = self.lock()?;
        let mut categories = doc.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    fn add_category(&self, name: &str) -> Result<Category> {
        let mut doc = self.lock()?;
        if doc.categories.iter().any(|category| category.name == name) {
            return Err(TrackerError::Validation(format!(
                "category `{name}` already exists"
            )));
        }
        let category = Category {
            id: doc.alloc_category_id(),
            name: name.to_string(),
        };
        doc.categories.push(category.clone());
        self.persist(&doc)?;
        Ok(category)
    }

    fn delete_category(&self, id: i64) -> Result<()> {
        let mut doc = self.lock()?;
        let before = doc.categories.len();
        doc.categories.retain(|category| category.id != id);
        if doc.categories.len() == before {
            return Err(TrackerError::NotFound(format!("category {id} not found")));
        }
        self.persist(&doc)
    }

    fn seed_default_categories(&self) -> Result<()> {
        let mut doc = self.lock()?;
        if !doc.categories.is_empty() {
            return Ok(());
        }
        for name in crate::domain::DEFAULT_CATEGORIES {
            let id = doc.alloc_category_id();
            doc.categories.push(Category {
                id,
                name: name.to_string(),
            });
        }
        self.persist(&doc)
    }
}

/// Date descending with missing dates last, ties broken by id descending.
/// Matches the relational adapter's `ORDER BY date DESC, id DESC`.
fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
