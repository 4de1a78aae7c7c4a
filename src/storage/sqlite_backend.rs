use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Category, Expense, ExpenseChanges, MonthlySalary, NewExpense};
use crate::errors::{Result, TrackerError};

use super::{ExpensePage, ExpenseQuery, ExpenseStore};

/// Relational adapter backed by an embedded SQLite database. Aggregate sums
/// are pushed down into SQL.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (and creates, if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory database, used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT,
                month TEXT NOT NULL,
                date TEXT
            );
            CREATE TABLE IF NOT EXISTS monthly_salary (
                month TEXT PRIMARY KEY,
                salary REAL NOT NULL DEFAULT 0.0
            );
            CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::Storage("sqlite connection lock poisoned".into()))
    }
}

fn map_expense_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        item: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        month: row.get(4)?,
        date: row.get(5)?,
    })
}

fn fetch_expense(conn: &Connection, id: i64) -> Result<Expense> {
    conn.query_row(
        "SELECT id, item, amount, category, month, date FROM expense WHERE id = ?1",
        params![id],
        map_expense_row,
    )
    .optional()?
    .ok_or_else(|| TrackerError::NotFound(format!("expense {id} not found")))
}

impl ExpenseStore for SqliteStore {
    fn insert_expense(&self, record: NewExpense) -> Result<Expense> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expense (item, amount, category, month, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.item,
                record.amount,
                record.category,
                record.month,
                record.date
            ],
        )?;
        fetch_expense(&conn, conn.last_insert_rowid())
    }

    fn update_expense(&self, id: i64, changes: ExpenseChanges) -> Result<Expense> {
        let conn = self.conn()?;
        let mut expense = fetch_expense(&conn, id)?;
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
        conn.execute(
            "UPDATE expense SET item = ?1, amount = ?2, category = ?3, month = ?4, date = ?5
             WHERE id = ?6",
            params![
                expense.item,
                expense.amount,
                expense.category,
                expense.month,
                expense.date,
                id
            ],
        )?;
        Ok(expense)
    }

    fn delete_expense(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM expense WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(TrackerError::NotFound(format!("expense {id} not found")));
        }
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM expense", [])?;
        conn.execute("DELETE FROM monthly_salary", [])?;
        Ok(())
    }

    fn list_expenses(&self, query: &ExpenseQuery) -> Result<ExpensePage> {
        let conn = self.conn()?;
        let category = query.category.as_deref().filter(|c| *c != "All");
        let filters = "(?1 IS NULL OR month = ?1)
             AND (?2 IS NULL OR instr(lower(item), lower(?2)) > 0)
             AND (?3 IS NULL OR category = ?3)";

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM expense WHERE {filters}"),
            params![query.month, query.search, category],
            |row| row.get(0),
        )?;

        let limit = query.limit.max(1) as i64;
        let page = query.page.max(1) as i64;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, item, amount, category, month, date FROM expense
             WHERE {filters}
             ORDER BY date DESC, id DESC
             LIMIT ?4 OFFSET ?5"
        ))?;
        let items = stmt
            .query_map(
                params![query.month, query.search, category, limit, (page - 1) * limit],
                map_expense_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ExpensePage::new(
            items,
            total as usize,
            page as usize,
            limit as usize,
        ))
    }

    fn expenses_for_export(&self, month: Option<&str>) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, item, amount, category, month, date FROM expense
             WHERE (?1 IS NULL OR month = ?1)
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![month], map_expense_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn set_salary(&self, month: &str, amount: f64) -> Result<MonthlySalary> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO monthly_salary (month, salary) VALUES (?1, ?2)
             ON CONFLICT(month) DO UPDATE SET salary = excluded.salary",
            params![month, amount],
        )?;
        Ok(MonthlySalary {
            month: month.to_string(),
            salary: amount,
        })
    }

    fn salary(&self, month: &str) -> Result<Option<f64>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT salary FROM monthly_salary WHERE month = ?1",
                params![month],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn all_salaries(&self) -> Result<HashMap<String, f64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT month, salary FROM monthly_salary")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?;
        let mut salaries = HashMap::new();
        for row in rows {
            let (month, salary) = row?;
            salaries.insert(month, salary);
        }
        Ok(salaries)
    }

    fn expense_totals_by_month(&self) -> Result<HashMap<String, f64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT month, SUM(amount) FROM expense GROUP BY month")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?;
        let mut totals = HashMap::new();
        for row in rows {
            let (month, total) = row?;
            totals.insert(month, total);
        }
        Ok(totals)
    }

    fn expense_totals_by_category(&self, month: &str) -> Result<HashMap<Option<String>, f64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, SUM(amount) FROM expense WHERE month = ?1 GROUP BY category",
        )?;
        let rows = stmt.query_map(params![month], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get(1)?))
        })?;
        let mut totals = HashMap::new();
        for row in rows {
            let (category, total) = row?;
            totals.insert(category, total);
        }
        Ok(totals)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM category ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn add_category(&self, name: &str) -> Result<Category> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM category WHERE name = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        if exists {
            return Err(TrackerError::Validation(format!(
                "category `{name}` already exists"
            )));
        }
        conn.execute("INSERT INTO category (name) VALUES (?1)", params![name])?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn delete_category(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM category WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(TrackerError::NotFound(format!("category {id} not found")));
        }
        Ok(())
    }

    fn seed_default_categories(&self) -> Result<()> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        for name in crate::domain::DEFAULT_CATEGORIES {
            conn.execute("INSERT INTO category (name) VALUES (?1)", params![name])?;
        }
        Ok(())
    }
}
