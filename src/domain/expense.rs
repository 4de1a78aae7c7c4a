use serde::{Deserialize, Serialize};

/// A single recorded spending entry.
///
/// `month` is the grouping key derived at write time; `date` keeps whatever
/// calendar date the caller supplied, canonicalized when it parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub item: String,
    pub amount: f64,
    pub category: Option<String>,
    pub month: String,
    pub date: Option<String>,
}

/// Fully resolved record handed to the store on insert, before an id exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub item: String,
    pub amount: f64,
    pub category: Option<String>,
    pub month: String,
    pub date: Option<String>,
}

/// Partial update applied to an existing expense. Absent fields keep their
/// stored value; `month` is set only when a date change re-derived it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseChanges {
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub month: Option<String>,
    pub date: Option<String>,
}
