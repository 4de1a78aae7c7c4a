use serde::{Deserialize, Serialize};

/// Spending category taxonomy entry. Names are unique and trimmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Bucket uncategorized expenses are attributed to.
pub const GENERAL_CATEGORY: &str = "General";

/// Fixed set seeded at first startup when the category table is empty.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    GENERAL_CATEGORY,
    "Food & Dining",
    "Groceries",
    "Transportation",
    "Utilities",
    "Entertainment",
    "Health",
    "Shopping",
    "Other",
];
