use std::collections::{BTreeMap, HashMap};

use crate::domain::GENERAL_CATEGORY;

/// Sums per-category totals for a single month, attributing uncategorized
/// rows to "General".
pub fn category_totals(rows: &HashMap<Option<String>, f64>) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for (category, amount) in rows {
        let name = category.as_deref().unwrap_or(GENERAL_CATEGORY);
        *totals.entry(name.to_string()).or_insert(0.0) += *amount;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncategorized_rows_count_under_general() {
        let mut rows = HashMap::new();
        rows.insert(None, 12.5);
        rows.insert(Some("Groceries".to_string()), 40.0);
        let totals = category_totals(&rows);
        assert_eq!(totals.get("General"), Some(&12.5));
        assert_eq!(totals.get("Groceries"), Some(&40.0));
    }

    #[test]
    fn explicit_general_rows_merge_with_uncategorized() {
        let mut rows = HashMap::new();
        rows.insert(None, 10.0);
        rows.insert(Some("General".to_string()), 5.0);
        let totals = category_totals(&rows);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals.get("General"), Some(&15.0));
    }
}
