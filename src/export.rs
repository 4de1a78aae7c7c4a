//! Spreadsheet download rendering. The original workbook carried an
//! "Expenses" sheet and a placeholder "Summary" sheet; both are flattened
//! into one CSV stream here.

use crate::domain::{Expense, GENERAL_CATEGORY};
use crate::errors::{Result, TrackerError};

/// Suggested download file name for an optional month filter.
pub fn export_file_name(month: Option<&str>) -> String {
    match month {
        Some(month) => format!("Expenses_{}.csv", month.replace(' ', "_")),
        None => "All_Expenses.csv".to_string(),
    }
}

/// Renders the expense rows as CSV: the record table, a blank separator,
/// then the summary placeholder header.
pub fn render_csv(expenses: &[Expense]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["ID", "Date", "Item", "Category", "Amount", "Month"])?;
    for expense in expenses {
        writer.write_record([
            expense.id.to_string(),
            expense.date.clone().unwrap_or_default(),
            expense.item.clone(),
            expense
                .category
                .clone()
                .unwrap_or_else(|| GENERAL_CATEGORY.to_string()),
            expense.amount.to_string(),
            expense.month.clone(),
        ])?;
    }
    writer.write_record(["", "", "", "", "", ""])?;
    writer.write_record(["Summary", "", "", "", "", ""])?;
    writer.write_record(["Metric", "Value", "", "", "", ""])?;
    writer
        .into_inner()
        .map_err(|err| TrackerError::Storage(format!("export buffer error: {err}")))
}
