pub mod category;
pub mod expense;
pub mod salary;

pub use category::{Category, DEFAULT_CATEGORIES, GENERAL_CATEGORY};
pub use expense::{Expense, ExpenseChanges, NewExpense};
pub use salary::MonthlySalary;
