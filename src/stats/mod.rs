//! The balance-derivation core: pure computations over aggregate snapshots
//! handed in by the storage layer.

pub mod balance;
pub mod category;

pub use balance::{compute_balance, BalanceReport, MonthSnapshot};
pub use category::category_totals;
