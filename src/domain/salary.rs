use serde::{Deserialize, Serialize};

/// Salary figure set for one month. At most one record exists per month
/// key; setting it again overwrites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySalary {
    pub month: String,
    pub salary: f64,
}
