use serde::{Deserialize, Serialize};

/// One row of the annual or quarterly tax report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxReport {
    #[serde(rename = "taxCategory")]
    pub tax_category: String,
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
    #[serde(rename = "transactionCount")]
    pub transaction_count: u64,
}
