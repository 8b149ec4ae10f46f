use serde::{Deserialize, Serialize};

/// A per-category monthly budget. `spent` and `percentage` are computed
/// server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
    #[serde(rename = "categoryName")]
    pub category_name: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
    pub spent: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetCreateRequest {
    #[serde(rename = "categoryId")]
    pub category_id: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
}
