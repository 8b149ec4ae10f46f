use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(rename = "monthlyIncome")]
    pub monthly_income: f64,
    #[serde(rename = "monthlyExpenses")]
    pub monthly_expenses: f64,
    #[serde(rename = "netSavings")]
    pub net_savings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    #[serde(rename = "categoryName")]
    pub category_name: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: u32,
    pub year: i32,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insights {
    pub insights: Vec<String>,
    #[serde(rename = "financialHealthScore")]
    pub financial_health_score: f64,
}
