use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtType {
    #[serde(rename = "CREDIT_CARD")]
    CreditCard,
    #[serde(rename = "PERSONAL_LOAN")]
    PersonalLoan,
    #[serde(rename = "AUTO_LOAN")]
    AutoLoan,
    #[serde(rename = "MORTGAGE")]
    Mortgage,
    #[serde(rename = "STUDENT_LOAN")]
    StudentLoan,
    #[serde(rename = "OTHER")]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: String,
    pub name: String,
    #[serde(rename = "debtType")]
    pub debt_type: DebtType,
    #[serde(rename = "principalAmount")]
    pub principal_amount: f64,
    #[serde(rename = "currentBalance")]
    pub current_balance: f64,
    #[serde(rename = "interestRate")]
    pub interest_rate: f64,
    #[serde(rename = "minimumPayment")]
    pub minimum_payment: f64,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "targetPayoffDate")]
    pub target_payoff_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
    #[serde(rename = "accountName", default)]
    pub account_name: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebtCreateRequest {
    pub name: String,
    #[serde(rename = "debtType")]
    pub debt_type: DebtType,
    #[serde(rename = "principalAmount")]
    pub principal_amount: f64,
    #[serde(rename = "currentBalance")]
    pub current_balance: f64,
    #[serde(rename = "interestRate")]
    pub interest_rate: f64,
    #[serde(rename = "minimumPayment")]
    pub minimum_payment: f64,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "targetPayoffDate")]
    pub target_payoff_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "accountId", skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}
