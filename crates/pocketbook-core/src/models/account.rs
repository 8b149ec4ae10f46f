use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "accountType")]
    pub account_type: String,
    pub balance: f64,
    pub currency: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountCreateRequest {
    pub name: String,
    #[serde(rename = "accountType")]
    pub account_type: String,
    pub balance: f64,
    pub currency: String,
}
