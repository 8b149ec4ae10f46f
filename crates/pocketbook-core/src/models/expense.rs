use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::PageRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub description: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
    #[serde(rename = "categoryName")]
    pub category_name: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "expenseDate")]
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseCreateRequest {
    pub amount: f64,
    pub description: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
    #[serde(rename = "expenseDate")]
    pub expense_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpenseUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "categoryId", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "expenseDate", skip_serializing_if = "Option::is_none")]
    pub expense_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// Server-side filters for the expense list endpoint. Unset fields are
/// omitted from the query string entirely.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilters {
    pub page: PageRequest,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl ExpenseFilters {
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        self.page.push_query(&mut query);
        if let Some(start) = self.start_date {
            query.push(("startDate".to_string(), start.to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("endDate".to_string(), end.to_string()));
        }
        if let Some(ref id) = self.category_id {
            query.push(("categoryId".to_string(), id.clone()));
        }
        if let Some(ref search) = self.search {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(min) = self.min_amount {
            query.push(("minAmount".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_amount {
            query.push(("maxAmount".to_string(), max.to_string()));
        }
        query
    }
}
