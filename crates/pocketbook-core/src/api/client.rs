//! Typed client for the Pocketbook REST API.
//!
//! Every request goes through the `AuthPipeline`, which attaches the
//! current access token and transparently refreshes it on a 401.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::auth::{AuthPipeline, SessionStore};
use crate::models::{
    Account, AccountCreateRequest, AddMemberRequest, AuthResponse, Budget, BudgetCreateRequest,
    Category, CategoryBreakdown, CategoryCreateRequest, CategoryType, ChangePasswordRequest,
    DashboardSummary, Debt, DebtCreateRequest, Expense, ExpenseCreateRequest, ExpenseFilters,
    ExpenseUpdateRequest, Goal, GoalCreateRequest, Household, HouseholdCreateRequest, Income,
    IncomeCreateRequest, IncomeFilters, IncomeUpdateRequest, Insights, LoginRequest, MonthlyTrend,
    Page, RecurringTransaction, RecurringTransactionCreateRequest, RegisterRequest, TaxReport,
    UpdateProfileRequest, User,
};

use super::transport::{ApiRequest, HttpTransport, Transport};
use super::ApiError;

pub struct ApiClient {
    pipeline: AuthPipeline,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<SessionStore>) -> Self {
        Self {
            pipeline: AuthPipeline::new(transport, store),
        }
    }

    /// Convenience constructor wiring up the production HTTP transport.
    pub fn from_base_url(
        base_url: impl Into<String>,
        store: Arc<SessionStore>,
    ) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(base_url)?;
        Ok(Self::new(Arc::new(transport), store))
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.pipeline.store()
    }

    // ========================================================================
    // Request helpers
    // ========================================================================

    fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let response = self
            .pipeline
            .send(ApiRequest::get(path).with_query(query))
            .await?;
        response.json()
    }

    async fn get_raw(&self, path: &str, query: Vec<(String, String)>) -> Result<String, ApiError> {
        let response = self
            .pipeline
            .send(ApiRequest::get(path).with_query(query))
            .await?;
        Ok(response.body)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .pipeline
            .send(ApiRequest::post(path).with_body(Self::encode(body)?))
            .await?;
        response.json()
    }

    async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.pipeline
            .send(ApiRequest::post(path).with_body(Self::encode(body)?))
            .await?;
        Ok(())
    }

    async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.pipeline.send(ApiRequest::post(path)).await?;
        Ok(())
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .pipeline
            .send(ApiRequest::put(path).with_body(Self::encode(body)?))
            .await?;
        response.json()
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.pipeline.send(ApiRequest::delete(path)).await?;
        Ok(())
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Sign in. Stores the access token first so the profile fetch is
    /// authenticated, then establishes the full session.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, ApiError> {
        let auth: AuthResponse = self.post("/auth/login", request).await?;
        self.store().set_access_token(auth.token.clone());
        let user: User = self.get("/auth/me", Vec::new()).await?;
        self.store()
            .set_auth(user.clone(), auth.token, auth.refresh_token);
        Ok(user)
    }

    /// Create an account and sign in with the returned tokens.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let auth: AuthResponse = self.post("/auth/register", request).await?;
        self.store().set_access_token(auth.token.clone());
        let user: User = self.get("/auth/me", Vec::new()).await?;
        self.store()
            .set_auth(user.clone(), auth.token, auth.refresh_token);
        Ok(user)
    }

    /// Tell the server to invalidate the session. The local session is
    /// cleared by the caller regardless of whether this call succeeds.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.post_empty("/auth/logout").await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("/auth/me", Vec::new()).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ApiError> {
        self.post_no_content("/auth/change-password", request).await
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<User, ApiError> {
        let user: User = self.put("/auth/profile", request).await?;
        self.store().set_user(user.clone());
        Ok(user)
    }

    // ========================================================================
    // Expenses
    // ========================================================================

    pub async fn create_expense(&self, request: &ExpenseCreateRequest) -> Result<Expense, ApiError> {
        self.post("/expenses", request).await
    }

    pub async fn expenses(&self, filters: &ExpenseFilters) -> Result<Page<Expense>, ApiError> {
        self.get("/expenses", filters.to_query()).await
    }

    pub async fn expense(&self, id: &str) -> Result<Expense, ApiError> {
        self.get(&format!("/expenses/{}", id), Vec::new()).await
    }

    pub async fn update_expense(
        &self,
        id: &str,
        request: &ExpenseUpdateRequest,
    ) -> Result<Expense, ApiError> {
        self.put(&format!("/expenses/{}", id), request).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/expenses/{}", id)).await
    }

    pub async fn bulk_delete_expenses(&self, ids: &[String]) -> Result<(), ApiError> {
        self.post_no_content("/expenses/bulk-delete", &ids).await
    }

    // ========================================================================
    // Incomes
    // ========================================================================

    pub async fn create_income(&self, request: &IncomeCreateRequest) -> Result<Income, ApiError> {
        self.post("/incomes", request).await
    }

    pub async fn incomes(&self, filters: &IncomeFilters) -> Result<Page<Income>, ApiError> {
        self.get("/incomes", filters.to_query()).await
    }

    /// Total income for the given month.
    pub async fn income_summary(&self, month: u32, year: i32) -> Result<f64, ApiError> {
        self.get("/incomes/summary", month_year_query(month, year))
            .await
    }

    pub async fn income(&self, id: &str) -> Result<Income, ApiError> {
        self.get(&format!("/incomes/{}", id), Vec::new()).await
    }

    pub async fn update_income(
        &self,
        id: &str,
        request: &IncomeUpdateRequest,
    ) -> Result<Income, ApiError> {
        self.put(&format!("/incomes/{}", id), request).await
    }

    pub async fn delete_income(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/incomes/{}", id)).await
    }

    pub async fn bulk_delete_incomes(&self, ids: &[String]) -> Result<(), ApiError> {
        self.post_no_content("/incomes/bulk-delete", &ids).await
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub async fn categories(
        &self,
        category_type: Option<CategoryType>,
    ) -> Result<Vec<Category>, ApiError> {
        let query = match category_type {
            Some(t) => vec![("type".to_string(), t.as_str().to_string())],
            None => Vec::new(),
        };
        self.get("/categories", query).await
    }

    pub async fn create_category(
        &self,
        request: &CategoryCreateRequest,
    ) -> Result<Category, ApiError> {
        self.post("/categories", request).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        request: &CategoryCreateRequest,
    ) -> Result<Category, ApiError> {
        self.put(&format!("/categories/{}", id), request).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/categories/{}", id)).await
    }

    // ========================================================================
    // Budgets
    // ========================================================================

    pub async fn budgets(&self, month: u32, year: i32) -> Result<Vec<Budget>, ApiError> {
        self.get("/budgets", month_year_query(month, year)).await
    }

    pub async fn budget_history(&self, category_id: &str) -> Result<Vec<Budget>, ApiError> {
        let query = vec![("categoryId".to_string(), category_id.to_string())];
        self.get("/budgets/history", query).await
    }

    pub async fn create_budget(&self, request: &BudgetCreateRequest) -> Result<Budget, ApiError> {
        self.post("/budgets", request).await
    }

    pub async fn update_budget(
        &self,
        id: &str,
        request: &BudgetCreateRequest,
    ) -> Result<Budget, ApiError> {
        self.put(&format!("/budgets/{}", id), request).await
    }

    pub async fn delete_budget(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/budgets/{}", id)).await
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.get("/accounts", Vec::new()).await
    }

    pub async fn active_accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.get("/accounts/active", Vec::new()).await
    }

    pub async fn account(&self, id: &str) -> Result<Account, ApiError> {
        self.get(&format!("/accounts/{}", id), Vec::new()).await
    }

    pub async fn create_account(&self, request: &AccountCreateRequest) -> Result<Account, ApiError> {
        self.post("/accounts", request).await
    }

    pub async fn update_account(
        &self,
        id: &str,
        request: &AccountCreateRequest,
    ) -> Result<Account, ApiError> {
        self.put(&format!("/accounts/{}", id), request).await
    }

    pub async fn delete_account(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/accounts/{}", id)).await
    }

    // ========================================================================
    // Goals
    // ========================================================================

    pub async fn goals(&self) -> Result<Vec<Goal>, ApiError> {
        self.get("/goals", Vec::new()).await
    }

    pub async fn active_goals(&self) -> Result<Vec<Goal>, ApiError> {
        self.get("/goals/active", Vec::new()).await
    }

    pub async fn completed_goals(&self) -> Result<Vec<Goal>, ApiError> {
        self.get("/goals/completed", Vec::new()).await
    }

    pub async fn goal(&self, id: &str) -> Result<Goal, ApiError> {
        self.get(&format!("/goals/{}", id), Vec::new()).await
    }

    pub async fn create_goal(&self, request: &GoalCreateRequest) -> Result<Goal, ApiError> {
        self.post("/goals", request).await
    }

    pub async fn update_goal(
        &self,
        id: &str,
        request: &GoalCreateRequest,
    ) -> Result<Goal, ApiError> {
        self.put(&format!("/goals/{}", id), request).await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/goals/{}", id)).await
    }

    // ========================================================================
    // Debts
    // ========================================================================

    pub async fn debts(&self) -> Result<Vec<Debt>, ApiError> {
        self.get("/debts", Vec::new()).await
    }

    pub async fn active_debts(&self) -> Result<Vec<Debt>, ApiError> {
        self.get("/debts/active", Vec::new()).await
    }

    pub async fn debt(&self, id: &str) -> Result<Debt, ApiError> {
        self.get(&format!("/debts/{}", id), Vec::new()).await
    }

    pub async fn create_debt(&self, request: &DebtCreateRequest) -> Result<Debt, ApiError> {
        self.post("/debts", request).await
    }

    pub async fn update_debt(
        &self,
        id: &str,
        request: &DebtCreateRequest,
    ) -> Result<Debt, ApiError> {
        self.put(&format!("/debts/{}", id), request).await
    }

    pub async fn delete_debt(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/debts/{}", id)).await
    }

    // ========================================================================
    // Recurring transactions
    // ========================================================================

    pub async fn recurring_transactions(&self) -> Result<Vec<RecurringTransaction>, ApiError> {
        self.get("/recurring-transactions", Vec::new()).await
    }

    pub async fn create_recurring_transaction(
        &self,
        request: &RecurringTransactionCreateRequest,
    ) -> Result<RecurringTransaction, ApiError> {
        self.post("/recurring-transactions", request).await
    }

    pub async fn update_recurring_transaction(
        &self,
        id: &str,
        request: &RecurringTransactionCreateRequest,
    ) -> Result<RecurringTransaction, ApiError> {
        self.put(&format!("/recurring-transactions/{}", id), request)
            .await
    }

    pub async fn delete_recurring_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/recurring-transactions/{}", id)).await
    }

    // ========================================================================
    // Households
    // ========================================================================

    pub async fn households(&self) -> Result<Vec<Household>, ApiError> {
        self.get("/households", Vec::new()).await
    }

    pub async fn household(&self, id: &str) -> Result<Household, ApiError> {
        self.get(&format!("/households/{}", id), Vec::new()).await
    }

    pub async fn create_household(
        &self,
        request: &HouseholdCreateRequest,
    ) -> Result<Household, ApiError> {
        self.post("/households", request).await
    }

    pub async fn update_household(
        &self,
        id: &str,
        request: &HouseholdCreateRequest,
    ) -> Result<Household, ApiError> {
        self.put(&format!("/households/{}", id), request).await
    }

    pub async fn delete_household(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/households/{}", id)).await
    }

    pub async fn add_household_member(
        &self,
        household_id: &str,
        request: &AddMemberRequest,
    ) -> Result<(), ApiError> {
        self.post_no_content(&format!("/households/{}/members", household_id), request)
            .await
    }

    pub async fn remove_household_member(
        &self,
        household_id: &str,
        member_id: &str,
    ) -> Result<(), ApiError> {
        self.delete(&format!("/households/{}/members/{}", household_id, member_id))
            .await
    }

    // ========================================================================
    // Dashboard, insights, and reports
    // ========================================================================

    pub async fn dashboard_summary(
        &self,
        month: u32,
        year: i32,
    ) -> Result<DashboardSummary, ApiError> {
        self.get("/dashboard/summary", month_year_query(month, year))
            .await
    }

    pub async fn category_breakdown(
        &self,
        month: u32,
        year: i32,
    ) -> Result<Vec<CategoryBreakdown>, ApiError> {
        self.get("/dashboard/category-breakdown", month_year_query(month, year))
            .await
    }

    pub async fn monthly_trend(&self, year: i32) -> Result<Vec<MonthlyTrend>, ApiError> {
        let query = vec![("year".to_string(), year.to_string())];
        self.get("/dashboard/monthly-trend", query).await
    }

    /// Name of the category with the highest spend this month, as plain
    /// text.
    pub async fn top_spending_category(&self, month: u32, year: i32) -> Result<String, ApiError> {
        self.get_raw("/dashboard/top-spending-category", month_year_query(month, year))
            .await
    }

    pub async fn insights(&self, month: u32, year: i32) -> Result<Insights, ApiError> {
        self.get("/insights", month_year_query(month, year)).await
    }

    /// Expense export as CSV text.
    pub async fn export_expenses_csv(
        &self,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<String, ApiError> {
        self.get_raw("/reports/expenses/csv", optional_month_year_query(month, year))
            .await
    }

    /// Income export as CSV text.
    pub async fn export_income_csv(
        &self,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<String, ApiError> {
        self.get_raw("/reports/income/csv", optional_month_year_query(month, year))
            .await
    }

    pub async fn monthly_summary_report(&self, month: u32, year: i32) -> Result<String, ApiError> {
        self.get_raw("/reports/monthly-summary", month_year_query(month, year))
            .await
    }

    // ========================================================================
    // Tax
    // ========================================================================

    pub async fn annual_tax_report(&self, year: i32) -> Result<Vec<TaxReport>, ApiError> {
        self.get(&format!("/tax/report/{}", year), Vec::new()).await
    }

    pub async fn quarterly_tax_report(
        &self,
        year: i32,
        quarter: u32,
    ) -> Result<Vec<TaxReport>, ApiError> {
        self.get(&format!("/tax/report/{}/quarter/{}", year, quarter), Vec::new())
            .await
    }
}

fn month_year_query(month: u32, year: i32) -> Vec<(String, String)> {
    vec![
        ("month".to_string(), month.to_string()),
        ("year".to_string(), year.to_string()),
    ]
}

fn optional_month_year_query(month: Option<u32>, year: Option<i32>) -> Vec<(String, String)> {
    let mut query = Vec::new();
    if let Some(month) = month {
        query.push(("month".to_string(), month.to_string()));
    }
    if let Some(year) = year {
        query.push(("year".to_string(), year.to_string()));
    }
    query
}
