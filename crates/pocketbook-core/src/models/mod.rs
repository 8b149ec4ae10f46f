//! Data models for the pocketbook API.
//!
//! This module contains the wire-level data structures exchanged with the
//! REST backend:
//!
//! - `User`, `AuthResponse` and friends: authentication payloads
//! - `Expense`, `Income`, `Category`: transaction records
//! - `Budget`, `Goal`, `Debt`, `Account`: planning records
//! - `Household`: shared-ledger membership
//! - Dashboard types: `DashboardSummary`, `CategoryBreakdown`, `MonthlyTrend`
//! - `Page<T>`: server-side pagination envelope

pub mod account;
pub mod auth;
pub mod budget;
pub mod category;
pub mod dashboard;
pub mod debt;
pub mod expense;
pub mod goal;
pub mod household;
pub mod income;
pub mod page;
pub mod recurring;
pub mod tax;

pub use account::{Account, AccountCreateRequest};
pub use auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, Role,
    UpdateProfileRequest, User,
};
pub use budget::{Budget, BudgetCreateRequest};
pub use category::{Category, CategoryCreateRequest, CategoryType};
pub use dashboard::{CategoryBreakdown, DashboardSummary, Insights, MonthlyTrend};
pub use debt::{Debt, DebtCreateRequest, DebtType};
pub use expense::{Expense, ExpenseCreateRequest, ExpenseFilters, ExpenseUpdateRequest};
pub use goal::{Goal, GoalCreateRequest, GoalStatus};
pub use household::{AddMemberRequest, Household, HouseholdCreateRequest, HouseholdRole};
pub use income::{Income, IncomeCreateRequest, IncomeFilters, IncomeUpdateRequest};
pub use page::{Page, PageRequest};
pub use recurring::{Frequency, RecurringTransaction, RecurringTransactionCreateRequest, TransactionType};
pub use tax::TaxReport;
