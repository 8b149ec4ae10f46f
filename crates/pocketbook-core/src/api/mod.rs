//! REST API client module for the Pocketbook backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! Pocketbook API: expenses, income, budgets, accounts, goals, debts,
//! recurring transactions, households, dashboard, and tax reports.
//!
//! The API uses JWT bearer token authentication; every request flows
//! through the auth pipeline, which attaches the access token and
//! transparently refreshes it on a 401.

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
