//! Core library for the Pocketbook personal-finance client.
//!
//! Provides the authenticated REST client, session lifecycle management
//! (durable tokens, transparent refresh, startup restore), route-level
//! access decisions, and the wire data models.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
