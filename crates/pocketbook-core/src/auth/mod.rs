//! Authentication module: session state, token storage, and the request
//! pipeline that keeps the session alive.
//!
//! This module provides:
//! - `SessionStore`: shared session state seeded from durable storage
//! - `TokenStorage`: JSON-file persistence for access/refresh tokens
//! - `AuthPipeline`: bearer attachment plus one-shot 401 refresh-and-retry
//! - `Bootstrapper`: startup validation of a persisted session
//! - `AccessGate`: route-level render/redirect decisions

pub mod bootstrap;
pub mod gate;
pub mod pipeline;
pub mod session;
pub mod storage;

pub use bootstrap::{BootstrapOutcome, Bootstrapper};
pub use gate::{AccessGate, GateDecision, Route, DEFAULT_LANDING};
pub use pipeline::AuthPipeline;
pub use session::{Session, SessionStore};
pub use storage::{StoredTokens, TokenStorage};
