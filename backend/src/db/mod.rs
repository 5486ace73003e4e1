//! Database module for store status storage.
//!
//! This module provides abstractions for reading the three input tables via the
//! Repository pattern, allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Job layer (services::report_processor, job_tracker)    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services::report) - Business Logic      │
//! │  - Configuration resolution                             │
//! │  - Business-window translation                          │
//! │  - Interval integration                                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! Repositories are constructed by the caller and injected as
//! `Arc<dyn StoreRepository>`; there is no process-wide instance.

pub mod repositories;
pub mod repository;

pub use repositories::{LocalRepository, StoreSnapshot};
pub use repository::{ErrorContext, RepositoryError, RepositoryResult, StoreRepository};
