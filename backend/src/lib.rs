//! # Store Uptime Backend
//!
//! Estimates, per store, how many minutes it was up and down during business
//! hours over the last hour, day and week, from sparse status polls.
//!
//! ## Features
//!
//! - **Configuration Resolution**: Store timezone and weekly business hours with defaults
//! - **Business Windows**: Local opening hours translated to UTC, DST aware
//! - **Interval Integration**: Step-function integration of irregular polls
//! - **Report Aggregation**: Concurrent per-store computation with failure isolation
//! - **Job Registry**: Background report jobs with explicit lifecycle and TTL reaping
//!
//! ## Architecture
//!
//! - [`api`]: Data types shared with the storage collaborator and report consumers
//! - [`models`]: Time windows and id helpers
//! - [`db`]: Repository trait and the in-memory repository
//! - [`services`]: Resolver, translator, integrator, aggregator and job handling
//! - [`config`]: TOML/env configuration

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
