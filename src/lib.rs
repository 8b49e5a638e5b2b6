//! Student Placement Service
//!
//! Grade/section transfer, transfer to another school, promotion and
//! graduation of students, with an append-only history per student and
//! linearizable per-student writes.
//!
//! # Modules
//!
//! - [`placement`] - Core: validator, concurrency guard, executors, store, batch, audit
//! - [`gateway`] - Axum HTTP API with OpenAPI docs
//! - [`auth`] - JWT caller identity and role checks
//! - [`db`] - PostgreSQL connection pool
//! - [`config`] - YAML configuration and seed loading
//! - [`logging`] - tracing subscriber setup

pub mod auth;
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod placement;

// Convenient re-exports at crate root
pub use placement::{
    PlacementError, PlacementService, Student, StudentId, StudentStatus, StudentStore,
};
