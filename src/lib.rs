//! # Timetable Conflict & Distribution Engine
//!
//! Given a set of scheduled teaching sessions, this crate determines whether
//! the schedule is internally consistent (no faculty/room/division
//! double-booking, no cross-timetable collisions), tracks how scheduled load
//! compares to the planned curricular distribution, and gates a
//! draft -> published workflow on the resolution of blocking conflicts.
//!
//! ## Features
//!
//! - **Session store**: audited CRUD over scheduled sessions with optimistic
//!   concurrency for concurrent editors
//! - **Conflict detection**: typed faculty/division/room/overconsumption and
//!   cross-timetable bridge conflicts, with incremental rescans equivalent to
//!   a full rescan
//! - **Distribution tracking**: planned-versus-scheduled unit reconciliation
//!   per subject and term
//! - **Faculty scheduling**: advisory availability and weekly-load checks
//! - **Publish gate**: draft -> published -> archived state machine, blocked
//!   by unresolved blocking conflicts
//! - **HTTP API**: RESTful endpoints for the editing frontend
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: typed identifiers and the public DTO surface
//! - [`models`]: sessions, slots, conflicts, and the audit trail
//! - [`db`]: repository pattern, error taxonomy, and configuration
//! - [`services`]: the engine components over the repository layer
//! - [`http`]: axum-based HTTP server and request handlers

// Allow large error types - EngineError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
