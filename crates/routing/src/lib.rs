//! Multi-hop route discovery, quoting and selection.
//!
//! This crate builds on the pool math in `amm-router-domain`:
//! - Candidate pair generation and bounded route search
//! - Per-route quoting across v1 and v2 pools
//! - Best-route selection and the trade state machine
//! - An async service that fetches snapshots and fans quoting out per route

/// Prelude module for convenient imports.
pub mod prelude;

/// Router configuration.
pub mod config;
/// Routing errors.
pub mod error;
/// Asset graph and route search.
pub mod graph;
/// Route quoting.
pub mod quoter;
/// Best-route selection and trade state.
pub mod selector;
/// Async router service.
pub mod service;
/// Reserve snapshots and their sources.
pub mod snapshot;
