//! Barangay services kernel library.
//!
//! Exposes the listing layer, resource declarations and the HTTP router
//! for integration testing. The server entry point is the `barangay`
//! binary.

pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod models;
pub mod routes;
pub mod state;
