//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the SnapshotStore and SecureStore ports
//! - In-memory maps for both stores (tests, ephemeral sessions)
//! - Biometric stand-ins for devices without hardware, and scripted outcomes
//! - A filesystem lock guarding the data directory

pub mod biometric;
pub mod dir_lock;
pub mod duckdb;
pub mod memory;
