//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel.
//! - **security**: bcrypt password hashing.

pub mod persistence;
pub mod security;
