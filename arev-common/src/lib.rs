//! # arev Common Library
//!
//! Shared code for the annotation review service and its tooling:
//! - Error type shared by the store and configuration layers
//! - Configuration loading and root folder resolution
//! - Database initialization and the reviewer comment store

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
