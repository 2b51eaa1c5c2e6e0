//! Storage layer for pnc-console
//!
//! Handles the TOML configuration file with its connection profiles.

use crate::error::StorageError;

pub mod config;

type Result<T> = std::result::Result<T, StorageError>;
