//! Utils module - Shared utilities and helpers
//!
//! Helpers used across layers: logging setup, retrying API calls,
//! width-aware text handling and input validation.

/// Logger initialisation and verbose output
pub mod logging;

/// Exponential backoff around fallible API calls
pub mod retry;

/// Unicode-aware truncation and padding
pub mod text;

/// Input validation utilities
pub mod validation;
