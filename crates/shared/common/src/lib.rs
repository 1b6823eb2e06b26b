//! Common utilities shared across the workspace.
//!
//! This crate provides:
//! - The closed error taxonomy and the error normalizer
//! - Configuration structures
//! - Pagination types for list operations

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{normalize, AppError, AppResult, ErrorKind, OptionExt, ResultExt};
pub use pagination::{Page, PageRequest};
