//! Flows module - Operations combining scanning, selection and reading
//!
//! Provides:
//! - select: Re-resolve a caller's selection against a fresh scan
//! - concat: Concurrent, order-preserving concatenation report

pub mod concat;
pub mod select;
