//! Backends module - Filesystem access
//!
//! Provides:
//! - resolve: Allowed-root path resolution and directory browsing
//! - scan: File scanning with walkdir

pub mod resolve;
pub mod scan;
