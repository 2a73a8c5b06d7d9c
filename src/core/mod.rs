//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Data model (FileRecord, statistics, browse results)
//! - Error taxonomy and runtime configuration
//! - Path classification (hidden, excluded, binary)
//! - Thread-safe statistics accumulation
//! - Rendering functions for different output formats
//! - Token counting for LLM context budgeting

pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod paths;
pub mod render;
pub mod stats;
pub mod tokenizer;
pub mod util;
