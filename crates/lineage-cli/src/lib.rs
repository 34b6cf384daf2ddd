//! # lineage-cli
//!
//! Command-line tool for Lineage version graphs.
//!
//! This crate provides:
//! - Relationship editing (add, delete with re-parenting, cleanup)
//! - Archive flags
//! - Integrity diagnostics and per-version inspection
//! - Layout and metric enrichment of exported version lists
//! - Configuration management (`config path|get|set|init|show`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;
pub mod error;

pub use error::{Error, Result};
