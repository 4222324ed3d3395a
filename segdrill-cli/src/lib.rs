//! CLI interface for segdrill
//!
//! This crate provides the command-line front-end: argument parsing and
//! the `build` / `check-flags` commands.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
