//! # medalla-cli: Medalla Back Office Command-Line Tool
//!
//! ## Subcommands
//!
//! - `check`: parse and validate a catalog seed file
//! - `seed`: replace the catalog tables in Postgres with a seed file
//!
//! Argument parsing lives in `main.rs`; each subcommand module exposes an
//! `Args` struct and a `run_*` function returning the process exit code.

pub mod catalog;
pub mod check;
pub mod seed;
