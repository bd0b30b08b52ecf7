//! repo-health - repository health scoring
//!
//! Scores a repository on six independent dimensions (code quality, test
//! coverage, security, performance, maintenance, documentation), combines
//! them into a weighted overall score and status, and renders the result
//! for humans, machines or pull requests.
//!
//! The flow of one run:
//!
//! ```text
//! config::load_config ─▶ probes::FileInventory ─▶ assessors (parallel)
//!                                                      │
//!                       reporters ◀── scoring::aggregate
//! ```

pub mod assessors;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod probes;
pub mod reporters;
pub mod scanners;
pub mod scoring;
