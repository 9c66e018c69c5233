//! ha-autogen core library.
//!
//! This crate validates LLM-generated Home Assistant automation and Lovelace
//! dashboard YAML, reviews existing configs with deterministic rules plus an
//! optional LLM pass, and classifies findings into quick and guided fixes.
//!
//! High-level modules:
//! - `validate`: Syntax/entity/service/schema pipelines and multi-file runs.
//! - `checks`: Individual validation checks.
//! - `extract`, `cards`: Entity and card walkers over parsed documents.
//! - `rules`: Deterministic automation and dashboard review rules.
//! - `review`: LLM reply parsing, merge/dedup, sorting, and the review engine.
//! - `llm`: The LLM backend capability and a replay backend.
//! - `quickfix`: Classification, fix generation, and batch application.
//! - `scope`: Area and view scoping for targeted reviews.
//! - `models`: Data models for validation, review, fix, and registry data.
//! - `config`, `cli`, `output`, `utils`: Binary plumbing.
pub mod cards;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod output;
pub mod quickfix;
pub mod review;
pub mod rules;
pub mod scope;
pub mod utils;
pub mod validate;

pub use error::{Error, Result};
pub use validate::{validate, validate_dashboard};
