//! # SQL Lineage Analyzer Library
//!
//! Repository listing, script retrieval and LLM-backed lineage
//! classification for SQL scripts.

pub mod app;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod output;
pub mod repo;
