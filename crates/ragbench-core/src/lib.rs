//! ragbench-core
//!
//! Shared vocabulary for the retrieval experiment: domain types, provider
//! traits, configuration, the topic catalog and document ingestion.

pub mod config;
pub mod data_processor;
pub mod error;
pub mod topics;
pub mod traits;
pub mod types;
