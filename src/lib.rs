//! Lead Enrichment Library
//!
//! Verifies or finds contact emails for leads, scores their data quality,
//! removes duplicates and exports the result in CRM import layouts.
//!
//! # Modules
//!
//! - `circuit_breaker`: Circuit breaker in front of the verification provider.
//! - `config`: Configuration management.
//! - `dedup`: Email-keyed deduplication.
//! - `enrichment`: Per-lead and batch enrichment workflow.
//! - `errors`: Error handling types.
//! - `export`: CRM export layouts and CSV writer.
//! - `hunter_client`: Hunter.io API client.
//! - `models`: Core data models.
//! - `scoring`: Data quality score.
//! - `sources`: Sample, domain search and CSV lead sources.
//! - `validator`: Local email validation and MX lookups.
//! - `verification`: Remote verification with local fallback.

pub mod circuit_breaker;
pub mod config;
pub mod dedup;
pub mod enrichment;
pub mod errors;
pub mod export;
pub mod hunter_client;
pub mod models;
pub mod scoring;
pub mod sources;
pub mod validator;
pub mod verification;
