//! Shared fakes for integration tests: DNS without the network and a pacer
//! that counts instead of sleeping.
#![allow(dead_code)]

use async_trait::async_trait;
use lead_enrichment::config::Config;
use lead_enrichment::enrichment::{ContactEnricher, Pacer};
use lead_enrichment::errors::AppError;
use lead_enrichment::validator::{EmailValidator, MxLookup};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers MX queries from a fixed set of domains.
pub struct StaticMx {
    domains: HashSet<String>,
    pub calls: AtomicUsize,
}

impl StaticMx {
    pub fn with(domains: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MxLookup for StaticMx {
    async fn exchanges(&self, domain: &str) -> Result<Vec<String>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.domains.contains(domain) {
            Ok(vec![format!("mx1.{}.", domain)])
        } else {
            Err(AppError::ExternalApiError(format!("NXDOMAIN {}", domain)))
        }
    }
}

#[derive(Default)]
pub struct CountingPacer {
    pauses: AtomicUsize,
}

impl CountingPacer {
    pub fn count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Domains that resolve in tests.
pub const MX_DOMAINS: &[&str] = &[
    "gmail.com",
    "tempmail.com",
    "techflow.com",
    "datasync.io",
    "example.com",
    "acme.io",
];

pub fn offline_config() -> Config {
    Config::default()
}

pub fn config_with_server(base_url: String) -> Config {
    Config {
        hunter_api_key: Some("test_key".to_string()),
        hunter_base_url: base_url,
        ..Config::default()
    }
}

pub fn validator() -> EmailValidator {
    EmailValidator::new(StaticMx::with(MX_DOMAINS))
}

pub fn enricher(config: &Config) -> (ContactEnricher, Arc<CountingPacer>) {
    let pacer = Arc::new(CountingPacer::default());
    let enricher = ContactEnricher::new(config, validator(), pacer.clone()).unwrap();
    (enricher, pacer)
}
