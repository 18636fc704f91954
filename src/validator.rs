//! Local email validation: format rules, provider classification, a
//! gibberish heuristic and MX lookups.
//!
//! Everything here is pure except [`MxLookup`], which is the single
//! network-touching seam and can be swapped for a fake in tests.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use crate::errors::AppError;
use crate::models::ValidationReport;

/// Character-level shape of an address (RFC 5322 simplified).
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*$",
    )
    .expect("email regex is valid")
});

/// Labels separated by dots, ending in an alphabetic TLD of 2+ letters.
static DOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$").expect("domain regex is valid")
});

static DISPOSABLE_DOMAINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "tempmail.com",
        "guerrillamail.com",
        "10minutemail.com",
        "throwaway.email",
        "maildrop.cc",
        "mailinator.com",
        "trashmail.com",
        "yopmail.com",
        "temp-mail.org",
    ]
    .into_iter()
    .collect()
});

static WEBMAIL_PROVIDERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "gmail.com",
        "yahoo.com",
        "outlook.com",
        "hotmail.com",
        "icloud.com",
        "aol.com",
        "protonmail.com",
        "mail.com",
    ]
    .into_iter()
    .collect()
});

const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Resolves the mail exchangers of a domain.
#[async_trait]
pub trait MxLookup: Send + Sync {
    /// Exchange hostnames for `domain`. An empty list means no MX answer.
    async fn exchanges(&self, domain: &str) -> Result<Vec<String>, AppError>;
}

/// MX lookups through the system DNS resolver.
pub struct DnsMxLookup {
    resolver: TokioAsyncResolver,
}

impl DnsMxLookup {
    pub fn new() -> Self {
        tracing::debug!("Initializing DNS resolver for MX lookups");
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for DnsMxLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MxLookup for DnsMxLookup {
    async fn exchanges(&self, domain: &str) -> Result<Vec<String>, AppError> {
        let lookup = self
            .resolver
            .mx_lookup(domain)
            .await
            .map_err(|e| AppError::ExternalApiError(format!("MX lookup failed: {}", e)))?;

        Ok(lookup
            .iter()
            .map(|mx| mx.exchange().to_string())
            .collect())
    }
}

/// Local validator. Holds only the MX lookup; every other check is an
/// associated function.
#[derive(Clone)]
pub struct EmailValidator {
    mx: Arc<dyn MxLookup>,
}

impl EmailValidator {
    pub fn new(mx: Arc<dyn MxLookup>) -> Self {
        Self { mx }
    }

    /// Validator backed by real DNS.
    pub fn with_dns() -> Self {
        Self::new(Arc::new(DnsMxLookup::new()))
    }

    /// Structural format check.
    ///
    /// Returns `(is_valid, reason)` where `reason` names the first violated rule,
    /// or `"Valid format"`.
    pub fn validate_format(email: &str) -> (bool, String) {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return (false, "Email is empty or invalid type".to_string());
        }

        if email.matches('@').count() != 1 {
            return (false, "Email must contain exactly one @ symbol".to_string());
        }

        if !EMAIL_REGEX.is_match(&email) {
            return (false, "Invalid email format".to_string());
        }

        let (local, domain) = match email.split_once('@') {
            Some(parts) => parts,
            None => return (false, "Email must contain exactly one @ symbol".to_string()),
        };

        if local.is_empty() || local.len() > 64 {
            return (false, "Local part length must be 1-64 characters".to_string());
        }

        if local.starts_with('.') || local.ends_with('.') {
            return (false, "Local part cannot start or end with a dot".to_string());
        }

        if local.contains("..") {
            return (false, "Local part cannot contain consecutive dots".to_string());
        }

        if domain.is_empty() || domain.len() > 255 {
            return (false, "Domain length must be 1-255 characters".to_string());
        }

        if !DOMAIN_REGEX.is_match(domain) {
            return (false, "Invalid domain format".to_string());
        }

        (true, "Valid format".to_string())
    }

    /// MX check. Never fails: resolver errors, NXDOMAIN and empty answers
    /// all read as `(false, [])`.
    pub async fn check_mx_records(&self, domain: &str) -> (bool, Vec<String>) {
        match self.mx.exchanges(domain).await {
            Ok(hosts) if !hosts.is_empty() => {
                tracing::debug!("MX records for {}: {:?}", domain, hosts);
                (true, hosts)
            }
            Ok(_) => {
                tracing::debug!("No MX records for {}", domain);
                (false, Vec::new())
            }
            Err(e) => {
                tracing::debug!("MX lookup for {} failed: {}", domain, e);
                (false, Vec::new())
            }
        }
    }

    pub fn is_disposable(email: &str) -> bool {
        domain_of(email).is_some_and(|d| DISPOSABLE_DOMAINS.contains(d.as_str()))
    }

    pub fn is_webmail(email: &str) -> bool {
        domain_of(email).is_some_and(|d| WEBMAIL_PROVIDERS.contains(d.as_str()))
    }

    /// Consonant-heavy local parts look generated.
    ///
    /// Non-letters are stripped first; fewer than three letters is never
    /// gibberish; otherwise a consonant ratio above 0.7 is.
    pub fn detect_gibberish(email: &str) -> bool {
        let local = email.split('@').next().unwrap_or_default();
        let letters: Vec<char> = local
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .filter(|c| c.is_ascii_lowercase())
            .collect();

        if letters.len() < 3 {
            return false;
        }

        let consonants = letters.iter().filter(|c| !VOWELS.contains(*c)).count();
        let ratio = consonants as f64 / letters.len() as f64;
        ratio > 0.7
    }

    /// Runs every check in order and collects a report.
    ///
    /// A format failure short-circuits with no domain. Webmail is
    /// informational only and does not affect `is_valid`.
    pub async fn comprehensive_validation(&self, email: &str) -> ValidationReport {
        let mut report = ValidationReport {
            email: email.to_string(),
            ..Default::default()
        };

        let (format_valid, reason) = Self::validate_format(email);
        report.format_valid = format_valid;
        if !format_valid {
            report.errors.push(reason);
            return report;
        }

        let domain = match domain_of(email) {
            Some(domain) => domain,
            None => {
                report.errors.push("Cannot extract domain".to_string());
                return report;
            }
        };

        let (has_mx, _) = self.check_mx_records(&domain).await;
        report.mx_records = has_mx;
        if !has_mx {
            report.errors.push("No MX records found".to_string());
        }
        report.domain = Some(domain);

        report.is_disposable = Self::is_disposable(email);
        if report.is_disposable {
            report.errors.push("Disposable email detected".to_string());
        }

        report.is_webmail = Self::is_webmail(email);

        report.is_gibberish = Self::detect_gibberish(email);
        if report.is_gibberish {
            report.errors.push("Email appears to be gibberish".to_string());
        }

        report.is_valid =
            format_valid && has_mx && !report.is_disposable && !report.is_gibberish;

        tracing::debug!(
            "Validated {}: valid={} errors={:?}",
            email,
            report.is_valid,
            report.errors
        );

        report
    }
}

/// Lowercased part after the first `@`, if any.
fn domain_of(email: &str) -> Option<String> {
    email
        .split('@')
        .nth(1)
        .map(|d| d.trim().to_lowercase())
}
