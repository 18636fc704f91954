use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Email deliverability status, normalized from any provider vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Valid,
    Invalid,
    AcceptAll,
    Webmail,
    Disposable,
    Unknown,
    Blocked,
}

impl EmailStatus {
    /// Maps a provider status keyword (case-insensitive) to a status.
    /// Anything unrecognized lands in `Unknown`.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "valid" => EmailStatus::Valid,
            "invalid" => EmailStatus::Invalid,
            "accept_all" => EmailStatus::AcceptAll,
            "webmail" => EmailStatus::Webmail,
            "disposable" => EmailStatus::Disposable,
            "blocked" => EmailStatus::Blocked,
            _ => EmailStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Valid => "valid",
            EmailStatus::Invalid => "invalid",
            EmailStatus::AcceptAll => "accept_all",
            EmailStatus::Webmail => "webmail",
            EmailStatus::Disposable => "disposable",
            EmailStatus::Unknown => "unknown",
            EmailStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse confidence bucket derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => ConfidenceLevel::High,
            70..=89 => ConfidenceLevel::Medium,
            50..=69 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }
}

/// Where a provider saw an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub extracted_on: Option<String>,
    #[serde(default)]
    pub last_seen_on: Option<String>,
    #[serde(default)]
    pub still_on_page: Option<bool>,
}

/// Diagnostic flags attached to a verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFlags {
    /// Address format is valid.
    pub regexp: bool,
    pub gibberish: bool,
    pub disposable: bool,
    pub webmail: bool,
    pub mx_records: bool,
    pub smtp_server: bool,
    /// Mailbox existence was checked over SMTP.
    pub smtp_check: bool,
    pub accept_all: bool,
    pub block: bool,
}

/// Outcome of verifying one address, either remotely or locally.
///
/// The score is fixed at construction; the confidence level is always
/// computed from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub email: String,
    pub status: EmailStatus,
    score: u8,
    pub flags: VerificationFlags,
    pub sources: Vec<SourceEntry>,
}

impl VerificationResult {
    /// Scores above 100 are clamped.
    pub fn new(
        email: impl Into<String>,
        status: EmailStatus,
        score: u8,
        flags: VerificationFlags,
        sources: Vec<SourceEntry>,
    ) -> Self {
        Self {
            email: email.into(),
            status,
            score: score.min(100),
            flags,
            sources,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.score)
    }
}

/// Local-only validation outcome used by the verification fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub email: String,
    pub is_valid: bool,
    pub format_valid: bool,
    pub mx_records: bool,
    pub is_disposable: bool,
    pub is_webmail: bool,
    pub is_gibberish: bool,
    pub domain: Option<String>,
    pub errors: Vec<String>,
}

/// A lead moving through the enrichment pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    // Identity
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub title: Option<String>,

    // Company
    pub company_name: Option<String>,
    pub company_domain: Option<String>,
    pub company_website: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub employee_count: Option<u32>,
    pub revenue_estimate: Option<f64>,
    pub founded_year: Option<i32>,

    // Contact
    pub email: Option<String>,
    pub email_status: Option<EmailStatus>,
    pub email_confidence: Option<u8>,
    #[serde(default)]
    pub email_sources: Vec<SourceEntry>,
    pub phone: Option<String>,
    #[serde(default)]
    pub phone_valid: bool,

    // Social
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,

    // Location
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,

    // Quality metrics, written by the enrichment pass only
    #[serde(default)]
    pub data_quality_score: u8,
    #[serde(default)]
    pub is_enriched: bool,
    pub enrichment_date: Option<DateTime<Utc>>,

    // Provenance
    pub data_source: Option<String>,
    #[serde(default)]
    pub verification_sources: Vec<String>,
}

impl Lead {
    /// The email if one is set and non-empty.
    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    /// Full name, or first and last joined.
    pub fn display_name(&self) -> String {
        if let Some(full) = present(&self.full_name) {
            return full.to_string();
        }
        [present(&self.first_name), present(&self.last_name)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A string field counts as present when set and not blank.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Turns adapter-supplied empty strings into absent fields.
pub fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Summary of one enrichment run.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub total_leads: usize,
    pub enriched_count: usize,
    pub verified_emails: usize,
    pub invalid_emails: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
    pub avg_quality_score: f64,
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
}

impl EnrichmentReport {
    pub fn from_leads(leads: &[Lead], elapsed: Duration) -> Self {
        let total_leads = leads.len();
        let count = |pred: fn(&Lead) -> bool| leads.iter().filter(|l| pred(l)).count();

        let avg_quality_score = if total_leads == 0 {
            0.0
        } else {
            leads
                .iter()
                .map(|l| f64::from(l.data_quality_score))
                .sum::<f64>()
                / total_leads as f64
        };

        Self {
            total_leads,
            enriched_count: count(|l| l.is_enriched),
            verified_emails: count(|l| l.email_status == Some(EmailStatus::Valid)),
            invalid_emails: count(|l| l.email_status == Some(EmailStatus::Invalid)),
            high_confidence: count(|l| l.email_confidence.is_some_and(|c| c >= 90)),
            medium_confidence: count(|l| l.email_confidence.is_some_and(|c| (70..90).contains(&c))),
            low_confidence: count(|l| l.email_confidence.is_some_and(|c| c < 70)),
            avg_quality_score,
            processing_time: elapsed.as_secs_f64(),
            timestamp: Utc::now(),
        }
    }
}
