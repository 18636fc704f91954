//! Lead enrichment workflow
//!
//! Per lead:
//! 1. Verify the existing email, or find one from name + company domain
//! 2. Score data quality
//! 3. Mark enriched and record which technique ran
//!
//! Batches run strictly one lead at a time with a pause every N leads.
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{present, Lead};
use crate::scoring::calculate_quality_score;
use crate::validator::EmailValidator;
use crate::verification::VerificationGateway;

pub const EMAIL_VERIFICATION: &str = "email_verification";
pub const EMAIL_FINDER: &str = "email_finder";

/// Waits between units of work in a batch.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps for a fixed delay.
pub struct SleepPacer {
    delay: Duration,
}

impl SleepPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for SleepPacer {
    async fn pause(&self) {
        tracing::debug!("Rate limiting: pausing {:?}", self.delay);
        tokio::time::sleep(self.delay).await;
    }
}

/// Enriches leads through the verification gateway.
pub struct ContactEnricher {
    gateway: VerificationGateway,
    pacer: Arc<dyn Pacer>,
    pace_every: usize,
    default_batch_cap: usize,
}

impl ContactEnricher {
    pub fn new(
        config: &Config,
        validator: EmailValidator,
        pacer: Arc<dyn Pacer>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            gateway: VerificationGateway::new(config, validator)?,
            pacer,
            pace_every: config.pace_every.max(1),
            default_batch_cap: config.max_requests_per_minute,
        })
    }

    /// Enricher with real DNS and sleeping pacer, as configured.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config,
            EmailValidator::with_dns(),
            Arc::new(SleepPacer::new(config.pace_delay)),
        )
    }

    pub fn default_batch_cap(&self) -> usize {
        self.default_batch_cap
    }

    /// Enriches one lead.
    ///
    /// When the email was found rather than supplied, the verification's
    /// sources are not copied onto the lead.
    pub async fn enrich_lead(&self, lead: Lead) -> Lead {
        let mut enriched = lead;
        let mut techniques = Vec::new();

        if let Some(email) = enriched.email().map(str::to_string) {
            let verification = self.gateway.verify_email(&email).await;
            enriched.email_status = Some(verification.status);
            enriched.email_confidence = Some(verification.score());
            enriched.email_sources = verification.sources;
            techniques.push(EMAIL_VERIFICATION.to_string());
        } else if let (Some(first), Some(last), Some(domain)) = (
            present(&enriched.first_name),
            present(&enriched.last_name),
            present(&enriched.company_domain),
        ) {
            let found = self.gateway.find_email(first, last, domain).await;
            if let Some(email) = found {
                tracing::info!("Found candidate email {}", email);
                let verification = self.gateway.verify_email(&email).await;
                enriched.email = Some(email);
                enriched.email_status = Some(verification.status);
                enriched.email_confidence = Some(verification.score());
                techniques.push(EMAIL_FINDER.to_string());
            }
        } else {
            tracing::debug!(
                "Lead {} has no email and not enough data to find one",
                enriched.id.as_deref().unwrap_or("<no id>")
            );
        }

        enriched.data_quality_score = calculate_quality_score(&enriched);
        enriched.is_enriched = true;
        enriched.enrichment_date = Some(Utc::now());
        enriched.verification_sources = techniques;

        enriched
    }

    /// Enriches up to `max_requests` leads in order. Leads past the cap are
    /// not returned.
    ///
    /// # Arguments
    ///
    /// * `leads` - Input leads; not modified.
    /// * `max_requests` - Batch cap, usually `MAX_REQUESTS_PER_MINUTE`.
    ///
    /// # Returns
    ///
    /// * `Vec<Lead>` - Enriched copies in input order. The pacer runs before
    ///   every `pace_every`-th lead after the first.
    pub async fn bulk_enrich(&self, leads: &[Lead], max_requests: usize) -> Vec<Lead> {
        let batch = &leads[..leads.len().min(max_requests)];
        let mut enriched_leads = Vec::with_capacity(batch.len());

        if batch.len() < leads.len() {
            tracing::warn!(
                "Batch cap {} reached: {} leads will not be enriched",
                max_requests,
                leads.len() - batch.len()
            );
        }

        for (i, lead) in batch.iter().enumerate() {
            if i > 0 && i % self.pace_every == 0 {
                self.pacer.pause().await;
            }

            let enriched = self.enrich_lead(lead.clone()).await;
            tracing::info!(
                "Enriched {}/{}: {}",
                i + 1,
                batch.len(),
                lead.company_name.as_deref().unwrap_or("Unknown")
            );
            enriched_leads.push(enriched);
        }

        enriched_leads
    }
}
