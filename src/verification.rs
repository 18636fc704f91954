//! Verification gateway.
//!
//! Every operation is a two-branch decision: a remote attempt that yields a
//! result or a failure value, then a local computation when the remote branch
//! did not produce anything usable. Nothing here returns an error to callers.

use failsafe::futures::CircuitBreaker;
use moka::future::Cache;
use std::future::Future;

use crate::circuit_breaker::{create_remote_circuit_breaker, RemoteBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::hunter_client::{HunterClient, VerifierData};
use crate::models::{EmailStatus, ValidationReport, VerificationFlags, VerificationResult};
use crate::validator::EmailValidator;

/// Minimum finder score (exclusive) for a remote candidate to be used.
pub const FINDER_MIN_SCORE: i64 = 50;

pub struct VerificationGateway {
    client: HunterClient,
    validator: EmailValidator,
    breaker: RemoteBreaker,
    cache: Option<Cache<String, VerificationResult>>,
}

impl VerificationGateway {
    pub fn new(config: &Config, validator: EmailValidator) -> Result<Self, AppError> {
        let cache = config.verification_cache_ttl.map(|ttl| {
            Cache::builder()
                .time_to_live(ttl)
                .max_capacity(10_000)
                .build()
        });

        Ok(Self {
            client: HunterClient::new(config)?,
            validator,
            breaker: create_remote_circuit_breaker(),
            cache,
        })
    }

    /// Verifies an address. Falls back to local validation when no key is
    /// configured or the remote call fails in any way.
    ///
    /// With the session cache enabled, remote answers and keyless local
    /// answers are cached; fallbacks after a transient failure are not.
    ///
    /// # Arguments
    ///
    /// * `email` - The address to verify.
    ///
    /// # Returns
    ///
    /// * `VerificationResult` - Never an error; the confidence level is
    ///   always derived from the returned score.
    pub async fn verify_email(&self, email: &str) -> VerificationResult {
        let cache_key = email.to_lowercase();
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cache_key).await {
                tracing::debug!("Verification cache hit for {}", email);
                return cached;
            }
        }

        let (result, cacheable) = match self.remote_verification(email).await {
            Ok(result) => (result, true),
            Err(e) => {
                log_fallback("verification", email, &e);
                // Only a keyless run is stable; a transient failure may clear up.
                let stable = matches!(e, AppError::MissingCredentials(_));
                (self.local_verification(email).await, stable)
            }
        };

        if let (Some(cache), true) = (&self.cache, cacheable) {
            cache.insert(cache_key, result.clone()).await;
        }

        result
    }

    /// Remote branch of [`Self::verify_email`].
    pub async fn remote_verification(&self, email: &str) -> Result<VerificationResult, AppError> {
        let data = self.guarded(self.client.verify_email(email)).await?;
        map_remote_verification(email, data)
    }

    /// Local branch of [`Self::verify_email`].
    pub async fn local_verification(&self, email: &str) -> VerificationResult {
        let report = self.validator.comprehensive_validation(email).await;
        fallback_verification(&report)
    }

    /// Finds an address for a person. Uses the remote finder when a key is
    /// configured and it returns a confident candidate, otherwise guesses
    /// `first.last@domain`. `None` when any input is blank.
    pub async fn find_email(&self, first_name: &str, last_name: &str, domain: &str) -> Option<String> {
        let (first, last, domain) = (first_name.trim(), last_name.trim(), domain.trim());
        if first.is_empty() || last.is_empty() || domain.is_empty() {
            tracing::debug!("Cannot look up an email without first name, last name and domain");
            return None;
        }

        match self.remote_find(first, last, domain).await {
            Ok(Some(email)) => Some(email),
            Ok(None) => Some(guess_email(first, last, domain)),
            Err(e) => {
                log_fallback("email finder", domain, &e);
                Some(guess_email(first, last, domain))
            }
        }
    }

    /// Remote branch of [`Self::find_email`]. `Ok(None)` means the provider
    /// answered but without a confident candidate.
    pub async fn remote_find(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<Option<String>, AppError> {
        let data = self
            .guarded(self.client.find_email(first_name, last_name, domain))
            .await?;

        match data.email {
            Some(email) if !email.trim().is_empty() && data.score > FINDER_MIN_SCORE => {
                tracing::info!("Hunter.io found {} (score {})", email, data.score);
                Ok(Some(email))
            }
            _ => {
                tracing::debug!(
                    "Hunter.io finder result below threshold (score {})",
                    data.score
                );
                Ok(None)
            }
        }
    }

    /// Runs a remote call through the circuit breaker. Missing credentials
    /// short-circuit without counting as a provider failure.
    async fn guarded<T, F>(&self, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        if !self.client.has_credentials() {
            return Err(AppError::MissingCredentials(
                "Hunter.io API key is not configured".to_string(),
            ));
        }

        self.breaker.call(call).await.map_err(|e| match e {
            failsafe::Error::Inner(inner) => inner,
            failsafe::Error::Rejected => AppError::ExternalApiError(
                "Hunter.io circuit breaker is open".to_string(),
            ),
        })
    }
}

fn log_fallback(operation: &str, subject: &str, err: &AppError) {
    match err {
        AppError::MissingCredentials(_) => {
            tracing::debug!("No API key, using local {} for {}", operation, subject)
        }
        AppError::RateLimited(_) => tracing::warn!(
            "Rate limit exceeded during {} for {}. Falling back to local validation.",
            operation,
            subject
        ),
        e if e.is_transient() => {
            tracing::warn!("{} failed for {}: {}. Falling back.", operation, subject, e)
        }
        e => tracing::error!("{} failed for {}: {}. Falling back.", operation, subject, e),
    }
}

/// Maps a verifier payload into a result.
///
/// The provider's status keyword is normalized; a payload with no status or
/// with a score outside 0-100 is malformed.
pub fn map_remote_verification(
    email: &str,
    data: VerifierData,
) -> Result<VerificationResult, AppError> {
    let status = data
        .status
        .as_deref()
        .map(EmailStatus::from_provider)
        .ok_or_else(|| AppError::MalformedResponse("verifier response has no status".to_string()))?;

    let score = match data.score {
        None => 0,
        Some(None) => {
            return Err(AppError::MalformedResponse(
                "verifier score is null".to_string(),
            ))
        }
        Some(Some(score)) => score,
    };
    let score = u8::try_from(score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| {
            AppError::MalformedResponse(format!("verifier score out of range: {}", score))
        })?;

    let flags = VerificationFlags {
        regexp: data.regexp,
        gibberish: data.gibberish,
        disposable: data.disposable,
        webmail: data.webmail,
        mx_records: data.mx_records,
        smtp_server: data.smtp_server,
        smtp_check: data.smtp_check,
        accept_all: data.accept_all,
        block: data.block,
    };

    Ok(VerificationResult::new(
        data.email.unwrap_or_else(|| email.to_string()),
        status,
        score,
        flags,
        data.sources,
    ))
}

/// Scores a local validation report.
///
/// Decision order: disposable (0), bad format (0), no MX (20), webmail (70),
/// valid (75), anything else (50).
pub fn fallback_verification(report: &ValidationReport) -> VerificationResult {
    let (status, score) = if report.is_disposable {
        (EmailStatus::Disposable, 0)
    } else if !report.format_valid {
        (EmailStatus::Invalid, 0)
    } else if !report.mx_records {
        (EmailStatus::Invalid, 20)
    } else if report.is_webmail {
        (EmailStatus::Webmail, 70)
    } else if report.is_valid {
        (EmailStatus::Valid, 75)
    } else {
        (EmailStatus::Unknown, 50)
    };

    let flags = VerificationFlags {
        regexp: report.format_valid,
        gibberish: report.is_gibberish,
        disposable: report.is_disposable,
        webmail: report.is_webmail,
        mx_records: report.mx_records,
        smtp_server: report.mx_records,
        smtp_check: false,
        accept_all: false,
        block: false,
    };

    VerificationResult::new(report.email.clone(), status, score, flags, Vec::new())
}

/// The single guessed pattern: `first.last@domain`, lowercased names.
pub fn guess_email(first_name: &str, last_name: &str, domain: &str) -> String {
    format!(
        "{}.{}@{}",
        first_name.trim().to_lowercase(),
        last_name.trim().to_lowercase(),
        domain.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfidenceLevel;

    fn report(format: bool, mx: bool, disposable: bool, webmail: bool, gibberish: bool) -> ValidationReport {
        ValidationReport {
            email: "someone@example.com".to_string(),
            is_valid: format && mx && !disposable && !gibberish,
            format_valid: format,
            mx_records: mx,
            is_disposable: disposable,
            is_webmail: webmail,
            is_gibberish: gibberish,
            domain: Some("example.com".to_string()),
            errors: vec![],
        }
    }

    #[test]
    fn test_fallback_decision_table() {
        let cases = [
            (report(true, true, true, false, false), EmailStatus::Disposable, 0),
            (report(true, false, true, false, false), EmailStatus::Disposable, 0),
            (report(false, false, false, false, false), EmailStatus::Invalid, 0),
            (report(true, false, false, true, false), EmailStatus::Invalid, 20),
            (report(true, true, false, true, true), EmailStatus::Webmail, 70),
            (report(true, true, false, false, false), EmailStatus::Valid, 75),
            (report(true, true, false, false, true), EmailStatus::Unknown, 50),
        ];

        for (input, status, score) in cases {
            let result = fallback_verification(&input);
            assert_eq!(result.status, status, "{:?}", input);
            assert_eq!(result.score(), score, "{:?}", input);
            assert!(result.sources.is_empty());
            assert!(!result.flags.smtp_check);
            assert_eq!(result.flags.smtp_server, input.mx_records);
        }
    }

    #[test]
    fn test_remote_mapping_recomputes_confidence() {
        let data = VerifierData {
            email: Some("ceo@acme.io".to_string()),
            status: Some("ACCEPT_ALL".to_string()),
            score: Some(Some(91)),
            accept_all: true,
            ..Default::default()
        };

        let result = map_remote_verification("ceo@acme.io", data).unwrap();
        assert_eq!(result.status, EmailStatus::AcceptAll);
        assert_eq!(result.score(), 91);
        assert_eq!(result.confidence_level(), ConfidenceLevel::High);
        assert!(result.flags.accept_all);
    }

    #[test]
    fn test_remote_mapping_unknown_status() {
        let data = VerifierData {
            status: Some("risky".to_string()),
            score: Some(Some(40)),
            ..Default::default()
        };
        let result = map_remote_verification("x@acme.io", data).unwrap();
        assert_eq!(result.status, EmailStatus::Unknown);
        assert_eq!(result.email, "x@acme.io");
    }

    #[test]
    fn test_remote_mapping_rejects_malformed() {
        let no_status = VerifierData {
            score: Some(Some(80)),
            ..Default::default()
        };
        assert!(map_remote_verification("x@acme.io", no_status).is_err());

        let bad_score = VerifierData {
            status: Some("valid".to_string()),
            score: Some(Some(140)),
            ..Default::default()
        };
        assert!(matches!(
            map_remote_verification("x@acme.io", bad_score),
            Err(AppError::MalformedResponse(_))
        ));

        let null_score = VerifierData {
            status: Some("valid".to_string()),
            score: Some(None),
            ..Default::default()
        };
        assert!(matches!(
            map_remote_verification("x@acme.io", null_score),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_remote_mapping_missing_score_is_zero() {
        let data = VerifierData {
            status: Some("unknown".to_string()),
            ..Default::default()
        };
        let result = map_remote_verification("x@acme.io", data).unwrap();
        assert_eq!(result.score(), 0);
    }

    #[test]
    fn test_guess_email_pattern() {
        assert_eq!(guess_email(" Sarah ", "JOHNSON", "techflow.com"), "sarah.johnson@techflow.com");
    }
}
