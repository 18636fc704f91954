use std::time::Duration;

pub const DEFAULT_HUNTER_BASE_URL: &str = "https://api.hunter.io/v2";

/// Runtime settings for one enrichment run.
///
/// Passed explicitly into [`crate::verification::VerificationGateway`] and
/// [`crate::enrichment::ContactEnricher`]. Read-only once built.
#[derive(Debug, Clone)]
pub struct Config {
    pub hunter_api_key: Option<String>,
    pub hunter_base_url: String,
    pub request_timeout: Duration,
    pub max_requests_per_minute: usize,
    pub pace_every: usize,
    pub pace_delay: Duration,
    pub verification_cache_ttl: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hunter_api_key: None,
            hunter_base_url: DEFAULT_HUNTER_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            max_requests_per_minute: 50,
            pace_every: 10,
            pace_delay: Duration::from_millis(1000),
            verification_cache_ttl: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            hunter_api_key: std::env::var("HUNTER_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            hunter_base_url: std::env::var("HUNTER_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|raw| {
                    let parsed = url::Url::parse(raw.trim())
                        .map_err(|e| anyhow::anyhow!("HUNTER_BASE_URL is not a valid URL: {}", e))?;
                    if !matches!(parsed.scheme(), "http" | "https") {
                        anyhow::bail!("HUNTER_BASE_URL must use http or https");
                    }
                    Ok(raw.trim().trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or(defaults.hunter_base_url),
            request_timeout: read_u64("HUNTER_TIMEOUT_SECS")?
                .map(|secs| {
                    if secs == 0 {
                        anyhow::bail!("HUNTER_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(Duration::from_secs(secs))
                })
                .transpose()?
                .unwrap_or(defaults.request_timeout),
            max_requests_per_minute: read_u64("MAX_REQUESTS_PER_MINUTE")?
                .map(|n| n as usize)
                .unwrap_or(defaults.max_requests_per_minute),
            pace_every: read_u64("BATCH_PAUSE_EVERY")?
                .map(|n| {
                    if n == 0 {
                        anyhow::bail!("BATCH_PAUSE_EVERY must be greater than zero");
                    }
                    Ok(n as usize)
                })
                .transpose()?
                .unwrap_or(defaults.pace_every),
            pace_delay: read_u64("BATCH_PAUSE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.pace_delay),
            verification_cache_ttl: read_u64("VERIFICATION_CACHE_TTL_SECS")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        tracing::info!("Configuration loaded successfully");
        if config.hunter_api_key.is_none() {
            tracing::warn!(
                "No Hunter.io API key found; verification will use local validation only"
            );
        }
        tracing::debug!("Hunter base URL: {}", config.hunter_base_url);
        tracing::debug!(
            "Batch cap: {}, pause every {} records for {:?}",
            config.max_requests_per_minute,
            config.pace_every,
            config.pace_delay
        );
        if let Some(ttl) = config.verification_cache_ttl {
            tracing::info!("Verification cache enabled (TTL {:?})", ttl);
        }

        Ok(config)
    }

    pub fn has_credentials(&self) -> bool {
        self.hunter_api_key.is_some()
    }
}

fn read_u64(name: &str) -> anyhow::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer", name)),
        _ => Ok(None),
    }
}
