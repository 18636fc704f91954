use crate::config::Config;
use crate::errors::AppError;
use crate::models::SourceEntry;
use reqwest::{self, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Every Hunter.io payload is wrapped in a `data` object.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// `data` of the email-verifier endpoint. Everything optional: absent
/// fields are decided by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifierData {
    pub email: Option<String>,
    pub status: Option<String>,
    /// `None` when the key is absent, `Some(None)` when it is `null`.
    #[serde(default, deserialize_with = "present_or_null")]
    pub score: Option<Option<i64>>,
    #[serde(default)]
    pub regexp: bool,
    #[serde(default)]
    pub gibberish: bool,
    #[serde(default)]
    pub disposable: bool,
    #[serde(default)]
    pub webmail: bool,
    #[serde(default)]
    pub mx_records: bool,
    #[serde(default)]
    pub smtp_server: bool,
    #[serde(default)]
    pub smtp_check: bool,
    #[serde(default)]
    pub accept_all: bool,
    #[serde(default)]
    pub block: bool,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `data` of the email-finder endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinderData {
    pub email: Option<String>,
    #[serde(default)]
    pub score: i64,
}

/// One person returned by domain search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainEmail {
    pub value: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
}

/// `data` of the domain-search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainSearchData {
    pub organization: Option<String>,
    #[serde(default)]
    pub emails: Vec<DomainEmail>,
}

/// Client for the Hunter.io v2 REST API.
#[derive(Clone)]
pub struct HunterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HunterClient {
    /// Creates a new `HunterClient` with the configured timeout.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the base URL, the optional API key and the
    ///   per-request timeout.
    ///
    /// # Returns
    ///
    /// * `Result<Self, AppError>` - Fails only if the HTTP client cannot be built.
    ///   A missing key is not an error here; each call reports it.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Hunter client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.hunter_base_url.trim_end_matches('/').to_string(),
            api_key: config.hunter_api_key.clone(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Verifies one address.
    ///
    /// # Arguments
    ///
    /// * `email` - The address to check, sent as the `email` query parameter.
    ///
    /// # Returns
    ///
    /// * `Result<VerifierData, AppError>` - The raw `data` object.
    ///   `MissingCredentials` without a key, `RateLimited` on 429,
    ///   `ExternalApiError` on transport or other non-2xx failures and
    ///   `MalformedResponse` when the body has no usable `data`.
    pub async fn verify_email(&self, email: &str) -> Result<VerifierData, AppError> {
        tracing::info!("Verifying {} with Hunter.io", email);
        self.get("email-verifier", &[("email", email)]).await
    }

    /// Looks up the most likely address of a person at a domain.
    pub async fn find_email(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<FinderData, AppError> {
        tracing::info!(
            "Finding email for {} {} at {} with Hunter.io",
            first_name,
            last_name,
            domain
        );
        self.get(
            "email-finder",
            &[
                ("domain", domain),
                ("first_name", first_name),
                ("last_name", last_name),
            ],
        )
        .await
    }

    /// Lists people with known addresses at a domain.
    ///
    /// # Arguments
    ///
    /// * `domain` - Company domain, e.g. `acme.io`.
    /// * `limit` - Maximum number of people to return.
    pub async fn domain_search(
        &self,
        domain: &str,
        limit: usize,
    ) -> Result<DomainSearchData, AppError> {
        tracing::info!("Searching domain {} with Hunter.io (limit {})", domain, limit);
        let limit = limit.to_string();
        self.get("domain-search", &[("domain", domain), ("limit", limit.as_str())])
            .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::MissingCredentials("Hunter.io API key is not configured".to_string())
        })?;

        // Build URL with proper parameter encoding
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("api_key", api_key));
        let url = reqwest::Url::parse_with_params(&format!("{}/{}", self.base_url, endpoint), &query)
            .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        // Redact key from logs
        tracing::debug!("Hunter.io request: {}/{} [api_key=REDACTED]", self.base_url, endpoint);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Hunter.io request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited(format!(
                "Hunter.io {} returned 429",
                endpoint
            )));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Hunter.io returned {}: {}",
                status, error_text
            )));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            AppError::MalformedResponse(format!("Failed to parse Hunter.io response: {}", e))
        })?;

        envelope.data.ok_or_else(|| {
            AppError::MalformedResponse(format!("Hunter.io {} response has no data", endpoint))
        })
    }
}
