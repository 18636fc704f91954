//! Lead sources: generated sample data, Hunter.io domain search and CSV
//! uploads. Each produces raw leads for the enrichment pass.

use csv::{ReaderBuilder, StringRecord, Trim};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashMap;
use std::io::Read;

use crate::errors::{AppError, ResultExt};
use crate::hunter_client::HunterClient;
use crate::models::{non_empty, Lead};

pub const SAMPLE_SOURCE: &str = "Sample Data";
pub const DOMAIN_SEARCH_SOURCE: &str = "Hunter.io Domain Search";
pub const CSV_SOURCE: &str = "CSV Upload";

struct SampleCompany {
    name: &'static str,
    domain: &'static str,
    industry: &'static str,
    employees: u32,
    revenue: f64,
}

const SAMPLE_COMPANIES: [SampleCompany; 10] = [
    SampleCompany { name: "TechFlow Solutions", domain: "techflow.com", industry: "SaaS", employees: 45, revenue: 5_000_000.0 },
    SampleCompany { name: "DataSync Inc", domain: "datasync.io", industry: "Data Analytics", employees: 32, revenue: 3_500_000.0 },
    SampleCompany { name: "CloudBridge Systems", domain: "cloudbridge.com", industry: "Cloud Services", employees: 78, revenue: 12_000_000.0 },
    SampleCompany { name: "SecureNet Corp", domain: "securenet.com", industry: "Cybersecurity", employees: 55, revenue: 8_000_000.0 },
    SampleCompany { name: "FinTrack Software", domain: "fintrack.io", industry: "FinTech", employees: 28, revenue: 2_800_000.0 },
    SampleCompany { name: "HealthHub Technologies", domain: "healthhub.com", industry: "HealthTech", employees: 41, revenue: 4_500_000.0 },
    SampleCompany { name: "EduLearn Platform", domain: "edulearn.com", industry: "EdTech", employees: 35, revenue: 3_200_000.0 },
    SampleCompany { name: "LogiChain Solutions", domain: "logichain.com", industry: "Logistics", employees: 62, revenue: 9_000_000.0 },
    SampleCompany { name: "MarketPulse Analytics", domain: "marketpulse.io", industry: "Marketing", employees: 38, revenue: 4_000_000.0 },
    SampleCompany { name: "GreenEnergy Systems", domain: "greenenergy.com", industry: "CleanTech", employees: 52, revenue: 7_500_000.0 },
];

const FIRST_NAMES: [&str; 10] = [
    "John", "Sarah", "Michael", "Emily", "David", "Jennifer", "Robert", "Lisa", "James", "Mary",
];
const LAST_NAMES: [&str; 10] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez",
];
const TITLES: [&str; 6] = [
    "CEO",
    "Founder",
    "President",
    "Managing Director",
    "VP Operations",
    "Chief Executive",
];
const CITIES: [&str; 8] = [
    "Austin", "Denver", "Seattle", "Portland", "Nashville", "Charlotte", "San Diego", "Boston",
];
const STATES: [&str; 8] = ["TX", "CO", "WA", "OR", "TN", "NC", "CA", "MA"];

/// Sample leads for demos, one per built-in company (at most 10).
pub fn generate_sample_leads(count: usize) -> Vec<Lead> {
    generate_sample_leads_with(count, &mut rand::rng())
}

/// Same as [`generate_sample_leads`] with a caller-supplied RNG.
pub fn generate_sample_leads_with<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Lead> {
    SAMPLE_COMPANIES
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, company)| {
            let first_name = pick(&FIRST_NAMES, rng);
            let last_name = pick(&LAST_NAMES, rng);

            Lead {
                id: Some(format!("lead_{}", i + 1)),
                first_name: Some(first_name.to_string()),
                last_name: Some(last_name.to_string()),
                full_name: Some(format!("{} {}", first_name, last_name)),
                title: Some(pick(&TITLES, rng).to_string()),
                company_name: Some(company.name.to_string()),
                company_domain: Some(company.domain.to_string()),
                company_website: Some(format!("https://{}", company.domain)),
                industry: Some(company.industry.to_string()),
                employee_count: Some(company.employees),
                revenue_estimate: Some(company.revenue),
                email: Some(format!(
                    "{}.{}@{}",
                    first_name.to_lowercase(),
                    last_name.to_lowercase(),
                    company.domain
                )),
                city: Some(pick(&CITIES, rng).to_string()),
                state: Some(pick(&STATES, rng).to_string()),
                country: Some("USA".to_string()),
                data_source: Some(SAMPLE_SOURCE.to_string()),
                ..Default::default()
            }
        })
        .collect()
}

fn pick<R: Rng + ?Sized>(options: &[&'static str], rng: &mut R) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// Leads from one domain via Hunter.io Domain Search. Requires an API key.
///
/// # Arguments
///
/// * `client` - Hunter.io client; must carry an API key.
/// * `domain` - Company domain. Surrounding whitespace is ignored.
/// * `max_results` - Forwarded as the search `limit`.
///
/// # Returns
///
/// * `Result<Vec<Lead>, AppError>` - One lead per returned person, with
///   `data_source` set to [`DOMAIN_SEARCH_SOURCE`]. `InvalidInput` for an
///   empty domain, `MissingCredentials` without a key, otherwise the
///   provider error with context.
pub async fn scrape_domain(
    client: &HunterClient,
    domain: &str,
    max_results: usize,
) -> Result<Vec<Lead>, AppError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(AppError::InvalidInput("Domain is empty".to_string()));
    }
    if !client.has_credentials() {
        return Err(AppError::MissingCredentials(
            "Hunter.io API key is required for domain search".to_string(),
        ));
    }

    let data = client
        .domain_search(domain, max_results)
        .await
        .with_context(|| format!("Domain search for {} failed", domain))?;

    let organization = data.organization.and_then(non_empty);

    let leads = data
        .emails
        .into_iter()
        .map(|person| {
            let first_name = person.first_name.and_then(non_empty);
            let last_name = person.last_name.and_then(non_empty);
            let full_name = non_empty(format!(
                "{} {}",
                first_name.as_deref().unwrap_or_default(),
                last_name.as_deref().unwrap_or_default()
            ));

            Lead {
                id: Some(format!("hunter_{}", uuid::Uuid::new_v4())),
                first_name,
                last_name,
                full_name,
                title: person.position.and_then(non_empty),
                company_name: organization.clone(),
                company_domain: Some(domain.to_string()),
                company_website: Some(format!("https://{}", domain)),
                email: person.value.and_then(non_empty),
                data_source: Some(DOMAIN_SEARCH_SOURCE.to_string()),
                ..Default::default()
            }
        })
        .collect();

    Ok(leads)
}

/// Domain search over several domains. A failing domain is logged and
/// skipped.
pub async fn bulk_domain_search(
    client: &HunterClient,
    domains: &[String],
    max_results_per_domain: usize,
) -> Vec<Lead> {
    let mut all_leads = Vec::new();

    for domain in domains {
        match scrape_domain(client, domain, max_results_per_domain).await {
            Ok(leads) => {
                tracing::info!("✅ Retrieved {} leads from {}", leads.len(), domain.trim());
                all_leads.extend(leads);
            }
            Err(e) => {
                tracing::error!("❌ Error with domain {}: {}", domain.trim(), e);
            }
        }
    }

    all_leads
}

/// Validate and normalize a phone number (default region US).
///
/// # Arguments
///
/// * `raw` - Phone as typed; punctuation and spacing are accepted.
///
/// # Returns
///
/// * `(bool, String)` - `(true, e164)` for a valid number, otherwise
///   `(false, reason)`.
pub fn validate_phone(raw: &str) -> (bool, String) {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() < 7 {
        return (false, "Phone too short".to_string());
    }

    match phonenumber::parse(Some(CountryId::US), raw) {
        Ok(number) => {
            if phonenumber::is_valid(&number) {
                let formatted = number.format().mode(Mode::E164).to_string();
                tracing::debug!("✓ Valid phone: {} → {}", raw, formatted);
                (true, formatted)
            } else {
                tracing::debug!("Invalid phone number: {}", raw);
                (false, "Invalid phone number".to_string())
            }
        }
        Err(e) => {
            tracing::debug!("Failed to parse phone '{}': {:?}", raw, e);
            (false, format!("Parse error: {:?}", e))
        }
    }
}

/// Header lookup with lowercased, trimmed column names; spaces read as `_`.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase().replace(' ', "_"), i))
            .collect();
        Self { index }
    }

    /// First non-empty value among the aliases.
    fn get(&self, row: &StringRecord, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|alias| self.index.get(*alias))
            .filter_map(|i| row.get(*i))
            .find_map(non_empty)
    }
}

/// Parses an uploaded CSV into leads.
///
/// Column names are matched case-insensitively with common aliases. Missing
/// columns leave the field empty; only an unreadable file is an error.
/// Valid phones are stored in E.164 form, invalid ones verbatim with
/// `phone_valid = false`.
///
/// # Arguments
///
/// * `reader` - CSV with a header row.
///
/// # Returns
///
/// * `Result<Vec<Lead>, AppError>` - `CsvError` for a missing header row or
///   a row that cannot be decoded.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Lead>, AppError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv
        .headers()
        .context("Failed to parse CSV")?
        .clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::CsvError(
            "Failed to parse CSV: no header row".to_string(),
        ));
    }
    let columns = Columns::new(&headers);

    let mut leads = Vec::new();
    for (idx, row) in csv.records().enumerate() {
        let row = row.with_context(|| format!("Failed to parse CSV row {}", idx + 1))?;

        let first_name = columns.get(&row, &["first_name", "firstname"]);
        let last_name = columns.get(&row, &["last_name", "lastname"]);
        let full_name = columns.get(&row, &["full_name"]).or_else(|| {
            non_empty(format!(
                "{} {}",
                first_name.as_deref().unwrap_or_default(),
                last_name.as_deref().unwrap_or_default()
            ))
        });

        let (phone, phone_valid) = match columns.get(&row, &["phone"]) {
            Some(raw) => match validate_phone(&raw) {
                (true, e164) => (Some(e164), true),
                (false, _) => (Some(raw), false),
            },
            None => (None, false),
        };

        leads.push(Lead {
            id: Some(format!("csv_lead_{}", idx + 1)),
            first_name,
            last_name,
            full_name,
            email: columns.get(&row, &["email"]),
            title: columns.get(&row, &["title", "position"]),
            company_name: columns.get(&row, &["company_name", "company"]),
            company_domain: columns.get(&row, &["company_domain", "domain"]),
            company_website: columns.get(&row, &["company_website", "website"]),
            industry: columns.get(&row, &["industry"]),
            employee_count: columns
                .get(&row, &["employee_count", "employees"])
                .and_then(|v| v.replace(',', "").parse().ok()),
            revenue_estimate: columns
                .get(&row, &["revenue_estimate", "revenue"])
                .and_then(|v| v.replace(',', "").parse().ok()),
            phone,
            phone_valid,
            linkedin_url: columns.get(&row, &["linkedin_url", "linkedin"]),
            city: columns.get(&row, &["city"]),
            state: columns.get(&row, &["state"]),
            country: columns.get(&row, &["country"]),
            data_source: Some(CSV_SOURCE.to_string()),
            ..Default::default()
        });
    }

    tracing::info!("✅ Parsed {} leads from CSV", leads.len());
    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_leads_capped_at_company_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let leads = generate_sample_leads_with(25, &mut rng);
        assert_eq!(leads.len(), 10);
        assert_eq!(leads[0].id.as_deref(), Some("lead_1"));
        assert_eq!(leads[0].company_domain.as_deref(), Some("techflow.com"));
        assert_eq!(leads[9].company_name.as_deref(), Some("GreenEnergy Systems"));
    }

    #[test]
    fn test_sample_email_matches_name() {
        let mut rng = StdRng::seed_from_u64(42);
        for lead in generate_sample_leads_with(5, &mut rng) {
            let expected = format!(
                "{}.{}@{}",
                lead.first_name.unwrap().to_lowercase(),
                lead.last_name.unwrap().to_lowercase(),
                lead.company_domain.unwrap()
            );
            assert_eq!(lead.email.unwrap(), expected);
            assert_eq!(lead.data_source.as_deref(), Some(SAMPLE_SOURCE));
        }
    }

    #[test]
    fn test_phone_validation() {
        assert_eq!(
            validate_phone("(512) 555-0199"),
            (true, "+15125550199".to_string())
        );
        assert!(!validate_phone("123").0);
        assert!(!validate_phone("").0);
    }

    #[test]
    fn test_csv_phone_stored_as_e164() {
        let data = "first_name,phone\nAda,(650) 253-0000\nGrace,12345678\n";
        let leads = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(leads[0].phone.as_deref(), Some("+16502530000"));
        assert!(leads[0].phone_valid);
        assert_eq!(leads[1].phone.as_deref(), Some("12345678"));
        assert!(!leads[1].phone_valid);
    }

    #[test]
    fn test_csv_header_aliases() {
        let data = "FirstName , LastName,Company,Domain,Position,Email\n\
                    Ada,Lovelace,Analytical Engines,engines.io,CTO,ada@engines.io\n";
        let leads = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(leads.len(), 1);
        let lead = &leads[0];
        assert_eq!(lead.id.as_deref(), Some("csv_lead_1"));
        assert_eq!(lead.first_name.as_deref(), Some("Ada"));
        assert_eq!(lead.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(lead.company_name.as_deref(), Some("Analytical Engines"));
        assert_eq!(lead.company_domain.as_deref(), Some("engines.io"));
        assert_eq!(lead.title.as_deref(), Some("CTO"));
        assert_eq!(lead.email.as_deref(), Some("ada@engines.io"));
        assert_eq!(lead.data_source.as_deref(), Some(CSV_SOURCE));
    }

    #[test]
    fn test_csv_missing_columns_default_empty() {
        let data = "email\nsomeone@example.com\n\n";
        let leads = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(leads.len(), 1);
        assert!(leads[0].first_name.is_none());
        assert!(leads[0].company_domain.is_none());
        assert!(!leads[0].phone_valid);
    }

    #[test]
    fn test_csv_ragged_rows_tolerated() {
        let data = "first_name,last_name,email\nAda\nGrace,Hopper,grace@navy.mil,extra\n";
        let leads = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(leads.len(), 2);
        assert!(leads[0].last_name.is_none());
        assert_eq!(leads[1].email.as_deref(), Some("grace@navy.mil"));
    }

    #[test]
    fn test_csv_invalid_utf8_is_fatal() {
        let data: &[u8] = b"email\n\xff\xfe@x.com\n";
        let err = parse_csv(data).unwrap_err();
        assert!(err.to_string().contains("Failed to parse CSV"));
    }
}
