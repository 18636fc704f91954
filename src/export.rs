//! CRM export layouts.
//!
//! Each layout is a fixed column list filled from a lead. Layouts are lossy;
//! only email and quality score are guaranteed to survive
//! [`write_csv`] followed by [`read_exported`].

use chrono::Local;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::io::{Read, Write};
use std::str::FromStr;

use crate::errors::{AppError, ResultExt};
use crate::models::{present, Lead};

pub const DEFAULT_LEAD_SOURCE: &str = "AcquireIQ";

/// Target CRM import layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrmFormat {
    Salesforce,
    HubSpot,
    Pipedrive,
    Generic,
}

impl FromStr for CrmFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "salesforce" => Ok(CrmFormat::Salesforce),
            "hubspot" => Ok(CrmFormat::HubSpot),
            "pipedrive" => Ok(CrmFormat::Pipedrive),
            "generic" => Ok(CrmFormat::Generic),
            other => Err(AppError::InvalidInput(format!(
                "Unknown export format '{}' (expected salesforce, hubspot, pipedrive or generic)",
                other
            ))),
        }
    }
}

/// A flat table ready to be written as CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// Hot / Warm / Cold from a quality score.
pub fn rating_label(score: u8) -> &'static str {
    if score >= 80 {
        "Hot"
    } else if score >= 60 {
        "Warm"
    } else {
        "Cold"
    }
}

pub fn export_leads(format: CrmFormat, leads: &[Lead]) -> ExportTable {
    match format {
        CrmFormat::Salesforce => export_salesforce(leads),
        CrmFormat::HubSpot => export_hubspot(leads),
        CrmFormat::Pipedrive => export_pipedrive(leads),
        CrmFormat::Generic => export_generic(leads),
    }
}

fn text(field: &Option<String>) -> String {
    present(field).unwrap_or_default().to_string()
}

fn lead_source(lead: &Lead) -> String {
    present(&lead.data_source)
        .unwrap_or(DEFAULT_LEAD_SOURCE)
        .to_string()
}

pub fn export_salesforce(leads: &[Lead]) -> ExportTable {
    let headers = vec![
        "First Name",
        "Last Name",
        "Email",
        "Title",
        "Company",
        "Website",
        "Industry",
        "Phone",
        "Street",
        "City",
        "State",
        "Postal Code",
        "Country",
        "Lead Source",
        "Lead Status",
        "Rating",
        "Email Opt Out",
        "Description",
    ];

    let rows = leads
        .iter()
        .map(|lead| {
            let confidence = lead
                .email_confidence
                .map(|c| format!("{}%", c))
                .unwrap_or_else(|| "n/a".to_string());
            vec![
                text(&lead.first_name),
                text(&lead.last_name),
                text(&lead.email),
                text(&lead.title),
                text(&lead.company_name),
                text(&lead.company_website),
                text(&lead.industry),
                text(&lead.phone),
                String::new(),
                text(&lead.city),
                text(&lead.state),
                String::new(),
                text(&lead.country),
                lead_source(lead),
                "New".to_string(),
                rating_label(lead.data_quality_score).to_string(),
                String::new(),
                format!(
                    "Quality Score: {}/100, Email Confidence: {}",
                    lead.data_quality_score, confidence
                ),
            ]
        })
        .collect();

    ExportTable { headers, rows }
}

pub fn export_hubspot(leads: &[Lead]) -> ExportTable {
    let headers = vec![
        "First Name",
        "Last Name",
        "Email",
        "Job Title",
        "Company Name",
        "Company Domain Name",
        "Website URL",
        "Industry",
        "Phone Number",
        "City",
        "State/Region",
        "Country/Region",
        "Lead Status",
        "Lifecycle Stage",
        "Lead Source",
        "AcquireIQ Quality Score",
        "AcquireIQ Email Confidence",
        "AcquireIQ Email Status",
    ];

    let rows = leads
        .iter()
        .map(|lead| {
            vec![
                text(&lead.first_name),
                text(&lead.last_name),
                text(&lead.email),
                text(&lead.title),
                text(&lead.company_name),
                text(&lead.company_domain),
                text(&lead.company_website),
                text(&lead.industry),
                text(&lead.phone),
                text(&lead.city),
                text(&lead.state),
                text(&lead.country),
                "NEW".to_string(),
                "lead".to_string(),
                lead_source(lead),
                lead.data_quality_score.to_string(),
                lead.email_confidence.unwrap_or(0).to_string(),
                lead.email_status
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();

    ExportTable { headers, rows }
}

pub fn export_pipedrive(leads: &[Lead]) -> ExportTable {
    let headers = vec![
        "Person",
        "Email",
        "Phone",
        "Organization",
        "Job Title",
        "Website",
        "Address",
        "Owner",
        "Visible To",
        "Label",
        "AcquireIQ Quality Score",
        "AcquireIQ Email Confidence",
    ];

    let rows = leads
        .iter()
        .map(|lead| {
            let address = [
                present(&lead.city),
                present(&lead.state),
                present(&lead.country),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");

            vec![
                lead.display_name(),
                text(&lead.email),
                text(&lead.phone),
                text(&lead.company_name),
                text(&lead.title),
                text(&lead.company_website),
                address,
                String::new(),
                // 3 = visible to everyone
                "3".to_string(),
                rating_label(lead.data_quality_score).to_string(),
                lead.data_quality_score.to_string(),
                lead.email_confidence.unwrap_or(0).to_string(),
            ]
        })
        .collect();

    ExportTable { headers, rows }
}

pub fn export_generic(leads: &[Lead]) -> ExportTable {
    let headers = vec![
        "ID",
        "First Name",
        "Last Name",
        "Full Name",
        "Email",
        "Email Status",
        "Email Confidence",
        "Title",
        "Company",
        "Domain",
        "Website",
        "Industry",
        "Employees",
        "Revenue",
        "Phone",
        "LinkedIn",
        "City",
        "State",
        "Country",
        "Quality Score",
        "Data Source",
        "Enriched",
        "Export Date",
    ];

    let export_date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let rows = leads
        .iter()
        .map(|lead| {
            vec![
                text(&lead.id),
                text(&lead.first_name),
                text(&lead.last_name),
                text(&lead.full_name),
                text(&lead.email),
                lead.email_status
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                lead.email_confidence
                    .filter(|c| *c > 0)
                    .map(|c| format!("{}%", c))
                    .unwrap_or_default(),
                text(&lead.title),
                text(&lead.company_name),
                text(&lead.company_domain),
                text(&lead.company_website),
                text(&lead.industry),
                lead.employee_count
                    .filter(|n| *n > 0)
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                lead.revenue_estimate
                    .filter(|r| *r != 0.0)
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
                text(&lead.phone),
                text(&lead.linkedin_url),
                text(&lead.city),
                text(&lead.state),
                text(&lead.country),
                format!("{}/100", lead.data_quality_score),
                text(&lead.data_source),
                if lead.is_enriched { "Yes" } else { "No" }.to_string(),
                export_date.clone(),
            ]
        })
        .collect();

    ExportTable { headers, rows }
}

/// Writes a table as CSV with a header row.
///
/// # Arguments
///
/// * `table` - Headers and rows from one of the export layouts.
/// * `writer` - Destination; flushed before returning.
///
/// # Errors
///
/// * `AppError::CsvError` or `AppError::IoError` if writing fails.
pub fn write_csv<W: Write>(table: &ExportTable, writer: W) -> Result<(), AppError> {
    let mut csv = WriterBuilder::new().from_writer(writer);

    csv.write_record(&table.headers)
        .context("Failed to write CSV header")?;
    for row in &table.rows {
        csv.write_record(row).context("Failed to write CSV row")?;
    }
    csv.flush()?;

    Ok(())
}

/// Email and score recovered from an exported table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedRow {
    pub email: Option<String>,
    pub quality_score: Option<u8>,
}

/// Reads back any layout written by [`write_csv`], keeping email and
/// quality score.
pub fn read_exported<R: Read>(reader: R) -> Result<Vec<ExportedRow>, AppError> {
    let mut csv = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv
        .headers()
        .context("Failed to read exported CSV")?
        .clone();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let email_col = find("Email");
    let score_col = find("AcquireIQ Quality Score")
        .map(ScoreColumn::Plain)
        .or_else(|| find("Quality Score").map(ScoreColumn::OutOf100))
        .or_else(|| find("Description").map(ScoreColumn::Description));

    let mut rows = Vec::new();
    for row in csv.records() {
        let row = row.context("Failed to read exported CSV row")?;
        let email = email_col
            .and_then(|i| row.get(i))
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        let quality_score = score_col.and_then(|col| col.parse(&row));
        rows.push(ExportedRow {
            email,
            quality_score,
        });
    }

    Ok(rows)
}

#[derive(Debug, Clone, Copy)]
enum ScoreColumn {
    /// `85`
    Plain(usize),
    /// `85/100`
    OutOf100(usize),
    /// `Quality Score: 85/100, ...`
    Description(usize),
}

impl ScoreColumn {
    fn parse(self, row: &csv::StringRecord) -> Option<u8> {
        match self {
            ScoreColumn::Plain(i) => row.get(i)?.parse().ok(),
            ScoreColumn::OutOf100(i) => row.get(i)?.split('/').next()?.trim().parse().ok(),
            ScoreColumn::Description(i) => {
                let desc = row.get(i)?;
                let rest = desc.split("Quality Score:").nth(1)?;
                rest.split('/').next()?.trim().parse().ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailStatus;

    fn lead() -> Lead {
        Lead {
            id: Some("lead_1".into()),
            first_name: Some("Sarah".into()),
            last_name: Some("Jones".into()),
            email: Some("sarah.jones@datasync.io".into()),
            email_status: Some(EmailStatus::Valid),
            email_confidence: Some(75),
            company_name: Some("DataSync Inc".into()),
            city: Some("Denver".into()),
            country: Some("USA".into()),
            data_quality_score: 82,
            is_enriched: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(rating_label(100), "Hot");
        assert_eq!(rating_label(80), "Hot");
        assert_eq!(rating_label(79), "Warm");
        assert_eq!(rating_label(60), "Warm");
        assert_eq!(rating_label(59), "Cold");
        assert_eq!(rating_label(0), "Cold");
    }

    #[test]
    fn test_layout_widths() {
        let leads = vec![lead()];
        for (format, width) in [
            (CrmFormat::Salesforce, 18),
            (CrmFormat::HubSpot, 18),
            (CrmFormat::Pipedrive, 12),
            (CrmFormat::Generic, 23),
        ] {
            let table = export_leads(format, &leads);
            assert_eq!(table.headers.len(), width, "{:?}", format);
            assert!(table.rows.iter().all(|r| r.len() == width), "{:?}", format);
        }
    }

    #[test]
    fn test_salesforce_defaults() {
        let table = export_salesforce(&[lead()]);
        let row = &table.rows[0];
        assert_eq!(row[13], DEFAULT_LEAD_SOURCE);
        assert_eq!(row[15], "Hot");
        assert_eq!(row[17], "Quality Score: 82/100, Email Confidence: 75%");
    }

    #[test]
    fn test_pipedrive_person_and_address() {
        let table = export_pipedrive(&[lead()]);
        let row = &table.rows[0];
        assert_eq!(row[0], "Sarah Jones");
        assert_eq!(row[6], "Denver, USA");
        assert_eq!(row[9], "Hot");
    }

    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_write_csv_reports_flush_failure() {
        let table = export_generic(&[lead()]);
        let result = write_csv(&table, FailingFlush);
        assert!(matches!(result, Err(AppError::IoError(_))));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("HubSpot".parse::<CrmFormat>().unwrap(), CrmFormat::HubSpot);
        assert!("zoho".parse::<CrmFormat>().is_err());
    }
}
