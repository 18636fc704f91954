//! Data quality scoring.
//!
//! Four additive buckets, each gated on field presence:
//!
//! | Bucket     | Points                                                        |
//! |------------|---------------------------------------------------------------|
//! | Email      | 10 for an email, plus `min(30, floor(confidence * 0.3))`      |
//! | Contact    | 5 each: first name, last name, phone, LinkedIn                |
//! | Company    | 5 each: company name, domain, website, industry               |
//! | Additional | 5 each: title, revenue, employee count, city *and* state      |
//!
//! The total is capped at 100.

use crate::models::{present, Lead};

pub const MAX_SCORE: u8 = 100;

/// Computes the 0-100 quality score of a lead. Never fails.
pub fn calculate_quality_score(lead: &Lead) -> u8 {
    let mut score: u32 = 0;

    if lead.email().is_some() {
        score += 10;
        if let Some(confidence) = lead.email_confidence.filter(|c| *c > 0) {
            // Integer math keeps the floor exact: c * 0.3 == c * 3 / 10.
            score += (u32::from(confidence) * 3 / 10).min(30);
        }
    }

    score += points(&[
        present(&lead.first_name).is_some(),
        present(&lead.last_name).is_some(),
        present(&lead.phone).is_some(),
        present(&lead.linkedin_url).is_some(),
    ]);

    score += points(&[
        present(&lead.company_name).is_some(),
        present(&lead.company_domain).is_some(),
        present(&lead.company_website).is_some(),
        present(&lead.industry).is_some(),
    ]);

    score += points(&[
        present(&lead.title).is_some(),
        lead.revenue_estimate.is_some_and(|r| r != 0.0),
        lead.employee_count.is_some_and(|n| n != 0),
        present(&lead.city).is_some() && present(&lead.state).is_some(),
    ]);

    score.min(u32::from(MAX_SCORE)) as u8
}

fn points(checks: &[bool]) -> u32 {
    checks.iter().filter(|present| **present).count() as u32 * 5
}
