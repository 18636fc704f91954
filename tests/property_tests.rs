/// Property-based tests using proptest
/// Tests invariants and properties that should hold for all inputs
use lead_enrichment::models::{
    ConfidenceLevel, EmailStatus, Lead, VerificationFlags, VerificationResult,
};
use lead_enrichment::scoring::calculate_quality_score;
use lead_enrichment::sources::validate_phone;
use lead_enrichment::validator::EmailValidator;
use proptest::prelude::*;

mod common;

// Property: Email format validation should never panic
proptest! {
    #[test]
    fn format_validation_never_panics(email in "\\PC*") {
        let (_, reason) = EmailValidator::validate_format(&email);
        prop_assert!(!reason.is_empty());
    }

    #[test]
    fn format_requires_exactly_one_at(
        local in "[a-z]{1,10}",
        domain in "[a-z]{1,10}",
        extra in 2usize..5
    ) {
        let email = format!("{}{}{}.com", local, "@".repeat(extra), domain);
        let (valid, _) = EmailValidator::validate_format(&email);
        prop_assert!(!valid);

        let no_at = format!("{}{}.com", local, domain);
        prop_assert!(!EmailValidator::validate_format(&no_at).0);
    }

    #[test]
    fn simple_addresses_pass_format(
        local in "[a-z][a-z0-9_]{0,20}",
        domain in "[a-z][a-z0-9]{0,15}",
        tld in "[a-z]{2,6}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        let (valid, reason) = EmailValidator::validate_format(&email);
        prop_assert!(valid, "{} rejected: {}", email, reason);
    }

    #[test]
    fn overlong_local_part_fails(local in "[a-z]{65,80}") {
        let email = format!("{}@example.com", local);
        prop_assert!(!EmailValidator::validate_format(&email).0);
    }
}

// Property: Full validation never panics and short-circuits on bad format
proptest! {
    #[test]
    fn comprehensive_validation_never_panics(email in "\\PC{0,40}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let report = runtime.block_on(common::validator().comprehensive_validation(&email));

        prop_assert_eq!(report.email, email);
        if !report.format_valid {
            prop_assert!(!report.is_valid);
            prop_assert!(report.domain.is_none());
            prop_assert_eq!(report.errors.len(), 1);
        }
    }
}

// Property: Gibberish detection ignores case and non-letters
proptest! {
    #[test]
    fn gibberish_ignores_case(local in "[a-zA-Z]{0,20}") {
        let lower = format!("{}@example.com", local.to_lowercase());
        let upper = format!("{}@example.com", local.to_uppercase());
        prop_assert_eq!(
            EmailValidator::detect_gibberish(&lower),
            EmailValidator::detect_gibberish(&upper)
        );
    }

    #[test]
    fn gibberish_ignores_digits(local in "[a-z]{0,20}", digits in "[0-9]{1,6}") {
        let plain = format!("{}@example.com", local);
        let with_digits = format!("{}{}@example.com", local, digits);
        prop_assert_eq!(
            EmailValidator::detect_gibberish(&plain),
            EmailValidator::detect_gibberish(&with_digits)
        );
    }

    #[test]
    fn short_local_parts_are_never_gibberish(local in "[b-df-hj-np-tv-z]{0,2}") {
        let email = format!("{}@example.com", local);
        prop_assert!(!EmailValidator::detect_gibberish(&email));
    }
}

fn arb_lead() -> impl Strategy<Value = Lead> {
    (
        proptest::collection::vec(any::<bool>(), 14),
        proptest::option::of(0u8..=100),
    )
        .prop_map(|(fields, confidence)| {
            let text = |on: bool, value: &str| on.then(|| value.to_string());
            Lead {
                email: text(fields[0], "emily.davis@techflow.com"),
                email_confidence: confidence,
                first_name: text(fields[1], "Emily"),
                last_name: text(fields[2], "Davis"),
                phone: text(fields[3], "+15125550100"),
                linkedin_url: text(fields[4], "https://linkedin.com/in/emily"),
                company_name: text(fields[5], "TechFlow Solutions"),
                company_domain: text(fields[6], "techflow.com"),
                company_website: text(fields[7], "https://techflow.com"),
                industry: text(fields[8], "SaaS"),
                title: text(fields[9], "CEO"),
                revenue_estimate: fields[10].then_some(5_000_000.0),
                employee_count: fields[11].then_some(45),
                city: text(fields[12], "Austin"),
                state: text(fields[13], "TX"),
                ..Default::default()
            }
        })
}

// Property: Quality score bounds and monotonicity
proptest! {
    #[test]
    fn quality_score_is_bounded(lead in arb_lead()) {
        prop_assert!(calculate_quality_score(&lead) <= 100);
    }

    #[test]
    fn quality_score_is_a_multiple_of_five_without_email(mut lead in arb_lead()) {
        lead.email = None;
        prop_assert_eq!(calculate_quality_score(&lead) % 5, 0);
    }

    #[test]
    fn adding_a_field_never_lowers_the_score(lead in arb_lead()) {
        let base = calculate_quality_score(&lead);

        let mut more = lead.clone();
        more.linkedin_url = Some("https://linkedin.com/in/someone".to_string());
        prop_assert!(calculate_quality_score(&more) >= base);

        let mut more = lead.clone();
        more.industry = Some("SaaS".to_string());
        prop_assert!(calculate_quality_score(&more) >= base);

        let mut more = lead;
        more.email_confidence = Some(100);
        prop_assert!(calculate_quality_score(&more) >= base);
    }

    #[test]
    fn blank_strings_score_like_missing(lead in arb_lead()) {
        let mut blank = lead.clone();
        if blank.title.is_none() {
            blank.title = Some("   ".to_string());
        }
        if blank.industry.is_none() {
            blank.industry = Some(String::new());
        }
        prop_assert_eq!(calculate_quality_score(&blank), calculate_quality_score(&lead));
    }
}

// Property: Verification scores are clamped and bucketed consistently
proptest! {
    #[test]
    fn verification_score_is_clamped(score in any::<u8>()) {
        let result = VerificationResult::new(
            "a@b.co".to_string(),
            EmailStatus::Valid,
            score,
            VerificationFlags::default(),
            Vec::new(),
        );
        prop_assert!(result.score() <= 100);
        prop_assert_eq!(result.confidence_level(), ConfidenceLevel::from_score(result.score()));
    }
}

// Property: Phone validation should never panic
proptest! {
    #[test]
    fn phone_validation_never_panics(phone in "[0-9 ()+.-]{0,24}") {
        let _ = validate_phone(&phone);
    }

    #[test]
    fn valid_phones_normalize_to_e164(
        area in prop::sample::select(vec![206u16, 212, 303, 404, 415, 512, 617, 650]),
        line in 2_000_000u32..=9_999_999
    ) {
        let phone = format!("({}) {}-{:04}", area, line / 10_000, line % 10_000);
        let (valid, normalized) = validate_phone(&phone);
        prop_assert!(valid, "{} rejected: {}", phone, normalized);
        prop_assert_eq!(normalized, format!("+1{}{}", area, line));
    }
}
