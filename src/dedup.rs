use std::collections::HashMap;

use crate::models::Lead;

/// Collapses leads sharing an email (case-insensitive).
///
/// Leads without an email are dropped. Among duplicates the strictly higher
/// quality score wins; on a tie the first one seen stays. Output follows the
/// order in which each email first appeared.
pub fn deduplicate_leads(leads: Vec<Lead>) -> Vec<Lead> {
    let total = leads.len();
    let mut slots: Vec<Lead> = Vec::new();
    let mut index_by_email: HashMap<String, usize> = HashMap::new();

    for lead in leads {
        let key = match lead.email() {
            Some(email) => email.to_lowercase(),
            None => continue,
        };

        match index_by_email.get(&key) {
            Some(&idx) => {
                if lead.data_quality_score > slots[idx].data_quality_score {
                    slots[idx] = lead;
                }
            }
            None => {
                index_by_email.insert(key, slots.len());
                slots.push(lead);
            }
        }
    }

    let removed = total - slots.len();
    tracing::info!(
        "Deduplication: {} -> {} leads ({} removed)",
        total,
        slots.len(),
        removed
    );

    slots
}
