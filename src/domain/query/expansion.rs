//! Lexical query expansion
//!
//! Colloquial tenant phrasing rarely matches the formal vocabulary of the
//! statutes and policy documents in the corpus. Each trigger phrase below maps
//! to terms of art that are appended to the query before it is embedded. The
//! expanded text is used for retrieval only; it is never shown to the caller
//! or passed to the model as the question.

/// Trigger phrase (lower-case) to related corpus terms
pub const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "month-to-month",
        &["periodic tenancy", "termination of tenancy", "notice period"],
    ),
    (
        "month to month",
        &["periodic tenancy", "termination of tenancy", "notice period"],
    ),
    (
        "kick out",
        &["eviction", "termination of tenancy", "forcible entry and detainer"],
    ),
    (
        "evict",
        &["eviction", "termination of tenancy", "forcible entry and detainer"],
    ),
    (
        "deposit",
        &["security deposit", "prepaid rent", "deposit refund", "itemized deductions"],
    ),
    (
        "raise the rent",
        &["rent increase", "rent increase notice", "rent stabilization"],
    ),
    (
        "rent increase",
        &["rent increase notice", "rent stabilization"],
    ),
    ("late fee", &["late rent charge", "nonpayment of rent"]),
    (
        "repair",
        &["habitability", "landlord maintenance obligations", "essential services"],
    ),
    ("mold", &["habitability", "mold remediation", "essential services"]),
    (
        "emotional support",
        &["assistance animal", "reasonable accommodation", "fair housing"],
    ),
    (
        "service animal",
        &["assistance animal", "reasonable accommodation", "fair housing"],
    ),
    ("pet", &["pet agreement", "pet deposit"]),
    ("right of entry", &["landlord access", "notice of entry"]),
    ("come into my", &["landlord access", "notice of entry"]),
    (
        "break the lease",
        &["early termination", "lease termination fee", "fixed term tenancy"],
    ),
    (
        "break my lease",
        &["early termination", "lease termination fee", "fixed term tenancy"],
    ),
    ("discriminat", &["fair housing", "protected class"]),
    (
        "no cause",
        &["no-cause termination", "qualifying landlord reason", "relocation assistance"],
    ),
    ("abandon", &["abandoned property", "personal property disposal"]),
    ("lockout", &["unlawful ouster", "utility shutoff"]),
    ("locked out", &["unlawful ouster", "utility shutoff"]),
];

/// Expand a query with the configured synonym table
pub fn expand(query: &str) -> String {
    expand_with(query, SYNONYMS)
}

/// Expand a query with an explicit table
///
/// Related terms of every trigger found as a substring of the lower-cased
/// query are appended once each, in first-seen order. A query with no
/// trigger is returned unchanged.
pub fn expand_with(query: &str, table: &[(&str, &[&str])]) -> String {
    let lowered = query.to_lowercase();
    let mut terms: Vec<&str> = Vec::new();

    for (trigger, related) in table {
        if !lowered.contains(trigger) {
            continue;
        }

        for term in related.iter() {
            if !terms.contains(term) {
                terms.push(term);
            }
        }
    }

    if terms.is_empty() {
        return query.to_string();
    }

    format!("{} {}", query, terms.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_without_trigger_is_unchanged() {
        let query = "What is the capital of France?";
        assert_eq!(expand(query), query);
    }

    #[test]
    fn test_single_trigger_appends_terms() {
        let expanded = expand("Can my landlord keep my deposit?");

        assert_eq!(
            expanded,
            "Can my landlord keep my deposit? security deposit prepaid rent deposit refund itemized deductions"
        );
    }

    #[test]
    fn test_matching_is_case_insensitive_but_original_text_preserved() {
        let expanded = expand("How do I EVICT a tenant?");

        assert!(expanded.starts_with("How do I EVICT a tenant? "));
        assert!(expanded.contains("forcible entry and detainer"));
    }

    #[test]
    fn test_overlapping_triggers_add_each_term_once() {
        let expanded = expand("What notice is required before ending a month-to-month tenancy?");
        let suffix = expanded
            .strip_prefix("What notice is required before ending a month-to-month tenancy? ")
            .unwrap();

        // "month-to-month" and "month to month" share terms; only the first matches here
        assert_eq!(suffix, "periodic tenancy termination of tenancy notice period");
    }

    #[test]
    fn test_every_related_term_appears_exactly_once() {
        let query = "Can they evict me or kick out my emotional support dog after a mold complaint?";
        let expanded = expand(query);
        let suffix = &expanded[query.len() + 1..];

        for (trigger, related) in SYNONYMS {
            if !query.to_lowercase().contains(trigger) {
                continue;
            }
            for term in related.iter() {
                assert!(suffix.contains(term), "missing term {term}");
            }
        }

        let eviction_count = suffix.matches("forcible entry and detainer").count();
        assert_eq!(eviction_count, 1);
        let habitability_count = suffix.matches("habitability").count();
        assert_eq!(habitability_count, 1);
    }

    #[test]
    fn test_custom_table_preserves_first_seen_order() {
        let table: &[(&str, &[&str])] = &[("beta", &["two", "three"]), ("alpha", &["one", "two"])];

        assert_eq!(expand_with("alpha beta", table), "alpha beta two three one");
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let query = "Is a late fee allowed if I break the lease?";
        assert_eq!(expand(query), expand(query));
    }
}
