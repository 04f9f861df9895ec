use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::constants;
use crate::domain::ResourceRecord;

struct CategoryRule {
    pattern: Regex,
    category: &'static str,
}

// The keyword tables are literals from `constants`, compiled once.
static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    constants::CATEGORY_RULES
        .iter()
        .map(|&(pattern, category)| CategoryRule {
            pattern: keyword_regex(pattern),
            category,
        })
        .collect()
});

static INDIGENOUS_MARKERS: Lazy<Regex> =
    Lazy::new(|| keyword_regex(constants::INDIGENOUS_MARKERS));

static EMPLOYMENT_MARKERS: Lazy<Regex> =
    Lazy::new(|| keyword_regex(constants::EMPLOYMENT_MARKERS));

fn keyword_regex(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("keyword table pattern must compile")
}

/// Assigns a category from the description. First matching rule wins; rule
/// order is part of the contract. No match falls back to the default.
pub fn classify(description: &str) -> &'static str {
    for rule in CATEGORY_RULES.iter() {
        if rule.pattern.is_match(description) {
            return rule.category;
        }
    }
    constants::DEFAULT_CATEGORY
}

pub fn classify_batch(records: &mut [ResourceRecord]) {
    for record in records.iter_mut() {
        record.category = classify(&record.description).to_string();
    }
}

/// Verdict of the keyword pass that runs after link verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LateVerdict {
    Keep,
    OverrideIndigenous,
    Remove,
}

/// Employment resources are out of scope for the dataset and removal wins
/// over the Indigenous override when both marker sets match.
pub fn late_verdict(record: &ResourceRecord) -> LateVerdict {
    let haystack = record.search_text();
    if EMPLOYMENT_MARKERS.is_match(&haystack) {
        return LateVerdict::Remove;
    }
    if INDIGENOUS_MARKERS.is_match(&haystack) {
        return LateVerdict::OverrideIndigenous;
    }
    LateVerdict::Keep
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LatePassOutcome {
    pub removed: usize,
    pub overridden: usize,
}

/// Applies the late pass in place. Runs on already-verified records; the
/// ordering dependency lives in the driver.
pub fn late_pass(records: &mut Vec<ResourceRecord>) -> LatePassOutcome {
    let mut outcome = LatePassOutcome::default();
    let before = records.len();
    records.retain_mut(|record| match late_verdict(record) {
        LateVerdict::Remove => false,
        LateVerdict::OverrideIndigenous => {
            if record.category != constants::INDIGENOUS_SUPPORT {
                record.category = constants::INDIGENOUS_SUPPORT.to_string();
                outcome.overridden += 1;
            }
            true
        }
        LateVerdict::Keep => true,
    });
    outcome.removed = before - records.len();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        // contains both crisis and youth keywords; the crisis rule is
        // checked first
        assert_eq!(
            classify("24/7 suicide crisis hotline for youth"),
            constants::CRISIS_SUPPORT
        );
        assert_eq!(
            classify("drop-in counselling for youth"),
            constants::YOUTH_SERVICES
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let description = "walk-in psychiatric outpatient program";
        let first = classify(description);
        for _ in 0..10 {
            assert_eq!(classify(description), first);
        }
        assert_eq!(first, constants::HOSPITALS);
    }

    #[test]
    fn test_no_match_falls_back_to_default() {
        assert_eq!(classify("peer phone check-ins"), constants::DEFAULT_CATEGORY);
    }

    #[test]
    fn test_rules_are_case_insensitive() {
        assert_eq!(classify("CRISIS support line"), constants::CRISIS_SUPPORT);
    }

    fn record_with(name: &str, category: &str, description: &str) -> ResourceRecord {
        ResourceRecord {
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_late_pass_overrides_indigenous() {
        let mut records = vec![record_with(
            "talking circle program",
            constants::COMMUNITY_COUNSELLING,
            "healing program run by a first nation community",
        )];
        let outcome = late_pass(&mut records);
        assert_eq!(outcome.overridden, 1);
        assert_eq!(outcome.removed, 0);
        assert_eq!(records[0].category, constants::INDIGENOUS_SUPPORT);
    }

    #[test]
    fn test_late_pass_removes_employment_resources() {
        let mut records = vec![record_with(
            "back to work program",
            constants::DEFAULT_CATEGORY,
            "job search coaching for adults",
        )];
        let outcome = late_pass(&mut records);
        assert_eq!(outcome.removed, 1);
        assert!(records.is_empty());
    }

    #[test]
    fn test_removal_takes_precedence_over_override() {
        let mut records = vec![record_with(
            "community hiring circle",
            constants::DEFAULT_CATEGORY,
            "vocational coaching for inuit adults",
        )];
        let outcome = late_pass(&mut records);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.overridden, 0);
        assert!(records.is_empty());
    }

    #[test]
    fn test_late_pass_matches_across_name_and_category() {
        // the marker sits in the name, not the description
        let mut records = vec![record_with(
            "native friendship centre",
            constants::DEFAULT_CATEGORY,
            "drop-in wellness space",
        )];
        late_pass(&mut records);
        assert_eq!(records[0].category, constants::INDIGENOUS_SUPPORT);
    }
}
