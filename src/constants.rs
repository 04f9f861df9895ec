/// Category taxonomy and keyword tables used across the pipeline.
/// All of these are process-wide constants loaded once; rule order matters
/// and is part of the classification contract.

// Canonical category names
pub const CRISIS_SUPPORT: &str = "Crisis & Distress Support";
pub const YOUTH_SERVICES: &str = "Youth & Student Services";
pub const INDIGENOUS_SUPPORT: &str = "Indigenous Support";
pub const HOSPITALS: &str = "Hospitals & Health Centres";
pub const COMMUNITY_COUNSELLING: &str = "Community Counselling";
pub const DEFAULT_CATEGORY: &str = "Other Mental Health Service";

/// Ordered (pattern, category) rules over the description field.
/// First match wins, so the more specific categories come first.
pub const CATEGORY_RULES: &[(&str, &str)] = &[
    (
        "crisis|distress|suicide|helpline|hotline|talk line|emergency",
        CRISIS_SUPPORT,
    ),
    (
        "youth|student|teen|young adult|child|adolescent|campus|school|college",
        YOUTH_SERVICES,
    ),
    (
        "indigenous|first nation|metis|inuit|aboriginal|native friendship|tribal",
        INDIGENOUS_SUPPORT,
    ),
    (
        "hospital|clinic|health centre|psychiatric|inpatient|outpatient",
        HOSPITALS,
    ),
    (
        "counsel|therapy|support group|psychotherapy|family service|wellness|community centre",
        COMMUNITY_COUNSELLING,
    ),
];

/// Substring markers used to drop French-language rows. Heuristic only;
/// matched case-insensitively against every field of a record.
pub const FRENCH_MARKERS: &[&str] = &[
    "le ",
    "la ",
    "les ",
    "des ",
    "du ",
    "de ",
    "centre de santé",
    "et ",
    "santé mentale",
    "clinique de",
];

/// Markers for the post-verification pass. A record matching the Indigenous
/// list has its category overridden; a record matching the employment list is
/// removed outright, and removal wins when both match.
pub const INDIGENOUS_MARKERS: &str =
    "indigenous|first nation|metis|inuit|aboriginal|native friendship|tribal";

pub const EMPLOYMENT_MARKERS: &str =
    "employment|job search|job readiness|job training|career counsel|vocational|work placement|training program";

/// Domains the link verifier rejects without probing. These hosts refuse
/// automated HEAD requests, so a probe result would be meaningless.
pub const EXCLUDED_LINK_DOMAINS: &[&str] = &["facebook.com", "instagram.com"];

/// Country qualifier appended to every geocoding query.
pub const GEOCODING_COUNTRY: &str = "Canada";
